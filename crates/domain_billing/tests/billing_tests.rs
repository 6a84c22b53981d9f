//! End-to-end tests for domain_billing

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use core_kernel::{ActorId, CaseId, CaseTypeId, LoginId, WorkCodeId};

use domain_billing::ports::mock::MockReferenceData;
use domain_billing::{
    BillingConfig, BillingEngine, BillingError, BillingOutcome, BillingRequest, BillingResult,
    RateLevel, WorkedHours,
};

use test_utils::{
    assert_breakdown_consistent, assert_decimal_eq, init_test_tracing, CaseFixtures,
    ConfigFixtures, CurrencyFixtures, DateFixtures, DiscountRuleBuilder, IdFixtures,
    PriceListEntryBuilder, ReferenceDataBuilder,
};

fn bill_with(
    data: ReferenceDataBuilder,
    config: BillingConfig,
    work_code: WorkCodeId,
    login: LoginId,
    hours: Decimal,
) -> BillingResult<BillingOutcome> {
    init_test_tracing();
    let engine = BillingEngine::new(data.build(), config);
    let request = BillingRequest::new(
        CaseFixtures::CASE_ID,
        work_code,
        login,
        WorkedHours::billable(hours),
        DateFixtures::billing_date(),
    );
    engine.bill(&request)
}

fn bill_configured(
    data: ReferenceDataBuilder,
    config: BillingConfig,
    hours: Decimal,
) -> BillingResult<BillingOutcome> {
    bill_with(
        data,
        config,
        IdFixtures::fee_work_code(),
        IdFixtures::login(),
        hours,
    )
}

fn bill(data: ReferenceDataBuilder, hours: Decimal) -> BillingResult<BillingOutcome> {
    bill_with(
        data,
        ConfigFixtures::standard(),
        IdFixtures::fee_work_code(),
        IdFixtures::login(),
        hours,
    )
}

// ============================================================================
// Rate Resolution Tests
// ============================================================================

mod rate_resolution {
    use super::*;

    #[test]
    fn test_fixed_work_code_rate_beats_price_list() {
        let data = ReferenceDataBuilder::new()
            .with_fixed_rate_work_code(dec!(250))
            .with_case_price(PriceListEntryBuilder::new().with_rate(dec!(100)).build())
            .with_client_currency(CurrencyFixtures::sek());

        let outcome = bill_with(
            data,
            ConfigFixtures::standard(),
            IdFixtures::fixed_work_code(),
            IdFixtures::login(),
            dec!(2),
        )
        .unwrap();

        assert_eq!(outcome.rate.level, RateLevel::WorkCodeFixed);
        assert_decimal_eq(outcome.breakdown.final_amount, dec!(500));
        assert_eq!(outcome.currency, CurrencyFixtures::sek());
    }

    #[test]
    fn test_case_price_list_supplies_rate_and_currency() {
        let data = ReferenceDataBuilder::new()
            .with_case_price(
                PriceListEntryBuilder::new()
                    .with_rate(dec!(120))
                    .with_currency(CurrencyFixtures::usd())
                    .build(),
            )
            .with_default_price(PriceListEntryBuilder::new().with_rate(dec!(90)).build())
            .with_client_currency(CurrencyFixtures::sek());

        let outcome = bill(data, dec!(1)).unwrap();
        assert_eq!(outcome.rate.level, RateLevel::CasePriceList);
        assert_decimal_eq(outcome.rate.hourly_rate, dec!(120));
        assert_eq!(outcome.currency, CurrencyFixtures::usd());
        assert_eq!(outcome.budget_line.currency, CurrencyFixtures::usd());
    }

    #[test]
    fn test_default_price_list_when_case_list_is_empty() {
        let data = ReferenceDataBuilder::new()
            .with_default_price(PriceListEntryBuilder::new().with_rate(dec!(90)).build());

        let outcome = bill(data, dec!(1)).unwrap();
        assert_eq!(outcome.rate.level, RateLevel::DefaultPriceList);
        assert_decimal_eq(outcome.rate.hourly_rate, dec!(90));
        assert_eq!(outcome.currency, CurrencyFixtures::eur());
    }

    #[test]
    fn test_price_list_ranking() {
        let data = ReferenceDataBuilder::new()
            // most specific category, but for someone else
            .with_case_price(
                PriceListEntryBuilder::new()
                    .with_category(3)
                    .for_login(IdFixtures::other_login())
                    .with_rate(dec!(300))
                    .build(),
            )
            // most specific category, but not yet effective
            .with_case_price(
                PriceListEntryBuilder::new()
                    .with_category(3)
                    .effective(DateFixtures::next_month())
                    .with_rate(dec!(310))
                    .build(),
            )
            .with_case_price(
                PriceListEntryBuilder::new().with_category(2).with_rate(dec!(200)).build(),
            )
            .with_case_price(
                PriceListEntryBuilder::new()
                    .with_category(2)
                    .for_login(LoginId::new("JDOE"))
                    .with_rate(dec!(210))
                    .build(),
            )
            .with_case_price(
                PriceListEntryBuilder::new()
                    .with_category(2)
                    .for_actor(ActorId::new(999))
                    .for_login(IdFixtures::login())
                    .with_rate(dec!(220))
                    .build(),
            )
            .with_case_price(
                PriceListEntryBuilder::new().with_category(1).with_rate(dec!(100)).build(),
            );

        let outcome = bill(data, dec!(1)).unwrap();
        assert_decimal_eq(outcome.rate.hourly_rate, dec!(210));
    }

    #[test]
    fn test_exact_actor_and_latest_price_change_win() {
        let data = ReferenceDataBuilder::new()
            .with_case_price(PriceListEntryBuilder::new().with_rate(dec!(100)).build())
            .with_case_price(
                PriceListEntryBuilder::new()
                    .for_actor(IdFixtures::CLIENT)
                    .with_rate(dec!(110))
                    .build(),
            )
            .with_case_price(
                PriceListEntryBuilder::new()
                    .for_actor(IdFixtures::CLIENT)
                    .effective(DateFixtures::billing_date())
                    .with_rate(dec!(115))
                    .build(),
            );

        let outcome = bill(data, dec!(1)).unwrap();
        assert_decimal_eq(outcome.rate.hourly_rate, dec!(115));
    }

    #[test]
    fn test_person_override_most_specific_wins() {
        let login = IdFixtures::login();
        let data = ReferenceDataBuilder::new()
            .with_person_rate(login.clone(), None, false, dec!(50))
            .with_person_rate(login.clone(), None, true, dec!(60))
            .with_person_rate(login.clone(), Some(IdFixtures::fee_work_code()), false, dec!(70))
            .with_person_rate(login.clone(), Some(WorkCodeId::new("OTHER")), true, dec!(99))
            .with_person(login, Some(dec!(40)))
            .with_client_currency(CurrencyFixtures::eur());

        let outcome = bill(data, dec!(1)).unwrap();
        assert_eq!(outcome.rate.level, RateLevel::PersonOverride);
        assert_decimal_eq(outcome.rate.hourly_rate, dec!(70));
    }

    #[test]
    fn test_person_default_rate_uses_client_currency() {
        let data = ReferenceDataBuilder::new()
            .with_person(IdFixtures::login(), Some(dec!(40)))
            .with_client_currency(CurrencyFixtures::sek());

        let outcome = bill(data, dec!(2)).unwrap();
        assert_eq!(outcome.rate.level, RateLevel::PersonDefault);
        assert_decimal_eq(outcome.breakdown.final_amount, dec!(80));
        assert_eq!(outcome.currency, CurrencyFixtures::sek());
    }

    #[test]
    fn test_no_rate_anywhere() {
        let login = IdFixtures::random_login();
        let error = bill_with(
            ReferenceDataBuilder::new().with_person(IdFixtures::login(), None),
            ConfigFixtures::standard(),
            IdFixtures::fee_work_code(),
            login.clone(),
            dec!(1),
        )
        .unwrap_err();

        assert!(matches!(error, BillingError::RateNotFound { .. }));
        let message = error.to_string();
        assert!(message.contains(login.as_str()));
        assert!(message.contains("FEE"));
        assert!(error.is_permanent());
    }
}

// ============================================================================
// Currency Tests
// ============================================================================

mod currency {
    use super::*;

    fn person_rated() -> ReferenceDataBuilder {
        ReferenceDataBuilder::new().with_person(IdFixtures::login(), Some(dec!(40)))
    }

    #[test]
    fn test_system_default_currency_policy() {
        let data = person_rated()
            .with_system_currency(CurrencyFixtures::usd())
            .with_client_currency(CurrencyFixtures::sek());
        let config = ConfigFixtures::standard().with_system_default_currency();

        let outcome = bill_configured(data, config, dec!(1)).unwrap();
        assert_eq!(outcome.currency, CurrencyFixtures::usd());
    }

    #[test]
    fn test_missing_system_currency() {
        let config = ConfigFixtures::standard().with_system_default_currency();
        let error = bill_configured(person_rated(), config, dec!(1)).unwrap_err();
        assert!(matches!(error, BillingError::SystemCurrencyNotFound { .. }));
    }

    #[test]
    fn test_fallback_currency() {
        let config = ConfigFixtures::standard().with_fallback_currency(CurrencyFixtures::eur());
        let outcome = bill_configured(person_rated(), config, dec!(1)).unwrap();
        assert_eq!(outcome.currency, CurrencyFixtures::eur());
    }

    #[test]
    fn test_missing_case_currency_names_case() {
        let error = bill(person_rated(), dec!(1)).unwrap_err();
        assert!(matches!(error, BillingError::CurrencyNotFound { .. }));
        assert!(error.to_string().contains("P-2024-001"));
    }
}

// ============================================================================
// Discount Tests
// ============================================================================

mod discounts {
    use super::*;

    fn priced(rate: Decimal) -> ReferenceDataBuilder {
        ReferenceDataBuilder::new()
            .with_case_price(PriceListEntryBuilder::new().with_rate(rate).build())
    }

    #[test]
    fn test_pure_discount_scenario() {
        let data = priced(dec!(25)).with_client_discount(DiscountRuleBuilder::new(1).build());

        let outcome = bill(data, dec!(2.50)).unwrap();
        let charge = &outcome.breakdown;
        assert_decimal_eq(charge.original_amount, dec!(62.50));
        assert_decimal_eq(charge.final_amount, dec!(56.25));
        assert_decimal_eq(charge.discount_amount, dec!(-6.25));
        assert_decimal_eq(charge.discount_percentage, dec!(-10));
        assert_decimal_eq(charge.effective_rate, dec!(22.50));
        assert_decimal_eq(outcome.budget_line.effective_rate, dec!(22.50));
        assert_breakdown_consistent(charge);
    }

    #[test]
    fn test_markup_scenario() {
        let data =
            priced(dec!(25)).with_client_discount(DiscountRuleBuilder::new(1).markup().build());

        let outcome = bill(data, dec!(2.50)).unwrap();
        assert_decimal_eq(outcome.breakdown.final_amount, dec!(68.75));
        assert_decimal_eq(outcome.breakdown.effective_rate, dec!(27.50));
        assert_decimal_eq(outcome.breakdown.discount_percentage, dec!(10));
    }

    #[test]
    fn test_small_charge() {
        let pure = bill(
            priced(dec!(8)).with_client_discount(DiscountRuleBuilder::new(1).build()),
            dec!(1),
        )
        .unwrap();
        let markup = bill(
            priced(dec!(8)).with_client_discount(DiscountRuleBuilder::new(1).markup().build()),
            dec!(1),
        )
        .unwrap();
        assert_decimal_eq(pure.breakdown.final_amount, dec!(7.2));
        assert_decimal_eq(markup.breakdown.final_amount, dec!(8.8));
    }

    #[test]
    fn test_more_specific_rule_wins_over_threshold() {
        let data = priced(dec!(100))
            .with_client_discount(DiscountRuleBuilder::new(1).with_formula("@ * 0.5").build())
            .with_client_discount(
                DiscountRuleBuilder::new(2)
                    .for_case_type(CaseFixtures::CASE_TYPE)
                    .with_threshold(dec!(50))
                    .with_formula("5")
                    .build(),
            );

        let outcome = bill(data, dec!(1)).unwrap();
        let applied = outcome.breakdown.applied_discount.clone().unwrap();
        assert_eq!(applied.discount_id.value(), 2);
        assert_decimal_eq(outcome.breakdown.final_amount, dec!(95));
    }

    #[test]
    fn test_threshold_tiers_within_priority() {
        let tiers = || {
            priced(dec!(100))
                .with_client_discount(DiscountRuleBuilder::new(1).with_formula("1").build())
                .with_client_discount(
                    DiscountRuleBuilder::new(2)
                        .with_threshold(dec!(500))
                        .with_formula("50")
                        .build(),
                )
                .with_client_discount(
                    DiscountRuleBuilder::new(3)
                        .with_threshold(dec!(1000))
                        .with_formula("200")
                        .build(),
                )
        };

        assert_decimal_eq(bill(tiers(), dec!(2)).unwrap().breakdown.final_amount, dec!(199));
        assert_decimal_eq(bill(tiers(), dec!(5)).unwrap().breakdown.final_amount, dec!(450));
        assert_decimal_eq(bill(tiers(), dec!(12)).unwrap().breakdown.final_amount, dec!(1000));
    }

    #[test]
    fn test_below_threshold_charges_full_rate() {
        let data = priced(dec!(100))
            .with_client_discount(DiscountRuleBuilder::new(1).with_threshold(dec!(1000)).build());

        let outcome = bill(data, dec!(1)).unwrap();
        assert!(!outcome.breakdown.has_discount());
        assert_decimal_eq(outcome.breakdown.effective_rate, dec!(100));
    }

    #[test]
    fn test_rules_outside_static_criteria_are_ignored() {
        let data = priced(dec!(100))
            .with_discount(IdFixtures::OTHER_ACTOR, DiscountRuleBuilder::new(1).build())
            .with_client_discount(DiscountRuleBuilder::new(2).for_work_code_type("E").build())
            .with_client_discount(
                DiscountRuleBuilder::new(3).for_work_code(WorkCodeId::new("OTHER")).build(),
            )
            .with_client_discount(
                DiscountRuleBuilder::new(4).for_case_type(CaseTypeId::new(77)).build(),
            );

        let outcome = bill(data, dec!(1)).unwrap();
        assert!(!outcome.breakdown.has_discount());
    }

    #[test]
    fn test_rule_pinned_to_another_state_is_ignored() {
        let state = CaseFixtures::random_state();
        let data = priced(dec!(100))
            .with_client_discount(DiscountRuleBuilder::new(1).for_state(state.as_str()).build());

        let outcome = bill(data, dec!(1)).unwrap();
        assert!(!outcome.breakdown.has_discount());
    }

    #[test]
    fn test_fully_specific_rule() {
        let data = priced(dec!(100))
            .with_client_discount(
                DiscountRuleBuilder::new(1).for_work_code(IdFixtures::fee_work_code()).build(),
            )
            .with_client_discount(
                DiscountRuleBuilder::new(2).fully_specific().with_formula("@ * 0.25").build(),
            );

        let outcome = bill(data, dec!(1)).unwrap();
        assert_decimal_eq(outcome.breakdown.final_amount, dec!(75));
    }

    #[test]
    fn test_unknown_discount_type_is_fatal() {
        let data = priced(dec!(100))
            .with_client_discount(DiscountRuleBuilder::new(1).with_type_code(3).build());
        let error = bill(data, dec!(1)).unwrap_err();
        assert!(matches!(error, BillingError::UnknownDiscountKind(3)));
    }

    #[test]
    fn test_malformed_formula_is_fatal() {
        let data = priced(dec!(100))
            .with_client_discount(DiscountRuleBuilder::new(1).with_formula("@ *").build());
        let error = bill(data, dec!(1)).unwrap_err();
        assert!(matches!(error, BillingError::Formula { .. }));
        assert!(error.to_string().contains("@ *"));
    }

    #[test]
    fn test_strict_priority_rejects_tie() {
        let data = priced(dec!(100))
            .with_client_discount(
                DiscountRuleBuilder::new(1).for_state(CaseFixtures::STATE).build(),
            )
            .with_client_discount(
                DiscountRuleBuilder::new(2)
                    .for_state(CaseFixtures::STATE)
                    .with_threshold(dec!(10))
                    .build(),
            );
        let config = ConfigFixtures::standard().with_strict_discount_priority();

        let error = bill_configured(data, config, dec!(1)).unwrap_err();
        assert!(matches!(error, BillingError::AmbiguousDiscountPolicy { priority: 8, .. }));
        assert!(error.to_string().contains("Indistinct discount policy"));
    }
}

// ============================================================================
// Posting Tests
// ============================================================================

mod posting {
    use super::*;

    #[test]
    fn test_uncast_case_bills_at_default_price_without_discount() {
        init_test_tracing();
        let other = CaseFixtures::other(2);
        let data = ReferenceDataBuilder::new()
            .with_case(other.clone())
            .with_default_price(PriceListEntryBuilder::new().with_rate(dec!(90)).build())
            .with_client_discount(DiscountRuleBuilder::new(1).build())
            .build();
        let engine = BillingEngine::new(data, ConfigFixtures::standard());
        let request = BillingRequest::new(
            other.id,
            IdFixtures::fee_work_code(),
            IdFixtures::login(),
            WorkedHours::billable(dec!(2)),
            DateFixtures::billing_date(),
        );

        let outcome = engine.bill(&request).unwrap();
        assert_eq!(outcome.budget_line.case_id, CaseId::new(2));
        assert_eq!(outcome.rate.level, RateLevel::DefaultPriceList);
        assert_decimal_eq(outcome.breakdown.final_amount, dec!(180));
        assert!(!outcome.breakdown.has_discount());
    }

    #[test]
    fn test_drafts_mirror_request() {
        init_test_tracing();
        let data = ReferenceDataBuilder::new()
            .with_case_price(PriceListEntryBuilder::new().with_rate(dec!(80)).build())
            .build();
        let engine = BillingEngine::new(data, ConfigFixtures::standard());
        let request = BillingRequest::new(
            CaseFixtures::CASE_ID,
            IdFixtures::fee_work_code(),
            IdFixtures::login(),
            WorkedHours::from_seconds(9000, 5400),
            DateFixtures::billing_date(),
        )
        .with_activity_date(DateFixtures::last_year())
        .with_comment("Office action response");

        let outcome = engine.bill(&request).unwrap();
        let line = &outcome.budget_line;
        assert_eq!(line.case_id, CaseFixtures::CASE_ID);
        assert_decimal_eq(line.actual_hours, dec!(2.5));
        assert_decimal_eq(line.chargeable_hours, dec!(1.5));
        assert_decimal_eq(line.chargeable_amount, dec!(120));
        assert_eq!(line.activity_date, DateFixtures::last_year());
        assert_eq!(line.comment.as_deref(), Some("Office action response"));

        let registration = &outcome.time_registration;
        assert_decimal_eq(registration.actual_hours, dec!(2.5));
        assert_decimal_eq(registration.chargeable_hours, dec!(1.5));
        assert_eq!(registration.comment, line.comment);
    }

    #[test]
    fn test_zero_charge_work_code() {
        let data = ReferenceDataBuilder::new()
            .with_case_price(PriceListEntryBuilder::new().with_rate(dec!(80)).build())
            .with_client_discount(DiscountRuleBuilder::new(1).markup().with_formula("10").build());

        let outcome = bill_with(
            data,
            ConfigFixtures::standard(),
            IdFixtures::no_charge_work_code(),
            IdFixtures::login(),
            dec!(3),
        )
        .unwrap();

        assert_decimal_eq(outcome.budget_line.actual_hours, dec!(3));
        assert_decimal_eq(outcome.budget_line.chargeable_hours, dec!(0));
        assert_decimal_eq(outcome.breakdown.effective_rate, dec!(0));
        assert_decimal_eq(outcome.breakdown.discount_percentage, dec!(0));
    }

    #[test]
    fn test_unknown_case() {
        let engine =
            BillingEngine::new(ReferenceDataBuilder::new().build(), ConfigFixtures::standard());
        let request = BillingRequest::new(
            CaseId::new(404),
            IdFixtures::fee_work_code(),
            IdFixtures::login(),
            WorkedHours::billable(dec!(1)),
            DateFixtures::billing_date(),
        );
        assert!(matches!(engine.bill(&request), Err(BillingError::CaseNotFound(_))));
    }

    #[test]
    fn test_store_outage_is_transient() {
        let error = bill(ReferenceDataBuilder::new().unavailable(), dec!(1)).unwrap_err();
        assert!(matches!(error, BillingError::Store(_)));
        assert!(!error.is_permanent());
    }

    #[test]
    fn test_bill_is_deterministic() {
        let engine = BillingEngine::new(
            ReferenceDataBuilder::new()
                .with_case_price(PriceListEntryBuilder::new().with_rate(dec!(97.5)).build())
                .with_client_discount(DiscountRuleBuilder::new(1).with_formula("@ / 3").build())
                .build(),
            ConfigFixtures::standard(),
        );
        let request = BillingRequest::new(
            CaseFixtures::CASE_ID,
            IdFixtures::fee_work_code(),
            IdFixtures::login(),
            WorkedHours::billable(dec!(1.25)),
            DateFixtures::billing_date(),
        );

        assert_eq!(engine.bill(&request).unwrap(), engine.bill(&request).unwrap());
    }

    #[test]
    fn test_fixed_rate_skips_price_lists() {
        let engine: BillingEngine<MockReferenceData> = BillingEngine::new(
            ReferenceDataBuilder::new()
                .with_fixed_rate_work_code(dec!(150))
                .with_client_currency(CurrencyFixtures::eur())
                .build(),
            ConfigFixtures::standard(),
        );
        let request = BillingRequest::new(
            CaseFixtures::CASE_ID,
            IdFixtures::fixed_work_code(),
            IdFixtures::login(),
            WorkedHours::billable(dec!(1)),
            DateFixtures::billing_date(),
        );

        engine.bill(&request).unwrap();
        assert_eq!(engine.port().price_list_reads(), 0);
    }
}

// ============================================================================
// Property Tests
// ============================================================================

mod properties {
    use super::*;
    use proptest::prelude::*;
    use test_utils::{
        discount_rule_strategy, hours_strategy, positive_hours_strategy, rate_strategy,
        seconds_strategy,
    };

    proptest! {
        #[test]
        fn breakdown_is_always_consistent(
            hours in hours_strategy(),
            rate in rate_strategy(),
            rules in proptest::collection::vec(discount_rule_strategy(), 0..6),
        ) {
            let mut data = ReferenceDataBuilder::new()
                .with_case_price(PriceListEntryBuilder::new().with_rate(rate).build());
            for rule in rules {
                data = data.with_client_discount(rule);
            }

            let outcome = bill(data, hours).unwrap();
            assert_breakdown_consistent(&outcome.breakdown);
            prop_assert_eq!(outcome.currency, CurrencyFixtures::eur());
        }

        #[test]
        fn undiscounted_effective_rate_is_the_hourly_rate(
            hours in positive_hours_strategy(),
            rate in rate_strategy(),
        ) {
            let data = ReferenceDataBuilder::new()
                .with_case_price(PriceListEntryBuilder::new().with_rate(rate).build());

            let outcome = bill(data, hours).unwrap();
            prop_assert_eq!(outcome.breakdown.effective_rate, rate);
            prop_assert_eq!(outcome.budget_line.chargeable_hours, hours);
        }

        #[test]
        fn experience_weighting_never_exceeds_full_hours(
            secs in seconds_strategy(),
            experience in 0u32..=100,
        ) {
            let full = WorkedHours::to_hours(secs);
            prop_assert_eq!(WorkedHours::weighted(secs, 100), full);
            prop_assert!(WorkedHours::weighted(secs, experience) <= full);
            prop_assert!(full <= Decimal::from(24));
        }
    }
}
