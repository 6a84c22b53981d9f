//! Discount rule specificity ranking
//!
//! A rule's priority is a five-bit number built from which criteria it sets,
//! most significant first: case type (16), state (8), application type (4),
//! work code (2) and an exact time work-code type (1). A rule setting a
//! criterion therefore always outranks every rule that leaves it unset and
//! agrees on the more significant criteria.

use crate::model::TIME_WORK_CODE_TYPE;

/// Highest possible priority, a rule with every criterion set
pub const MAX_PRIORITY: u8 = 31;

/// Computes the rank of a discount rule from the criteria it sets
///
/// Work-code types other than the time type rank like an unset type; the
/// reference-data query never returns such rules.
pub fn priority(
    has_case_type: bool,
    has_state: bool,
    has_application_type: bool,
    has_work_code: bool,
    work_code_type: Option<&str>,
) -> u8 {
    let type_match = work_code_type == Some(TIME_WORK_CODE_TYPE);
    [has_case_type, has_state, has_application_type, has_work_code, type_match]
        .into_iter()
        .fold(0u8, |rank, bit| (rank << 1) | u8::from(bit))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn all_tuples() -> Vec<(bool, bool, bool, bool, Option<&'static str>)> {
        let mut tuples = Vec::with_capacity(32);
        for bits in 0u8..32 {
            tuples.push((
                bits & 16 != 0,
                bits & 8 != 0,
                bits & 4 != 0,
                bits & 2 != 0,
                if bits & 1 != 0 { Some(TIME_WORK_CODE_TYPE) } else { None },
            ));
        }
        tuples
    }

    #[test]
    fn test_every_combination_has_a_distinct_rank() {
        let ranks: HashSet<u8> = all_tuples()
            .into_iter()
            .map(|(c, s, a, w, t)| priority(c, s, a, w, t))
            .collect();
        assert_eq!(ranks.len(), 32);
        assert!(ranks.iter().all(|rank| *rank <= MAX_PRIORITY));
    }

    #[test]
    fn test_known_ranks() {
        assert_eq!(priority(false, false, false, false, None), 0);
        assert_eq!(priority(false, false, false, false, Some("T")), 1);
        assert_eq!(priority(false, false, false, true, None), 2);
        assert_eq!(priority(false, true, false, false, Some("T")), 9);
        assert_eq!(priority(true, false, false, false, None), 16);
        assert_eq!(priority(true, true, true, true, Some("T")), MAX_PRIORITY);
    }

    #[test]
    fn test_case_type_outranks_all_lower_criteria() {
        assert!(
            priority(true, false, false, false, None) > priority(false, true, true, true, Some("T"))
        );
    }

    #[test]
    fn test_other_work_code_types_rank_as_unset() {
        assert_eq!(
            priority(true, false, false, true, Some("E")),
            priority(true, false, false, true, None)
        );
    }

    #[test]
    fn test_rank_order_is_lexicographic_in_bit_order() {
        let mut tuples = all_tuples();
        // lexicographic order over (case type, state, app type, work code, type match)
        tuples.sort_by_key(|(c, s, a, w, t)| (*c, *s, *a, *w, t.is_some()));
        let ranks: Vec<u8> = tuples
            .into_iter()
            .map(|(c, s, a, w, t)| priority(c, s, a, w, t))
            .collect();
        let expected: Vec<u8> = (0..32).collect();
        assert_eq!(ranks, expected);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn setting_a_criterion_never_lowers_priority(
            flags in proptest::array::uniform4(any::<bool>()),
            type_match in any::<bool>(),
            index in 0usize..5,
        ) {
            let work_code_type = if type_match { Some(TIME_WORK_CODE_TYPE) } else { None };
            let before = priority(flags[0], flags[1], flags[2], flags[3], work_code_type);

            let mut raised = flags;
            let mut raised_type = work_code_type;
            if index < 4 {
                raised[index] = true;
            } else {
                raised_type = Some(TIME_WORK_CODE_TYPE);
            }
            let after = priority(raised[0], raised[1], raised[2], raised[3], raised_type);

            let already_set = if index < 4 { flags[index] } else { type_match };
            if already_set {
                prop_assert_eq!(after, before);
            } else {
                prop_assert!(after > before);
            }
        }
    }
}
