use std::fmt;

use crate::combinatorics::{ac_value, high_count, odd_count, sum};
use crate::models::{ConstraintSet, PICK_COUNT, Ratio};

/// Première règle non respectée par une combinaison.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterRejection {
    Sum(u32),
    OddEven(Ratio),
    HighLow(Ratio),
    Ac(u8),
}

impl fmt::Display for FilterRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterRejection::Sum(s) => write!(f, "somme {} hors intervalle", s),
            FilterRejection::OddEven(r) => write!(f, "ratio impair:pair {} non retenu", r),
            FilterRejection::HighLow(r) => write!(f, "ratio haut:bas {} non retenu", r),
            FilterRejection::Ac(ac) => write!(f, "valeur AC {} hors intervalle", ac),
        }
    }
}

/// Évalue les règles de la moins coûteuse à la plus coûteuse et s'arrête au premier échec.
pub fn filter_report(numbers: &[u8; PICK_COUNT], constraints: &ConstraintSet) -> Result<(), FilterRejection> {
    let total = sum(numbers);
    if !constraints.sum_range.contains(total) {
        return Err(FilterRejection::Sum(total));
    }

    if !constraints.odd_even.is_empty() {
        let ratio = Ratio::of_six(odd_count(numbers));
        if !constraints.odd_even.contains(&ratio) {
            return Err(FilterRejection::OddEven(ratio));
        }
    }

    if !constraints.high_low.is_empty() {
        let ratio = Ratio::of_six(high_count(numbers, constraints.high_threshold));
        if !constraints.high_low.contains(&ratio) {
            return Err(FilterRejection::HighLow(ratio));
        }
    }

    let ac = ac_value(numbers);
    if !constraints.ac_range.contains(ac as u32) {
        return Err(FilterRejection::Ac(ac));
    }

    Ok(())
}

pub fn passes_filters(numbers: &[u8; PICK_COUNT], constraints: &ConstraintSet) -> bool {
    filter_report(numbers, constraints).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Bounds;

    #[test]
    fn test_default_accepts_everything() {
        let c = ConstraintSet::default();
        assert!(passes_filters(&[1, 2, 3, 4, 5, 6], &c));
        assert!(passes_filters(&[40, 41, 42, 43, 44, 45], &c));
    }

    #[test]
    fn test_sum_range() {
        let c = ConstraintSet {
            sum_range: Bounds::new(100, 150),
            ..Default::default()
        };
        assert_eq!(filter_report(&[1, 2, 3, 4, 5, 6], &c), Err(FilterRejection::Sum(21)));
        assert!(passes_filters(&[10, 15, 20, 25, 30, 35], &c));
    }

    #[test]
    fn test_odd_even_membership() {
        let c = ConstraintSet {
            odd_even: vec![Ratio::new(3, 3)],
            ..Default::default()
        };
        assert!(passes_filters(&[1, 2, 3, 4, 5, 6], &c));
        assert_eq!(
            filter_report(&[1, 3, 5, 7, 9, 10], &c),
            Err(FilterRejection::OddEven(Ratio::new(5, 1)))
        );
    }

    #[test]
    fn test_high_low_uses_threshold() {
        let c = ConstraintSet {
            high_low: vec![Ratio::new(3, 3)],
            ..Default::default()
        };
        // 22 est bas, 23 est haut
        assert!(passes_filters(&[1, 2, 22, 23, 24, 25], &c));
        assert!(!passes_filters(&[1, 2, 23, 24, 25, 26], &c));

        let shifted = ConstraintSet {
            high_threshold: 2,
            ..c
        };
        assert!(!passes_filters(&[1, 2, 22, 23, 24, 25], &shifted));
    }

    #[test]
    fn test_ac_range() {
        let c = ConstraintSet {
            ac_range: Bounds::new(7, 10),
            ..Default::default()
        };
        assert_eq!(filter_report(&[1, 2, 3, 4, 5, 6], &c), Err(FilterRejection::Ac(0)));
        assert!(passes_filters(&[1, 2, 4, 8, 16, 32], &c));
    }

    #[test]
    fn test_short_circuit_reports_first_failure() {
        let c = ConstraintSet {
            sum_range: Bounds::new(200, 255),
            odd_even: vec![Ratio::new(0, 6)],
            ac_range: Bounds::new(10, 10),
            ..Default::default()
        };
        assert!(matches!(filter_report(&[1, 2, 3, 4, 5, 6], &c), Err(FilterRejection::Sum(_))));
    }
}
