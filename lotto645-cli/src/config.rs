use std::path::Path;

use anyhow::{Context, Result};

use lotto645_core::generator::PatternFilter;
use lotto645_core::models::ConstraintSet;

pub fn load_constraints(path: &Path) -> Result<ConstraintSet> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Impossible de lire {:?}", path))?;
    let constraints: ConstraintSet = serde_json::from_str(&json)
        .with_context(|| format!("Filtres invalides dans {:?}", path))?;
    constraints.validate()?;
    Ok(constraints)
}

pub fn load_pattern_filter(path: &Path) -> Result<PatternFilter> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Impossible de lire {:?}", path))?;
    let filter: PatternFilter = serde_json::from_str(&json)
        .with_context(|| format!("Profil invalide dans {:?}", path))?;
    Ok(filter)
}

/// Complète un profil fourni par l'utilisateur avec celui déduit de l'historique.
/// Les listes renseignées dans le fichier sont prioritaires.
pub fn merge_profile(user: PatternFilter, derived: PatternFilter) -> PatternFilter {
    let mut merged = user;
    let excluded = merged.excluded.clone();
    let drawable = |numbers: Vec<u8>| -> Vec<u8> {
        numbers.into_iter().filter(|n| !excluded.contains(n)).collect()
    };
    if merged.hot_numbers.is_empty() {
        merged.hot_numbers = drawable(derived.hot_numbers);
        merged.min_hot = derived.min_hot.min(merged.hot_numbers.len());
    }
    if merged.cold_numbers.is_empty() {
        merged.cold_numbers = drawable(derived.cold_numbers);
        merged.max_cold = merged.max_cold.or(derived.max_cold);
    }
    if merged.missing_numbers.is_empty() {
        merged.missing_numbers = derived
            .missing_numbers
            .into_iter()
            .filter(|n| !merged.fixed.contains(n))
            .collect();
    }
    if merged.previous_draw.is_none() {
        merged.previous_draw = derived.previous_draw;
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use lotto645_core::cancel::Cancellation;
    use lotto645_core::generator::generate;
    use lotto645_core::models::{Bounds, Combination, Ratio};
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::io::Write;

    fn write_json(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_constraints_partial() {
        let file = write_json(r#"{ "sum_range": { "min": 100, "max": 170 }, "odd_even": ["3:3", "4:2"] }"#);
        let constraints = load_constraints(file.path()).unwrap();
        assert_eq!(constraints.sum_range, Bounds::new(100, 170));
        assert_eq!(constraints.odd_even, vec![Ratio::new(3, 3), Ratio::new(4, 2)]);
        assert_eq!(constraints.high_threshold, 22);
    }

    #[test]
    fn test_load_constraints_rejects_invalid() {
        let file = write_json(r#"{ "sum_range": { "min": 200, "max": 100 } }"#);
        assert!(load_constraints(file.path()).is_err());
        let file = write_json(r#"{ "odd_even": ["4:4"] }"#);
        assert!(load_constraints(file.path()).is_err());
    }

    #[test]
    fn test_load_pattern_filter() {
        let file = write_json(r#"{ "fixed": [7], "excluded": [13, 44], "max_consecutive_pairs": 1 }"#);
        let filter = load_pattern_filter(file.path()).unwrap();
        assert_eq!(filter.fixed, vec![7]);
        assert_eq!(filter.excluded, vec![13, 44]);
        assert_eq!(filter.max_consecutive_pairs, Some(1));
    }

    #[test]
    fn test_merge_profile_keeps_user_lists() {
        let user = PatternFilter {
            hot_numbers: vec![1, 2, 3],
            fixed: vec![9],
            ..Default::default()
        };
        let derived = PatternFilter {
            hot_numbers: vec![40, 41],
            cold_numbers: vec![20, 21],
            max_cold: Some(2),
            missing_numbers: vec![9, 30],
            previous_draw: Some(Combination::new(&[1, 2, 3, 4, 5, 6]).unwrap()),
            ..Default::default()
        };
        let merged = merge_profile(user, derived);
        assert_eq!(merged.hot_numbers, vec![1, 2, 3]);
        assert_eq!(merged.cold_numbers, vec![20, 21]);
        assert_eq!(merged.max_cold, Some(2));
        assert_eq!(merged.missing_numbers, vec![30]);
        assert!(merged.previous_draw.is_some());
    }

    #[test]
    fn test_merge_profile_drops_excluded_hot_numbers() {
        let user = PatternFilter {
            excluded: vec![1, 2, 3, 4, 5, 6, 20],
            ..Default::default()
        };
        let derived = PatternFilter {
            hot_numbers: vec![1, 2, 3, 4, 5, 6],
            min_hot: 1,
            cold_numbers: vec![20, 21],
            ..Default::default()
        };
        let merged = merge_profile(user, derived);
        assert!(merged.hot_numbers.is_empty());
        assert_eq!(merged.min_hot, 0);
        assert_eq!(merged.cold_numbers, vec![21]);

        let mut rng = StdRng::seed_from_u64(42);
        let result = generate(&merged, 5, &mut rng, &Cancellation::none()).unwrap();
        assert_eq!(result.combinations.len(), 5);
        for generated in &result.combinations {
            assert!((1..=6).all(|n| !generated.numbers.contains(n)));
        }
    }
}
