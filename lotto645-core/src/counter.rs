//! Dénombrement exhaustif des combinaisons compatibles avec des numéros
//! fixes/exclus et un jeu de règles.

use serde::Serialize;
use tracing::debug;

use crate::cancel::{CANCEL_CHECK_INTERVAL, Cancellation};
use crate::combinatorics::combination;
use crate::error::Result;
use crate::filter::passes_filters;
use crate::models::{Combination, ConstraintSet, FixedExcluded, PICK_COUNT, TOTAL_COMBINATIONS};

/// Parcours de toutes les façons de compléter les numéros fixes avec le pool
/// disponible. Le tableau d'indices avance sans récursion ; le tampon de sortie
/// est réutilisé d'une itération à l'autre.
#[derive(Debug, Clone)]
pub struct CombinationWalker {
    fixed: Vec<u8>,
    pool: Vec<u8>,
    indices: Vec<usize>,
    scratch: [u8; PICK_COUNT],
    started: bool,
    exhausted: bool,
}

impl CombinationWalker {
    pub fn new(selection: &FixedExcluded) -> Result<Self> {
        selection.validate()?;
        let pool = selection.available_pool();
        let k = selection.remaining_to_select();
        Ok(Self {
            fixed: selection.fixed.clone(),
            exhausted: pool.len() < k,
            indices: (0..k).collect(),
            pool,
            scratch: [0; PICK_COUNT],
            started: false,
        })
    }

    /// Nombre total de candidats que le parcours va produire.
    pub fn candidate_count(&self) -> u64 {
        combination(self.pool.len() as u64, self.indices.len() as u64)
    }

    /// Candidat suivant, trié, ou `None` une fois le parcours terminé.
    pub fn next_candidate(&mut self) -> Option<&[u8; PICK_COUNT]> {
        if self.exhausted {
            return None;
        }
        if self.started {
            if !self.advance() {
                self.exhausted = true;
                return None;
            }
        } else {
            self.started = true;
        }
        self.fill_scratch();
        Some(&self.scratch)
    }

    /// Incrémente l'indice le plus à droite qui n'a pas atteint son maximum et
    /// replace les suivants en valeurs consécutives.
    fn advance(&mut self) -> bool {
        let k = self.indices.len();
        let n = self.pool.len();
        let mut i = k;
        while i > 0 {
            i -= 1;
            if self.indices[i] < n - k + i {
                self.indices[i] += 1;
                for j in (i + 1)..k {
                    self.indices[j] = self.indices[j - 1] + 1;
                }
                return true;
            }
        }
        false
    }

    fn fill_scratch(&mut self) {
        let f = self.fixed.len();
        self.scratch[..f].copy_from_slice(&self.fixed);
        for (slot, &idx) in self.scratch[f..].iter_mut().zip(&self.indices) {
            *slot = self.pool[idx];
        }
        self.scratch.sort_unstable();
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepCount {
    pub total: u64,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilteredStep {
    pub total: u64,
    pub percentage: f64,
    /// Part de l'étape 1 conservée par les filtres, en pourcentage.
    pub ratio_from_step1: f64,
}

/// Étape 1 : fixes/exclus seuls. Étape 2 : avec les filtres, si fournis.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CountReport {
    pub step1: StepCount,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step2: Option<FilteredStep>,
}

fn percentage_of_universe(total: u64) -> f64 {
    total as f64 / TOTAL_COMBINATIONS as f64 * 100.0
}

/// Compte les combinaisons contenant tous les fixes, aucun exclu, et passant les filtres.
pub fn count_matching(
    selection: &FixedExcluded,
    constraints: Option<&ConstraintSet>,
    cancel: &Cancellation,
) -> Result<u64> {
    if let Some(c) = constraints {
        c.validate()?;
    }
    let mut walker = CombinationWalker::new(selection)?;
    debug!(
        "Énumération de {} candidats (fixes={:?}, exclus={})",
        walker.candidate_count(),
        selection.fixed,
        selection.excluded.len()
    );

    let mut iterations = 0u64;
    let mut matched = 0u64;
    while let Some(candidate) = walker.next_candidate() {
        if constraints.map_or(true, |c| passes_filters(candidate, c)) {
            matched += 1;
        }
        iterations += 1;
        if iterations % CANCEL_CHECK_INTERVAL == 0 {
            cancel.check(iterations)?;
        }
    }

    debug!("Énumération terminée : {}/{} combinaisons retenues", matched, iterations);
    Ok(matched)
}

/// Même parcours que `count_matching`, mais renvoie les `limit` premières
/// combinaisons retenues dans l'ordre du parcours.
pub fn enumerate_combinations(
    selection: &FixedExcluded,
    constraints: Option<&ConstraintSet>,
    limit: usize,
    cancel: &Cancellation,
) -> Result<Vec<Combination>> {
    if let Some(c) = constraints {
        c.validate()?;
    }
    let mut walker = CombinationWalker::new(selection)?;
    let mut found = Vec::with_capacity(limit.min(1024));
    let mut iterations = 0u64;

    while found.len() < limit {
        let Some(candidate) = walker.next_candidate() else {
            break;
        };
        if constraints.map_or(true, |c| passes_filters(candidate, c)) {
            found.push(Combination::from_sorted(*candidate));
        }
        iterations += 1;
        if iterations % CANCEL_CHECK_INTERVAL == 0 {
            cancel.check(iterations)?;
        }
    }

    Ok(found)
}

pub fn count_combinations(
    selection: &FixedExcluded,
    constraints: Option<&ConstraintSet>,
    cancel: &Cancellation,
) -> Result<CountReport> {
    selection.validate()?;
    let pool = selection.available_pool();
    let step1_total = combination(pool.len() as u64, selection.remaining_to_select() as u64);
    let step1 = StepCount {
        total: step1_total,
        percentage: percentage_of_universe(step1_total),
    };

    let step2 = match constraints {
        Some(c) => {
            let total = count_matching(selection, Some(c), cancel)?;
            let ratio_from_step1 = if step1_total == 0 {
                0.0
            } else {
                total as f64 / step1_total as f64 * 100.0
            };
            Some(FilteredStep {
                total,
                percentage: percentage_of_universe(total),
                ratio_from_step1,
            })
        }
        None => None,
    };

    Ok(CountReport { step1, step2 })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::AtomicBool;

    use super::*;
    use crate::error::LottoError;
    use crate::models::{Bounds, Ratio};

    fn sel(fixed: &[u8], excluded: &[u8]) -> FixedExcluded {
        FixedExcluded::new(fixed.to_vec(), excluded.to_vec())
    }

    fn collect_all(selection: &FixedExcluded) -> Vec<[u8; PICK_COUNT]> {
        let mut walker = CombinationWalker::new(selection).unwrap();
        let mut out = Vec::new();
        while let Some(c) = walker.next_candidate() {
            out.push(*c);
        }
        out
    }

    #[test]
    fn test_walker_small_pool() {
        // Pool restreint à 7 numéros → C(7, 6) = 7 candidats
        let excluded: Vec<u8> = (8..=45).collect();
        let all = collect_all(&sel(&[], &excluded));
        assert_eq!(all.len(), 7);
        assert_eq!(all[0], [1, 2, 3, 4, 5, 6]);
        assert_eq!(all[6], [2, 3, 4, 5, 6, 7]);
    }

    #[test]
    fn test_walker_candidates_are_distinct_and_contain_fixed() {
        let excluded: Vec<u8> = (15..=45).collect();
        let selection = sel(&[3, 9], &excluded);
        let all = collect_all(&selection);
        assert_eq!(all.len() as u64, combination(12, 4));
        let unique: std::collections::HashSet<_> = all.iter().collect();
        assert_eq!(unique.len(), all.len());
        for c in &all {
            assert!(c.contains(&3) && c.contains(&9));
            assert!(c.windows(2).all(|w| w[0] < w[1]));
        }
    }

    #[test]
    fn test_walker_all_fixed_yields_once() {
        let all = collect_all(&sel(&[6, 5, 4, 3, 2, 1], &[]));
        assert_eq!(all, vec![[1, 2, 3, 4, 5, 6]]);
    }

    #[test]
    fn test_walker_pool_too_small() {
        let excluded: Vec<u8> = (5..=45).collect();
        assert!(collect_all(&sel(&[1], &excluded)).is_empty());
        assert_eq!(count_matching(&sel(&[1], &excluded), None, &Cancellation::none()).unwrap(), 0);
    }

    #[test]
    fn test_count_all_fixed() {
        let cancel = Cancellation::none();
        let fixed = sel(&[1, 2, 3, 4, 5, 6], &[]);
        assert_eq!(count_matching(&fixed, None, &cancel).unwrap(), 1);

        let strict = ConstraintSet {
            sum_range: Bounds::new(100, 200),
            ..Default::default()
        };
        assert_eq!(count_matching(&fixed, Some(&strict), &cancel).unwrap(), 0);
    }

    #[test]
    fn test_count_matches_binomial_without_filters() {
        let cancel = Cancellation::none();
        let selection = sel(&[7, 21], &[1, 2, 3]);
        let counted = count_matching(&selection, Some(&ConstraintSet::default()), &cancel).unwrap();
        assert_eq!(counted, combination(40, 4));
    }

    #[test]
    fn test_count_invalid_inputs() {
        let cancel = Cancellation::none();
        let too_many = sel(&[1, 2, 3, 4, 5, 6, 7], &[]);
        assert!(matches!(
            count_matching(&too_many, None, &cancel),
            Err(LottoError::InvalidInput(_))
        ));
        let overlap = sel(&[1, 2, 3, 4, 5, 6], &[6]);
        assert!(matches!(
            count_combinations(&overlap, None, &cancel),
            Err(LottoError::InvalidInput(_))
        ));
        let bad_filter = ConstraintSet {
            ac_range: Bounds::new(5, 1),
            ..Default::default()
        };
        assert!(count_matching(&sel(&[1], &[]), Some(&bad_filter), &cancel).is_err());
    }

    #[test]
    fn test_count_is_deterministic() {
        let cancel = Cancellation::none();
        let selection = sel(&[5, 17, 33], &[]);
        let c = ConstraintSet {
            odd_even: vec![Ratio::new(3, 3), Ratio::new(4, 2)],
            ac_range: Bounds::new(6, 10),
            ..Default::default()
        };
        let a = count_matching(&selection, Some(&c), &cancel).unwrap();
        let b = count_matching(&selection, Some(&c), &cancel).unwrap();
        assert_eq!(a, b);
        assert!(a > 0 && a < combination(42, 3));
    }

    #[test]
    fn test_report_without_filters() {
        let report = count_combinations(&sel(&[], &[]), None, &Cancellation::none()).unwrap();
        assert_eq!(report.step1.total, TOTAL_COMBINATIONS);
        assert!((report.step1.percentage - 100.0).abs() < 1e-9);
        assert!(report.step2.is_none());
        let json = serde_json::to_value(&report).unwrap();
        assert!(json.get("step2").is_none());
    }

    #[test]
    fn test_report_with_filters() {
        let c = ConstraintSet {
            odd_even: vec![Ratio::new(3, 3)],
            ..Default::default()
        };
        let report = count_combinations(&sel(&[1, 2, 3, 4], &[]), Some(&c), &Cancellation::none()).unwrap();
        // 1, 3 impairs ; 2, 4 pairs → il faut 1 impair et 1 pair parmi 41 numéros
        assert_eq!(report.step1.total, combination(41, 2));
        let step2 = report.step2.clone().unwrap();
        // 5..=45 : 21 impairs, 20 pairs
        assert_eq!(step2.total, 21 * 20);
        assert!((step2.ratio_from_step1 - 420.0 / 820.0 * 100.0).abs() < 1e-9);
        let json = serde_json::to_value(&report).unwrap();
        assert!(json["step2"].get("ratioFromStep1").is_some());
    }

    #[test]
    fn test_enumerate_respects_limit_and_filters() {
        let c = ConstraintSet {
            odd_even: vec![Ratio::new(6, 0)],
            ..Default::default()
        };
        let found = enumerate_combinations(&sel(&[1], &[]), Some(&c), 5, &Cancellation::none()).unwrap();
        assert_eq!(found.len(), 5);
        assert_eq!(found[0].numbers(), &[1, 3, 5, 7, 9, 11]);
        for combo in &found {
            assert!(combo.numbers().iter().all(|n| n % 2 == 1));
        }
        assert!(enumerate_combinations(&sel(&[1], &[]), None, 0, &Cancellation::none())
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_cancelled_enumeration_fails() {
        let flag = Arc::new(AtomicBool::new(true));
        let cancel = Cancellation::none().with_flag(flag);
        let err = count_matching(&sel(&[], &[]), None, &cancel).unwrap_err();
        assert_eq!(
            err,
            LottoError::Cancelled {
                iterations: CANCEL_CHECK_INTERVAL
            }
        );
    }

    #[test]
    fn test_small_enumeration_finishes_before_check() {
        // Moins d'itérations que l'intervalle de vérification : aucune interruption
        let flag = Arc::new(AtomicBool::new(true));
        let cancel = Cancellation::none().with_flag(flag);
        assert_eq!(count_matching(&sel(&[1, 2, 3], &[]), None, &cancel).unwrap(), combination(42, 3));
    }
}
