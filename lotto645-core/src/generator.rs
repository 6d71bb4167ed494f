//! Génération aléatoire de combinaisons sous un profil de contraintes « souples »
//! (numéros chauds/froids, tirage précédent, numéros absents, règles numériques).

use std::collections::HashSet;
use std::fmt;

use rand::Rng;
use rand::seq::index;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::cancel::Cancellation;
use crate::combinatorics::{ac_value, consecutive_pairs, high_count, odd_count, sum};
use crate::error::{LottoError, Result};
use crate::filter::{FilterRejection, filter_report};
use crate::models::{
    Combination, ConstraintSet, Draw, FixedExcluded, PICK_COUNT, Ratio, TOTAL_COMBINATIONS,
    is_valid_number,
};
use crate::stats::BasicStatistics;

/// Budget de tentatives par combinaison demandée.
pub const ATTEMPTS_PER_TARGET: u64 = 2000;
/// Absence minimale (en tirages) pour qu'un numéro soit écarté par défaut.
pub const DEFAULT_MISSING_THRESHOLD: u32 = 30;
const DEADLINE_CHECK_INTERVAL: u64 = 1024;
const INITIAL_CAPACITY: usize = 64;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatternFilter {
    pub constraints: ConstraintSet,
    pub fixed: Vec<u8>,
    pub excluded: Vec<u8>,
    pub hot_numbers: Vec<u8>,
    /// Minimum de numéros chauds, appliqué si `hot_numbers` n'est pas vide.
    pub min_hot: usize,
    pub cold_numbers: Vec<u8>,
    pub max_cold: Option<usize>,
    pub previous_draw: Option<Combination>,
    /// Refuser exactement la combinaison du tirage précédent.
    pub avoid_previous: bool,
    pub max_previous_overlap: Option<usize>,
    /// Numéros absents depuis longtemps, toujours écartés.
    pub missing_numbers: Vec<u8>,
    pub max_consecutive_pairs: Option<usize>,
}

impl Default for PatternFilter {
    fn default() -> Self {
        Self {
            constraints: ConstraintSet::default(),
            fixed: Vec::new(),
            excluded: Vec::new(),
            hot_numbers: Vec::new(),
            min_hot: 1,
            cold_numbers: Vec::new(),
            max_cold: None,
            previous_draw: None,
            avoid_previous: true,
            max_previous_overlap: None,
            missing_numbers: Vec::new(),
            max_consecutive_pairs: None,
        }
    }
}

/// Paramètres de dérivation d'un profil à partir de l'historique.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileOptions {
    pub hot_count: usize,
    pub cold_count: usize,
    pub max_cold: Option<usize>,
    /// 0 désactive l'exclusion des numéros absents.
    pub missing_threshold: u32,
    pub avoid_previous: bool,
}

impl Default for ProfileOptions {
    fn default() -> Self {
        Self {
            hot_count: 6,
            cold_count: 6,
            max_cold: Some(2),
            missing_threshold: DEFAULT_MISSING_THRESHOLD,
            avoid_previous: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatternRejection {
    Missing(u8),
    PreviousDraw,
    PreviousOverlap { found: usize, max: usize },
    NotEnoughHot { found: usize, required: usize },
    TooManyCold { found: usize, max: usize },
    ConsecutivePairs { found: usize, max: usize },
    Filter(FilterRejection),
}

impl fmt::Display for PatternRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatternRejection::Missing(n) => write!(f, "numéro absent {} présent", n),
            PatternRejection::PreviousDraw => write!(f, "identique au tirage précédent"),
            PatternRejection::PreviousOverlap { found, max } => {
                write!(f, "{} numéros communs avec le tirage précédent (max {})", found, max)
            }
            PatternRejection::NotEnoughHot { found, required } => {
                write!(f, "{} numéros chauds (min {})", found, required)
            }
            PatternRejection::TooManyCold { found, max } => {
                write!(f, "{} numéros froids (max {})", found, max)
            }
            PatternRejection::ConsecutivePairs { found, max } => {
                write!(f, "{} paires consécutives (max {})", found, max)
            }
            PatternRejection::Filter(r) => write!(f, "{}", r),
        }
    }
}

/// Mesures d'une combinaison acceptée, utilisées pour l'étiquette et l'explication.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternEvaluation {
    pub sum: u32,
    pub ac: u8,
    pub odd_even: Ratio,
    pub high_low: Ratio,
    pub hot_hits: Vec<u8>,
    pub cold_hits: Vec<u8>,
    pub previous_overlap: Option<usize>,
    pub consecutive_pairs: usize,
}

impl PatternFilter {
    pub fn from_statistics(
        stats: &BasicStatistics,
        previous: Option<&Draw>,
        constraints: ConstraintSet,
        options: &ProfileOptions,
    ) -> Self {
        let hot_numbers = stats.hot_numbers(options.hot_count);
        // Un numéro ne peut pas être à la fois chaud et froid sur un historique court.
        let cold_numbers: Vec<u8> = stats
            .cold_numbers(options.cold_count)
            .into_iter()
            .filter(|n| !hot_numbers.contains(n))
            .collect();
        let missing_numbers = if options.missing_threshold == 0 {
            Vec::new()
        } else {
            stats.missing_numbers(options.missing_threshold)
        };

        Self {
            constraints,
            min_hot: if hot_numbers.is_empty() { 0 } else { 1 },
            hot_numbers,
            max_cold: options.max_cold,
            cold_numbers,
            previous_draw: previous.map(Combination::from),
            avoid_previous: options.avoid_previous,
            missing_numbers,
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.constraints.validate()?;
        FixedExcluded::new(self.fixed.clone(), self.excluded.clone()).validate()?;
        for &n in self
            .hot_numbers
            .iter()
            .chain(&self.cold_numbers)
            .chain(&self.missing_numbers)
        {
            if !is_valid_number(n) {
                return Err(LottoError::invalid(format!("Numéro {} hors limites (1-45)", n)));
            }
        }
        if let Some(n) = self.fixed.iter().find(|n| self.missing_numbers.contains(n)) {
            return Err(LottoError::invalid(format!(
                "Le numéro fixe {} fait partie des numéros absents écartés",
                n
            )));
        }
        if !self.hot_numbers.is_empty() && self.min_hot > PICK_COUNT {
            return Err(LottoError::invalid(format!(
                "Minimum de {} numéros chauds impossible (max {})",
                self.min_hot, PICK_COUNT
            )));
        }
        Ok(())
    }

    /// Les exclus plus les numéros absents, sans doublon.
    fn effective_selection(&self) -> FixedExcluded {
        let mut excluded = self.excluded.clone();
        for &n in &self.missing_numbers {
            if !excluded.contains(&n) {
                excluded.push(n);
            }
        }
        FixedExcluded::new(self.fixed.clone(), excluded)
    }

    /// Vérifie toutes les règles, les moins coûteuses d'abord.
    pub fn evaluate(&self, numbers: &[u8; PICK_COUNT]) -> std::result::Result<PatternEvaluation, PatternRejection> {
        if let Some(&n) = numbers.iter().find(|n| self.missing_numbers.contains(n)) {
            return Err(PatternRejection::Missing(n));
        }

        let previous_overlap = self.previous_draw.map(|prev| prev.overlap(numbers));
        if let Some(overlap) = previous_overlap {
            if self.avoid_previous && overlap == PICK_COUNT {
                return Err(PatternRejection::PreviousDraw);
            }
            if let Some(max) = self.max_previous_overlap {
                if overlap > max {
                    return Err(PatternRejection::PreviousOverlap { found: overlap, max });
                }
            }
        }

        let hot_hits: Vec<u8> = numbers
            .iter()
            .copied()
            .filter(|n| self.hot_numbers.contains(n))
            .collect();
        if !self.hot_numbers.is_empty() && hot_hits.len() < self.min_hot {
            return Err(PatternRejection::NotEnoughHot {
                found: hot_hits.len(),
                required: self.min_hot,
            });
        }

        let cold_hits: Vec<u8> = numbers
            .iter()
            .copied()
            .filter(|n| self.cold_numbers.contains(n))
            .collect();
        if let Some(max) = self.max_cold {
            if cold_hits.len() > max {
                return Err(PatternRejection::TooManyCold {
                    found: cold_hits.len(),
                    max,
                });
            }
        }

        let mut sorted = *numbers;
        sorted.sort_unstable();
        let pairs = consecutive_pairs(&sorted).count();
        if let Some(max) = self.max_consecutive_pairs {
            if pairs > max {
                return Err(PatternRejection::ConsecutivePairs { found: pairs, max });
            }
        }

        filter_report(numbers, &self.constraints).map_err(PatternRejection::Filter)?;

        Ok(PatternEvaluation {
            sum: sum(numbers),
            ac: ac_value(numbers),
            odd_even: Ratio::of_six(odd_count(numbers)),
            high_low: Ratio::of_six(high_count(numbers, self.constraints.high_threshold)),
            hot_hits,
            cold_hits,
            previous_overlap,
            consecutive_pairs: pairs,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeneratedCombination {
    pub numbers: Combination,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationResult {
    pub combinations: Vec<GeneratedCombination>,
    /// Explication alignée sur `combinations` par indice.
    pub reasoning: Vec<String>,
    pub attempts: u64,
}

fn label_for(eval: &PatternEvaluation, filter: &PatternFilter) -> Option<String> {
    if filter.hot_numbers.is_empty() && filter.cold_numbers.is_empty() {
        return None;
    }
    let label = if eval.hot_hits.len() >= 3 {
        "Tendance chaude"
    } else if eval.cold_hits.len() >= 2 {
        "Rattrapage froid"
    } else {
        "Équilibrée"
    };
    Some(label.to_string())
}

fn join_numbers(numbers: &[u8]) -> String {
    numbers.iter().map(|n| n.to_string()).collect::<Vec<_>>().join(", ")
}

fn explain(eval: &PatternEvaluation, filter: &PatternFilter) -> String {
    let c = &filter.constraints;
    let mut parts = vec![
        format!("Somme {} dans {}", eval.sum, c.sum_range),
        format!("impair:pair {}", eval.odd_even),
        format!("haut:bas {}", eval.high_low),
        format!("AC {}", eval.ac),
    ];
    if !filter.hot_numbers.is_empty() {
        if eval.hot_hits.is_empty() {
            parts.push("aucun numéro chaud".to_string());
        } else {
            parts.push(format!(
                "{} numéro(s) chaud(s) ({})",
                eval.hot_hits.len(),
                join_numbers(&eval.hot_hits)
            ));
        }
    }
    if !eval.cold_hits.is_empty() {
        parts.push(format!(
            "{} numéro(s) froid(s) ({})",
            eval.cold_hits.len(),
            join_numbers(&eval.cold_hits)
        ));
    }
    if eval.consecutive_pairs > 0 {
        parts.push(format!("{} paire(s) consécutive(s)", eval.consecutive_pairs));
    }
    if let Some(overlap) = eval.previous_overlap {
        parts.push(format!("{} numéro(s) commun(s) avec le tirage précédent", overlap));
    }
    if !filter.missing_numbers.is_empty() {
        parts.push(format!("{} numéro(s) absent(s) écarté(s)", filter.missing_numbers.len()));
    }
    parts.join(", ")
}

/// Fixes plus un tirage uniforme sans remise dans le pool disponible.
fn sample_candidate<R: Rng + ?Sized>(fixed: &[u8], pool: &[u8], rng: &mut R) -> [u8; PICK_COUNT] {
    let mut out = [0u8; PICK_COUNT];
    out[..fixed.len()].copy_from_slice(fixed);
    let k = PICK_COUNT - fixed.len();
    for (slot, idx) in out[fixed.len()..].iter_mut().zip(index::sample(rng, pool.len(), k).iter()) {
        *slot = pool[idx];
    }
    out.sort_unstable();
    out
}

/// Tire des combinaisons au hasard jusqu'à en retenir `count` distinctes passant le profil.
/// Échoue avec `GenerationExhausted` si le budget `ATTEMPTS_PER_TARGET × count` est épuisé.
pub fn generate<R: Rng + ?Sized>(
    filter: &PatternFilter,
    count: usize,
    rng: &mut R,
    cancel: &Cancellation,
) -> Result<GenerationResult> {
    if count == 0 {
        return Err(LottoError::invalid("Le nombre de combinaisons demandé doit être positif"));
    }
    if count as u64 > TOTAL_COMBINATIONS {
        return Err(LottoError::invalid(format!(
            "{} combinaisons demandées, l'univers n'en compte que {}",
            count, TOTAL_COMBINATIONS
        )));
    }
    filter.validate()?;

    let selection = filter.effective_selection();
    selection.validate()?;
    let pool = selection.available_pool();
    if pool.len() < selection.remaining_to_select() {
        warn!(
            "Pool de {} numéros insuffisant pour compléter {} fixes",
            pool.len(),
            selection.fixed.len()
        );
        return Err(LottoError::GenerationExhausted {
            target: count,
            accepted: 0,
            attempts: 0,
        });
    }

    let budget = ATTEMPTS_PER_TARGET.saturating_mul(count as u64);
    let capacity = count.min(INITIAL_CAPACITY);
    let mut seen: HashSet<[u8; PICK_COUNT]> = HashSet::with_capacity(capacity);
    let mut combinations = Vec::with_capacity(capacity);
    let mut reasoning = Vec::with_capacity(capacity);
    let mut attempts = 0u64;

    while combinations.len() < count {
        if attempts >= budget {
            warn!(
                "Budget épuisé : {}/{} combinaisons après {} tentatives",
                combinations.len(),
                count,
                attempts
            );
            return Err(LottoError::GenerationExhausted {
                target: count,
                accepted: combinations.len(),
                attempts,
            });
        }
        attempts += 1;
        if attempts % DEADLINE_CHECK_INTERVAL == 0 {
            cancel.check(attempts)?;
        }

        let candidate = sample_candidate(&selection.fixed, &pool, rng);
        match filter.evaluate(&candidate) {
            Ok(eval) => {
                if !seen.insert(candidate) {
                    trace!("Doublon écarté : {:?}", candidate);
                    continue;
                }
                combinations.push(GeneratedCombination {
                    numbers: Combination::from_sorted(candidate),
                    label: label_for(&eval, filter),
                });
                reasoning.push(explain(&eval, filter));
            }
            Err(rejection) => trace!("Candidat {:?} rejeté : {}", candidate, rejection),
        }
    }

    debug!("{} combinaisons générées en {} tentatives", combinations.len(), attempts);
    Ok(GenerationResult {
        combinations,
        reasoning,
        attempts,
    })
}
