use serde::{Deserialize, Serialize, Serializer};
use tracing::debug;

use crate::combinatorics::consecutive_pairs;
use crate::error::{LottoError, Result};
use crate::models::{DEFAULT_HIGH_THRESHOLD, Draw, NumberTable, POOL_SIZE};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatsStyle {
    #[default]
    Basic,
    Advanced,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatsOptions {
    /// Compter le numéro bonus dans les fréquences et les répartitions.
    pub include_bonus: bool,
    /// Bornes inclusives sur le numéro de tirage.
    pub draw_range: Option<(u32, u32)>,
    pub high_threshold: u8,
}

impl Default for StatsOptions {
    fn default() -> Self {
        Self {
            include_bonus: false,
            draw_range: None,
            high_threshold: DEFAULT_HIGH_THRESHOLD,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BasicStatistics {
    pub draw_count: usize,
    pub first_draw_no: Option<u32>,
    pub last_draw_no: Option<u32>,
    pub include_bonus: bool,
    pub frequency: NumberTable,
    pub odd_count: u32,
    pub even_count: u32,
    pub high_count: u32,
    pub low_count: u32,
    /// Tirages consécutifs les plus récents sans le numéro.
    pub miss_streak: NumberTable,
}

impl BasicStatistics {
    /// Les `n` numéros les plus fréquents (à égalité, le plus petit d'abord).
    pub fn hot_numbers(&self, n: usize) -> Vec<u8> {
        let mut ranked: Vec<(u8, u32)> = self.frequency.iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        let mut hot: Vec<u8> = ranked.into_iter().take(n).map(|(num, _)| num).collect();
        hot.sort_unstable();
        hot
    }

    /// Les `n` numéros les moins fréquents (à égalité, le plus petit d'abord).
    pub fn cold_numbers(&self, n: usize) -> Vec<u8> {
        let mut ranked: Vec<(u8, u32)> = self.frequency.iter().collect();
        ranked.sort_by(|a, b| a.1.cmp(&b.1).then(a.0.cmp(&b.0)));
        let mut cold: Vec<u8> = ranked.into_iter().take(n).map(|(num, _)| num).collect();
        cold.sort_unstable();
        cold
    }

    /// Numéros absents depuis au moins `threshold` tirages.
    pub fn missing_numbers(&self, threshold: u32) -> Vec<u8> {
        self.miss_streak
            .iter()
            .filter(|&(_, streak)| streak >= threshold)
            .map(|(num, _)| num)
            .collect()
    }

    pub fn odd_percentage(&self) -> f64 {
        percentage(self.odd_count, self.odd_count + self.even_count)
    }

    pub fn high_percentage(&self) -> f64 {
        percentage(self.high_count, self.high_count + self.low_count)
    }
}

fn percentage(part: u32, whole: u32) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

/// Occurrences de chaque paire consécutive `(n, n + 1)`, indexées par `n - 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PairTable([u32; POOL_SIZE - 1]);

impl Default for PairTable {
    fn default() -> Self {
        Self([0; POOL_SIZE - 1])
    }
}

impl PairTable {
    fn slot(low: u8) -> usize {
        debug_assert!((1..POOL_SIZE as u8).contains(&low), "paire {} hors de 1..={}", low, POOL_SIZE - 1);
        (low as usize).wrapping_sub(1)
    }

    /// Occurrences de `(low, low + 1)`. `low` doit être dans 1..=44, sinon panique.
    pub fn get(&self, low: u8) -> u32 {
        self.0[Self::slot(low)]
    }

    fn increment(&mut self, low: u8) {
        self.0[Self::slot(low)] += 1;
    }

    /// (bas, haut, occurrences) pour les paires observées au moins une fois.
    pub fn observed(&self) -> impl Iterator<Item = (u8, u8, u32)> + '_ {
        self.0
            .iter()
            .enumerate()
            .filter(|(_, &c)| c > 0)
            .map(|(i, &c)| ((i + 1) as u8, (i + 2) as u8, c))
    }
}

impl Serialize for PairTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_seq(self.0.iter())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DrawPairCount {
    pub draw_no: u32,
    pub pairs: u32,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ConsecutivePairStats {
    pub pair_counts: PairTable,
    /// Du plus récent au plus ancien.
    pub per_draw: Vec<DrawPairCount>,
    pub total_pairs: u32,
    pub draws_with_pairs: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdvancedStatistics {
    #[serde(flatten)]
    pub basic: BasicStatistics,
    pub consecutive: ConsecutivePairStats,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "style", rename_all = "lowercase")]
pub enum Statistics {
    Basic(BasicStatistics),
    Advanced(AdvancedStatistics),
}

impl Statistics {
    pub fn basic(&self) -> &BasicStatistics {
        match self {
            Statistics::Basic(b) => b,
            Statistics::Advanced(a) => &a.basic,
        }
    }
}

/// Tirages retenus dans la fenêtre, triés par numéro de tirage décroissant.
fn select_window<'a>(draws: &'a [Draw], options: &StatsOptions) -> Result<Vec<&'a Draw>> {
    if let Some((from, to)) = options.draw_range {
        if from > to {
            return Err(LottoError::invalid(format!(
                "Plage de tirages invalide : {} > {}",
                from, to
            )));
        }
    }
    let mut window: Vec<&Draw> = draws
        .iter()
        .filter(|d| match options.draw_range {
            Some((from, to)) => d.draw_no >= from && d.draw_no <= to,
            None => true,
        })
        .collect();
    window.sort_by(|a, b| b.draw_no.cmp(&a.draw_no));
    Ok(window)
}

fn tally_basic(window: &[&Draw], options: &StatsOptions) -> BasicStatistics {
    let mut frequency = NumberTable::default();
    let (mut odd_count, mut even_count, mut high_count, mut low_count) = (0u32, 0u32, 0u32, 0u32);

    for draw in window {
        let bonus = options.include_bonus.then_some(draw.bonus);
        for n in draw.numbers.iter().copied().chain(bonus) {
            frequency.increment(n);
            if n % 2 == 1 {
                odd_count += 1;
            } else {
                even_count += 1;
            }
            if n > options.high_threshold {
                high_count += 1;
            } else {
                low_count += 1;
            }
        }
    }

    // Un seul balayage à rebours par numéro, du tirage le plus récent vers le plus ancien.
    let mut miss_streak = NumberTable::filled(window.len() as u32);
    for number in 1..=POOL_SIZE as u8 {
        if let Some(pos) = window.iter().position(|d| d.contains(number)) {
            miss_streak.set(number, pos as u32);
        }
    }

    BasicStatistics {
        draw_count: window.len(),
        first_draw_no: window.last().map(|d| d.draw_no),
        last_draw_no: window.first().map(|d| d.draw_no),
        include_bonus: options.include_bonus,
        frequency,
        odd_count,
        even_count,
        high_count,
        low_count,
        miss_streak,
    }
}

fn tally_consecutive(window: &[&Draw]) -> ConsecutivePairStats {
    let mut stats = ConsecutivePairStats {
        per_draw: Vec::with_capacity(window.len()),
        ..Default::default()
    };

    for draw in window {
        let mut sorted = draw.numbers;
        sorted.sort_unstable();
        let mut pairs = 0u32;
        for (low, _) in consecutive_pairs(&sorted) {
            stats.pair_counts.increment(low);
            pairs += 1;
        }
        stats.total_pairs += pairs;
        if pairs > 0 {
            stats.draws_with_pairs += 1;
        }
        stats.per_draw.push(DrawPairCount {
            draw_no: draw.draw_no,
            pairs,
        });
    }

    stats
}

pub fn basic_statistics(draws: &[Draw], options: &StatsOptions) -> Result<BasicStatistics> {
    let window = select_window(draws, options)?;
    debug!("Statistiques de base sur {} tirages", window.len());
    Ok(tally_basic(&window, options))
}

pub fn advanced_statistics(draws: &[Draw], options: &StatsOptions) -> Result<AdvancedStatistics> {
    let window = select_window(draws, options)?;
    debug!("Statistiques avancées sur {} tirages", window.len());
    Ok(AdvancedStatistics {
        basic: tally_basic(&window, options),
        consecutive: tally_consecutive(&window),
    })
}

pub fn compute_statistics(draws: &[Draw], options: &StatsOptions, style: StatsStyle) -> Result<Statistics> {
    match style {
        StatsStyle::Basic => basic_statistics(draws, options).map(Statistics::Basic),
        StatsStyle::Advanced => advanced_statistics(draws, options).map(Statistics::Advanced),
    }
}
