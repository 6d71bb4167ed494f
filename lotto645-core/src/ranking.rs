use std::fmt;

use serde::Serialize;

use crate::error::{LottoError, Result};
use crate::models::{Combination, Draw, is_valid_number};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Rank {
    First,
    Second,
    Third,
    Fourth,
    Fifth,
    NoWin,
}

impl Rank {
    /// 1 à 5, 0 pour « perdu ».
    pub fn as_u8(&self) -> u8 {
        match self {
            Rank::First => 1,
            Rank::Second => 2,
            Rank::Third => 3,
            Rank::Fourth => 4,
            Rank::Fifth => 5,
            Rank::NoWin => 0,
        }
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rank::NoWin => write!(f, "Perdu"),
            rank => write!(f, "Rang {}", rank.as_u8()),
        }
    }
}

/// Combinaison gagnante et numéro bonus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WinningNumbers {
    pub numbers: Combination,
    pub bonus: u8,
}

impl WinningNumbers {
    pub fn new(numbers: Combination, bonus: u8) -> Result<Self> {
        if !is_valid_number(bonus) {
            return Err(LottoError::invalid(format!("Numéro bonus {} hors limites (1-45)", bonus)));
        }
        if numbers.contains(bonus) {
            return Err(LottoError::invalid(format!(
                "Le numéro bonus {} figure parmi les numéros gagnants",
                bonus
            )));
        }
        Ok(Self { numbers, bonus })
    }
}

impl From<&Draw> for WinningNumbers {
    fn from(draw: &Draw) -> Self {
        Self {
            numbers: Combination::from(draw),
            bonus: draw.bonus,
        }
    }
}

pub fn calculate_ranking(combination: &Combination, winning: &WinningNumbers) -> Rank {
    let matched = combination.overlap(winning.numbers.numbers());
    match matched {
        6 => Rank::First,
        5 if combination.contains(winning.bonus) => Rank::Second,
        5 => Rank::Third,
        4 => Rank::Fourth,
        3 => Rank::Fifth,
        _ => Rank::NoWin,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct RankTally {
    pub first: u64,
    pub second: u64,
    pub third: u64,
    pub fourth: u64,
    pub fifth: u64,
    pub no_win: u64,
    pub total: u64,
}

impl RankTally {
    pub fn record(&mut self, rank: Rank) {
        let bucket = match rank {
            Rank::First => &mut self.first,
            Rank::Second => &mut self.second,
            Rank::Third => &mut self.third,
            Rank::Fourth => &mut self.fourth,
            Rank::Fifth => &mut self.fifth,
            Rank::NoWin => &mut self.no_win,
        };
        *bucket += 1;
        self.total += 1;
    }

    pub fn count(&self, rank: Rank) -> u64 {
        match rank {
            Rank::First => self.first,
            Rank::Second => self.second,
            Rank::Third => self.third,
            Rank::Fourth => self.fourth,
            Rank::Fifth => self.fifth,
            Rank::NoWin => self.no_win,
        }
    }

    pub fn winners(&self) -> u64 {
        self.total - self.no_win
    }
}

pub fn aggregate_rankings(combinations: &[Combination], winning: &WinningNumbers) -> RankTally {
    let mut tally = RankTally::default();
    for combination in combinations {
        tally.record(calculate_ranking(combination, winning));
    }
    tally
}
