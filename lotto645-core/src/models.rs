use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize, Serializer};

use crate::error::{LottoError, Result};

/// Taille de l'univers des numéros (1..=45).
pub const POOL_SIZE: usize = 45;
/// Numéros principaux par combinaison.
pub const PICK_COUNT: usize = 6;
/// Seuil haut/bas : un numéro est « haut » s'il est strictement supérieur.
pub const DEFAULT_HIGH_THRESHOLD: u8 = 22;
/// C(45, 6).
pub const TOTAL_COMBINATIONS: u64 = 8_145_060;

/// Plus petite et plus grande somme possibles de six numéros distincts.
pub const MIN_SUM: u32 = 21;
pub const MAX_SUM: u32 = 255;
/// Valeur AC maximale pour six numéros (15 différences distinctes - 5).
pub const MAX_AC: u32 = 10;

pub fn is_valid_number(n: u8) -> bool {
    (1..=POOL_SIZE as u8).contains(&n)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Draw {
    pub draw_no: u32,
    pub date: NaiveDate,
    /// Triés par ordre croissant.
    pub numbers: [u8; PICK_COUNT],
    pub bonus: u8,
}

impl Draw {
    pub fn new(draw_no: u32, date: NaiveDate, numbers: [u8; PICK_COUNT], bonus: u8) -> Result<Self> {
        if draw_no == 0 {
            return Err(LottoError::invalid("Le numéro de tirage doit être positif"));
        }
        validate_draw(&numbers, bonus)?;
        let mut numbers = numbers;
        numbers.sort_unstable();
        Ok(Self {
            draw_no,
            date,
            numbers,
            bonus,
        })
    }

    pub fn contains(&self, n: u8) -> bool {
        self.numbers.contains(&n)
    }
}

pub fn validate_draw(numbers: &[u8; PICK_COUNT], bonus: u8) -> Result<()> {
    validate_numbers(numbers)?;
    if !is_valid_number(bonus) {
        return Err(LottoError::invalid(format!(
            "Numéro bonus {} hors limites (1-{})",
            bonus, POOL_SIZE
        )));
    }
    if numbers.contains(&bonus) {
        return Err(LottoError::invalid(format!(
            "Le numéro bonus {} figure parmi les numéros principaux",
            bonus
        )));
    }
    Ok(())
}

fn validate_numbers(numbers: &[u8]) -> Result<()> {
    if numbers.len() != PICK_COUNT {
        return Err(LottoError::invalid(format!(
            "Une combinaison contient exactement {} numéros, reçu {}",
            PICK_COUNT,
            numbers.len()
        )));
    }
    for &n in numbers {
        if !is_valid_number(n) {
            return Err(LottoError::invalid(format!(
                "Numéro {} hors limites (1-{})",
                n, POOL_SIZE
            )));
        }
    }
    for i in 0..numbers.len() {
        for j in (i + 1)..numbers.len() {
            if numbers[i] == numbers[j] {
                return Err(LottoError::invalid(format!("Numéro en double : {}", numbers[i])));
            }
        }
    }
    Ok(())
}

/// Six numéros distincts de 1 à 45, conservés triés.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "Vec<u8>", into = "Vec<u8>")]
pub struct Combination([u8; PICK_COUNT]);

impl Combination {
    pub fn new(numbers: &[u8]) -> Result<Self> {
        validate_numbers(numbers)?;
        let mut arr = [0u8; PICK_COUNT];
        arr.copy_from_slice(numbers);
        arr.sort_unstable();
        Ok(Self(arr))
    }

    /// `numbers` doit déjà être valide et trié.
    pub(crate) fn from_sorted(numbers: [u8; PICK_COUNT]) -> Self {
        debug_assert!(numbers.windows(2).all(|w| w[0] < w[1]));
        Self(numbers)
    }

    pub fn numbers(&self) -> &[u8; PICK_COUNT] {
        &self.0
    }

    pub fn contains(&self, n: u8) -> bool {
        self.0.contains(&n)
    }

    /// Nombre de numéros en commun avec `other`.
    pub fn overlap(&self, other: &[u8]) -> usize {
        self.0.iter().filter(|n| other.contains(n)).count()
    }
}

impl TryFrom<Vec<u8>> for Combination {
    type Error = LottoError;

    fn try_from(v: Vec<u8>) -> Result<Self> {
        Combination::new(&v)
    }
}

impl From<Combination> for Vec<u8> {
    fn from(c: Combination) -> Self {
        c.0.to_vec()
    }
}

impl From<&Draw> for Combination {
    fn from(draw: &Draw) -> Self {
        let mut numbers = draw.numbers;
        numbers.sort_unstable();
        Combination(numbers)
    }
}

impl fmt::Display for Combination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = self
            .0
            .iter()
            .map(|n| format!("{:2}", n))
            .collect::<Vec<_>>()
            .join(" - ");
        write!(f, "{s}")
    }
}

/// Étiquette de répartition `a:b` (impair:pair ou haut:bas).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Ratio {
    pub left: u8,
    pub right: u8,
}

impl Ratio {
    pub fn new(left: u8, right: u8) -> Self {
        Self { left, right }
    }

    /// Répartition d'une combinaison de six numéros dont `left` ont la propriété.
    pub fn of_six(left: u8) -> Self {
        Self {
            left,
            right: PICK_COUNT as u8 - left,
        }
    }
}

impl fmt::Display for Ratio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.left, self.right)
    }
}

impl FromStr for Ratio {
    type Err = LottoError;

    fn from_str(s: &str) -> Result<Self> {
        let (l, r) = s
            .trim()
            .split_once(':')
            .ok_or_else(|| LottoError::invalid(format!("Ratio invalide : '{}'", s)))?;
        let parse = |p: &str| {
            p.trim()
                .parse::<u8>()
                .ok()
                .filter(|&v| v as usize <= PICK_COUNT)
                .ok_or_else(|| LottoError::invalid(format!("Ratio invalide : '{}'", s)))
        };
        Ok(Ratio::new(parse(l)?, parse(r)?))
    }
}

impl TryFrom<String> for Ratio {
    type Error = LottoError;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<Ratio> for String {
    fn from(r: Ratio) -> Self {
        r.to_string()
    }
}

/// Intervalle inclusif `[min, max]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bounds {
    pub min: u32,
    pub max: u32,
}

impl Bounds {
    pub fn new(min: u32, max: u32) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, value: u32) -> bool {
        value >= self.min && value <= self.max
    }

    pub fn validate(&self, name: &str) -> Result<()> {
        if self.min > self.max {
            return Err(LottoError::invalid(format!(
                "Intervalle {} invalide : min {} > max {}",
                name, self.min, self.max
            )));
        }
        Ok(())
    }
}

impl fmt::Display for Bounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.min, self.max)
    }
}

/// Règles numériques appliquées à une combinaison candidate.
/// Une liste de ratios vide signifie « pas de contrainte ».
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConstraintSet {
    pub sum_range: Bounds,
    pub odd_even: Vec<Ratio>,
    pub high_low: Vec<Ratio>,
    pub ac_range: Bounds,
    pub high_threshold: u8,
}

impl Default for ConstraintSet {
    fn default() -> Self {
        Self {
            sum_range: Bounds::new(MIN_SUM, MAX_SUM),
            odd_even: Vec::new(),
            high_low: Vec::new(),
            ac_range: Bounds::new(0, MAX_AC),
            high_threshold: DEFAULT_HIGH_THRESHOLD,
        }
    }
}

impl ConstraintSet {
    pub fn validate(&self) -> Result<()> {
        self.sum_range.validate("de somme")?;
        self.ac_range.validate("AC")?;
        if self.high_threshold == 0 || self.high_threshold as usize >= POOL_SIZE {
            return Err(LottoError::invalid(format!(
                "Seuil haut/bas {} hors limites (1-{})",
                self.high_threshold,
                POOL_SIZE - 1
            )));
        }
        for ratio in self.odd_even.iter().chain(self.high_low.iter()) {
            if ratio.left as usize + ratio.right as usize != PICK_COUNT {
                return Err(LottoError::invalid(format!(
                    "Le ratio {} ne totalise pas {} numéros",
                    ratio, PICK_COUNT
                )));
            }
        }
        Ok(())
    }
}

/// Numéros imposés et interdits.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FixedExcluded {
    pub fixed: Vec<u8>,
    pub excluded: Vec<u8>,
}

impl FixedExcluded {
    pub fn new(fixed: Vec<u8>, excluded: Vec<u8>) -> Self {
        Self { fixed, excluded }
    }

    pub fn validate(&self) -> Result<()> {
        if self.fixed.len() > PICK_COUNT {
            return Err(LottoError::invalid(format!(
                "{} numéros fixes, maximum {}",
                self.fixed.len(),
                PICK_COUNT
            )));
        }
        let mut seen = [0u8; POOL_SIZE];
        for &n in self.fixed.iter().chain(self.excluded.iter()) {
            if !is_valid_number(n) {
                return Err(LottoError::invalid(format!(
                    "Numéro {} hors limites (1-{})",
                    n, POOL_SIZE
                )));
            }
            seen[(n - 1) as usize] += 1;
        }
        if let Some(n) = self.fixed.iter().find(|n| self.excluded.contains(n)) {
            return Err(LottoError::invalid(format!(
                "Le numéro {} est à la fois fixe et exclu",
                n
            )));
        }
        if let Some(idx) = seen.iter().position(|&c| c > 1) {
            return Err(LottoError::invalid(format!("Numéro en double : {}", idx + 1)));
        }
        Ok(())
    }

    /// Numéros restant à choisir pour compléter une combinaison.
    pub fn remaining_to_select(&self) -> usize {
        PICK_COUNT.saturating_sub(self.fixed.len())
    }

    /// Univers privé des fixes et des exclus, trié.
    pub fn available_pool(&self) -> Vec<u8> {
        (1..=POOL_SIZE as u8)
            .filter(|n| !self.fixed.contains(n) && !self.excluded.contains(n))
            .collect()
    }
}

/// Compteur par numéro, indexé par `numéro - 1`. Les 45 numéros sont toujours présents.
/// Les accès attendent un numéro dans 1..=45 et paniquent sinon.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NumberTable([u32; POOL_SIZE]);

impl Default for NumberTable {
    fn default() -> Self {
        Self([0; POOL_SIZE])
    }
}

impl NumberTable {
    fn slot(number: u8) -> usize {
        debug_assert!(is_valid_number(number), "numéro {} hors de 1..={}", number, POOL_SIZE);
        (number as usize).wrapping_sub(1)
    }

    pub fn filled(value: u32) -> Self {
        Self([value; POOL_SIZE])
    }

    pub fn get(&self, number: u8) -> u32 {
        self.0[Self::slot(number)]
    }

    pub fn set(&mut self, number: u8, value: u32) {
        self.0[Self::slot(number)] = value;
    }

    pub fn increment(&mut self, number: u8) {
        self.0[Self::slot(number)] += 1;
    }

    pub fn total(&self) -> u64 {
        self.0.iter().map(|&c| c as u64).sum()
    }

    /// Paires (numéro, valeur) de 1 à 45.
    pub fn iter(&self) -> impl Iterator<Item = (u8, u32)> + '_ {
        self.0.iter().enumerate().map(|(i, &c)| ((i + 1) as u8, c))
    }
}

impl Serialize for NumberTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_seq(self.0.iter())
    }
}

/// Historique synthétique valide, du plus récent (draws[0]) au plus ancien.
#[cfg(test)]
pub(crate) fn make_test_draws(n: usize) -> Vec<Draw> {
    let origin = NaiveDate::default();
    (0..n)
        .map(|i| {
            let base = (i % 8) as u8 * 5;
            let age = (n - 1 - i) as i64;
            Draw {
                draw_no: (n - i) as u32,
                date: origin + chrono::Duration::days(7 * age),
                numbers: [base + 1, base + 2, base + 3, base + 4, base + 5, 41 + (i % 5) as u8],
                bonus: (base + 20) % 40 + 1,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 6).unwrap()
    }

    #[test]
    fn test_validate_draw_ok() {
        assert!(validate_draw(&[1, 2, 3, 4, 5, 6], 7).is_ok());
        assert!(validate_draw(&[45, 44, 43, 42, 41, 40], 1).is_ok());
    }

    #[test]
    fn test_validate_draw_out_of_range() {
        assert!(validate_draw(&[0, 2, 3, 4, 5, 6], 7).is_err());
        assert!(validate_draw(&[1, 2, 3, 4, 5, 46], 7).is_err());
        assert!(validate_draw(&[1, 2, 3, 4, 5, 6], 46).is_err());
    }

    #[test]
    fn test_validate_draw_duplicates() {
        assert!(validate_draw(&[1, 1, 3, 4, 5, 6], 7).is_err());
        assert!(validate_draw(&[1, 2, 3, 4, 5, 6], 6).is_err());
    }

    #[test]
    fn test_draw_new_sorts_numbers() {
        let draw = Draw::new(1, date(), [6, 5, 4, 3, 2, 1], 7).unwrap();
        assert_eq!(draw.numbers, [1, 2, 3, 4, 5, 6]);
        assert!(Draw::new(0, date(), [1, 2, 3, 4, 5, 6], 7).is_err());
    }

    #[test]
    fn test_combination_new() {
        let c = Combination::new(&[40, 3, 22, 1, 17, 9]).unwrap();
        assert_eq!(c.numbers(), &[1, 3, 9, 17, 22, 40]);
        assert!(Combination::new(&[1, 2, 3, 4, 5]).is_err());
        assert!(Combination::new(&[1, 2, 3, 4, 5, 5]).is_err());
        assert!(Combination::new(&[1, 2, 3, 4, 5, 50]).is_err());
    }

    #[test]
    fn test_combination_serde() {
        let c: Combination = serde_json::from_str("[6, 5, 4, 3, 2, 1]").unwrap();
        assert_eq!(c.numbers(), &[1, 2, 3, 4, 5, 6]);
        assert!(serde_json::from_str::<Combination>("[1, 1, 2, 3, 4, 5]").is_err());
    }

    #[test]
    fn test_ratio_parse_and_display() {
        let r: Ratio = "4:2".parse().unwrap();
        assert_eq!(r, Ratio::new(4, 2));
        assert_eq!(r.to_string(), "4:2");
        assert!("42".parse::<Ratio>().is_err());
        assert!("a:2".parse::<Ratio>().is_err());
        assert_eq!(Ratio::of_six(1), Ratio::new(1, 5));
    }

    #[test]
    fn test_constraint_set_partial_json() {
        let c: ConstraintSet = serde_json::from_str(r#"{"odd_even": ["3:3", "4:2"]}"#).unwrap();
        assert_eq!(c.odd_even.len(), 2);
        assert_eq!(c.sum_range, Bounds::new(MIN_SUM, MAX_SUM));
        assert_eq!(c.high_threshold, DEFAULT_HIGH_THRESHOLD);
        assert!(c.validate().is_ok());
    }

    #[test]
    fn test_constraint_set_validate() {
        let mut c = ConstraintSet::default();
        c.sum_range = Bounds::new(200, 100);
        assert!(c.validate().is_err());

        let mut c = ConstraintSet::default();
        c.odd_even = vec![Ratio::new(3, 2)];
        assert!(c.validate().is_err());

        let mut c = ConstraintSet::default();
        c.high_threshold = 45;
        assert!(c.validate().is_err());
    }

    #[test]
    fn test_oversized_ratio_is_invalid() {
        for raw in [r#"{"odd_even": ["250:12"]}"#, r#"{"high_low": ["200:100"]}"#] {
            let err = serde_json::from_str::<ConstraintSet>(raw).unwrap_err();
            assert!(err.to_string().contains("Ratio invalide"), "{}", err);
        }
        assert!("7:0".parse::<Ratio>().is_err());

        let c = ConstraintSet {
            odd_even: vec![Ratio::new(250, 12)],
            ..Default::default()
        };
        assert!(matches!(c.validate(), Err(LottoError::InvalidInput(_))));
    }

    #[test]
    fn test_fixed_excluded_validate() {
        assert!(FixedExcluded::new(vec![1, 2], vec![3]).validate().is_ok());
        assert!(FixedExcluded::new(vec![1, 2, 3, 4, 5, 6, 7], vec![]).validate().is_err());
        assert!(FixedExcluded::new(vec![1, 2], vec![2]).validate().is_err());
        assert!(FixedExcluded::new(vec![1, 1], vec![]).validate().is_err());
        assert!(FixedExcluded::new(vec![], vec![46]).validate().is_err());
    }

    #[test]
    fn test_available_pool() {
        let sel = FixedExcluded::new(vec![1, 2], vec![45]);
        let pool = sel.available_pool();
        assert_eq!(pool.len(), 42);
        assert_eq!(pool[0], 3);
        assert_eq!(*pool.last().unwrap(), 44);
        assert_eq!(sel.remaining_to_select(), 4);
    }

    #[test]
    fn test_number_table() {
        let mut t = NumberTable::default();
        t.increment(1);
        t.increment(45);
        t.increment(45);
        assert_eq!(t.get(1), 1);
        assert_eq!(t.get(45), 2);
        assert_eq!(t.iter().count(), POOL_SIZE);
        assert_eq!(t.total(), 3);
        assert_eq!(serde_json::to_value(t).unwrap().as_array().unwrap().len(), POOL_SIZE);
    }

    #[test]
    #[should_panic]
    fn test_number_table_rejects_zero() {
        NumberTable::default().get(0);
    }

    #[test]
    #[should_panic]
    fn test_number_table_rejects_46() {
        NumberTable::default().increment(46);
    }

    #[test]
    fn test_make_test_draws_valid() {
        let draws = make_test_draws(40);
        assert_eq!(draws[0].draw_no, 40);
        assert_eq!(draws[39].draw_no, 1);
        for d in &draws {
            assert!(validate_draw(&d.numbers, d.bonus).is_ok(), "{:?}", d);
        }
        assert!(draws[0].date > draws[1].date);
    }
}
