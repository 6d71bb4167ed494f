//! Primitives combinatoires : coefficients binomiaux exacts et indicateurs
//! calculés sur une combinaison de six numéros.

use crate::models::PICK_COUNT;

/// C(n, k) exact par la formule multiplicative.
/// `acc * (n - i)` est toujours divisible par `i + 1` : chaque étape reste entière.
pub fn combination(n: u64, k: u64) -> u64 {
    if k > n {
        return 0;
    }
    if k == 0 || k == n {
        return 1;
    }
    let k = k.min(n - k);
    let mut acc = 1u64;
    for i in 0..k {
        acc = acc * (n - i) / (i + 1);
    }
    acc
}

/// Variante signée : `k < 0` ou `n < 0` donnent 0.
pub fn combination_signed(n: i64, k: i64) -> u64 {
    if n < 0 || k < 0 {
        return 0;
    }
    combination(n as u64, k as u64)
}

/// Valeur AC : nombre de différences positives distinctes entre paires, moins 5.
/// Indépendante de l'ordre des numéros.
pub fn ac_value(numbers: &[u8; PICK_COUNT]) -> u8 {
    let mut sorted = *numbers;
    sorted.sort_unstable();

    // Les différences tiennent dans 1..=44 : un masque 64 bits suffit.
    let mut seen = 0u64;
    for i in 0..PICK_COUNT {
        for j in (i + 1)..PICK_COUNT {
            let diff = sorted[j].abs_diff(sorted[i]);
            seen |= 1u64 << diff;
        }
    }
    (seen.count_ones() as u8).saturating_sub(PICK_COUNT as u8 - 1)
}

pub fn sum(numbers: &[u8]) -> u32 {
    numbers.iter().map(|&n| n as u32).sum()
}

pub fn odd_count(numbers: &[u8]) -> u8 {
    numbers.iter().filter(|&&n| n % 2 == 1).count() as u8
}

/// Numéros strictement supérieurs à `threshold`.
pub fn high_count(numbers: &[u8], threshold: u8) -> u8 {
    numbers.iter().filter(|&&n| n > threshold).count() as u8
}

/// Paires de numéros consécutifs (écart 1) dans une suite triée.
pub fn consecutive_pairs(sorted: &[u8]) -> impl Iterator<Item = (u8, u8)> + '_ {
    sorted
        .windows(2)
        .filter(|w| w[1] == w[0] + 1)
        .map(|w| (w[0], w[1]))
}
