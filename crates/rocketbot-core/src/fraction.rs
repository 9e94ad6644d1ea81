//! Fraction reduction to canonical lowest terms.

use serde::{Deserialize, Serialize};

use crate::error::{SolveError, SolveResult};

/// A fraction in canonical form: positive denominator, coprime terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fraction {
    numerator: i64,
    denominator: i64,
}

impl Fraction {
    /// Reduce `numerator / denominator` to lowest terms.
    pub fn new(numerator: i64, denominator: i64) -> SolveResult<Self> {
        reduce(numerator, denominator)
    }

    pub fn numerator(&self) -> i64 {
        self.numerator
    }

    pub fn denominator(&self) -> i64 {
        self.denominator
    }

    /// Terms as a `(numerator, denominator)` pair.
    pub fn terms(&self) -> (i64, i64) {
        (self.numerator, self.denominator)
    }
}

impl std::fmt::Display for Fraction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.numerator, self.denominator)
    }
}

/// Greatest common divisor of two non-negative values (Euclid).
fn gcd(mut a: u128, mut b: u128) -> u128 {
    while b != 0 {
        let r = a % b;
        a = b;
        b = r;
    }
    a
}

/// Reduce a fraction so that the denominator is positive and
/// `gcd(|num|, |den|) == 1`.
///
/// Fails with [`SolveError::InvalidInput`] on a zero denominator, and when the
/// canonical form does not fit in `i64` (only reachable with `i64::MIN`).
pub fn reduce(numerator: i64, denominator: i64) -> SolveResult<Fraction> {
    if denominator == 0 {
        return Err(SolveError::InvalidInput(format!(
            "zero denominator in {numerator}/{denominator}"
        )));
    }

    let num = numerator as i128;
    let den = denominator as i128;
    let divisor = gcd(num.unsigned_abs(), den.unsigned_abs()) as i128;

    let sign = if den < 0 { -1 } else { 1 };
    let num = sign * num / divisor;
    let den = sign * den / divisor;

    let overflow = || SolveError::InvalidInput(format!("{numerator}/{denominator} overflows"));
    Ok(Fraction {
        numerator: i64::try_from(num).map_err(|_| overflow())?,
        denominator: i64::try_from(den).map_err(|_| overflow())?,
    })
}
