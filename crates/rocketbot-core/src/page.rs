//! The live game page as seen by the solvers.
//!
//! Every read is a fresh snapshot: the page mutates itself asynchronously
//! (focus hand-off, auto-clear) so callers re-read after each write instead
//! of trusting an earlier value.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ActuatorMiss;

/// A show/hide region of the game UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Panel {
    /// The in-game screen hosting every puzzle type.
    PlayingScreen,
    EquivalentFractions,
    FactorsPrimes,
}

/// A text-bearing element of a puzzle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Field {
    /// Given fraction term: 0 = numerator, 1 = denominator.
    EquivalentProblem(u8),
    /// Typed fraction term: 0 = numerator, 1 = denominator.
    EquivalentAnswer(u8),
    /// "Factors of N" heading.
    FactorsTitle,
    /// Typed factor: 0 = first, 1 = second.
    FactorAnswer(u8),
}

/// An on-screen keypad control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Key {
    Digit(u8),
    /// The keypad's delete ("arrow") control.
    Backspace,
    Enter,
}

impl Key {
    /// Keys needed to type `value` digit by digit.
    pub fn digits(value: u64) -> Vec<Key> {
        value
            .to_string()
            .bytes()
            .map(|b| Key::Digit(b - b'0'))
            .collect()
    }
}

impl std::fmt::Display for Key {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Key::Digit(d) => write!(f, "number_{d}"),
            Key::Backspace => write!(f, "arrow"),
            Key::Enter => write!(f, "enter"),
        }
    }
}

/// One entry of the two factor-pair lists.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FactorRow {
    /// The row hosting the answer inputs rather than a revealed pair.
    pub answer_row: bool,
    /// Displayed number cells, in on-screen order.
    pub cells: Vec<String>,
}

impl FactorRow {
    pub fn pair(a: impl Into<String>, b: impl Into<String>) -> Self {
        Self {
            answer_row: false,
            cells: vec![a.into(), b.into()],
        }
    }

    pub fn answer() -> Self {
        Self {
            answer_row: true,
            cells: Vec::new(),
        }
    }
}

/// Read/actuate access to the game page.
pub trait Page {
    /// Whether `panel` exists and is not hidden.
    fn is_visible(&self, panel: Panel) -> bool;

    /// Trimmed text of `field`, `None` if the element is absent.
    fn read(&self, field: Field) -> Option<String>;

    /// Rows of both factor lists, answer row included.
    fn factor_rows(&self) -> Vec<FactorRow>;

    /// Dispatch a synthetic pointer press on `key`.
    fn press(&self, key: Key) -> Result<(), ActuatorMiss>;
}

/// Suspension source for settle delays.
#[async_trait(?Send)]
pub trait Clock {
    async fn sleep(&self, duration: Duration);
}

/// Named waits inserted between actuation steps.
///
/// The page reacts to input asynchronously; each pause gives one specific
/// transition time to land before the next read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pause {
    /// After every key press.
    Click,
    FractionDigit,
    /// After a whole fraction term.
    FractionField,
    FractionBackspace,
    /// After clearing wrong fraction terms.
    FractionCleared,
    /// Accelerated-mode pre-type jitter.
    RaceJitter(u64),
    FactorDigit,
    /// After the single corrective clear of a factor field.
    FactorCorrection,
    /// Page moving focus from the first factor field to the second.
    FocusHandOff { race: bool },
    /// After typing the second factor.
    FactorSecond,
    /// After clearing fields before a completion submit.
    CompletionClear,
    /// Accelerated-mode wait before signalling a completion submit.
    RaceCommit,
    /// Accelerated-mode wait before signalling an already-filled pair.
    RaceRecommit,
}

/// Bounds of the accelerated-mode jitter window, in milliseconds.
pub const RACE_JITTER_MS: std::ops::RangeInclusive<u64> = 450..=500;

impl Pause {
    pub fn duration(&self) -> Duration {
        let ms = match *self {
            Pause::Click => 30,
            Pause::FractionDigit => 50,
            Pause::FractionField => 60,
            Pause::FractionBackspace => 50,
            Pause::FractionCleared => 150,
            Pause::RaceJitter(ms) => ms.clamp(*RACE_JITTER_MS.start(), *RACE_JITTER_MS.end()),
            Pause::FactorDigit => 60,
            Pause::FactorCorrection => 80,
            Pause::FocusHandOff { race: true } => 500,
            Pause::FocusHandOff { race: false } => 150,
            Pause::FactorSecond => 80,
            Pause::CompletionClear => 100,
            Pause::RaceCommit => 500,
            Pause::RaceRecommit => 100,
        };
        Duration::from_millis(ms)
    }
}
