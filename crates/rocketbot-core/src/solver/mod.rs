//! Puzzle solvers.
//!
//! Each solver runs inside one cycle: read the view, decide the smallest set
//! of keypad presses that reaches a correct answer, press them, and commit.
//! Solvers are unit structs; all state is per-call.

mod factors;
mod fractions;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::channel::Reporter;
use crate::page::{Clock, Field, Key, Page, Panel, Pause};

pub use factors::FactorsSolver;
pub use fractions::FractionsSolver;

/// The puzzle types the bot can play.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PuzzleKind {
    EquivalentFractions,
    FactorsPrimes,
}

impl PuzzleKind {
    /// The visible puzzle panel, equivalent fractions checked first.
    pub fn detect(page: &dyn Page) -> Option<Self> {
        [PuzzleKind::EquivalentFractions, PuzzleKind::FactorsPrimes]
            .into_iter()
            .find(|kind| page.is_visible(kind.panel()))
    }

    pub fn panel(&self) -> Panel {
        match self {
            PuzzleKind::EquivalentFractions => Panel::EquivalentFractions,
            PuzzleKind::FactorsPrimes => Panel::FactorsPrimes,
        }
    }
}

impl std::fmt::Display for PuzzleKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PuzzleKind::EquivalentFractions => write!(f, "Equivalent Fractions"),
            PuzzleKind::FactorsPrimes => write!(f, "Factors & Primes"),
        }
    }
}

/// How a cycle's answer was committed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Commit {
    /// The keypad's enter key was pressed.
    Enter,
    /// A `pressEnter` notification was sent instead (accelerated mode).
    Deferred,
    /// Nothing was committed; the answer already sits in the fields.
    Held,
}

/// Result of a solver run that reached a correct answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub kind: PuzzleKind,
    /// Display form: `"1/2"`, `"2x6"`, or `"12 complete"`.
    pub answer: String,
    /// Whether any digit was typed this cycle.
    pub typed: bool,
    pub commit: Commit,
}

/// Per-cycle access to the page and its collaborators.
pub struct Cycle<'a> {
    pub page: &'a dyn Page,
    pub clock: &'a dyn Clock,
    pub reporter: Reporter<'a>,
    /// Accelerated ("race") mode for this cycle.
    pub race_mode: bool,
}

impl<'a> Cycle<'a> {
    /// Press `key` and wait for the click to settle. A missing control is
    /// logged and skipped.
    pub async fn press(&self, key: Key) {
        if let Err(miss) = self.page.press(key) {
            warn!(%key, "keypad control missing");
            self.reporter.log(format!("⚠ {miss}"));
        }
        self.pause(Pause::Click).await;
    }

    pub async fn pause(&self, pause: Pause) {
        self.clock.sleep(pause.duration()).await;
    }

    /// Type `value` one digit at a time, pausing after each digit.
    pub async fn type_number(&self, value: u64, per_digit: Pause) {
        for key in Key::digits(value) {
            self.press(key).await;
            self.pause(per_digit).await;
        }
    }

    /// Fresh read of `field`; an absent element reads as empty.
    pub fn text(&self, field: Field) -> String {
        self.page.read(field).unwrap_or_default()
    }

    /// Submit now, or hand the submit off in accelerated mode.
    pub async fn commit(&self) -> Commit {
        if self.race_mode {
            self.reporter.press_enter();
            Commit::Deferred
        } else {
            self.press(Key::Enter).await;
            Commit::Enter
        }
    }
}
