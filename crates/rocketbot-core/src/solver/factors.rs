//! Factors & primes: type the next unrevealed factor pair, or submit the
//! checkmark once every pair is on screen.

use std::collections::HashSet;
use std::sync::OnceLock;

use regex::Regex;
use tracing::{debug, info};

use super::{Commit, Cycle, Outcome, PuzzleKind};
use crate::catalog::{CatalogCache, FactorPair, NextAction};
use crate::error::{SolveError, SolveResult};
use crate::page::{FactorRow, Field, Key, Panel, Pause};

const FIRST: Field = Field::FactorAnswer(0);
const SECOND: Field = Field::FactorAnswer(1);

fn number_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\d+").expect("valid number pattern"))
}

/// Target number from a title such as `"Factors of 12"`.
pub fn parse_title(title: &str) -> Option<u32> {
    number_pattern().find(title)?.as_str().parse().ok()
}

/// Pairs already revealed in the two lists, smaller factor first.
///
/// The answer-entry row and rows without two numeric cells are skipped.
pub fn displayed_pairs(rows: &[FactorRow]) -> Vec<FactorPair> {
    rows.iter()
        .filter(|row| !row.answer_row)
        .filter_map(|row| match row.cells.as_slice() {
            [a, b, ..] => Some(FactorPair::new(a.trim().parse().ok()?, b.trim().parse().ok()?)),
            _ => None,
        })
        .collect()
}

/// Solver for the factors-and-primes panel.
pub struct FactorsSolver {
    /// Upper bound on backspaces spent emptying the fields before a
    /// checkmark submit.
    clear_attempts: u32,
}

impl Default for FactorsSolver {
    fn default() -> Self {
        Self::new(6)
    }
}

impl FactorsSolver {
    pub fn new(clear_attempts: u32) -> Self {
        Self { clear_attempts }
    }

    pub async fn solve(&self, cx: &Cycle<'_>, catalog: &CatalogCache) -> SolveResult<Outcome> {
        if !cx.page.is_visible(Panel::FactorsPrimes) {
            return Err(SolveError::NotApplicable);
        }

        let Some(catalog) = catalog.get().await else {
            cx.reporter.error("❌ Failed to load factors data");
            return Err(SolveError::NotApplicable);
        };

        let Some(title) = cx.page.read(Field::FactorsTitle) else {
            cx.reporter.log("⚠️ factors-title not found");
            return Err(SolveError::NotApplicable);
        };
        let Some(number) = parse_title(&title) else {
            cx.reporter.log(format!("⚠️ Could not parse number from: {title}"));
            return Err(SolveError::NotApplicable);
        };

        let shown = displayed_pairs(&cx.page.factor_rows());
        let listing: Vec<String> = shown.iter().map(ToString::to_string).collect();
        cx.reporter.log(format!("🔢 Factors of {number} — displayed: [{}]", listing.join(", ")));

        let observed: HashSet<FactorPair> = shown.into_iter().collect();
        match catalog.next_pair(number, &observed)? {
            NextAction::Complete => self.complete(cx, number).await,
            NextAction::TypePair(a, b) => self.type_pair(cx, a, b).await,
        }
    }

    /// Every pair is revealed: submit the checkmark on empty fields.
    async fn complete(&self, cx: &Cycle<'_>, number: u32) -> SolveResult<Outcome> {
        cx.reporter.log("✅ All pairs shown — submitting checkmark");

        self.clear(cx).await?;
        if cx.race_mode {
            cx.pause(Pause::RaceCommit).await;
        }
        let commit = cx.commit().await;
        info!(number, ?commit, "factor list completed");

        Ok(Outcome {
            kind: PuzzleKind::FactorsPrimes,
            answer: format!("{number} complete"),
            typed: false,
            commit,
        })
    }

    /// Backspace until both fields read empty. Leftovers that survive
    /// `clear_attempts` presses fail the cycle rather than ride along with
    /// the checkmark.
    async fn clear(&self, cx: &Cycle<'_>) -> SolveResult<()> {
        let mut attempts = 0;
        loop {
            let (val0, val1) = (cx.text(FIRST), cx.text(SECOND));
            if val0.is_empty() && val1.is_empty() {
                return Ok(());
            }
            if attempts == self.clear_attempts {
                debug!(%val0, %val1, "answer fields still filled before checkmark");
                return Err(SolveError::Mismatch {
                    expected: "empty fields".to_string(),
                    observed: format!("[{val0}] x [{val1}]"),
                });
            }
            cx.press(Key::Backspace).await;
            cx.pause(Pause::CompletionClear).await;
            attempts += 1;
        }
    }

    async fn type_pair(&self, cx: &Cycle<'_>, a: u32, b: u32) -> SolveResult<Outcome> {
        let pair = FactorPair::new(a, b);
        let (want_a, want_b) = (a.to_string(), b.to_string());

        let (Some(val0), Some(val1)) = (cx.page.read(FIRST), cx.page.read(SECOND)) else {
            cx.reporter.log("⚠️ Answer fields not found");
            return Err(SolveError::NotApplicable);
        };

        if val0 == want_a && val1 == want_b {
            cx.reporter.log(format!("✅ Already filled: {pair} — submitting"));
            if cx.race_mode {
                cx.pause(Pause::RaceRecommit).await;
            }
            let commit = cx.commit().await;
            return Ok(self.answered(cx, pair, false, commit));
        }

        cx.reporter.log(format!("⌨️ Typing: {a} x {b}"));

        if val0 != want_a {
            if !val0.is_empty() {
                cx.press(Key::Backspace).await;
                cx.pause(Pause::FactorCorrection).await;
            }
            cx.type_number(u64::from(a), Pause::FactorDigit).await;
            // The page moves focus to the second field once the first is full.
            cx.pause(Pause::FocusHandOff { race: cx.race_mode }).await;
        }

        let val1 = cx.text(SECOND);
        if val1 != want_b {
            if !val1.is_empty() {
                cx.press(Key::Backspace).await;
                cx.pause(Pause::FactorCorrection).await;
            }
            cx.type_number(u64::from(b), Pause::FactorDigit).await;
            cx.pause(Pause::FactorSecond).await;
        }

        let (final0, final1) = (cx.text(FIRST), cx.text(SECOND));
        if final0 != want_a || final1 != want_b {
            debug!(%pair, %final0, %final1, "factor fields diverged after typing");
            return Err(SolveError::Mismatch {
                expected: pair.to_string(),
                observed: format!("[{final0}] x [{final1}]"),
            });
        }

        let commit = cx.commit().await;
        Ok(self.answered(cx, pair, true, commit))
    }

    fn answered(&self, cx: &Cycle<'_>, pair: FactorPair, typed: bool, commit: Commit) -> Outcome {
        info!(%pair, ?commit, "factor pair answered");
        cx.reporter.answer(pair.to_string());
        Outcome {
            kind: PuzzleKind::FactorsPrimes,
            answer: pair.to_string(),
            typed,
            commit,
        }
    }
}
