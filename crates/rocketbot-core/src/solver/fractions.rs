//! Equivalent fractions: reduce the given fraction and type it.

use rand::Rng;
use tracing::info;

use super::{Commit, Cycle, Outcome, PuzzleKind};
use crate::error::{SolveError, SolveResult};
use crate::fraction::{reduce, Fraction};
use crate::page::{Field, Key, Panel, Pause, RACE_JITTER_MS};

const NUMERATOR: Field = Field::EquivalentAnswer(0);
const DENOMINATOR: Field = Field::EquivalentAnswer(1);

/// Solver for the equivalent-fractions panel.
pub struct FractionsSolver {
    /// Upper bound on backspaces spent clearing a wrong answer.
    clear_attempts: u32,
}

impl Default for FractionsSolver {
    fn default() -> Self {
        Self::new(6)
    }
}

impl FractionsSolver {
    pub fn new(clear_attempts: u32) -> Self {
        Self { clear_attempts }
    }

    pub async fn solve(&self, cx: &Cycle<'_>) -> SolveResult<Outcome> {
        if !cx.page.is_visible(Panel::EquivalentFractions) {
            return Err(SolveError::NotApplicable);
        }

        let num = operand(cx, Field::EquivalentProblem(0))?;
        let den = operand(cx, Field::EquivalentProblem(1))?;
        if den == 0 {
            return Err(SolveError::NotApplicable);
        }

        let target = reduce(num, den)?;
        let (want_num, want_den) = typable(&target)?;
        let (want_num_text, want_den_text) = (want_num.to_string(), want_den.to_string());

        let (Some(ans0), Some(ans1)) = (cx.page.read(NUMERATOR), cx.page.read(DENOMINATOR)) else {
            return Err(SolveError::NotApplicable);
        };

        if ans0 == want_num_text && ans1 == want_den_text {
            cx.reporter.log(format!("✅ Correct answer already in fields: {target}"));
            let commit = if cx.race_mode {
                Commit::Held
            } else {
                cx.press(Key::Enter).await;
                Commit::Enter
            };
            return Ok(outcome(&target, false, commit));
        }

        if !ans0.is_empty() || !ans1.is_empty() {
            cx.reporter.log(format!(
                "⚠ Clearing incorrect values: ({ans0}/{ans1}) expected ({target})"
            ));
            self.clear(cx).await;
        }

        if cx.race_mode {
            let ms = rand::thread_rng().gen_range(RACE_JITTER_MS);
            cx.reporter.log(format!("🏁 Waiting {ms}ms…"));
            cx.pause(Pause::RaceJitter(ms)).await;
        }

        cx.reporter.log(format!("🚀 Solving: {num}/{den} → {target}"));

        // Typing the numerator usually moves focus to the denominator, so
        // each term is re-read right before it is typed.
        if cx.text(NUMERATOR) != want_num_text {
            cx.type_number(want_num, Pause::FractionDigit).await;
            cx.pause(Pause::FractionField).await;
        }
        if cx.text(DENOMINATOR) != want_den_text {
            cx.type_number(want_den, Pause::FractionDigit).await;
            cx.pause(Pause::FractionField).await;
        }

        let commit = cx.commit().await;
        match commit {
            Commit::Deferred => cx.reporter.log(format!("🏁 Answer typed, press Enter! ({target})")),
            _ => cx.reporter.log(format!("✅ Submitted: {target}")),
        }
        info!(answer = %target, ?commit, "equivalent fraction answered");
        cx.reporter.answer(target.to_string());

        Ok(outcome(&target, true, commit))
    }

    /// Backspace until both terms read empty, bounded by `clear_attempts`.
    async fn clear(&self, cx: &Cycle<'_>) {
        for _ in 0..self.clear_attempts {
            cx.press(Key::Backspace).await;
            cx.pause(Pause::FractionBackspace).await;
            if cx.text(NUMERATOR).is_empty() && cx.text(DENOMINATOR).is_empty() {
                break;
            }
        }
        cx.pause(Pause::FractionCleared).await;
    }
}

fn operand(cx: &Cycle<'_>, field: Field) -> SolveResult<i64> {
    cx.page
        .read(field)
        .and_then(|text| text.parse().ok())
        .ok_or(SolveError::NotApplicable)
}

/// The keypad has no minus key.
fn typable(target: &Fraction) -> SolveResult<(u64, u64)> {
    let num = u64::try_from(target.numerator())
        .map_err(|_| SolveError::InvalidInput(format!("cannot type negative answer {target}")))?;
    Ok((num, target.denominator().unsigned_abs()))
}

fn outcome(target: &Fraction, typed: bool, commit: Commit) -> Outcome {
    Outcome {
        kind: PuzzleKind::EquivalentFractions,
        answer: target.to_string(),
        typed,
        commit,
    }
}
