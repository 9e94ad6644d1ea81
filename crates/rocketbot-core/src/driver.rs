//! Automation driver: start/stop lifecycle, the non-reentrant cycle, and
//! dispatch to whichever puzzle is on screen.
//!
//! The driver does not own a timer. The host calls [`Driver::tick`] on its
//! polling interval and arms or clears that interval according to
//! [`Driver::is_running`].

use std::cell::Cell;

use tracing::{debug, info, trace, warn};

use crate::catalog::{CatalogCache, CatalogSource};
use crate::channel::{Ack, Command, ControlChannel, Reporter};
use crate::config::BotConfig;
use crate::error::{SolveError, SolveResult};
use crate::flag::PersistedFlag;
use crate::page::{Clock, Page, Panel};
use crate::solver::{Cycle, FactorsSolver, FractionsSolver, Outcome, PuzzleKind};

/// Process-wide `{running, busy}` state.
#[derive(Debug, Default)]
pub struct Session {
    running: Cell<bool>,
    busy: Cell<bool>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_running(&self) -> bool {
        self.running.get()
    }

    pub fn set_running(&self, running: bool) {
        self.running.set(running);
    }

    pub fn is_busy(&self) -> bool {
        self.busy.get()
    }

    /// Mark a cycle in flight, or `None` if one already is.
    pub fn begin_cycle(&self) -> Option<CycleGuard<'_>> {
        if self.busy.replace(true) {
            return None;
        }
        Some(CycleGuard { busy: &self.busy })
    }
}

/// Clears the session's `busy` flag when dropped, on every exit path.
#[must_use = "the cycle ends when the guard is dropped"]
pub struct CycleGuard<'a> {
    busy: &'a Cell<bool>,
}

impl Drop for CycleGuard<'_> {
    fn drop(&mut self) {
        self.busy.set(false);
    }
}

/// What one call to [`Driver::tick`] or [`Driver::run_cycle`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleReport {
    /// Session stopped; nothing read.
    Idle,
    /// Previous cycle still in flight; nothing read.
    Skipped,
    /// No puzzle ready.
    NotApplicable,
    Solved(Outcome),
    Failed(SolveError),
}

/// The driver's external collaborators.
pub struct Services {
    pub page: Box<dyn Page>,
    pub clock: Box<dyn Clock>,
    pub channel: Box<dyn ControlChannel>,
    pub flag: Box<dyn PersistedFlag>,
    pub catalog: Box<dyn CatalogSource>,
}

/// Polling-loop controller.
pub struct Driver {
    page: Box<dyn Page>,
    clock: Box<dyn Clock>,
    channel: Box<dyn ControlChannel>,
    flag: Box<dyn PersistedFlag>,
    catalog: CatalogCache,
    session: Session,
    config: BotConfig,
    race_mode: Cell<bool>,
    fractions: FractionsSolver,
    factors: FactorsSolver,
}

impl Driver {
    pub fn new(config: BotConfig, services: Services) -> Self {
        Self {
            page: services.page,
            clock: services.clock,
            channel: services.channel,
            flag: services.flag,
            catalog: CatalogCache::new(services.catalog),
            session: Session::new(),
            race_mode: Cell::new(config.race_mode),
            fractions: FractionsSolver::new(config.clear_attempts),
            factors: FactorsSolver::new(config.clear_attempts),
            config,
        }
    }

    pub fn config(&self) -> &BotConfig {
        &self.config
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn catalog(&self) -> &CatalogCache {
        &self.catalog
    }

    pub fn is_running(&self) -> bool {
        self.session.is_running()
    }

    pub fn race_mode(&self) -> bool {
        self.race_mode.get()
    }

    pub fn set_race_mode(&self, enabled: bool) {
        if self.race_mode.replace(enabled) != enabled {
            info!(enabled, "race mode changed");
        }
    }

    fn reporter(&self) -> Reporter<'_> {
        Reporter::new(self.channel.as_ref())
    }

    /// Pick up a session left running before a reload. Returns whether
    /// polling should start.
    pub async fn resume(&self) -> bool {
        match self.flag.load().await {
            Ok(true) => {
                self.session.set_running(true);
                self.reporter().log("🔄 Resuming from previous session");
                true
            }
            Ok(false) => false,
            Err(e) => {
                warn!(error = %e, "could not read persisted flag");
                false
            }
        }
    }

    /// Apply a control command. The acknowledgement does not wait for
    /// storage; follow up with [`Driver::persist`].
    pub fn apply(&self, command: Command) -> Ack {
        let running = matches!(command, Command::Start);
        self.session.set_running(running);
        self.reporter()
            .log(if running { "Bot started" } else { "Bot stopped" });
        Ack::ok()
    }

    /// Answer a message that is not a known command.
    pub fn reject(&self, reason: &str) -> Ack {
        debug!(reason, "rejected control message");
        Ack::rejected()
    }

    /// Write the current running state to the persisted flag.
    pub async fn persist(&self) {
        if let Err(e) = self.flag.store(self.session.is_running()).await {
            warn!(error = %e, "could not persist running flag");
        }
    }

    /// [`Driver::apply`] followed by [`Driver::persist`].
    pub async fn handle(&self, command: Command) -> Ack {
        let ack = self.apply(command);
        self.persist().await;
        ack
    }

    /// One timer firing: a cycle if the session is running.
    pub async fn tick(&self) -> CycleReport {
        if !self.session.is_running() {
            return CycleReport::Idle;
        }
        self.run_cycle().await
    }

    /// Run one detect/read/decide/act pass unless one is already in flight.
    pub async fn run_cycle(&self) -> CycleReport {
        let Some(_guard) = self.session.begin_cycle() else {
            trace!("previous cycle still running");
            return CycleReport::Skipped;
        };

        let cx = Cycle {
            page: self.page.as_ref(),
            clock: self.clock.as_ref(),
            reporter: self.reporter(),
            race_mode: self.race_mode.get(),
        };

        match self.dispatch(&cx).await {
            Ok(outcome) => CycleReport::Solved(outcome),
            Err(e) if e.is_expected() => {
                trace!("no puzzle ready");
                CycleReport::NotApplicable
            }
            Err(e) => {
                warn!(error = %e, "cycle failed");
                match &e {
                    SolveError::Mismatch { .. } => cx.reporter.log(format!("⚠️ {e}")),
                    _ => cx.reporter.error(format!("❌ {e}")),
                }
                CycleReport::Failed(e)
            }
        }
    }

    async fn dispatch(&self, cx: &Cycle<'_>) -> SolveResult<Outcome> {
        if !cx.page.is_visible(Panel::PlayingScreen) {
            return Err(SolveError::NotApplicable);
        }
        match PuzzleKind::detect(cx.page) {
            Some(PuzzleKind::EquivalentFractions) => self.fractions.solve(cx).await,
            Some(PuzzleKind::FactorsPrimes) => self.factors.solve(cx, &self.catalog).await,
            None => Err(SolveError::NotApplicable),
        }
    }
}
