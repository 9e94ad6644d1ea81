//! Decision engine for the Rocket Math drill bot.
//!
//! Reads the on-screen puzzle through a [`Page`], works out the answer
//! (lowest-terms fractions, next factor pair) and drives the page's own
//! keypad to enter it. Browser specifics live in `rocketbot-wasm`; everything
//! here runs against the traits in [`page`], [`channel`], [`flag`] and
//! [`catalog`].

pub mod catalog;
pub mod channel;
pub mod config;
pub mod driver;
pub mod error;
pub mod flag;
pub mod fraction;
pub mod page;
pub mod solver;

#[cfg(test)]
mod testing;

pub use catalog::{Catalog, CatalogCache, CatalogSource, FactorPair, NextAction, StaticSource};
pub use channel::{Ack, Command, ControlChannel, Notification, Reporter};
pub use config::BotConfig;
pub use driver::{CycleGuard, CycleReport, Driver, Services, Session};
pub use error::{ActuatorMiss, CatalogError, ChannelError, ConfigError, FlagError, SolveError, SolveResult};
pub use flag::{PersistedFlag, RUNNING_FLAG_KEY};
pub use fraction::{reduce, Fraction};
pub use page::{Clock, FactorRow, Field, Key, Page, Panel, Pause};
pub use solver::{Commit, Outcome, PuzzleKind};
