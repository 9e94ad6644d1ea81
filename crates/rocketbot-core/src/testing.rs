//! Test doubles for the page and the driver's collaborators.

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};
use std::rc::Rc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Notify;

use crate::catalog::CatalogSource;
use crate::channel::{ControlChannel, Notification};
use crate::error::{ActuatorMiss, CatalogError, ChannelError, FlagError};
use crate::flag::PersistedFlag;
use crate::page::{Clock, FactorRow, Field, Key, Page, Panel};

#[derive(Default)]
struct PageState {
    visible: HashSet<Panel>,
    fields: HashMap<Field, String>,
    rows: Vec<FactorRow>,
    /// Fields the keypad types into.
    slots: Vec<Field>,
    focus: usize,
    /// Focus moves to the second slot once the first holds this many
    /// characters; 0 never advances.
    advance_after: usize,
    missing: HashSet<Key>,
    presses: Vec<Key>,
    submissions: Vec<(String, String)>,
}

impl PageState {
    fn slot_text(&mut self, index: usize) -> &mut String {
        let field = self.slots[index];
        self.fields.entry(field).or_default()
    }
}

/// In-memory game page.
///
/// Digits append to the focused answer field, backspace deletes one
/// character (stepping back to the first field when the second is empty),
/// enter records the submitted field values.
#[derive(Clone, Default)]
pub struct FakePage {
    state: Rc<RefCell<PageState>>,
}

impl FakePage {
    fn with_slots(visible: &[Panel], slots: [Field; 2]) -> Self {
        let page = Self::default();
        {
            let mut state = page.state.borrow_mut();
            state.visible = visible.iter().copied().collect();
            for field in slots {
                state.fields.insert(field, String::new());
            }
            state.slots = slots.to_vec();
            state.advance_after = 1;
        }
        page
    }

    /// Equivalent-fractions puzzle with empty answer fields.
    pub fn fractions(numerator: &str, denominator: &str) -> Self {
        let page = Self::with_slots(
            &[Panel::PlayingScreen, Panel::EquivalentFractions],
            [Field::EquivalentAnswer(0), Field::EquivalentAnswer(1)],
        );
        page.set(Field::EquivalentProblem(0), numerator);
        page.set(Field::EquivalentProblem(1), denominator);
        page
    }

    /// Factors puzzle for `number` with no pairs revealed.
    pub fn factors(number: u32) -> Self {
        let page = Self::with_slots(
            &[Panel::PlayingScreen, Panel::FactorsPrimes],
            [Field::FactorAnswer(0), Field::FactorAnswer(1)],
        );
        page.set(Field::FactorsTitle, &format!("Factors of {number}"));
        page.state.borrow_mut().rows.push(FactorRow::answer());
        page
    }

    /// Pre-fill the answer fields; focus sits on the second field when the
    /// first is non-empty.
    pub fn with_answers(self, first: &str, second: &str) -> Self {
        {
            let mut state = self.state.borrow_mut();
            *state.slot_text(0) = first.to_string();
            *state.slot_text(1) = second.to_string();
            state.focus = usize::from(!first.is_empty());
        }
        self
    }

    /// Reveal pairs in the factor lists, after the answer row.
    pub fn with_rows(self, rows: &[(&str, &str)]) -> Self {
        self.state
            .borrow_mut()
            .rows
            .extend(rows.iter().map(|(a, b)| FactorRow::pair(*a, *b)));
        self
    }

    pub fn advance_after(&self, chars: usize) {
        self.state.borrow_mut().advance_after = chars;
    }

    pub fn show(&self, panel: Panel) {
        self.state.borrow_mut().visible.insert(panel);
    }

    pub fn hide(&self, panel: Panel) {
        self.state.borrow_mut().visible.remove(&panel);
    }

    pub fn set(&self, field: Field, text: &str) {
        self.state.borrow_mut().fields.insert(field, text.to_string());
    }

    pub fn remove(&self, field: Field) {
        self.state.borrow_mut().fields.remove(&field);
    }

    pub fn remove_key(&self, key: Key) {
        self.state.borrow_mut().missing.insert(key);
    }

    pub fn presses(&self) -> Vec<Key> {
        self.state.borrow().presses.clone()
    }

    pub fn submissions(&self) -> Vec<(String, String)> {
        self.state.borrow().submissions.clone()
    }
}

impl Page for FakePage {
    fn is_visible(&self, panel: Panel) -> bool {
        self.state.borrow().visible.contains(&panel)
    }

    fn read(&self, field: Field) -> Option<String> {
        self.state.borrow().fields.get(&field).map(|s| s.trim().to_string())
    }

    fn factor_rows(&self) -> Vec<FactorRow> {
        self.state.borrow().rows.clone()
    }

    fn press(&self, key: Key) -> Result<(), ActuatorMiss> {
        let mut state = self.state.borrow_mut();
        if state.missing.contains(&key) {
            return Err(ActuatorMiss { key });
        }
        state.presses.push(key);

        match key {
            Key::Digit(d) => {
                let focus = state.focus;
                state.slot_text(focus).push(char::from(b'0' + d));
                let advance = state.advance_after;
                if focus == 0 && advance > 0 && state.slot_text(0).len() >= advance {
                    state.focus = 1;
                }
            }
            Key::Backspace => {
                if state.focus == 1 && state.slot_text(1).is_empty() {
                    state.focus = 0;
                }
                let focus = state.focus;
                state.slot_text(focus).pop();
            }
            Key::Enter => {
                let submitted = (state.slot_text(0).clone(), state.slot_text(1).clone());
                state.submissions.push(submitted);
            }
        }
        Ok(())
    }
}

/// Clock that returns immediately and records every requested pause.
#[derive(Clone, Default)]
pub struct InstantClock {
    pauses: Rc<RefCell<Vec<Duration>>>,
}

impl InstantClock {
    pub fn pauses(&self) -> Vec<Duration> {
        self.pauses.borrow().clone()
    }

    pub fn total(&self) -> Duration {
        self.pauses.borrow().iter().sum()
    }
}

#[async_trait(?Send)]
impl Clock for InstantClock {
    async fn sleep(&self, duration: Duration) {
        self.pauses.borrow_mut().push(duration);
    }
}

/// Clock whose sleeps block until [`GateClock::open`] is called.
#[derive(Clone, Default)]
pub struct GateClock {
    open: Rc<Cell<bool>>,
    notify: Rc<Notify>,
}

impl GateClock {
    pub fn open(&self) {
        self.open.set(true);
        self.notify.notify_waiters();
    }
}

#[async_trait(?Send)]
impl Clock for GateClock {
    async fn sleep(&self, _duration: Duration) {
        while !self.open.get() {
            self.notify.notified().await;
        }
    }
}

/// Channel that keeps every notification, or rejects them all.
#[derive(Clone, Default)]
pub struct RecordingChannel {
    sent: Rc<RefCell<Vec<Notification>>>,
    fail: bool,
}

impl RecordingChannel {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn sent(&self) -> Vec<Notification> {
        self.sent.borrow().clone()
    }

    pub fn logs(&self) -> Vec<String> {
        self.sent
            .borrow()
            .iter()
            .filter_map(|n| match n {
                Notification::Log { message } => Some(message.clone()),
                _ => None,
            })
            .collect()
    }
}

impl ControlChannel for RecordingChannel {
    fn send(&self, notification: &Notification) -> Result<(), ChannelError> {
        if self.fail {
            return Err(ChannelError::Closed);
        }
        self.sent.borrow_mut().push(notification.clone());
        Ok(())
    }
}

/// In-memory persisted flag.
#[derive(Clone, Default)]
pub struct MemoryFlag {
    value: Rc<Cell<Option<bool>>>,
    fail: bool,
}

impl MemoryFlag {
    pub fn set_to(value: bool) -> Self {
        let flag = Self::default();
        flag.value.set(Some(value));
        flag
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn value(&self) -> Option<bool> {
        self.value.get()
    }
}

#[async_trait(?Send)]
impl PersistedFlag for MemoryFlag {
    async fn load(&self) -> Result<bool, FlagError> {
        if self.fail {
            return Err(FlagError("storage disabled".into()));
        }
        Ok(self.value.get().unwrap_or(false))
    }

    async fn store(&self, running: bool) -> Result<(), FlagError> {
        if self.fail {
            return Err(FlagError("storage disabled".into()));
        }
        self.value.set(Some(running));
        Ok(())
    }
}

/// Catalog source that counts fetches and yields once per fetch.
pub struct CountingSource {
    json: String,
    fetches: Rc<Cell<usize>>,
}

impl CountingSource {
    pub fn new(json: &str) -> Self {
        Self {
            json: json.to_string(),
            fetches: Rc::default(),
        }
    }

    pub fn counter(&self) -> Rc<Cell<usize>> {
        Rc::clone(&self.fetches)
    }
}

#[async_trait(?Send)]
impl CatalogSource for CountingSource {
    async fn fetch(&self) -> Result<String, CatalogError> {
        self.fetches.set(self.fetches.get() + 1);
        tokio::task::yield_now().await;
        Ok(self.json.clone())
    }
}

/// Catalog source that always fails.
#[derive(Default)]
pub struct FailingSource {
    attempts: Rc<Cell<usize>>,
}

impl FailingSource {
    pub fn counter(&self) -> Rc<Cell<usize>> {
        Rc::clone(&self.attempts)
    }
}

#[async_trait(?Send)]
impl CatalogSource for FailingSource {
    async fn fetch(&self) -> Result<String, CatalogError> {
        self.attempts.set(self.attempts.get() + 1);
        Err(CatalogError::Fetch("404 factors_100.json".into()))
    }
}
