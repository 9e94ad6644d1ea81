//! Rocket Math bot content script.
//!
//! Wires the `rocketbot-core` driver to the live page: DOM reads and
//! synthetic clicks, extension messaging and storage, and a `setInterval`
//! polling loop.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use rocketbot_core::{Ack, BotConfig, Command, CycleReport, Driver, Services};
use tracing::{debug, info, warn};
use wasm_bindgen::prelude::*;

mod chrome;
mod dom;
mod logging;
mod timer;

// WASM tests require wasm-pack test to run
#[cfg(all(test, target_arch = "wasm32"))]
mod tests;

pub use chrome::{BundledCatalog, ChromeChannel, ChromeFlag};
pub use dom::DomPage;
pub use timer::{BrowserClock, Interval};

// Initialize panic hook and console logging
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
    logging::init();
}

struct BotInner {
    driver: Driver,
    interval: RefCell<Option<Interval>>,
}

impl BotInner {
    /// Arm or clear the polling interval to match the session state.
    fn sync_timer(self: &Rc<Self>) {
        if !self.driver.is_running() {
            if self.interval.borrow_mut().take().is_some() {
                debug!("polling stopped");
            }
            return;
        }

        // Restart from a clean timer, with one cycle right away.
        self.interval.borrow_mut().take();
        spawn_cycle(Rc::clone(self));

        let weak: Weak<Self> = Rc::downgrade(self);
        let period = self.driver.config().poll_interval();
        match Interval::new(period, move || {
            if let Some(inner) = weak.upgrade() {
                if inner.driver.is_running() && !inner.driver.session().is_busy() {
                    spawn_cycle(inner);
                }
            }
        }) {
            Ok(interval) => {
                *self.interval.borrow_mut() = Some(interval);
                debug!(?period, "polling started");
            }
            Err(e) => warn!(error = ?e, "could not start polling interval"),
        }
    }
}

fn spawn_cycle(inner: Rc<BotInner>) {
    wasm_bindgen_futures::spawn_local(async move {
        match inner.driver.tick().await {
            CycleReport::Solved(outcome) => debug!(answer = %outcome.answer, "cycle solved"),
            CycleReport::Failed(e) => debug!(error = %e, "cycle failed"),
            _ => {}
        }
    });
}

fn reply(send_response: &js_sys::Function, ack: &Ack) {
    match chrome::to_js(ack) {
        Ok(value) => {
            if let Err(e) = send_response.call1(&JsValue::NULL, &value) {
                debug!(error = ?e, "sendResponse failed");
            }
        }
        Err(e) => debug!(error = %e, "could not encode ack"),
    }
}

fn js_err(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

/// The content script's bot instance
#[wasm_bindgen]
pub struct ContentBot {
    inner: Rc<BotInner>,
}

#[wasm_bindgen]
impl ContentBot {
    /// Create a bot for the current page. `config` is an optional plain
    /// object (`{pollIntervalMs, raceMode, catalogPath, clearAttempts}`).
    #[wasm_bindgen(constructor)]
    pub fn new(config: JsValue) -> Result<ContentBot, JsValue> {
        let config: BotConfig = if config.is_undefined() || config.is_null() {
            BotConfig::default()
        } else {
            serde_wasm_bindgen::from_value(config).map_err(js_err)?
        };
        config.validate().map_err(js_err)?;

        let services = Services {
            page: Box::new(DomPage::new()?),
            clock: Box::new(BrowserClock),
            channel: Box::new(ChromeChannel),
            flag: Box::new(ChromeFlag),
            catalog: Box::new(BundledCatalog::new(config.catalog_path.clone())),
        };

        Ok(ContentBot {
            inner: Rc::new(BotInner {
                driver: Driver::new(config, services),
                interval: RefCell::new(None),
            }),
        })
    }

    /// Listen for popup commands and resume a session left running.
    #[wasm_bindgen]
    pub fn install(&self) -> Result<(), JsValue> {
        let weak = Rc::downgrade(&self.inner);
        let listener = Closure::<dyn FnMut(JsValue, JsValue, js_sys::Function) -> bool>::new(
            move |request: JsValue, _sender: JsValue, send_response: js_sys::Function| {
                let Some(inner) = weak.upgrade() else {
                    return false;
                };
                let ack = match serde_wasm_bindgen::from_value::<Command>(request) {
                    Ok(command) => {
                        let ack = inner.driver.apply(command);
                        inner.sync_timer();
                        wasm_bindgen_futures::spawn_local(async move {
                            inner.driver.persist().await;
                        });
                        ack
                    }
                    Err(e) => inner.driver.reject(&e.to_string()),
                };
                reply(&send_response, &ack);
                // Answered synchronously; the response channel can close.
                false
            },
        );
        chrome::add_message_listener(listener.as_ref())?;
        // Lives as long as the page.
        listener.forget();

        let inner = Rc::clone(&self.inner);
        wasm_bindgen_futures::spawn_local(async move {
            if inner.driver.resume().await {
                inner.sync_timer();
            }
        });
        Ok(())
    }

    /// Start polling, as if the popup sent `start`
    #[wasm_bindgen]
    pub fn start(&self) -> js_sys::Promise {
        self.command(Command::Start)
    }

    /// Stop polling; a cycle already in flight finishes
    #[wasm_bindgen]
    pub fn stop(&self) -> js_sys::Promise {
        self.command(Command::Stop)
    }

    #[wasm_bindgen]
    pub fn is_running(&self) -> bool {
        self.inner.driver.is_running()
    }

    #[wasm_bindgen]
    pub fn race_mode(&self) -> bool {
        self.inner.driver.race_mode()
    }

    /// Toggle accelerated mode (answers are typed, submit is left to `pressEnter`)
    #[wasm_bindgen]
    pub fn set_race_mode(&self, enabled: bool) {
        self.inner.driver.set_race_mode(enabled);
    }

    /// Whether the factor catalog has been loaded
    #[wasm_bindgen]
    pub fn catalog_loaded(&self) -> bool {
        self.inner.driver.catalog().is_loaded()
    }
}

impl ContentBot {
    fn command(&self, command: Command) -> js_sys::Promise {
        let ack = self.inner.driver.apply(command);
        self.inner.sync_timer();
        let inner = Rc::clone(&self.inner);
        wasm_bindgen_futures::future_to_promise(async move {
            inner.driver.persist().await;
            chrome::to_js(&ack).map_err(JsValue::from)
        })
    }
}

/// Build the bot, hook up messaging, and resume if needed
#[wasm_bindgen]
pub fn boot(config: JsValue) -> Result<ContentBot, JsValue> {
    let bot = ContentBot::new(config)?;
    bot.install()?;
    info!(target: "rocketbot", "🎮 Content script loaded");
    Ok(bot)
}
