//! DOM-backed [`Page`] for the Rocket Math game.

use rocketbot_core::{ActuatorMiss, FactorRow, Field, Key, Page, Panel};
use tracing::debug;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Document, Element, HtmlElement, MouseEvent, MouseEventInit};

/// Containers holding the revealed factor pairs.
const FACTOR_LISTS: [&str; 2] = [
    "#problem_1 .factors-primes-list-1 li",
    "#problem_1 .factors-primes-list-2 li",
];

/// Class marking the list item that hosts the answer inputs.
const ANSWER_ROW_CLASS: &str = "fp-answer-container";

/// Selector and hide-class of each panel.
pub fn panel_selector(panel: Panel) -> (&'static str, &'static str) {
    match panel {
        Panel::PlayingScreen => ("playing-screen", "hidden"),
        Panel::EquivalentFractions => (".problem-details-equivalent-fractions", "custom-hide"),
        Panel::FactorsPrimes => ("#problem_1 .problem-details-factors-primes", "custom-hide"),
    }
}

pub fn field_selector(field: Field) -> String {
    match field {
        Field::EquivalentProblem(i) => format!(".equivalent-problem-{i}"),
        Field::EquivalentAnswer(i) => format!(".equivalent-answer-{i}"),
        Field::FactorsTitle => "#problem_1 .factors-title".to_string(),
        Field::FactorAnswer(i) => format!("#problem_1 .factor-answer-{i}"),
    }
}

pub fn key_selector(key: Key) -> String {
    format!("#{key}")
}

/// The live game document.
pub struct DomPage {
    document: Document,
}

impl DomPage {
    pub fn new() -> Result<Self, JsValue> {
        let document = web_sys::window()
            .ok_or("No window")?
            .document()
            .ok_or("No document")?;
        Ok(Self::with_document(document))
    }

    pub fn with_document(document: Document) -> Self {
        Self { document }
    }

    fn query(&self, selector: &str) -> Option<Element> {
        self.document.query_selector(selector).ok().flatten()
    }

    fn query_all(root: &impl AsRef<web_sys::Node>, selector: &str) -> Vec<Element> {
        let list = match root.as_ref().dyn_ref::<Element>() {
            Some(element) => element.query_selector_all(selector),
            None => match root.as_ref().dyn_ref::<Document>() {
                Some(document) => document.query_selector_all(selector),
                None => return Vec::new(),
            },
        };
        let Ok(list) = list else {
            return Vec::new();
        };
        (0..list.length())
            .filter_map(|i| list.item(i))
            .filter_map(|node| node.dyn_into::<Element>().ok())
            .collect()
    }

    fn dispatch(element: &Element, kind: &str) -> Result<(), JsValue> {
        let init = MouseEventInit::new();
        init.set_bubbles(true);
        init.set_cancelable(true);
        let event = MouseEvent::new_with_mouse_event_init_dict(kind, &init)?;
        element.dispatch_event(&event)?;
        Ok(())
    }
}

fn is_hidden(element: &Element, hide_class: &str) -> bool {
    if element.class_list().contains(hide_class) {
        return true;
    }
    element
        .dyn_ref::<HtmlElement>()
        .and_then(|html| html.style().get_property_value("display").ok())
        .is_some_and(|display| display == "none")
}

impl Page for DomPage {
    fn is_visible(&self, panel: Panel) -> bool {
        let (selector, hide_class) = panel_selector(panel);
        self.query(selector)
            .is_some_and(|element| !is_hidden(&element, hide_class))
    }

    fn read(&self, field: Field) -> Option<String> {
        let element = self.query(&field_selector(field))?;
        // Factor cells are written with innerHTML by the game.
        let text = match field {
            Field::FactorsTitle | Field::FactorAnswer(_) => element.inner_html(),
            _ => element.text_content().unwrap_or_default(),
        };
        Some(text.trim().to_string())
    }

    fn factor_rows(&self) -> Vec<FactorRow> {
        FACTOR_LISTS
            .iter()
            .flat_map(|selector| Self::query_all(&self.document, selector))
            .map(|item| FactorRow {
                answer_row: item.class_list().contains(ANSWER_ROW_CLASS),
                cells: Self::query_all(&item, ".fp-number")
                    .iter()
                    .map(|cell| cell.inner_html().trim().to_string())
                    .collect(),
            })
            .collect()
    }

    fn press(&self, key: Key) -> Result<(), ActuatorMiss> {
        let button = self.query(&key_selector(key)).ok_or(ActuatorMiss { key })?;
        for kind in ["mousedown", "mouseup", "click"] {
            if let Err(e) = Self::dispatch(&button, kind) {
                debug!(%key, kind, error = ?e, "synthetic event rejected");
            }
        }
        Ok(())
    }
}
