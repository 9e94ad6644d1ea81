//! Tests for the DOM-backed page

use std::cell::RefCell;
use std::rc::Rc;

use rocketbot_core::{Field, Key, Page, Panel};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_test::*;
use web_sys::{Document, HtmlElement};

use crate::dom::{field_selector, key_selector, panel_selector, DomPage};

wasm_bindgen_test_configure!(run_in_browser);

const GAME: &str = r#"
<playing-screen>
  <div class="problem-details-equivalent-fractions custom-hide">
    <span class="equivalent-problem-0">6</span>
    <span class="equivalent-problem-1">8</span>
    <span class="equivalent-answer-0"> 3 </span>
    <span class="equivalent-answer-1"></span>
  </div>
  <div id="problem_1">
    <div class="problem-details-factors-primes">
      <div class="factors-title">Factors of 12</div>
      <ul class="factors-primes-list-1">
        <li><span class="fp-number">1</span><span class="fp-number">12</span></li>
        <li class="fp-answer-container">
          <span class="fp-number factor-answer-0">2</span>
          <span class="fp-number factor-answer-1"></span>
        </li>
      </ul>
      <ul class="factors-primes-list-2"></ul>
    </div>
  </div>
</playing-screen>
<button id="number_1">1</button>
<button id="arrow">&larr;</button>
<button id="enter">Enter</button>
"#;

fn document() -> Document {
    web_sys::window()
        .and_then(|window| window.document())
        .expect("browser document")
}

fn mount() -> DomPage {
    let document = document();
    document
        .body()
        .expect("body")
        .set_inner_html(GAME);
    DomPage::with_document(document)
}

#[wasm_bindgen_test]
fn test_selectors() {
    assert_eq!(panel_selector(Panel::PlayingScreen), ("playing-screen", "hidden"));
    assert_eq!(field_selector(Field::EquivalentAnswer(1)), ".equivalent-answer-1");
    assert_eq!(field_selector(Field::FactorAnswer(0)), "#problem_1 .factor-answer-0");
    assert_eq!(key_selector(Key::Digit(7)), "#number_7");
    assert_eq!(key_selector(Key::Backspace), "#arrow");
}

#[wasm_bindgen_test]
fn test_panel_visibility() {
    let page = mount();
    assert!(page.is_visible(Panel::PlayingScreen));
    assert!(!page.is_visible(Panel::EquivalentFractions));
    assert!(page.is_visible(Panel::FactorsPrimes));

    let panel: HtmlElement = document()
        .query_selector("#problem_1 .problem-details-factors-primes")
        .unwrap()
        .unwrap()
        .dyn_into()
        .unwrap();
    panel.style().set_property("display", "none").unwrap();
    assert!(!page.is_visible(Panel::FactorsPrimes));

    document()
        .query_selector("playing-screen")
        .unwrap()
        .unwrap()
        .class_list()
        .add_1("hidden")
        .unwrap();
    assert!(!page.is_visible(Panel::PlayingScreen));
}

#[wasm_bindgen_test]
fn test_read_fields() {
    let page = mount();
    assert_eq!(page.read(Field::EquivalentProblem(0)).as_deref(), Some("6"));
    assert_eq!(page.read(Field::EquivalentAnswer(0)).as_deref(), Some("3"));
    assert_eq!(page.read(Field::EquivalentAnswer(1)).as_deref(), Some(""));
    assert_eq!(page.read(Field::FactorsTitle).as_deref(), Some("Factors of 12"));
    assert_eq!(page.read(Field::FactorAnswer(0)).as_deref(), Some("2"));
    assert_eq!(page.read(Field::FactorAnswer(2)), None);
}

#[wasm_bindgen_test]
fn test_factor_rows() {
    let page = mount();
    let rows = page.factor_rows();
    assert_eq!(rows.len(), 2);
    assert!(!rows[0].answer_row);
    assert_eq!(rows[0].cells, vec!["1", "12"]);
    assert!(rows[1].answer_row);
}

#[wasm_bindgen_test]
fn test_press_dispatches_click() {
    let page = mount();
    let clicks = Rc::new(RefCell::new(Vec::new()));
    let seen = Rc::clone(&clicks);
    let listener = Closure::<dyn FnMut(web_sys::Event)>::new(move |event: web_sys::Event| {
        seen.borrow_mut().push(event.type_());
    });
    document()
        .get_element_by_id("enter")
        .unwrap()
        .add_event_listener_with_callback("click", listener.as_ref().unchecked_ref())
        .unwrap();

    page.press(Key::Enter).unwrap();
    assert_eq!(*clicks.borrow(), vec!["click".to_string()]);
}

#[wasm_bindgen_test]
fn test_press_missing_button() {
    let page = mount();
    let miss = page.press(Key::Digit(9)).unwrap_err();
    assert_eq!(miss.key, Key::Digit(9));
}
