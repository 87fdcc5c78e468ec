//! Entry points for the browser playground.

use wasm_bindgen::prelude::*;

use crate::{
    error::FormulaError,
    formula::{parse, Axiom, Formula, ModalSystem},
};

fn system(s5: bool) -> ModalSystem {
    if s5 {
        ModalSystem::S5
    } else {
        ModalSystem::K
    }
}

fn to_js(error: FormulaError) -> JsValue {
    JsValue::from_str(&error.to_string())
}

fn parse_for_js(input: &str, s5: bool) -> Result<Formula, JsValue> {
    parse(input, system(s5)).map_err(to_js)
}

/// Parses `input` and renders its normalized form.
#[wasm_bindgen]
pub fn normalize(input: &str, s5: bool) -> Result<String, JsValue> {
    Ok(parse_for_js(input, s5)?.normalize().to_string())
}

#[wasm_bindgen]
pub fn simplify(input: &str, s5: bool) -> Result<String, JsValue> {
    Ok(parse_for_js(input, s5)?.simplify().to_string())
}

#[wasm_bindgen]
pub fn axiom_simplify(input: &str, s5: bool, axiom: u32, depth: u32) -> Result<String, JsValue> {
    let axiom = Axiom::from_id(axiom).map_err(to_js)?;
    Ok(parse_for_js(input, s5)?.axiom_simplify(axiom, depth).to_string())
}

/// The parsed formula as a plain object tree, tagged by `type`.
#[wasm_bindgen]
pub fn formula_tree(input: &str, s5: bool) -> Result<JsValue, JsValue> {
    let formula = parse_for_js(input, s5)?;
    serde_wasm_bindgen::to_value(&formula).map_err(JsValue::from)
}
