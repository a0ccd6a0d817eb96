use wasm_bindgen::prelude::*;
use web_sys::Element;

#[wasm_bindgen(module = "/js/bootstrap.js")]
extern "C" {
    pub fn init_bootstrap_tooltip_element(element: &Element);
    pub fn init_bootstrap_error_tooltip_element(element: &Element);

    pub fn init_bootstrap_switch_element(element: &Element);
    pub fn on_bootstrap_switch_change(element: &Element, callback: &Closure<dyn FnMut(bool)>);
    pub fn forget_bootstrap_switch_element(element: &Element);
    pub fn set_bootstrap_switch_disabled(element: &Element, disabled: bool);
    pub fn set_bootstrap_switch_state_silently(element: &Element, state: bool);
}
