use anyhow::{anyhow, Context, Result};
use gloo_utils::errors::JsError;
use url::Url;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Document, Element};

pub fn js_error(err: JsValue) -> anyhow::Error {
    match JsError::try_from(err) {
        Ok(js_error) => js_error.into(),
        Err(not_js_error) => anyhow!("{not_js_error}"),
    }
}

pub fn get_document() -> Result<Document> {
    let window = web_sys::window().context("Unable to load `window`")?;
    window.document().context("Unable to load `document`")
}

pub fn get_element_by_id(id: &str) -> Result<Element> {
    get_document()?
        .get_element_by_id(id)
        .context(format!("Element `{id}` not found"))
}

pub fn query_selector(document: &Document, selector: &str) -> Result<Option<Element>> {
    document.query_selector(selector).map_err(js_error)
}

/// Elements below `root` matching `selector`, in document order.
pub fn query_selector_all(root: &Element, selector: &str) -> Result<Vec<Element>> {
    let nodes = root.query_selector_all(selector).map_err(js_error)?;

    Ok((0..nodes.length())
        .filter_map(|index| nodes.item(index))
        .filter_map(|node| node.dyn_into::<Element>().ok())
        .collect())
}

pub fn current_location() -> Result<Url> {
    let window = web_sys::window().context("Unable to load `window`")?;
    Ok(Url::parse(&window.location().href().map_err(js_error)?)?)
}
