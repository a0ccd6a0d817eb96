#[macro_use]
extern crate lazy_static;

use std::rc::Rc;

use anyhow::{Context, Result};
use cfg_if::cfg_if;
use log::{error, info};
use wasm_bindgen::prelude::*;

use gitlab_panel::PanelConfig;

pub use mount::{mount, Panel};

pub mod config;
mod dom;
mod mount;
mod services;
mod utils;

cfg_if! {
    if #[cfg(debug_assertions)] {
        const LOG_LEVEL: log::Level = log::Level::Trace;
    } else {
        const LOG_LEVEL: log::Level = log::Level::Info;
    }
}

cfg_if! {
    if #[cfg(feature = "console_log")] {
        pub fn init_log() {
            // A second initialization, from `initGitlabPanel`, keeps the first logger
            if console_log::init_with_level(LOG_LEVEL).is_ok() {
                info!("Log level set to {}", LOG_LEVEL);
            }
        }
    } else {
        pub fn init_log() {}
    }
}

/// Mount the GitLab panel on the whole document.
pub fn start(config: PanelConfig) -> Result<Rc<Panel>> {
    let panel = Rc::new(Panel::new(config)?);
    let root = utils::get_document()?
        .document_element()
        .context("Document has no root element")?;

    mount(&root, &panel)?;
    info!("GitLab panel mounted");

    Ok(panel)
}

/// Entry point for pages driving the panel from JavaScript, with the same
/// configuration object as the `gitlab-panel-config` script element.
#[wasm_bindgen(js_name = initGitlabPanel)]
pub fn init_gitlab_panel(config: JsValue) -> Result<(), JsValue> {
    std::panic::set_hook(Box::new(console_error_panic_hook::hook));
    init_log();

    let config: PanelConfig = serde_wasm_bindgen::from_value(config)?;
    config
        .validated()
        .map_err(anyhow::Error::from)
        .and_then(start)
        .map(|_| ())
        .map_err(|error| {
            error!("Unable to mount GitLab panel: {error:?}");
            JsValue::from_str(&error.to_string())
        })
}
