use anyhow::{Context, Result};

use gitlab_panel::PanelConfig;

use crate::utils::get_element_by_id;

/// Id of the `<script type="application/json">` element holding the panel
/// configuration rendered by the page.
pub const CONFIG_ELEMENT_ID: &str = "gitlab-panel-config";

pub fn load_panel_config() -> Result<PanelConfig> {
    let element = get_element_by_id(CONFIG_ELEMENT_ID)?;
    let json = element
        .text_content()
        .context(format!("Element `{CONFIG_ELEMENT_ID}` has no content"))?;

    PanelConfig::from_json(&json).context("Invalid GitLab panel configuration")
}
