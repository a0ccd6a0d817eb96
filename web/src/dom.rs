//! `web-sys` implementations of the panel DOM surfaces.

use std::time::Duration;

use log::{debug, warn};
use wasm_bindgen::JsCast;
use web_sys::{Document, Element, HtmlElement, HtmlInputElement};

use gitlab_panel::{
    controller::{BadgeLocator, PanelView, RepositorySwitch, StatusBadge, SyncButton},
    RepoId,
};

use crate::{
    services::bootstrap::{set_bootstrap_switch_disabled, set_bootstrap_switch_state_silently},
    utils::query_selector,
};

pub const REPO_ID_ATTRIBUTE: &str = "data-repo-id";
pub const SPIN_CLASS: &str = "fa-spin";

pub struct DomSwitch {
    input: HtmlInputElement,
}

impl DomSwitch {
    pub fn new(input: HtmlInputElement) -> Self {
        Self { input }
    }
}

impl RepositorySwitch for DomSwitch {
    fn repo_id(&self) -> Option<RepoId> {
        self.input
            .get_attribute(REPO_ID_ATTRIBUTE)
            .filter(|repo_id| !repo_id.is_empty())
            .map(RepoId)
    }

    fn set_disabled(&self, disabled: bool) {
        set_bootstrap_switch_disabled(&self.input, disabled);
    }

    fn set_state_silently(&self, state: bool) {
        set_bootstrap_switch_state_silently(&self.input, state);
    }
}

pub struct DomBadge {
    element: HtmlElement,
}

impl StatusBadge for DomBadge {
    fn add_classes(&self, classes: &[&str]) {
        let class_list = self.element.class_list();
        for class in classes {
            if class_list.add_1(class).is_err() {
                warn!("Unable to add `{class}` class to status badge");
            }
        }
    }

    fn remove_classes(&self, classes: &[&str]) {
        let class_list = self.element.class_list();
        for class in classes {
            if class_list.remove_1(class).is_err() {
                warn!("Unable to remove `{class}` class from status badge");
            }
        }
    }

    fn fade_out(&self, duration: Duration) {
        // Flush the style so a restarted fade transitions from the reset opacity
        let _ = self.element.offset_width();
        let style = self.element.style();
        let transition = format!("opacity {}ms linear", duration.as_millis());
        if style.set_property("transition", &transition).is_err()
            || style.set_property("opacity", "0").is_err()
        {
            warn!("Unable to fade out status badge");
        }
    }

    fn reset_opacity(&self) {
        let style = self.element.style();
        if style.remove_property("transition").is_err()
            || style.set_property("opacity", "1").is_err()
        {
            warn!("Unable to reset status badge opacity");
        }
    }
}

pub struct DocumentBadges {
    document: Document,
}

impl DocumentBadges {
    pub fn new(document: Document) -> Self {
        Self { document }
    }
}

impl BadgeLocator for DocumentBadges {
    type Badge = DomBadge;

    fn find_badge(&self, repo_id: &RepoId) -> Option<DomBadge> {
        match query_selector(&self.document, &repo_id.badge_selector()) {
            Ok(element) => element
                .and_then(|element| element.dyn_into::<HtmlElement>().ok())
                .map(|element| DomBadge { element }),
            Err(error) => {
                warn!("Unable to look up status badge of repository {repo_id}: {error:?}");
                None
            }
        }
    }
}

pub struct DomSyncButton {
    button: Element,
    icon: Option<Element>,
}

impl DomSyncButton {
    pub fn new(button: Element) -> Self {
        let icon = button.first_element_child();
        if icon.is_none() {
            debug!("Sync button has no icon");
        }
        Self { button, icon }
    }
}

impl SyncButton for DomSyncButton {
    fn set_disabled(&self, disabled: bool) {
        if self
            .button
            .toggle_attribute_with_force("disabled", disabled)
            .is_err()
        {
            warn!("Unable to toggle sync button `disabled` attribute");
        }
    }

    fn set_spinning(&self, spinning: bool) {
        if let Some(icon) = &self.icon {
            if icon
                .class_list()
                .toggle_with_force(SPIN_CLASS, spinning)
                .is_err()
            {
                warn!("Unable to toggle sync icon `{SPIN_CLASS}` class");
            }
        }
    }
}

/// Container refreshed by a sync, looked up lazily as the page may not
/// render it for disconnected accounts.
pub struct DomView {
    document: Document,
    selector: String,
}

impl DomView {
    pub fn new(document: Document, selector: String) -> Self {
        Self { document, selector }
    }

    pub fn element(&self) -> Option<Element> {
        query_selector(&self.document, &self.selector)
            .ok()
            .flatten()
    }
}

impl PanelView for DomView {
    fn replace_content(&self, html: &str) {
        match self.element() {
            Some(element) => element.set_inner_html(html),
            None => warn!("Element `{}` not found, sync response dropped", self.selector),
        }
    }
}
