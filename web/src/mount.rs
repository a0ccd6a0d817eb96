use std::{cell::RefCell, rc::Rc};

use anyhow::{anyhow, Context, Result};
use log::{debug, error};
use wasm_bindgen::{prelude::Closure, JsCast};
use wasm_bindgen_futures::spawn_local;
use web_sys::{Document, Element, HtmlInputElement, MouseEvent};

use gitlab_panel::{
    controller::{PanelController, SyncOutcome},
    PanelConfig,
};

use crate::{
    dom::{DocumentBadges, DomSwitch, DomSyncButton, DomView},
    services::{
        api::HttpPanelBackend,
        bootstrap::{
            init_bootstrap_error_tooltip_element, init_bootstrap_switch_element,
            forget_bootstrap_switch_element, init_bootstrap_tooltip_element,
            on_bootstrap_switch_change,
        },
        timer::GlooTimer,
    },
    utils::{current_location, get_document, js_error, query_selector, query_selector_all},
};

pub const TOOLTIP_SELECTOR: &str = r#"[data-toggle="tooltip"]"#;
pub const ERROR_INDICATOR_SELECTOR: &str = "i.error";
pub const TEST_SWITCH_SELECTOR: &str = r#"input[name="test-flip"]"#;
pub const REPOSITORY_SWITCH_SELECTOR: &str = "input[data-repo-id]";

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Binding {
    Tooltip,
    ErrorTooltip,
    TestSwitch,
    RepositorySwitch,
    SyncButton,
}

impl Binding {
    pub fn marker_attribute(&self) -> &'static str {
        match self {
            Binding::Tooltip => "data-gitlab-panel-tooltip",
            Binding::ErrorTooltip => "data-gitlab-panel-error-tooltip",
            Binding::TestSwitch => "data-gitlab-panel-test-switch",
            Binding::RepositorySwitch => "data-gitlab-panel-switch",
            Binding::SyncButton => "data-gitlab-panel-sync",
        }
    }

    pub fn is_claimed(&self, element: &Element) -> bool {
        element.has_attribute(self.marker_attribute())
    }

    /// Mark `element` as bound, returns `false` if it already was.
    pub fn claim(&self, element: &Element) -> bool {
        if self.is_claimed(element) {
            return false;
        }
        if let Err(err) = element.set_attribute(self.marker_attribute(), "") {
            error!("Unable to mark element as bound: {:?}", js_error(err));
        }
        true
    }
}

/// `switchChange` handler of a repository switch, unregistered when dropped.
struct SwitchHandler {
    input: HtmlInputElement,
    _callback: Closure<dyn FnMut(bool)>,
}

impl Drop for SwitchHandler {
    fn drop(&mut self) {
        forget_bootstrap_switch_element(&self.input);
    }
}

/// `click` listener of the sync button, removed when dropped.
struct SyncHandler {
    button: Element,
    callback: Closure<dyn FnMut(MouseEvent)>,
}

impl Drop for SyncHandler {
    fn drop(&mut self) {
        if let Err(err) = self
            .button
            .remove_event_listener_with_callback("click", self.callback.as_ref().unchecked_ref())
        {
            error!(
                "Failed to remove `click` event listener from sync button: {:?}",
                js_error(err)
            );
        }
    }
}

pub struct Panel {
    pub config: PanelConfig,
    pub controller: PanelController<HttpPanelBackend, GlooTimer>,
    document: Document,
    switch_handlers: RefCell<Vec<SwitchHandler>>,
    sync_handler: RefCell<Option<SyncHandler>>,
}

impl Panel {
    pub fn new(config: PanelConfig) -> Result<Self> {
        let endpoints = config.resolve_endpoints(&current_location()?)?;
        let controller = PanelController::new(
            HttpPanelBackend::new(endpoints),
            GlooTimer,
            config.fade_duration(),
        );

        Ok(Self {
            config,
            controller,
            document: get_document()?,
            switch_handlers: RefCell::new(Vec::new()),
            sync_handler: RefCell::new(None),
        })
    }

    /// Number of repository switches currently wired to the controller.
    pub fn bound_switch_count(&self) -> usize {
        self.switch_handlers.borrow().len()
    }

    /// Drop the handlers of switches removed from the page by a content
    /// replacement.
    fn release_detached_switches(&self) {
        let mut switch_handlers = self.switch_handlers.borrow_mut();
        let bound = switch_handlers.len();
        switch_handlers.retain(|handler| handler.input.is_connected());
        let released = bound - switch_handlers.len();
        if released > 0 {
            debug!("Released {released} detached repository switches");
        }
    }
}

/// Bind every interactive element below `root`.
///
/// Elements bound by a previous call are left untouched, so this is called
/// again on the panel container each time its content is replaced.
pub fn mount(root: &Element, panel: &Rc<Panel>) -> Result<()> {
    debug!("Mounting GitLab panel on <{}>", root.tag_name().to_lowercase());
    panel.release_detached_switches();
    bind_tooltips(root)?;
    bind_switches(root, panel)?;
    bind_sync_button(panel)?;
    Ok(())
}

fn bind_tooltips(root: &Element) -> Result<()> {
    for element in query_selector_all(root, TOOLTIP_SELECTOR)? {
        if Binding::Tooltip.claim(&element) {
            init_bootstrap_tooltip_element(&element);
        }
    }

    for element in query_selector_all(root, ERROR_INDICATOR_SELECTOR)? {
        if Binding::ErrorTooltip.claim(&element) {
            init_bootstrap_error_tooltip_element(&element);
        }
    }

    Ok(())
}

fn bind_switches(root: &Element, panel: &Rc<Panel>) -> Result<()> {
    for element in query_selector_all(root, TEST_SWITCH_SELECTOR)? {
        if Binding::TestSwitch.claim(&element) {
            init_bootstrap_switch_element(&element);
        }
    }

    for element in query_selector_all(root, REPOSITORY_SWITCH_SELECTOR)? {
        if !Binding::RepositorySwitch.claim(&element) {
            continue;
        }
        let input = element
            .dyn_into::<HtmlInputElement>()
            .map_err(|_| anyhow!("Unable to convert repository switch into HtmlInputElement"))?;
        if !Binding::TestSwitch.is_claimed(&input) {
            init_bootstrap_switch_element(&input);
        }

        let handler_panel = panel.clone();
        let switch_input = input.clone();
        let callback = Closure::wrap(Box::new(move |state: bool| {
            let panel = handler_panel.clone();
            let switch = DomSwitch::new(switch_input.clone());
            spawn_local(async move {
                let badges = DocumentBadges::new(panel.document.clone());
                panel.controller.toggle(&switch, state, &badges).await;
            });
        }) as Box<dyn FnMut(bool)>);
        on_bootstrap_switch_change(&input, &callback);

        panel.switch_handlers.borrow_mut().push(SwitchHandler {
            input,
            _callback: callback,
        });
    }
    debug!("{} repository switches bound", panel.bound_switch_count());

    Ok(())
}

fn bind_sync_button(panel: &Rc<Panel>) -> Result<()> {
    let Some(button) = query_selector(&panel.document, &panel.config.sync_button)? else {
        debug!("No `{}` sync button on the page", panel.config.sync_button);
        return Ok(());
    };
    if !Binding::SyncButton.claim(&button) {
        return Ok(());
    }

    let handler_panel = panel.clone();
    let sync_button = button.clone();
    let callback = Closure::wrap(Box::new(move |_: MouseEvent| {
        let panel = handler_panel.clone();
        let button = DomSyncButton::new(sync_button.clone());
        spawn_local(async move {
            if let Err(error) = sync_and_remount(&panel, &button).await {
                error!("Unable to mount synchronized GitLab panel: {error:?}");
            }
        });
    }) as Box<dyn FnMut(MouseEvent)>);
    button
        .add_event_listener_with_callback("click", callback.as_ref().unchecked_ref())
        .map_err(js_error)
        .context("Failed to add `click` event listener on sync button")?;

    // A sync button rendered inside the refreshed content replaces the previous one
    *panel.sync_handler.borrow_mut() = Some(SyncHandler { button, callback });

    Ok(())
}

async fn sync_and_remount(panel: &Rc<Panel>, button: &DomSyncButton) -> Result<()> {
    let view = DomView::new(panel.document.clone(), panel.config.gitlab_view.clone());

    if panel.controller.sync(button, &view).await == SyncOutcome::Refreshed {
        let root = view
            .element()
            .with_context(|| format!("Element `{}` not found", panel.config.gitlab_view))?;
        mount(&root, panel)?;
    }

    Ok(())
}
