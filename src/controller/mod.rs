//! DOM-agnostic logic of the GitLab repositories panel.
//!
//! The browser bindings live in the `web` crate; everything that decides
//! *what* happens when a switch is flipped or the sync button is clicked is
//! kept here so it can run against in-memory fakes.

use std::{
    cell::{Cell, RefCell},
    collections::{HashMap, HashSet},
    time::Duration,
};

use http::StatusCode;
use log::{debug, info, warn};

use crate::{
    hook::{HookAction, HookRequest, HookStatus, RepoId},
    PanelError,
};

#[cfg(test)]
mod tests;

#[allow(async_fn_in_trait)]
pub trait PanelBackend {
    /// Install or remove a repository hook.
    ///
    /// Only success statuses are returned as `Ok`, anything else is an error.
    async fn send_hook_request(
        &self,
        action: HookAction,
        request: &HookRequest,
    ) -> Result<StatusCode, PanelError>;

    /// Ask the backend to refresh the repositories, returning the rendered
    /// HTML fragment of the panel.
    async fn sync(&self) -> Result<String, PanelError>;
}

#[allow(async_fn_in_trait)]
pub trait Timer {
    async fn sleep(&self, duration: Duration);
}

pub trait RepositorySwitch {
    fn repo_id(&self) -> Option<RepoId>;
    fn set_disabled(&self, disabled: bool);
    /// Move the switch to `state` without emitting a state-change event.
    fn set_state_silently(&self, state: bool);
}

pub trait StatusBadge {
    fn add_classes(&self, classes: &[&str]);
    fn remove_classes(&self, classes: &[&str]);
    /// Start animating the badge opacity down to 0 over `duration`.
    fn fade_out(&self, duration: Duration);
    fn reset_opacity(&self);
}

pub trait BadgeLocator {
    type Badge: StatusBadge;

    fn find_badge(&self, repo_id: &RepoId) -> Option<Self::Badge>;
}

pub trait SyncButton {
    fn set_disabled(&self, disabled: bool);
    fn set_spinning(&self, spinning: bool);
}

pub trait PanelView {
    fn replace_content(&self, html: &str);
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub enum ToggleOutcome {
    MissingRepoId,
    AlreadyInFlight(RepoId),
    Applied { repo_id: RepoId, status: HookStatus },
    Reverted(RepoId),
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum SyncOutcome {
    Refreshed,
    Failed,
    AlreadyInFlight,
}

pub struct PanelController<B, T> {
    backend: B,
    timer: T,
    fade_duration: Duration,
    hooks_in_flight: RefCell<HashSet<RepoId>>,
    active_fades: RefCell<HashMap<RepoId, ActiveFade>>,
    fade_generation: Cell<u64>,
    sync_in_flight: Cell<bool>,
}

/// Badge fade currently shown for a repository. Only the fade holding the
/// latest generation may clean the badge up.
#[derive(Debug, Clone, Copy)]
struct ActiveFade {
    generation: u64,
    status: HookStatus,
}

impl<B, T> PanelController<B, T>
where
    B: PanelBackend,
    T: Timer,
{
    pub fn new(backend: B, timer: T, fade_duration: Duration) -> Self {
        Self {
            backend,
            timer,
            fade_duration,
            hooks_in_flight: RefCell::new(HashSet::new()),
            active_fades: RefCell::new(HashMap::new()),
            fade_generation: Cell::new(0),
            sync_in_flight: Cell::new(false),
        }
    }

    pub fn fade_duration(&self) -> Duration {
        self.fade_duration
    }

    pub fn is_sync_in_flight(&self) -> bool {
        self.sync_in_flight.get()
    }

    /// Apply a state change of a repository switch to the backend hook.
    ///
    /// The switch stays disabled until the request completes. The badge fade
    /// runs after the switch has been re-enabled.
    pub async fn toggle<S, L>(&self, switch: &S, state: bool, badges: &L) -> ToggleOutcome
    where
        S: RepositorySwitch,
        L: BadgeLocator,
    {
        let Some(repo_id) = switch.repo_id() else {
            warn!("Repository switch has no `data-repo-id`, ignoring state change");
            return ToggleOutcome::MissingRepoId;
        };

        if !self.hooks_in_flight.borrow_mut().insert(repo_id.clone()) {
            debug!("Hook request already in flight for repository {repo_id}");
            return ToggleOutcome::AlreadyInFlight(repo_id);
        }

        switch.set_disabled(true);

        let action = HookAction::from_state(state);
        let request = HookRequest {
            id: repo_id.clone(),
        };
        debug!("Sending {action} hook request for repository {repo_id}");
        let result = self.backend.send_hook_request(action, &request).await;
        self.hooks_in_flight.borrow_mut().remove(&repo_id);

        let (outcome, fading_badge) = match result {
            Ok(status_code) => {
                let status = HookStatus::from_status_code(status_code);
                info!("Hook {action} request for repository {repo_id} answered with {status_code}");

                let badge = badges.find_badge(&repo_id);
                let fade = match &badge {
                    Some(badge) => Some(self.start_fade(badge, &repo_id, status)),
                    None => {
                        debug!("No status badge found for repository {repo_id}");
                        None
                    }
                };

                (
                    ToggleOutcome::Applied {
                        repo_id: repo_id.clone(),
                        status,
                    },
                    badge.zip(fade),
                )
            }
            Err(error) => {
                warn!("Failed to {action} hook for repository {repo_id}: {error:?}");
                switch.set_state_silently(!state);
                (ToggleOutcome::Reverted(repo_id.clone()), None)
            }
        };

        switch.set_disabled(false);

        if let Some((badge, fade)) = fading_badge {
            self.timer.sleep(self.fade_duration).await;
            self.finish_fade(&badge, &repo_id, fade);
        }

        outcome
    }

    /// Show `status` on the badge and fade it out, superseding any fade still
    /// running for the same repository.
    fn start_fade<Badge: StatusBadge>(
        &self,
        badge: &Badge,
        repo_id: &RepoId,
        status: HookStatus,
    ) -> ActiveFade {
        let generation = self.fade_generation.get() + 1;
        self.fade_generation.set(generation);

        let fade = ActiveFade { generation, status };
        let previous = self.active_fades.borrow_mut().insert(repo_id.clone(), fade);
        if let Some(previous) = previous {
            debug!("Restarting status badge fade of repository {repo_id}");
            badge.remove_classes(previous.status.css_classes());
            badge.reset_opacity();
        }

        badge.add_classes(status.css_classes());
        badge.fade_out(self.fade_duration);
        fade
    }

    fn finish_fade<Badge: StatusBadge>(&self, badge: &Badge, repo_id: &RepoId, fade: ActiveFade) {
        let mut active_fades = self.active_fades.borrow_mut();
        match active_fades.get(repo_id) {
            Some(active) if active.generation == fade.generation => {
                active_fades.remove(repo_id);
                badge.remove_classes(fade.status.css_classes());
                badge.reset_opacity();
            }
            _ => debug!("Status badge fade of repository {repo_id} was superseded"),
        }
    }

    /// Refresh the panel content from the backend.
    ///
    /// On `SyncOutcome::Refreshed` the caller is expected to mount the new
    /// content of `view`.
    pub async fn sync<Btn, V>(&self, button: &Btn, view: &V) -> SyncOutcome
    where
        Btn: SyncButton,
        V: PanelView,
    {
        if self.sync_in_flight.replace(true) {
            debug!("Sync already in flight, ignoring click");
            return SyncOutcome::AlreadyInFlight;
        }

        button.set_disabled(true);
        button.set_spinning(true);

        let outcome = match self.backend.sync().await {
            Ok(html) => {
                view.replace_content(&html);
                info!("GitLab repositories synchronized");
                SyncOutcome::Refreshed
            }
            Err(error) => {
                warn!("Failed to synchronize GitLab repositories: {error:?}");
                SyncOutcome::Failed
            }
        };

        button.set_disabled(false);
        button.set_spinning(false);
        self.sync_in_flight.set(false);

        outcome
    }
}
