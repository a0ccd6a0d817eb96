use std::fmt;

use http::{Method, StatusCode};
use serde::{Deserialize, Serialize};

pub const HOOK_CONTENT_TYPE: &str = "application/json; charset=utf-8";

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Hash)]
#[serde(transparent)]
pub struct RepoId(pub String);

impl fmt::Display for RepoId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for RepoId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for RepoId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl RepoId {
    /// Selector of the `.hook-status` badge displaying the outcome of this
    /// repository's last hook change.
    pub fn badge_selector(&self) -> String {
        let escaped = self.0.replace('\\', "\\\\").replace('"', "\\\"");
        format!("[data-repo-id=\"{escaped}\"].hook-status")
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone)]
pub struct HookRequest {
    pub id: RepoId,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum HookAction {
    Enable,
    Disable,
}

impl HookAction {
    pub fn from_state(state: bool) -> Self {
        if state {
            HookAction::Enable
        } else {
            HookAction::Disable
        }
    }

    pub fn method(&self) -> Method {
        match self {
            HookAction::Enable => Method::POST,
            HookAction::Disable => Method::DELETE,
        }
    }
}

impl fmt::Display for HookAction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                HookAction::Enable => "enable",
                HookAction::Disable => "disable",
            }
        )
    }
}

/// Outcome of a successful hook request, as shown by the status badge.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum HookStatus {
    /// The backend created (201) or removed (204) the hook.
    Confirmed,
    /// Any other success status: the request went through but the backend
    /// did not confirm the hook change.
    Unconfirmed,
}

impl HookStatus {
    pub fn from_status_code(status: StatusCode) -> Self {
        match status {
            StatusCode::CREATED | StatusCode::NO_CONTENT => HookStatus::Confirmed,
            _ => HookStatus::Unconfirmed,
        }
    }

    pub fn css_classes(&self) -> &'static [&'static str] {
        match self {
            HookStatus::Confirmed => &["fa-check", "text-success"],
            HookStatus::Unconfirmed => &["fa-exclamation", "text-warning"],
        }
    }
}
