use http::StatusCode;

pub mod config;
pub mod controller;
pub mod hook;

pub use config::{PanelConfig, PanelEndpoints, DEFAULT_FADE_DURATION};
pub use hook::{HookAction, HookRequest, HookStatus, RepoId};

#[derive(Debug, thiserror::Error)]
pub enum PanelError {
    #[error("Invalid panel configuration: {0}")]
    InvalidConfiguration(#[from] validator::ValidationErrors),
    #[error("Unable to parse panel configuration")]
    InvalidConfigurationData(#[from] serde_json::Error),
    #[error("Unable to resolve `{endpoint}` endpoint")]
    InvalidEndpoint {
        #[source]
        source: url::ParseError,
        endpoint: String,
    },
    #[error("Unexpected HTTP status {0}")]
    UnexpectedStatus(StatusCode),
    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}
