use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;
use validator::Validate;

use crate::PanelError;

/// Duration of the status badge fade-out, in milliseconds of wall-clock time.
pub const DEFAULT_FADE_DURATION: Duration = Duration::from_millis(2000);

/// Settings handed over by the page rendering the GitLab panel.
///
/// Selectors are CSS selectors, endpoints are either absolute URLs or paths
/// relative to the page origin.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Validate)]
pub struct PanelConfig {
    #[validate(length(min = 1))]
    pub sync_button: String,
    #[validate(length(min = 1))]
    pub sync_url: String,
    #[validate(length(min = 1))]
    pub gitlab_view: String,
    #[validate(length(min = 1))]
    pub hook_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fade_duration_ms: Option<u64>,
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct PanelEndpoints {
    pub sync_url: Url,
    pub hook_url: Url,
}

impl PanelConfig {
    pub fn try_new(
        sync_button: String,
        sync_url: String,
        gitlab_view: String,
        hook_url: String,
    ) -> Result<Self, PanelError> {
        let config = Self {
            sync_button,
            sync_url,
            gitlab_view,
            hook_url,
            fade_duration_ms: None,
        };

        config.validate()?;

        Ok(config)
    }

    pub fn from_json(json: &str) -> Result<Self, PanelError> {
        let config: PanelConfig = serde_json::from_str(json)?;
        config.validated()
    }

    pub fn validated(self) -> Result<Self, PanelError> {
        self.validate()?;
        Ok(self)
    }

    pub fn with_fade_duration(self, fade_duration: Duration) -> Self {
        let fade_duration_ms = u64::try_from(fade_duration.as_millis()).unwrap_or(u64::MAX);
        Self {
            fade_duration_ms: Some(fade_duration_ms),
            ..self
        }
    }

    pub fn fade_duration(&self) -> Duration {
        self.fade_duration_ms
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_FADE_DURATION)
    }

    pub fn resolve_endpoints(&self, origin: &Url) -> Result<PanelEndpoints, PanelError> {
        Ok(PanelEndpoints {
            sync_url: resolve_endpoint(origin, &self.sync_url)?,
            hook_url: resolve_endpoint(origin, &self.hook_url)?,
        })
    }
}

fn resolve_endpoint(origin: &Url, endpoint: &str) -> Result<Url, PanelError> {
    match Url::parse(endpoint) {
        Ok(url) => Ok(url),
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            origin
                .join(endpoint)
                .map_err(|source| PanelError::InvalidEndpoint {
                    source,
                    endpoint: endpoint.to_string(),
                })
        }
        Err(source) => Err(PanelError::InvalidEndpoint {
            source,
            endpoint: endpoint.to_string(),
        }),
    }
}
