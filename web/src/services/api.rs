use anyhow::Context;
use log::debug;
use reqwest::{
    header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, CONTENT_TYPE},
    Client, RequestBuilder, Response, StatusCode,
};

use gitlab_panel::{
    controller::PanelBackend,
    hook::{HookAction, HookRequest, HOOK_CONTENT_TYPE},
    PanelEndpoints, PanelError,
};

const X_REQUESTED_WITH: HeaderName = HeaderName::from_static("x-requested-with");

pub struct HttpPanelBackend {
    endpoints: PanelEndpoints,
}

impl HttpPanelBackend {
    pub fn new(endpoints: PanelEndpoints) -> Self {
        Self { endpoints }
    }

    pub fn hook_request(&self, action: HookAction, request: &HookRequest) -> RequestBuilder {
        let mut headers = xhr_headers("application/json");
        // `json` sets a bare `application/json`, the backend expects the charset
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(HOOK_CONTENT_TYPE));

        API_CLIENT
            .request(action.method(), self.endpoints.hook_url.clone())
            .json(request)
            .headers(headers)
    }

    // The backend synchronizes hooks synchronously only for XHR requests
    pub fn sync_request(&self) -> RequestBuilder {
        API_CLIENT
            .post(self.endpoints.sync_url.clone())
            .headers(xhr_headers("text/html"))
    }
}

impl PanelBackend for HttpPanelBackend {
    async fn send_hook_request(
        &self,
        action: HookAction,
        request: &HookRequest,
    ) -> Result<StatusCode, PanelError> {
        debug!("{} {} {}", action.method(), self.endpoints.hook_url, request.id);

        // 201/204 answers come with an empty body, which is never parsed
        let response = self
            .hook_request(action, request)
            .send()
            .await
            .with_context(|| format!("Failed to send hook request for repository {}", request.id))?;

        check_status(&response)
    }

    async fn sync(&self) -> Result<String, PanelError> {
        debug!("POST {}", self.endpoints.sync_url);

        let response = self
            .sync_request()
            .send()
            .await
            .context("Failed to send sync request")?;

        check_status(&response)?;

        Ok(response
            .text()
            .await
            .context("Unable to read sync response body")?)
    }
}

fn xhr_headers(accept: &'static str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static(accept));
    headers.insert(X_REQUESTED_WITH, HeaderValue::from_static("XMLHttpRequest"));
    headers
}

fn check_status(response: &Response) -> Result<StatusCode, PanelError> {
    let status = response.status();
    if status.is_success() {
        Ok(status)
    } else {
        Err(PanelError::UnexpectedStatus(status))
    }
}

lazy_static! {
    pub static ref API_CLIENT: Client = reqwest::ClientBuilder::new().build().unwrap();
}
