//! Default `Transport` backed by a blocking `ureq` agent.

use std::fmt;

use tracing::trace;

use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse, Transport};

/// Sends requests with `ureq` on tokio's blocking pool.
///
/// The returned future must be polled inside a tokio runtime; elsewhere it
/// resolves to `ApiError::Transport` without sending anything. The agent has status-as-error disabled so 4xx/5xx responses come back as
/// data and the client interprets them.
#[derive(Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl fmt::Debug for UreqTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UreqTransport").finish_non_exhaustive()
    }
}

impl UreqTransport {
    pub fn new() -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .build()
            .new_agent();
        Self { agent }
    }

    /// Wrap an agent configured by the caller (timeouts, proxies, TLS).
    ///
    /// The agent should have `http_status_as_error(false)`; otherwise
    /// non-200 responses surface as transport errors.
    pub fn with_agent(agent: ureq::Agent) -> Self {
        Self { agent }
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for UreqTransport {
    async fn post(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        let runtime = tokio::runtime::Handle::try_current().map_err(ApiError::transport)?;
        let agent = self.agent.clone();
        runtime
            .spawn_blocking(move || execute(&agent, request))
            .await
            .map_err(ApiError::transport)?
    }
}

fn execute(agent: &ureq::Agent, request: HttpRequest) -> Result<HttpResponse, ApiError> {
    trace!(url = %request.url, bytes = request.body.len(), "sending POST");

    let mut builder = agent.post(&request.url);
    for (name, value) in &request.headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    let mut response = builder
        .send(request.body.as_bytes())
        .map_err(ApiError::transport)?;

    let status = response.status().as_u16();
    let headers = response
        .headers()
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_string(), v.to_string()))
        })
        .collect();
    let body = response
        .body_mut()
        .read_to_string()
        .map_err(ApiError::transport)?;

    Ok(HttpResponse {
        status,
        headers,
        body,
    })
}
