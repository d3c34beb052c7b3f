//! Round trip to the compile service.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use super::{BuildRequest, BuildResponse};
use crate::error::BuildError;

/// Sends one build request. Implementations report failures as they happen;
/// retries are never attempted.
pub trait BuildTransport: Send + Sync {
    fn send(
        &self,
        request: BuildRequest,
    ) -> impl Future<Output = Result<BuildResponse, BuildError>> + Send;
}

impl<T: BuildTransport> BuildTransport for Arc<T> {
    fn send(
        &self,
        request: BuildRequest,
    ) -> impl Future<Output = Result<BuildResponse, BuildError>> + Send {
        (**self).send(request)
    }
}

/// JSON over HTTP: `POST <server>/build`.
#[derive(Debug, Clone)]
pub struct HttpBuildTransport {
    agent: ureq::Agent,
    endpoint: String,
}

impl HttpBuildTransport {
    /// `timeout` bounds the whole request, connect through body.
    pub fn new(server_url: &str, timeout: Duration) -> Self {
        let agent: ureq::Agent = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .http_status_as_error(false)
            .build()
            .into();
        Self {
            agent,
            endpoint: format!("{}/build", server_url.trim_end_matches('/')),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl BuildTransport for HttpBuildTransport {
    async fn send(&self, request: BuildRequest) -> Result<BuildResponse, BuildError> {
        let body = serde_json::to_string(&request)
            .map_err(|err| BuildError::Transport(format!("encode request: {err}")))?;
        let agent = self.agent.clone();
        let endpoint = self.endpoint.clone();
        debug!("POST {endpoint} ({} files)", request.files.len());
        tokio::task::spawn_blocking(move || post_json(&agent, &endpoint, &body))
            .await
            .map_err(|err| BuildError::Transport(err.to_string()))?
    }
}

fn post_json(agent: &ureq::Agent, endpoint: &str, body: &str) -> Result<BuildResponse, BuildError> {
    let mut response = agent
        .post(endpoint)
        .header("Content-Type", "application/json")
        .send(body.as_bytes())
        .map_err(|err| BuildError::Transport(err.to_string()))?;
    let status = response.status();
    let text = response
        .body_mut()
        .read_to_string()
        .map_err(|err| BuildError::Transport(err.to_string()))?;
    if !status.is_success() {
        let message = if text.trim().is_empty() {
            status.to_string()
        } else {
            text
        };
        return Err(BuildError::Remote(message));
    }
    serde_json::from_str(&text)
        .map_err(|err| BuildError::Transport(format!("decode response: {err}")))
}
