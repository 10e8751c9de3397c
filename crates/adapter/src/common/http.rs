use crate::error::{ConfigurationError, PublishError, PublishStep};
use reqwest::{Client, RequestBuilder, Response};
use std::time::Duration;

pub const USER_AGENT: &str = concat!("no-comment/", env!("CARGO_PKG_VERSION"));

/// Shared client for every outbound call. The timeout bounds each request.
pub fn build_client(timeout: Duration) -> Result<Client, ConfigurationError> {
    let client = Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .build()?;
    Ok(client)
}

/// Sends one step's request; anything but a 2xx fails the step.
pub(crate) async fn send_step(
    step: PublishStep,
    request: RequestBuilder,
) -> Result<Response, PublishError> {
    tracing::debug!("publish step: {}", step);
    let response = request
        .send()
        .await
        .map_err(|source| PublishError::Transport { step, source })?;

    let status = response.status();
    if !status.is_success() {
        return Err(PublishError::Status { step, status });
    }
    Ok(response)
}

pub(crate) async fn json_body(
    step: PublishStep,
    response: Response,
) -> Result<serde_json::Value, PublishError> {
    response
        .json()
        .await
        .map_err(|source| PublishError::Transport { step, source })
}

/// Percent-encodes each `/`-separated segment, keeping the separators.
pub(crate) fn encode_segments(path: &str) -> String {
    path.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}
