use crate::error::RelayError;
use crate::payload::OutboundPayload;
use reqwest::Client;
use std::fmt;
use std::time::Duration;
use tracing::{debug, error, info, warn};

pub const API_KEY_HEADER: &str = "x-freepik-api-key";

/// Everything the forwarder needs to reach the image generation API
#[derive(Clone)]
pub struct ForwarderConfig {
    pub api_url: String,
    pub api_key: String,
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
}

impl fmt::Debug for ForwarderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ForwarderConfig")
            .field("api_url", &self.api_url)
            .field("api_key", &"<redacted>")
            .field("request_timeout", &self.request_timeout)
            .field("connect_timeout", &self.connect_timeout)
            .finish()
    }
}

/// Sends generation requests to the upstream API and hands back its raw body.
///
/// Cloning is cheap: the underlying connection pool is shared between clones,
/// so one forwarder serves every in-flight request.
#[derive(Debug, Clone)]
pub struct PayloadForwarder {
    client: Client,
    config: ForwarderConfig,
}

impl PayloadForwarder {
    pub fn new(config: ForwarderConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            // A redirect would re-send the body and the api key header elsewhere
            .redirect(reqwest::redirect::Policy::none())
            .build()?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &ForwarderConfig {
        &self.config
    }

    /// Issue exactly one POST to the upstream API.
    ///
    /// `video_id` only shows up in logs; it is not part of the payload.
    /// Redirects are not followed, a 3xx answer is an [`RelayError::UpstreamError`].
    pub async fn forward(
        &self,
        video_id: &str,
        prompt: &str,
        webhook_url: &str,
    ) -> Result<String, RelayError> {
        info!(video_id, prompt, webhook_url, "New thumbnail generation request");

        let payload = OutboundPayload::new(prompt, webhook_url);
        let response = self
            .client
            .post(&self.config.api_url)
            .header(API_KEY_HEADER, &self.config.api_key)
            .json(&payload)
            .send()
            .await
            .inspect_err(|err| {
                error!(video_id, api_url = %self.config.api_url, ?err, "Failed to reach upstream");
            })?;

        let status = response.status();
        let body = response.text().await.inspect_err(|err| {
            error!(video_id, %status, ?err, "Failed to read upstream body");
        })?;

        if !status.is_success() {
            warn!(video_id, %status, %body, "Upstream returned non-success status");
            return Err(RelayError::UpstreamError { status, body });
        }

        debug!(video_id, %status, len = body.len(), "Upstream accepted request");
        Ok(body)
    }
}
