use crate::error::RelayError;
use crate::forwarder::PayloadForwarder;
use crate::payload::GenerationRequest;

/// Entry point for generation requests. Hands each request to the forwarder
/// and returns its result untouched.
#[derive(Debug, Clone)]
pub struct RequestReceiver {
    forwarder: PayloadForwarder,
}

impl RequestReceiver {
    pub fn new(forwarder: PayloadForwarder) -> Self {
        Self { forwarder }
    }

    pub fn forwarder(&self) -> &PayloadForwarder {
        &self.forwarder
    }

    pub async fn handle_generate(&self, request: GenerationRequest) -> Result<String, RelayError> {
        let GenerationRequest {
            video_id,
            prompt,
            webhook_url,
        } = request;

        self.forwarder
            .forward(&video_id, &prompt, &webhook_url)
            .await
    }
}
