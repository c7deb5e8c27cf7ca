use serde::{Deserialize, Serialize};

use crate::error::RelayError;

pub const PROMPT_UPSAMPLING: bool = false;
pub const SEED: u32 = 123;
pub const ASPECT_RATIO: &str = "widescreen_16_9";
pub const SAFETY_TOLERANCE: u8 = 2;
pub const OUTPUT_FORMAT: &str = "jpeg";

/// A thumbnail generation request as accepted by the relay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub video_id: String,
    pub prompt: String,
    pub webhook_url: String,
}

/// Inbound JSON body of `POST /api/thumbnail/generate`.
///
/// Every field is optional at the serde level so that a missing field is
/// reported as a [`RelayError::MalformedRequest`] naming the field.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateThumbnailBody {
    pub video_id: Option<String>,
    pub prompt: Option<String>,
    pub webhook_url: Option<String>,
}

impl TryFrom<GenerateThumbnailBody> for GenerationRequest {
    type Error = RelayError;

    fn try_from(body: GenerateThumbnailBody) -> Result<Self, Self::Error> {
        let missing = |field: &str| RelayError::MalformedRequest(format!("missing field `{field}`"));

        Ok(Self {
            video_id: body.video_id.ok_or_else(|| missing("videoId"))?,
            prompt: body.prompt.ok_or_else(|| missing("prompt"))?,
            webhook_url: body.webhook_url.ok_or_else(|| missing("webhookUrl"))?,
        })
    }
}

/// Body sent to the image generation API.
///
/// Only `prompt` and `webhook_url` vary per call, the remaining keys are fixed
/// generation parameters. Field order is the serialized key order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OutboundPayload<'a> {
    pub prompt: &'a str,
    pub prompt_upsampling: bool,
    pub seed: u32,
    pub aspect_ratio: &'static str,
    pub safety_tolerance: u8,
    pub output_format: &'static str,
    pub webhook_url: &'a str,
}

impl<'a> OutboundPayload<'a> {
    pub fn new(prompt: &'a str, webhook_url: &'a str) -> Self {
        Self {
            prompt,
            prompt_upsampling: PROMPT_UPSAMPLING,
            seed: SEED,
            aspect_ratio: ASPECT_RATIO,
            safety_tolerance: SAFETY_TOLERANCE,
            output_format: OUTPUT_FORMAT,
            webhook_url,
        }
    }
}
