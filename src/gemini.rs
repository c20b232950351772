use anyhow::{anyhow, Context};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, instrument, warn};

use crate::codec::{strip_data_uri_prefix, ImagePayload};
use crate::config::ServiceConfig;
use crate::error::StudioError;
use crate::service::{
    into_result, normalize_media_type, refine_instruction, stylize_instruction, GenerationResult,
    ImageService, ResponsePart, NO_IMAGE, REFINE_FAILED, STYLIZE_FAILED,
};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequestBody<'a> {
    contents: Vec<GeminiContentRequest<'a>>,
    generation_config: GeminiGenerationConfig,
}

#[derive(Debug, Serialize)]
struct GeminiContentRequest<'a> {
    role: &'static str,
    parts: Vec<GeminiPartRequest<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum GeminiPartRequest<'a> {
    Inline {
        #[serde(rename = "inlineData")]
        inline_data: GeminiInlineDataRequest<'a>,
    },
    Text {
        text: &'a str,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiInlineDataRequest<'a> {
    mime_type: &'a str,
    data: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiGenerationConfig {
    response_modalities: Vec<&'static str>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponseBody {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    prompt_feedback: Option<GeminiPromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    content: Option<GeminiContentResponse>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiContentResponse {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiPart {
    text: Option<String>,
    #[serde(alias = "inline_data")]
    inline_data: Option<GeminiInlineData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiInlineData {
    #[serde(alias = "mime_type")]
    mime_type: Option<String>,
    #[serde(default)]
    data: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiPromptFeedback {
    block_reason: Option<String>,
}

impl From<GeminiPart> for ResponsePart {
    fn from(part: GeminiPart) -> Self {
        if let Some(inline) = part.inline_data {
            let data = strip_data_uri_prefix(&inline.data);
            if !data.is_empty() {
                let media_type = normalize_media_type(inline.mime_type.as_deref());
                return ResponsePart::Image(ImagePayload::new(data, media_type));
            }
        }
        match part.text {
            Some(t) if !t.is_empty() => ResponsePart::Text(t),
            _ => ResponsePart::Other,
        }
    }
}

#[derive(Debug, thiserror::Error)]
enum CallError {
    #[error(transparent)]
    Transport(#[from] anyhow::Error),
    #[error("no image in response (reason: {})", .0.as_deref().unwrap_or("unspecified"))]
    NoImage(Option<String>),
}

/// Only the first candidate is considered.
fn parse_response(body: GeminiResponseBody) -> Result<GenerationResult, CallError> {
    let block_reason = body.prompt_feedback.and_then(|f| f.block_reason);
    let candidate = body.candidates.into_iter().next();
    let finish_reason = candidate.as_ref().and_then(|c| c.finish_reason.clone());
    let parts = candidate
        .and_then(|c| c.content)
        .map(|c| c.parts)
        .unwrap_or_default();

    into_result(parts.into_iter().map(ResponsePart::from))
        .ok_or(CallError::NoImage(block_reason.or(finish_reason)))
}

fn build_body<'a>(image: &'a ImagePayload, instruction: &'a str) -> GeminiRequestBody<'a> {
    GeminiRequestBody {
        contents: vec![GeminiContentRequest {
            role: "user",
            parts: vec![
                GeminiPartRequest::Inline {
                    inline_data: GeminiInlineDataRequest {
                        mime_type: &image.media_type,
                        data: &image.data,
                    },
                },
                GeminiPartRequest::Text { text: instruction },
            ],
        }],
        generation_config: GeminiGenerationConfig {
            response_modalities: vec!["IMAGE"],
        },
    }
}

pub struct GeminiClient {
    http: reqwest::Client,
    config: ServiceConfig,
}

impl GeminiClient {
    pub fn new(config: ServiceConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .context("build http client")?;
        Ok(Self { http, config })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.config.api_base_url.trim_end_matches('/'),
            self.config.model
        )
    }

    async fn generate_content(
        &self,
        image: &ImagePayload,
        instruction: &str,
    ) -> Result<GenerationResult, CallError> {
        let body = build_body(image, instruction);
        let resp = self
            .http
            .post(self.endpoint())
            .header("x-goog-api-key", &self.config.api_key)
            .json(&body)
            .send()
            .await
            .context("gemini image request failed")?;

        if !resp.status().is_success() {
            return Err(anyhow!("gemini image error: HTTP {}", resp.status()).into());
        }

        let value: GeminiResponseBody = resp
            .json()
            .await
            .context("gemini image parse error")?;
        let result = parse_response(value)?;
        debug!(
            media_type = %result.image.media_type,
            text_len = result.text.len(),
            "gemini image received"
        );
        Ok(result)
    }
}

fn user_facing(err: CallError, transport_message: &str) -> String {
    match err {
        CallError::NoImage(reason) => {
            warn!(reason = reason.as_deref().unwrap_or("unspecified"), "model returned no image");
            NO_IMAGE.to_string()
        }
        CallError::Transport(e) => {
            error!(error = ?e, "gemini call failed");
            transport_message.to_string()
        }
    }
}

#[async_trait]
impl ImageService for GeminiClient {
    #[instrument(skip(self, original))]
    async fn stylize(&self, original: &ImagePayload, style: &str) -> Result<GenerationResult, StudioError> {
        let instruction = stylize_instruction(style);
        self.generate_content(original, &instruction)
            .await
            .map_err(|e| StudioError::GenerationFailed(user_facing(e, STYLIZE_FAILED)))
    }

    #[instrument(skip_all)]
    async fn refine(&self, current: &ImagePayload, instruction: &str) -> Result<GenerationResult, StudioError> {
        let prompt = refine_instruction(instruction);
        self.generate_content(current, &prompt)
            .await
            .map_err(|e| StudioError::RefinementFailed(user_facing(e, REFINE_FAILED)))
    }
}
