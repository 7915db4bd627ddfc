//! Reqwest-backed Gemini adapter for extraction and insight generation.
//!
//! This adapter owns transport details only: request serialisation, timeout
//! and HTTP error mapping, and recovering JSON from the model's text.

use std::time::Duration;

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use reqwest::{Client, Url};
use tracing::debug;
use zeroize::Zeroizing;

use super::dto::{
    ContentDto, GenerateRequestDto, GenerateResponseDto, GenerationConfigDto, InlineDataDto,
    PartDto,
};
use crate::domain::ExtractedReceiptData;
use crate::domain::insights::{extract_json_object, extraction_prompt};
use crate::domain::ports::{
    ExtractionRequest, InsightGenerator, InsightGeneratorError, ReceiptExtractionError,
    ReceiptExtractor,
};
use crate::outbound::http_status::{
    FailureKind, classify_status, classify_transport, status_message,
};

/// Public Gemini API endpoint.
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/";
/// Model used to read receipt PDFs.
pub const DEFAULT_EXTRACTION_MODEL: &str = "gemini-1.5-pro";
/// Model used for insight text.
pub const DEFAULT_INSIGHT_MODEL: &str = "gemini-1.5-flash";

/// Connection settings for [`GeminiClient`].
pub struct GeminiSettings {
    /// API key sent as `x-goog-api-key`.
    pub api_key: Zeroizing<String>,
    /// API root, normally [`DEFAULT_GEMINI_BASE_URL`].
    pub base_url: Url,
    /// Model name for extraction.
    pub extraction_model: String,
    /// Model name for insights.
    pub insight_model: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

/// Gemini adapter implementing [`ReceiptExtractor`] and [`InsightGenerator`].
pub struct GeminiClient {
    client: Client,
    api_key: Zeroizing<String>,
    extraction_endpoint: Url,
    insight_endpoint: Url,
}

#[derive(Debug)]
struct CallError {
    kind: FailureKind,
    message: String,
}

impl GeminiClient {
    /// Build the adapter.
    ///
    /// # Errors
    ///
    /// Returns an error message when a model endpoint URL cannot be formed or
    /// the reqwest client cannot be constructed.
    pub fn new(settings: GeminiSettings) -> Result<Self, String> {
        let endpoint = |model: &str| {
            settings
                .base_url
                .join(&format!("v1beta/models/{model}:generateContent"))
                .map_err(|err| format!("invalid Gemini endpoint for {model}: {err}"))
        };
        let extraction_endpoint = endpoint(&settings.extraction_model)?;
        let insight_endpoint = endpoint(&settings.insight_model)?;
        let client = Client::builder()
            .timeout(settings.timeout)
            .build()
            .map_err(|err| err.to_string())?;
        Ok(Self {
            client,
            api_key: settings.api_key,
            extraction_endpoint,
            insight_endpoint,
        })
    }

    async fn generate_content(
        &self,
        endpoint: &Url,
        body: &GenerateRequestDto<'_>,
    ) -> Result<Option<String>, CallError> {
        let transport = |error: reqwest::Error| CallError {
            kind: classify_transport(&error),
            message: error.to_string(),
        };
        let response = self
            .client
            .post(endpoint.clone())
            .header("x-goog-api-key", self.api_key.as_str())
            .json(body)
            .send()
            .await
            .map_err(transport)?;

        let status = response.status();
        let bytes = response.bytes().await.map_err(transport)?;
        if !status.is_success() {
            return Err(CallError {
                kind: classify_status(status),
                message: status_message(status, bytes.as_ref()),
            });
        }

        let decoded: GenerateResponseDto =
            serde_json::from_slice(bytes.as_ref()).map_err(|err| CallError {
                kind: FailureKind::Rejected,
                message: format!("invalid Gemini response: {err}"),
            })?;
        Ok(decoded.into_text())
    }
}

fn extraction_error(error: CallError) -> ReceiptExtractionError {
    match error.kind {
        FailureKind::Transport => ReceiptExtractionError::transport(error.message),
        FailureKind::Timeout => ReceiptExtractionError::timeout(error.message),
        FailureKind::RateLimited => ReceiptExtractionError::rate_limited(error.message),
        FailureKind::Rejected => ReceiptExtractionError::invalid_request(error.message),
    }
}

fn parse_extraction(text: &str) -> Result<ExtractedReceiptData, ReceiptExtractionError> {
    let json = extract_json_object(text)
        .ok_or_else(|| ReceiptExtractionError::decode("model answer contained no JSON object"))?;
    serde_json::from_str(json)
        .map_err(|err| ReceiptExtractionError::decode(format!("invalid receipt JSON: {err}")))
}

#[async_trait]
impl ReceiptExtractor for GeminiClient {
    async fn extract(
        &self,
        request: &ExtractionRequest,
    ) -> Result<ExtractedReceiptData, ReceiptExtractionError> {
        let prompt = extraction_prompt(&request.file_name);
        let body = GenerateRequestDto {
            contents: [ContentDto {
                role: "user",
                parts: vec![
                    PartDto::Text { text: &prompt },
                    PartDto::InlineData {
                        inline_data: InlineDataDto {
                            mime_type: &request.mime_type,
                            data: STANDARD.encode(&request.bytes),
                        },
                    },
                ],
            }],
            generation_config: Some(GenerationConfigDto {
                response_mime_type: "application/json",
            }),
        };

        let text = self
            .generate_content(&self.extraction_endpoint, &body)
            .await
            .map_err(extraction_error)?
            .ok_or_else(|| ReceiptExtractionError::decode("model returned no text"))?;
        debug!(chars = text.len(), "extraction answer received");
        parse_extraction(&text)
    }
}

#[async_trait]
impl InsightGenerator for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String, InsightGeneratorError> {
        let body = GenerateRequestDto {
            contents: [ContentDto {
                role: "user",
                parts: vec![PartDto::Text { text: prompt }],
            }],
            generation_config: None,
        };
        self.generate_content(&self.insight_endpoint, &body)
            .await
            .map_err(|error| InsightGeneratorError::unavailable(error.message))?
            .ok_or_else(InsightGeneratorError::empty_response)
    }
}
