//! Driven port for LLM-backed receipt extraction.

use async_trait::async_trait;

use crate::domain::ExtractedReceiptData;

use super::define_port_error;

/// Document handed to the extractor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionRequest {
    /// Original file name, used as a hint for the display name.
    pub file_name: String,
    /// MIME type of `bytes`.
    pub mime_type: String,
    /// Raw document bytes.
    pub bytes: Vec<u8>,
}

define_port_error! {
    /// Errors surfaced while extracting receipt data.
    pub enum ReceiptExtractionError {
        /// Network transport failed before receiving a response.
        Transport { message: String } =>
            "extraction transport failed: {message}",
        /// Extraction call exceeded timeout.
        Timeout { message: String } =>
            "extraction timeout: {message}",
        /// Model provider rate-limited the request.
        RateLimited { message: String } =>
            "extraction rate limited: {message}",
        /// Model output could not be decoded into receipt data.
        Decode { message: String } =>
            "extraction output decode failed: {message}",
        /// Adapter or provider rejected the request.
        InvalidRequest { message: String } =>
            "extraction request invalid: {message}",
    }
}

impl ReceiptExtractionError {
    /// Return whether retrying this error is expected to help.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Transport { .. } | Self::Timeout { .. } | Self::RateLimited { .. }
        )
    }
}

/// Port for turning a receipt document into structured data.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReceiptExtractor: Send + Sync {
    /// Extract structured fields from one document.
    async fn extract(
        &self,
        request: &ExtractionRequest,
    ) -> Result<ExtractedReceiptData, ReceiptExtractionError>;
}

/// Fixture implementation returning an empty extraction.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureReceiptExtractor;

#[async_trait]
impl ReceiptExtractor for FixtureReceiptExtractor {
    async fn extract(
        &self,
        _request: &ExtractionRequest,
    ) -> Result<ExtractedReceiptData, ReceiptExtractionError> {
        Ok(ExtractedReceiptData::default())
    }
}
