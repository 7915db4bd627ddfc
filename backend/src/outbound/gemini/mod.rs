//! Gemini outbound adapter.
//!
//! One HTTP client serves both the `ReceiptExtractor` and `InsightGenerator`
//! ports, each bound to its own model.

mod client;
mod dto;

pub use client::{
    DEFAULT_EXTRACTION_MODEL, DEFAULT_GEMINI_BASE_URL, DEFAULT_INSIGHT_MODEL, GeminiClient,
    GeminiSettings,
};
