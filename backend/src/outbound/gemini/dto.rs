//! Wire types for the Gemini `generateContent` endpoint.

use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct GenerateRequestDto<'a> {
    pub(super) contents: [ContentDto<'a>; 1],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(super) generation_config: Option<GenerationConfigDto>,
}

#[derive(Debug, Serialize)]
pub(super) struct ContentDto<'a> {
    pub(super) role: &'static str,
    pub(super) parts: Vec<PartDto<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub(super) enum PartDto<'a> {
    Text {
        text: &'a str,
    },
    InlineData {
        inline_data: InlineDataDto<'a>,
    },
}

#[derive(Debug, Serialize)]
pub(super) struct InlineDataDto<'a> {
    pub(super) mime_type: &'a str,
    pub(super) data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct GenerationConfigDto {
    pub(super) response_mime_type: &'static str,
}

#[derive(Debug, Deserialize)]
pub(super) struct GenerateResponseDto {
    #[serde(default)]
    candidates: Vec<CandidateDto>,
}

#[derive(Debug, Deserialize)]
struct CandidateDto {
    content: Option<CandidateContentDto>,
}

#[derive(Debug, Deserialize)]
struct CandidateContentDto {
    #[serde(default)]
    parts: Vec<ResponsePartDto>,
}

#[derive(Debug, Deserialize)]
struct ResponsePartDto {
    text: Option<String>,
}

impl GenerateResponseDto {
    /// Concatenated text parts of the first candidate, if any.
    pub(super) fn into_text(self) -> Option<String> {
        let candidate = self.candidates.into_iter().next()?;
        let text: String = candidate
            .content?
            .parts
            .into_iter()
            .filter_map(|part| part.text)
            .collect();
        (!text.trim().is_empty()).then_some(text)
    }
}
