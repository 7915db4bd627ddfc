//! Recovery of JSON payloads from free-form model output.

use super::InsightReport;

/// Slice `text` from the first `{` to the last `}` inclusive.
///
/// Models often wrap JSON in prose or code fences; this strips the wrapper
/// without attempting to balance braces.
///
/// # Examples
/// ```
/// use receipt_tracker::domain::insights::extract_json_object;
///
/// let text = "Sure! ```json\n{\"a\": {\"b\": 1}}\n``` Hope that helps.";
/// assert_eq!(extract_json_object(text), Some("{\"a\": {\"b\": 1}}"));
/// assert_eq!(extract_json_object("no json"), None);
/// ```
#[must_use]
pub fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

/// Parse an insight report from model output.
///
/// Returns `None` when no JSON object is present, when it does not decode,
/// or when it carries neither a summary nor any insights.
#[must_use]
pub fn parse_insight_report(text: &str) -> Option<InsightReport> {
    let json = extract_json_object(text)?;
    let report: InsightReport = serde_json::from_str(json).ok()?;
    let has_content = !report.summary.trim().is_empty() || !report.insights.is_empty();
    has_content.then_some(report)
}
