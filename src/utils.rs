use crate::consts::NOT_AVAILABLE;
use crate::error::AppError;
use crate::types::CallResult;

use serde_json::{Map, Number, Value};
use time::{format_description::well_known::Rfc3339, OffsetDateTime};

/// Render a duration in seconds as `M:SS`. Negative inputs floor toward the previous minute.
pub fn format_duration(seconds: i64) -> String {
    format!("{}:{:02}", seconds.div_euclid(60), seconds.rem_euclid(60))
}

pub fn outcome_emoji(outcome: &str) -> &'static str {
    match outcome {
        "won" => "🎉",
        "lost" => "❌",
        "follow-up" => "📝",
        _ => "📞",
    }
}

/// Build the Markdown notification text posted to the results chat.
pub fn format_call_result(call_result: &CallResult) -> String {
    let outcome = call_result.outcome.as_deref().unwrap_or("unknown");
    let emoji = outcome_emoji(outcome);
    let heading = outcome.to_uppercase();

    let profile = call_result.profile.clone().unwrap_or_default();
    let first_name = placeholder_or(profile.first_name.as_ref());
    let last_name = placeholder_or(profile.last_name.as_ref());
    let company = placeholder_or(profile.company.as_ref());
    let phone = placeholder_or(profile.phone_number.as_ref());

    let stats = call_result.stats.clone().unwrap_or_default();
    let positive = zero_or(stats.positive.as_ref());
    let negative = zero_or(stats.negative.as_ref());
    let neutral = zero_or(stats.neutral.as_ref());
    let score = zero_or(stats.sentiment_score.as_ref());

    let script = call_result.script_name.as_deref().unwrap_or(NOT_AVAILABLE);
    let duration = format_duration(call_result.duration.unwrap_or(0));
    let notes = call_result.notes.as_deref().unwrap_or("No notes");

    // Single `*` is bold in Telegram's legacy Markdown parse mode; `**` is not.
    format!(
        "{emoji} *Call Result: {heading}*

*Contact:*
- Name: {first_name} {last_name}
- Company: {company}
- Phone: {phone}

*Call Details:*
- Script: {script}
- Duration: {duration}

*Sentiment Analysis:*
- Positive: {positive} 👍
- Negative: {negative} 👎
- Neutral: {neutral} 😐
- Score: {score}

*Notes:*
{notes}"
    )
}

fn placeholder_or(value: Option<&Value>) -> String {
    value
        .map(display_value)
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

fn zero_or(value: Option<&Number>) -> String {
    value.map_or_else(|| "0".to_string(), Number::to_string)
}

/// Strings render bare, nulls as the placeholder, everything else as JSON text.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => NOT_AVAILABLE.to_string(),
        other => other.to_string(),
    }
}

/// Whether a submitted field counts as present: absent-like values (null, empty, zero, false)
/// do not.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(true, |f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

/// Parse a request body that must be a JSON object. Invalid UTF-8 is malformed input like any
/// other parse failure.
pub fn parse_object(body: &[u8]) -> Result<Map<String, Value>, AppError> {
    Ok(serde_json::from_slice(body)?)
}

pub fn now_iso8601() -> Result<String, AppError> {
    Ok(OffsetDateTime::now_utc().format(&Rfc3339)?)
}
