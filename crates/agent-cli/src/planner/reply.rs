//! Parsing model replies

use serde_json::Value;

use crate::action::{ActionKind, ActionSpec};
use crate::error::ParseFailure;

/// Strip surrounding whitespace and a Markdown code fence, if present
pub(crate) fn strip_fence(reply: &str) -> &str {
    let trimmed = reply.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };

    // drop the info string (```json)
    let body = match rest.find('\n') {
        Some(idx) => &rest[idx + 1..],
        None => rest,
    };
    body.trim_end().trim_end_matches("```").trim()
}

/// Parse a reply as a JSON object
pub(crate) fn parse_object(reply: &str) -> Result<Value, ParseFailure> {
    let body = strip_fence(reply);
    if body.is_empty() {
        return Err(ParseFailure::EmptyReply);
    }

    let value: Value =
        serde_json::from_str(body).map_err(|e| ParseFailure::InvalidJson(e.to_string()))?;
    if !value.is_object() {
        return Err(ParseFailure::NotAnObject);
    }
    Ok(value)
}

/// Read a reply as a single action of a known kind
pub fn parse_action_reply(reply: &str) -> Result<ActionSpec, ParseFailure> {
    let value = parse_object(reply)?;
    let spec = ActionSpec::from_json(&value).ok_or(ParseFailure::NotAnObject)?;

    match spec.kind.as_deref() {
        None => Err(ParseFailure::MissingKind),
        Some(name) if ActionKind::from_name(name).is_none() => {
            Err(ParseFailure::UnknownKind(name.to_string()))
        }
        Some(_) => Ok(spec),
    }
}
