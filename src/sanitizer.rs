//! Message text normalization.
//!
//! Cleaning runs in a fixed order: trim, strip ASCII control characters
//! (line breaks survive this step), collapse whitespace runs to one space,
//! then fold typographic punctuation to ASCII. The output is a fixed point:
//! sanitizing it again returns it unchanged.

use serde::Serialize;
use sms_core::ValidationError;
use std::fmt;

/// Longest message accepted after cleaning, in characters.
pub const MAX_MESSAGE_CHARS: usize = 1600;

/// Message text that passed [`sanitize`]. Non-empty and at most
/// [`MAX_MESSAGE_CHARS`] characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct SanitizedMessage(String);

impl SanitizedMessage {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    pub fn char_count(&self) -> usize {
        self.0.chars().count()
    }
}

impl AsRef<str> for SanitizedMessage {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SanitizedMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Clean raw message text and check its bounds.
pub fn sanitize(message: &str) -> Result<SanitizedMessage, ValidationError> {
    let stripped: String = message.trim().chars().filter(|c| !is_stripped_control(*c)).collect();

    let mut cleaned = collapse_whitespace(&stripped);
    if cleaned.chars().any(|c| !is_plain(c)) {
        cleaned = normalize_typography(&cleaned);
    }
    let cleaned = cleaned.trim();

    if cleaned.is_empty() {
        return Err(ValidationError::EmptyAfterSanitization);
    }
    let length = cleaned.chars().count();
    if length > MAX_MESSAGE_CHARS {
        return Err(ValidationError::TooLong {
            length,
            max: MAX_MESSAGE_CHARS,
        });
    }

    Ok(SanitizedMessage(cleaned.to_string()))
}

/// Sanitize a message taken from an untyped payload.
///
/// `null` and non-string values fail with `InvalidInput`.
pub fn sanitize_value(value: &serde_json::Value) -> Result<SanitizedMessage, ValidationError> {
    match value {
        serde_json::Value::String(text) => sanitize(text),
        serde_json::Value::Null => Err(ValidationError::InvalidInput(
            "message is missing".to_string(),
        )),
        other => Err(ValidationError::InvalidInput(format!(
            "message must be a string, got {}",
            json_kind(other)
        ))),
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

fn is_stripped_control(c: char) -> bool {
    c.is_ascii_control() && c != '\n' && c != '\r'
}

/// Printable ASCII or a line break.
fn is_plain(c: char) -> bool {
    matches!(c, ' '..='~' | '\n' | '\r')
}

fn collapse_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_run = false;
    for c in text.chars() {
        if c.is_whitespace() {
            if !in_run {
                out.push(' ');
            }
            in_run = true;
        } else {
            out.push(c);
            in_run = false;
        }
    }
    out
}

fn normalize_typography(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\u{201C}' | '\u{201D}' | '\u{201E}' | '\u{201F}' => out.push('"'),
            '\u{2018}' | '\u{2019}' | '\u{201A}' | '\u{201B}' => out.push('\''),
            '\u{2012}' | '\u{2013}' | '\u{2014}' | '\u{2015}' => out.push('-'),
            '\u{2026}' => out.push_str("..."),
            _ => out.push(c),
        }
    }
    out
}
