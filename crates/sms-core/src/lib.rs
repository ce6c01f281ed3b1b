//! # SMS Core
//!
//! Core traits and types for the smsguard pre-send pipeline.
//!
//! This crate provides the building blocks shared by the admission and
//! normalization components:
//! - [`ValidationError`], the per-message failure taxonomy
//! - [`AdmissionDecision`], the verdict returned by a rate limiter
//! - [`Clock`], the time source every time-dependent component reads from
//! - [`SmsDispatcher`], the seam a delivery provider plugs into
//!
//! ## Example
//!
//! ```rust,ignore
//! use sms_core::{SendCandidate, SmsDispatcher};
//!
//! // Any delivery backend implements SmsDispatcher
//! let receipt = dispatcher.dispatch(&prepared).await?;
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use uuid::Uuid;

/// Errors that stop a single message from being sent.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// Missing or wrongly typed argument
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// Nothing left once the message was cleaned
    #[error("message is empty after sanitization")]
    EmptyAfterSanitization,
    /// Cleaned message exceeds the maximum length
    #[error("message too long: {length} characters (max {max})")]
    TooLong { length: usize, max: usize },
    /// Phone number failed format checks
    #[error("invalid phone format: {0}")]
    InvalidPhoneFormat(String),
    /// Phone number contains an emergency-service sequence
    #[error("emergency number rejected: {0}")]
    EmergencyNumberRejected(String),
    /// The phone-number library reported a failure
    #[error("phone library error: {0}")]
    DelegateLibrary(String),
}

/// Outcome of handing a prepared message to a delivery backend.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DispatchError {
    /// Temporary failure; the send may be retried after a delay
    #[error("transient dispatch failure: {0}")]
    Transient(String),
    /// The backend refused the message for good
    #[error("permanent dispatch failure: {0}")]
    Permanent(String),
    /// Admission was denied and no attempts remain
    #[error("rate limited for key {key}")]
    RateLimited { key: String },
    /// Every retry attempt failed
    #[error("gave up after {attempts} attempts: {last_error}")]
    Exhausted { attempts: u32, last_error: String },
}

impl DispatchError {
    /// Whether a retry could change the outcome.
    pub fn is_transient(&self) -> bool {
        matches!(self, DispatchError::Transient(_))
    }
}

/// A raw (phone, message) pair produced by the campaign layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendCandidate<'a> {
    pub to: &'a str,
    pub text: &'a str,
}

/// A send that passed validation and is ready for admission.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PreparedSend {
    pub id: String,
    /// Recipient in E.164 form.
    pub to: String,
    /// Sanitized message body.
    pub text: String,
    /// Estimated SMS segments billed for this message.
    pub segments: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchReceipt {
    pub id: String,
    /// Name of the backend that accepted the message, e.g. "plivo".
    pub provider: String,
    /// Raw backend payload for debugging / audit.
    pub raw: serde_json::Value,
}

/// Result of one admission check. Constructed fresh per call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdmissionDecision {
    pub allowed: bool,
    /// Sends left in the current window after this one.
    pub remaining: u32,
    /// `window_start + window` at the moment of the call. Do not cache across time.
    pub reset_time: Instant,
    /// Zero when allowed; otherwise time until the oldest send leaves the window.
    pub retry_after: Duration,
}

/// Delivery backend seam. Implementations own all network I/O.
#[async_trait]
pub trait SmsDispatcher: Send + Sync {
    /// Stable backend key, e.g., "plivo", "twilio", etc.
    fn provider(&self) -> &'static str;
    /// Hand one prepared message to the backend.
    async fn dispatch(&self, send: &PreparedSend) -> Result<DispatchReceipt, DispatchError>;
}

/// Source of "now" for time-dependent components.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// System clock implementation using `Instant::now()`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl SystemClock {
    pub fn new() -> Self {
        Self
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Controllable clock for deterministic window tests.
///
/// Clones share the same time value, so advancing one clone advances all.
#[cfg(any(test, feature = "test-helpers"))]
#[derive(Debug, Clone)]
pub struct MockClock {
    current: std::sync::Arc<std::sync::Mutex<Instant>>,
}

#[cfg(any(test, feature = "test-helpers"))]
impl MockClock {
    pub fn new(start: Instant) -> Self {
        Self {
            current: std::sync::Arc::new(std::sync::Mutex::new(start)),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut time = self.current.lock().expect("MockClock mutex poisoned");
        *time += by;
    }

    pub fn set(&self, instant: Instant) {
        *self.current.lock().expect("MockClock mutex poisoned") = instant;
    }
}

#[cfg(any(test, feature = "test-helpers"))]
impl Default for MockClock {
    fn default() -> Self {
        Self::new(Instant::now())
    }
}

#[cfg(any(test, feature = "test-helpers"))]
impl Clock for MockClock {
    fn now(&self) -> Instant {
        *self.current.lock().expect("MockClock mutex poisoned")
    }
}

/// Fresh identifier for a prepared send.
pub fn new_send_id() -> String {
    Uuid::new_v4().to_string()
}

/// Characters callers commonly use to group phone digits.
pub fn is_phone_separator(c: char) -> bool {
    c.is_whitespace() || matches!(c, '-' | '(' | ')' | '.')
}

/// Remove whitespace, hyphens, parentheses, and periods from a phone string.
pub fn strip_separators(raw: &str) -> String {
    raw.chars().filter(|c| !is_phone_separator(*c)).collect()
}
