//! # smsguard
//!
//! Pre-send validation and admission control for outbound SMS campaigns.
//!
//! ## Features
//!
//! - **Sliding-window admission**: per-key send limits with injectable time
//! - **Retry backoff**: capped exponential delays with ±12.5% jitter
//! - **Message hygiene**: control-character stripping, whitespace and punctuation normalization
//! - **Segment estimation**: GSM 7-bit and Unicode segment counts for cost planning
//! - **Duplicate detection**: separator-insensitive recipient matching
//! - **Phone validation**: E.164 formatting via libphonenumber metadata
//! - **Comprehensive configuration**: file and environment based configuration
//! - **Observability**: structured logging through `tracing`
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use smsguard::prelude::*;
//! use std::time::Duration;
//!
//! let limiter = RateLimiter::with_limits(2, Duration::from_secs(1));
//! let text = sanitize("  Flash sale \u{2014} 20% off\u{2026} ")?;
//! let segments = estimate_segments(text.as_str());
//!
//! if limiter.is_allowed("campaign:42").allowed {
//!     // hand off to the provider
//! }
//! ```
//!
//! ## Configuration
//!
//! ```rust,ignore
//! use smsguard::config::AppConfig;
//!
//! let config = AppConfig::load()?;
//! println!("Rate limit: {} sends per {}ms",
//!          config.rate_limit.max_requests,
//!          config.rate_limit.window_ms);
//! ```

pub mod backoff;
pub mod config;
pub mod duplicates;
pub mod media;
pub mod pagination;
pub mod pipeline;
pub mod rate_limiter;
pub mod sanitizer;
pub mod segments;
pub mod telemetry;

pub use config::*;

/// Common imports for smsguard usage
pub mod prelude {
    pub use crate::backoff::{compute_delay, compute_delay_with, BackoffConfig, RetryPolicy};
    pub use crate::config::{AppConfig, LoggingConfig, PhoneConfig};
    pub use crate::duplicates::{canonicalize, find_duplicates, partition, PhonePartition};
    pub use crate::media::{validate_media_url, MediaValidation};
    pub use crate::pagination::Pagination;
    pub use crate::pipeline::{AdmissionPipeline, BatchPlan, RejectReason, RejectedSend};
    pub use crate::rate_limiter::{RateLimitConfig, RateLimiter, WindowLimit};
    pub use crate::sanitizer::{sanitize, sanitize_value, SanitizedMessage, MAX_MESSAGE_CHARS};
    pub use crate::segments::{estimate, estimate_segments, Encoding, SegmentEstimate};
    pub use crate::telemetry::init_logging;
    pub use async_trait::async_trait;
    pub use sms_core::*;
    pub use sms_phone::{PhoneValidation, PhoneValidator};
}
