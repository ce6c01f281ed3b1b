//! Batch preparation and admission, composed the way a campaign sender uses
//! the individual components.
//!
//! Every failure is recorded against the message that caused it; one bad
//! recipient or body never aborts the rest of the batch.

use crate::backoff::RetryPolicy;
use crate::config::AppConfig;
use crate::duplicates::canonicalize;
use crate::rate_limiter::RateLimiter;
use crate::sanitizer::sanitize;
use crate::segments::estimate_segments;
use sms_core::{
    new_send_id, AdmissionDecision, Clock, DispatchError, DispatchReceipt, PreparedSend,
    SendCandidate, SmsDispatcher, SystemClock, ValidationError,
};
use sms_phone::PhoneValidator;
use std::collections::HashSet;
use std::sync::Arc;
use time::OffsetDateTime;
use tokio::time::sleep;
use tracing::{debug, info, warn};

/// Why a candidate was left out of the plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    InvalidPhone(String),
    Duplicate { canonical: String },
    InvalidMessage(ValidationError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedSend {
    /// Position in the input batch.
    pub index: usize,
    pub to: String,
    pub reason: RejectReason,
}

#[derive(Debug, Clone)]
pub struct BatchPlan {
    pub created_at: OffsetDateTime,
    pub ready: Vec<PreparedSend>,
    pub rejected: Vec<RejectedSend>,
}

impl BatchPlan {
    /// Segments billed if every ready send goes out.
    pub fn total_segments(&self) -> u64 {
        self.ready.iter().map(|s| u64::from(s.segments)).sum()
    }
}

pub struct AdmissionPipeline<C: Clock = SystemClock> {
    limiter: Arc<RateLimiter<C>>,
    phones: PhoneValidator,
    retry: RetryPolicy,
}

impl AdmissionPipeline<SystemClock> {
    /// Wire a pipeline from loaded configuration.
    pub fn from_config(config: &AppConfig) -> Result<Self, ValidationError> {
        let phones = PhoneValidator::from_region_code(&config.phone.default_region)?;
        let limiter = Arc::new(RateLimiter::new(config.rate_limit.clone()));
        Ok(Self::new(limiter, phones, config.retry))
    }
}

impl<C: Clock> AdmissionPipeline<C> {
    pub fn new(limiter: Arc<RateLimiter<C>>, phones: PhoneValidator, retry: RetryPolicy) -> Self {
        Self {
            limiter,
            phones,
            retry,
        }
    }

    pub fn limiter(&self) -> &Arc<RateLimiter<C>> {
        &self.limiter
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /// Validate recipients, drop repeats, clean bodies, and estimate segments.
    pub fn prepare_batch(&self, candidates: &[SendCandidate<'_>]) -> BatchPlan {
        let mut seen = HashSet::with_capacity(candidates.len());
        let mut ready = Vec::with_capacity(candidates.len());
        let mut rejected = Vec::new();

        for (index, candidate) in candidates.iter().enumerate() {
            match self.prepare_one(candidate, &mut seen) {
                Ok(send) => ready.push(send),
                Err(reason) => {
                    warn!("Skipping send #{} to {}: {:?}", index, candidate.to, reason);
                    rejected.push(RejectedSend {
                        index,
                        to: candidate.to.to_string(),
                        reason,
                    });
                }
            }
        }

        info!(
            "Prepared batch (region {:?}): {} ready, {} rejected",
            self.phones.region(),
            ready.len(),
            rejected.len()
        );
        BatchPlan {
            created_at: OffsetDateTime::now_utc(),
            ready,
            rejected,
        }
    }

    fn prepare_one(
        &self,
        candidate: &SendCandidate<'_>,
        seen: &mut HashSet<String>,
    ) -> Result<PreparedSend, RejectReason> {
        let phone = self.phones.validate(candidate.to);
        let formatted = match (phone.is_valid, phone.formatted) {
            (true, Some(formatted)) => formatted,
            _ => {
                return Err(RejectReason::InvalidPhone(
                    phone.error.unwrap_or_else(|| "invalid phone number".to_string()),
                ))
            }
        };

        let text = sanitize(candidate.text).map_err(RejectReason::InvalidMessage)?;
        let segments = estimate_segments(text.as_str());

        // a recipient is claimed only by a send that is otherwise ready
        let canonical = canonicalize(&formatted);
        if !seen.insert(canonical.clone()) {
            return Err(RejectReason::Duplicate { canonical });
        }

        Ok(PreparedSend {
            id: new_send_id(),
            to: formatted,
            text: text.into_string(),
            segments,
        })
    }

    pub fn admit(&self, key: &str) -> AdmissionDecision {
        self.limiter.is_allowed(key)
    }

    /// Admit and dispatch one send, retrying denials and transient failures.
    ///
    /// A denial waits until the window frees a slot; a transient failure
    /// waits the backoff delay. Both consume an attempt.
    pub async fn dispatch_with_retry(
        &self,
        key: &str,
        send: &PreparedSend,
        dispatcher: &dyn SmsDispatcher,
    ) -> Result<DispatchReceipt, DispatchError> {
        let mut attempt = 0u32;
        loop {
            let decision = self.admit(key);
            let error = if decision.allowed {
                match dispatcher.dispatch(send).await {
                    Ok(receipt) => {
                        debug!(
                            "Dispatched {} via {} after {} retries",
                            send.id,
                            dispatcher.provider(),
                            attempt
                        );
                        return Ok(receipt);
                    }
                    Err(e) if !e.is_transient() => return Err(e),
                    Err(e) => e,
                }
            } else {
                DispatchError::RateLimited {
                    key: key.to_string(),
                }
            };

            let Some(backoff) = self.retry.next_delay(attempt) else {
                warn!("Giving up on {} after {} attempts: {}", send.id, attempt + 1, error);
                return Err(match error {
                    DispatchError::RateLimited { .. } => error,
                    other => DispatchError::Exhausted {
                        attempts: attempt + 1,
                        last_error: other.to_string(),
                    },
                });
            };

            let wait = if decision.allowed {
                backoff
            } else {
                decision.retry_after
            };
            debug!("Retrying {} in {:?} ({})", send.id, wait, error);
            sleep(wait).await;
            attempt += 1;
        }
    }
}
