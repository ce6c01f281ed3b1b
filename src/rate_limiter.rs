use serde::{Deserialize, Serialize};
use sms_core::{AdmissionDecision, Clock, SystemClock};
use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{debug, warn};

/// Configuration for send-rate admission
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Maximum number of sends per window
    pub max_requests: u32,
    /// Window duration in milliseconds
    pub window_ms: u64,
    /// Whether to enable rate limiting
    pub enabled: bool,
    /// Per-key-prefix limits (overrides global settings)
    #[serde(default)]
    pub per_key: HashMap<String, WindowLimit>,
    /// How often the idle-key sweep runs
    pub sweep_interval_seconds: u64,
    /// Keys unseen for longer than this are dropped by the sweep
    pub max_idle_seconds: u64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct WindowLimit {
    pub max_requests: u32,
    pub window_ms: u64,
}

impl WindowLimit {
    fn window(&self) -> Duration {
        Duration::from_millis(self.window_ms)
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 100,
            window_ms: 60_000,
            enabled: true,
            per_key: HashMap::new(),
            sweep_interval_seconds: 300, // 5 minutes
            max_idle_seconds: 3600,      // 1 hour
        }
    }
}

impl RateLimitConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.window_ms == 0 {
            return Err("rate_limit.window_ms must be greater than zero".into());
        }
        if let Some((prefix, _)) = self.per_key.iter().find(|(_, l)| l.window_ms == 0) {
            return Err(format!(
                "rate_limit.per_key.{}.window_ms must be greater than zero",
                prefix
            ));
        }
        Ok(())
    }

    fn global_limit(&self) -> WindowLimit {
        WindowLimit {
            max_requests: self.max_requests,
            window_ms: self.window_ms,
        }
    }
}

/// Sliding-window admission gate keyed by campaign, sender, or any other string.
///
/// The read-filter-append sequence for a key runs under one lock, so
/// concurrent callers can never be admitted past `max_requests`.
#[derive(Debug)]
pub struct RateLimiter<C: Clock = SystemClock> {
    config: RateLimitConfig,
    windows: Mutex<HashMap<String, RateWindow>>,
    clock: C,
}

#[derive(Debug)]
struct RateWindow {
    sends: VecDeque<Instant>,
    last_seen: Instant,
}

impl RateWindow {
    fn new(now: Instant) -> Self {
        Self {
            sends: VecDeque::new(),
            last_seen: now,
        }
    }

    /// Drop sends at or before `now - window`.
    fn prune(&mut self, now: Instant, window: Duration) {
        self.sends
            .retain(|sent| now.saturating_duration_since(*sent) < window);
    }

    fn retry_after(&self, now: Instant, window: Duration) -> Duration {
        self.sends
            .iter()
            .min()
            .map(|oldest| (*oldest + window).saturating_duration_since(now))
            .unwrap_or(Duration::ZERO)
    }
}

impl RateLimiter<SystemClock> {
    pub fn new(config: RateLimitConfig) -> Self {
        Self::with_clock(config, SystemClock::new())
    }

    /// Limiter allowing `max_requests` sends per trailing `window`.
    pub fn with_limits(max_requests: u32, window: Duration) -> Self {
        Self::new(RateLimitConfig {
            max_requests,
            window_ms: window.as_millis() as u64,
            ..RateLimitConfig::default()
        })
    }
}

impl<C: Clock> RateLimiter<C> {
    pub fn with_clock(config: RateLimitConfig, clock: C) -> Self {
        Self {
            config,
            windows: Mutex::new(HashMap::new()),
            clock,
        }
    }

    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    /// Decide whether one more send for `key` fits in the trailing window.
    pub fn is_allowed(&self, key: &str) -> AdmissionDecision {
        let now = self.clock.now();
        let limit = self.limit_for(key);

        if !self.config.enabled {
            return AdmissionDecision {
                allowed: true,
                remaining: limit.max_requests,
                reset_time: now,
                retry_after: Duration::ZERO,
            };
        }

        let window = limit.window();
        // window_start + window, which is `now` by construction
        let reset_time = now;

        let mut windows = self.lock();
        let entry = windows
            .entry(key.to_string())
            .or_insert_with(|| RateWindow::new(now));
        entry.last_seen = now;
        entry.prune(now, window);

        let count = entry.sends.len() as u32;
        if count >= limit.max_requests {
            warn!("Rate limit exceeded for key: {}", key);
            return AdmissionDecision {
                allowed: false,
                remaining: 0,
                reset_time,
                retry_after: entry.retry_after(now, window),
            };
        }

        entry.sends.push_back(now);
        let remaining = limit.max_requests - (count + 1);
        debug!(
            "Rate limit check passed for key: {}, remaining: {}",
            key, remaining
        );
        AdmissionDecision {
            allowed: true,
            remaining,
            reset_time,
            retry_after: Duration::ZERO,
        }
    }

    /// Number of keys currently tracked.
    pub fn key_count(&self) -> usize {
        self.lock().len()
    }

    /// Remove keys not seen for longer than `max_idle`. Returns how many were removed.
    pub fn sweep_idle(&self, max_idle: Duration) -> usize {
        let now = self.clock.now();
        let mut windows = self.lock();
        let before = windows.len();
        windows.retain(|key, window| {
            let keep = now.saturating_duration_since(window.last_seen) <= max_idle;
            if !keep {
                debug!("Cleaning up idle rate limit window for key: {}", key);
            }
            keep
        });
        before - windows.len()
    }

    /// Run [`sweep_idle`](Self::sweep_idle) forever on a fixed interval.
    ///
    /// Spawn this on the runtime next to the limiter's owner.
    pub async fn run_sweeper(&self, interval: Duration, max_idle: Duration) {
        loop {
            sleep(interval).await;
            let removed = self.sweep_idle(max_idle);
            if removed > 0 {
                debug!("Swept {} idle rate limit windows", removed);
            }
        }
    }

    fn limit_for(&self, key: &str) -> WindowLimit {
        // Keys look like "campaign:42"; the prefix selects an override
        key.split(':')
            .next()
            .and_then(|prefix| self.config.per_key.get(prefix))
            .copied()
            .unwrap_or_else(|| self.config.global_limit())
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, RateWindow>> {
        self.windows.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
