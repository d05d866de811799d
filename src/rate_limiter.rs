//! Request gate with adaptive backoff.
//!
//! Every HTTP client in the crate owns one of these.  The limiter never drops a
//! request: [`RateLimiter::wait_if_needed`] sleeps until the minimum interval
//! since the previous request has passed.  Time is read through a [`Clock`] so
//! tests can drive it without sleeping.

use std::time::{Duration, Instant};

use log::{debug, info};

/// Source of time for the limiter.
pub trait Clock: Send {
    fn now(&self) -> Instant;
    fn sleep(&self, duration: Duration);
}

/// Wall clock backed by `std::thread::sleep`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// A rate limiter that enforces a minimum interval between requests
/// with optional adaptive backoff on failures.
pub struct RateLimiter {
    name: String,
    clock: Box<dyn Clock>,
    last_request: Option<Instant>,
    current_interval: Duration,
    base_interval: Duration,
    max_interval: Duration,
    success_count: u32,
    successes_to_reduce: u32,
}

impl RateLimiter {
    /// Create a new rate limiter.
    ///
    /// * `name`: label for log messages (e.g. "MusicBrainz", "ListenBrainz")
    /// * `base_interval`: minimum time between requests; backoff never goes below it
    /// * `max_interval`: upper bound after repeated failures
    /// * `successes_to_reduce`: consecutive successes before halving the interval
    ///   (0 disables reduction)
    pub fn new(
        name: &str,
        base_interval: Duration,
        max_interval: Duration,
        successes_to_reduce: u32,
        clock: Box<dyn Clock>,
    ) -> Self {
        RateLimiter {
            name: name.to_string(),
            clock,
            last_request: None,
            current_interval: base_interval,
            base_interval,
            max_interval: max_interval.max(base_interval),
            success_count: 0,
            successes_to_reduce,
        }
    }

    /// Wall-clock limiter from a base interval in milliseconds.
    /// Max interval = 16× base, reduce after 10 successes.
    pub fn from_millis(name: &str, millis: u64) -> Self {
        Self::with_clock(name, millis, Box::new(SystemClock))
    }

    /// Same defaults as [`RateLimiter::from_millis`] with an injected clock.
    pub fn with_clock(name: &str, millis: u64, clock: Box<dyn Clock>) -> Self {
        let base = Duration::from_millis(millis);
        Self::new(name, base, base * 16, 10, clock)
    }

    pub fn current_interval(&self) -> Duration {
        self.current_interval
    }

    /// Sleep if not enough time has elapsed since the last request.
    /// Must be called *before* making a request.
    pub fn wait_if_needed(&mut self) {
        if let Some(last) = self.last_request {
            let elapsed = self.clock.now().saturating_duration_since(last);
            if elapsed < self.current_interval {
                let wait_time = self.current_interval - elapsed;
                debug!(
                    "[{}] rate limiting: waiting {:.1}s",
                    self.name,
                    wait_time.as_secs_f64()
                );
                self.clock.sleep(wait_time);
            }
        }
        self.last_request = Some(self.clock.now());
    }

    /// Report a successful request.  After enough consecutive successes
    /// the interval is halved (down to the base).
    pub fn report_success(&mut self) {
        if self.successes_to_reduce == 0 {
            return;
        }

        self.success_count += 1;

        if self.success_count >= self.successes_to_reduce
            && self.current_interval > self.base_interval
        {
            self.current_interval = (self.current_interval / 2).max(self.base_interval);
            info!(
                "[{}] rate limit reduced to {:.1}s after {} successes",
                self.name,
                self.current_interval.as_secs_f64(),
                self.success_count
            );
            self.success_count = 0;
        }
    }

    /// Report a failed request.  Doubles the interval (up to max).
    pub fn report_failure(&mut self) {
        self.current_interval = (self.current_interval * 2).min(self.max_interval);
        info!(
            "[{}] rate limit increased to {:.1}s due to error",
            self.name,
            self.current_interval.as_secs_f64()
        );
        self.success_count = 0;
    }
}
