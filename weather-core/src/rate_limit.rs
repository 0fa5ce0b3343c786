//! Fixed-window request limiting, one window per endpoint category.
//!
//! A window resets only once more than `window` has elapsed since it began,
//! so bursts straddling a reset can admit up to twice the limit in less than
//! one window.

use parking_lot::Mutex;
use std::time::Duration;
use tokio::time::Instant;

use crate::config::RateLimitConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EndpointCategory {
    /// `/weather/current` and `/weather/forecast` share one window.
    Weather,
    Locations,
}

#[derive(Debug)]
struct WindowState {
    count: u32,
    started: Instant,
}

#[derive(Debug)]
pub struct FixedWindow {
    max_requests: u32,
    window: Duration,
    state: Mutex<WindowState>,
}

impl FixedWindow {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self::starting_at(max_requests, window, Instant::now())
    }

    pub fn starting_at(max_requests: u32, window: Duration, started: Instant) -> Self {
        Self {
            max_requests,
            window,
            state: Mutex::new(WindowState { count: 0, started }),
        }
    }

    /// Record a request at `now`. Returns `false` when the window is full;
    /// rejected requests are not counted.
    pub fn try_acquire_at(&self, now: Instant) -> bool {
        let mut state = self.state.lock();

        if now.saturating_duration_since(state.started) > self.window {
            state.count = 0;
            state.started = now;
        }

        if state.count >= self.max_requests {
            return false;
        }

        state.count += 1;
        true
    }

    pub fn try_acquire(&self) -> bool {
        self.try_acquire_at(Instant::now())
    }

    pub fn max_requests(&self) -> u32 {
        self.max_requests
    }

    pub fn window(&self) -> Duration {
        self.window
    }
}

/// Process-wide limiter shared by every handler.
#[derive(Debug)]
pub struct RateLimiter {
    weather: FixedWindow,
    locations: FixedWindow,
}

impl RateLimiter {
    pub fn new(config: &RateLimitConfig) -> Self {
        let window = Duration::from_secs(config.window_secs);
        Self {
            weather: FixedWindow::new(config.max_requests, window),
            locations: FixedWindow::new(config.max_requests, window),
        }
    }

    pub fn check(&self, category: EndpointCategory) -> bool {
        let allowed = self.bucket(category).try_acquire();
        if !allowed {
            tracing::warn!(?category, "rate limit exceeded");
        }
        allowed
    }

    /// Message for callers that have been turned away.
    pub fn rejection_message(&self, category: EndpointCategory) -> String {
        let bucket = self.bucket(category);
        let period = match bucket.window().as_secs() {
            60 => "minute".to_string(),
            secs => format!("{secs} seconds"),
        };
        format!(
            "Rate limit exceeded. Maximum {} requests per {period}.",
            bucket.max_requests()
        )
    }

    fn bucket(&self, category: EndpointCategory) -> &FixedWindow {
        match category {
            EndpointCategory::Weather => &self.weather,
            EndpointCategory::Locations => &self.locations,
        }
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(&RateLimitConfig::default())
    }
}
