//! Wait mechanisms shared by the drivers.
//!
//! Every wait here is bounded: nothing blocks longer than its timeout.

use crate::result::StoreResult;
use std::future::Future;
use std::time::{Duration, Instant};

// =============================================================================
// CONSTANTS
// =============================================================================

/// Default timeout for explicit waits (10 seconds)
pub const DEFAULT_WAIT_TIMEOUT_MS: u64 = 10_000;

/// Timeout for the order confirmation to render (15 seconds)
pub const ORDER_CONFIRMATION_TIMEOUT_MS: u64 = 15_000;

/// Timeout for navigation including network idle (30 seconds)
pub const NAVIGATION_TIMEOUT_MS: u64 = 30_000;

/// Default polling interval (50ms)
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 50;

/// Network idle threshold (500ms without new requests)
pub const NETWORK_IDLE_THRESHOLD_MS: u64 = 500;

/// How long after a click to watch for the navigation it may start
pub const CLICK_NAVIGATION_WINDOW_MS: u64 = 500;

/// Timeouts the page objects apply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    /// Explicit waits (`wait_for`)
    pub default_ms: u64,
    /// Navigation including network idle
    pub navigation_ms: u64,
    /// Order confirmation after payment
    pub order_confirmation_ms: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            default_ms: DEFAULT_WAIT_TIMEOUT_MS,
            navigation_ms: NAVIGATION_TIMEOUT_MS,
            order_confirmation_ms: ORDER_CONFIRMATION_TIMEOUT_MS,
        }
    }
}

// =============================================================================
// LOAD STATE
// =============================================================================

/// Page load states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LoadState {
    /// Wait for the `load` event to fire
    #[default]
    Load,
    /// Wait for `DOMContentLoaded` event
    DomContentLoaded,
    /// Wait for network to be idle (no requests for 500ms)
    NetworkIdle,
}

impl LoadState {
    /// Get the name used in logs
    #[must_use]
    pub const fn event_name(&self) -> &'static str {
        match self {
            Self::Load => "load",
            Self::DomContentLoaded => "DOMContentLoaded",
            Self::NetworkIdle => "networkidle",
        }
    }

    /// JavaScript probe returning `[ready, resourceCount]`
    ///
    /// For [`LoadState::NetworkIdle`] the caller still has to see the
    /// resource count hold steady for [`NETWORK_IDLE_THRESHOLD_MS`].
    #[must_use]
    pub const fn ready_probe_js(&self) -> &'static str {
        match self {
            Self::Load | Self::NetworkIdle => {
                "[document.readyState === 'complete', performance.getEntriesByType('resource').length]"
            }
            Self::DomContentLoaded => {
                "[document.readyState !== 'loading', performance.getEntriesByType('resource').length]"
            }
        }
    }
}

impl std::fmt::Display for LoadState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.event_name())
    }
}

// =============================================================================
// WAIT OPTIONS
// =============================================================================

/// Options for wait operations
#[derive(Debug, Clone)]
pub struct WaitOptions {
    /// Timeout in milliseconds
    pub timeout_ms: u64,
    /// Polling interval in milliseconds
    pub poll_interval_ms: u64,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_WAIT_TIMEOUT_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

impl WaitOptions {
    /// Create new wait options with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set timeout in milliseconds
    #[must_use]
    pub const fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Set polling interval in milliseconds
    #[must_use]
    pub const fn with_poll_interval(mut self, poll_interval_ms: u64) -> Self {
        self.poll_interval_ms = poll_interval_ms;
        self
    }

    /// Timeout as a Duration
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Polling interval as a Duration
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Result of a wait operation
#[derive(Debug, Clone)]
pub struct WaitResult {
    /// Whether the condition was met before the timeout
    pub success: bool,
    /// Time spent waiting
    pub elapsed: Duration,
}

impl WaitResult {
    /// Create a successful wait result
    #[must_use]
    pub const fn success(elapsed: Duration) -> Self {
        Self {
            success: true,
            elapsed,
        }
    }

    /// Create a timeout wait result
    #[must_use]
    pub const fn timeout(elapsed: Duration) -> Self {
        Self {
            success: false,
            elapsed,
        }
    }
}

// =============================================================================
// POLLING
// =============================================================================

/// Poll `probe` until it reports true or the timeout expires
///
/// The probe always runs at least once. Probe errors abort the wait.
pub async fn poll_until<F, Fut>(options: &WaitOptions, mut probe: F) -> StoreResult<WaitResult>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = StoreResult<bool>>,
{
    let start = Instant::now();
    loop {
        if probe().await? {
            return Ok(WaitResult::success(start.elapsed()));
        }
        if start.elapsed() >= options.timeout() {
            return Ok(WaitResult::timeout(start.elapsed()));
        }
        tokio::time::sleep(options.poll_interval()).await;
    }
}

/// Tracks resource-entry counts until they hold steady long enough
#[derive(Debug, Clone)]
pub struct NetworkIdleTracker {
    threshold: Duration,
    last_count: Option<usize>,
    stable_since: Option<Instant>,
}

impl Default for NetworkIdleTracker {
    fn default() -> Self {
        Self::new(Duration::from_millis(NETWORK_IDLE_THRESHOLD_MS))
    }
}

impl NetworkIdleTracker {
    /// Create a tracker with a custom quiet period
    #[must_use]
    pub const fn new(threshold: Duration) -> Self {
        Self {
            threshold,
            last_count: None,
            stable_since: None,
        }
    }

    /// Feed one observation; true once the page counts as idle
    pub fn observe(&mut self, ready: bool, resource_count: usize, now: Instant) -> bool {
        if !ready {
            self.last_count = None;
            self.stable_since = None;
            return false;
        }
        if self.last_count != Some(resource_count) {
            self.last_count = Some(resource_count);
            self.stable_since = Some(now);
            return self.threshold.is_zero();
        }
        self.stable_since
            .is_some_and(|since| now.duration_since(since) >= self.threshold)
    }
}

/// Which document the page is showing, sampled before and after an action
///
/// A changed URL, a new `performance.timeOrigin` (same URL reloaded) or a
/// document that is no longer `complete` all mean a navigation is under way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentMark {
    pub href: String,
    pub time_origin_us: u64,
    pub ready_state: String,
}

impl DocumentMark {
    /// Script returning `[href, timeOrigin in microseconds, readyState]`
    pub const SAMPLE_JS: &'static str =
        "[location.href, Math.round(performance.timeOrigin * 1000), document.readyState]";

    /// Whether this later sample shows a navigation away from `before`
    #[must_use]
    pub fn navigated_from(&self, before: &Self) -> bool {
        self.href != before.href
            || self.time_origin_us != before.time_origin_us
            || self.ready_state != "complete"
    }
}

impl From<(String, u64, String)> for DocumentMark {
    fn from((href, time_origin_us, ready_state): (String, u64, String)) -> Self {
        Self {
            href,
            time_origin_us,
            ready_state,
        }
    }
}
