//! Rate-limit tracking for the API-Football quota
//!
//! The provider reports the remaining call budget and the reset instant in
//! response headers. Everything here is a pure state transition so the
//! orchestrator and the background poller can evaluate the same gates.

use std::sync::{Arc, RwLock};

/// Call budget assumed before the provider has told us otherwise
pub const DEFAULT_LIMIT: u32 = 10;

/// Calls withheld from automatic polling so a manual refresh stays possible
pub const AUTO_FETCH_BUFFER: u32 = 3;

/// Fallback window length when the reset header is missing or malformed
const DEFAULT_RESET_WINDOW_MS: i64 = 60_000;

/// Remaining calls and reset instant as last reported by the provider
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitState {
    /// Calls left in the current window
    pub remaining: u32,
    /// Epoch milliseconds at which the window resets; `None` until a fetch completes
    pub reset_at_ms: Option<i64>,
}

impl Default for RateLimitState {
    fn default() -> Self {
        Self {
            remaining: DEFAULT_LIMIT,
            reset_at_ms: None,
        }
    }
}

impl RateLimitState {
    /// Builds a state from the raw `x-ratelimit-remaining` and
    /// `x-ratelimit-reset` header values.
    ///
    /// # Arguments
    /// * `remaining` - Remaining calls; defaults to 10 when missing or not an integer
    /// * `reset` - Reset instant in epoch seconds; defaults to `now + 60s`
    /// * `now_ms` - Current time in epoch milliseconds
    pub fn from_headers(remaining: Option<&str>, reset: Option<&str>, now_ms: i64) -> Self {
        let remaining = remaining
            .and_then(|value| value.trim().parse::<i64>().ok())
            .map(|value| value.clamp(0, u32::MAX as i64) as u32)
            .unwrap_or(DEFAULT_LIMIT);

        let reset_at_ms = reset
            .and_then(|value| value.trim().parse::<i64>().ok())
            .and_then(|secs| secs.checked_mul(1000))
            .unwrap_or(now_ms + DEFAULT_RESET_WINDOW_MS);

        Self {
            remaining,
            reset_at_ms: Some(reset_at_ms),
        }
    }

    /// State recorded after the provider rejected a call with 429
    pub fn exhausted(reset_at_ms: Option<i64>, now_ms: i64) -> Self {
        Self {
            remaining: 0,
            reset_at_ms: Some(reset_at_ms.unwrap_or(now_ms + DEFAULT_RESET_WINDOW_MS)),
        }
    }

    /// Whether any call may be made at all
    pub fn can_fetch(&self) -> bool {
        self.remaining > 0
    }

    /// Whether the poller may spend a call without eating into the buffer
    pub fn can_auto_fetch(&self) -> bool {
        self.remaining > AUTO_FETCH_BUFFER
    }

    /// Whole seconds until the window resets, rounded up and never negative
    pub fn seconds_until_reset(&self, now_ms: i64) -> u64 {
        match self.reset_at_ms {
            Some(reset) if reset > now_ms => ((reset - now_ms) as u64).div_ceil(1000),
            _ => 0,
        }
    }

    /// Returns the state as it stands at `now_ms`.
    ///
    /// Once the reset instant has passed an exhausted budget is restored to
    /// the default limit; only a successful fetch refreshes the counters, so
    /// without this a client that hit zero would stay locked out.
    pub fn rolled_over(self, now_ms: i64) -> Self {
        match self.reset_at_ms {
            Some(reset) if reset <= now_ms && self.remaining < DEFAULT_LIMIT => Self {
                remaining: DEFAULT_LIMIT,
                reset_at_ms: self.reset_at_ms,
            },
            _ => self,
        }
    }
}

/// Rate-limit state shared between the UI loop and the background poller.
///
/// The poller reads the cell at every tick instead of capturing a copy, so
/// it always gates on the latest completed fetch.
#[derive(Debug, Clone, Default)]
pub struct SharedRateLimit {
    inner: Arc<RwLock<RateLimitState>>,
}

impl SharedRateLimit {
    pub fn new(state: RateLimitState) -> Self {
        Self {
            inner: Arc::new(RwLock::new(state)),
        }
    }

    /// Copy of the current state
    pub fn snapshot(&self) -> RateLimitState {
        *self.inner.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Replaces the current state
    pub fn set(&self, state: RateLimitState) {
        *self.inner.write().unwrap_or_else(|poisoned| poisoned.into_inner()) = state;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: i64 = 1_700_000_000_000;

    #[test]
    fn test_default_state_has_full_budget_and_no_reset() {
        let state = RateLimitState::default();
        assert_eq!(state.remaining, 10);
        assert!(state.reset_at_ms.is_none());
    }

    #[test]
    fn test_from_headers_parses_both_values() {
        let state = RateLimitState::from_headers(Some("7"), Some("1700000090"), NOW);
        assert_eq!(state.remaining, 7);
        assert_eq!(state.reset_at_ms, Some(1_700_000_090_000));
    }

    #[test]
    fn test_from_headers_defaults_when_missing() {
        let state = RateLimitState::from_headers(None, None, NOW);
        assert_eq!(state.remaining, 10);
        assert_eq!(state.reset_at_ms, Some(NOW + 60_000));
    }

    #[test]
    fn test_from_headers_defaults_when_unparseable() {
        let state = RateLimitState::from_headers(Some("lots"), Some("soon"), NOW);
        assert_eq!(state.remaining, 10);
        assert_eq!(state.reset_at_ms, Some(NOW + 60_000));
    }

    #[test]
    fn test_from_headers_keeps_zero_remaining() {
        let state = RateLimitState::from_headers(Some("0"), Some("1700000030"), NOW);
        assert_eq!(state.remaining, 0);
        assert!(!state.can_fetch());
    }

    #[test]
    fn test_from_headers_clamps_negative_remaining() {
        let state = RateLimitState::from_headers(Some("-4"), None, NOW);
        assert_eq!(state.remaining, 0);
    }

    #[test]
    fn test_can_fetch_only_when_calls_remain() {
        for remaining in 0..=12 {
            let state = RateLimitState {
                remaining,
                reset_at_ms: None,
            };
            assert_eq!(state.can_fetch(), remaining > 0, "remaining = {}", remaining);
        }
    }

    #[test]
    fn test_can_auto_fetch_keeps_three_call_buffer() {
        for remaining in 0..=12 {
            let state = RateLimitState {
                remaining,
                reset_at_ms: None,
            };
            assert_eq!(
                state.can_auto_fetch(),
                remaining > 3,
                "remaining = {}",
                remaining
            );
        }
    }

    #[test]
    fn test_seconds_until_reset_rounds_up() {
        let state = RateLimitState {
            remaining: 1,
            reset_at_ms: Some(NOW + 1_001),
        };
        assert_eq!(state.seconds_until_reset(NOW), 2);

        let exact = RateLimitState {
            remaining: 1,
            reset_at_ms: Some(NOW + 45_000),
        };
        assert_eq!(exact.seconds_until_reset(NOW), 45);
    }

    #[test]
    fn test_seconds_until_reset_never_negative() {
        let past = RateLimitState {
            remaining: 0,
            reset_at_ms: Some(NOW - 5_000),
        };
        assert_eq!(past.seconds_until_reset(NOW), 0);
        assert_eq!(RateLimitState::default().seconds_until_reset(NOW), 0);
    }

    #[test]
    fn test_exhausted_uses_reported_reset_or_default_window() {
        let reported = RateLimitState::exhausted(Some(NOW + 20_000), NOW);
        assert_eq!(reported.remaining, 0);
        assert_eq!(reported.reset_at_ms, Some(NOW + 20_000));

        let fallback = RateLimitState::exhausted(None, NOW);
        assert_eq!(fallback.reset_at_ms, Some(NOW + 60_000));
    }

    #[test]
    fn test_rolled_over_restores_budget_after_reset() {
        let state = RateLimitState::exhausted(Some(NOW - 1), NOW);
        let rolled = state.rolled_over(NOW);
        assert_eq!(rolled.remaining, DEFAULT_LIMIT);
        assert!(rolled.can_fetch());
    }

    #[test]
    fn test_rolled_over_keeps_state_before_reset() {
        let state = RateLimitState::exhausted(Some(NOW + 10_000), NOW);
        assert_eq!(state.rolled_over(NOW), state);
    }

    #[test]
    fn test_shared_rate_limit_is_visible_across_clones() {
        let shared = SharedRateLimit::default();
        let clone = shared.clone();

        clone.set(RateLimitState {
            remaining: 2,
            reset_at_ms: Some(NOW),
        });

        assert_eq!(shared.snapshot().remaining, 2);
    }
}
