//! Application state management for the live-score dashboard
//!
//! `App` owns the view state and drives fetch cycles: it gates each cycle on
//! the rate limit, applies completed fetches in cycle order, writes the cache
//! on success and falls back to it on failure. Every failure ends up as a
//! banner message; nothing escapes to the rendering layer.

use chrono::{Local, Utc};
use crossterm::event::{KeyCode, KeyEvent};
use tokio::sync::mpsc;
use tracing::{debug, error, info};

use crate::cache::MatchCache;
use crate::data::{FetchError, FixturesClient, LiveFixtures, Match, Severity};
use crate::rate_limit::{RateLimitState, SharedRateLimit};
use crate::refresh::RefreshMessage;

/// What started a fetch cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchTrigger {
    /// Start-up without a fresh cache
    Mount,
    /// Auto-refresh timer
    Auto,
    /// Refresh key
    Manual,
    /// Retry key on a rate-limit banner
    Retry,
    /// Check-again key on the empty state
    CheckAgain,
}

/// Identifies one started fetch cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleTicket {
    pub cycle: u64,
    pub trigger: FetchTrigger,
}

/// How a cycle ended from the view's point of view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Fresh data applied
    Success,
    /// Error shown, cache or empty list applied
    Failed,
    /// The rate-limit guard stopped the cycle before any request
    Blocked,
    /// A newer cycle had already been applied
    Superseded,
    /// The app was torn down before the fetch finished
    Ignored,
}

/// Error banner contents
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorBanner {
    pub message: String,
    pub severity: Severity,
}

impl ErrorBanner {
    /// Rate-limit banners carry a retry action
    pub fn offers_retry(&self) -> bool {
        self.severity == Severity::Warning
    }
}

/// Everything the UI renders, derived from fetch cycles
#[derive(Debug, Clone, Default)]
pub struct ViewState {
    pub matches: Vec<Match>,
    pub loading: bool,
    pub error: Option<ErrorBanner>,
    /// Local wall-clock time of the last successful fetch
    pub last_updated: Option<String>,
    pub is_manual_refresh: bool,
}

/// Main application struct managing state and data
pub struct App {
    /// Rendered state
    pub view: ViewState,
    /// Index of the highlighted match card
    pub selected_index: usize,
    /// Flag indicating the application should quit
    pub should_quit: bool,
    /// Flag to show help overlay
    pub show_help: bool,
    /// Fetch requested by a key press, picked up by the main loop
    pending_fetch: Option<FetchTrigger>,
    rate_limit: SharedRateLimit,
    cache: MatchCache,
    client: FixturesClient,
    next_cycle: u64,
    last_applied_cycle: u64,
    in_flight: usize,
    mounted: bool,
}

fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

impl App {
    /// Creates a new App in the loading state
    pub fn new(client: FixturesClient, cache: MatchCache) -> Self {
        Self {
            view: ViewState {
                loading: true,
                ..ViewState::default()
            },
            selected_index: 0,
            should_quit: false,
            show_help: false,
            pending_fetch: None,
            rate_limit: SharedRateLimit::default(),
            cache,
            client,
            next_cycle: 0,
            last_applied_cycle: 0,
            in_flight: 0,
            mounted: true,
        }
    }

    /// Current rate-limit state
    pub fn rate_limit(&self) -> RateLimitState {
        self.rate_limit.snapshot()
    }

    /// Cell shared with the background poller
    pub fn shared_rate_limit(&self) -> SharedRateLimit {
        self.rate_limit.clone()
    }

    /// Serves a fresh cache if there is one.
    ///
    /// # Returns
    /// * `None` - Cached matches are on screen, no fetch needed yet
    /// * `Some(FetchTrigger::Mount)` - Nothing usable cached; the caller should fetch
    pub fn mount(&mut self, now_ms: i64) -> Option<FetchTrigger> {
        match self.cache.load_if_fresh(now_ms) {
            Some(cached) => {
                info!(count = cached.len(), "Showing cached matches");
                self.view.matches = cached;
                self.view.loading = false;
                None
            }
            None => Some(FetchTrigger::Mount),
        }
    }

    /// Marks the app as torn down; later completions are dropped
    pub fn unmount(&mut self) {
        self.mounted = false;
    }

    /// Starts a fetch cycle unless the rate limit forbids it.
    ///
    /// A blocked cycle shows the rate-limit banner and leaves matches, cache
    /// and rate-limit counters untouched.
    pub fn begin_cycle(&mut self, trigger: FetchTrigger, now_ms: i64) -> Option<CycleTicket> {
        let state = self.rate_limit.snapshot().rolled_over(now_ms);
        self.rate_limit.set(state);

        if !state.can_fetch() {
            let wait = state.seconds_until_reset(now_ms);
            info!(?trigger, wait, "Fetch blocked by rate limit");
            self.view.error = Some(ErrorBanner {
                message: format!("Rate limited! Try again in {}s", wait),
                severity: Severity::Warning,
            });
            self.view.loading = self.in_flight > 0;
            self.view.is_manual_refresh = false;
            return None;
        }

        self.next_cycle += 1;
        self.in_flight += 1;
        self.view.loading = true;
        self.view.error = None;
        if trigger == FetchTrigger::Manual {
            self.view.is_manual_refresh = true;
        }

        debug!(cycle = self.next_cycle, ?trigger, "Fetch cycle started");
        Some(CycleTicket {
            cycle: self.next_cycle,
            trigger,
        })
    }

    /// Applies the result of a started cycle
    pub fn complete_cycle(
        &mut self,
        ticket: CycleTicket,
        result: Result<LiveFixtures, FetchError>,
        now_ms: i64,
    ) -> CycleOutcome {
        self.in_flight = self.in_flight.saturating_sub(1);

        if !self.mounted {
            debug!(cycle = ticket.cycle, "Dropping fetch result after teardown");
            return CycleOutcome::Ignored;
        }

        let outcome = if ticket.cycle <= self.last_applied_cycle {
            debug!(
                cycle = ticket.cycle,
                applied = self.last_applied_cycle,
                "Dropping superseded fetch result"
            );
            CycleOutcome::Superseded
        } else {
            self.last_applied_cycle = ticket.cycle;
            match result {
                Ok(fixtures) => {
                    self.apply_success(ticket, fixtures, now_ms);
                    CycleOutcome::Success
                }
                Err(e) => {
                    self.apply_failure(ticket, e, now_ms);
                    CycleOutcome::Failed
                }
            }
        };

        self.view.loading = self.in_flight > 0;
        self.view.is_manual_refresh = false;
        outcome
    }

    fn apply_success(&mut self, ticket: CycleTicket, fixtures: LiveFixtures, now_ms: i64) {
        info!(
            cycle = ticket.cycle,
            count = fixtures.matches.len(),
            remaining = fixtures.rate_limit.remaining,
            "Live fixtures updated"
        );

        self.rate_limit.set(fixtures.rate_limit);
        self.cache.save(&fixtures.matches, now_ms);
        self.view.matches = fixtures.matches;
        self.view.error = None;
        self.view.last_updated = Some(Local::now().format("%H:%M:%S").to_string());
        self.clamp_selection();
    }

    fn apply_failure(&mut self, ticket: CycleTicket, e: FetchError, now_ms: i64) {
        error!(cycle = ticket.cycle, error = %e, "Failed to fetch live fixtures");

        if let FetchError::RateLimited { reset_at_ms } = &e {
            self.rate_limit
                .set(RateLimitState::exhausted(*reset_at_ms, now_ms));
        } else if let Some(state) = e.rate_limit() {
            self.rate_limit.set(state);
        }

        let state = self.rate_limit.snapshot();
        self.view.error = Some(ErrorBanner {
            message: e.user_message(&state, now_ms),
            severity: e.severity(),
        });

        match self.cache.load_if_fresh(now_ms) {
            Some(cached) => {
                info!(count = cached.len(), "Falling back to cached matches");
                self.view.matches = cached;
            }
            None => self.view.matches.clear(),
        }
        self.clamp_selection();
    }

    /// Runs a whole cycle inline, awaiting the request
    pub async fn run_cycle(&mut self, trigger: FetchTrigger) -> CycleOutcome {
        let Some(ticket) = self.begin_cycle(trigger, now_ms()) else {
            return CycleOutcome::Blocked;
        };
        let result = self.client.fetch_live_matches().await;
        self.complete_cycle(ticket, result, now_ms())
    }

    /// Starts a cycle whose request runs on a background task.
    ///
    /// The result comes back as `RefreshMessage::FetchCompleted` on `tx`; if
    /// the receiver is gone by then the result is dropped.
    pub fn spawn_fetch(&mut self, trigger: FetchTrigger, tx: mpsc::Sender<RefreshMessage>) {
        let Some(ticket) = self.begin_cycle(trigger, now_ms()) else {
            return;
        };

        let client = self.client.clone();
        tokio::spawn(async move {
            let result = client.fetch_live_matches().await;
            let _ = tx
                .send(RefreshMessage::FetchCompleted { ticket, result })
                .await;
        });
    }

    /// Applies a message from the refresh channel
    pub fn handle_refresh_message(
        &mut self,
        message: RefreshMessage,
        tx: &mpsc::Sender<RefreshMessage>,
    ) {
        match message {
            RefreshMessage::AutoRefreshDue => self.spawn_fetch(FetchTrigger::Auto, tx.clone()),
            RefreshMessage::FetchCompleted { ticket, result } => {
                self.complete_cycle(ticket, result, now_ms());
            }
        }
    }

    /// Whether the refresh control is enabled
    pub fn can_refresh(&self, now_ms: i64) -> bool {
        !self.view.loading && self.rate_limit.snapshot().rolled_over(now_ms).can_fetch()
    }

    /// Takes the fetch requested by the last key press, if any
    pub fn take_pending_fetch(&mut self) -> Option<FetchTrigger> {
        self.pending_fetch.take()
    }

    /// Handles keyboard input and updates state accordingly
    ///
    /// # Key Bindings
    /// - `q` or `Esc`: Quit the application
    /// - `Up`/`k`, `Down`/`j`: Move the highlighted card
    /// - `r`: Refresh (ignored while loading or with no calls left)
    /// - `t`: Retry from a rate-limit banner
    /// - `c`: Check again from the empty state
    /// - `?`: Toggle help
    pub fn handle_key(&mut self, key_event: KeyEvent) {
        // Help overlay intercepts all keys when shown
        if self.show_help {
            if matches!(
                key_event.code,
                KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q')
            ) {
                self.show_help = false;
            }
            return;
        }

        let now = now_ms();
        match key_event.code {
            KeyCode::Char('q') | KeyCode::Esc => {
                self.should_quit = true;
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.move_selection_up();
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.move_selection_down();
            }
            KeyCode::Char('r') => {
                if self.can_refresh(now) {
                    self.pending_fetch = Some(FetchTrigger::Manual);
                } else {
                    debug!("Refresh ignored: loading or out of calls");
                }
            }
            KeyCode::Char('t') => {
                let offers_retry = self
                    .view
                    .error
                    .as_ref()
                    .is_some_and(ErrorBanner::offers_retry);
                if offers_retry && self.can_refresh(now) {
                    self.pending_fetch = Some(FetchTrigger::Retry);
                }
            }
            KeyCode::Char('c') => {
                if self.view.matches.is_empty() && !self.view.loading {
                    self.pending_fetch = Some(FetchTrigger::CheckAgain);
                }
            }
            KeyCode::Char('?') => {
                self.show_help = true;
            }
            _ => {}
        }
    }

    /// Moves the selection up in the list, wrapping to bottom if at top
    fn move_selection_up(&mut self) {
        let count = self.view.matches.len();
        if count == 0 {
            return;
        }
        if self.selected_index == 0 {
            self.selected_index = count - 1;
        } else {
            self.selected_index -= 1;
        }
    }

    /// Moves the selection down in the list, wrapping to top if at bottom
    fn move_selection_down(&mut self) {
        let count = self.view.matches.len();
        if count == 0 {
            return;
        }
        self.selected_index = (self.selected_index + 1) % count;
    }

    fn clamp_selection(&mut self) {
        let count = self.view.matches.len();
        if self.selected_index >= count {
            self.selected_index = count.saturating_sub(1);
        }
    }
}
