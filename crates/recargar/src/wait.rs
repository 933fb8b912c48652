//! Condition waiter: bounded polling against the browser session.
//!
//! Every synchronization point in the workflow goes through [`Waiter`]: it
//! polls a [`Condition`] at a fixed interval until the condition yields a
//! value or the window expires. On expiry it fails with
//! [`RecargarError::ConditionTimeout`] carrying the condition description
//! and the elapsed time. Retry policy beyond the single window belongs to
//! callers (see [`crate::consent`]).

use crate::clock::{Clock, SystemClock};
use crate::result::{RecargarError, RecargarResult};
use crate::session::{BrowserSession, ElementRef, Locator};
use std::time::Duration;

/// Default timeout for wait operations (40 seconds)
pub const DEFAULT_WAIT_TIMEOUT_MS: u64 = 40_000;

/// Default polling interval (200ms)
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 200;

/// Minimum safe polling interval; the waiter never polls faster than this
pub const MIN_POLL_INTERVAL_MS: u64 = 50;

// =============================================================================
// URL PATTERN
// =============================================================================

/// Pattern matched against the current page URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UrlPattern {
    /// Exact URL match
    Exact(String),
    /// Prefix match
    Prefix(String),
    /// Contains substring
    Contains(String),
    /// Regex match
    Regex(String),
}

impl UrlPattern {
    /// Check if a URL matches this pattern
    #[must_use]
    pub fn matches(&self, url: &str) -> bool {
        match self {
            Self::Exact(pattern) => url == pattern,
            Self::Prefix(pattern) => url.starts_with(pattern),
            Self::Contains(pattern) => url.contains(pattern),
            Self::Regex(pattern) => regex::Regex::new(pattern)
                .map(|re| re.is_match(url))
                .unwrap_or(false),
        }
    }
}

impl std::fmt::Display for UrlPattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Exact(p) => write!(f, "exactly '{p}'"),
            Self::Prefix(p) => write!(f, "starting with '{p}'"),
            Self::Contains(p) => write!(f, "containing '{p}'"),
            Self::Regex(p) => write!(f, "matching /{p}/"),
        }
    }
}

// =============================================================================
// WAIT OPTIONS
// =============================================================================

/// Options for wait operations.
///
/// Timeout and poll interval are configuration, not constants, so the waiter
/// stays testable against a fake clock and tunable per deployment.
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

    /// Get timeout as Duration
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Poll interval as Duration, clamped to the safe floor
    #[must_use]
    pub fn effective_poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(MIN_POLL_INTERVAL_MS))
    }
}

// =============================================================================
// CONDITIONS
// =============================================================================

/// A predicate over the browser session, polled by the waiter.
///
/// `check` returns `Ok(Some(value))` when satisfied, `Ok(None)` to keep
/// polling. Transient lookup errors (element not yet rendered) also keep
/// polling; any other error aborts the wait immediately.
pub trait Condition<S: BrowserSession + ?Sized> {
    /// Value produced when the condition is satisfied
    type Output;

    /// Evaluate the condition once
    fn check(&self, session: &mut S) -> RecargarResult<Option<Self::Output>>;

    /// Description for timeout error messages
    fn description(&self) -> String;
}

/// Conditions used by the verification steps
pub mod conditions {
    use super::{BrowserSession, Condition, ElementRef, Locator, RecargarResult, UrlPattern};

    /// The current URL matches a pattern
    #[derive(Debug, Clone)]
    pub struct UrlMatches {
        pattern: UrlPattern,
    }

    /// Wait until the current URL matches `pattern`
    #[must_use]
    pub fn url_matches(pattern: UrlPattern) -> UrlMatches {
        UrlMatches { pattern }
    }

    impl<S: BrowserSession + ?Sized> Condition<S> for UrlMatches {
        type Output = ();

        fn check(&self, session: &mut S) -> RecargarResult<Option<()>> {
            let url = session.current_url()?;
            Ok(self.pattern.matches(&url).then_some(()))
        }

        fn description(&self) -> String {
            format!("url {}", self.pattern)
        }
    }

    /// An element matching the locator exists in the current frame context
    #[derive(Debug, Clone)]
    pub struct ElementPresent {
        locator: Locator,
    }

    /// Wait until an element matching `locator` is present
    #[must_use]
    pub fn element_present(locator: Locator) -> ElementPresent {
        ElementPresent { locator }
    }

    impl<S: BrowserSession + ?Sized> Condition<S> for ElementPresent {
        type Output = ElementRef;

        fn check(&self, session: &mut S) -> RecargarResult<Option<ElementRef>> {
            Ok(Some(session.find_element(&self.locator)?))
        }

        fn description(&self) -> String {
            format!("element present: {}", self.locator)
        }
    }

    /// An element matching the locator is rendered visibly
    #[derive(Debug, Clone)]
    pub struct ElementVisible {
        locator: Locator,
    }

    /// Wait until an element matching `locator` is visible
    #[must_use]
    pub fn element_visible(locator: Locator) -> ElementVisible {
        ElementVisible { locator }
    }

    impl<S: BrowserSession + ?Sized> Condition<S> for ElementVisible {
        type Output = ElementRef;

        fn check(&self, session: &mut S) -> RecargarResult<Option<ElementRef>> {
            let element = session.find_element(&self.locator)?;
            Ok(session.is_displayed(&element)?.then_some(element))
        }

        fn description(&self) -> String {
            format!("element visible: {}", self.locator)
        }
    }

    /// An element matching the locator is visible and accepts interaction
    #[derive(Debug, Clone)]
    pub struct ElementClickable {
        locator: Locator,
    }

    /// Wait until an element matching `locator` is clickable
    #[must_use]
    pub fn element_clickable(locator: Locator) -> ElementClickable {
        ElementClickable { locator }
    }

    impl<S: BrowserSession + ?Sized> Condition<S> for ElementClickable {
        type Output = ElementRef;

        fn check(&self, session: &mut S) -> RecargarResult<Option<ElementRef>> {
            let element = session.find_element(&self.locator)?;
            let ready = session.is_displayed(&element)? && session.is_enabled(&element)?;
            Ok(ready.then_some(element))
        }

        fn description(&self) -> String {
            format!("element clickable: {}", self.locator)
        }
    }
}

// =============================================================================
// WAITER
// =============================================================================

/// Polls conditions against the browser session until satisfied or expired
#[derive(Debug)]
pub struct Waiter<C: Clock = SystemClock> {
    options: WaitOptions,
    clock: C,
}

impl Waiter<SystemClock> {
    /// Create a waiter with default options over the system clock
    #[must_use]
    pub fn new() -> Self {
        Self::with_options(WaitOptions::default())
    }

    /// Create a waiter with custom options over the system clock
    #[must_use]
    pub fn with_options(options: WaitOptions) -> Self {
        Self {
            options,
            clock: SystemClock::new(),
        }
    }
}

impl Default for Waiter<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> Waiter<C> {
    /// Create a waiter over an explicit clock (fake clock in tests)
    #[must_use]
    pub fn with_clock(options: WaitOptions, clock: C) -> Self {
        Self { options, clock }
    }

    /// The configured options
    #[must_use]
    pub fn options(&self) -> &WaitOptions {
        &self.options
    }

    /// Poll `condition` until it yields a value or the window expires.
    ///
    /// The condition is always evaluated at least once. Transient errors
    /// (see [`RecargarError::is_transient`]) are swallowed and polling
    /// continues; all other errors abort the wait.
    pub fn wait_for<S, Cond>(&self, session: &mut S, condition: &Cond) -> RecargarResult<Cond::Output>
    where
        S: BrowserSession + ?Sized,
        Cond: Condition<S>,
    {
        self.wait_for_with(session, condition, &self.options)
    }

    /// Like [`Self::wait_for`] but with per-call options
    pub fn wait_for_with<S, Cond>(
        &self,
        session: &mut S,
        condition: &Cond,
        options: &WaitOptions,
    ) -> RecargarResult<Cond::Output>
    where
        S: BrowserSession + ?Sized,
        Cond: Condition<S>,
    {
        let start = self.clock.now_ms();
        let poll = options.effective_poll_interval();

        loop {
            match condition.check(session) {
                Ok(Some(value)) => return Ok(value),
                Ok(None) => {}
                Err(e) if e.is_transient() => {
                    tracing::trace!(condition = %condition.description(), error = %e, "still waiting");
                }
                Err(e) => return Err(e),
            }

            let elapsed_ms = self.clock.now_ms().saturating_sub(start);
            if elapsed_ms >= options.timeout_ms {
                return Err(RecargarError::ConditionTimeout {
                    description: condition.description(),
                    elapsed_ms,
                    timeout_ms: options.timeout_ms,
                });
            }
            self.clock.sleep(poll);
        }
    }
}
