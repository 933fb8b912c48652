//! Result and error types for Recargar.

use thiserror::Error;

/// Result type for Recargar operations
pub type RecargarResult<T> = Result<T, RecargarError>;

/// Errors that can occur while driving a verification run
#[derive(Debug, Error)]
pub enum RecargarError {
    /// A wait predicate never became true within its window
    #[error("condition '{description}' not met within {timeout_ms}ms (waited {elapsed_ms}ms)")]
    ConditionTimeout {
        /// Description of the condition that was polled
        description: String,
        /// Time actually spent waiting, in milliseconds
        elapsed_ms: u64,
        /// Configured timeout, in milliseconds
        timeout_ms: u64,
    },

    /// An element handle was used after the DOM changed underneath it
    #[error("stale element reference: {description}")]
    StaleElement {
        /// Description of the stale handle
        description: String,
    },

    /// An element lookup found nothing in the current frame context
    #[error("no such element: {locator}")]
    NoSuchElement {
        /// Locator that matched nothing
        locator: String,
    },

    /// A window switch targeted a handle that no longer exists
    #[error("no such window: {handle}")]
    NoSuchWindow {
        /// Handle that could not be found
        handle: String,
    },

    /// A frame switch targeted an element that is not a frame
    #[error("no such frame: {description}")]
    NoSuchFrame {
        /// Description of the failed target
        description: String,
    },

    /// The consent overlay could not be dismissed within the retry budget
    #[error("consent overlay not dismissed after {attempts} attempt(s)")]
    ConsentNotDismissed {
        /// Number of attempts that were made
        attempts: u32,
    },

    /// Neither a new payment window nor a provider iframe appeared
    #[error(
        "payment context not found: {windows} window(s) open, \
         {iframes} iframe(s) scanned, none matched the provider"
    )]
    PaymentContextNotFound {
        /// Number of open window handles at the time of the scan
        windows: usize,
        /// Number of iframes scanned on the current page
        iframes: usize,
    },

    /// An observed value did not match the expected value
    #[error("assertion failed for {subject}: expected {expected:?}, got {actual:?}")]
    AssertionFailed {
        /// What was being checked
        subject: String,
        /// Expected value
        expected: String,
        /// Observed value
        actual: String,
    },

    /// A computed CSS value could not be interpreted
    #[error("invalid computed value for '{property}': {value:?}")]
    InvalidCssValue {
        /// CSS property name
        property: String,
        /// The value that could not be parsed
        value: String,
    },

    /// Engine-level failure surfaced by the browser session
    #[error("session error: {message}")]
    Session {
        /// Error message from the engine
        message: String,
    },

    /// Navigation error
    #[error("navigation to {url} failed: {message}")]
    NavigationError {
        /// URL that failed
        url: String,
        /// Error message
        message: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl RecargarError {
    /// Whether a wait loop should keep polling after this error.
    ///
    /// Only a missing element is transient: the whole point of waiting is
    /// that the element may not have rendered yet. A stale reference is not
    /// recovered anywhere in this workflow and always propagates.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::NoSuchElement { .. })
    }
}
