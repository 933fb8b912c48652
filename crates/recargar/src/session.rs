//! Browser session abstraction.
//!
//! The workflow never talks to a browser engine directly: every step drives
//! a [`BrowserSession`], the seam behind which the real automation engine
//! (WebDriver, CDP, ...) lives. The in-repo [`crate::mock::MockSession`]
//! implements the same trait over a scripted page model, which is what the
//! test suite runs against.

use crate::result::{RecargarError, RecargarResult};
use serde_json::Value;
use std::fmt;

/// Locator strategy identifying zero or more elements within the current
/// frame context.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Locator {
    /// Element id attribute
    Id(String),
    /// Exact visible link text
    LinkText(String),
    /// CSS selector
    Css(String),
    /// XPath expression
    XPath(String),
}

impl Locator {
    /// Locate by element id
    #[must_use]
    pub fn id(id: impl Into<String>) -> Self {
        Self::Id(id.into())
    }

    /// Locate by exact visible link text
    #[must_use]
    pub fn link_text(text: impl Into<String>) -> Self {
        Self::LinkText(text.into())
    }

    /// Locate by CSS selector
    #[must_use]
    pub fn css(selector: impl Into<String>) -> Self {
        Self::Css(selector.into())
    }

    /// Locate by XPath expression
    #[must_use]
    pub fn xpath(expression: impl Into<String>) -> Self {
        Self::XPath(expression.into())
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(s) => write!(f, "id={s}"),
            Self::LinkText(s) => write!(f, "link-text={s}"),
            Self::Css(s) => write!(f, "css={s}"),
            Self::XPath(s) => write!(f, "xpath={s}"),
        }
    }
}

/// Opaque handle to one browser window or tab
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WindowHandle(pub String);

impl WindowHandle {
    /// Create a handle from its engine-assigned id
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The engine-assigned id
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WindowHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The currently selected browsing context.
///
/// Exactly one is active per session; every element lookup is scoped by it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum FrameContext {
    /// The top-level document of the current window
    #[default]
    Top,
    /// A same-page iframe, identified by the engine id of its host element
    Frame(u64),
}

/// Transient handle to a located DOM node.
///
/// Validity is bounded to the page and frame context the element was located
/// in; after a navigation or frame switch any operation on the handle fails
/// with [`RecargarError::StaleElement`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementRef {
    id: u64,
    locator: String,
}

impl ElementRef {
    /// Create an element reference. Only session implementations mint these.
    #[must_use]
    pub fn new(id: u64, locator: impl Into<String>) -> Self {
        Self {
            id,
            locator: locator.into(),
        }
    }

    /// Engine-assigned element id
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// The locator string this element was found by, for diagnostics
    #[must_use]
    pub fn locator(&self) -> &str {
        &self.locator
    }
}

impl fmt::Display for ElementRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "element #{} ({})", self.id, self.locator)
    }
}

/// Argument passed to [`BrowserSession::execute_script`].
///
/// Mirrors the WebDriver convention: element handles become `arguments[n]`
/// inside the script, everything else is passed as JSON.
#[derive(Debug, Clone)]
pub enum ScriptArg {
    /// A located element
    Element(ElementRef),
    /// An arbitrary JSON value
    Json(Value),
}

/// A controllable browser instance.
///
/// This is the external collaborator: navigation, element lookup, script
/// execution and context switching all happen behind it. All methods take
/// `&mut self` because the workflow is strictly sequential and the session
/// is never shared (one handle per run).
pub trait BrowserSession {
    /// Navigate the current window to `url`
    fn navigate(&mut self, url: &str) -> RecargarResult<()>;

    /// Reload the current page
    fn refresh(&mut self) -> RecargarResult<()>;

    /// URL of the current window
    fn current_url(&mut self) -> RecargarResult<String>;

    /// Find the first element matching `locator` in the current frame context
    fn find_element(&mut self, locator: &Locator) -> RecargarResult<ElementRef>;

    /// Find all elements matching `locator` in the current frame context
    fn find_elements(&mut self, locator: &Locator) -> RecargarResult<Vec<ElementRef>>;

    /// Click an element
    fn click(&mut self, element: &ElementRef) -> RecargarResult<()>;

    /// Type text into an element
    fn send_keys(&mut self, element: &ElementRef, text: &str) -> RecargarResult<()>;

    /// Visible text of an element
    fn text(&mut self, element: &ElementRef) -> RecargarResult<String>;

    /// Whether the element is rendered visibly
    fn is_displayed(&mut self, element: &ElementRef) -> RecargarResult<bool>;

    /// Whether the element accepts interaction
    fn is_enabled(&mut self, element: &ElementRef) -> RecargarResult<bool>;

    /// Computed CSS value of `property` on the element
    fn css_value(&mut self, element: &ElementRef, property: &str) -> RecargarResult<String>;

    /// HTML attribute of the element, `None` if absent
    fn attribute(&mut self, element: &ElementRef, name: &str) -> RecargarResult<Option<String>>;

    /// Execute JavaScript in the current frame context
    fn execute_script(&mut self, script: &str, args: &[ScriptArg]) -> RecargarResult<Value>;

    /// Select an iframe as the active browsing context
    fn switch_to_frame(&mut self, frame: &ElementRef) -> RecargarResult<()>;

    /// Select another window as the active browsing context
    fn switch_to_window(&mut self, handle: &WindowHandle) -> RecargarResult<()>;

    /// Return to the top-level document of the current window
    fn switch_to_default(&mut self) -> RecargarResult<()>;

    /// The currently selected frame context
    fn frame_context(&self) -> FrameContext;

    /// Handle of the current window
    fn window_handle(&mut self) -> RecargarResult<WindowHandle>;

    /// Handles of all open windows
    fn window_handles(&mut self) -> RecargarResult<Vec<WindowHandle>>;

    /// Shut the browser down. Idempotent.
    fn quit(&mut self) -> RecargarResult<()>;
}

/// Scroll an element into the viewport.
///
/// Some inputs on the target page sit below the fold and are reported as
/// not visible until scrolled to, so interaction-heavy steps scroll first.
pub fn scroll_into_view<S: BrowserSession + ?Sized>(
    session: &mut S,
    element: &ElementRef,
) -> RecargarResult<()> {
    session.execute_script(
        "arguments[0].scrollIntoView(true);",
        &[ScriptArg::Element(element.clone())],
    )?;
    Ok(())
}

/// Scoped owner of the one session per run.
///
/// Guarantees a single teardown path: `quit()` runs on every exit, including
/// panics and early returns, via `Drop`.
#[derive(Debug)]
pub struct SessionGuard<S: BrowserSession> {
    session: S,
    released: bool,
}

impl<S: BrowserSession> SessionGuard<S> {
    /// Take ownership of a session for the duration of a run
    #[must_use]
    pub fn new(session: S) -> Self {
        Self {
            session,
            released: false,
        }
    }

    /// Access the guarded session
    pub fn session(&mut self) -> &mut S {
        &mut self.session
    }

    /// Shut the session down now instead of at drop time
    pub fn release(mut self) -> RecargarResult<()> {
        self.released = true;
        self.session.quit()
    }
}

impl<S: BrowserSession> Drop for SessionGuard<S> {
    fn drop(&mut self) {
        if !self.released {
            if let Err(e) = self.session.quit() {
                tracing::warn!(error = %e, "session quit failed during teardown");
            }
        }
    }
}

impl<S: BrowserSession> std::ops::Deref for SessionGuard<S> {
    type Target = S;

    fn deref(&self) -> &S {
        &self.session
    }
}

impl<S: BrowserSession> std::ops::DerefMut for SessionGuard<S> {
    fn deref_mut(&mut self) -> &mut S {
        &mut self.session
    }
}

/// Convenience constructor for a stale-element error
pub(crate) fn stale(element: &ElementRef) -> RecargarError {
    RecargarError::StaleElement {
        description: element.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod locator_tests {
        use super::*;

        #[test]
        fn test_locator_constructors() {
            assert_eq!(Locator::id("x"), Locator::Id("x".into()));
            assert_eq!(Locator::css("a.b"), Locator::Css("a.b".into()));
            assert_eq!(Locator::xpath("//div"), Locator::XPath("//div".into()));
            assert_eq!(Locator::link_text("More"), Locator::LinkText("More".into()));
        }

        #[test]
        fn test_locator_display() {
            assert_eq!(Locator::id("cookie-agree").to_string(), "id=cookie-agree");
            assert_eq!(
                Locator::xpath("//div[@id='pay-section']").to_string(),
                "xpath=//div[@id='pay-section']"
            );
        }
    }

    mod element_ref_tests {
        use super::*;

        #[test]
        fn test_element_ref_display_names_locator() {
            let el = ElementRef::new(7, "id=connection-phone");
            assert_eq!(el.to_string(), "element #7 (id=connection-phone)");
        }

        #[test]
        fn test_stale_error_describes_element() {
            let el = ElementRef::new(3, "css=iframe");
            let err = stale(&el);
            assert!(err.to_string().contains("element #3"));
        }
    }

    mod frame_context_tests {
        use super::*;

        #[test]
        fn test_default_context_is_top() {
            assert_eq!(FrameContext::default(), FrameContext::Top);
        }
    }
}
