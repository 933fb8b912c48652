//! Payment context resolution.
//!
//! After the top-up form is submitted, the payment provider either opens a
//! new window/tab or injects an iframe into the current page; which one is
//! provider-controlled and non-deterministic, so both branches are checked
//! in order. A run where neither appears is a typed failure, not a silent
//! fall-through to a later missing-field assertion.

use crate::config::SuiteConfig;
use crate::result::{RecargarError, RecargarResult};
use crate::session::{scroll_into_view, BrowserSession, ElementRef, Locator, WindowHandle};

/// Where the provider's payment form ended up
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentContext {
    /// The provider opened a separate window/tab
    Window(WindowHandle),
    /// The provider injected a same-page iframe
    Frame(ElementRef),
}

/// Resolves and enters the payment browsing context
#[derive(Debug, Clone)]
pub struct PaymentFrameLocator {
    provider_domain: String,
}

impl PaymentFrameLocator {
    /// Create a locator matching iframe sources against `provider_domain`
    #[must_use]
    pub fn new(provider_domain: impl Into<String>) -> Self {
        Self {
            provider_domain: provider_domain.into(),
        }
    }

    /// Create a locator from the suite config
    #[must_use]
    pub fn from_config(config: &SuiteConfig) -> Self {
        Self::new(config.provider_domain.clone())
    }

    /// Switch the session into the payment context.
    ///
    /// Checks for a new window first: if any handle besides the
    /// pre-submission one exists, that window is the payment page. Otherwise
    /// scans the page's iframes for one whose `src` contains the provider
    /// domain, scrolls it into view and enters it. If neither branch
    /// matches, the context is left unchanged and
    /// [`RecargarError::PaymentContextNotFound`] is returned.
    pub fn switch_to_payment_context<S>(&self, session: &mut S) -> RecargarResult<PaymentContext>
    where
        S: BrowserSession + ?Sized,
    {
        let original = session.window_handle()?;
        let handles = session.window_handles()?;

        if handles.len() > 1 {
            if let Some(handle) = handles.iter().find(|h| **h != original) {
                tracing::debug!(window = %handle, "payment provider opened a new window");
                session.switch_to_window(handle)?;
                return Ok(PaymentContext::Window(handle.clone()));
            }
        }

        let iframes = session.find_elements(&Locator::css("iframe"))?;
        let scanned = iframes.len();
        tracing::debug!(count = scanned, "scanning iframes for the payment provider");
        for iframe in iframes {
            let src = session.attribute(&iframe, "src")?.unwrap_or_default();
            if src.contains(&self.provider_domain) {
                scroll_into_view(session, &iframe)?;
                session.switch_to_frame(&iframe)?;
                return Ok(PaymentContext::Frame(iframe));
            }
        }

        Err(RecargarError::PaymentContextNotFound {
            windows: handles.len(),
            iframes: scanned,
        })
    }
}
