//! Cookie-consent dismissal.
//!
//! The consent overlay intercepts every interaction on the page, so each
//! verification step dismisses it before doing anything else. The control
//! renders unreliably: sometimes late, sometimes not at all until the page
//! is reloaded. The handler therefore retries a bounded number of times,
//! reloading between attempts, and reports exhaustion as a typed error
//! rather than proceeding with the overlay still up.

use crate::clock::Clock;
use crate::config::SuiteConfig;
use crate::result::{RecargarError, RecargarResult};
use crate::session::{BrowserSession, Locator};
use crate::wait::{conditions, UrlPattern, Waiter};

/// Dismisses the consent overlay exactly once per navigation
#[derive(Debug, Clone)]
pub struct ConsentHandler {
    site_pattern: UrlPattern,
    control: Locator,
    max_attempts: u32,
}

impl ConsentHandler {
    /// Create a handler from explicit parts
    #[must_use]
    pub fn new(site_pattern: UrlPattern, control: Locator, max_attempts: u32) -> Self {
        Self {
            site_pattern,
            control,
            max_attempts,
        }
    }

    /// Create a handler from the suite config
    #[must_use]
    pub fn from_config(config: &SuiteConfig) -> Self {
        Self::new(
            config.site_pattern(),
            Locator::id(config.consent_control_id.clone()),
            config.consent_max_attempts,
        )
    }

    /// Wait for site navigation to complete, then dismiss the overlay.
    ///
    /// Up to `max_attempts` rounds: wait for the consent control to become
    /// clickable and click it. A timeout or a failed click triggers a full
    /// page reload before the next round. Exhausting the budget fails with
    /// [`RecargarError::ConsentNotDismissed`].
    pub fn dismiss<S, C>(&self, session: &mut S, waiter: &Waiter<C>) -> RecargarResult<()>
    where
        S: BrowserSession + ?Sized,
        C: Clock,
    {
        waiter.wait_for(session, &conditions::url_matches(self.site_pattern.clone()))?;

        for attempt in 1..=self.max_attempts {
            match self.try_accept(session, waiter) {
                Ok(()) => {
                    tracing::debug!(attempt, "consent overlay dismissed");
                    return Ok(());
                }
                Err(e) => {
                    tracing::warn!(attempt, error = %e, "consent attempt failed, reloading");
                    session.refresh()?;
                }
            }
        }

        Err(RecargarError::ConsentNotDismissed {
            attempts: self.max_attempts,
        })
    }

    fn try_accept<S, C>(&self, session: &mut S, waiter: &Waiter<C>) -> RecargarResult<()>
    where
        S: BrowserSession + ?Sized,
        C: Clock,
    {
        let control = waiter.wait_for(
            session,
            &conditions::element_clickable(self.control.clone()),
        )?;
        session.click(&control)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FakeClock;
    use crate::mock::{MockElement, MockSession};
    use crate::wait::WaitOptions;

    fn handler() -> ConsentHandler {
        ConsentHandler::from_config(&SuiteConfig::default())
    }

    fn waiter() -> Waiter<FakeClock> {
        Waiter::with_clock(
            WaitOptions::new().with_timeout(500).with_poll_interval(100),
            FakeClock::new(),
        )
    }

    #[test]
    fn test_dismisses_on_first_attempt() {
        let mut session = MockSession::new("https://mts.by/");
        session.add_element(Locator::id("cookie-agree"), MockElement::new());
        handler().dismiss(&mut session, &waiter()).unwrap();
        assert_eq!(session.refresh_count(), 0);
    }

    #[test]
    fn test_reloads_when_control_never_renders_then_fails_typed() {
        let mut session = MockSession::new("https://mts.by/");
        let err = handler().dismiss(&mut session, &waiter()).unwrap_err();
        assert!(matches!(
            err,
            RecargarError::ConsentNotDismissed { attempts: 3 }
        ));
        assert_eq!(session.refresh_count(), 3);
    }

    #[test]
    fn test_succeeds_when_control_appears_after_reload() {
        let mut session = MockSession::new("https://mts.by/");
        session.add_element(
            Locator::id("cookie-agree"),
            MockElement::new().requires_refreshes(2),
        );
        handler().dismiss(&mut session, &waiter()).unwrap();
        assert_eq!(session.refresh_count(), 2);
    }

    #[test]
    fn test_click_interception_triggers_reload_then_succeeds() {
        let mut session = MockSession::new("https://mts.by/");
        session.add_element(
            Locator::id("cookie-agree"),
            MockElement::new().click_fails(1),
        );
        handler().dismiss(&mut session, &waiter()).unwrap();
        assert_eq!(session.refresh_count(), 1);
    }

    #[test]
    fn test_waits_for_site_url_before_touching_the_page() {
        let mut session = MockSession::new("https://still-redirecting.example/");
        session.add_element(Locator::id("cookie-agree"), MockElement::new());
        let err = handler().dismiss(&mut session, &waiter()).unwrap_err();
        // navigation never completes, so no attempt is made
        assert!(matches!(err, RecargarError::ConditionTimeout { .. }));
        assert_eq!(session.refresh_count(), 0);
    }

    #[test]
    fn test_never_exceeds_attempt_budget() {
        let mut session = MockSession::new("https://mts.by/");
        session.add_element(
            Locator::id("cookie-agree"),
            MockElement::new().click_fails(10),
        );
        let custom = ConsentHandler::new(
            SuiteConfig::default().site_pattern(),
            Locator::id("cookie-agree"),
            2,
        );
        let err = custom.dismiss(&mut session, &waiter()).unwrap_err();
        assert!(matches!(
            err,
            RecargarError::ConsentNotDismissed { attempts: 2 }
        ));
        assert_eq!(session.refresh_count(), 2);
    }
}
