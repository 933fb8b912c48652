//! Page verification steps.
//!
//! Four independent checks against the top-up page. Each step owns its own
//! navigation and consent dismissal, shares nothing with the other steps
//! beyond the session itself, and fails with an assertion error carrying
//! both the expected and the observed value.

use crate::clock::Clock;
use crate::config::SuiteConfig;
use crate::consent::ConsentHandler;
use crate::frame::{PaymentContext, PaymentFrameLocator};
use crate::repair::FormRepair;
use crate::result::{RecargarError, RecargarResult};
use crate::session::{scroll_into_view, BrowserSession, Locator, WindowHandle};
use crate::wait::{conditions, Waiter};

const HEADING_XPATH: &str = "//div[@class='pay__wrapper']/h2";
const PHONE_INPUT_ID: &str = "connection-phone";
const AMOUNT_INPUT_ID: &str = "connection-sum";
const SUBMIT_BUTTON_TEXT: &str = "Продолжить";

const CARD_NUMBER_CSS: &str = "input#cc-number";
const CVC_CSS: &str = "input[formcontrolname='cvc']";
const EXPIRY_CSS: &str = "input.date-input";
const CARDHOLDER_CSS: &str = "input[autocomplete='cc-name']";

fn logo_locator(brand: &str) -> Locator {
    Locator::xpath(format!("//div[@id='pay-section']//img[@alt='{brand}']"))
}

fn breadcrumb_locator(text: &str) -> Locator {
    Locator::xpath(format!("//span[@itemprop='name' and text()='{text}']"))
}

fn submit_locator() -> Locator {
    Locator::xpath(format!("//button[text()='{SUBMIT_BUTTON_TEXT}']"))
}

/// Turn a wait timeout into an assertion naming what was being verified
fn timeout_to_assertion(
    err: RecargarError,
    subject: &str,
    expected: &str,
) -> RecargarError {
    match err {
        RecargarError::ConditionTimeout { timeout_ms, .. } => RecargarError::AssertionFailed {
            subject: subject.to_string(),
            expected: expected.to_string(),
            actual: format!("not satisfied within {timeout_ms}ms"),
        },
        other => other,
    }
}

fn open_page<S, C>(session: &mut S, waiter: &Waiter<C>, config: &SuiteConfig) -> RecargarResult<()>
where
    S: BrowserSession + ?Sized,
    C: Clock,
{
    session.navigate(&config.base_url)?;
    ConsentHandler::from_config(config).dismiss(session, waiter)
}

/// Verify the three payment-brand logos are visible in the payment section.
///
/// A missing logo fails naming the brand.
pub fn check_payment_logos<S, C>(
    session: &mut S,
    waiter: &Waiter<C>,
    config: &SuiteConfig,
) -> RecargarResult<()>
where
    S: BrowserSession + ?Sized,
    C: Clock,
{
    tracing::info!("verifying payment system logos");
    open_page(session, waiter, config)?;
    for brand in &config.logo_brands {
        waiter
            .wait_for(session, &conditions::element_visible(logo_locator(brand)))
            .map_err(|e| {
                timeout_to_assertion(
                    e,
                    &format!("payment logo '{brand}'"),
                    "visible in the payment section",
                )
            })?;
    }
    Ok(())
}

/// Verify the payment block heading equals the exact expected bilingual
/// string, newline included.
pub fn check_heading_text<S, C>(
    session: &mut S,
    waiter: &Waiter<C>,
    config: &SuiteConfig,
) -> RecargarResult<()>
where
    S: BrowserSession + ?Sized,
    C: Clock,
{
    tracing::info!("verifying payment block heading");
    open_page(session, waiter, config)?;
    let heading = waiter.wait_for(
        session,
        &conditions::element_visible(Locator::xpath(HEADING_XPATH)),
    )?;
    let actual = session.text(&heading)?;
    if actual != config.heading_text {
        return Err(RecargarError::AssertionFailed {
            subject: "payment block heading".into(),
            expected: config.heading_text.clone(),
            actual,
        });
    }
    Ok(())
}

/// Verify the service details link is clickable and leads to the page with
/// the expected breadcrumb.
pub fn check_service_link<S, C>(
    session: &mut S,
    waiter: &Waiter<C>,
    config: &SuiteConfig,
) -> RecargarResult<()>
where
    S: BrowserSession + ?Sized,
    C: Clock,
{
    tracing::info!("verifying service details link");
    open_page(session, waiter, config)?;
    let link = waiter.wait_for(
        session,
        &conditions::element_clickable(Locator::link_text(config.service_link_text.clone())),
    )?;
    session.click(&link)?;

    let breadcrumb = waiter
        .wait_for(
            session,
            &conditions::element_visible(breadcrumb_locator(&config.breadcrumb_text)),
        )
        .map_err(|e| {
            timeout_to_assertion(
                e,
                "details page breadcrumb",
                &config.breadcrumb_text,
            )
        })?;
    let actual = session.text(&breadcrumb)?;
    if actual != config.breadcrumb_text {
        return Err(RecargarError::AssertionFailed {
            subject: "details page breadcrumb".into(),
            expected: config.breadcrumb_text.clone(),
            actual,
        });
    }
    Ok(())
}

/// Drive the full top-up submission flow and verify the provider's payment
/// form is reachable and properly rendered.
///
/// Fills phone and amount, submits, resolves the payment context (new
/// window or provider iframe), asserts the four card inputs are visible,
/// runs the visibility probe and the repair routine, and restores the
/// default browsing context on every path out.
pub fn check_payment_form<S, C>(
    session: &mut S,
    waiter: &Waiter<C>,
    config: &SuiteConfig,
) -> RecargarResult<()>
where
    S: BrowserSession + ?Sized,
    C: Clock,
{
    tracing::info!("verifying top-up submission flow");
    open_page(session, waiter, config)?;

    // the form sits below the fold; bring it into view before interacting
    let phone = waiter.wait_for(
        session,
        &conditions::element_present(Locator::id(PHONE_INPUT_ID)),
    )?;
    scroll_into_view(session, &phone)?;

    let phone = waiter.wait_for(
        session,
        &conditions::element_visible(Locator::id(PHONE_INPUT_ID)),
    )?;
    let amount = waiter.wait_for(
        session,
        &conditions::element_visible(Locator::id(AMOUNT_INPUT_ID)),
    )?;
    let submit = waiter.wait_for(session, &conditions::element_clickable(submit_locator()))?;

    session.send_keys(&phone, &config.phone)?;
    session.send_keys(&amount, &config.amount)?;
    session.click(&submit)?;

    let original_window = session.window_handle()?;
    let context = PaymentFrameLocator::from_config(config).switch_to_payment_context(session)?;

    let outcome = verify_card_fields(session, waiter, config);
    let restore = restore_default_context(session, &original_window, &context);
    outcome.and(restore)
}

fn verify_card_fields<S, C>(
    session: &mut S,
    waiter: &Waiter<C>,
    config: &SuiteConfig,
) -> RecargarResult<()>
where
    S: BrowserSession + ?Sized,
    C: Clock,
{
    let fields = [
        ("card number input", CARD_NUMBER_CSS),
        ("CVC input", CVC_CSS),
        ("expiration date input", EXPIRY_CSS),
        ("cardholder name input", CARDHOLDER_CSS),
    ];
    for (subject, css) in fields {
        waiter
            .wait_for(
                session,
                &conditions::element_visible(Locator::css(css)),
            )
            .map_err(|e| timeout_to_assertion(e, subject, "visible in the payment form"))?;
    }

    let repair = FormRepair::from_config(config);
    repair.probe_visibility(session)?;
    repair.repair(session)?;
    Ok(())
}

fn restore_default_context<S>(
    session: &mut S,
    original_window: &WindowHandle,
    context: &PaymentContext,
) -> RecargarResult<()>
where
    S: BrowserSession + ?Sized,
{
    match context {
        PaymentContext::Frame(_) => session.switch_to_default(),
        PaymentContext::Window(_) => {
            session.switch_to_window(original_window)?;
            session.switch_to_default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FakeClock;
    use crate::mock::{ClickEffect, MockElement, MockSession};
    use crate::session::FrameContext;
    use crate::wait::WaitOptions;

    fn fast_config() -> SuiteConfig {
        SuiteConfig::default()
            .with_wait_timeout(500)
            .with_poll_interval(100)
    }

    fn waiter(config: &SuiteConfig) -> Waiter<FakeClock> {
        Waiter::with_clock(config.wait_options(), FakeClock::new())
    }

    /// Page with consent control already clickable
    fn page() -> MockSession {
        let mut session = MockSession::new("https://mts.by/");
        session.add_element(Locator::id("cookie-agree"), MockElement::new());
        session
    }

    fn add_logos(session: &mut MockSession, brands: &[&str]) {
        for brand in brands {
            session.add_element(logo_locator(brand), MockElement::new());
        }
    }

    fn add_topup_form(session: &mut MockSession, effect: Option<ClickEffect>) {
        session.add_element(Locator::id(PHONE_INPUT_ID), MockElement::new());
        session.add_element(Locator::id(AMOUNT_INPUT_ID), MockElement::new());
        let mut submit = MockElement::new();
        if let Some(effect) = effect {
            submit = submit.on_click(effect);
        }
        session.add_element(submit_locator(), submit);
    }

    fn healthy_container() -> MockElement {
        MockElement::new()
            .with_css("z-index", "2000")
            .with_css("position", "relative")
            .with_css("display", "block")
    }

    mod logos_tests {
        use super::*;

        #[test]
        fn test_all_logos_visible() {
            let config = fast_config();
            let mut session = page();
            add_logos(&mut session, &["Visa", "MasterCard", "Белкарт"]);
            check_payment_logos(&mut session, &waiter(&config), &config).unwrap();
        }

        #[test]
        fn test_missing_logo_names_the_brand() {
            let config = fast_config();
            let mut session = page();
            add_logos(&mut session, &["Visa", "MasterCard"]);
            let err = check_payment_logos(&mut session, &waiter(&config), &config).unwrap_err();
            match err {
                RecargarError::AssertionFailed { subject, .. } => {
                    assert!(subject.contains("Белкарт"), "got subject {subject:?}");
                }
                other => panic!("expected assertion failure, got {other}"),
            }
        }

        #[test]
        fn test_late_rendering_logo_is_tolerated() {
            let config = fast_config();
            let mut session = page();
            add_logos(&mut session, &["Visa", "MasterCard"]);
            session.add_element(logo_locator("Белкарт"), MockElement::new().present_after(2));
            check_payment_logos(&mut session, &waiter(&config), &config).unwrap();
        }
    }

    mod heading_tests {
        use super::*;

        #[test]
        fn test_exact_heading_passes() {
            let config = fast_config();
            let mut session = page();
            session.add_element(
                Locator::xpath(HEADING_XPATH),
                MockElement::new().with_text("Онлайн пополнение\nбез комиссии"),
            );
            check_heading_text(&mut session, &waiter(&config), &config).unwrap();
        }

        #[test]
        fn test_whitespace_difference_fails_with_both_values() {
            let config = fast_config();
            let mut session = page();
            session.add_element(
                Locator::xpath(HEADING_XPATH),
                MockElement::new().with_text("Онлайн пополнение без комиссии"),
            );
            let err = check_heading_text(&mut session, &waiter(&config), &config).unwrap_err();
            match err {
                RecargarError::AssertionFailed {
                    expected, actual, ..
                } => {
                    assert!(expected.contains('\n'));
                    assert!(!actual.contains('\n'));
                }
                other => panic!("expected assertion failure, got {other}"),
            }
        }
    }

    mod service_link_tests {
        use super::*;

        #[test]
        fn test_link_leads_to_details_page() {
            let config = fast_config();
            let mut session = page();
            session.add_element(
                Locator::link_text(&*config.service_link_text),
                MockElement::new().on_click(ClickEffect::Navigate(
                    "https://mts.by/help/poryadok-oplaty/".into(),
                )),
            );
            session.add_element(
                breadcrumb_locator(&config.breadcrumb_text),
                MockElement::new().with_text(&*config.breadcrumb_text),
            );
            check_service_link(&mut session, &waiter(&config), &config).unwrap();
        }

        #[test]
        fn test_missing_breadcrumb_fails() {
            let config = fast_config();
            let mut session = page();
            session.add_element(
                Locator::link_text(&*config.service_link_text),
                MockElement::new(),
            );
            let err = check_service_link(&mut session, &waiter(&config), &config).unwrap_err();
            assert!(matches!(err, RecargarError::AssertionFailed { .. }));
        }
    }

    mod payment_form_tests {
        use super::*;

        fn add_card_fields_in_frame(session: &mut MockSession, frame: u64) {
            for css in [CARD_NUMBER_CSS, CVC_CSS, EXPIRY_CSS, CARDHOLDER_CSS] {
                session.add_frame_element(frame, Locator::css(css), MockElement::new());
            }
            session.add_frame_element(
                frame,
                Locator::xpath("//div[contains(@class, 'card-page__card')]"),
                healthy_container(),
            );
        }

        #[test]
        fn test_iframe_variant_passes_and_restores_context() {
            let config = fast_config();
            let mut session = page();
            add_topup_form(&mut session, None);
            let frame = session.add_iframe("https://checkout.bepaid.by/v2/checkout");
            add_card_fields_in_frame(&mut session, frame);

            check_payment_form(&mut session, &waiter(&config), &config).unwrap();
            assert_eq!(session.frame_context(), FrameContext::Top);
        }

        #[test]
        fn test_window_variant_passes_and_returns_to_original_window() {
            let config = fast_config();
            let mut session = page();
            add_topup_form(
                &mut session,
                Some(ClickEffect::OpenWindow {
                    handle: "window-pay".into(),
                    url: "https://checkout.bepaid.by/v2".into(),
                }),
            );
            for css in [CARD_NUMBER_CSS, CVC_CSS, EXPIRY_CSS, CARDHOLDER_CSS] {
                session.add_window_element("window-pay", Locator::css(css), MockElement::new());
            }
            session.add_window_element(
                "window-pay",
                Locator::xpath("//div[contains(@class, 'card-page__card')]"),
                healthy_container(),
            );

            check_payment_form(&mut session, &waiter(&config), &config).unwrap();
            assert_eq!(session.current_url().unwrap(), "https://mts.by/");
        }

        #[test]
        fn test_no_payment_context_is_a_typed_failure() {
            let config = fast_config();
            let mut session = page();
            add_topup_form(&mut session, None);
            let err = check_payment_form(&mut session, &waiter(&config), &config).unwrap_err();
            assert!(matches!(
                err,
                RecargarError::PaymentContextNotFound { .. }
            ));
        }

        #[test]
        fn test_missing_card_field_names_it_and_still_restores_context() {
            let config = fast_config();
            let mut session = page();
            add_topup_form(&mut session, None);
            let frame = session.add_iframe("https://checkout.bepaid.by/v2/checkout");
            for css in [CARD_NUMBER_CSS, CVC_CSS, EXPIRY_CSS] {
                session.add_frame_element(frame, Locator::css(css), MockElement::new());
            }

            let err = check_payment_form(&mut session, &waiter(&config), &config).unwrap_err();
            match err {
                RecargarError::AssertionFailed { subject, .. } => {
                    assert_eq!(subject, "cardholder name input");
                }
                other => panic!("expected assertion failure, got {other}"),
            }
            assert_eq!(session.frame_context(), FrameContext::Top);
        }

        #[test]
        fn test_inputs_receive_phone_and_amount() {
            let config = fast_config();
            let mut session = page();
            add_topup_form(&mut session, None);
            let frame = session.add_iframe("https://checkout.bepaid.by/v2/checkout");
            add_card_fields_in_frame(&mut session, frame);

            check_payment_form(&mut session, &waiter(&config), &config).unwrap();
            let phone = session.find_element(&Locator::id(PHONE_INPUT_ID)).unwrap();
            assert_eq!(
                session.attribute(&phone, "value").unwrap(),
                Some("297777777".to_string())
            );
        }
    }
}
