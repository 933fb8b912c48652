//! Embedded payment form repair.
//!
//! The provider's form is rendered inside the host page and inherits its
//! style conflicts: a stacking context that buries it, positioning that
//! breaks its layout, or an outright `display: none`. The repair routine
//! inspects three CSS properties and corrects each independently by direct
//! style mutation on the form container. Corrections are idempotent and
//! order-insensitive; each reads the current computed state before deciding.
//! There is no rollback, mutations persist for the rest of the session.

use crate::config::SuiteConfig;
use crate::result::{RecargarError, RecargarResult};
use crate::session::{BrowserSession, ElementRef, Locator, ScriptArg};

/// XPath of the provider's form container
const FORM_CONTAINER_XPATH: &str = "//div[contains(@class, 'card-page__card')]";

/// Which corrections the repair routine applied
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RepairReport {
    /// z-index was raised to the configured minimum
    pub z_index_fixed: bool,
    /// position was forced to `relative`
    pub position_fixed: bool,
    /// display was forced to `block`
    pub display_fixed: bool,
}

impl RepairReport {
    /// Whether any correction was applied
    #[must_use]
    pub fn any_fixed(&self) -> bool {
        self.z_index_fixed || self.position_fixed || self.display_fixed
    }
}

/// Inspects and repairs the embedded payment form's presentation
#[derive(Debug, Clone)]
pub struct FormRepair {
    container: Locator,
    min_z_index: i64,
}

impl FormRepair {
    /// Create a repairer for the standard form container
    #[must_use]
    pub fn new(min_z_index: i64) -> Self {
        Self {
            container: Locator::xpath(FORM_CONTAINER_XPATH),
            min_z_index,
        }
    }

    /// Create a repairer from the suite config
    #[must_use]
    pub fn from_config(config: &SuiteConfig) -> Self {
        Self::new(config.min_z_index)
    }

    /// Report whether the form container is currently displayed.
    ///
    /// Purely diagnostic: a missing or hidden container is logged and
    /// reported as `false`, never raised as a failure. Engine-level errors
    /// still propagate.
    pub fn probe_visibility<S>(&self, session: &mut S) -> RecargarResult<bool>
    where
        S: BrowserSession + ?Sized,
    {
        match session.find_element(&self.container) {
            Ok(form) => {
                let visible = session.is_displayed(&form)?;
                if visible {
                    tracing::info!("payment form is visible on the page");
                } else {
                    tracing::info!("payment form is not visible on the page");
                }
                Ok(visible)
            }
            Err(RecargarError::NoSuchElement { .. }) => {
                tracing::info!("payment form container not found");
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    /// Apply the three corrections, each independently.
    pub fn repair<S>(&self, session: &mut S) -> RecargarResult<RepairReport>
    where
        S: BrowserSession + ?Sized,
    {
        let form = session.find_element(&self.container)?;
        let report = RepairReport {
            z_index_fixed: self.fix_z_index(session, &form)?,
            position_fixed: self.fix_position(session, &form)?,
            display_fixed: self.fix_display(session, &form)?,
        };
        if report.any_fixed() {
            tracing::info!(?report, "payment form presentation corrected");
        }
        Ok(report)
    }

    fn fix_z_index<S>(&self, session: &mut S, form: &ElementRef) -> RecargarResult<bool>
    where
        S: BrowserSession + ?Sized,
    {
        let current = session.css_value(form, "z-index")?;
        let needs_fix = if current == "auto" {
            true
        } else {
            let value: i64 =
                current
                    .parse()
                    .map_err(|_| RecargarError::InvalidCssValue {
                        property: "z-index".into(),
                        value: current.clone(),
                    })?;
            value < self.min_z_index
        };
        if needs_fix {
            session.execute_script(
                &format!("arguments[0].style.zIndex = '{}';", self.min_z_index),
                &[ScriptArg::Element(form.clone())],
            )?;
        }
        Ok(needs_fix)
    }

    fn fix_position<S>(&self, session: &mut S, form: &ElementRef) -> RecargarResult<bool>
    where
        S: BrowserSession + ?Sized,
    {
        let current = session.css_value(form, "position")?;
        let needs_fix = current != "relative";
        if needs_fix {
            session.execute_script(
                "arguments[0].style.position = 'relative';",
                &[ScriptArg::Element(form.clone())],
            )?;
        }
        Ok(needs_fix)
    }

    fn fix_display<S>(&self, session: &mut S, form: &ElementRef) -> RecargarResult<bool>
    where
        S: BrowserSession + ?Sized,
    {
        let current = session.css_value(form, "display")?;
        let needs_fix = current == "none";
        if needs_fix {
            session.execute_script(
                "arguments[0].style.display = 'block';",
                &[ScriptArg::Element(form.clone())],
            )?;
        }
        Ok(needs_fix)
    }
}
