//! Suite configuration.
//!
//! Everything page-specific lives here: URLs, the consent control, the
//! expected bilingual strings, the provider domain, and wait timing. The
//! defaults target the production top-up page; tests override individual
//! fields through the builder methods.

use crate::wait::{UrlPattern, WaitOptions, DEFAULT_POLL_INTERVAL_MS, DEFAULT_WAIT_TIMEOUT_MS};
use serde::{Deserialize, Serialize};

/// Configuration for one verification run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SuiteConfig {
    /// Page the steps navigate to
    pub base_url: String,
    /// Regex the URL must match before consent handling starts
    pub site_url_pattern: String,
    /// Element id of the consent-accept control
    pub consent_control_id: String,
    /// Bounded retry budget for consent dismissal
    pub consent_max_attempts: u32,
    /// Wait window in milliseconds
    pub wait_timeout_ms: u64,
    /// Polling interval in milliseconds
    pub poll_interval_ms: u64,
    /// Payment-brand logos that must be visible in the payment section
    pub logo_brands: Vec<String>,
    /// Exact expected heading text (including the embedded newline)
    pub heading_text: String,
    /// Exact visible text of the service details link
    pub service_link_text: String,
    /// Exact expected breadcrumb text on the details page
    pub breadcrumb_text: String,
    /// Phone number submitted in the top-up form
    pub phone: String,
    /// Amount submitted in the top-up form
    pub amount: String,
    /// Substring identifying the payment provider's iframe source URL
    pub provider_domain: String,
    /// Minimum acceptable z-index on the embedded payment form
    pub min_z_index: i64,
}

impl Default for SuiteConfig {
    fn default() -> Self {
        Self {
            base_url: "https://mts.by".into(),
            site_url_pattern: r"https://(www\.)?mts\.by/".into(),
            consent_control_id: "cookie-agree".into(),
            consent_max_attempts: 3,
            wait_timeout_ms: DEFAULT_WAIT_TIMEOUT_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            logo_brands: vec!["Visa".into(), "MasterCard".into(), "Белкарт".into()],
            heading_text: "Онлайн пополнение\nбез комиссии".into(),
            service_link_text: "Подробнее о сервисе".into(),
            breadcrumb_text: "Порядок оплаты и безопасность интернет платежей".into(),
            phone: "297777777".into(),
            amount: "100".into(),
            provider_domain: "checkout.bepaid.by".into(),
            min_z_index: 1000,
        }
    }
}

impl SuiteConfig {
    /// Create a config with the production defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a config from JSON, filling omitted fields from the defaults
    pub fn from_json(json: &str) -> crate::result::RecargarResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Set the page under verification
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the wait window
    #[must_use]
    pub const fn with_wait_timeout(mut self, timeout_ms: u64) -> Self {
        self.wait_timeout_ms = timeout_ms;
        self
    }

    /// Set the polling interval
    #[must_use]
    pub const fn with_poll_interval(mut self, poll_interval_ms: u64) -> Self {
        self.poll_interval_ms = poll_interval_ms;
        self
    }

    /// Set the consent retry budget
    #[must_use]
    pub const fn with_consent_attempts(mut self, attempts: u32) -> Self {
        self.consent_max_attempts = attempts;
        self
    }

    /// Wait options derived from this config
    #[must_use]
    pub fn wait_options(&self) -> WaitOptions {
        WaitOptions::new()
            .with_timeout(self.wait_timeout_ms)
            .with_poll_interval(self.poll_interval_ms)
    }

    /// URL pattern signalling that site navigation completed
    #[must_use]
    pub fn site_pattern(&self) -> UrlPattern {
        UrlPattern::Regex(self.site_url_pattern.clone())
    }
}
