//! Recargar: resilient UI-verification workflow for a top-up payment page.
//!
//! Recargar (Spanish: "to top up") validates the payment page of a mobile
//! operator's site: cookie consent handling, payment-brand logos, heading
//! text, the service details link, and the reachability and rendering of
//! the third-party payment form embedded after submitting the top-up form.
//!
//! The browser engine itself is an external collaborator behind the
//! [`BrowserSession`] trait; the value here is the resilience layer on top
//! of it: bounded polling waits, consent retry with reload, the
//! window-or-iframe payment context resolution, and the style repair of
//! the embedded form.
//!
//! # Architecture
//!
//! ```text
//! steps ──► consent ──► wait ──► BrowserSession (external engine / mock)
//!   │                     ▲
//!   ├──► frame ───────────┤
//!   └──► repair ──────────┘
//! ```
//!
//! Everything is single-threaded and strictly sequential: one session per
//! run, owned by a [`SessionGuard`] that guarantees teardown on every exit
//! path.

#![warn(missing_docs)]

pub mod clock;
pub mod config;
pub mod consent;
pub mod frame;
pub mod mock;
pub mod repair;
pub mod result;
pub mod runner;
pub mod session;
pub mod steps;
pub mod wait;

pub use clock::{Clock, FakeClock, SystemClock};
pub use config::SuiteConfig;
pub use consent::ConsentHandler;
pub use frame::{PaymentContext, PaymentFrameLocator};
pub use repair::{FormRepair, RepairReport};
pub use result::{RecargarError, RecargarResult};
pub use runner::{run_suite, StepOutcome, SuiteReport};
pub use session::{
    BrowserSession, ElementRef, FrameContext, Locator, ScriptArg, SessionGuard, WindowHandle,
};
pub use wait::{UrlPattern, WaitOptions, Waiter};
