//! storefront-e2e: page-object end-to-end suite for the Automation Exercise
//! demo storefront.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │  scenarios ──► Storefront fixture ──► page objects ──► BasePage  │
//! │                    │                                     │       │
//! │                    ├── Report (Allure steps)  ◄──────────┤       │
//! │                    ├── SessionRecorder (GIF)  ◄──────────┤       │
//! │                    └── TestDataGenerator                 ▼       │
//! │                                             Arc<dyn PageDriver>  │
//! │                                        ChromiumPage │ MockPage   │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Page objects hold a [`BasePage`] and describe the site in terms of its
//! selectors; every primitive and composite action is recorded as a
//! report step. The Chromium driver sits behind the `browser` feature; the
//! in-memory [`MockPage`] drives the whole suite offline.
//!
//! # Example
//!
//! ```no_run
//! # async fn demo() -> storefront_e2e::StoreResult<()> {
//! use storefront_e2e::prelude::*;
//! use std::sync::Arc;
//!
//! let config = SuiteConfig::from_env()?;
//! let store = Storefront::with_driver(Arc::new(MockPage::new()), &config, scenarios::USER_REGISTRATION);
//! store.run(scenarios::user_registration(&store)).await
//! # }
//! ```

mod assertion;
#[cfg(feature = "browser")]
mod browser;
pub mod config;
pub mod data;
mod driver;
pub mod fixture;
pub mod locator;
pub mod logging;
pub mod page_object;
pub mod pages;
pub mod recording;
pub mod report;
mod result;
pub mod scenarios;
pub mod wait;

pub use assertion::{expect_contains, expect_eq, expect_that, Assertion, AssertionResult};
#[cfg(feature = "browser")]
pub use browser::{Browser, ChromiumPage};
pub use config::SuiteConfig;
pub use data::{PaymentData, TestDataGenerator, UserData};
pub use driver::{
    DriverConfig, MockDom, MockElement, MockPage, PageDriver, Reaction, Screenshot, BLANK_PNG,
};
pub use fixture::Storefront;
pub use locator::{Locator, Selector};
pub use page_object::{BasePage, PageObject, UrlMatcher, DEFAULT_BASE_URL};
pub use recording::{RecordingConfig, SessionRecorder};
pub use report::{Report, Severity, StepGuard, TestMeta, TestStatus};
pub use result::{StoreError, StoreResult};
pub use wait::Timeouts;

/// Everything a scenario or test usually needs
pub mod prelude {
    pub use super::assertion::*;
    #[cfg(feature = "browser")]
    pub use super::browser::*;
    pub use super::config::SuiteConfig;
    pub use super::data::*;
    pub use super::driver::*;
    pub use super::fixture::*;
    pub use super::locator::{Locator, Selector};
    pub use super::page_object::*;
    pub use super::pages::*;
    pub use super::report::{Report, Severity, TestMeta, TestStatus};
    pub use super::result::*;
    pub use super::scenarios;
    pub use super::wait::Timeouts;
}
