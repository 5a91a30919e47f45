//! Per-test fixture.
//!
//! A [`Storefront`] is everything one test needs: the driver, the five page
//! objects sharing it, freshly generated user and payment data, the report
//! and the session recorder. [`Storefront::run`] executes the scenario
//! exactly once and then tears the test down:
//!
//! ```text
//! body ──► (failed?) failure_screenshot ──► finish report ──► write Allure
//!      ──► save recording ──► close page / browser
//! ```

use crate::config::SuiteConfig;
use crate::data::{PaymentData, TestDataGenerator, UserData};
use crate::driver::PageDriver;
use crate::logging;
use crate::page_object::BasePage;
use crate::pages::{CartPage, CheckoutPage, HomePage, ProductsPage, SignupLoginPage};
use crate::recording::SessionRecorder;
use crate::report::{Report, TestMeta, TestStatus};
use crate::result::{StoreError, StoreResult};
use futures::FutureExt;
use std::any::Any;
use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{error, info, warn};

#[cfg(feature = "browser")]
use crate::browser::Browser;

/// Name of the screenshot attached when a test fails
pub const FAILURE_SCREENSHOT: &str = "failure_screenshot";

/// Collaborators of one test
pub struct Storefront {
    pub home: HomePage,
    pub signup_login: SignupLoginPage,
    pub products: ProductsPage,
    pub cart: CartPage,
    pub checkout: CheckoutPage,
    /// Account data for this test
    pub user: UserData,
    /// Card data for this test
    pub payment: PaymentData,
    meta: TestMeta,
    config: SuiteConfig,
    driver: Arc<dyn PageDriver>,
    report: Report,
    recorder: SessionRecorder,
    data: Mutex<TestDataGenerator>,
    ran: AtomicBool,
    closed: AtomicBool,
    #[cfg(feature = "browser")]
    browser: Mutex<Option<Browser>>,
}

impl fmt::Debug for Storefront {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Storefront")
            .field("test", &self.meta.name)
            .field("base_url", &self.config.base_url)
            .field("user", &self.user.email)
            .field("ran", &self.ran.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

impl Storefront {
    /// Build the fixture over an existing driver
    #[must_use]
    pub fn with_driver(driver: Arc<dyn PageDriver>, config: &SuiteConfig, meta: TestMeta) -> Self {
        logging::init();

        let report = Report::new(&meta);
        let recorder = SessionRecorder::new(config.recording);
        let base = BasePage::new(Arc::clone(&driver), report.clone())
            .with_base_url(config.base_url.as_str())
            .with_recorder(recorder.clone())
            .with_timeouts(config.timeouts);

        let mut data = TestDataGenerator::new(config.seed);
        let user = data.user_data();
        let payment = data.payment_data();
        info!(test = meta.name, email = %user.email, "fixture ready");

        Self {
            home: HomePage::new(base.clone()),
            signup_login: SignupLoginPage::new(base.clone()),
            products: ProductsPage::new(base.clone()),
            cart: CartPage::new(base.clone()),
            checkout: CheckoutPage::new(base),
            user,
            payment,
            meta,
            config: config.clone(),
            driver,
            report,
            recorder,
            data: Mutex::new(data),
            ran: AtomicBool::new(false),
            closed: AtomicBool::new(false),
            #[cfg(feature = "browser")]
            browser: Mutex::new(None),
        }
    }

    /// Launch Chromium and build the fixture over a fresh tab
    #[cfg(feature = "browser")]
    pub async fn launch(config: &SuiteConfig, meta: TestMeta) -> StoreResult<Self> {
        let browser = Browser::launch(config.driver_config()).await?;
        let page = browser.new_page().await?;
        let fixture = Self::with_driver(Arc::new(page), config, meta);
        *fixture.browser.lock().unwrap_or_else(PoisonError::into_inner) = Some(browser);
        Ok(fixture)
    }

    #[must_use]
    pub const fn meta(&self) -> &TestMeta {
        &self.meta
    }

    #[must_use]
    pub const fn config(&self) -> &SuiteConfig {
        &self.config
    }

    #[must_use]
    pub const fn report(&self) -> &Report {
        &self.report
    }

    #[must_use]
    pub const fn recorder(&self) -> &SessionRecorder {
        &self.recorder
    }

    #[must_use]
    pub fn driver(&self) -> &Arc<dyn PageDriver> {
        &self.driver
    }

    /// Draw an order comment from this test's generator
    pub fn comment(&self) -> &'static str {
        self.data
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .comment()
    }

    /// Whether the suite's marker filter selects this test
    #[must_use]
    pub fn is_selected(&self) -> bool {
        self.config.selects(&self.meta)
    }

    /// Run the scenario once, then record, report and close
    ///
    /// The scenario's own error is returned; teardown errors surface only
    /// when the scenario passed. Tests the marker filter excludes are
    /// recorded as skipped without polling `body`.
    pub async fn run<Fut>(&self, body: Fut) -> StoreResult<()>
    where
        Fut: Future<Output = StoreResult<()>>,
    {
        if self.ran.swap(true, Ordering::SeqCst) {
            return Err(StoreError::Fixture {
                message: format!("{} already ran", self.meta.name),
            });
        }

        let outcome = if self.is_selected() {
            info!(test = self.meta.name, "test started");
            let outcome = match AssertUnwindSafe(body).catch_unwind().await {
                Ok(result) => result,
                Err(payload) => Err(StoreError::Panicked {
                    message: panic_message(payload.as_ref()),
                }),
            };
            let status = outcome
                .as_ref()
                .err()
                .map_or(TestStatus::Passed, TestStatus::from_error);
            if let Err(e) = &outcome {
                error!(test = self.meta.name, error = %e, "test failed");
                self.capture_failure().await;
            }
            self.report
                .finish(status, outcome.as_ref().err().map(ToString::to_string));
            info!(test = self.meta.name, status = ?status, "test finished");
            outcome
        } else {
            info!(test = self.meta.name, "skipped by marker filter");
            self.report.finish(TestStatus::Skipped, None);
            Ok(())
        };

        let teardown = self.teardown().await;
        outcome.and(teardown)
    }

    async fn capture_failure(&self) {
        match self.driver.screenshot().await {
            Ok(shot) => self.report.attach_png(FAILURE_SCREENSHOT, shot.data),
            Err(e) => warn!(error = %e, "failure screenshot not captured"),
        }
    }

    async fn teardown(&self) -> StoreResult<()> {
        let written = self.report.write_allure(&self.config.report_dir);
        if let Some(path) = self.recorder.finish(&self.config.video_dir, self.meta.name) {
            info!(path = %path.display(), "recording saved");
        }
        let closed = self.close().await;
        written?;
        closed
    }

    /// Close the page and, when owned, the browser; later calls do nothing
    pub async fn close(&self) -> StoreResult<()> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        let page = self.driver.close().await;

        #[cfg(feature = "browser")]
        {
            let browser = self
                .browser
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .take();
            if let Some(browser) = browser {
                browser.close().await?;
            }
        }

        page
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "non-string panic payload".to_string())
}
