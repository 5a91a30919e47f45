//! Page Object Model support.
//!
//! Pages are built by composition: each concrete page owns a [`BasePage`]
//! (the shared driver handle plus the test's report and recorder) and its
//! own locator registry, and implements [`PageObject`] to say where it lives.
//!
//! Every [`BasePage`] primitive runs inside a report step named after the
//! action, so the step tree mirrors what the test did:
//!
//! ```text
//! Add product to cart at index: 1
//! ├── Hover over: .col-sm-4 >> nth=0
//! ├── Click element: .col-sm-4 >> nth=0 >> .overlay-content .add-to-cart
//! └── Wait for element: button:has-text('Continue Shopping')
//! ```

use crate::assertion::Assertion;
use crate::driver::PageDriver;
use crate::locator::Locator;
use crate::recording::{record_frame, SessionRecorder};
use crate::report::Report;
use crate::result::StoreResult;
use crate::wait::Timeouts;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

/// Default site under test
pub const DEFAULT_BASE_URL: &str = "https://www.automationexercise.com";

/// Trait for page objects representing a page of the storefront.
///
/// # Example
///
/// ```ignore
/// struct SearchPage {
///     base: BasePage,
/// }
///
/// impl PageObject for SearchPage {
///     fn base(&self) -> &BasePage {
///         &self.base
///     }
///
///     fn url_pattern(&self) -> &str {
///         "/products"
///     }
/// }
/// ```
#[async_trait]
pub trait PageObject: Send + Sync {
    /// Shared primitives this page is built on
    fn base(&self) -> &BasePage;

    /// URL path pattern of the page (e.g. "/login", "/product_details/*")
    fn url_pattern(&self) -> &str;

    /// Get the page name for logging/debugging
    fn page_name(&self) -> &str {
        let full = std::any::type_name::<Self>();
        full.rsplit("::").next().unwrap_or(full)
    }

    /// Navigate straight to the page
    async fn open(&self) -> StoreResult<()> {
        self.base().open_path(self.url_pattern()).await
    }

    /// Whether the browser currently shows this page
    async fn is_current(&self) -> StoreResult<bool> {
        let url = self.base().current_url().await?;
        Ok(UrlMatcher::new(self.url_pattern()).matches(&url))
    }
}

/// Shared primitives over one test's driver, report and recorder
#[derive(Debug, Clone)]
pub struct BasePage {
    driver: Arc<dyn PageDriver>,
    report: Report,
    recorder: SessionRecorder,
    base_url: String,
    timeouts: Timeouts,
}

impl BasePage {
    /// Wrap a driver; recording off, default URL and timeouts
    #[must_use]
    pub fn new(driver: Arc<dyn PageDriver>, report: Report) -> Self {
        Self {
            driver,
            report,
            recorder: SessionRecorder::default(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeouts: Timeouts::default(),
        }
    }

    /// Set the site root
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Feed screenshots to a session recorder
    #[must_use]
    pub fn with_recorder(mut self, recorder: SessionRecorder) -> Self {
        self.recorder = recorder;
        self
    }

    /// Override timeouts
    #[must_use]
    pub const fn with_timeouts(mut self, timeouts: Timeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    /// The driver handle
    #[must_use]
    pub fn driver(&self) -> &Arc<dyn PageDriver> {
        &self.driver
    }

    /// The test report
    #[must_use]
    pub const fn report(&self) -> &Report {
        &self.report
    }

    /// Site root without trailing slash
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Timeouts in effect
    #[must_use]
    pub const fn timeouts(&self) -> &Timeouts {
        &self.timeouts
    }

    /// Navigate and wait for network idle
    pub async fn navigate(&self, url: &str) -> StoreResult<()> {
        self.report
            .run_step(format!("Navigate to {url}"), async {
                debug!(url, "navigate");
                self.driver.goto(url, self.timeouts.navigation_ms).await
            })
            .await
    }

    /// Navigate to a path below the site root
    pub async fn open_path(&self, path: &str) -> StoreResult<()> {
        let url = if path == "/" || path.is_empty() {
            self.base_url.clone()
        } else {
            format!("{}/{}", self.base_url, path.trim_start_matches('/'))
        };
        self.navigate(&url).await
    }

    /// Click an element
    pub async fn click(&self, locator: impl Into<Locator>) -> StoreResult<()> {
        let locator = locator.into();
        self.report
            .run_step(format!("Click element: {locator}"), async {
                debug!(locator = %locator, "click");
                self.driver.click(&locator).await
            })
            .await
    }

    /// Move the pointer over an element
    pub async fn hover(&self, locator: impl Into<Locator>) -> StoreResult<()> {
        let locator = locator.into();
        self.report
            .run_step(format!("Hover over: {locator}"), async {
                debug!(locator = %locator, "hover");
                self.driver.hover(&locator).await
            })
            .await
    }

    /// Fill a form field
    pub async fn fill(&self, locator: impl Into<Locator>, value: &str) -> StoreResult<()> {
        let locator = locator.into();
        self.report
            .run_step(
                format!("Fill field: {locator} with value: {value}"),
                async {
                    debug!(locator = %locator, "fill");
                    self.driver.fill(&locator, value).await
                },
            )
            .await
    }

    /// Get text from an element
    pub async fn get_text(&self, locator: impl Into<Locator>) -> StoreResult<String> {
        let locator = locator.into();
        self.report
            .run_step(format!("Get text from element: {locator}"), async {
                self.driver.inner_text(&locator).await
            })
            .await
    }

    /// Check if element is visible (no waiting)
    pub async fn is_visible(&self, locator: impl Into<Locator>) -> StoreResult<bool> {
        let locator = locator.into();
        self.report
            .run_step(format!("Check if element is visible: {locator}"), async {
                self.driver.is_visible(&locator).await
            })
            .await
    }

    /// Number of elements the locator matches
    pub async fn count(&self, locator: impl Into<Locator>) -> StoreResult<usize> {
        let locator = locator.into();
        self.report
            .run_step(format!("Count elements: {locator}"), async {
                self.driver.count(&locator).await
            })
            .await
    }

    /// Wait up to `timeout_ms` for an element to become visible
    pub async fn wait_for(&self, locator: impl Into<Locator>, timeout_ms: u64) -> StoreResult<()> {
        let locator = locator.into();
        self.report
            .run_step(format!("Wait for element: {locator}"), async {
                debug!(locator = %locator, timeout_ms, "wait for visible");
                self.driver.wait_for_visible(&locator, timeout_ms).await
            })
            .await
    }

    /// [`BasePage::wait_for`] with the default timeout
    pub async fn wait_for_element(&self, locator: impl Into<Locator>) -> StoreResult<()> {
        self.wait_for(locator, self.timeouts.default_ms).await
    }

    /// Take a screenshot, attach it to the report and record it
    pub async fn screenshot(&self, name: &str) -> StoreResult<()> {
        self.report
            .run_step(format!("Take screenshot: {name}"), async {
                let shot = self.driver.screenshot().await?;
                record_frame(&self.recorder, &shot);
                self.report.attach_png(name, shot.data);
                Ok(())
            })
            .await
    }

    /// Scroll an element into view
    pub async fn scroll_to(&self, locator: impl Into<Locator>) -> StoreResult<()> {
        let locator = locator.into();
        self.report
            .run_step(format!("Scroll to element: {locator}"), async {
                self.driver.scroll_into_view(&locator).await
            })
            .await
    }

    /// Select a dropdown option by value or label
    pub async fn select_option(&self, locator: impl Into<Locator>, value: &str) -> StoreResult<()> {
        let locator = locator.into();
        self.report
            .run_step(
                format!("Select from dropdown: {locator} with value: {value}"),
                async {
                    debug!(locator = %locator, value, "select option");
                    self.driver.select_option(&locator, value).await
                },
            )
            .await
    }

    /// Get page title
    pub async fn title(&self) -> StoreResult<String> {
        self.report
            .run_step("Get page title", self.driver.title())
            .await
    }

    /// Current URL
    pub async fn current_url(&self) -> StoreResult<String> {
        self.driver.current_url().await
    }

    /// Assert that element text equals expected text
    pub async fn assert_text_equals(
        &self,
        locator: impl Into<Locator>,
        expected: &str,
    ) -> StoreResult<()> {
        let locator = locator.into();
        self.report
            .run_step(format!("Assert element text equals: {expected}"), async {
                let actual = self.driver.inner_text(&locator).await?;
                Assertion::equals(&expected, &actual.trim()).into_result()
            })
            .await
    }

    /// Assert that element text contains expected text
    pub async fn assert_text_contains(
        &self,
        locator: impl Into<Locator>,
        expected: &str,
    ) -> StoreResult<()> {
        let locator = locator.into();
        self.report
            .run_step(format!("Assert element contains text: {expected}"), async {
                let actual = self.driver.inner_text(&locator).await?;
                Assertion::contains(&actual, expected).into_result()
            })
            .await
    }
}

/// URL pattern matcher for page objects
#[derive(Debug, Clone)]
pub struct UrlMatcher {
    pattern: String,
    segments: Vec<UrlSegment>,
}

#[derive(Debug, Clone)]
enum UrlSegment {
    Literal(String),
    Wildcard,
}

impl UrlMatcher {
    /// Create a new URL matcher from a pattern
    ///
    /// Patterns support literal segments (`/view_cart`) and single-segment
    /// wildcards (`/product_details/*`).
    #[must_use]
    pub fn new(pattern: &str) -> Self {
        let segments = pattern
            .split('/')
            .filter(|s| !s.is_empty())
            .map(|s| {
                if s == "*" {
                    UrlSegment::Wildcard
                } else {
                    UrlSegment::Literal(s.to_string())
                }
            })
            .collect();

        Self {
            pattern: pattern.to_string(),
            segments,
        }
    }

    /// Check if a URL (absolute or path-only) matches the pattern
    ///
    /// Scheme, host, query string and fragment are ignored.
    #[must_use]
    pub fn matches(&self, url: &str) -> bool {
        let path = url
            .split_once("://")
            .map_or(url, |(_, rest)| rest.find('/').map_or("", |i| &rest[i..]));
        let path = path.split(['?', '#']).next().unwrap_or("");
        let url_segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

        if url_segments.len() != self.segments.len() {
            return false;
        }

        self.segments
            .iter()
            .zip(&url_segments)
            .all(|(segment, actual)| match segment {
                UrlSegment::Literal(lit) => lit == actual,
                UrlSegment::Wildcard => true,
            })
    }

    /// Pattern as written
    #[must_use]
    pub fn pattern(&self) -> &str {
        &self.pattern
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::MockPage;
    use crate::report::{TestMeta, TestStatus};

    fn base_over(page: &MockPage) -> BasePage {
        BasePage::new(
            Arc::new(page.clone()),
            Report::new(&TestMeta::new("base_page")),
        )
    }

    mod url_matcher_tests {
        use super::*;

        #[test]
        fn test_literal_match() {
            let matcher = UrlMatcher::new("/view_cart");
            assert!(matcher.matches("https://www.automationexercise.com/view_cart"));
            assert!(matcher.matches("/view_cart"));
            assert!(!matcher.matches("/checkout"));
        }

        #[test]
        fn test_root_match() {
            let matcher = UrlMatcher::new("/");
            assert!(matcher.matches("https://www.automationexercise.com"));
            assert!(matcher.matches("https://www.automationexercise.com/"));
            assert!(!matcher.matches("https://www.automationexercise.com/login"));
        }

        #[test]
        fn test_query_and_fragment_ignored() {
            let matcher = UrlMatcher::new("/products");
            assert!(matcher.matches("https://www.automationexercise.com/products?search=top"));
            assert!(matcher.matches("/products#features"));
        }

        #[test]
        fn test_wildcard_match() {
            let matcher = UrlMatcher::new("/product_details/*");
            assert!(matcher.matches("/product_details/3"));
            assert!(!matcher.matches("/product_details"));
            assert_eq!(matcher.pattern(), "/product_details/*");
        }
    }

    mod base_page_tests {
        use super::*;

        #[tokio::test]
        async fn test_open_path_joins_base_url() {
            let page = MockPage::new();
            let base = base_over(&page).with_base_url("https://shop.test/");
            base.open_path("/products").await.unwrap();
            assert_eq!(base.current_url().await.unwrap(), "https://shop.test/products");
            base.open_path("/").await.unwrap();
            assert_eq!(base.current_url().await.unwrap(), "https://shop.test");
        }

        #[tokio::test]
        async fn test_primitives_open_steps() {
            let page = MockPage::new().with_element("#submit", "Pay and Confirm Order");
            let base = base_over(&page);
            base.click("#submit").await.unwrap();
            base.assert_text_contains("#submit", "Confirm").await.unwrap();

            let steps = base.report().snapshot().steps;
            assert_eq!(steps[0].name, "Click element: #submit");
            assert_eq!(steps[1].name, "Assert element contains text: Confirm");
            assert!(steps.iter().all(|s| s.status == TestStatus::Passed));
        }

        #[tokio::test]
        async fn test_assert_text_equals_mismatch_fails_step() {
            let page = MockPage::new().with_element("h2", "Account Created!");
            let base = base_over(&page);
            let err = base.assert_text_equals("h2", "Account Deleted!").await.unwrap_err();
            assert!(err.is_assertion());
            assert_eq!(base.report().snapshot().steps[0].status, TestStatus::Failed);
        }

        #[tokio::test]
        async fn test_missing_element_breaks_step() {
            let page = MockPage::new();
            let base = base_over(&page);
            assert!(base.fill("#name", "Ada").await.is_err());
            assert_eq!(base.report().snapshot().steps[0].status, TestStatus::Broken);
        }

        #[tokio::test]
        async fn test_screenshot_attaches_png() {
            let page = MockPage::new();
            let base = base_over(&page);
            base.screenshot("before_checkout").await.unwrap();
            assert_eq!(base.report().attachment_names(), vec!["before_checkout"]);
            assert_eq!(page.screenshots_taken(), 1);
        }

        #[tokio::test]
        async fn test_wait_for_uses_timeout() {
            let page = MockPage::new();
            let base = base_over(&page);
            let err = base.wait_for_element("#never").await.unwrap_err();
            assert!(matches!(
                err,
                crate::result::StoreError::Timeout { ms: 10_000, .. }
            ));
        }
    }

    mod page_object_trait_tests {
        use super::*;

        #[derive(Debug)]
        struct CartLikePage {
            base: BasePage,
        }

        impl PageObject for CartLikePage {
            fn base(&self) -> &BasePage {
                &self.base
            }

            fn url_pattern(&self) -> &str {
                "/view_cart"
            }
        }

        #[tokio::test]
        async fn test_open_and_is_current() {
            let page = MockPage::new();
            let cart = CartLikePage {
                base: base_over(&page),
            };
            assert!(!cart.is_current().await.unwrap());
            cart.open().await.unwrap();
            assert!(cart.is_current().await.unwrap());
            assert_eq!(cart.page_name(), "CartLikePage");
        }
    }
}
