//! Browser control over the Chrome `DevTools` Protocol.
//!
//! Compiled with the `browser` feature. [`Browser`] launches Chromium through
//! chromiumoxide and hands out [`ChromiumPage`]s, the real [`PageDriver`].
//! Element work happens in page-side JavaScript generated from the
//! [`Locator`] chain; pointer input goes through CDP so hover menus and
//! click handlers see genuine mouse events.

#![allow(
    clippy::wildcard_imports,
    clippy::significant_drop_tightening,
    clippy::missing_errors_doc,
    clippy::items_after_statements
)]

use crate::driver::{DriverConfig, PageDriver, Screenshot};
use crate::locator::{js_string, Locator};
use crate::result::{StoreError, StoreResult};
use crate::wait::{
    poll_until, DocumentMark, LoadState, NetworkIdleTracker, WaitOptions,
    CLICK_NAVIGATION_WINDOW_MS, DEFAULT_POLL_INTERVAL_MS,
};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser as CdpBrowser, BrowserConfig as CdpConfig};
use chromiumoxide::cdp::browser_protocol::emulation::{
    SetDeviceMetricsOverrideParams, SetUserAgentOverrideParams,
};
use chromiumoxide::cdp::browser_protocol::page::{
    CaptureScreenshotFormat, CaptureScreenshotParams,
};
use chromiumoxide::layout::Point;
use chromiumoxide::page::Page as CdpPage;
use futures::StreamExt;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Browser instance with real CDP connection
#[derive(Debug)]
pub struct Browser {
    config: DriverConfig,
    inner: Arc<Mutex<CdpBrowser>>,
    handle: tokio::task::JoinHandle<()>,
}

impl Browser {
    /// Launch a new browser instance
    pub async fn launch(config: DriverConfig) -> StoreResult<Self> {
        let mut builder =
            CdpConfig::builder().window_size(config.viewport_width, config.viewport_height);

        if !config.headless {
            builder = builder.with_head();
        }

        if !config.sandbox {
            builder = builder.no_sandbox();
        }

        if let Some(ref path) = config.executable_path {
            builder = builder.chrome_executable(path);
        }

        let cdp_config = builder
            .build()
            .map_err(|message| StoreError::BrowserLaunch { message })?;

        let (browser, mut handler) =
            CdpBrowser::launch(cdp_config)
                .await
                .map_err(|e| StoreError::BrowserLaunch {
                    message: e.to_string(),
                })?;

        let handle = tokio::spawn(async move {
            while let Some(h) = handler.next().await {
                if h.is_err() {
                    break;
                }
            }
        });

        info!(
            headless = config.headless,
            width = config.viewport_width,
            height = config.viewport_height,
            "browser launched"
        );

        Ok(Self {
            config,
            inner: Arc::new(Mutex::new(browser)),
            handle,
        })
    }

    /// Open a fresh page sized to the configured viewport
    pub async fn new_page(&self) -> StoreResult<ChromiumPage> {
        let browser = self.inner.lock().await;
        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| StoreError::Page {
                message: e.to_string(),
            })?;

        let metrics = SetDeviceMetricsOverrideParams::new(
            i64::from(self.config.viewport_width),
            i64::from(self.config.viewport_height),
            self.config.device_scale_factor,
            false,
        );
        page.execute(metrics).await.map_err(|e| StoreError::Page {
            message: e.to_string(),
        })?;

        if let Some(ref ua) = self.config.user_agent {
            page.execute(SetUserAgentOverrideParams::new(ua.clone()))
                .await
                .map_err(|e| StoreError::Page {
                    message: e.to_string(),
                })?;
        }

        Ok(ChromiumPage {
            page,
            config: self.config.clone(),
            closed: AtomicBool::new(false),
        })
    }

    /// Get the browser configuration
    #[must_use]
    pub const fn config(&self) -> &DriverConfig {
        &self.config
    }

    /// Close the browser
    pub async fn close(self) -> StoreResult<()> {
        let mut browser = self.inner.lock().await;
        browser.close().await.map_err(|e| StoreError::BrowserLaunch {
            message: e.to_string(),
        })?;
        self.handle.abort();
        info!("browser closed");
        Ok(())
    }
}

/// Where an element sits and whether it can be interacted with
#[derive(Debug, Clone, Copy, Deserialize)]
struct ElementBox {
    found: bool,
    visible: bool,
    x: f64,
    y: f64,
}

#[derive(Debug, Deserialize)]
struct ElementText {
    found: bool,
    text: String,
}

/// A Chromium tab driven over CDP
#[derive(Debug)]
pub struct ChromiumPage {
    page: CdpPage,
    config: DriverConfig,
    closed: AtomicBool,
}

impl ChromiumPage {
    async fn eval<T: DeserializeOwned>(&self, script: String) -> StoreResult<T> {
        let result = self
            .page
            .evaluate(script)
            .await
            .map_err(|e| StoreError::Script {
                message: e.to_string(),
            })?;
        result.into_value().map_err(|e| StoreError::Script {
            message: e.to_string(),
        })
    }

    async fn probe(&self, locator: &Locator, scroll: bool) -> StoreResult<ElementBox> {
        self.eval(element_box_js(locator, scroll)).await
    }

    /// Auto-wait for an attached, visible element and return its centre
    async fn actionable(&self, locator: &Locator) -> StoreResult<ElementBox> {
        let deadline = Instant::now() + self.config.action_timeout;
        loop {
            let element = self.probe(locator, true).await?;
            if element.found && element.visible {
                return Ok(element);
            }
            if Instant::now() >= deadline {
                return Err(StoreError::ElementNotFound {
                    selector: locator.to_string(),
                });
            }
            tokio::time::sleep(Duration::from_millis(DEFAULT_POLL_INTERVAL_MS)).await;
        }
    }

    async fn wait_for_load_state(
        &self,
        state: LoadState,
        url: &str,
        deadline: Instant,
    ) -> StoreResult<()> {
        let mut tracker = NetworkIdleTracker::default();
        loop {
            // the old execution context may be gone mid-navigation
            let (ready, resources): (bool, usize) =
                match self.eval(state.ready_probe_js().to_string()).await {
                    Ok(sample) => sample,
                    Err(e) => {
                        debug!(error = %e, "load state not readable yet");
                        (false, 0)
                    }
                };
            let settled = match state {
                LoadState::NetworkIdle => tracker.observe(ready, resources, Instant::now()),
                LoadState::Load | LoadState::DomContentLoaded => ready,
            };
            if settled {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(StoreError::Navigation {
                    url: url.to_string(),
                    message: format!("{state} not reached in time"),
                });
            }
            tokio::time::sleep(Duration::from_millis(DEFAULT_POLL_INTERVAL_MS)).await;
        }
    }

    async fn document_mark(&self) -> StoreResult<DocumentMark> {
        let sample: (String, u64, String) = self.eval(DocumentMark::SAMPLE_JS.to_string()).await?;
        Ok(DocumentMark::from(sample))
    }

    /// Wait out a navigation the last click started, if it started one
    async fn settle_after_click(&self, before: &DocumentMark) -> StoreResult<()> {
        let window = Instant::now() + Duration::from_millis(CLICK_NAVIGATION_WINDOW_MS);
        loop {
            let navigated = match self.document_mark().await {
                Ok(after) => after.navigated_from(before),
                Err(_) => true,
            };
            if navigated {
                debug!(from = %before.href, "click started a navigation");
                let deadline = Instant::now() + self.config.navigation_timeout;
                return self
                    .wait_for_load_state(LoadState::NetworkIdle, &before.href, deadline)
                    .await;
            }
            if Instant::now() >= window {
                return Ok(());
            }
            tokio::time::sleep(Duration::from_millis(DEFAULT_POLL_INTERVAL_MS)).await;
        }
    }

    async fn write_value(&self, script: String, locator: &Locator, what: &str) -> StoreResult<()> {
        self.actionable(locator).await?;
        let applied: bool = self.eval(script).await?;
        if applied {
            Ok(())
        } else {
            Err(StoreError::Page {
                message: format!("{locator} rejected {what}"),
            })
        }
    }
}

#[async_trait]
impl PageDriver for ChromiumPage {
    async fn goto(&self, url: &str, timeout_ms: u64) -> StoreResult<()> {
        let deadline = Instant::now() + Duration::from_millis(timeout_ms);
        tokio::time::timeout(Duration::from_millis(timeout_ms), self.page.goto(url))
            .await
            .map_err(|_| StoreError::Navigation {
                url: url.to_string(),
                message: format!("no response within {timeout_ms}ms"),
            })?
            .map_err(|e| StoreError::Navigation {
                url: url.to_string(),
                message: e.to_string(),
            })?;
        self.wait_for_load_state(LoadState::NetworkIdle, url, deadline)
            .await?;
        debug!(url, "network idle");
        Ok(())
    }

    async fn title(&self) -> StoreResult<String> {
        let title = self.page.get_title().await.map_err(|e| StoreError::Page {
            message: e.to_string(),
        })?;
        Ok(title.unwrap_or_default())
    }

    async fn current_url(&self) -> StoreResult<String> {
        let url = self.page.url().await.map_err(|e| StoreError::Page {
            message: e.to_string(),
        })?;
        Ok(url.unwrap_or_default())
    }

    async fn count(&self, locator: &Locator) -> StoreResult<usize> {
        self.eval(locator.to_count_js()).await
    }

    async fn is_visible(&self, locator: &Locator) -> StoreResult<bool> {
        let element = self.probe(locator, false).await?;
        Ok(element.found && element.visible)
    }

    async fn inner_text(&self, locator: &Locator) -> StoreResult<String> {
        self.actionable(locator).await?;
        let read: ElementText = self.eval(inner_text_js(locator)).await?;
        if read.found {
            Ok(read.text)
        } else {
            Err(StoreError::ElementNotFound {
                selector: locator.to_string(),
            })
        }
    }

    async fn click(&self, locator: &Locator) -> StoreResult<()> {
        let element = self.actionable(locator).await?;
        let before = self.document_mark().await?;
        self.page
            .click(Point::new(element.x, element.y))
            .await
            .map_err(|e| StoreError::Page {
                message: e.to_string(),
            })?;
        self.settle_after_click(&before).await
    }

    async fn hover(&self, locator: &Locator) -> StoreResult<()> {
        let element = self.actionable(locator).await?;
        self.page
            .move_mouse(Point::new(element.x, element.y))
            .await
            .map_err(|e| StoreError::Page {
                message: e.to_string(),
            })?;
        Ok(())
    }

    async fn fill(&self, locator: &Locator, value: &str) -> StoreResult<()> {
        self.write_value(fill_js(locator, value), locator, "input")
            .await
    }

    async fn select_option(&self, locator: &Locator, value: &str) -> StoreResult<()> {
        self.write_value(
            select_option_js(locator, value),
            locator,
            &format!("option {value:?}"),
        )
        .await
    }

    async fn scroll_into_view(&self, locator: &Locator) -> StoreResult<()> {
        self.actionable(locator).await.map(|_| ())
    }

    async fn wait_for_visible(&self, locator: &Locator, timeout_ms: u64) -> StoreResult<()> {
        let options = WaitOptions::new().with_timeout(timeout_ms);
        let result = poll_until(&options, move || async move {
            let element = self.probe(locator, false).await?;
            Ok(element.found && element.visible)
        })
        .await?;
        if result.success {
            Ok(())
        } else {
            Err(StoreError::Timeout {
                selector: locator.to_string(),
                ms: timeout_ms,
            })
        }
    }

    async fn screenshot(&self) -> StoreResult<Screenshot> {
        let params = CaptureScreenshotParams::builder()
            .format(CaptureScreenshotFormat::Png)
            .build();

        let screenshot = self
            .page
            .execute(params)
            .await
            .map_err(|e| StoreError::Screenshot {
                message: e.to_string(),
            })?;

        use base64::Engine;
        let data = base64::engine::general_purpose::STANDARD
            .decode(&screenshot.data)
            .map_err(|e| StoreError::Screenshot {
                message: e.to_string(),
            })?;
        Ok(Screenshot::new(
            data,
            self.config.viewport_width,
            self.config.viewport_height,
        ))
    }

    async fn close(&self) -> StoreResult<()> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        self.page
            .clone()
            .close()
            .await
            .map_err(|e| StoreError::Page {
                message: e.to_string(),
            })?;
        debug!("page closed");
        Ok(())
    }
}

// =============================================================================
// Page-side scripts
// =============================================================================

fn element_box_js(locator: &Locator, scroll: bool) -> String {
    let scroll = if scroll {
        "el.scrollIntoView({block: 'center', inline: 'center'});"
    } else {
        ""
    };
    format!(
        "(() => {{\n  const el = {query}[0];\n  if (!el) return {{found: false, visible: false, x: 0, y: 0}};\n  {scroll}\n  const r = el.getBoundingClientRect();\n  const s = getComputedStyle(el);\n  const visible = r.width > 0 && r.height > 0 && s.visibility !== 'hidden' && s.display !== 'none';\n  return {{found: true, visible, x: r.left + r.width / 2, y: r.top + r.height / 2}};\n}})()",
        query = locator.to_elements_js(),
    )
}

fn inner_text_js(locator: &Locator) -> String {
    format!(
        "(() => {{\n  const el = {query}[0];\n  if (!el) return {{found: false, text: ''}};\n  return {{found: true, text: el.innerText ?? el.textContent ?? ''}};\n}})()",
        query = locator.to_elements_js(),
    )
}

fn fill_js(locator: &Locator, value: &str) -> String {
    format!(
        "(() => {{\n  const el = {query}[0];\n  if (!el || !('value' in el)) return false;\n  el.focus();\n  el.value = {value};\n  el.dispatchEvent(new Event('input', {{bubbles: true}}));\n  el.dispatchEvent(new Event('change', {{bubbles: true}}));\n  return true;\n}})()",
        query = locator.to_elements_js(),
        value = js_string(value),
    )
}

fn select_option_js(locator: &Locator, value: &str) -> String {
    format!(
        "(() => {{\n  const el = {query}[0];\n  if (!el || !el.options) return false;\n  const wanted = {value};\n  const option = Array.from(el.options).find(o => o.value === wanted || o.label.trim() === wanted || o.text.trim() === wanted);\n  if (!option) return false;\n  el.value = option.value;\n  el.dispatchEvent(new Event('input', {{bubbles: true}}));\n  el.dispatchEvent(new Event('change', {{bubbles: true}}));\n  return true;\n}})()",
        query = locator.to_elements_js(),
        value = js_string(value),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    mod script_tests {
        use super::*;

        #[test]
        fn test_element_box_scrolls_only_for_actions() {
            let locator = Locator::new("#submit");
            assert!(element_box_js(&locator, true).contains("scrollIntoView"));
            assert!(!element_box_js(&locator, false).contains("scrollIntoView"));
        }

        #[test]
        fn test_fill_escapes_value() {
            let script = fill_js(&Locator::new("#address1"), "12 \"Main\" St");
            assert!(script.contains(r#"el.value = "12 \"Main\" St";"#));
            assert!(script.contains("'input'"));
        }

        #[test]
        fn test_select_matches_value_or_label() {
            let script = select_option_js(&Locator::new("#country"), "India");
            assert!(script.contains(r#"const wanted = "India";"#));
            assert!(script.contains("o.label.trim() === wanted"));
        }

        #[test]
        fn test_inner_text_never_returns_null() {
            let script = inner_text_js(&Locator::new(".alert-success"));
            assert!(script.contains("found: false, text: ''"));
        }
    }
}
