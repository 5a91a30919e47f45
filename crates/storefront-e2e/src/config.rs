//! Suite configuration.
//!
//! Defaults reproduce the fixed setup the suite was written for (1920x1080
//! viewport, headless Chromium, reports under `reports/`). Environment
//! variables override individual values:
//!
//! | Variable | Effect |
//! |---|---|
//! | `STOREFRONT_BASE_URL` | site under test |
//! | `STOREFRONT_HEADFUL=1` | show the browser window |
//! | `STOREFRONT_NO_SANDBOX=1` | launch Chromium without its sandbox |
//! | `CHROMIUM_PATH` | browser binary |
//! | `STOREFRONT_REPORT_DIR` | Allure results directory |
//! | `STOREFRONT_VIDEO_DIR` | session recordings directory |
//! | `STOREFRONT_SEED` | seed for test data |
//! | `STOREFRONT_MARKERS` | comma list of markers to run |

use crate::driver::DriverConfig;
use crate::page_object::DEFAULT_BASE_URL;
use crate::recording::RecordingConfig;
use crate::report::TestMeta;
use crate::result::{StoreError, StoreResult};
use crate::wait::Timeouts;
use std::path::PathBuf;
use std::time::Duration;

/// Markers a test can carry
pub const KNOWN_MARKERS: [&str; 4] = ["smoke", "regression", "cart", "checkout"];

/// Configuration shared by every test of a run
#[derive(Debug, Clone, PartialEq)]
pub struct SuiteConfig {
    pub base_url: String,
    pub viewport_width: u32,
    pub viewport_height: u32,
    pub headless: bool,
    /// Keep Chromium's sandbox on
    pub sandbox: bool,
    pub chromium_path: Option<String>,
    /// Where `*-result.json` and attachments are written
    pub report_dir: PathBuf,
    /// Where session recordings are written
    pub video_dir: PathBuf,
    /// Seed for test data; `None` draws fresh data every run
    pub seed: Option<u64>,
    /// Run only tests carrying one of these markers (empty = all)
    pub markers: Vec<String>,
    pub timeouts: Timeouts,
    pub recording: RecordingConfig,
}

impl Default for SuiteConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            viewport_width: 1920,
            viewport_height: 1080,
            headless: true,
            sandbox: true,
            chromium_path: None,
            report_dir: PathBuf::from("reports/allure-results"),
            video_dir: PathBuf::from("reports/videos"),
            seed: None,
            markers: Vec::new(),
            timeouts: Timeouts::default(),
            recording: RecordingConfig::default(),
        }
    }
}

impl SuiteConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults overridden from the process environment
    pub fn from_env() -> StoreResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden through `lookup`
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> StoreResult<Self> {
        let mut config = Self::default();
        if let Some(url) = lookup("STOREFRONT_BASE_URL") {
            config = config.with_base_url(url);
        }
        if let Some(value) = lookup("STOREFRONT_HEADFUL") {
            config.headless = !is_truthy(&value);
        }
        if let Some(value) = lookup("STOREFRONT_NO_SANDBOX") {
            config.sandbox = !is_truthy(&value);
        }
        if let Some(path) = lookup("CHROMIUM_PATH") {
            config.chromium_path = Some(path);
        }
        if let Some(dir) = lookup("STOREFRONT_REPORT_DIR") {
            config.report_dir = PathBuf::from(dir);
        }
        if let Some(dir) = lookup("STOREFRONT_VIDEO_DIR") {
            config.video_dir = PathBuf::from(dir);
        }
        if let Some(seed) = lookup("STOREFRONT_SEED") {
            let seed = seed.trim().parse::<u64>().map_err(|e| StoreError::Config {
                message: format!("STOREFRONT_SEED={seed}: {e}"),
            })?;
            config.seed = Some(seed);
        }
        if let Some(markers) = lookup("STOREFRONT_MARKERS") {
            config.markers = markers
                .split(',')
                .map(str::trim)
                .filter(|m| !m.is_empty())
                .map(str::to_string)
                .collect();
        }
        Ok(config)
    }

    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    #[must_use]
    pub const fn with_viewport(mut self, width: u32, height: u32) -> Self {
        self.viewport_width = width;
        self.viewport_height = height;
        self
    }

    #[must_use]
    pub const fn with_headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    #[must_use]
    pub fn with_report_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.report_dir = dir.into();
        self
    }

    #[must_use]
    pub fn with_video_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.video_dir = dir.into();
        self
    }

    #[must_use]
    pub const fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    #[must_use]
    pub fn with_markers(mut self, markers: &[&str]) -> Self {
        self.markers = markers.iter().map(|m| (*m).to_string()).collect();
        self
    }

    #[must_use]
    pub const fn with_timeouts(mut self, timeouts: Timeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    #[must_use]
    pub const fn with_recording(mut self, recording: RecordingConfig) -> Self {
        self.recording = recording;
        self
    }

    /// Driver-level part of the configuration
    #[must_use]
    pub fn driver_config(&self) -> DriverConfig {
        let mut driver = DriverConfig::new()
            .headless(self.headless)
            .viewport(self.viewport_width, self.viewport_height)
            .navigation_timeout(Duration::from_millis(self.timeouts.navigation_ms))
            .action_timeout(Duration::from_millis(self.timeouts.default_ms));
        if let Some(path) = &self.chromium_path {
            driver = driver.executable_path(path.clone());
        }
        if !self.sandbox {
            driver = driver.no_sandbox();
        }
        driver
    }

    /// Whether the marker filter lets `meta` run
    #[must_use]
    pub fn selects(&self, meta: &TestMeta) -> bool {
        self.markers.is_empty() || self.markers.iter().any(|m| meta.has_marker(m))
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
