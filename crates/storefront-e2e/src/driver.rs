//! PageDriver - the capability every page object is built on.
//!
//! Pages never talk to a browser directly. They hold an
//! `Arc<dyn PageDriver>` and translate their actions into the small set of
//! primitives below, so the same page objects run against Chromium (feature
//! `browser`) or against [`MockPage`], a scripted in-memory DOM.
//!
//! ```text
//! ┌──────────────┐   Arc<dyn PageDriver>   ┌──────────────────────────┐
//! │ Page objects │ ──────────────────────► │ ChromiumPage (CDP)       │
//! │ + registries │                         │ MockPage (in-memory DOM) │
//! └──────────────┘                         └──────────────────────────┘
//! ```

use crate::locator::Locator;
use crate::result::{StoreError, StoreResult};
use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Screenshot data with metadata
#[derive(Debug, Clone)]
pub struct Screenshot {
    /// Raw PNG data
    pub data: Vec<u8>,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Device pixel ratio
    pub device_pixel_ratio: f64,
    /// Timestamp when screenshot was taken
    pub timestamp: std::time::SystemTime,
}

impl Screenshot {
    /// Create a new screenshot
    #[must_use]
    pub fn new(data: Vec<u8>, width: u32, height: u32) -> Self {
        Self {
            data,
            width,
            height,
            device_pixel_ratio: 1.0,
            timestamp: std::time::SystemTime::now(),
        }
    }

    /// Get the size in bytes
    #[must_use]
    pub fn size_bytes(&self) -> usize {
        self.data.len()
    }

    /// Check if screenshot is valid (has data)
    #[must_use]
    pub fn is_valid(&self) -> bool {
        !self.data.is_empty() && self.width > 0 && self.height > 0
    }
}

/// Browser configuration for driver
#[derive(Debug, Clone)]
pub struct DriverConfig {
    /// Run in headless mode
    pub headless: bool,
    /// Viewport width
    pub viewport_width: u32,
    /// Viewport height
    pub viewport_height: u32,
    /// Device scale factor
    pub device_scale_factor: f64,
    /// User agent string
    pub user_agent: Option<String>,
    /// Timeout for navigation (including network idle)
    pub navigation_timeout: Duration,
    /// How long actions auto-wait for their element
    pub action_timeout: Duration,
    /// Executable path override
    pub executable_path: Option<String>,
    /// Chromium sandbox (disable for containers)
    pub sandbox: bool,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            headless: true,
            viewport_width: 1920,
            viewport_height: 1080,
            device_scale_factor: 1.0,
            user_agent: None,
            navigation_timeout: Duration::from_secs(30),
            action_timeout: Duration::from_secs(10),
            executable_path: None,
            sandbox: true,
        }
    }
}

impl DriverConfig {
    /// Create new config with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set headless mode
    #[must_use]
    pub const fn headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    /// Set viewport dimensions
    #[must_use]
    pub const fn viewport(mut self, width: u32, height: u32) -> Self {
        self.viewport_width = width;
        self.viewport_height = height;
        self
    }

    /// Set device scale factor
    #[must_use]
    pub const fn scale_factor(mut self, factor: f64) -> Self {
        self.device_scale_factor = factor;
        self
    }

    /// Set user agent
    #[must_use]
    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.user_agent = Some(ua.into());
        self
    }

    /// Set navigation timeout
    #[must_use]
    pub const fn navigation_timeout(mut self, timeout: Duration) -> Self {
        self.navigation_timeout = timeout;
        self
    }

    /// Set action auto-wait timeout
    #[must_use]
    pub const fn action_timeout(mut self, timeout: Duration) -> Self {
        self.action_timeout = timeout;
        self
    }

    /// Use a specific chromium binary
    #[must_use]
    pub fn executable_path(mut self, path: impl Into<String>) -> Self {
        self.executable_path = Some(path.into());
        self
    }

    /// Disable the chromium sandbox (for containers/CI)
    #[must_use]
    pub const fn no_sandbox(mut self) -> Self {
        self.sandbox = false;
        self
    }
}

/// Browser page capability consumed by page objects
///
/// Actions (`click`, `hover`, `fill`, `select_option`, `inner_text`,
/// `scroll_into_view`) auto-wait for an attached, visible element and fail
/// with [`StoreError::ElementNotFound`]. `wait_for_visible` is the explicit
/// bounded wait and fails with [`StoreError::Timeout`].
#[async_trait]
pub trait PageDriver: Send + Sync + fmt::Debug {
    /// Navigate and return once the page reports network idle
    async fn goto(&self, url: &str, timeout_ms: u64) -> StoreResult<()>;

    /// Current document title
    async fn title(&self) -> StoreResult<String>;

    /// Current URL
    async fn current_url(&self) -> StoreResult<String>;

    /// Number of elements the locator resolves to right now
    async fn count(&self, locator: &Locator) -> StoreResult<usize>;

    /// Whether the first match is visible right now (no waiting)
    async fn is_visible(&self, locator: &Locator) -> StoreResult<bool>;

    /// Rendered text of the first match
    async fn inner_text(&self, locator: &Locator) -> StoreResult<String>;

    /// Click the first match
    async fn click(&self, locator: &Locator) -> StoreResult<()>;

    /// Move the pointer over the first match
    async fn hover(&self, locator: &Locator) -> StoreResult<()>;

    /// Replace the value of an input or textarea
    async fn fill(&self, locator: &Locator, value: &str) -> StoreResult<()>;

    /// Select a `<select>` option by value or label
    async fn select_option(&self, locator: &Locator, value: &str) -> StoreResult<()>;

    /// Scroll the first match into the viewport
    async fn scroll_into_view(&self, locator: &Locator) -> StoreResult<()>;

    /// Block until the locator resolves to a visible element
    async fn wait_for_visible(&self, locator: &Locator, timeout_ms: u64) -> StoreResult<()>;

    /// Capture the viewport as PNG
    async fn screenshot(&self) -> StoreResult<Screenshot>;

    /// Release the page (idempotent)
    async fn close(&self) -> StoreResult<()>;
}

/// Smallest valid PNG: one transparent pixel
pub const BLANK_PNG: [u8; 67] = [
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44, 0x52,
    0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1F, 0x15, 0xC4,
    0x89, 0x00, 0x00, 0x00, 0x0A, 0x49, 0x44, 0x41, 0x54, 0x78, 0x9C, 0x63, 0x00, 0x01, 0x00, 0x00,
    0x05, 0x00, 0x01, 0x0D, 0x0A, 0x2D, 0xB4, 0x00, 0x00, 0x00, 0x00, 0x49, 0x45, 0x4E, 0x44, 0xAE,
    0x42, 0x60, 0x82,
];

/// One element of the mock DOM
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MockElement {
    /// Rendered text
    pub text: String,
    /// Whether the element is visible
    pub visible: bool,
    /// Value set by `fill` / `select_option`
    pub value: Option<String>,
}

impl MockElement {
    /// A visible element with the given text
    #[must_use]
    pub fn visible(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            visible: true,
            value: None,
        }
    }

    /// An attached but hidden element
    #[must_use]
    pub fn hidden(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            visible: false,
            value: None,
        }
    }
}

/// The scripted page state a [`MockPage`] serves
///
/// Elements are keyed by the display form of a [`Locator`]. A lookup for
/// `sel >> nth=i` that has no entry of its own falls back to the i-th
/// element registered under `sel`.
#[derive(Debug, Default)]
pub struct MockDom {
    /// Current URL
    pub url: String,
    /// Document title
    pub title: String,
    elements: HashMap<String, Vec<MockElement>>,
}

impl MockDom {
    /// Replace the elements a locator resolves to
    pub fn set(&mut self, locator: impl Into<Locator>, elements: Vec<MockElement>) {
        self.elements.insert(key(locator), elements);
    }

    /// Make a locator resolve to a single visible element
    pub fn show(&mut self, locator: impl Into<Locator>, text: impl Into<String>) {
        self.set(locator, vec![MockElement::visible(text)]);
    }

    /// Append an element to a locator's matches
    pub fn push(&mut self, locator: impl Into<Locator>, element: MockElement) {
        self.elements
            .entry(key(locator))
            .or_default()
            .push(element);
    }

    /// Hide every match of a locator, keeping them attached
    pub fn hide(&mut self, locator: impl Into<Locator>) {
        if let Some(elements) = self.elements.get_mut(&key(locator)) {
            for element in elements {
                element.visible = false;
            }
        }
    }

    /// Detach every match of a locator
    pub fn remove(&mut self, locator: impl Into<Locator>) {
        self.elements.remove(&key(locator));
    }

    /// Drop the element at `index` from a locator's matches
    pub fn remove_at(&mut self, locator: impl Into<Locator>, index: usize) {
        if let Some(elements) = self.elements.get_mut(&key(locator)) {
            if index < elements.len() {
                elements.remove(index);
            }
        }
    }

    /// Number of matches registered for a locator
    #[must_use]
    pub fn len_of(&self, locator: impl Into<Locator>) -> usize {
        self.resolve(&locator.into()).len()
    }

    /// Elements the locator currently resolves to
    #[must_use]
    pub fn resolve(&self, locator: &Locator) -> Vec<&MockElement> {
        if let Some(elements) = self.elements.get(&locator.to_string()) {
            return elements.iter().collect();
        }
        match locator.split_last_nth() {
            (base, Some(index)) => self
                .elements
                .get(&base.to_string())
                .and_then(|elements| elements.get(index))
                .into_iter()
                .collect(),
            (_, None) => Vec::new(),
        }
    }

    fn first_mut(&mut self, locator: &Locator) -> Option<&mut MockElement> {
        let key = locator.to_string();
        if self.elements.contains_key(&key) {
            return self.elements.get_mut(&key).and_then(|e| e.first_mut());
        }
        match locator.split_last_nth() {
            (base, Some(index)) => self
                .elements
                .get_mut(&base.to_string())
                .and_then(|elements| elements.get_mut(index)),
            (_, None) => None,
        }
    }

    fn first_visible(&self, locator: &Locator) -> Option<&MockElement> {
        self.resolve(locator).into_iter().find(|e| e.visible)
    }
}

/// Callback run against the DOM when a scripted trigger fires
pub type Reaction = Box<dyn Fn(&mut MockDom) + Send + Sync>;

#[derive(Default)]
struct MockState {
    dom: MockDom,
    on_click: HashMap<String, Vec<Reaction>>,
    on_navigate: HashMap<String, Vec<Reaction>>,
    on_wait: HashMap<String, Vec<Reaction>>,
    call_history: Vec<String>,
    screenshots_taken: usize,
    closed: bool,
}

/// In-memory [`PageDriver`] for unit and integration tests
///
/// Clones share state, so a test can hand one clone to the pages and keep
/// another to script and inspect the DOM.
#[derive(Clone, Default)]
pub struct MockPage {
    state: Arc<Mutex<MockState>>,
}

impl fmt::Debug for MockPage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock();
        f.debug_struct("MockPage")
            .field("url", &state.dom.url)
            .field("elements", &state.dom.elements.len())
            .field("calls", &state.call_history.len())
            .finish()
    }
}

impl MockPage {
    /// Create an empty mock page
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Edit the DOM directly
    pub fn dom<R>(&self, edit: impl FnOnce(&mut MockDom) -> R) -> R {
        edit(&mut self.lock().dom)
    }

    /// Register a visible element
    #[must_use]
    pub fn with_element(self, locator: impl Into<Locator>, text: impl Into<String>) -> Self {
        self.dom(|dom| dom.show(locator, text));
        self
    }

    /// Run `reaction` every time `locator` is clicked
    #[must_use]
    pub fn on_click(
        self,
        locator: impl Into<Locator>,
        reaction: impl Fn(&mut MockDom) + Send + Sync + 'static,
    ) -> Self {
        self.lock()
            .on_click
            .entry(key(locator))
            .or_default()
            .push(Box::new(reaction));
        self
    }

    /// Run `reaction` every time a URL with this path is opened
    #[must_use]
    pub fn on_navigate(
        self,
        path: impl Into<String>,
        reaction: impl Fn(&mut MockDom) + Send + Sync + 'static,
    ) -> Self {
        self.lock()
            .on_navigate
            .entry(path.into())
            .or_default()
            .push(Box::new(reaction));
        self
    }

    /// Run `reaction` when a wait on `locator` starts, before the check
    ///
    /// Models content that renders while the caller is already waiting.
    #[must_use]
    pub fn on_wait(
        self,
        locator: impl Into<Locator>,
        reaction: impl Fn(&mut MockDom) + Send + Sync + 'static,
    ) -> Self {
        self.lock()
            .on_wait
            .entry(key(locator))
            .or_default()
            .push(Box::new(reaction));
        self
    }

    /// Get call history
    #[must_use]
    pub fn history(&self) -> Vec<String> {
        self.lock().call_history.clone()
    }

    /// Check if method was called
    #[must_use]
    pub fn was_called(&self, method: &str) -> bool {
        self.lock()
            .call_history
            .iter()
            .any(|c| c.starts_with(method))
    }

    /// Value last written into the first match of `locator`
    #[must_use]
    pub fn value_of(&self, locator: impl Into<Locator>) -> Option<String> {
        let locator = locator.into();
        self.lock()
            .dom
            .resolve(&locator)
            .first()
            .and_then(|e| e.value.clone())
    }

    /// Number of screenshots captured so far
    #[must_use]
    pub fn screenshots_taken(&self) -> usize {
        self.lock().screenshots_taken
    }

    /// Whether `close` has been called
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    fn record(state: &mut MockState, call: String) {
        state.call_history.push(call);
    }

    fn visible_or_missing(state: &MockState, locator: &Locator) -> StoreResult<()> {
        state
            .dom
            .first_visible(locator)
            .map(|_| ())
            .ok_or_else(|| StoreError::ElementNotFound {
                selector: locator.to_string(),
            })
    }

    fn write_value(&self, call: &str, locator: &Locator, value: &str) -> StoreResult<()> {
        let mut state = self.lock();
        Self::record(&mut state, format!("{call}:{locator}={value}"));
        Self::visible_or_missing(&state, locator)?;
        if let Some(element) = state.dom.first_mut(locator) {
            element.value = Some(value.to_string());
        }
        Ok(())
    }
}

fn key(locator: impl Into<Locator>) -> String {
    let locator: Locator = locator.into();
    locator.to_string()
}

/// Path component of a URL (`https://host/a?b` -> `/a?b`)
fn url_path(url: &str) -> &str {
    let rest = url.split_once("://").map_or(url, |(_, rest)| rest);
    rest.find('/').map_or("/", |i| &rest[i..])
}

#[async_trait]
impl PageDriver for MockPage {
    async fn goto(&self, url: &str, _timeout_ms: u64) -> StoreResult<()> {
        let mut guard = self.lock();
        let state = &mut *guard;
        Self::record(state, format!("goto:{url}"));
        state.dom.url = url.to_string();
        if let Some(reactions) = state.on_navigate.get(url_path(url)) {
            for reaction in reactions {
                reaction(&mut state.dom);
            }
        }
        Ok(())
    }

    async fn title(&self) -> StoreResult<String> {
        Ok(self.lock().dom.title.clone())
    }

    async fn current_url(&self) -> StoreResult<String> {
        Ok(self.lock().dom.url.clone())
    }

    async fn count(&self, locator: &Locator) -> StoreResult<usize> {
        let mut state = self.lock();
        Self::record(&mut state, format!("count:{locator}"));
        Ok(state.dom.resolve(locator).len())
    }

    async fn is_visible(&self, locator: &Locator) -> StoreResult<bool> {
        let mut state = self.lock();
        Self::record(&mut state, format!("is_visible:{locator}"));
        Ok(state
            .dom
            .resolve(locator)
            .first()
            .is_some_and(|e| e.visible))
    }

    async fn inner_text(&self, locator: &Locator) -> StoreResult<String> {
        let mut state = self.lock();
        Self::record(&mut state, format!("inner_text:{locator}"));
        state
            .dom
            .first_visible(locator)
            .map(|e| e.text.clone())
            .ok_or_else(|| StoreError::ElementNotFound {
                selector: locator.to_string(),
            })
    }

    async fn click(&self, locator: &Locator) -> StoreResult<()> {
        let mut guard = self.lock();
        let state = &mut *guard;
        Self::record(state, format!("click:{locator}"));
        Self::visible_or_missing(state, locator)?;
        if let Some(reactions) = state.on_click.get(&locator.to_string()) {
            for reaction in reactions {
                reaction(&mut state.dom);
            }
        }
        Ok(())
    }

    async fn hover(&self, locator: &Locator) -> StoreResult<()> {
        let mut state = self.lock();
        Self::record(&mut state, format!("hover:{locator}"));
        Self::visible_or_missing(&state, locator)
    }

    async fn fill(&self, locator: &Locator, value: &str) -> StoreResult<()> {
        self.write_value("fill", locator, value)
    }

    async fn select_option(&self, locator: &Locator, value: &str) -> StoreResult<()> {
        self.write_value("select_option", locator, value)
    }

    async fn scroll_into_view(&self, locator: &Locator) -> StoreResult<()> {
        let mut state = self.lock();
        Self::record(&mut state, format!("scroll_into_view:{locator}"));
        Self::visible_or_missing(&state, locator)
    }

    async fn wait_for_visible(&self, locator: &Locator, timeout_ms: u64) -> StoreResult<()> {
        let mut guard = self.lock();
        let state = &mut *guard;
        Self::record(state, format!("wait_for_visible:{locator}"));
        if let Some(reactions) = state.on_wait.get(&locator.to_string()) {
            for reaction in reactions {
                reaction(&mut state.dom);
            }
        }
        state
            .dom
            .first_visible(locator)
            .map(|_| ())
            .ok_or_else(|| StoreError::Timeout {
                selector: locator.to_string(),
                ms: timeout_ms,
            })
    }

    async fn screenshot(&self) -> StoreResult<Screenshot> {
        let mut state = self.lock();
        Self::record(&mut state, "screenshot".to_string());
        state.screenshots_taken += 1;
        Ok(Screenshot::new(BLANK_PNG.to_vec(), 1, 1))
    }

    async fn close(&self) -> StoreResult<()> {
        let mut state = self.lock();
        Self::record(&mut state, "close".to_string());
        state.closed = true;
        Ok(())
    }
}
