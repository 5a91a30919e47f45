//! Test reporting in the Allure 2 results format.
//!
//! A [`Report`] is a cheap handle shared by the fixture and every page
//! object of one test. Composite actions open steps with
//! [`Report::run_step`] (or hold a [`StepGuard`] directly); screenshots and
//! text notes attach to the innermost open step. When the test finishes the
//! fixture writes `<uuid>-result.json` plus one file per attachment, the
//! layout `allure generate` consumes.
//!
//! ```text
//! test ─┬─ step "Register new user" ─┬─ step "Fill signup form"
//!       │                            └─ attachment "account_created" (png)
//!       └─ attachment "failure_screenshot" (png)
//! ```

use crate::result::{StoreError, StoreResult};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, warn};
use uuid::Uuid;

/// Outcome of a test or step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestStatus {
    /// Completed without error
    #[default]
    Passed,
    /// An expectation did not hold
    Failed,
    /// Anything else went wrong (missing element, timeout, crash)
    Broken,
    /// Not run
    Skipped,
}

impl TestStatus {
    /// Check if status is passing
    #[must_use]
    pub const fn is_passed(&self) -> bool {
        matches!(self, Self::Passed)
    }

    /// Check if status is failing or broken
    #[must_use]
    pub const fn is_failed(&self) -> bool {
        matches!(self, Self::Failed | Self::Broken)
    }

    /// Classify an error: mismatches fail, everything else breaks
    #[must_use]
    pub fn from_error(error: &StoreError) -> Self {
        match error {
            StoreError::AssertionFailed { .. } => Self::Failed,
            StoreError::Panicked { message } if message.starts_with("assertion") => Self::Failed,
            _ => Self::Broken,
        }
    }
}

/// Allure severity label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Blocks further testing
    Blocker,
    /// Core journey
    Critical,
    /// Regular feature
    #[default]
    Normal,
    /// Cosmetic
    Minor,
    /// Negligible
    Trivial,
}

impl Severity {
    /// Label value as Allure spells it
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Blocker => "blocker",
            Self::Critical => "critical",
            Self::Normal => "normal",
            Self::Minor => "minor",
            Self::Trivial => "trivial",
        }
    }
}

/// Static description of one test: name, labels and markers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TestMeta {
    /// Test name
    pub name: &'static str,
    /// Human readable description
    pub description: &'static str,
    /// Epic label
    pub epic: &'static str,
    /// Feature label
    pub feature: &'static str,
    /// Story label
    pub story: &'static str,
    /// Severity label
    pub severity: Severity,
    /// Selection markers (`smoke`, `regression`, `cart`, `checkout`)
    pub markers: &'static [&'static str],
}

impl TestMeta {
    /// Metadata with only a name
    #[must_use]
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            description: "",
            epic: "",
            feature: "",
            story: "",
            severity: Severity::Normal,
            markers: &[],
        }
    }

    /// Set description
    #[must_use]
    pub const fn description(mut self, description: &'static str) -> Self {
        self.description = description;
        self
    }

    /// Set epic
    #[must_use]
    pub const fn epic(mut self, epic: &'static str) -> Self {
        self.epic = epic;
        self
    }

    /// Set feature
    #[must_use]
    pub const fn feature(mut self, feature: &'static str) -> Self {
        self.feature = feature;
        self
    }

    /// Set story
    #[must_use]
    pub const fn story(mut self, story: &'static str) -> Self {
        self.story = story;
        self
    }

    /// Set severity
    #[must_use]
    pub const fn severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    /// Set markers
    #[must_use]
    pub const fn markers(mut self, markers: &'static [&'static str]) -> Self {
        self.markers = markers;
        self
    }

    /// Check for a marker
    #[must_use]
    pub fn has_marker(&self, marker: &str) -> bool {
        self.markers.iter().any(|m| *m == marker)
    }

    fn labels(&self) -> Vec<Label> {
        let mut labels = Vec::new();
        for (name, value) in [
            ("epic", self.epic),
            ("feature", self.feature),
            ("story", self.story),
        ] {
            if !value.is_empty() {
                labels.push(Label::new(name, value));
            }
        }
        labels.push(Label::new("severity", self.severity.as_str()));
        labels.extend(self.markers.iter().map(|m| Label::new("tag", m)));
        labels.push(Label::new("framework", "storefront-e2e"));
        labels.push(Label::new("language", "rust"));
        labels
    }
}

// =============================================================================
// Allure result model
// =============================================================================

/// Execution stage (always `finished` once written)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    /// Still running
    Running,
    /// Done
    Finished,
}

/// Failure message and trace
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusDetails {
    /// Short message
    pub message: String,
    /// Longer trace, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace: Option<String>,
}

/// Reference to an attachment file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    /// Display name
    pub name: String,
    /// File name relative to the results directory
    pub source: String,
    /// MIME type
    #[serde(rename = "type")]
    pub mime_type: String,
}

/// A `name=value` label
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    /// Label name
    pub name: String,
    /// Label value
    pub value: String,
}

impl Label {
    fn new(name: &str, value: &str) -> Self {
        Self {
            name: name.to_string(),
            value: value.to_string(),
        }
    }
}

/// One step of the step tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepResult {
    /// Step title
    pub name: String,
    /// Outcome
    pub status: TestStatus,
    /// Failure details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_details: Option<StatusDetails>,
    /// Stage
    pub stage: Stage,
    /// Nested steps
    pub steps: Vec<StepResult>,
    /// Attachments made while this step was innermost
    pub attachments: Vec<Attachment>,
    /// Start, epoch millis
    pub start: i64,
    /// Stop, epoch millis
    pub stop: i64,
}

impl StepResult {
    fn open(name: String) -> Self {
        Self {
            name,
            status: TestStatus::Passed,
            status_details: None,
            stage: Stage::Running,
            steps: Vec::new(),
            attachments: Vec::new(),
            start: now_millis(),
            stop: 0,
        }
    }

    fn close(&mut self, status: TestStatus, details: Option<StatusDetails>) {
        self.status = status;
        self.status_details = details;
        self.stage = Stage::Finished;
        self.stop = now_millis();
    }
}

/// Top-level `*-result.json` document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllureResult {
    /// Result id, also the file name prefix
    pub uuid: String,
    /// Stable id across runs of the same test
    pub history_id: String,
    /// Fully qualified test name
    pub full_name: String,
    /// Test name
    pub name: String,
    /// Description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Outcome
    pub status: TestStatus,
    /// Failure details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_details: Option<StatusDetails>,
    /// Stage
    pub stage: Stage,
    /// Top-level steps
    pub steps: Vec<StepResult>,
    /// Test-level attachments
    pub attachments: Vec<Attachment>,
    /// Labels
    pub labels: Vec<Label>,
    /// Start, epoch millis
    pub start: i64,
    /// Stop, epoch millis
    pub stop: i64,
}

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

// =============================================================================
// Report handle
// =============================================================================

#[derive(Debug)]
struct ReportState {
    result: AllureResult,
    open: Vec<StepResult>,
    files: Vec<(String, Vec<u8>)>,
    finished: bool,
}

impl ReportState {
    fn attach_to_innermost(&mut self, attachment: Attachment) {
        match self.open.last_mut() {
            Some(step) => step.attachments.push(attachment),
            None => self.result.attachments.push(attachment),
        }
    }

    /// Pop steps down to `depth`, marking any abandoned inner steps broken
    fn close_to(&mut self, depth: usize, status: TestStatus, details: Option<StatusDetails>) {
        while self.open.len() > depth {
            let Some(mut step) = self.open.pop() else {
                break;
            };
            if self.open.len() == depth {
                step.close(status, details.clone());
            } else {
                step.close(
                    TestStatus::Broken,
                    Some(StatusDetails {
                        message: "step left open by an inner scope".to_string(),
                        trace: None,
                    }),
                );
            }
            match self.open.last_mut() {
                Some(parent) => parent.steps.push(step),
                None => self.result.steps.push(step),
            }
        }
    }
}

/// Shared handle to the report of one test
#[derive(Debug, Clone)]
pub struct Report {
    state: Arc<Mutex<ReportState>>,
}

impl Report {
    /// Start a report for a test
    #[must_use]
    pub fn new(meta: &TestMeta) -> Self {
        let full_name = format!("storefront_e2e::scenarios::{}", meta.name);
        let result = AllureResult {
            uuid: Uuid::new_v4().to_string(),
            history_id: full_name.clone(),
            full_name,
            name: meta.name.to_string(),
            description: (!meta.description.is_empty()).then(|| meta.description.to_string()),
            status: TestStatus::Passed,
            status_details: None,
            stage: Stage::Running,
            steps: Vec::new(),
            attachments: Vec::new(),
            labels: meta.labels(),
            start: now_millis(),
            stop: 0,
        };
        Self {
            state: Arc::new(Mutex::new(ReportState {
                result,
                open: Vec::new(),
                files: Vec::new(),
                finished: false,
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ReportState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Open a step; it closes when the guard is consumed or dropped
    #[must_use]
    pub fn step(&self, name: impl Into<String>) -> StepGuard {
        let name = name.into();
        debug!(step = %name, "step started");
        let mut state = self.lock();
        state.open.push(StepResult::open(name));
        StepGuard {
            report: self.clone(),
            depth: state.open.len(),
            done: false,
        }
    }

    /// Run `body` inside a step and record its outcome
    pub async fn run_step<T, F>(&self, name: impl Into<String>, body: F) -> StoreResult<T>
    where
        F: Future<Output = StoreResult<T>>,
    {
        let guard = self.step(name);
        let outcome = body.await;
        match &outcome {
            Ok(_) => guard.pass(),
            Err(error) => guard.fail(error),
        }
        outcome
    }

    fn attach(&self, name: &str, extension: &str, mime_type: &str, content: Vec<u8>) {
        let mut state = self.lock();
        let source = format!("{}-attachment.{extension}", Uuid::new_v4());
        state.files.push((source.clone(), content));
        state.attach_to_innermost(Attachment {
            name: name.to_string(),
            source,
            mime_type: mime_type.to_string(),
        });
    }

    /// Attach a text note
    pub fn attach_text(&self, name: &str, content: impl Into<String>) {
        self.attach(name, "txt", "text/plain", content.into().into_bytes());
    }

    /// Attach a PNG image
    pub fn attach_png(&self, name: &str, png: Vec<u8>) {
        self.attach(name, "png", "image/png", png);
    }

    /// Record the final outcome; later calls are ignored
    pub fn finish(&self, status: TestStatus, details: Option<String>) {
        let mut state = self.lock();
        if state.finished {
            return;
        }
        state.close_to(
            0,
            TestStatus::Broken,
            Some(StatusDetails {
                message: "test ended inside this step".to_string(),
                trace: None,
            }),
        );
        state.result.status = status;
        state.result.status_details = details.map(|message| StatusDetails {
            message,
            trace: None,
        });
        state.result.stage = Stage::Finished;
        state.result.stop = now_millis();
        state.finished = true;
    }

    /// Final status (passed until finished otherwise)
    #[must_use]
    pub fn status(&self) -> TestStatus {
        self.lock().result.status
    }

    /// Copy of the result document
    #[must_use]
    pub fn snapshot(&self) -> AllureResult {
        self.lock().result.clone()
    }

    /// Number of steps currently open
    #[must_use]
    pub fn open_steps(&self) -> usize {
        self.lock().open.len()
    }

    /// Names of every attachment, depth first
    #[must_use]
    pub fn attachment_names(&self) -> Vec<String> {
        fn collect(steps: &[StepResult], out: &mut Vec<String>) {
            for step in steps {
                out.extend(step.attachments.iter().map(|a| a.name.clone()));
                collect(&step.steps, out);
            }
        }
        let state = self.lock();
        let mut names = Vec::new();
        collect(&state.result.steps, &mut names);
        for step in state.open.iter().rev() {
            names.extend(step.attachments.iter().map(|a| a.name.clone()));
        }
        names.extend(state.result.attachments.iter().map(|a| a.name.clone()));
        names
    }

    /// Write the result and its attachments into `dir`
    pub fn write_allure(&self, dir: &Path) -> StoreResult<PathBuf> {
        std::fs::create_dir_all(dir)?;
        let state = self.lock();
        for (source, content) in &state.files {
            std::fs::write(dir.join(source), content)?;
        }
        let path = dir.join(format!("{}-result.json", state.result.uuid));
        std::fs::write(&path, serde_json::to_vec_pretty(&state.result)?)?;
        debug!(path = %path.display(), "allure result written");
        Ok(path)
    }
}

/// RAII scope of an open step
///
/// Dropping an unfinished guard (early return, panic, cancelled future)
/// records the step as broken.
#[derive(Debug)]
pub struct StepGuard {
    report: Report,
    depth: usize,
    done: bool,
}

impl StepGuard {
    fn close(&mut self, status: TestStatus, details: Option<StatusDetails>) {
        if self.done {
            return;
        }
        self.done = true;
        self.report.lock().close_to(self.depth - 1, status, details);
    }

    /// Close the step as passed
    pub fn pass(mut self) {
        self.close(TestStatus::Passed, None);
    }

    /// Close the step with the status the error maps to
    ///
    /// Only the outermost step logs at `warn`; an error bubbling up through
    /// nested steps is otherwise reported once per level.
    pub fn fail(mut self, error: &StoreError) {
        if self.depth == 1 {
            warn!(error = %error, "step failed");
        } else {
            debug!(error = %error, depth = self.depth, "step failed");
        }
        self.close(
            TestStatus::from_error(error),
            Some(StatusDetails {
                message: error.to_string(),
                trace: None,
            }),
        );
    }
}

impl Drop for StepGuard {
    fn drop(&mut self) {
        self.close(
            TestStatus::Broken,
            Some(StatusDetails {
                message: "step did not complete".to_string(),
                trace: None,
            }),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const META: TestMeta = TestMeta::new("add_products_to_cart")
        .description("Add two products and verify the cart")
        .epic("E-Commerce")
        .feature("Shopping Cart")
        .story("Add Products to Cart")
        .severity(Severity::Normal)
        .markers(&["cart"]);

    mod status_tests {
        use super::*;

        #[test]
        fn test_from_error() {
            assert_eq!(
                TestStatus::from_error(&StoreError::assertion("2 != 3")),
                TestStatus::Failed
            );
            assert_eq!(
                TestStatus::from_error(&StoreError::Timeout {
                    selector: "#cart".to_string(),
                    ms: 10,
                }),
                TestStatus::Broken
            );
            assert_eq!(
                TestStatus::from_error(&StoreError::Panicked {
                    message: "assertion failed: logged_in".to_string(),
                }),
                TestStatus::Failed
            );
        }

        #[test]
        fn test_serialized_lowercase() {
            assert_eq!(
                serde_json::to_string(&TestStatus::Broken).unwrap(),
                "\"broken\""
            );
            assert_eq!(Severity::Critical.as_str(), "critical");
        }
    }

    mod meta_tests {
        use super::*;

        #[test]
        fn test_labels() {
            let labels = META.labels();
            assert!(labels.contains(&Label::new("feature", "Shopping Cart")));
            assert!(labels.contains(&Label::new("severity", "normal")));
            assert!(labels.contains(&Label::new("tag", "cart")));
            assert!(META.has_marker("cart"));
            assert!(!META.has_marker("smoke"));
        }

        #[test]
        fn test_empty_labels_skipped() {
            let labels = TestMeta::new("bare").labels();
            assert!(!labels.iter().any(|l| l.name == "epic"));
        }
    }

    mod step_tests {
        use super::*;

        #[test]
        fn test_nested_steps() {
            let report = Report::new(&META);
            let outer = report.step("Add products");
            let inner = report.step("Add product 1");
            report.attach_text("note", "hello");
            inner.pass();
            outer.pass();

            let result = report.snapshot();
            assert_eq!(result.steps.len(), 1);
            assert_eq!(result.steps[0].steps.len(), 1);
            assert_eq!(result.steps[0].steps[0].attachments[0].name, "note");
            assert_eq!(report.open_steps(), 0);
        }

        #[test]
        fn test_dropped_guard_is_broken() {
            let report = Report::new(&META);
            {
                let _guard = report.step("Abandoned");
            }
            let result = report.snapshot();
            assert_eq!(result.steps[0].status, TestStatus::Broken);
            assert_eq!(result.steps[0].stage, Stage::Finished);
        }

        #[test]
        fn test_outer_close_sweeps_inner() {
            let report = Report::new(&META);
            let outer = report.step("outer");
            let inner = report.step("inner");
            outer.pass();
            drop(inner);
            let result = report.snapshot();
            assert_eq!(result.steps.len(), 1);
            assert_eq!(result.steps[0].status, TestStatus::Passed);
            assert_eq!(result.steps[0].steps[0].status, TestStatus::Broken);
        }

        #[tokio::test]
        async fn test_run_step_records_failure() {
            let report = Report::new(&META);
            let outcome: StoreResult<()> = report
                .run_step("Verify cart", async { Err(StoreError::assertion("2 != 1")) })
                .await;
            assert!(outcome.is_err());
            let step = &report.snapshot().steps[0];
            assert_eq!(step.status, TestStatus::Failed);
            assert!(step
                .status_details
                .as_ref()
                .is_some_and(|d| d.message.contains("2 != 1")));
        }

        #[derive(Clone, Default)]
        struct Captured(Arc<std::sync::Mutex<Vec<u8>>>);

        impl std::io::Write for Captured {
            fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
                self.0.lock().unwrap().extend_from_slice(buf);
                Ok(buf.len())
            }

            fn flush(&mut self) -> std::io::Result<()> {
                Ok(())
            }
        }

        impl Captured {
            fn failures(&self) -> usize {
                String::from_utf8_lossy(&self.0.lock().unwrap())
                    .lines()
                    .filter(|line| line.contains("step failed"))
                    .count()
            }
        }

        fn warn_subscriber(writer: Captured) -> impl tracing::Subscriber + Send + Sync {
            tracing_subscriber::fmt()
                .with_max_level(tracing::Level::WARN)
                .with_ansi(false)
                .with_writer(move || writer.clone())
                .finish()
        }

        #[tokio::test]
        async fn test_nested_failure_warns_once() {
            let captured = Captured::default();
            let _default = tracing::subscriber::set_default(warn_subscriber(captured.clone()));

            let report = Report::new(&META);
            let outcome: StoreResult<()> = report
                .run_step("Step 4: Navigate to products", async {
                    report
                        .run_step("Click products link", async {
                            report
                                .run_step("Click element: a[href='/products']", async {
                                    Err(StoreError::ElementNotFound {
                                        selector: "a[href='/products']".to_string(),
                                    })
                                })
                                .await
                        })
                        .await
                })
                .await;

            assert!(outcome.is_err());
            assert_eq!(captured.failures(), 1);
            let outer = &report.snapshot().steps[0];
            assert_eq!(outer.status, TestStatus::Broken);
            assert_eq!(outer.steps[0].steps[0].status, TestStatus::Broken);
        }

        #[tokio::test]
        async fn test_recovered_inner_failure_does_not_warn() {
            let captured = Captured::default();
            let _default = tracing::subscriber::set_default(warn_subscriber(captured.clone()));

            let report = Report::new(&META);
            report
                .run_step("Verify order placed", async {
                    let placed: StoreResult<()> = report
                        .run_step("Wait for confirmation", async {
                            Err(StoreError::Timeout {
                                selector: "p:has-text('Congratulations')".to_string(),
                                ms: 15_000,
                            })
                        })
                        .await;
                    Ok(placed.is_ok())
                })
                .await
                .unwrap();

            assert_eq!(captured.failures(), 0);
        }

        #[tokio::test]
        async fn test_run_step_passes_value_through() {
            let report = Report::new(&META);
            let count = report.run_step("Count", async { Ok(2_usize) }).await;
            assert_eq!(count.unwrap(), 2);
            assert_eq!(report.snapshot().steps[0].status, TestStatus::Passed);
        }
    }

    mod finish_tests {
        use super::*;

        #[test]
        fn test_finish_closes_open_steps_once() {
            let report = Report::new(&META);
            let guard = report.step("never closed");
            report.finish(TestStatus::Broken, Some("boom".to_string()));
            report.finish(TestStatus::Passed, None);
            drop(guard);

            let result = report.snapshot();
            assert_eq!(result.status, TestStatus::Broken);
            assert_eq!(result.stage, Stage::Finished);
            assert_eq!(result.steps.len(), 1);
            assert_eq!(result.steps[0].status, TestStatus::Broken);
        }

        #[test]
        fn test_write_allure() {
            let dir = tempfile::tempdir().unwrap();
            let report = Report::new(&META);
            report.attach_png("failure_screenshot", crate::driver::BLANK_PNG.to_vec());
            report.finish(TestStatus::Passed, None);
            let path = report.write_allure(dir.path()).unwrap();

            let json: serde_json::Value =
                serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
            assert_eq!(json["status"], "passed");
            assert_eq!(json["name"], "add_products_to_cart");
            let source = json["attachments"][0]["source"].as_str().unwrap();
            assert!(source.ends_with("-attachment.png"));
            assert!(dir.path().join(source).exists());
            assert_eq!(json["attachments"][0]["type"], "image/png");
        }
    }
}
