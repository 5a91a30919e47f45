//! Result and error types for the storefront suite.

use thiserror::Error;

/// Result type for page-object operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors raised by primitives, composite actions and the fixture layer
#[derive(Debug, Error)]
pub enum StoreError {
    /// An action could not resolve its locator within the action timeout
    #[error("Element not found: {selector}")]
    ElementNotFound {
        /// Locator that failed to resolve
        selector: String,
    },

    /// A bounded wait expired before the locator became visible
    #[error("Timed out after {ms}ms waiting for {selector}")]
    Timeout {
        /// Locator being waited on
        selector: String,
        /// Timeout in milliseconds
        ms: u64,
    },

    /// Expected vs actual mismatch
    #[error("Assertion failed: {message}")]
    AssertionFailed {
        /// Error message
        message: String,
    },

    /// Navigation error
    #[error("Navigation to {url} failed: {message}")]
    Navigation {
        /// URL that failed
        url: String,
        /// Error message
        message: String,
    },

    /// Browser launch error
    #[error("Failed to launch browser: {message}")]
    BrowserLaunch {
        /// Error message
        message: String,
    },

    /// Page-level CDP failure
    #[error("Page error: {message}")]
    Page {
        /// Error message
        message: String,
    },

    /// Screenshot error
    #[error("Screenshot failed: {message}")]
    Screenshot {
        /// Error message
        message: String,
    },

    /// In-page script evaluation failed
    #[error("Script evaluation failed: {message}")]
    Script {
        /// Error message
        message: String,
    },

    /// Session recording error
    #[error("Recording failed: {message}")]
    Recording {
        /// Error message
        message: String,
    },

    /// Fixture error (setup/teardown failed)
    #[error("Fixture error: {message}")]
    Fixture {
        /// Error message
        message: String,
    },

    /// Invalid suite configuration
    #[error("Invalid configuration: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// A scenario body panicked
    #[error("Scenario panicked: {message}")]
    Panicked {
        /// Panic payload rendered as text
        message: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl StoreError {
    /// Build an assertion failure
    #[must_use]
    pub fn assertion(message: impl Into<String>) -> Self {
        Self::AssertionFailed {
            message: message.into(),
        }
    }

    /// Check if this is a bounded-wait expiry
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// Check if this is an unresolved locator
    #[must_use]
    pub const fn is_element_not_found(&self) -> bool {
        matches!(self, Self::ElementNotFound { .. })
    }

    /// Check if this is an expected-vs-actual mismatch
    #[must_use]
    pub const fn is_assertion(&self) -> bool {
        matches!(self, Self::AssertionFailed { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_predicates() {
        let timeout = StoreError::Timeout {
            selector: "#submit".to_string(),
            ms: 15_000,
        };
        assert!(timeout.is_timeout());
        assert!(!timeout.is_assertion());

        let missing = StoreError::ElementNotFound {
            selector: "#cart_info".to_string(),
        };
        assert!(missing.is_element_not_found());

        assert!(StoreError::assertion("cart is empty").is_assertion());
    }

    #[test]
    fn test_display_includes_context() {
        let err = StoreError::Timeout {
            selector: "p:has-text('Congratulations')".to_string(),
            ms: 15_000,
        };
        let text = err.to_string();
        assert!(text.contains("15000ms"));
        assert!(text.contains("Congratulations"));
    }
}
