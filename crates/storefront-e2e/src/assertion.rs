//! Assertions for scenario validation.
//!
//! Every check produces an [`AssertionResult`]; [`AssertionResult::into_result`]
//! turns a failed check into [`StoreError::AssertionFailed`] so scenarios can
//! use `?` and the report marks the step `failed` rather than `broken`.

use crate::result::{StoreError, StoreResult};
use std::fmt::Debug;

/// Result of an assertion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssertionResult {
    /// Whether the assertion passed
    pub passed: bool,
    /// Human-readable message
    pub message: String,
}

impl AssertionResult {
    /// Create a passing assertion result
    #[must_use]
    pub const fn pass() -> Self {
        Self {
            passed: true,
            message: String::new(),
        }
    }

    /// Create a failing assertion result
    #[must_use]
    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            passed: false,
            message: message.into(),
        }
    }

    /// `Ok(())` when passed, otherwise an assertion error
    pub fn into_result(self) -> StoreResult<()> {
        if self.passed {
            Ok(())
        } else {
            Err(StoreError::assertion(self.message))
        }
    }
}

/// Assertion helpers
#[derive(Debug, Clone, Copy)]
pub struct Assertion;

impl Assertion {
    /// Assert two values are equal
    #[must_use]
    pub fn equals<T: PartialEq + Debug>(expected: &T, actual: &T) -> AssertionResult {
        if expected == actual {
            AssertionResult::pass()
        } else {
            AssertionResult::fail(format!("expected {expected:?}, got {actual:?}"))
        }
    }

    /// Assert a string contains a substring
    #[must_use]
    pub fn contains(haystack: &str, needle: &str) -> AssertionResult {
        if haystack.contains(needle) {
            AssertionResult::pass()
        } else {
            AssertionResult::fail(format!("expected '{haystack}' to contain '{needle}'"))
        }
    }

    /// Assert a condition is true
    #[must_use]
    pub fn is_true(condition: bool, message: &str) -> AssertionResult {
        if condition {
            AssertionResult::pass()
        } else {
            AssertionResult::fail(message)
        }
    }
}

/// Fail with `message` unless `condition` holds
pub fn expect_that(condition: bool, message: &str) -> StoreResult<()> {
    Assertion::is_true(condition, message).into_result()
}

/// Fail unless `expected == actual`, naming both values
pub fn expect_eq<T: PartialEq + Debug>(expected: &T, actual: &T, context: &str) -> StoreResult<()> {
    let result = Assertion::equals(expected, actual);
    if result.passed {
        Ok(())
    } else {
        Err(StoreError::assertion(format!("{context}: {}", result.message)))
    }
}

/// Fail unless `haystack` contains `needle`
pub fn expect_contains(haystack: &str, needle: &str) -> StoreResult<()> {
    Assertion::contains(haystack, needle).into_result()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equals() {
        assert!(Assertion::equals(&2, &2).passed);
        let fail = Assertion::equals(&2, &3);
        assert!(!fail.passed);
        assert_eq!(fail.message, "expected 2, got 3");
    }

    #[test]
    fn test_contains() {
        assert!(Assertion::contains("Congratulations! Your order has been confirmed!", "Congratulations").passed);
        assert!(!Assertion::contains("Order failed", "Congratulations").passed);
    }

    #[test]
    fn test_into_result_maps_to_assertion_error() {
        assert!(AssertionResult::pass().into_result().is_ok());
        let err = AssertionResult::fail("nope").into_result().unwrap_err();
        assert!(err.is_assertion());
    }

    #[test]
    fn test_expect_helpers() {
        assert!(expect_that(true, "unused").is_ok());
        assert!(expect_that(false, "User should be logged in").is_err());
        let err = expect_eq(&2_usize, &1_usize, "cart items").unwrap_err();
        assert_eq!(err.to_string(), "Assertion failed: cart items: expected 2, got 1");
        assert!(expect_contains("Logged in as Ada", "Ada").is_ok());
    }
}
