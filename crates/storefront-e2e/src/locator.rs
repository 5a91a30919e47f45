//! Locator abstraction for element selection.
//!
//! A locator is an opaque reference that is only resolved against the live
//! DOM at action time. Registries store plain selector strings; this module
//! turns them into a chain of steps the drivers can evaluate.
//!
//! Supported selector syntax:
//!
//! - plain CSS: `"#cart_info_table"`, `"tr.cart_menu ~ tr"`
//! - CSS with a text filter: `"a:has-text('Logged in as')"`
//! - chaining with [`Locator::nth`] (0-based) and [`Locator::locator`]
//!   (descendant scope), rendered as `".col-sm-4 >> nth=0 >> .add-to-cart"`

use std::fmt;

const HAS_TEXT: &str = ":has-text(";

/// Selector type for locating elements
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    /// CSS selector (e.g., "button.primary")
    Css(String),
    /// CSS selector narrowed to elements whose text contains `text`
    CssWithText {
        /// Base CSS selector
        css: String,
        /// Text content to match (case-insensitive substring)
        text: String,
    },
}

impl Selector {
    /// Create a CSS selector
    #[must_use]
    pub fn css(selector: impl Into<String>) -> Self {
        Self::Css(selector.into())
    }

    /// Parse a registry selector, recognising a trailing `:has-text('...')`
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let Some(start) = raw.find(HAS_TEXT) else {
            return Self::Css(raw.trim().to_string());
        };

        let rest = &raw[start + HAS_TEXT.len()..];
        let (text, tail) = match rest.chars().next() {
            Some(quote @ ('\'' | '"')) => {
                let body = &rest[1..];
                match body.find(quote) {
                    Some(end) => {
                        let after = &body[end + 1..];
                        (&body[..end], after.strip_prefix(')').unwrap_or(after))
                    }
                    None => (body.trim_end_matches(')'), ""),
                }
            }
            _ => match rest.find(')') {
                Some(end) => (&rest[..end], &rest[end + 1..]),
                None => (rest, ""),
            },
        };

        let css = format!("{}{}", &raw[..start], tail);
        let css = css.trim();
        Self::CssWithText {
            css: if css.is_empty() { "*" } else { css }.to_string(),
            text: text.to_string(),
        }
    }

    /// The CSS part of the selector
    #[must_use]
    pub fn css_part(&self) -> &str {
        match self {
            Self::Css(css) | Self::CssWithText { css, .. } => css,
        }
    }

    /// The text filter, if any
    #[must_use]
    pub fn text_filter(&self) -> Option<&str> {
        match self {
            Self::Css(_) => None,
            Self::CssWithText { text, .. } => Some(text),
        }
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Css(css) => f.write_str(css),
            Self::CssWithText { css, text } => write!(f, "{css}:has-text('{text}')"),
        }
    }
}

/// One hop of a locator chain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocatorStep {
    /// Selector evaluated inside the previous hop's matches
    pub selector: Selector,
    /// Keep only the n-th match (0-based)
    pub nth: Option<usize>,
}

/// A locator for finding elements on the current page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locator {
    steps: Vec<LocatorStep>,
}

impl Locator {
    /// Create a locator from a registry selector string
    #[must_use]
    pub fn new(selector: impl AsRef<str>) -> Self {
        Self::from_selector(Selector::parse(selector.as_ref()))
    }

    /// Create a locator from a selector
    #[must_use]
    pub fn from_selector(selector: Selector) -> Self {
        Self {
            steps: vec![LocatorStep {
                selector,
                nth: None,
            }],
        }
    }

    /// Narrow to the n-th match (0-based)
    #[must_use]
    pub fn nth(mut self, index: usize) -> Self {
        if let Some(last) = self.steps.last_mut() {
            if last.nth.is_some() {
                // `a >> nth=0 >> nth=2`: re-index the already narrowed set
                self.steps.push(LocatorStep {
                    selector: Selector::css(":scope"),
                    nth: Some(index),
                });
            } else {
                last.nth = Some(index);
            }
        }
        self
    }

    /// Scope a child selector inside this locator's matches
    #[must_use]
    pub fn locator(mut self, child: impl Into<Self>) -> Self {
        self.steps.extend(child.into().steps);
        self
    }

    /// The chain of steps
    #[must_use]
    pub fn steps(&self) -> &[LocatorStep] {
        &self.steps
    }

    /// This locator without a trailing `nth`, plus the stripped index
    #[must_use]
    pub fn split_last_nth(&self) -> (Self, Option<usize>) {
        let mut base = self.clone();
        let nth = base.steps.last_mut().and_then(|step| step.nth.take());
        (base, nth)
    }

    /// JavaScript expression evaluating to the ordered array of matches
    #[must_use]
    pub fn to_elements_js(&self) -> String {
        let mut js = String::from(
            "(() => {\n  const norm = s => (s || '').replace(/\\s+/g, ' ').trim().toLowerCase();\n  let found = [document];\n",
        );
        for step in &self.steps {
            // `:scope` re-indexes the current matches instead of descending
            if step.selector.css_part() != ":scope" {
                js.push_str(&format!(
                    "  found = Array.from(new Set(found.flatMap(root => Array.from(root.querySelectorAll({})))));\n",
                    js_string(step.selector.css_part())
                ));
            }
            if let Some(text) = step.selector.text_filter() {
                js.push_str(&format!(
                    "  found = found.filter(el => norm(el.textContent).includes({}));\n",
                    js_string(&normalize_text(text))
                ));
            }
            if let Some(n) = step.nth {
                js.push_str(&format!(
                    "  found = found.length > {n} ? [found[{n}]] : [];\n"
                ));
            }
        }
        js.push_str("  return found;\n})()");
        js
    }

    /// JavaScript expression evaluating to the number of matches
    #[must_use]
    pub fn to_count_js(&self) -> String {
        format!("{}.length", self.to_elements_js())
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, step) in self.steps.iter().enumerate() {
            if i > 0 {
                f.write_str(" >> ")?;
            }
            write!(f, "{}", step.selector)?;
            if let Some(n) = step.nth {
                write!(f, " >> nth={n}")?;
            }
        }
        Ok(())
    }
}

impl From<&str> for Locator {
    fn from(selector: &str) -> Self {
        Self::new(selector)
    }
}

impl From<String> for Locator {
    fn from(selector: String) -> Self {
        Self::new(selector)
    }
}

impl From<&Locator> for Locator {
    fn from(locator: &Locator) -> Self {
        locator.clone()
    }
}

/// Quote a Rust string as a JavaScript string literal
#[must_use]
pub(crate) fn js_string(value: &str) -> String {
    serde_json::Value::String(value.to_string()).to_string()
}

/// Collapse whitespace and lowercase, the way text filters compare
#[must_use]
pub(crate) fn normalize_text(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}
