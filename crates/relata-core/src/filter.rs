//! # Filter Module
//!
//! Declarative include/exclude filters over link attributes.
//!
//! An expression has the form `[-]attribute:pattern`:
//! - `protocol:OGC:.*|ESRI:.*` keeps links whose protocol matches
//! - `-protocol:OGC:.*` keeps links whose protocol does NOT match
//! - `associationType:upstreamData` selects on any other attribute
//!
//! Only the first `:` separates the attribute from the pattern, so patterns may
//! contain colons. Matching is an unanchored regex search. A link without the
//! attribute (or with an empty value) is always excluded, negated or not.

use crate::{Link, RelataError};
use regex::Regex;

const SEPARATOR: char = ':';

/// A parsed filter expression.
#[derive(Debug, Clone)]
pub struct FilterExpression {
    field: String,
    negated: bool,
    pattern: Regex,
}

impl FilterExpression {
    /// Parse an expression.
    ///
    /// Returns `RelataError::MalformedFilter` when the pattern is not a valid
    /// regular expression.
    pub fn parse(expression: &str) -> Result<Self, RelataError> {
        let (selector, pattern) = expression
            .split_once(SEPARATOR)
            .unwrap_or((expression, ""));

        let (field, negated) = match selector.strip_prefix('-') {
            Some(rest) => (rest, true),
            None => (selector, false),
        };

        let pattern = Regex::new(pattern).map_err(|e| RelataError::MalformedFilter {
            expression: expression.to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            field: field.to_string(),
            negated,
            pattern,
        })
    }

    /// The attribute this expression reads.
    #[must_use]
    pub fn field(&self) -> &str {
        &self.field
    }

    /// Whether the match is inverted.
    #[must_use]
    pub fn is_negated(&self) -> bool {
        self.negated
    }

    /// The regex source.
    #[must_use]
    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }

    /// Decide whether one link passes.
    #[must_use]
    pub fn accepts(&self, link: &Link) -> bool {
        match link.attribute(&self.field) {
            Some(value) if !value.is_empty() => self.pattern.is_match(value) != self.negated,
            _ => false,
        }
    }

    /// Produce the filtered sequence. The input is left untouched.
    #[must_use]
    pub fn apply(&self, links: &[Link]) -> Vec<Link> {
        links
            .iter()
            .filter(|link| self.accepts(link))
            .cloned()
            .collect()
    }
}

/// Parse `expression` and apply it to `links` in one step.
pub fn evaluate(links: &[Link], expression: &str) -> Result<Vec<Link>, RelataError> {
    Ok(FilterExpression::parse(expression)?.apply(links))
}

// =============================================================================
// TESTS
// =============================================================================
