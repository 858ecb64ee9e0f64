// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Anchored regions of source text.

use crate::errors::PatchError;
use regex::Regex;
use std::fmt::{Display, Formatter};

/// A region of source text delimited by an opening and a closing token.
///
/// The region body is everything between the first opening token and the nearest closing token
/// after it, newlines included.
#[derive(Debug, Clone)]
pub struct Anchor {
    name: String,
    pattern: Regex,
}

/// Text split around the body of an anchored region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span<'t> {
    /// Everything up to and including the opening token
    pub prefix: &'t str,
    /// The replaceable content
    pub body: &'t str,
    /// The closing token and everything after it
    pub suffix: &'t str,
}

impl Span<'_> {
    /// Reassemble the text with `body` in place of the current one.
    #[must_use]
    pub fn replace(&self, body: &str) -> String {
        let mut out = String::with_capacity(self.prefix.len() + body.len() + self.suffix.len());
        out.push_str(self.prefix);
        out.push_str(body);
        out.push_str(self.suffix);
        out
    }
}

impl Anchor {
    /// Build an anchor from the regular expressions of its opening and closing tokens.
    pub fn new(name: &str, open: &str, close: &str) -> Result<Self, PatchError> {
        let pattern = Regex::new(&format!(r"(?s)({open})(\s*.*?\s*)({close})"))
            .map_err(|e| PatchError::Pattern(name.to_owned(), e.to_string()))?;
        Ok(Self {
            name: name.to_owned(),
            pattern,
        })
    }

    /// The body of `subscriptions: vec![ ... ]`
    pub fn subscriptions() -> Result<Self, PatchError> {
        Self::new("subscriptions", r"subscriptions:\s*vec!\[", r"\]")
    }

    /// The body of `callbacks: vec![ ... ]`
    pub fn callbacks() -> Result<Self, PatchError> {
        Self::new("callbacks", r"callbacks:\s*vec!\[", r"\]")
    }

    /// The body of `#[filter( ... )]`
    pub fn filter_attribute() -> Result<Self, PatchError> {
        Self::new("filter", r"#\[filter\(", r"\)\]")
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Locate the first occurrence of the region in `text`.
    pub fn find<'t>(&self, text: &'t str) -> Result<Span<'t>, PatchError> {
        let captures = self
            .pattern
            .captures(text)
            .ok_or_else(|| PatchError::AnchorNotFound(self.name.clone()))?;
        match (captures.get(1), captures.get(2), captures.get(3)) {
            (Some(open), Some(body), Some(close)) => Ok(Span {
                prefix: &text[..open.end()],
                body: body.as_str(),
                suffix: &text[close.start()..],
            }),
            _ => Err(PatchError::AnchorNotFound(self.name.clone())),
        }
    }

    /// Replace the body of the region in `text`.
    pub fn splice(&self, text: &str, body: &str) -> Result<String, PatchError> {
        Ok(self.find(text)?.replace(body))
    }
}

impl Display for Anchor {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}
