// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

use crate::predicate::{AddrMatch, Predicate};
use std::fmt::{Display, Formatter};

/// A filter expression: a conjunction of predicates, optionally widened by trailing disjuncts.
///
/// `a and b or c` is rendered without parentheses; precedence is left to the consuming engine's
/// grammar, where `and` binds tighter than `or`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FilterExpr {
    all: Vec<Predicate>,
    widened_by: Vec<Predicate>,
}

impl FilterExpr {
    #[must_use]
    pub fn new(first: impl Into<Predicate>) -> Self {
        Self {
            all: vec![first.into()],
            widened_by: Vec::new(),
        }
    }

    /// Conjoin one more predicate.
    #[must_use]
    pub fn and(mut self, predicate: impl Into<Predicate>) -> Self {
        self.all.push(predicate.into());
        self
    }

    /// Widen the expression with a catch-all disjunct.
    #[must_use]
    pub fn or(mut self, predicate: impl Into<Predicate>) -> Self {
        self.widened_by.push(predicate.into());
        self
    }
}

impl From<Predicate> for FilterExpr {
    fn from(value: Predicate) -> Self {
        FilterExpr::new(value)
    }
}

impl Display for FilterExpr {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for (n, p) in self.all.iter().enumerate() {
            if n > 0 {
                write!(f, " and ")?;
            }
            write!(f, "{p}")?;
        }
        for p in &self.widened_by {
            write!(f, " or {p}")?;
        }
        Ok(())
    }
}

/// Build the filter matching one address block, conjoined with `extra` predicates.
#[must_use]
pub fn build(addr: AddrMatch, extra: impl IntoIterator<Item = Predicate>) -> FilterExpr {
    extra.into_iter().fold(FilterExpr::new(addr), FilterExpr::and)
}

/// Combine several expressions into a single one matching any of them: `(a) or (b) or ...`.
///
/// Each member is parenthesized so that its own `and`/`or` structure is preserved.
#[must_use]
pub fn combine<T: Display>(exprs: impl IntoIterator<Item = T>) -> String {
    exprs
        .into_iter()
        .map(|e| format!("({e})"))
        .collect::<Vec<_>>()
        .join(" or ")
}
