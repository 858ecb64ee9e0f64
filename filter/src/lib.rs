// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Rendering of filter expressions in the monitoring engine's filter grammar.
//!
//! The produced text is not validated against that grammar: a malformed expression is only
//! detected when the engine parses the generated configuration.

#![deny(clippy::all, clippy::pedantic)]

mod expr;
mod predicate;

pub use expr::{FilterExpr, build, combine};
pub use predicate::{AddrField, AddrMatch, AddrOp, Predicate, Protocol};
