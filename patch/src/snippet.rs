// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Source snippets injected in the anchored regions of a runtime definition.

use std::fmt::Display;

/// Indentation, in tabs, of the items of the subscriptions and callbacks vectors
pub const ITEM_INDENT: usize = 3;

fn tabs(n: usize) -> String {
    "\t".repeat(n)
}

/// One `SubscribableTypeId::Connection` item per subscription, one per line.
#[must_use]
pub fn subscriptions(count: usize) -> String {
    let item = format!("{}SubscribableTypeId::Connection,\n", tabs(ITEM_INDENT));
    format!("\n{}{}", item.repeat(count), tabs(ITEM_INDENT - 1))
}

/// One boxed connection callback per subscription, one per line.
#[must_use]
pub fn callbacks(count: usize) -> String {
    let pre = tabs(ITEM_INDENT);
    let item = format!(
        "{pre}Box::new(|d| {{\n\
         {pre}\tif let SubscribedData::Connection(conn) = d {{\n\
         {pre}\t\tcallback_conn(conn);\n\
         {pre}\t}}\n\
         {pre}}}),\n"
    );
    format!("\n{}{}", item.repeat(count), tabs(ITEM_INDENT - 1))
}

/// A string literal holding the filters, one per line.
#[must_use]
pub fn filter_attribute<T: Display>(filters: impl IntoIterator<Item = T>) -> String {
    let lines: Vec<_> = filters.into_iter().map(|f| f.to_string()).collect();
    format!("\"{}\"", lines.join("\n"))
}
