// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! The subscription configuration consumed by the monitoring engine.
//!
//! All the mappings keep insertion order so that the same synthesis always serializes to the
//! same text.

use ordermap::OrderMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::debug;

use crate::errors::{ConfigError, ConfigResult};

/// Position of a subscription; shared by the filter, callback and subscribed mappings.
pub type SubscriptionIdx = usize;

/// Field projection of a subscribed type: field name to the list of sub-fields requested.
pub type FieldSelection = OrderMap<String, Vec<String>>;

/// Subscribed type name to its declaration.
pub type SubscribedTable = OrderMap<String, Subscribed>;

/// Outcome of mapping a filter to an index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Insertion {
    /// The filter text was not present yet
    New,
    /// The filter text was already present: the index joined its existing entry
    Merged,
}

/// Filter expression to the indices it feeds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FilterTable(OrderMap<String, Vec<SubscriptionIdx>>);

impl FilterTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Map `filter` to `idx`. Textually identical filters share one entry.
    pub fn insert(&mut self, filter: impl Into<String>, idx: SubscriptionIdx) -> Insertion {
        let filter = filter.into();
        if let Some(indices) = self.0.get_mut(&filter) {
            debug!("Filter '{filter}' already present: merging index {idx}");
            indices.push(idx);
            Insertion::Merged
        } else {
            self.0.insert(filter, vec![idx]);
            Insertion::New
        }
    }

    #[must_use]
    pub fn get(&self, filter: &str) -> Option<&[SubscriptionIdx]> {
        self.0.get(filter).map(Vec::as_slice)
    }

    /// The filter expressions, in insertion order.
    pub fn filters(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[SubscriptionIdx])> {
        self.0.iter().map(|(f, i)| (f.as_str(), i.as_slice()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Callback name to the indices that invoke it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CallbackTable(OrderMap<String, Vec<SubscriptionIdx>>);

impl CallbackTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make sure a callback group exists, even if no index ends up invoking it.
    pub fn declare(&mut self, callback: &str) {
        if !self.0.contains_key(callback) {
            self.0.insert(callback.to_owned(), Vec::new());
        }
    }

    pub fn push(&mut self, callback: &str, idx: SubscriptionIdx) {
        if let Some(indices) = self.0.get_mut(callback) {
            indices.push(idx);
        } else {
            self.0.insert(callback.to_owned(), vec![idx]);
        }
    }

    #[must_use]
    pub fn get(&self, callback: &str) -> Option<&[SubscriptionIdx]> {
        self.0.get(callback).map(Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[SubscriptionIdx])> {
        self.0.iter().map(|(c, i)| (c.as_str(), i.as_slice()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Declaration of one subscribed data type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscribed {
    pub idx: Vec<SubscriptionIdx>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields: Option<FieldSelection>,
}

impl Subscribed {
    /// A subscribed type used by indices `0..count`.
    #[must_use]
    pub fn first(count: usize, fields: Option<FieldSelection>) -> Self {
        Self {
            idx: (0..count).collect(),
            fields,
        }
    }
}

/// How filter entries may share indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexMode {
    /// Filters and indices map one-to-one
    Exclusive,
    /// A filter may feed several indices, and an index several filters
    Shared,
}

/// The complete subscription configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Configuration {
    pub filters: FilterTable,
    pub callbacks: CallbackTable,
    pub subscribed: SubscribedTable,
    pub num_subscriptions: usize,
}

impl Configuration {
    #[must_use]
    pub fn new(
        filters: FilterTable,
        callbacks: CallbackTable,
        subscribed: SubscribedTable,
        num_subscriptions: usize,
    ) -> Self {
        Self {
            filters,
            callbacks,
            subscribed,
            num_subscriptions,
        }
    }

    /// Check that filters, callbacks and subscribed types agree on the set of indices.
    pub fn validate(&self, mode: IndexMode) -> ConfigResult {
        let num = self.num_subscriptions;
        let mut fed = BTreeSet::new();
        for (filter, indices) in self.filters.iter() {
            if mode == IndexMode::Exclusive && indices.len() != 1 {
                return Err(ConfigError::SharedFilter(filter.to_owned(), indices.len()));
            }
            for &idx in indices {
                if idx >= num {
                    return Err(ConfigError::IndexOutOfRange(filter.to_owned(), idx, num));
                }
                if !fed.insert(idx) && mode == IndexMode::Exclusive {
                    return Err(ConfigError::DuplicateIndex(idx));
                }
            }
        }
        if let Some(missing) = (0..num).find(|idx| !fed.contains(idx)) {
            return Err(ConfigError::MissingIndex(missing));
        }
        for (callback, indices) in self.callbacks.iter() {
            if let Some(&orphan) = indices.iter().find(|idx| !fed.contains(*idx)) {
                return Err(ConfigError::OrphanCallbackIndex(callback.to_owned(), orphan));
            }
        }
        for (name, subscribed) in &self.subscribed {
            if let Some(&idx) = subscribed.idx.iter().find(|&&idx| idx >= num) {
                return Err(ConfigError::SubscribedOutOfRange(name.clone(), idx, num));
            }
        }
        debug!(
            "Configuration with {num} subscriptions and {} filters is consistent",
            self.filters.len()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn two_blocks() -> Configuration {
        let mut filters = FilterTable::new();
        filters.insert("addr = 0.0.0.0/1", 0);
        filters.insert("addr = 128.0.0.0/1", 1);
        let mut callbacks = CallbackTable::new();
        callbacks.push("conn_cb", 0);
        callbacks.push("conn_cb", 1);
        let mut subscribed = SubscribedTable::new();
        subscribed.insert("SubscribedConn".to_owned(), Subscribed::first(2, None));
        Configuration::new(filters, callbacks, subscribed, 2)
    }

    #[test]
    fn filter_insertion_merges_identical_text() {
        let mut filters = FilterTable::new();
        assert_eq!(filters.insert("tls", 0), Insertion::New);
        assert_eq!(filters.insert("http", 1), Insertion::New);
        assert_eq!(filters.insert("tls", 2), Insertion::Merged);
        assert_eq!(filters.len(), 2);
        assert_eq!(filters.get("tls"), Some([0, 2].as_slice()));
        assert_eq!(filters.filters().collect::<Vec<_>>(), vec!["tls", "http"]);
    }

    #[test]
    fn declared_callbacks_are_kept_empty() {
        let mut callbacks = CallbackTable::new();
        callbacks.declare("ip_src");
        callbacks.declare("http");
        callbacks.push("http", 3);
        callbacks.declare("http");
        assert_eq!(callbacks.get("ip_src"), Some([].as_slice()));
        assert_eq!(callbacks.get("http"), Some([3].as_slice()));
        let names: Vec<_> = callbacks.iter().map(|(c, _)| c).collect();
        assert_eq!(names, vec!["ip_src", "http"]);
    }

    #[test]
    fn consistent_configuration() {
        let config = two_blocks();
        assert_eq!(config.validate(IndexMode::Exclusive), Ok(()));
        assert_eq!(config.validate(IndexMode::Shared), Ok(()));
    }

    #[test]
    fn inconsistent_configurations() {
        let mut config = two_blocks();
        config.num_subscriptions = 3;
        assert_eq!(
            config.validate(IndexMode::Exclusive),
            Err(ConfigError::MissingIndex(2))
        );

        let mut config = two_blocks();
        config.num_subscriptions = 1;
        assert_eq!(
            config.validate(IndexMode::Shared),
            Err(ConfigError::IndexOutOfRange(
                "addr = 128.0.0.0/1".to_owned(),
                1,
                1
            ))
        );

        let mut config = two_blocks();
        config.filters.insert("tls", 1);
        assert_eq!(
            config.validate(IndexMode::Exclusive),
            Err(ConfigError::DuplicateIndex(1))
        );
        assert_eq!(config.validate(IndexMode::Shared), Ok(()));

        let mut config = two_blocks();
        config.filters.insert("addr = 0.0.0.0/1", 1);
        assert_eq!(
            config.validate(IndexMode::Exclusive),
            Err(ConfigError::SharedFilter("addr = 0.0.0.0/1".to_owned(), 2))
        );
        assert_eq!(config.validate(IndexMode::Shared), Ok(()));

        let mut config = two_blocks();
        config.callbacks.push("eth", 7);
        assert_eq!(
            config.validate(IndexMode::Exclusive),
            Err(ConfigError::OrphanCallbackIndex("eth".to_owned(), 7))
        );

        let mut config = two_blocks();
        config
            .subscribed
            .insert("SavedFiveTuple".to_owned(), Subscribed::first(4, None));
        assert_eq!(
            config.validate(IndexMode::Exclusive),
            Err(ConfigError::SubscribedOutOfRange(
                "SavedFiveTuple".to_owned(),
                2,
                2
            ))
        );
    }
}
