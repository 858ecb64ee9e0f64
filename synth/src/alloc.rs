// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Index allocation shared by all the assemblers.

use config::{
    CallbackTable, Configuration, FieldSelection, FilterTable, Insertion, Subscribed,
    SubscribedTable, SubscriptionIdx,
};
use std::fmt::Display;
use tracing::debug;

/// Hands out subscription indices, densely and in order, for one synthesis.
#[derive(Debug, Default)]
pub struct IndexAllocator {
    next: SubscriptionIdx,
}

impl IndexAllocator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the next index.
    pub fn allocate(&mut self) -> SubscriptionIdx {
        let idx = self.next;
        self.next += 1;
        idx
    }

    /// The number of indices handed out so far.
    #[must_use]
    pub fn allocated(&self) -> usize {
        self.next
    }
}

/// A configuration under construction: the filter and callback tables fed by one allocator.
#[derive(Debug, Default)]
pub struct Assembly {
    indices: IndexAllocator,
    filters: FilterTable,
    callbacks: CallbackTable,
}

impl Assembly {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare callback groups up front, so that they appear even if they end up empty.
    #[must_use]
    pub fn with_callbacks<'a>(mut self, callbacks: impl IntoIterator<Item = &'a str>) -> Self {
        for callback in callbacks {
            self.callbacks.declare(callback);
        }
        self
    }

    /// Allocate a new index fed by `filter` and invoking `callback`.
    pub fn allocate(&mut self, filter: &impl Display, callback: &str) -> SubscriptionIdx {
        let idx = self.indices.allocate();
        let filter = filter.to_string();
        debug!("{idx}: {filter} -> {callback}");
        if self.filters.insert(filter, idx) == Insertion::Merged {
            debug!("Index {idx} shares its filter with a previous index");
        }
        self.callbacks.push(callback, idx);
        idx
    }

    /// Allocate `count` new indices all fed by the same `filter`.
    pub fn allocate_shared(&mut self, filter: &impl Display, callback: &str, count: usize) {
        let filter = filter.to_string();
        for _ in 0..count {
            let idx = self.indices.allocate();
            self.filters.insert(filter.as_str(), idx);
            self.callbacks.push(callback, idx);
        }
        debug!("{count} indices share filter '{filter}' -> {callback}");
    }

    #[must_use]
    pub fn allocated(&self) -> usize {
        self.indices.allocated()
    }

    /// Complete the configuration with a single subscribed type covering every index.
    #[must_use]
    pub fn finish(self, subscribed_type: &str, fields: Option<FieldSelection>) -> Configuration {
        let count = self.indices.allocated();
        let mut subscribed = SubscribedTable::new();
        subscribed.insert(
            subscribed_type.to_owned(),
            Subscribed::first(count, fields),
        );
        Configuration::new(self.filters, self.callbacks, subscribed, count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::IndexMode;
    use pretty_assertions::assert_eq;

    #[test]
    fn indices_are_dense() {
        let mut indices = IndexAllocator::new();
        assert_eq!(indices.allocated(), 0);
        assert_eq!(indices.allocate(), 0);
        assert_eq!(indices.allocate(), 1);
        assert_eq!(indices.allocated(), 2);
    }

    #[test]
    fn assembly_threads_one_counter() {
        let mut asm = Assembly::new().with_callbacks(["a", "b"]);
        assert_eq!(asm.allocate(&"tls", "b"), 0);
        assert_eq!(asm.allocate(&"http", "b"), 1);
        asm.allocate_shared(&"udp", "c", 2);
        assert_eq!(asm.allocated(), 4);
        let config = asm.finish("SavedFiveTuple", None);
        assert_eq!(config.num_subscriptions, 4);
        assert_eq!(config.callbacks.get("a"), Some([].as_slice()));
        assert_eq!(config.callbacks.get("b"), Some([0, 1].as_slice()));
        assert_eq!(config.callbacks.get("c"), Some([2, 3].as_slice()));
        assert_eq!(config.filters.get("udp"), Some([2, 3].as_slice()));
        assert_eq!(config.subscribed["SavedFiveTuple"].idx, vec![0, 1, 2, 3]);
        assert_eq!(config.validate(IndexMode::Shared), Ok(()));
    }

    #[test]
    fn colliding_filters_merge() {
        let mut asm = Assembly::new();
        asm.allocate(&"tls", "http");
        asm.allocate(&"tls", "http");
        let config = asm.finish("SavedFiveTuple", None);
        assert_eq!(config.filters.len(), 1);
        assert_eq!(config.filters.get("tls"), Some([0, 1].as_slice()));
        assert_eq!(config.num_subscriptions, 2);
    }
}
