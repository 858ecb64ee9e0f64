// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Configurations sharding the address space evenly across subscriptions, or stacking every
//! subscription on the same filter.

use crate::alloc::Assembly;
use crate::errors::SynthError;
use addrspace::{AddressBlock, partition};
use config::{Configuration, FieldSelection};
use filter::{AddrField, AddrMatch, FilterExpr, Predicate, Protocol, build};
use tracing::info;

/// How each per-block filter, its callback and the subscribed type are rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimpleOptions {
    /// The block split across the subscriptions
    pub base: AddressBlock,
    pub field: AddrField,
    /// Prefix the address field with the `ipv4.` layer
    pub qualified: bool,
    /// Predicates conjoined to every address match
    pub predicates: Vec<Predicate>,
    pub callback: String,
    pub subscribed_type: String,
    pub fields: Option<FieldSelection>,
    /// Largest count accepted, if any
    pub max_count: Option<usize>,
}

fn connection_fields() -> FieldSelection {
    let mut fields = FieldSelection::new();
    fields.insert("connection".to_owned(), Vec::new());
    fields
}

impl Default for SimpleOptions {
    fn default() -> Self {
        Self {
            base: AddressBlock::ROOT,
            field: AddrField::Addr,
            qualified: false,
            predicates: Vec::new(),
            callback: "conn_cb".to_owned(),
            subscribed_type: "SubscribedConn".to_owned(),
            fields: Some(connection_fields()),
            max_count: None,
        }
    }
}

impl SimpleOptions {
    /// `ipv4.addr = <block> and (http or tls or dns)`
    #[must_use]
    pub fn ipv4_protocols() -> Self {
        Self {
            qualified: true,
            predicates: vec![Predicate::AnyOf(vec![
                Protocol::Http,
                Protocol::Tls,
                Protocol::Dns,
            ])],
            ..Self::default()
        }
    }

    /// `ipv4.dst_addr = <block>` delivered to the `eth` callback, up to 128 subscriptions.
    #[must_use]
    pub fn dst_sharded() -> Self {
        Self {
            field: AddrField::DstAddr,
            qualified: true,
            callback: "eth".to_owned(),
            subscribed_type: "SubscribedConnection".to_owned(),
            fields: None,
            max_count: Some(128),
            ..Self::default()
        }
    }

    fn addr_match(&self, block: AddressBlock) -> AddrMatch {
        if self.qualified {
            AddrMatch::ipv4(self.field, block)
        } else {
            AddrMatch::new(self.field, block)
        }
    }

    /// The filter matching one block.
    #[must_use]
    pub fn filter(&self, block: AddressBlock) -> FilterExpr {
        build(self.addr_match(block), self.predicates.iter().cloned())
    }

    /// The per-block filters of a partition of the base block into `count` blocks.
    pub fn filters(&self, count: usize) -> Result<Vec<FilterExpr>, SynthError> {
        if let Some(max) = self.max_count.filter(|&max| count > max) {
            return Err(SynthError::CountTooLarge(count, max));
        }
        let blocks = partition(self.base, count as u64)?;
        Ok(blocks.into_iter().map(|b| self.filter(b)).collect())
    }
}

/// One filter per block of an even partition, each feeding exactly one index.
///
/// # Errors
///
/// Fails before producing anything if `count` is not a positive power of two, or exceeds the
/// maximum of `options`.
pub fn assemble_non_overlapping(
    count: usize,
    options: &SimpleOptions,
) -> Result<Configuration, SynthError> {
    let filters = options.filters(count)?;
    let mut asm = Assembly::new();
    for filter in &filters {
        asm.allocate(filter, &options.callback);
    }
    info!(
        "Sharded {} into {count} non-overlapping subscriptions",
        options.base
    );
    Ok(asm.finish(&options.subscribed_type, options.fields.clone()))
}

/// The filter shared by all the indices of an overlapping configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverlappingOptions {
    pub filter: FilterExpr,
    pub callback: String,
    pub subscribed_type: String,
    pub fields: Option<FieldSelection>,
}

impl Default for OverlappingOptions {
    fn default() -> Self {
        let client = AddressBlock::new_assert([16, 0, 0, 2], 32);
        Self {
            filter: build(
                AddrMatch::ipv4(AddrField::SrcAddr, client),
                [Predicate::from(Protocol::Http)],
            ),
            callback: "http".to_owned(),
            subscribed_type: "SavedFiveTuple".to_owned(),
            fields: None,
        }
    }
}

/// A single filter feeding every index `0..count`.
///
/// # Errors
///
/// Fails with [`SynthError::ZeroCount`] if `count` is zero. Any positive count is accepted.
pub fn assemble_overlapping(
    count: usize,
    options: &OverlappingOptions,
) -> Result<Configuration, SynthError> {
    if count == 0 {
        return Err(SynthError::ZeroCount);
    }
    let mut asm = Assembly::new();
    asm.allocate_shared(&options.filter, &options.callback, count);
    info!("Stacked {count} subscriptions on '{}'", options.filter);
    Ok(asm.finish(&options.subscribed_type, options.fields.clone()))
}
