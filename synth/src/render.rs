// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Plain-text renderings of synthesized filters, for consumers that don't read configurations.

use crate::errors::SynthError;
use crate::simple::SimpleOptions;
use addrspace::{AddressBlock, partition};
use config::Configuration;
use filter::{Predicate, Protocol, combine};

impl SimpleOptions {
    /// `ipv4.addr = <block> and (http or tls or dns or quic)`
    #[must_use]
    pub fn ipv4_all_protocols() -> Self {
        Self {
            qualified: true,
            predicates: vec![Predicate::AnyOf(vec![
                Protocol::Http,
                Protocol::Tls,
                Protocol::Dns,
                Protocol::Quic,
            ])],
            ..Self::default()
        }
    }
}

/// One filter per line, with no trailing newline.
pub fn filter_list(count: usize, options: &SimpleOptions) -> Result<String, SynthError> {
    let filters = options.filters(count)?;
    Ok(filters
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n"))
}

/// A partition of a block as a single disjunction, along with the blocks as Rust literals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CombinedBlocks {
    /// `(b0) or (b1) or ...`
    pub expression: String,
    /// `"b0".parse().unwrap()` items, one per line
    pub literals: String,
}

impl CombinedBlocks {
    pub fn new(base: AddressBlock, count: usize) -> Result<Self, SynthError> {
        let blocks = partition(base, count as u64)?;
        let literals = blocks
            .iter()
            .map(|b| format!("\"{b}\".parse().unwrap()"))
            .collect::<Vec<_>>()
            .join(",\n");
        Ok(Self {
            expression: combine(&blocks),
            literals,
        })
    }
}

/// Every filter of a configuration as a single disjunction.
#[must_use]
pub fn combined_filters(config: &Configuration) -> String {
    combine(config.filters.filters())
}
