// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Equal-sized subdivision of an [`AddressBlock`].

use crate::block::{AddressBlock, PrefixLen};
use std::iter::FusedIterator;
use std::net::Ipv4Addr;
use tracing::debug;

/// Errors which may occur when partitioning an address block.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PartitionError {
    /// The requested count is zero or not a power of two.
    #[error("invalid count {0}: must be a positive power of two")]
    InvalidCount(u64),
    /// The base block cannot be split into that many blocks.
    #[error("cannot split {0} into {1} blocks")]
    TooManyBlocks(AddressBlock, u64),
    /// The target prefix length is shorter than the prefix length of the base block.
    #[error("cannot subdivide {0} into /{1} blocks")]
    PrefixTooShort(AddressBlock, PrefixLen),
}

/// Returns the exponent `k` such that `count == 2^k`.
///
/// # Errors
///
/// Returns [`PartitionError::InvalidCount`] if `count` is zero or not a power of two.
pub fn power_of_two_exponent(count: u64) -> Result<u8, PartitionError> {
    if !count.is_power_of_two() {
        return Err(PartitionError::InvalidCount(count));
    }
    #[allow(clippy::cast_possible_truncation)] // at most 63
    Ok(count.trailing_zeros() as u8)
}

/// Split `base` into exactly `count` contiguous blocks of equal size, in address order.
///
/// # Errors
///
/// * [`PartitionError::InvalidCount`] if `count` is not a positive power of two.
/// * [`PartitionError::TooManyBlocks`] if the resulting blocks would be smaller than a single
///   address.
pub fn partition(base: AddressBlock, count: u64) -> Result<Vec<AddressBlock>, PartitionError> {
    let exponent = power_of_two_exponent(count)?;
    let new_len = PrefixLen::try_new(base.prefix_len().as_u8() + exponent)
        .map_err(|_| PartitionError::TooManyBlocks(base, count))?;
    let blocks: Vec<_> = partition_to_prefix(base, new_len)?.collect();
    debug!("Partitioned {base} into {} blocks of /{new_len}", blocks.len());
    Ok(blocks)
}

/// Split `base` into all of its sub-blocks of length `new_len`, in address order.
///
/// Any number of blocks is admissible here: the prefix length drives subdivision.
///
/// # Errors
///
/// Returns [`PartitionError::PrefixTooShort`] if `new_len` is shorter than the prefix length of
/// `base`.
pub fn partition_to_prefix(
    base: AddressBlock,
    new_len: PrefixLen,
) -> Result<Subdivisions, PartitionError> {
    if new_len < base.prefix_len() {
        return Err(PartitionError::PrefixTooShort(base, new_len));
    }
    Ok(Subdivisions::new(base, new_len))
}

/// Iterator over the equal-sized sub-blocks of a base block.
///
/// Each iterator carries its own cursor: iterating one never advances another.
#[derive(Debug, Clone)]
pub struct Subdivisions {
    start: u64,
    step: u64,
    len: PrefixLen,
    next: u64,
    count: u64,
}

impl Subdivisions {
    /// Callers guarantee `new_len >= base.prefix_len()`.
    pub(crate) fn new(base: AddressBlock, new_len: PrefixLen) -> Self {
        Self {
            start: u64::from(base.address().to_bits()),
            step: 1u64 << new_len.host_bits(),
            len: new_len,
            next: 0,
            count: 1u64 << (new_len.as_u8() - base.prefix_len().as_u8()),
        }
    }

    /// The prefix length of the blocks produced.
    #[must_use]
    pub fn prefix_len(&self) -> PrefixLen {
        self.len
    }

    /// The number of blocks not yet produced.
    #[must_use]
    pub fn remaining(&self) -> u64 {
        self.count - self.next
    }
}

impl Iterator for Subdivisions {
    type Item = AddressBlock;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.count {
            return None;
        }
        #[allow(clippy::cast_possible_truncation)] // stays within the base block
        let addr = Ipv4Addr::from_bits((self.start + self.next * self.step) as u32);
        self.next += 1;
        Some(AddressBlock::covering(addr, self.len))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = usize::try_from(self.remaining()).unwrap_or(usize::MAX);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Subdivisions {}

impl FusedIterator for Subdivisions {}
