// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! IPv4 address blocks and their equal-sized partitions.

#![deny(clippy::all, clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]

pub mod block;
pub mod partition;
pub mod pool;

pub use block::{AddressBlock, BlockParseError, InvalidBlock, InvalidPrefixLen, PrefixLen};
pub use partition::{
    PartitionError, Subdivisions, partition, partition_to_prefix, power_of_two_exponent,
};
pub use pool::{AddressPool, Role};
