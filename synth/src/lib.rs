// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Synthesis of index-consistent subscription configurations.
//!
//! Every assembler threads one [`IndexAllocator`] through the filters it renders, so that the
//! filter, callback and subscribed mappings of the resulting [`config::Configuration`] always
//! agree on the set of indices.

#![deny(clippy::all, clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]

mod alloc;
mod errors;
pub mod experiment;
pub mod narrow;
pub mod render;
pub mod simple;
mod sweep;

pub use alloc::{Assembly, IndexAllocator};
pub use errors::{SynthError, UnderAllocation};
pub use experiment::{Experiment, ExperimentName};
pub use narrow::{NarrowOptions, Pools, Synthesis};
pub use render::{CombinedBlocks, combined_filters, filter_list};
pub use simple::{
    OverlappingOptions, SimpleOptions, assemble_non_overlapping, assemble_overlapping,
};
pub use sweep::powers_of_two;
