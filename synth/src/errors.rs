// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Errors and notices of configuration synthesis

use addrspace::{InvalidBlock, PartitionError};
use std::fmt::{Display, Formatter};
use thiserror::Error;

/// Reasons why no configuration could be synthesized. Nothing is produced when one is returned.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SynthError {
    #[error(transparent)]
    Partition(#[from] PartitionError),
    #[error("{0} subscriptions requested, but at most {1} are supported")]
    CountTooLarge(usize, usize),
    #[error("At least one subscription must be requested")]
    ZeroCount,
    #[error("Invalid narrow block: {0}")]
    NarrowBlock(#[from] InvalidBlock),
}

/// The requested number of subscriptions could not be produced.
///
/// This is not an error: the configuration is still usable, with `achieved` subscriptions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnderAllocation {
    pub requested: usize,
    pub achieved: usize,
}

impl Display for UnderAllocation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "only {} of {} requested subscriptions generated",
            self.achieved, self.requested
        )
    }
}
