// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Address pools used to hand out blocks to one traffic role.

use crate::block::{AddressBlock, PrefixLen};
use crate::partition::Subdivisions;
use std::fmt::{Display, Formatter};

/// The side of a connection an address pool stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Client,
    Server,
}

impl Display for Role {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Client => write!(f, "client"),
            Role::Server => write!(f, "server"),
        }
    }
}

/// A base block handed out in sub-blocks of a fixed granularity.
///
/// Each call to [`AddressPool::pass`] starts a fresh cursor at the base address. A pass ends when
/// the pool is exhausted or when the caller stops drawing from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddressPool {
    base: AddressBlock,
    granularity: PrefixLen,
}

impl AddressPool {
    /// Create a pool handing out single addresses of `base`.
    #[must_use]
    pub fn hosts(base: AddressBlock) -> Self {
        Self {
            base,
            granularity: PrefixLen::MAX,
        }
    }

    #[must_use]
    pub fn base(&self) -> AddressBlock {
        self.base
    }

    /// Start a new pass over the pool.
    #[must_use]
    pub fn pass(&self) -> Subdivisions {
        Subdivisions::new(self.base, self.granularity)
    }
}

impl Display for AddressPool {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} by /{}", self.base, self.granularity)
    }
}
