// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PatchError {
    #[error("Can't find the {0} region in the source text")]
    AnchorNotFound(String),
    #[error("Invalid pattern for the {0} region: {1}")]
    Pattern(String, String),
    #[error("Failed to read {0:?}: {1}")]
    Read(PathBuf, String),
    #[error("Failed to write {0:?}: {1}")]
    Write(PathBuf, String),
}
