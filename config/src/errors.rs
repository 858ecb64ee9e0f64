// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Errors for the subscription configuration model

use crate::model::SubscriptionIdx;
use std::path::PathBuf;
use thiserror::Error;

/// The reasons why a subscription configuration can't be produced, stored or loaded.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Failed to serialize configuration as YAML: {0}")]
    Serialize(String),
    #[error("Failed to deserialize configuration from YAML: {0}")]
    Deserialize(String),
    #[error("Failed to write {0:?}: {1}")]
    Write(PathBuf, String),
    #[error("Failed to read {0:?}: {1}")]
    Read(PathBuf, String),

    // consistency
    #[error("Filter '{0}' refers to index {1}, but there are only {2} subscriptions")]
    IndexOutOfRange(String, SubscriptionIdx, usize),
    #[error("Filter '{0}' feeds {1} indices")]
    SharedFilter(String, usize),
    #[error("Index {0} is fed by more than one filter")]
    DuplicateIndex(SubscriptionIdx),
    #[error("Index {0} is not fed by any filter")]
    MissingIndex(SubscriptionIdx),
    #[error("Callback '{0}' refers to index {1}, which no filter feeds")]
    OrphanCallbackIndex(String, SubscriptionIdx),
    #[error("Subscribed type '{0}' refers to index {1}, but there are only {2} subscriptions")]
    SubscribedOutOfRange(String, SubscriptionIdx, usize),
}

/// Result-like type for configurations
pub type ConfigResult = Result<(), ConfigError>;
