// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Model of the subscription configuration handed to the monitoring engine: which filter feeds
//! which subscription index, which callback each index invokes, and which data types are
//! subscribed.

#![deny(clippy::all, clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]

pub mod errors;
pub mod io;
pub mod model;

pub use errors::{ConfigError, ConfigResult};
pub use io::write_text;
pub use model::{
    CallbackTable, Configuration, FieldSelection, FilterTable, IndexMode, Insertion, Subscribed,
    SubscribedTable, SubscriptionIdx,
};
