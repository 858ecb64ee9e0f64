// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! YAML encoding of a [`Configuration`] and its storage.

use crate::errors::ConfigError;
use crate::model::Configuration;
use std::fs;
use std::path::Path;
use tracing::info;

impl Configuration {
    /// Serialize the configuration as YAML.
    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        serde_yaml_ng::to_string(self).map_err(|e| ConfigError::Serialize(e.to_string()))
    }

    /// Deserialize a configuration from YAML.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        serde_yaml_ng::from_str(yaml).map_err(|e| ConfigError::Deserialize(e.to_string()))
    }

    /// Write the configuration to `path`, replacing any previous content.
    ///
    /// The text is fully rendered before the file is touched: a serialization failure leaves the
    /// file as it was.
    pub fn write_to(&self, path: &Path) -> Result<(), ConfigError> {
        let yaml = self.to_yaml()?;
        write_text(path, &yaml)?;
        info!(
            "Wrote {} subscriptions to {}",
            self.num_subscriptions,
            path.display()
        );
        Ok(())
    }

    /// Load a configuration previously written with [`Configuration::write_to`].
    pub fn read_from(path: &Path) -> Result<Self, ConfigError> {
        let yaml = fs::read_to_string(path)
            .map_err(|e| ConfigError::Read(path.to_path_buf(), e.to_string()))?;
        Self::from_yaml(&yaml)
    }
}

/// Write `text` to `path` as is, replacing any previous content.
pub fn write_text(path: &Path, text: &str) -> Result<(), ConfigError> {
    fs::write(path, text).map_err(|e| ConfigError::Write(path.to_path_buf(), e.to_string()))
}
