// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! In-place patching of anchored regions in source files.

#![deny(clippy::all, clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]

mod anchor;
mod errors;
pub mod snippet;

pub use anchor::{Anchor, Span};
pub use errors::PatchError;

use std::fs;
use std::path::Path;
use tracing::{debug, info};

/// Replace the body of each anchored region in `text`, in order.
pub fn patch_text(text: &str, edits: &[(Anchor, String)]) -> Result<String, PatchError> {
    let mut patched = text.to_owned();
    for (anchor, body) in edits {
        patched = anchor.splice(&patched, body)?;
        debug!("Replaced the {anchor} region");
    }
    Ok(patched)
}

/// Replace the body of each anchored region of the file at `path`.
///
/// Either every region is found and the file is rewritten once, or the file is left untouched.
pub fn patch_file(path: &Path, edits: &[(Anchor, String)]) -> Result<(), PatchError> {
    let text = fs::read_to_string(path)
        .map_err(|e| PatchError::Read(path.to_path_buf(), e.to_string()))?;
    let patched = patch_text(&text, edits)?;
    fs::write(path, patched).map_err(|e| PatchError::Write(path.to_path_buf(), e.to_string()))?;
    info!("Patched {} regions of {}", edits.len(), path.display());
    Ok(())
}
