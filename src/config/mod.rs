// Copyright 2025 Eric Jingryd (tidynest@proton.me)
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Persistence and settings
//!
//! Everything in this module touches the filesystem:
//!
//! - **Action assets**: JSON files holding action maps and their bindings
//! - **Shortcut assets**: per-user binding sets stored by `JsonAssetStore`
//! - **Settings**: rebind timing, display text and control scheme groups
//! - **Link tables**: which action maps are checked together for duplicates
//!
//! All writes go through [`write_atomic`], so a crash mid-write never leaves
//! a truncated file behind.
//!
//! # Example
//!
//! ```no_run
//! use shortcut_remap::config::{read_action_asset, write_action_asset};
//! use shortcut_remap::core::decompose_asset;
//! use std::path::Path;
//!
//! let path = Path::new("actions.json");
//! let mut asset = read_action_asset(path)?;
//! decompose_asset(&mut asset);
//! write_action_asset(path, &asset)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod asset;
pub mod converter;
pub mod error;
pub mod settings;
pub mod store;

use atomic_write_file::AtomicWriteFile;
use std::fs;
use std::io::Write;
use std::path::Path;
use tracing::info;

use crate::core::store::ActionAsset;

pub use asset::{
    BindingSet, DataAsset, ShortcutBindingsAsset, ShortcutBindingsAssetBuilder, DEFAULT_ASSET_ID,
    DEFAULT_ASSET_TITLE,
};
pub use converter::{apply, capture};
pub use error::StoreError;
pub use settings::{load_links, RebindSettings};
pub use store::{AssetStore, JsonAssetStore};

/// Replaces `path` with `content` in one step.
///
/// The content goes to a temporary file in the same directory, which is
/// renamed over `path` on commit. If anything fails, `path` is untouched.
pub fn write_atomic(path: &Path, content: &str) -> Result<(), StoreError> {
    let mut file = AtomicWriteFile::options()
        .open(path)
        .map_err(|e| StoreError::WriteFailed(format!("Failed to open {}: {}", path.display(), e)))?;

    file.write_all(content.as_bytes())
        .map_err(|e| StoreError::WriteFailed(format!("Failed to write content: {}", e)))?;

    file.commit()
        .map_err(|e| StoreError::WriteFailed(format!("Failed to commit atomic write: {}", e)))?;

    Ok(())
}

/// Reads an action asset (maps, actions, bindings) from a JSON file.
pub fn read_action_asset(path: &Path) -> Result<ActionAsset, StoreError> {
    if !path.exists() {
        return Err(StoreError::NotFound(path.to_path_buf()));
    }

    let content = fs::read_to_string(path)?;
    ActionAsset::from_json(&content).map_err(|source| StoreError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Writes an action asset as pretty-printed JSON, atomically.
pub fn write_action_asset(path: &Path, asset: &ActionAsset) -> Result<(), StoreError> {
    let content = asset.to_json()?;
    write_atomic(path, &content)?;

    info!(path = %path.display(), maps = asset.maps.len(), "action asset written");
    Ok(())
}

#[cfg(test)]
mod tests;
