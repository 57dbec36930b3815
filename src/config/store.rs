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

//! File-backed asset storage
//!
//! `JsonAssetStore` keeps one pretty-printed JSON file per asset, named
//! after the asset's title. Key features:
//!
//! - **Atomic writes**: Uses temp-file-then-rename to prevent corruption
//! - **Automatic backups**: Overwriting a file first copies it to
//!   `backups/<file>.<timestamp>`
//! - **Renames on update**: Changing an asset's title renames its file
//! - **One asset per file**: Saving never overwrites a file holding another
//!   asset's id
//! - **Duplicate filtering**: `load_all` drops assets whose title or id was
//!   already seen

use chrono::Local;
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::config::asset::{DataAsset, ShortcutBindingsAsset};
use crate::config::error::StoreError;
use crate::config::write_atomic;

/// Create, read, update and delete for persisted assets
pub trait AssetStore {
    /// Writes the asset; returns the file it was written to.
    ///
    /// Refuses to write over another asset's file, or to save a known id
    /// under a new title.
    fn save(&mut self, asset: &ShortcutBindingsAsset) -> Result<PathBuf, StoreError>;

    /// Reads every stored asset, duplicates removed.
    fn load_all(&mut self) -> Result<Vec<ShortcutBindingsAsset>, StoreError>;

    /// Saves the asset and follows a title change.
    fn update(&mut self, asset: &ShortcutBindingsAsset) -> Result<(), StoreError>;

    fn delete(&mut self, asset: &ShortcutBindingsAsset) -> Result<(), StoreError>;
}

/// One JSON file per asset in a directory
#[derive(Debug)]
pub struct JsonAssetStore {
    dir: PathBuf,
    backup_dir: PathBuf,
    /// id → title the asset's file is currently named after
    titles: BTreeMap<String, String>,
}

impl JsonAssetStore {
    /// Opens (and creates, if needed) a store directory with a `backups`
    /// directory inside it.
    pub fn new(dir: PathBuf) -> Result<Self, StoreError> {
        if !dir.exists() {
            fs::create_dir_all(&dir).map_err(|_| StoreError::DirectoryNotWritable(dir.clone()))?;
        }

        let backup_dir = dir.join("backups");
        if !backup_dir.exists() {
            fs::create_dir_all(&backup_dir)
                .map_err(|_| StoreError::DirectoryNotWritable(backup_dir.clone()))?;
        }

        if backup_dir.metadata()?.permissions().readonly() {
            return Err(StoreError::DirectoryNotWritable(backup_dir));
        }

        Ok(Self {
            dir,
            backup_dir,
            titles: BTreeMap::new(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn backup_dir(&self) -> &Path {
        &self.backup_dir
    }

    /// File an asset with this title is stored in.
    pub fn file_path(&self, title: &str) -> PathBuf {
        self.dir.join(format!("{}.json", file_stem(title)))
    }

    fn recorded_path(&self, id: &str) -> Result<PathBuf, StoreError> {
        self.titles
            .get(id)
            .map(|title| self.file_path(title))
            .ok_or_else(|| StoreError::UnknownAsset(id.to_string()))
    }

    /// Copies `path` into the backup directory with a timestamp suffix.
    pub fn create_timestamped_backup(&self, path: &Path) -> Result<PathBuf, StoreError> {
        let content = fs::read_to_string(path)?;

        // YYYY-MM-DD_HHMMSS
        let timestamp = Local::now().format("%Y-%m-%d_%H%M%S");

        let original_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| StoreError::BackupFailed(format!("No file name in {}", path.display())))?;

        let backup_path = self.backup_dir.join(format!("{}.{}", original_name, timestamp));
        fs::write(&backup_path, content)
            .map_err(|e| StoreError::BackupFailed(format!("{}: {}", backup_path.display(), e)))?;

        debug!(backup = %backup_path.display(), "backup created");
        Ok(backup_path)
    }

    /// Fails if `path` belongs to an asset other than `id`, either as
    /// recorded by this store or as found on disk.
    fn check_owner(&self, path: &Path, id: &str) -> Result<(), StoreError> {
        let recorded = self
            .titles
            .iter()
            .find(|(other, title)| other.as_str() != id && self.file_path(title) == path);
        if let Some((owner, _)) = recorded {
            return Err(StoreError::FileInUse {
                path: path.to_path_buf(),
                owner: owner.clone(),
            });
        }

        if path.exists() {
            let on_disk = Self::read_asset(path)?;
            if on_disk.id() != id {
                return Err(StoreError::FileInUse {
                    path: path.to_path_buf(),
                    owner: on_disk.id().to_string(),
                });
            }
        }

        Ok(())
    }

    /// Backs up the current file, then writes `asset` over it.
    fn write(&self, path: &Path, asset: &ShortcutBindingsAsset) -> Result<(), StoreError> {
        if path.exists() {
            self.create_timestamped_backup(path)?;
        }

        let content = serde_json::to_string_pretty(asset)?;
        write_atomic(path, &content)?;

        info!(asset = %asset, path = %path.display(), "asset saved");
        Ok(())
    }

    fn read_asset(path: &Path) -> Result<ShortcutBindingsAsset, StoreError> {
        let content = fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|source| StoreError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

impl AssetStore for JsonAssetStore {
    fn save(&mut self, asset: &ShortcutBindingsAsset) -> Result<PathBuf, StoreError> {
        if let Some(recorded) = self.titles.get(asset.id()) {
            if recorded != asset.title() {
                return Err(StoreError::TitleMismatch {
                    id: asset.id().to_string(),
                    recorded: recorded.clone(),
                });
            }
        }

        let path = self.file_path(asset.title());
        self.check_owner(&path, asset.id())?;
        self.titles.insert(asset.id().to_string(), asset.title().to_string());

        self.write(&path, asset)?;
        Ok(path)
    }

    fn load_all(&mut self) -> Result<Vec<ShortcutBindingsAsset>, StoreError> {
        let mut paths = fs::read_dir(&self.dir)?
            .map(|entry| entry.map(|e| e.path()))
            .collect::<Result<Vec<_>, _>>()?;
        paths.retain(|p| p.is_file() && p.extension().is_some_and(|ext| ext == "json"));
        paths.sort();

        let mut seen_ids = HashSet::new();
        let mut seen_titles = HashSet::new();
        let mut assets = Vec::new();

        for path in paths {
            let asset = Self::read_asset(&path)?;

            if seen_titles.contains(asset.title()) || seen_ids.contains(asset.id()) {
                warn!(
                    asset = %asset,
                    id = asset.id(),
                    path = %path.display(),
                    "duplicate asset not loaded; changes to it will not be saved until the duplicate is removed"
                );
                continue;
            }

            seen_titles.insert(asset.title().to_string());
            seen_ids.insert(asset.id().to_string());
            self.titles
                .entry(asset.id().to_string())
                .or_insert_with(|| asset.title().to_string());
            assets.push(asset);
        }

        Ok(assets)
    }

    fn update(&mut self, asset: &ShortcutBindingsAsset) -> Result<(), StoreError> {
        let Some(old_path) = self.titles.get(asset.id()).map(|title| self.file_path(title)) else {
            self.save(asset)?;
            return Ok(());
        };

        let new_path = self.file_path(asset.title());
        if new_path != old_path {
            self.check_owner(&new_path, asset.id())?;
        }

        self.write(&old_path, asset)?;
        self.titles.insert(asset.id().to_string(), asset.title().to_string());

        if new_path != old_path {
            fs::rename(&old_path, &new_path)?;
            info!(from = %old_path.display(), to = %new_path.display(), "asset renamed");
        }
        Ok(())
    }

    fn delete(&mut self, asset: &ShortcutBindingsAsset) -> Result<(), StoreError> {
        let path = self.recorded_path(asset.id())?;
        if path.exists() {
            fs::remove_file(&path)?;
        }
        self.titles.remove(asset.id());

        info!(asset = %asset, "asset deleted");
        Ok(())
    }
}

/// Title reduced to characters that are safe in a file name.
fn file_stem(title: &str) -> String {
    let stem = title
        .trim()
        .chars()
        .map(|c| if c.is_alphanumeric() || matches!(c, '-' | '_' | ' ') { c } else { '_' })
        .collect::<String>();

    if stem.is_empty() {
        "untitled".to_string()
    } else {
        stem
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_stem_sanitises_titles() {
        assert_eq!(file_stem("Shortcuts"), "Shortcuts");
        assert_eq!(file_stem("My/Profile:1"), "My_Profile_1");
        assert_eq!(file_stem("   "), "untitled");
    }
}
