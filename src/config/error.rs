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

use std::path::PathBuf;
use thiserror::Error;

use crate::core::links::LinkTableError;

/// Errors that can occur while reading or writing persisted data.
#[derive(Debug, Error)]
pub enum StoreError {
    /// File or directory does not exist.
    #[error("File not found: {0}")]
    NotFound(PathBuf),
    /// Storage or backup directory cannot be created or written to.
    #[error("Directory not writable: {0}")]
    DirectoryNotWritable(PathBuf),
    /// No saved asset has this id.
    #[error("No saved asset with id '{0}'")]
    UnknownAsset(String),
    /// The asset's file already holds an asset with another id.
    #[error("{path} already holds asset '{owner}'")]
    FileInUse { path: PathBuf, owner: String },
    /// The id is saved under another title; renaming goes through `update`.
    #[error("Asset '{id}' is saved as '{recorded}'")]
    TitleMismatch { id: String, recorded: String },
    /// Failed to create backup file.
    #[error("Failed to create backup: {0}")]
    BackupFailed(String),
    /// Atomic write operation failed.
    #[error("Atomic write failed: {0}")]
    WriteFailed(String),
    /// File content is not the expected JSON.
    #[error("Invalid JSON in {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    /// Serialising an asset failed.
    #[error("Serialisation failed: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("Invalid link table: {0}")]
    LinkTable(#[from] LinkTableError),
    /// Generic I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
