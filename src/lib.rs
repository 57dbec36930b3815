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

//! Shortcut Remap
//!
//! Interactive shortcut rebinding for input actions: capture a new key
//! combination, detect duplicates across linked action maps, and persist
//! user bindings.
//!
//! # Features
//!
//! - **Binding Combinations:** Up to two modifiers plus a button, linked to
//!   the binding entries they came from
//! - **Composite Decomposition:** Flexible "two optional modifiers"
//!   composites are split into plain, one-modifier and two-modifier
//!   bindings by how many of their parts are bound
//! - **Duplicate Detection:** Finds another action already using a
//!   combination, with composite false positives suppressed
//! - **Rebinding Flow:** Capture, conflict resolution (override or revert)
//!   and broadcast between concurrent rebind coordinators
//! - **Persistence:** Per-user binding sets with atomic writes and
//!   timestamped backups
//!
//! # Architecture
//!
//! - **`core`:** Binding model and algorithms (no I/O)
//! - **`config`:** File operations (assets, settings, link tables)
//! - **`logging`:** `tracing` subscriber setup
//!
//! # Examples
//!
//! ## Finding a duplicate
//!
//! ```no_run
//! use shortcut_remap::config::read_action_asset;
//! use shortcut_remap::core::{ActionMapLinks, ActionRef, BindingCombination, DuplicateFinder};
//! use std::path::Path;
//!
//! let asset = read_action_asset(Path::new("actions.json"))?;
//! let links = ActionMapLinks::default();
//! let finder = DuplicateFinder::new(&asset, &links);
//!
//! let combination = BindingCombination::parse("<Keyboard>/leftCtrl+<Keyboard>/s")?;
//! if let Some(duplicate) = finder.find_duplicate(&ActionRef::new("Shortcuts", "Save"), &combination)? {
//!     println!("Already used by {}", duplicate.action);
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Decomposing an asset
//!
//! ```no_run
//! use shortcut_remap::config::{read_action_asset, write_action_asset};
//! use shortcut_remap::core::decompose_asset;
//! use std::path::Path;
//!
//! let path = Path::new("actions.json");
//! let mut asset = read_action_asset(path)?;
//! let converted = decompose_asset(&mut asset);
//! write_action_asset(path, &asset)?;
//! println!("Converted {} bindings", converted);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod config;
pub mod core;
pub mod logging;

// Re-export commonly used types for convenience
pub use core::{
    ActionAsset, ActionRef, BindingCombination, DuplicateFinder, RebindContext, RebindCoordinator,
    RebindOutcome,
};
