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

//! src/core/mod.rs
//!
//! Core binding logic
//!
//! This module contains the data structures and algorithms for shortcut
//! rebinding, including:
//! - Binding model (actions, maps, binding entries with stable ids)
//! - Binding combinations and their '+'-joined string form
//! - Composite decomposition and captured-input normalisation
//! - Duplicate detection across linked action maps
//! - The interactive rebinding state machine
//! - Shortcut profiles
//!
//! Nothing in here touches the filesystem, so every piece can be unit
//! tested against an in-memory `ActionAsset`.

pub mod combination;
pub mod composite;
pub mod decomposer;
pub mod devices;
pub mod duplicate;
pub mod error;
pub mod links;
pub mod profile;
pub mod rebind;
pub mod store;
pub mod types;

pub use combination::{BindingCombination, BindingSlot, CombinationBuilder};
pub use composite::{ModifiersOrder, OptionalModifiersInput, PartState};
pub use decomposer::{decompose_action, decompose_asset, normalize_capture, CapturedControl, ControlKind};
pub use devices::{ControlSchemes, DeviceType};
pub use duplicate::{DeviceDuplicate, Duplicate, DuplicateFinder};
pub use error::{ConfigurationError, LookupError, RebindError};
pub use links::{ActionMapLinks, LinkTableError, LinkedMapEntry};
pub use profile::{ProfileId, ProfileRegistry, Shortcut, ShortcutProfile};
pub use rebind::{
    RebindBus, RebindContext, RebindCoordinator, RebindOptions, RebindOutcome, RebindState,
    Resolution, RevertReason, SlotLayout,
};
pub use store::{Action, ActionAsset, ActionMap, BindingStore};
pub use types::*;

#[cfg(test)]
mod tests;
