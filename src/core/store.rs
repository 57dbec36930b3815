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

//! src/core/store.rs
//!
//! Binding store: action maps, actions and their binding lists
//!
//! The rest of the core only talks to bindings through the `BindingStore`
//! trait (read/write effective paths, enable/disable actions, enumerate
//! bindings). `ActionAsset` is the in-memory implementation used by the
//! CLI and the tests; a host application can implement the trait over its
//! own input system instead.

use serde::{Deserialize, Serialize};

use crate::core::error::LookupError;
use crate::core::types::{ActionRef, Binding, BindingId, SlotRef};

fn enabled_by_default() -> bool {
    true
}

/// A named action with an ordered binding list
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Action {
    pub name: String,

    #[serde(default)]
    pub bindings: Vec<Binding>,

    /// Disabled actions do not fire; capture disables the rebound action
    #[serde(skip, default = "enabled_by_default")]
    enabled: bool,
}

impl Action {
    pub fn new(name: &str, bindings: Vec<Binding>) -> Self {
        Self {
            name: name.to_string(),
            bindings,
            enabled: true,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Binding at `index`, or a lookup failure naming this action.
    pub fn binding(&self, index: usize) -> Result<&Binding, LookupError> {
        self.bindings
            .get(index)
            .ok_or_else(|| LookupError::IndexOutOfRange {
                action: self.name.clone(),
                index,
                len: self.bindings.len(),
            })
    }

    pub fn binding_mut(&mut self, index: usize) -> Result<&mut Binding, LookupError> {
        let len = self.bindings.len();
        let name = self.name.clone();
        self.bindings
            .get_mut(index)
            .ok_or(LookupError::IndexOutOfRange {
                action: name,
                index,
                len,
            })
    }

    /// Position of the binding with the given identity, empty paths included.
    pub fn index_of(&self, id: BindingId) -> Option<usize> {
        self.bindings.iter().position(|b| b.id == id)
    }
}

/// A named group of actions; duplicate checks run per map
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct ActionMap {
    pub name: String,

    #[serde(default)]
    pub actions: Vec<Action>,
}

/// One binding seen from its map: owning action plus index in that action
#[derive(Clone, Copy, Debug)]
pub struct MapEntry<'a> {
    pub action: &'a Action,
    pub index: usize,
    pub binding: &'a Binding,
}

impl ActionMap {
    pub fn new(name: &str, actions: Vec<Action>) -> Self {
        Self {
            name: name.to_string(),
            actions,
        }
    }

    /// All bindings of the map, action by action, in list order.
    pub fn entries(&self) -> Vec<MapEntry<'_>> {
        self.actions
            .iter()
            .flat_map(|action| {
                action
                    .bindings
                    .iter()
                    .enumerate()
                    .map(move |(index, binding)| MapEntry {
                        action,
                        index,
                        binding,
                    })
            })
            .collect()
    }

    pub fn action(&self, name: &str) -> Option<&Action> {
        self.actions.iter().find(|a| a.name == name)
    }
}

/// Read/write access to bindings, owned by the host input system
pub trait BindingStore {
    fn action(&self, action: &ActionRef) -> Result<&Action, LookupError>;

    fn action_mut(&mut self, action: &ActionRef) -> Result<&mut Action, LookupError>;

    /// Map by name; `None` when the map does not exist.
    fn map(&self, name: &str) -> Option<&ActionMap>;

    fn effective_path(&self, slot: &SlotRef) -> Result<&str, LookupError> {
        Ok(self.action(&slot.action)?.binding(slot.index)?.effective_path())
    }

    /// Applies `path` as an override on the slot. An empty path unbinds it.
    fn set_effective_path(&mut self, slot: &SlotRef, path: &str) -> Result<(), LookupError> {
        let binding = self.action_mut(&slot.action)?.binding_mut(slot.index)?;
        binding.override_path = Some(path.to_string());
        Ok(())
    }

    fn enable(&mut self, action: &ActionRef) -> Result<(), LookupError> {
        self.action_mut(action)?.enabled = true;
        Ok(())
    }

    fn disable(&mut self, action: &ActionRef) -> Result<(), LookupError> {
        self.action_mut(action)?.enabled = false;
        Ok(())
    }
}

/// In-memory collection of action maps
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct ActionAsset {
    #[serde(default)]
    pub maps: Vec<ActionMap>,
}

impl ActionAsset {
    pub fn new(maps: Vec<ActionMap>) -> Self {
        Self { maps }
    }

    pub fn from_json(content: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(content)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Every action in the asset, map by map.
    pub fn action_refs(&self) -> Vec<ActionRef> {
        self.maps
            .iter()
            .flat_map(|map| {
                map.actions
                    .iter()
                    .map(move |action| ActionRef::new(&map.name, &action.name))
            })
            .collect()
    }
}

impl BindingStore for ActionAsset {
    fn action(&self, action: &ActionRef) -> Result<&Action, LookupError> {
        let map = self
            .map(&action.map)
            .ok_or_else(|| LookupError::MapNotFound(action.map.clone()))?;

        map.action(&action.action)
            .ok_or_else(|| LookupError::ActionNotFound {
                map: action.map.clone(),
                action: action.action.clone(),
            })
    }

    fn action_mut(&mut self, action: &ActionRef) -> Result<&mut Action, LookupError> {
        let map = self
            .maps
            .iter_mut()
            .find(|m| m.name == action.map)
            .ok_or_else(|| LookupError::MapNotFound(action.map.clone()))?;

        map.actions
            .iter_mut()
            .find(|a| a.name == action.action)
            .ok_or_else(|| LookupError::ActionNotFound {
                map: action.map.clone(),
                action: action.action.clone(),
            })
    }

    fn map(&self, name: &str) -> Option<&ActionMap> {
        self.maps.iter().find(|m| m.name == name)
    }
}
