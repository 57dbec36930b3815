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

//! src/core/types.rs
//!
//! Core type definitions for binding management
//!
//! This module defines the fundamental types used throughout the crate:
//! - `BindingId`: Stable identity of a single binding entry
//! - `CompositeKind`: The composite layouts the crate understands
//! - `BindingKind`: Plain binding, composite header or composite part
//! - `Binding`: One entry of an action's binding list
//! - `ActionRef` / `SlotRef`: Addressing actions and binding slots
//!
//! Identity is an explicitly generated key rather than a reference, so
//! "same slot, different combination" and "different slot, same path"
//! can always be told apart.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Stable identity of a binding entry.
///
/// Generated once when the binding is created and never reused. Two
/// bindings with the same path are still different bindings.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct BindingId(Uuid);

impl BindingId {
    /// Generates a fresh identity.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for BindingId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for BindingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Composite binding layouts
///
/// - `TwoOptionalModifiers`: Flexible three-part composite
///   (Modifier1, Modifier2, Button) where either modifier may be empty
/// - `OneModifier`: Fixed two-part composite (Modifier, Binding)
/// - `TwoModifiers`: Fixed three-part composite (Modifier1, Modifier2, Binding)
/// - `Other`: Any composite this crate does not interpret
#[derive(Clone, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum CompositeKind {
    TwoOptionalModifiers,
    OneModifier,
    TwoModifiers,
    Other(String),
}

impl CompositeKind {
    /// True for the flexible optional-modifiers composite.
    pub fn is_flexible(&self) -> bool {
        matches!(self, CompositeKind::TwoOptionalModifiers)
    }
}

impl fmt::Display for CompositeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompositeKind::TwoOptionalModifiers => write!(f, "TwoOptionalModifiers"),
            CompositeKind::OneModifier => write!(f, "OneModifier"),
            CompositeKind::TwoModifiers => write!(f, "TwoModifiers"),
            CompositeKind::Other(name) => write!(f, "{}", name),
        }
    }
}

/// What role an entry plays in an action's binding list
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(tag = "type", content = "name", rename_all = "snake_case")]
pub enum BindingKind {
    /// Standalone binding
    Plain,
    /// Header of a composite; its parts follow it directly
    Composite(CompositeKind),
    /// Named part of the composite whose header precedes it
    Part(String),
}

/// A single binding entry
///
/// The effective path is the override path when one is applied, otherwise
/// the default path. An empty effective path means "unbound", which is a
/// valid state distinct from the entry not existing at all.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Binding {
    /// Stable identity
    #[serde(default)]
    pub id: BindingId,

    /// Role of this entry in the binding list
    #[serde(default = "default_kind")]
    pub kind: BindingKind,

    /// Default path (e.g. "<Keyboard>/space"); unused by composite headers
    #[serde(default)]
    pub path: String,

    /// Path applied on top of the default one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub override_path: Option<String>,

    /// Control-scheme groups, separated by ';' (e.g. "Keyboard&Mouse")
    #[serde(default)]
    pub groups: String,
}

fn default_kind() -> BindingKind {
    BindingKind::Plain
}

impl Binding {
    /// Creates a plain binding.
    pub fn plain(path: &str, groups: &str) -> Self {
        Self {
            id: BindingId::new(),
            kind: BindingKind::Plain,
            path: path.to_string(),
            override_path: None,
            groups: groups.to_string(),
        }
    }

    /// Creates a composite header.
    pub fn composite(kind: CompositeKind, groups: &str) -> Self {
        Self {
            id: BindingId::new(),
            kind: BindingKind::Composite(kind),
            path: String::new(),
            override_path: None,
            groups: groups.to_string(),
        }
    }

    /// Creates a named composite part.
    pub fn part(name: &str, path: &str, groups: &str) -> Self {
        Self {
            id: BindingId::new(),
            kind: BindingKind::Part(name.to_string()),
            path: path.to_string(),
            override_path: None,
            groups: groups.to_string(),
        }
    }

    /// Path currently in effect.
    pub fn effective_path(&self) -> &str {
        self.override_path.as_deref().unwrap_or(&self.path)
    }

    pub fn is_composite(&self) -> bool {
        matches!(self.kind, BindingKind::Composite(_))
    }

    pub fn is_part_of_composite(&self) -> bool {
        matches!(self.kind, BindingKind::Part(_))
    }

    /// Composite kind when this entry is a header.
    pub fn composite_kind(&self) -> Option<&CompositeKind> {
        match &self.kind {
            BindingKind::Composite(kind) => Some(kind),
            _ => None,
        }
    }

    /// True if any of the ';'-separated groups equals `group`.
    pub fn in_group(&self, group: &str) -> bool {
        self.groups.split(';').any(|g| g.trim() == group)
    }
}

/// Reference to an action inside an action map
#[derive(Clone, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct ActionRef {
    pub map: String,
    pub action: String,
}

impl ActionRef {
    pub fn new(map: &str, action: &str) -> Self {
        Self {
            map: map.to_string(),
            action: action.to_string(),
        }
    }
}

impl fmt::Display for ActionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.map, self.action)
    }
}

/// Reference to one binding entry of an action
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct SlotRef {
    pub action: ActionRef,
    pub index: usize,
}

impl SlotRef {
    pub fn new(action: ActionRef, index: usize) -> Self {
        Self { action, index }
    }
}

impl fmt::Display for SlotRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.action, self.index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effective_path_prefers_override() {
        let mut binding = Binding::plain("<Keyboard>/a", "Keyboard&Mouse");
        assert_eq!(binding.effective_path(), "<Keyboard>/a");

        binding.override_path = Some("<Keyboard>/b".to_string());
        assert_eq!(binding.effective_path(), "<Keyboard>/b");

        // An empty override unbinds the entry
        binding.override_path = Some(String::new());
        assert_eq!(binding.effective_path(), "");
    }

    #[test]
    fn test_group_matching() {
        let binding = Binding::plain("<Keyboard>/a", "Keyboard&Mouse;Touch");
        assert!(binding.in_group("Keyboard&Mouse"));
        assert!(binding.in_group("Touch"));
        assert!(!binding.in_group("Gamepad"));
    }

    #[test]
    fn test_ids_are_unique() {
        let a = Binding::plain("<Keyboard>/a", "");
        let b = Binding::plain("<Keyboard>/a", "");
        assert_ne!(a.id, b.id);
        assert_ne!(a, b);
    }

    #[test]
    fn test_composite_kind_display() {
        assert_eq!(CompositeKind::TwoOptionalModifiers.to_string(), "TwoOptionalModifiers");
        assert_eq!(CompositeKind::Other("Dpad".to_string()).to_string(), "Dpad");
        assert!(CompositeKind::TwoOptionalModifiers.is_flexible());
        assert!(!CompositeKind::OneModifier.is_flexible());
    }
}
