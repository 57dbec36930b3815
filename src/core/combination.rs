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

//! src/core/combination.rs
//!
//! Binding combinations: up to two modifiers plus one button
//!
//! A `BindingCombination` is what the user pressed, or what a slot is
//! currently bound to. It is an immutable value; every change goes through
//! `CombinationBuilder` and produces a new combination.
//!
//! # String form
//! `display_string()` joins the non-empty slot paths with '+' in
//! Modifier1 → Modifier2 → Button order. `BindingCombination::parse` is its
//! inverse and fills slots from the left: one part is a button, two parts
//! are Modifier1+Button, three parts are Modifier1+Modifier2+Button.

use nom::{
    bytes::complete::take_while1, character::complete::char, multi::separated_list1, IResult,
    Parser,
};
use std::fmt;

use crate::core::error::{ConfigurationError, LookupError};
use crate::core::store::Action;
use crate::core::types::{Binding, BindingId};

/// One input slot of a combination
///
/// `id` is the identity of the binding entry the slot was read from;
/// detached slots (built from a bare path, or standing in for an absent
/// modifier) have none. An empty path means the slot is unbound.
#[derive(Clone, Debug, Default, Eq, Hash, PartialEq)]
pub struct BindingSlot {
    id: Option<BindingId>,
    group: String,
    path: String,
}

impl BindingSlot {
    /// Absent slot: no identity, no group, no path.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Slot holding a path but not linked to any binding entry.
    pub fn detached(path: &str) -> Self {
        Self {
            id: None,
            group: String::new(),
            path: path.to_string(),
        }
    }

    /// Slot linked to a binding entry, holding its effective path.
    pub fn from_binding(binding: &Binding) -> Self {
        Self {
            id: Some(binding.id),
            group: binding.groups.clone(),
            path: binding.effective_path().to_string(),
        }
    }

    pub fn id(&self) -> Option<BindingId> {
        self.id
    }

    pub fn group(&self) -> &str {
        &self.group
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn is_empty(&self) -> bool {
        self.path.is_empty()
    }

    fn with_path(&self, path: &str) -> Self {
        Self {
            id: self.id,
            group: self.group.clone(),
            path: path.to_string(),
        }
    }
}

/// Two optional modifiers and a button
///
/// Equality covers identity, group and path of all three slots; use
/// `has_same_inputs` to compare paths only.
#[derive(Clone, Debug, Default, Eq, Hash, PartialEq)]
pub struct BindingCombination {
    modifier1: BindingSlot,
    modifier2: BindingSlot,
    button: BindingSlot,
}

impl BindingCombination {
    pub fn builder() -> CombinationBuilder {
        CombinationBuilder::new()
    }

    /// Combination with all three slots cleared.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn modifier1(&self) -> &BindingSlot {
        &self.modifier1
    }

    pub fn modifier2(&self) -> &BindingSlot {
        &self.modifier2
    }

    pub fn button(&self) -> &BindingSlot {
        &self.button
    }

    /// True when either modifier has a path.
    pub fn uses_modifiers(&self) -> bool {
        !self.modifier1.is_empty() || !self.modifier2.is_empty()
    }

    /// True when no slot has a path.
    pub fn is_empty(&self) -> bool {
        !self.uses_modifiers() && self.button.is_empty()
    }

    /// Non-empty slot paths joined by '+'; empty when nothing is bound.
    ///
    /// Empty slots leave no trace, so which modifier slot held a path is
    /// lost.
    pub fn display_string(&self) -> String {
        [&self.modifier1, &self.modifier2, &self.button]
            .iter()
            .filter(|slot| !slot.is_empty())
            .map(|slot| slot.path())
            .collect::<Vec<_>>()
            .join("+")
    }

    /// Same paths in the same positions, identities ignored.
    pub fn has_same_inputs(&self, other: &BindingCombination) -> bool {
        self.modifier1.path == other.modifier1.path
            && self.modifier2.path == other.modifier2.path
            && self.button.path == other.button.path
    }

    /// Parses a '+'-joined string produced by `display_string`.
    ///
    /// Modifiers fill from the left: with two parts the first is
    /// `modifier1`. A combination with only `modifier2` set therefore comes
    /// back with that path in `modifier1`; the display string is unchanged.
    ///
    /// An empty string yields the empty combination. More than three parts,
    /// or an empty part (e.g. "a++b"), is rejected.
    pub fn parse(input: &str) -> Result<Self, ConfigurationError> {
        if input.trim().is_empty() {
            return Ok(Self::empty());
        }

        let invalid = || ConfigurationError::InvalidCombination(input.to_string());

        let (rest, parts) = parse_parts(input).map_err(|_| invalid())?;
        if !rest.is_empty() {
            return Err(invalid());
        }

        let parts = parts.iter().map(|p| p.trim()).collect::<Vec<_>>();
        if parts.iter().any(|p| p.is_empty()) {
            return Err(invalid());
        }

        let builder = CombinationBuilder::new();
        let combination = match parts.as_slice() {
            [button] => builder.with_button(button),
            [modifier, button] => builder.with_modifier1(modifier).with_button(button),
            [modifier1, modifier2, button] => builder
                .with_modifier1(modifier1)
                .with_modifier2(modifier2)
                .with_button(button),
            _ => return Err(invalid()),
        };

        Ok(combination.build())
    }
}

impl fmt::Display for BindingCombination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_string())
    }
}

fn parse_parts(input: &str) -> IResult<&str, Vec<&str>> {
    separated_list1(char('+'), take_while1(|c: char| c != '+')).parse(input)
}

/// Builder for `BindingCombination`
///
/// `build` validates nothing: any slot may be empty.
#[derive(Clone, Debug, Default)]
pub struct CombinationBuilder {
    modifier1: BindingSlot,
    modifier2: BindingSlot,
    button: BindingSlot,
}

impl CombinationBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts from an existing combination, identities included.
    pub fn from(combination: &BindingCombination) -> Self {
        Self {
            modifier1: combination.modifier1.clone(),
            modifier2: combination.modifier2.clone(),
            button: combination.button.clone(),
        }
    }

    /// Links the slots to binding entries.
    ///
    /// `None` stands for an absent modifier and yields an empty, detached
    /// slot; the slot positions stay fixed either way.
    pub fn with_linked_bindings(
        mut self,
        button: &Binding,
        modifier1: Option<&Binding>,
        modifier2: Option<&Binding>,
    ) -> Self {
        self.button = BindingSlot::from_binding(button);
        self.modifier1 = modifier1.map(BindingSlot::from_binding).unwrap_or_default();
        self.modifier2 = modifier2.map(BindingSlot::from_binding).unwrap_or_default();
        self
    }

    /// Links the slots to the bindings at the given indices of `action`.
    pub fn with_linked_indices(
        self,
        action: &Action,
        button: usize,
        modifier1: Option<usize>,
        modifier2: Option<usize>,
    ) -> Result<Self, LookupError> {
        let button = action.binding(button)?;
        let modifier1 = modifier1.map(|i| action.binding(i)).transpose()?;
        let modifier2 = modifier2.map(|i| action.binding(i)).transpose()?;

        Ok(self.with_linked_bindings(button, modifier1, modifier2))
    }

    pub fn with_modifier1(mut self, path: &str) -> Self {
        self.modifier1 = self.modifier1.with_path(path);
        self
    }

    pub fn with_modifier2(mut self, path: &str) -> Self {
        self.modifier2 = self.modifier2.with_path(path);
        self
    }

    pub fn with_button(mut self, path: &str) -> Self {
        self.button = self.button.with_path(path);
        self
    }

    /// Empties every path, keeping slot identities.
    pub fn clear_paths(self) -> Self {
        self.with_modifier1("").with_modifier2("").with_button("")
    }

    /// Finishes with every path emptied; represents "binding removed".
    pub fn as_empty(self) -> BindingCombination {
        self.clear_paths().build()
    }

    pub fn build(self) -> BindingCombination {
        BindingCombination {
            modifier1: self.modifier1,
            modifier2: self.modifier2,
            button: self.button,
        }
    }
}
