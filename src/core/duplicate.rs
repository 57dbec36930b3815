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

//! src/core/duplicate.rs
//!
//! Duplicate combination detection
//!
//! Before a captured combination is committed, every binding in the
//! action's conflict domain (its own map plus linked maps) is compared
//! against it. A path match on the button alone is not enough:
//!
//! - a query without modifiers does not collide with the button of a
//!   composite that has a modifier configured
//! - a query with modifiers only collides with a composite button whose
//!   modifier parts hold the same paths, and are different slots
//!
//! The first binding surviving these checks, in map order then binding
//! order, is the duplicate.

use std::collections::BTreeSet;
use tracing::debug;

use crate::core::combination::{BindingCombination, BindingSlot, CombinationBuilder};
use crate::core::composite::enclosing_composite;
use crate::core::devices::{ControlSchemes, DeviceType};
use crate::core::error::LookupError;
use crate::core::links::ActionMapLinks;
use crate::core::rebind::SlotLayout;
use crate::core::store::{Action, BindingStore};
use crate::core::types::{ActionRef, Binding, CompositeKind};

const DEVICE_SLOTS: [(DeviceType, bool); 4] = [
    (DeviceType::Keyboard, false),
    (DeviceType::Keyboard, true),
    (DeviceType::Gamepad, false),
    (DeviceType::Gamepad, true),
];

/// A binding elsewhere that already uses the queried combination
#[derive(Clone, Debug, PartialEq)]
pub struct Duplicate {
    /// Action owning the duplicate
    pub action: ActionRef,
    /// Button slot index of the duplicate inside its action
    pub index: usize,
    /// The duplicate, linked to its own binding entries
    pub combination: BindingCombination,
}

/// A device binding whose combination is already used by another action
#[derive(Clone, Debug, PartialEq)]
pub struct DeviceDuplicate {
    pub action: ActionRef,
    pub device: DeviceType,
    pub alternate: bool,
    /// The action's own combination on that device
    pub combination: BindingCombination,
    pub duplicate: Duplicate,
}

/// Scans linked action maps for a combination that is already in use
pub struct DuplicateFinder<'a, S: BindingStore> {
    store: &'a S,
    links: &'a ActionMapLinks,
}

impl<'a, S: BindingStore> DuplicateFinder<'a, S> {
    pub fn new(store: &'a S, links: &'a ActionMapLinks) -> Self {
        Self { store, links }
    }

    /// Finds a binding in the conflict domain of `action` that collides
    /// with `combination`.
    ///
    /// Returns `Ok(None)` when there is no conflict. The slot the
    /// combination was read from never conflicts with itself, and an
    /// empty button never conflicts with anything.
    pub fn find_duplicate(
        &self,
        action: &ActionRef,
        combination: &BindingCombination,
    ) -> Result<Option<Duplicate>, LookupError> {
        // Stale references fail loudly even when nothing could match
        self.store.action(action)?;

        if combination.button().is_empty() {
            return Ok(None);
        }

        let uses_modifiers = combination.uses_modifiers();

        for map_name in self.links.domain(&action.map) {
            let Some(map) = self.store.map(&map_name) else {
                debug!(map = %map_name, "linked action map not present, skipping");
                continue;
            };

            for entry in map.entries() {
                if entry.binding.effective_path() != combination.button().path() {
                    continue;
                }
                if Some(entry.binding.id) == combination.button().id() {
                    continue;
                }

                let bindings = &entry.action.bindings;
                let matches = if uses_modifiers {
                    modifiers_match(bindings, entry.index, combination)
                } else {
                    !has_configured_modifiers(bindings, entry.index)
                };
                if !matches {
                    continue;
                }

                let found = Duplicate {
                    action: ActionRef::new(&map.name, &entry.action.name),
                    index: entry.index,
                    combination: linked_combination(entry.action, entry.index, uses_modifiers),
                };
                debug!(
                    query = %combination,
                    duplicate = %found.action,
                    index = found.index,
                    "duplicate combination found"
                );
                return Ok(Some(found));
            }
        }

        Ok(None)
    }

    /// Checks the keyboard and gamepad bindings, primary and alternate, of
    /// every action in `actions`.
    ///
    /// Each colliding pair is found from both sides but reported once, from
    /// the side scanned first. Actions without a binding on a device are
    /// skipped for that device.
    pub fn find_device_duplicates(
        &self,
        actions: &[ActionRef],
        schemes: &ControlSchemes,
    ) -> Result<Vec<DeviceDuplicate>, LookupError> {
        let mut seen = BTreeSet::new();
        let mut found = Vec::new();

        for action_ref in actions {
            let action = self.store.action(action_ref)?;

            for (device, alternate) in DEVICE_SLOTS {
                let layout = match SlotLayout::for_device(action, device, schemes, alternate) {
                    Ok(layout) => layout,
                    Err(LookupError::NoBindingForDevice { .. }) => continue,
                    Err(e) => return Err(e),
                };

                let combination = CombinationBuilder::new()
                    .with_linked_indices(action, layout.button(), layout.modifier1(), layout.modifier2())?
                    .build();
                if combination.is_empty() {
                    continue;
                }

                let Some(duplicate) = self.find_duplicate(action_ref, &combination)? else {
                    continue;
                };

                let mut pair = [
                    (action_ref.clone(), layout.button()),
                    (duplicate.action.clone(), duplicate.index),
                ];
                pair.sort();
                if seen.insert(pair) {
                    found.push(DeviceDuplicate {
                        action: action_ref.clone(),
                        device,
                        alternate,
                        combination,
                        duplicate,
                    });
                }
            }
        }

        Ok(found)
    }
}

/// Part preceding the button at `index` by `offset` slots, if there is one.
fn modifier_part(bindings: &[Binding], index: usize, offset: usize) -> Option<&Binding> {
    let position = index.checked_sub(offset)?;
    bindings
        .get(position)
        .filter(|binding| binding.is_part_of_composite())
}

/// Modifier parts linked to the button at `index`, by its composite kind.
///
/// Two-modifier composites (flexible or fixed) have both modifiers before
/// the button; a one-modifier composite has a single modifier directly
/// before it. Plain bindings have none.
fn modifier_parts(bindings: &[Binding], index: usize) -> (Option<&Binding>, Option<&Binding>) {
    match enclosing_composite(bindings, index) {
        Some(CompositeKind::TwoOptionalModifiers) | Some(CompositeKind::TwoModifiers) => (
            modifier_part(bindings, index, 2),
            modifier_part(bindings, index, 1),
        ),
        Some(CompositeKind::OneModifier) => (modifier_part(bindings, index, 1), None),
        _ => (None, None),
    }
}

/// The button at `index` requires a modifier to be held.
fn has_configured_modifiers(bindings: &[Binding], index: usize) -> bool {
    let (modifier1, modifier2) = modifier_parts(bindings, index);
    [modifier1, modifier2]
        .into_iter()
        .flatten()
        .any(|part| !part.effective_path().is_empty())
}

/// The button's modifier parts carry the queried modifier paths and are not
/// the queried slots themselves. A missing part only matches an empty
/// queried modifier.
fn modifiers_match(bindings: &[Binding], index: usize, combination: &BindingCombination) -> bool {
    let (modifier1, modifier2) = modifier_parts(bindings, index);
    let same = |part: Option<&Binding>, slot: &BindingSlot| match part {
        Some(part) => part.effective_path() == slot.path() && Some(part.id) != slot.id(),
        None => slot.is_empty(),
    };

    modifier1.is_some() && same(modifier1, combination.modifier1()) && same(modifier2, combination.modifier2())
}

fn linked_combination(action: &Action, index: usize, uses_modifiers: bool) -> BindingCombination {
    let bindings = &action.bindings;
    let (modifier1, modifier2) = if uses_modifiers {
        modifier_parts(bindings, index)
    } else {
        (None, None)
    };

    CombinationBuilder::new()
        .with_linked_bindings(&bindings[index], modifier1, modifier2)
        .build()
}
