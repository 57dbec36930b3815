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

//! src/core/decomposer.rs
//!
//! Composite decomposition and captured-input normalisation
//!
//! The flexible composite (two optional modifiers + button) is convenient
//! while editing but wasteful at rest. Decomposition rewrites each one into
//! the smallest equivalent encoding:
//!
//! | non-empty modifiers | emitted                                   |
//! |---------------------|-------------------------------------------|
//! | 0                   | plain binding                             |
//! | 1                   | `OneModifier` {modifier, binding}         |
//! | 2                   | `TwoModifiers` {modifier1, modifier2, binding} |
//!
//! # Architecture
//! Two passes:
//! 1. `group_bindings` splits a binding list into plain entries and
//!    (header, parts) records
//! 2. `emit_fixed` turns one flexible record into its replacement entries
//!
//! Records are rewritten from the last one backwards. Hitting a composite
//! that is not flexible stops processing of that action; everything before
//! it is left as-is.

use std::ops::Range;
use tracing::debug;

use crate::core::combination::{BindingCombination, CombinationBuilder};
use crate::core::devices::format_control_path;
use crate::core::store::{Action, ActionAsset};
use crate::core::types::{Binding, BindingKind, CompositeKind};

/// One record of an action's binding list
#[derive(Clone, Debug, PartialEq)]
pub enum BindingGroup {
    /// Plain binding, or a part with no header in front of it
    Single { index: usize },
    /// Composite header followed by its parts
    Composite {
        header: usize,
        kind: CompositeKind,
        parts: Vec<usize>,
    },
}

impl BindingGroup {
    fn span(&self) -> Range<usize> {
        match self {
            BindingGroup::Single { index } => *index..*index + 1,
            BindingGroup::Composite { header, parts, .. } => {
                let end = parts.last().map(|p| p + 1).unwrap_or(header + 1);
                *header..end
            }
        }
    }
}

/// First pass: split a binding list into records, in list order.
pub fn group_bindings(bindings: &[Binding]) -> Vec<BindingGroup> {
    let mut groups: Vec<BindingGroup> = Vec::new();

    for (index, binding) in bindings.iter().enumerate() {
        match &binding.kind {
            BindingKind::Composite(kind) => groups.push(BindingGroup::Composite {
                header: index,
                kind: kind.clone(),
                parts: Vec::new(),
            }),
            BindingKind::Part(_) => {
                // Parts always follow their header or a sibling directly
                let attached = match groups.last_mut() {
                    Some(BindingGroup::Composite { parts, .. }) => {
                        parts.push(index);
                        true
                    }
                    _ => false,
                };
                if !attached {
                    groups.push(BindingGroup::Single { index });
                }
            }
            BindingKind::Plain => groups.push(BindingGroup::Single { index }),
        }
    }

    groups
}

fn emitted(source: &Binding, kind: BindingKind, groups: &str) -> Binding {
    Binding {
        id: source.id,
        kind,
        path: source.effective_path().to_string(),
        override_path: None,
        groups: groups.to_string(),
    }
}

/// Second pass: replacement entries for one flexible composite.
///
/// The last part is the button; earlier parts are modifiers, furthest from
/// the button first, and only the non-empty ones are kept. Surviving
/// entries keep their identities and take the button's groups. A composite
/// without parts emits nothing; one whose button is unbound emits an
/// unbound plain binding so the slot survives.
pub fn emit_fixed(header: &Binding, parts: &[&Binding]) -> Vec<Binding> {
    let Some((button, modifiers)) = parts.split_last() else {
        return Vec::new();
    };

    let groups = button.groups.as_str();
    if button.effective_path().is_empty() {
        return vec![emitted(button, BindingKind::Plain, groups)];
    }

    let modifiers = modifiers
        .iter()
        .filter(|m| !m.effective_path().is_empty())
        .collect::<Vec<_>>();

    let part = |name: &str| BindingKind::Part(name.to_string());

    match modifiers.as_slice() {
        [] => vec![emitted(button, BindingKind::Plain, groups)],
        [modifier] => vec![
            emitted(header, BindingKind::Composite(CompositeKind::OneModifier), ""),
            emitted(modifier, part("modifier"), groups),
            emitted(button, part("binding"), groups),
        ],
        [modifier1, modifier2, ..] => vec![
            emitted(header, BindingKind::Composite(CompositeKind::TwoModifiers), ""),
            emitted(modifier1, part("modifier1"), groups),
            emitted(modifier2, part("modifier2"), groups),
            emitted(button, part("binding"), groups),
        ],
    }
}

/// Rewrites the flexible composites of one action in place.
///
/// Returns how many composites were replaced.
pub fn decompose_action(action: &mut Action) -> usize {
    let groups = group_bindings(&action.bindings);
    let mut replacements: Vec<(Range<usize>, Vec<Binding>)> = Vec::new();

    for group in groups.iter().rev() {
        let BindingGroup::Composite { header, kind, parts } = group else {
            continue;
        };
        if !kind.is_flexible() {
            debug!(action = %action.name, composite = %kind, "non-flexible composite, stopping");
            break;
        }

        let part_refs = parts.iter().map(|&i| &action.bindings[i]).collect::<Vec<_>>();
        let replacement = emit_fixed(&action.bindings[*header], &part_refs);
        replacements.push((group.span(), replacement));
    }

    // Spans are collected back to front, so earlier indices stay valid
    let count = replacements.len();
    for (span, replacement) in replacements {
        action.bindings.splice(span, replacement);
    }

    if count > 0 {
        debug!(action = %action.name, count, "decomposed flexible composites");
    }
    count
}

/// Rewrites every action of every map. Returns the total replaced.
pub fn decompose_asset(asset: &mut ActionAsset) -> usize {
    asset
        .maps
        .iter_mut()
        .flat_map(|map| map.actions.iter_mut())
        .map(decompose_action)
        .sum()
}

/// Kind of a control reported by the capture session
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ControlKind {
    /// Discrete button or key
    Button,
    /// The synthetic "any key" control
    AnyKey,
    /// Button synthesised from an axis value
    DiscreteButton,
    /// Sticks, triggers read as values, pointers
    Analog,
}

/// A physical control the user pressed during capture
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CapturedControl {
    /// Raw control path (`/Keyboard/space`)
    pub path: String,
    pub kind: ControlKind,
}

impl CapturedControl {
    pub fn button(path: &str) -> Self {
        Self {
            path: path.to_string(),
            kind: ControlKind::Button,
        }
    }
}

/// Turns captured controls into a candidate combination for a slot.
///
/// Only plain buttons count. Without modifier slots the first one becomes
/// the button and the current modifiers are kept. Otherwise the count
/// decides: 1 → Button, 2 → Modifier1 + Button, 3 or more → Modifier1 +
/// Modifier2 + Button from the first three. A layout with a single modifier
/// slot takes at most Modifier1 + Button from the first two. Slot identities
/// come from `current`. Returns `None` when nothing usable was captured.
pub fn normalize_capture(
    current: &BindingCombination,
    candidates: &[CapturedControl],
    modifier_slots: usize,
) -> Option<BindingCombination> {
    let controls = candidates
        .iter()
        .filter(|c| c.kind == ControlKind::Button)
        .map(|c| format_control_path(&c.path))
        .collect::<Vec<_>>();

    let first = controls.first()?;
    if modifier_slots == 0 {
        return Some(CombinationBuilder::from(current).with_button(first).build());
    }

    let cleared = CombinationBuilder::from(current).clear_paths();
    let combination = match (modifier_slots, controls.as_slice()) {
        (_, [button]) => cleared.with_button(button),
        (1, [modifier, button, ..]) | (_, [modifier, button]) => {
            cleared.with_modifier1(modifier).with_button(button)
        }
        (_, [modifier1, modifier2, button, ..]) => cleared
            .with_modifier1(modifier1)
            .with_modifier2(modifier2)
            .with_button(button),
        (_, []) => return None,
    };

    Some(combination.build())
}
