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

//! src/core/devices.rs
//!
//! Devices, control schemes and human-readable paths
//!
//! Binding paths carry a device prefix (`<Keyboard>/space`). The persisted
//! shortcut format drops the prefix and joins composite parts with '+'
//! (`leftShift+space`). This module converts between the two and finds
//! which binding of an action belongs to a device.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::{fmt, sync::LazyLock};

use crate::core::combination::BindingCombination;
use crate::core::composite::enclosing_composite;
use crate::core::error::{ConfigurationError, LookupError, RebindError};
use crate::core::store::{Action, BindingStore};
use crate::core::types::{ActionRef, CompositeKind, SlotRef};

const GAMEPAD_DEVICE_PATH: &str = "<Gamepad>/";
const KEYBOARD_DEVICE_PATH: &str = "<Keyboard>/";
const MOUSE_DEVICE_PATH: &str = "<Mouse>/";

const MOUSE_BUTTONS: &[&str] = &[
    "leftButton",
    "rightButton",
    "middleButton",
    "forwardButton",
    "backButton",
];

#[allow(clippy::expect_used)]
static DEVICE_ROOT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^/(\w+)").expect("device root pattern should be valid regex"));

#[allow(clippy::expect_used)]
static LEADING_SLASH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^/").expect("leading slash pattern should be valid regex"));

/// Devices a shortcut can be bound on
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum DeviceType {
    /// Keyboard, mouse buttons included
    Keyboard,
    Gamepad,
}

impl fmt::Display for DeviceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceType::Keyboard => write!(f, "keyboard"),
            DeviceType::Gamepad => write!(f, "gamepad"),
        }
    }
}

/// Binding group names of the control schemes
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct ControlSchemes {
    pub keyboard_group: String,
    pub gamepad_group: String,
}

impl Default for ControlSchemes {
    fn default() -> Self {
        Self {
            keyboard_group: "Keyboard&Mouse".to_string(),
            gamepad_group: "Gamepad".to_string(),
        }
    }
}

impl ControlSchemes {
    pub fn group(&self, device: DeviceType) -> &str {
        match device {
            DeviceType::Keyboard => &self.keyboard_group,
            DeviceType::Gamepad => &self.gamepad_group,
        }
    }
}

/// Converts a raw control path to binding-path form.
///
/// `/Keyboard/space` becomes `<Keyboard>/space`.
pub fn format_control_path(path: &str) -> String {
    let formatted = DEVICE_ROOT.replace(path, "<$1>");
    LEADING_SLASH.replace(&formatted, "").into_owned()
}

/// Device prefix a human-readable `path` gets on `device`.
///
/// Empty paths get no prefix; mouse buttons live on the keyboard scheme.
pub fn device_prefix(path: &str, device: DeviceType) -> &'static str {
    if path.is_empty() {
        return "";
    }

    match device {
        DeviceType::Gamepad => GAMEPAD_DEVICE_PATH,
        DeviceType::Keyboard if MOUSE_BUTTONS.iter().any(|b| path.contains(b)) => {
            MOUSE_DEVICE_PATH
        }
        DeviceType::Keyboard => KEYBOARD_DEVICE_PATH,
    }
}

/// Effective path without its device prefix (`<Keyboard>/s` → `s`).
pub fn strip_device(path: &str, device: DeviceType) -> String {
    let prefix = device_prefix(path, device);
    if prefix.is_empty() {
        return path.to_string();
    }
    path.replace(prefix, "")
}

/// Human-readable path with its device prefix added.
pub fn with_device(path: &str, device: DeviceType) -> String {
    format!("{}{}", device_prefix(path, device), path)
}

/// Index of the binding of `action` used on `device`.
///
/// Returns the first binding in the device's group, or the second when
/// `alternate` is set. Composite headers carry no input and are never
/// returned; skipping a composite's first part skips the whole composite.
pub fn binding_index_by_device(
    action: &Action,
    device: DeviceType,
    schemes: &ControlSchemes,
    alternate: bool,
) -> Option<usize> {
    let group = schemes.group(device);
    let mut skip_primary = alternate;
    let mut wait_for_composite = false;

    for (index, binding) in action.bindings.iter().enumerate() {
        if binding.is_composite() {
            wait_for_composite = false;
            continue;
        }
        if wait_for_composite || !binding.in_group(group) {
            continue;
        }
        if skip_primary {
            skip_primary = false;
            wait_for_composite = binding.is_part_of_composite();
            continue;
        }
        return Some(index);
    }

    None
}

/// Slot indices a device binding occupies, first part to button.
///
/// A composite part at `index` expands to the composite's parts; a plain
/// binding is a single slot.
fn slot_layout(action: &Action, index: usize) -> Result<Vec<usize>, LookupError> {
    let parts = match enclosing_composite(&action.bindings, index) {
        Some(CompositeKind::TwoOptionalModifiers) | Some(CompositeKind::TwoModifiers) => 3,
        Some(CompositeKind::OneModifier) => 2,
        _ => 1,
    };

    let layout = (index..index + parts).collect::<Vec<_>>();
    for &i in &layout {
        action.binding(i)?;
    }
    Ok(layout)
}

fn resolve_index(
    action: &Action,
    device: DeviceType,
    schemes: &ControlSchemes,
    alternate: bool,
) -> Result<usize, LookupError> {
    binding_index_by_device(action, device, schemes, alternate).ok_or_else(|| {
        LookupError::NoBindingForDevice {
            action: action.name.clone(),
            device,
        }
    })
}

/// Human-readable path of an action's device binding.
///
/// Composite parts are joined with '+', skipping empty ones.
pub fn read_human_path<S: BindingStore>(
    store: &S,
    action: &ActionRef,
    device: DeviceType,
    schemes: &ControlSchemes,
    alternate: bool,
) -> Result<String, LookupError> {
    let action = store.action(action)?;
    let index = resolve_index(action, device, schemes, alternate)?;

    let paths = slot_layout(action, index)?
        .into_iter()
        .map(|i| action.bindings[i].effective_path())
        .filter(|p| !p.is_empty())
        .map(|p| strip_device(p, device))
        .collect::<Vec<_>>();

    Ok(paths.join("+"))
}

/// Applies a human-readable path to an action's device binding.
///
/// The string is split into a combination first. A flexible composite takes
/// 1 to 3 parts; a fixed composite needs exactly its own modifier count; a
/// plain binding takes a single part. Paths already in effect are not
/// re-applied.
pub fn apply_human_path<S: BindingStore>(
    store: &mut S,
    action_ref: &ActionRef,
    human_path: &str,
    device: DeviceType,
    schemes: &ControlSchemes,
    alternate: bool,
) -> Result<(), RebindError> {
    let combination = BindingCombination::parse(human_path)?;

    let (layout, kind) = {
        let action = store.action(action_ref)?;
        let index = resolve_index(action, device, schemes, alternate)?;
        let kind = enclosing_composite(&action.bindings, index).cloned();
        (slot_layout(action, index)?, kind)
    };

    let invalid = || ConfigurationError::InvalidCombination(human_path.to_string());
    let assignments: Vec<(usize, &str)> = match (kind, layout.as_slice()) {
        (Some(CompositeKind::TwoOptionalModifiers), &[m1, m2, button])
        | (Some(CompositeKind::TwoModifiers), &[m1, m2, button]) => vec![
            (m1, combination.modifier1().path()),
            (m2, combination.modifier2().path()),
            (button, combination.button().path()),
        ],
        (Some(CompositeKind::OneModifier), &[modifier, button]) => {
            if !combination.modifier2().is_empty() {
                return Err(invalid().into());
            }
            vec![
                (modifier, combination.modifier1().path()),
                (button, combination.button().path()),
            ]
        }
        (_, &[button]) => {
            if combination.uses_modifiers() {
                return Err(invalid().into());
            }
            vec![(button, combination.button().path())]
        }
        _ => return Err(invalid().into()),
    };

    for (index, path) in assignments {
        let slot = SlotRef::new(action_ref.clone(), index);
        let final_path = with_device(path, device);
        if store.effective_path(&slot)? == final_path {
            continue;
        }
        store.set_effective_path(&slot, &final_path)?;
    }

    Ok(())
}
