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

//! Optional-modifier composite behaviour
//!
//! Evaluates whether a flexible (two optional modifiers + button) composite
//! is triggered, honouring the modifier press-order policy, and locates the
//! composite header a part belongs to.

use serde::{Deserialize, Serialize};

use crate::core::types::{Binding, CompositeKind};

/// Whether modifiers must go down before the button
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub enum ModifiersOrder {
    /// Follow the `shortcut_keys_consume_input` setting
    #[default]
    Default,
    /// Every modifier must be pressed no later than the button
    Ordered,
    /// Press timing is not checked
    Unordered,
}

impl ModifiersOrder {
    /// Resolves `Default` against the input-consumption setting.
    ///
    /// Consuming shortcut keys means a modifier pressed after the button
    /// must not trigger the shortcut, so `Default` becomes `Ordered`;
    /// otherwise it becomes `Unordered`. Explicit choices are kept.
    pub fn resolve(self, shortcut_keys_consume_input: bool) -> ModifiersOrder {
        match self {
            ModifiersOrder::Default if shortcut_keys_consume_input => ModifiersOrder::Ordered,
            ModifiersOrder::Default => ModifiersOrder::Unordered,
            explicit => explicit,
        }
    }
}

/// State of one composite part at evaluation time
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PartState {
    pub pressed: bool,
    /// Seconds since an arbitrary epoch, comparable between parts
    pub pressed_at: f64,
}

impl PartState {
    pub fn down(pressed_at: f64) -> Self {
        Self {
            pressed: true,
            pressed_at,
        }
    }

    pub fn up() -> Self {
        Self::default()
    }
}

/// Flexible composite: either modifier may be unconfigured (`None`)
#[derive(Clone, Copy, Debug)]
pub struct OptionalModifiersInput {
    pub modifier1: Option<PartState>,
    pub modifier2: Option<PartState>,
    pub button: PartState,
}

impl OptionalModifiersInput {
    /// True when the button is down and every configured modifier is down,
    /// in the right order for `order` (which should already be resolved).
    pub fn is_triggered(&self, order: ModifiersOrder) -> bool {
        self.button.pressed && self.modifiers_pressed(order)
    }

    fn modifiers_pressed(&self, order: ModifiersOrder) -> bool {
        let down = |m: Option<PartState>| m.map(|s| s.pressed).unwrap_or(true);
        if !(down(self.modifier1) && down(self.modifier2)) {
            return false;
        }

        if order != ModifiersOrder::Ordered {
            return true;
        }

        // Unconfigured modifiers inherit the button's timestamp
        let button_at = self.button.pressed_at;
        let at = |m: Option<PartState>| m.map(|s| s.pressed_at).unwrap_or(button_at);

        at(self.modifier1) <= button_at && at(self.modifier2) <= button_at
    }
}

/// Composite the entry at `index` belongs to.
///
/// Walks back over composite parts to the header. Returns `None` for plain
/// bindings and out-of-range indices; a header returns its own kind.
pub fn enclosing_composite(bindings: &[Binding], index: usize) -> Option<&CompositeKind> {
    let mut current = index;
    loop {
        let binding = bindings.get(current)?;
        if let Some(kind) = binding.composite_kind() {
            return Some(kind);
        }
        if !binding.is_part_of_composite() || current == 0 {
            return None;
        }
        current -= 1;
    }
}
