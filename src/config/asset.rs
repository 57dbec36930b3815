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

//! Persisted shortcut bindings
//!
//! `ShortcutBindingsAsset` is the on-disk record of a user's shortcuts:
//! four binding sets (keyboard, keyboard alternate, gamepad, gamepad
//! alternate), each mapping an action to its human-readable path
//! (`leftCtrl+s`).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::core::devices::DeviceType;

/// Id of the default shortcuts asset
pub const DEFAULT_ASSET_ID: &str = "ZZ";
/// Title of the default shortcuts asset
pub const DEFAULT_ASSET_TITLE: &str = "Shortcuts";

/// Action ("Map/Action") → human-readable path
pub type BindingSet = BTreeMap<String, String>;

/// Anything an `AssetStore` can key by id and title
pub trait DataAsset {
    fn id(&self) -> &str;
    fn title(&self) -> &str;
}

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct ShortcutBindingsAsset {
    id: String,
    title: String,
    #[serde(default)]
    keyboard: BindingSet,
    #[serde(default)]
    keyboard_alt: BindingSet,
    #[serde(default)]
    gamepad: BindingSet,
    #[serde(default)]
    gamepad_alt: BindingSet,
}

impl ShortcutBindingsAsset {
    pub fn builder() -> ShortcutBindingsAssetBuilder {
        ShortcutBindingsAssetBuilder::new()
    }

    pub fn keyboard(&self) -> &BindingSet {
        &self.keyboard
    }

    pub fn keyboard_alt(&self) -> &BindingSet {
        &self.keyboard_alt
    }

    pub fn gamepad(&self) -> &BindingSet {
        &self.gamepad
    }

    pub fn gamepad_alt(&self) -> &BindingSet {
        &self.gamepad_alt
    }

    /// Binding set of one device, primary or alternate.
    pub fn set(&self, device: DeviceType, alternate: bool) -> &BindingSet {
        match (device, alternate) {
            (DeviceType::Keyboard, false) => &self.keyboard,
            (DeviceType::Keyboard, true) => &self.keyboard_alt,
            (DeviceType::Gamepad, false) => &self.gamepad,
            (DeviceType::Gamepad, true) => &self.gamepad_alt,
        }
    }

    pub fn set_mut(&mut self, device: DeviceType, alternate: bool) -> &mut BindingSet {
        match (device, alternate) {
            (DeviceType::Keyboard, false) => &mut self.keyboard,
            (DeviceType::Keyboard, true) => &mut self.keyboard_alt,
            (DeviceType::Gamepad, false) => &mut self.gamepad,
            (DeviceType::Gamepad, true) => &mut self.gamepad_alt,
        }
    }

    pub fn set_title(&mut self, title: &str) {
        self.title = title.to_string();
    }
}

impl DataAsset for ShortcutBindingsAsset {
    fn id(&self) -> &str {
        &self.id
    }

    fn title(&self) -> &str {
        &self.title
    }
}

impl fmt::Display for ShortcutBindingsAsset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.title)
    }
}

/// Builder for `ShortcutBindingsAsset`
///
/// Starts from the default id and title with four empty sets.
#[derive(Debug)]
pub struct ShortcutBindingsAssetBuilder {
    asset: ShortcutBindingsAsset,
}

impl Default for ShortcutBindingsAssetBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ShortcutBindingsAssetBuilder {
    pub fn new() -> Self {
        Self {
            asset: ShortcutBindingsAsset {
                id: DEFAULT_ASSET_ID.to_string(),
                title: DEFAULT_ASSET_TITLE.to_string(),
                ..ShortcutBindingsAsset::default()
            },
        }
    }

    pub fn with_id(mut self, id: &str) -> Self {
        self.asset.id = id.to_string();
        self
    }

    pub fn with_title(mut self, title: &str) -> Self {
        self.asset.title = title.to_string();
        self
    }

    pub fn with_keyboard(mut self, set: BindingSet) -> Self {
        self.asset.keyboard = set;
        self
    }

    pub fn with_keyboard_alt(mut self, set: BindingSet) -> Self {
        self.asset.keyboard_alt = set;
        self
    }

    pub fn with_gamepad(mut self, set: BindingSet) -> Self {
        self.asset.gamepad = set;
        self
    }

    pub fn with_gamepad_alt(mut self, set: BindingSet) -> Self {
        self.asset.gamepad_alt = set;
        self
    }

    /// Copies the four binding sets of `other`; id and title are kept.
    pub fn as_copy(self, other: &ShortcutBindingsAsset) -> Self {
        self.with_keyboard(other.keyboard.clone())
            .with_keyboard_alt(other.keyboard_alt.clone())
            .with_gamepad(other.gamepad.clone())
            .with_gamepad_alt(other.gamepad_alt.clone())
    }

    pub fn build(self) -> ShortcutBindingsAsset {
        self.asset
    }
}
