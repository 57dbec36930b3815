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

//! Conversion between live bindings and `ShortcutBindingsAsset`
//!
//! Binding sets are keyed by the action's `Map/Action` name. An action with
//! no binding on a device is left out of that device's sets when capturing,
//! and a missing entry leaves the binding untouched when applying.

use tracing::{debug, info};

use crate::config::asset::{DataAsset, ShortcutBindingsAsset, ShortcutBindingsAssetBuilder};
use crate::core::devices::{apply_human_path, read_human_path, ControlSchemes, DeviceType};
use crate::core::error::{LookupError, RebindError};
use crate::core::store::BindingStore;
use crate::core::types::ActionRef;

const SETS: [(DeviceType, bool); 4] = [
    (DeviceType::Keyboard, false),
    (DeviceType::Keyboard, true),
    (DeviceType::Gamepad, false),
    (DeviceType::Gamepad, true),
];

/// Reads the four device paths of every action into a new asset.
///
/// `builder` supplies the id and title; its binding sets are replaced.
pub fn capture<S: BindingStore>(
    store: &S,
    builder: ShortcutBindingsAssetBuilder,
    actions: &[ActionRef],
    schemes: &ControlSchemes,
) -> Result<ShortcutBindingsAsset, LookupError> {
    let mut asset = builder.build();

    for action in actions {
        for (device, alternate) in SETS {
            match read_human_path(store, action, device, schemes, alternate) {
                Ok(path) => {
                    asset.set_mut(device, alternate).insert(action.to_string(), path);
                }
                Err(LookupError::NoBindingForDevice { .. }) => {
                    debug!(%action, %device, alternate, "no binding for device, not captured");
                }
                Err(e) => return Err(e),
            }
        }
    }

    info!(asset = %asset, actions = actions.len(), "bindings captured");
    Ok(asset)
}

/// Writes the asset's paths back to the store.
///
/// Returns how many device bindings were applied. Actions without an entry
/// in a set, or without a binding on that device, are skipped.
pub fn apply<S: BindingStore>(
    store: &mut S,
    asset: &ShortcutBindingsAsset,
    actions: &[ActionRef],
    schemes: &ControlSchemes,
) -> Result<usize, RebindError> {
    let mut applied = 0;

    for action in actions {
        let key = action.to_string();
        for (device, alternate) in SETS {
            let Some(path) = asset.set(device, alternate).get(&key) else {
                continue;
            };

            match apply_human_path(store, action, path, device, schemes, alternate) {
                Ok(()) => applied += 1,
                Err(RebindError::Lookup(LookupError::NoBindingForDevice { .. })) => {
                    debug!(%action, %device, alternate, "no binding for device, not applied");
                }
                Err(e) => return Err(e),
            }
        }
    }

    info!(asset = %asset, id = asset.id(), applied, "bindings applied");
    Ok(applied)
}
