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

//! Rebinding settings and the action-map link table file

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

use crate::config::error::StoreError;
use crate::core::composite::ModifiersOrder;
use crate::core::devices::ControlSchemes;
use crate::core::links::ActionMapLinks;
use crate::core::rebind::RebindOptions;

/// User-tunable rebinding behaviour. Every field has a default, so a
/// settings file only needs the values it changes.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(default)]
pub struct RebindSettings {
    /// Extra time to wait for the next key once a modifier-capable
    /// capture has something
    pub wait_for_another_secs: f64,
    /// Idle time after which a capture gives up
    pub timeout_secs: f64,
    /// Control path that cancels a capture; empty disables it
    pub cancel_sentinel: String,
    pub empty_binding_text: String,
    pub shortcut_keys_consume_input: bool,
    pub modifiers_order: ModifiersOrder,
    pub keyboard_group: String,
    pub gamepad_group: String,
}

impl Default for RebindSettings {
    fn default() -> Self {
        let options = RebindOptions::default();
        let schemes = ControlSchemes::default();
        Self {
            wait_for_another_secs: options.wait_for_another.as_secs_f64(),
            timeout_secs: options.timeout.as_secs_f64(),
            cancel_sentinel: options.cancel_sentinel,
            empty_binding_text: options.empty_binding_text,
            shortcut_keys_consume_input: true,
            modifiers_order: ModifiersOrder::Default,
            keyboard_group: schemes.keyboard_group,
            gamepad_group: schemes.gamepad_group,
        }
    }
}

impl RebindSettings {
    /// Reads settings from a JSON file.
    pub fn load(path: &Path) -> Result<Self, StoreError> {
        if !path.exists() {
            return Err(StoreError::NotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        let settings = serde_json::from_str(&content).map_err(|source| StoreError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        debug!(path = %path.display(), "settings loaded");
        Ok(settings)
    }

    /// Options for `RebindContext`. Negative or non-finite durations become zero.
    pub fn rebind_options(&self) -> RebindOptions {
        RebindOptions {
            wait_for_another: seconds(self.wait_for_another_secs),
            timeout: seconds(self.timeout_secs),
            cancel_sentinel: self.cancel_sentinel.clone(),
            empty_binding_text: self.empty_binding_text.clone(),
        }
    }

    pub fn control_schemes(&self) -> ControlSchemes {
        ControlSchemes {
            keyboard_group: self.keyboard_group.clone(),
            gamepad_group: self.gamepad_group.clone(),
        }
    }

    /// `modifiers_order` with `Default` resolved.
    pub fn effective_modifiers_order(&self) -> ModifiersOrder {
        self.modifiers_order.resolve(self.shortcut_keys_consume_input)
    }
}

fn seconds(value: f64) -> Duration {
    Duration::try_from_secs_f64(value).unwrap_or(Duration::ZERO)
}

/// Reads an action-map link table from a JSON file.
pub fn load_links(path: &Path) -> Result<ActionMapLinks, StoreError> {
    if !path.exists() {
        return Err(StoreError::NotFound(path.to_path_buf()));
    }

    let content = fs::read_to_string(path)?;
    Ok(ActionMapLinks::from_json(&content)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_rebind_options() {
        let settings = RebindSettings::default();
        assert_eq!(settings.rebind_options(), RebindOptions::default());
        assert_eq!(settings.control_schemes(), ControlSchemes::default());
    }

    #[test]
    fn test_negative_duration_becomes_zero() {
        assert_eq!(seconds(-1.0), Duration::ZERO);
        assert_eq!(seconds(f64::NAN), Duration::ZERO);
        assert_eq!(seconds(0.25), Duration::from_millis(250));
    }
}
