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

//! Shortcut profiles
//!
//! A profile links trigger actions to commands. Several profiles can be
//! enabled at once; an "override all" profile switches every other enabled
//! profile off while it is enabled and switches them back on afterwards.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::debug;

use crate::core::error::{ConfigurationError, LookupError};
use crate::core::types::ActionRef;

/// One trigger → command link
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Shortcut {
    pub trigger: ActionRef,
    pub command: String,
}

impl Shortcut {
    pub fn new(trigger: ActionRef, command: &str) -> Self {
        Self {
            trigger,
            command: command.to_string(),
        }
    }
}

/// Named set of shortcuts with distinct triggers
#[derive(Clone, Debug, PartialEq)]
pub struct ShortcutProfile {
    name: String,
    shortcuts: Vec<Shortcut>,
    override_all: bool,
}

impl ShortcutProfile {
    /// Fails when two shortcuts share a trigger.
    pub fn new(name: &str, shortcuts: Vec<Shortcut>, override_all: bool) -> Result<Self, ConfigurationError> {
        check_triggers(name, &shortcuts)?;
        Ok(Self {
            name: name.to_string(),
            shortcuts,
            override_all,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn shortcuts(&self) -> &[Shortcut] {
        &self.shortcuts
    }

    pub fn overrides_all(&self) -> bool {
        self.override_all
    }

    /// Replaces the shortcut list, with the same duplicate check as `new`.
    pub fn set_shortcuts(&mut self, shortcuts: Vec<Shortcut>) -> Result<(), ConfigurationError> {
        check_triggers(&self.name, &shortcuts)?;
        self.shortcuts = shortcuts;
        Ok(())
    }

    /// Command bound to `trigger`, if any.
    pub fn command_for(&self, trigger: &ActionRef) -> Option<&str> {
        self.shortcuts
            .iter()
            .find(|s| s.trigger == *trigger)
            .map(|s| s.command.as_str())
    }
}

fn check_triggers(profile: &str, shortcuts: &[Shortcut]) -> Result<(), ConfigurationError> {
    let mut seen = HashSet::new();
    for shortcut in shortcuts {
        if !seen.insert(&shortcut.trigger) {
            return Err(ConfigurationError::DuplicateTrigger {
                profile: profile.to_string(),
                trigger: shortcut.trigger.to_string(),
            });
        }
    }
    Ok(())
}

/// Handle to a profile inside a `ProfileRegistry`
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct ProfileId(usize);

struct Entry {
    profile: ShortcutProfile,
    enabled: bool,
    /// Profiles this one switched off when it was enabled as override-all
    suppressed: Vec<ProfileId>,
}

/// Owns profiles and tracks which are enabled
#[derive(Default)]
pub struct ProfileRegistry {
    entries: Vec<Entry>,
}

impl ProfileRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a profile in the disabled state.
    pub fn add(&mut self, profile: ShortcutProfile) -> ProfileId {
        self.entries.push(Entry {
            profile,
            enabled: false,
            suppressed: Vec::new(),
        });
        ProfileId(self.entries.len() - 1)
    }

    fn entry(&self, id: ProfileId) -> Result<&Entry, LookupError> {
        self.entries.get(id.0).ok_or(LookupError::ProfileNotFound(id.0))
    }

    fn entry_mut(&mut self, id: ProfileId) -> Result<&mut Entry, LookupError> {
        self.entries.get_mut(id.0).ok_or(LookupError::ProfileNotFound(id.0))
    }

    pub fn profile(&self, id: ProfileId) -> Result<&ShortcutProfile, LookupError> {
        Ok(&self.entry(id)?.profile)
    }

    pub fn is_enabled(&self, id: ProfileId) -> Result<bool, LookupError> {
        Ok(self.entry(id)?.enabled)
    }

    pub fn enable(&mut self, id: ProfileId) -> Result<(), LookupError> {
        let entry = self.entry_mut(id)?;
        if entry.enabled {
            return Ok(());
        }
        entry.enabled = true;
        self.suppress_others(id)
    }

    /// Disables a profile. An override-all profile restores the profiles it
    /// suppressed, unless another override-all profile is still enabled.
    pub fn disable(&mut self, id: ProfileId) -> Result<(), LookupError> {
        let entry = self.entry_mut(id)?;
        if !entry.enabled {
            return Ok(());
        }
        entry.enabled = false;
        self.restore_suppressed(id)
    }

    pub fn set_override_all(&mut self, id: ProfileId, value: bool) -> Result<(), LookupError> {
        let entry = self.entry_mut(id)?;
        entry.profile.override_all = value;
        if !entry.enabled {
            return Ok(());
        }
        self.suppress_others(id)
    }

    fn suppress_others(&mut self, id: ProfileId) -> Result<(), LookupError> {
        let entry = self.entry(id)?;
        if !entry.profile.override_all || !entry.suppressed.is_empty() {
            return Ok(());
        }

        let others = (0..self.entries.len())
            .map(ProfileId)
            .filter(|&other| other != id && self.entries[other.0].enabled)
            .collect::<Vec<_>>();
        for other in &others {
            self.entries[other.0].enabled = false;
        }

        debug!(profile = %self.entries[id.0].profile.name, suppressed = others.len(), "override-all profile enabled");
        self.entry_mut(id)?.suppressed = others;
        Ok(())
    }

    fn restore_suppressed(&mut self, id: ProfileId) -> Result<(), LookupError> {
        let entry = self.entry(id)?;
        if !entry.profile.override_all || entry.suppressed.is_empty() {
            return Ok(());
        }

        let other_override_enabled = self
            .entries
            .iter()
            .enumerate()
            .any(|(i, e)| i != id.0 && e.enabled && e.profile.override_all);
        if other_override_enabled {
            return Ok(());
        }

        let suppressed = std::mem::take(&mut self.entry_mut(id)?.suppressed);
        for other in suppressed {
            if let Some(entry) = self.entries.get_mut(other.0) {
                entry.enabled = true;
            }
        }
        Ok(())
    }

    /// Commands of every enabled profile bound to `trigger`.
    pub fn dispatch(&self, trigger: &ActionRef) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|e| e.enabled)
            .filter_map(|e| e.profile.command_for(trigger))
            .collect()
    }
}
