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

//! Error types for the binding core
//!
//! Structural problems fail fast: a stale reference is a `LookupError`,
//! a broken static setup is a `ConfigurationError`. Conflicts, cancels
//! and timeouts are not errors and never show up here.

use thiserror::Error;

use crate::core::devices::DeviceType;

/// A referenced map, action or binding does not exist
#[derive(Debug, Error, PartialEq)]
pub enum LookupError {
    #[error("Action map '{0}' not found")]
    MapNotFound(String),

    #[error("Action '{action}' not found in map '{map}'")]
    ActionNotFound { map: String, action: String },

    #[error("Binding index {index} out of range for '{action}' ({len} bindings)")]
    IndexOutOfRange {
        action: String,
        index: usize,
        len: usize,
    },

    #[error("No {device} binding found for '{action}'")]
    NoBindingForDevice { action: String, device: DeviceType },

    #[error("Shortcut profile #{0} not found")]
    ProfileNotFound(usize),
}

/// Static setup is invalid
#[derive(Debug, Error, PartialEq)]
pub enum ConfigurationError {
    /// Two shortcuts in one profile share a trigger
    #[error("Duplicate trigger found: '{trigger}' in '{profile}'")]
    DuplicateTrigger { profile: String, trigger: String },

    /// The link table lists the same map twice
    #[error("Action map '{0}' is listed more than once in the link table")]
    DuplicateLinkEntry(String),

    /// A "+"-joined combination string could not be parsed
    #[error("Invalid binding combination '{0}'")]
    InvalidCombination(String),

    /// A rebinding slot uses the same index twice
    #[error("Invalid slot layout for '{0}': indices must be distinct")]
    InvalidSlotLayout(String),
}

/// Misuse of the rebinding flow, or a stale reference found mid-flow
#[derive(Debug, Error, PartialEq)]
pub enum RebindError {
    #[error(transparent)]
    Lookup(#[from] LookupError),

    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    /// `start` or `clear` while a capture or decision is pending
    #[error("A rebind is already in progress for '{0}'")]
    Busy(String),

    /// The start control is disabled by another coordinator's rebind
    #[error("Rebinding '{0}' is disabled while another rebind is in progress")]
    NotInteractive(String),

    /// `resolve` called with no conflict awaiting a decision
    #[error("No conflict is awaiting a decision")]
    NoPendingConflict,

    /// The coordinator was used before `activate`
    #[error("Coordinator for '{0}' is not active")]
    Inactive(String),
}
