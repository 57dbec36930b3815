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

//! Linked action maps
//!
//! Maps that are active at the same time must not share a combination.
//! The link table says which other maps a map's duplicate check covers.
//! Links work both ways: if `Gameplay` lists `Shortcuts`, rebinding in
//! `Shortcuts` also checks `Gameplay`.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::core::error::ConfigurationError;

/// One row of the link table as stored on disk
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct LinkedMapEntry {
    pub map: String,
    #[serde(default)]
    pub linked_maps: Vec<String>,
}

/// Immutable map-name → linked-map-names table
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ActionMapLinks {
    links: BTreeMap<String, BTreeSet<String>>,
}

impl ActionMapLinks {
    /// Builds the table. Listing the same map twice is a setup error.
    pub fn new(entries: Vec<LinkedMapEntry>) -> Result<Self, ConfigurationError> {
        let mut links = BTreeMap::new();

        for entry in entries {
            if links.contains_key(&entry.map) {
                return Err(ConfigurationError::DuplicateLinkEntry(entry.map));
            }
            let linked = entry.linked_maps.into_iter().collect::<BTreeSet<_>>();
            links.insert(entry.map, linked);
        }

        Ok(Self { links })
    }

    /// Parses the JSON form: an array of `{ "map", "linked_maps" }`.
    pub fn from_json(content: &str) -> Result<Self, LinkTableError> {
        let entries: Vec<LinkedMapEntry> = serde_json::from_str(content)?;
        Ok(Self::new(entries)?)
    }

    /// Maps whose bindings a rebind in `map` must be checked against.
    ///
    /// `map` itself comes first, followed by every map linked to or from it
    /// in name order. Without any entry, only `map` is checked.
    pub fn domain(&self, map: &str) -> Vec<String> {
        let mut linked = BTreeSet::new();

        if let Some(maps) = self.links.get(map) {
            linked.extend(maps.iter().cloned());
        }
        for (other, maps) in &self.links {
            if maps.contains(map) {
                linked.insert(other.clone());
            }
        }
        linked.remove(map);

        std::iter::once(map.to_string()).chain(linked).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }
}

/// Failure loading the link table file
#[derive(Debug, thiserror::Error)]
pub enum LinkTableError {
    #[error("Invalid link table JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(map: &str, linked: &[&str]) -> LinkedMapEntry {
        LinkedMapEntry {
            map: map.to_string(),
            linked_maps: linked.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_domain_without_links() {
        let links = ActionMapLinks::default();
        assert_eq!(links.domain("Shortcuts"), vec!["Shortcuts".to_string()]);
    }

    #[test]
    fn test_domain_is_bidirectional() {
        let links = ActionMapLinks::new(vec![entry("Gameplay", &["Shortcuts", "Camera"])]).unwrap();

        assert_eq!(links.domain("Gameplay"), vec!["Gameplay", "Camera", "Shortcuts"]);
        assert_eq!(links.domain("Shortcuts"), vec!["Shortcuts", "Gameplay"]);
        assert_eq!(links.domain("Menu"), vec!["Menu"]);
    }

    #[test]
    fn test_self_link_is_not_repeated() {
        let links = ActionMapLinks::new(vec![entry("UI", &["UI"])]).unwrap();
        assert_eq!(links.domain("UI"), vec!["UI"]);
    }

    #[test]
    fn test_duplicate_entry_is_rejected() {
        let result = ActionMapLinks::new(vec![entry("UI", &[]), entry("UI", &["Shortcuts"])]);
        assert_eq!(
            result.unwrap_err(),
            ConfigurationError::DuplicateLinkEntry("UI".to_string())
        );
    }

    #[test]
    fn test_from_json() {
        let json = r#"[{ "map": "Gameplay", "linked_maps": ["Shortcuts"] }]"#;
        let links = ActionMapLinks::from_json(json).unwrap();
        assert_eq!(links.domain("Shortcuts"), vec!["Shortcuts", "Gameplay"]);

        assert!(matches!(
            ActionMapLinks::from_json("not json"),
            Err(LinkTableError::Json(_))
        ));
    }
}
