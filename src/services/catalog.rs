// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Activity catalog: activity ID to expected duration.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Expected duration for activity IDs not in the catalog (5 minutes).
pub const DEFAULT_EXPECTED_DURATION_SECS: u64 = 300;

/// One catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityDefinition {
    pub id: String,
    pub expected_duration_seconds: u64,
}

/// Immutable catalog loaded at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityCatalog {
    definitions: BTreeMap<String, u64>,
}

impl Default for ActivityCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

impl ActivityCatalog {
    /// Catalog used when no file is configured.
    pub fn builtin() -> Self {
        let definitions = [
            ("toilet", 6 * 60),
            ("smoking", 5 * 60),
            ("phone", 10 * 60),
            ("poop_10", 10 * 60),
            ("poop_15", 15 * 60),
        ]
        .into_iter()
        .map(|(id, secs)| (id.to_string(), secs))
        .collect();

        Self { definitions }
    }

    /// Build a catalog from definitions, rejecting empty or duplicate IDs.
    pub fn from_definitions(
        definitions: impl IntoIterator<Item = ActivityDefinition>,
    ) -> Result<Self, CatalogError> {
        let mut map = BTreeMap::new();
        for definition in definitions {
            let id = definition.id.trim();
            if id.is_empty() {
                return Err(CatalogError::Invalid("empty activity id".to_string()));
            }
            if map
                .insert(id.to_string(), definition.expected_duration_seconds)
                .is_some()
            {
                return Err(CatalogError::Invalid(format!("duplicate activity id '{}'", id)));
            }
        }

        if map.is_empty() {
            return Err(CatalogError::Invalid("catalog is empty".to_string()));
        }

        Ok(Self { definitions: map })
    }

    /// Load a catalog from a JSON file.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, CatalogError> {
        let json_data =
            fs::read_to_string(path.as_ref()).map_err(|e| CatalogError::IoError(e.to_string()))?;
        Self::load_from_json(&json_data)
    }

    /// Load a catalog from a JSON array of definitions.
    pub fn load_from_json(json_data: &str) -> Result<Self, CatalogError> {
        let definitions: Vec<ActivityDefinition> = serde_json::from_str(json_data)
            .map_err(|e| CatalogError::ParseError(e.to_string()))?;

        let catalog = Self::from_definitions(definitions)?;
        tracing::info!(count = catalog.len(), "Loaded activity catalog");
        Ok(catalog)
    }

    /// Expected duration in seconds; unknown IDs get the default.
    pub fn expected_duration(&self, activity_id: &str) -> u64 {
        self.definitions
            .get(activity_id)
            .copied()
            .unwrap_or(DEFAULT_EXPECTED_DURATION_SECS)
    }

    pub fn contains(&self, activity_id: &str) -> bool {
        self.definitions.contains_key(activity_id)
    }

    /// All definitions, sorted by ID.
    pub fn definitions(&self) -> Vec<ActivityDefinition> {
        self.definitions
            .iter()
            .map(|(id, secs)| ActivityDefinition {
                id: id.clone(),
                expected_duration_seconds: *secs,
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("IO error: {0}")]
    IoError(String),
    #[error("Parse error: {0}")]
    ParseError(String),
    #[error("Invalid catalog: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_expected_durations() {
        let catalog = ActivityCatalog::builtin();
        assert_eq!(catalog.expected_duration("toilet"), 360);
        assert_eq!(catalog.expected_duration("smoking"), 300);
        assert_eq!(catalog.expected_duration("poop_15"), 900);
        assert_eq!(catalog.len(), 5);
    }

    #[test]
    fn test_unknown_activity_uses_default() {
        let catalog = ActivityCatalog::builtin();
        assert!(!catalog.contains("nap"));
        assert_eq!(
            catalog.expected_duration("nap"),
            DEFAULT_EXPECTED_DURATION_SECS
        );
    }

    #[test]
    fn test_load_from_json() {
        let catalog = ActivityCatalog::load_from_json(
            r#"[
                {"id": "lunch", "expected_duration_seconds": 3600},
                {"id": "coffee", "expected_duration_seconds": 600}
            ]"#,
        )
        .unwrap();

        assert_eq!(catalog.expected_duration("lunch"), 3600);
        let ids: Vec<String> = catalog.definitions().into_iter().map(|d| d.id).collect();
        assert_eq!(ids, vec!["coffee", "lunch"]);
    }

    #[test]
    fn test_load_rejects_duplicates_and_empty() {
        let duplicate = ActivityCatalog::load_from_json(
            r#"[{"id": "a", "expected_duration_seconds": 1},
                {"id": "a", "expected_duration_seconds": 2}]"#,
        );
        assert!(matches!(duplicate, Err(CatalogError::Invalid(_))));

        assert!(matches!(
            ActivityCatalog::load_from_json("[]"),
            Err(CatalogError::Invalid(_))
        ));
        assert!(matches!(
            ActivityCatalog::load_from_json(r#"[{"id": " ", "expected_duration_seconds": 1}]"#),
            Err(CatalogError::Invalid(_))
        ));
    }

    #[test]
    fn test_load_rejects_malformed_json() {
        assert!(matches!(
            ActivityCatalog::load_from_json("{not json"),
            Err(CatalogError::ParseError(_))
        ));
        assert!(matches!(
            ActivityCatalog::load_from_file("/nonexistent/catalog.json"),
            Err(CatalogError::IoError(_))
        ));
    }
}
