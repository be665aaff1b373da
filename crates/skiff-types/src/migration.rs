//! Durable-object class migrations
//!
//! The ordered list of [`MigrationEntry`] values in the project config is the
//! authoritative history of class changes. The registry remembers the tag of
//! the last entry it applied; a [`MigrationDelta`] carries everything after it.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A class rename inside a migration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenamedClass {
    pub from: String,
    pub to: String,
}

/// One tagged entry of the local migration history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationEntry {
    /// Unique identifier; carries no meaning beyond identity
    pub tag: String,

    /// Classes introduced by this migration
    #[serde(default)]
    pub new_classes: BTreeSet<String>,

    /// Classes renamed by this migration, in declaration order
    #[serde(default)]
    pub renamed_classes: Vec<RenamedClass>,

    /// Classes removed by this migration
    #[serde(default)]
    pub deleted_classes: BTreeSet<String>,
}

impl MigrationEntry {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            new_classes: BTreeSet::new(),
            renamed_classes: Vec::new(),
            deleted_classes: BTreeSet::new(),
        }
    }

    pub fn with_new_class(mut self, class: impl Into<String>) -> Self {
        self.new_classes.insert(class.into());
        self
    }

    pub fn with_renamed_class(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.renamed_classes.push(RenamedClass {
            from: from.into(),
            to: to.into(),
        });
        self
    }

    pub fn with_deleted_class(mut self, class: impl Into<String>) -> Self {
        self.deleted_classes.insert(class.into());
        self
    }

    /// Strip the tag, leaving the step sent to the registry
    pub fn to_step(&self) -> MigrationStep {
        MigrationStep {
            new_classes: self.new_classes.clone(),
            renamed_classes: self.renamed_classes.clone(),
            deleted_classes: self.deleted_classes.clone(),
        }
    }
}

/// A migration entry without its tag
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MigrationStep {
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub new_classes: BTreeSet<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub renamed_classes: Vec<RenamedClass>,

    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub deleted_classes: BTreeSet<String>,
}

/// Steps to apply on top of what the remote script already has
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationDelta {
    /// Tag the registry reported as last applied
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_tag: Option<String>,

    /// Tag of the newest local entry
    pub new_tag: String,

    /// Ordered steps, possibly empty
    pub steps: Vec<MigrationStep>,
}

impl MigrationDelta {
    /// Whether the delta changes anything on the remote side
    pub fn is_noop(&self) -> bool {
        self.steps.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_step_drops_tag() {
        let entry = MigrationEntry::new("v1")
            .with_new_class("Counter")
            .with_renamed_class("Old", "New")
            .with_deleted_class("Gone");

        let step = entry.to_step();
        assert!(step.new_classes.contains("Counter"));
        assert_eq!(step.renamed_classes[0].to, "New");
        assert!(step.deleted_classes.contains("Gone"));

        let json = serde_json::to_value(&step).unwrap();
        assert!(json.get("tag").is_none());
    }

    #[test]
    fn test_entry_from_toml_defaults() {
        let entry: MigrationEntry = toml::from_str(
            r#"
            tag = "v2"
            new_classes = ["Room"]
            "#,
        )
        .unwrap();
        assert_eq!(entry.tag, "v2");
        assert!(entry.renamed_classes.is_empty());
        assert!(entry.deleted_classes.is_empty());
    }

    #[test]
    fn test_delta_omits_absent_old_tag() {
        let delta = MigrationDelta {
            old_tag: None,
            new_tag: "v1".into(),
            steps: vec![],
        };
        let json = serde_json::to_value(&delta).unwrap();
        assert!(json.get("old_tag").is_none());
        assert!(delta.is_noop());
    }
}
