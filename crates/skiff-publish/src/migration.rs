//! Migration delta resolution
//!
//! Decides which durable-object class migrations accompany an upload, given
//! the local history and the tag the registry last applied for the script.

use skiff_types::{MigrationDelta, MigrationEntry};
use std::fmt;

/// Remote tag missing from the local history
///
/// Non-fatal: the full history is sent and the registry decides.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconciliationWarning {
    pub remote_tag: String,
}

impl fmt::Display for ReconciliationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Remote migration tag {} was not found in the local migration history; \
             sending every local migration",
            self.remote_tag
        )
    }
}

/// Outcome of [`resolve`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationPlan {
    pub delta: MigrationDelta,
    pub warning: Option<ReconciliationWarning>,
}

/// Compute the migrations to send with an upload
///
/// Returns `None` for an empty history. A delta is returned even when the
/// remote tag is already the last local tag; its `steps` are then empty.
pub fn resolve(history: &[MigrationEntry], remote_tag: Option<&str>) -> Option<MigrationPlan> {
    let last = history.last()?;
    let new_tag = last.tag.clone();

    let Some(remote_tag) = remote_tag else {
        return Some(MigrationPlan {
            delta: MigrationDelta {
                old_tag: None,
                new_tag,
                steps: history.iter().map(MigrationEntry::to_step).collect(),
            },
            warning: None,
        });
    };

    let plan = match history.iter().position(|entry| entry.tag == remote_tag) {
        Some(applied) => MigrationPlan {
            delta: MigrationDelta {
                old_tag: Some(remote_tag.to_string()),
                new_tag,
                steps: history[applied + 1..]
                    .iter()
                    .map(MigrationEntry::to_step)
                    .collect(),
            },
            warning: None,
        },
        None => MigrationPlan {
            delta: MigrationDelta {
                old_tag: Some(remote_tag.to_string()),
                new_tag,
                steps: history.iter().map(MigrationEntry::to_step).collect(),
            },
            warning: Some(ReconciliationWarning {
                remote_tag: remote_tag.to_string(),
            }),
        },
    };

    Some(plan)
}
