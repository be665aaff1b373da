//! Result of one publish invocation

use crate::target::TargetKind;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// What a publish produced; lives only for the duration of the command
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishResult {
    /// Human-facing script identity, e.g. `api` or `api (staging)`
    pub script: String,

    pub upload_duration_ms: u64,

    pub activation_duration_ms: u64,

    /// Surfaces that were confirmed live
    pub surfaces: Vec<TargetKind>,

    /// Subdomain URL, route patterns and cron expressions, in report form
    pub activated_targets: Vec<String>,

    /// Time each launched surface took, failed ones included
    #[serde(default)]
    pub surface_timings: Vec<SurfaceTiming>,

    pub published_at: chrono::DateTime<chrono::Utc>,
}

impl PublishResult {
    pub fn new(script: impl Into<String>) -> Self {
        Self {
            script: script.into(),
            upload_duration_ms: 0,
            activation_duration_ms: 0,
            surfaces: Vec::new(),
            activated_targets: Vec::new(),
            surface_timings: Vec::new(),
            published_at: chrono::Utc::now(),
        }
    }

    pub fn upload_duration(&self) -> Duration {
        Duration::from_millis(self.upload_duration_ms)
    }

    pub fn activation_duration(&self) -> Duration {
        Duration::from_millis(self.activation_duration_ms)
    }

    /// Whether any delivery surface was activated
    pub fn has_targets(&self) -> bool {
        !self.surfaces.is_empty()
    }

    /// Recorded activation time of `kind`
    pub fn surface_duration(&self, kind: TargetKind) -> Option<Duration> {
        self.surface_timings
            .iter()
            .find(|timing| timing.kind == kind)
            .map(|timing| Duration::from_millis(timing.duration_ms))
    }
}

/// Activation time of one surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurfaceTiming {
    pub kind: TargetKind,
    pub duration_ms: u64,
}
