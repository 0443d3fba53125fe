//! Source constraint and mode configuration types.

use serde::{Deserialize, Serialize};

use crate::error::{CadenceError, Result};

/// Frame rate constraints reported by the capture source.
///
/// Zero-hertz mode arms only for sources that declare `min_fps == 0` along
/// with a positive `max_fps`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SourceConstraints {
    /// Minimum frame rate the source may deliver.
    pub min_fps: Option<f64>,

    /// Maximum frame rate the source will deliver.
    pub max_fps: Option<f64>,
}

impl SourceConstraints {
    /// Both fields must be finite and non-negative when present.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [("min_fps", self.min_fps), ("max_fps", self.max_fps)] {
            if let Some(fps) = value {
                if !fps.is_finite() || fps < 0.0 {
                    return Err(CadenceError::invalid_constraints(format!(
                        "{name} must be a non-negative finite value, got {fps}"
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Parameters supplied when enabling zero-hertz mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ZeroHertzParams {
    /// Number of simulcast layers tracked for quality convergence.
    pub num_simulcast_layers: usize,
}

/// Adapter-wide configuration, captured once at spawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AdapterConfig {
    /// Whether zero-hertz screenshare cadence is permitted at all. Immutable
    /// for the lifetime of the adapter.
    pub zero_hertz_screenshare_enabled: bool,
}
