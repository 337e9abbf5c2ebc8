//! Graph Configuration
//!
//! Policy knobs for the solver. Hosts usually keep the defaults; the struct
//! deserializes from JSON so it can sit in a host's settings file.

use serde::{Deserialize, Serialize};

/// Solver policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    /// Skip re-solving a dirty node when none of its upstream nodes produced
    /// a different output during the current pass.
    pub early_cutoff: bool,

    /// Keep at most one pending trigger per node.
    pub coalesce_triggers: bool,

    /// Upper bound on the passes one [`Graph::pump`](crate::Graph::pump)
    /// runs. Requests beyond it stay queued for the next pump.
    pub max_pump_passes: usize,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            early_cutoff: true,
            coalesce_triggers: true,
            max_pump_passes: 64,
        }
    }
}

impl GraphConfig {
    /// Parse from JSON. Missing fields take their default.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn with_early_cutoff(mut self, enabled: bool) -> Self {
        self.early_cutoff = enabled;
        self
    }

    pub fn with_coalesce_triggers(mut self, enabled: bool) -> Self {
        self.coalesce_triggers = enabled;
        self
    }

    pub fn with_max_pump_passes(mut self, passes: usize) -> Self {
        self.max_pump_passes = passes.max(1);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let config = GraphConfig::from_json(r#"{ "coalesce_triggers": false }"#).unwrap();
        assert!(config.early_cutoff);
        assert!(!config.coalesce_triggers);
        assert_eq!(config.max_pump_passes, 64);
    }

    #[test]
    fn builder_clamps_pump_passes() {
        let config = GraphConfig::default().with_max_pump_passes(0);
        assert_eq!(config.max_pump_passes, 1);
    }

    #[test]
    fn rejects_malformed_json() {
        assert!(GraphConfig::from_json("{ early_cutoff: yes }").is_err());
    }
}
