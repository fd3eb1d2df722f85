//! Pipeline configuration.

use serde::{Deserialize, Serialize};

/// Top-level pipeline configuration.
///
/// Timeouts bound each detector/voter task individually; a timed-out task
/// is excluded, the rest of the pipeline proceeds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Per-detector timeout in milliseconds.
    pub detector_timeout_ms: u64,
    /// Per-voter timeout in milliseconds.
    pub voter_timeout_ms: u64,
    /// RNG seed for replacement generation. `None` seeds from entropy;
    /// set for deterministic output in tests.
    pub replacement_seed: Option<u64>,
    /// Retry budget before falling back to counter-suffixed replacements.
    pub max_collision_retries: usize,
    /// Join adjacent same-kind name spans separated by a single space.
    pub merge_adjacent_names: bool,
}

impl PipelineConfig {
    /// Create configuration from environment variables and defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            detector_timeout_ms: env_u64("CLOAK_DETECTOR_TIMEOUT_MS")
                .unwrap_or(defaults.detector_timeout_ms),
            voter_timeout_ms: env_u64("CLOAK_VOTER_TIMEOUT_MS")
                .unwrap_or(defaults.voter_timeout_ms),
            replacement_seed: env_u64("CLOAK_REPLACEMENT_SEED"),
            max_collision_retries: env_u64("CLOAK_MAX_COLLISION_RETRIES")
                .map(|v| v as usize)
                .unwrap_or(defaults.max_collision_retries),
            merge_adjacent_names: std::env::var("CLOAK_MERGE_ADJACENT_NAMES")
                .map(|v| v.eq_ignore_ascii_case("true"))
                .unwrap_or(defaults.merge_adjacent_names),
        }
    }

    /// Fix the replacement seed (deterministic output).
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.replacement_seed = Some(seed);
        self
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            detector_timeout_ms: 5_000,
            voter_timeout_ms: 10_000,
            replacement_seed: None,
            max_collision_retries: 5,
            merge_adjacent_names: false,
        }
    }
}

fn env_u64(key: &str) -> Option<u64> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.detector_timeout_ms, 5_000);
        assert_eq!(config.max_collision_retries, 5);
        assert!(config.replacement_seed.is_none());
        assert!(!config.merge_adjacent_names);
    }

    #[test]
    fn test_with_seed() {
        let config = PipelineConfig::default().with_seed(42);
        assert_eq!(config.replacement_seed, Some(42));
    }
}
