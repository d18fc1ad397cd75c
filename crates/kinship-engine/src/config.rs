//! Configuration for propagation

use serde::{Deserialize, Serialize};

/// Bounds on how far inference reaches
///
/// # Examples
///
/// ```
/// use kinship_engine::EngineConfig;
///
/// let config = EngineConfig::default();
/// assert_eq!(config.path_hop_limit, 4);
/// assert_eq!(config.diffusion_radius, 2);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Longest graph path considered when resolving a pair
    pub path_hop_limit: usize,

    /// Neighbourhood around each endpoint of a new edge that gets re-inferred
    pub diffusion_radius: usize,

    /// Neighbourhood of the anchor searched for candidates of each diffused person
    #[serde(default = "default_candidate_radius")]
    pub candidate_radius: usize,
}

fn default_candidate_radius() -> usize {
    4
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            path_hop_limit: 4,
            diffusion_radius: 2,
            candidate_radius: default_candidate_radius(),
        }
    }
}

impl EngineConfig {
    /// Reject configurations that would disable inference
    pub fn validate(&self) -> Result<(), String> {
        if self.path_hop_limit == 0 {
            return Err("path_hop_limit must be greater than 0".to_string());
        }
        if self.candidate_radius == 0 {
            return Err("candidate_radius must be greater than 0".to_string());
        }
        Ok(())
    }
}
