use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    // Search Parameters
    pub search_depth: u8,
    /// Try the sibling branch's best reply first. Ordering only changes
    /// how much gets pruned, never the value of the search.
    pub use_killer: bool,

    // Evaluation Parameters
    pub c_potential: i32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            search_depth: 3,
            use_killer: true,
            c_potential: 20_000,
        }
    }
}

impl EngineConfig {
    pub fn from_json(json_str: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json_str)
    }
}
