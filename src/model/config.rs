use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Year suggested when no year has been registered yet.
pub const SEED_YEAR: u32 = 2026;

/// Configuration from `config.toml`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TallyConfig {
    /// Root of the record tree. `~` is expanded against `$HOME`.
    #[serde(default = "default_base_dir")]
    pub base_dir: PathBuf,
    /// Suggested year while `years.csv` is empty
    #[serde(default = "default_year")]
    pub default_year: u32,
}

impl Default for TallyConfig {
    fn default() -> Self {
        TallyConfig {
            base_dir: default_base_dir(),
            default_year: SEED_YEAR,
        }
    }
}

fn default_base_dir() -> PathBuf {
    PathBuf::from("~/Documents/TaskData")
}

fn default_year() -> u32 {
    SEED_YEAR
}
