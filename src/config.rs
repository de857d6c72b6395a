//! User configuration
//!
//! Read from `<config_dir>/booru-sidebar-kit/config.json`. Every field is
//! optional; a missing file means defaults.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::error::KitError;
use crate::ranking::RankOptions;
use crate::shell::DEFAULT_USER_AGENT;

/// Directory name under the platform config dir
const CONFIG_DIR: &str = "booru-sidebar-kit";

/// Config file name
const CONFIG_FILE: &str = "config.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    /// Ranking defaults, overridable per invocation
    pub ranking: RankOptions,

    /// Drop the NSFW flag from e621 posts (e926 mirror)
    pub sfw_only: bool,

    /// User-Agent for generated download commands
    pub user_agent: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ranking: RankOptions::default(),
            sfw_only: false,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

/// Get the path to the default config file
pub fn default_config_path() -> Result<PathBuf, KitError> {
    let dir = dirs::config_dir().ok_or(KitError::NoConfigDir)?;
    Ok(dir.join(CONFIG_DIR).join(CONFIG_FILE))
}

/// Load config from `path`, falling back to defaults when the file is absent
pub fn load_config(path: &Path) -> Result<Config, KitError> {
    if !path.exists() {
        warn!("Config not found at {:?}, using defaults", path);
        return Ok(Config::default());
    }

    let content = fs::read_to_string(path).map_err(|e| KitError::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    let config: Config = serde_json::from_str(&content).map_err(|e| KitError::ConfigParse {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    debug!("Loaded config from {:?}", path);
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ranking::Scorer;
    use std::io::Write;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config(&dir.path().join("nope.json")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_partial_config_merges_with_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{ "ranking": {{ "scorer": "general", "limit": 3 }}, "sfwOnly": true }}"#
        )
        .unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.ranking.scorer, Scorer::General);
        assert_eq!(config.ranking.limit, 3);
        assert_eq!(config.ranking.min_score, RankOptions::default().min_score);
        assert!(config.sfw_only);
        assert_eq!(config.user_agent, DEFAULT_USER_AGENT);
    }

    #[test]
    fn test_invalid_config_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();

        let err = load_config(file.path()).unwrap_err();
        assert!(matches!(err, KitError::ConfigParse { .. }));
    }
}
