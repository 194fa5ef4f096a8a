//! Projector configuration.
//!
//! Read from `~/.travel-guide/projector.toml` unless a path is given. A missing
//! file yields defaults; every table and key is optional.

use guide_protocol::SNAPSHOT_SENTINEL;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{GuideError, Result};

const DEFAULT_CONFIG_RELATIVE_PATH: &str = ".travel-guide/projector.toml";

/// Display text longer than this (in characters) marks an assistant answer as
/// substantial enough for the finalizing phase.
pub const DEFAULT_FINALIZE_THRESHOLD_CHARS: usize = 50;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectorConfig {
    #[serde(default)]
    pub classifier: ClassifierConfig,
    #[serde(default)]
    pub phase: PhaseConfig,
    #[serde(default)]
    pub guide: GuideDefaults,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifierConfig {
    #[serde(default = "default_sentinel")]
    pub sentinel: String,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            sentinel: default_sentinel(),
        }
    }
}

fn default_sentinel() -> String {
    SNAPSHOT_SENTINEL.to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseConfig {
    #[serde(default = "default_finalize_threshold_chars")]
    pub finalize_threshold_chars: usize,
}

impl Default for PhaseConfig {
    fn default() -> Self {
        Self {
            finalize_threshold_chars: default_finalize_threshold_chars(),
        }
    }
}

fn default_finalize_threshold_chars() -> usize {
    DEFAULT_FINALIZE_THRESHOLD_CHARS
}

/// Placeholder sections of the travel guide that the agent's answer does not fill.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GuideDefaults {
    pub country: String,
    pub airport: String,
    pub public_transport: Vec<String>,
    pub taxi: String,
    pub transport_tips: Vec<String>,
    pub tips: Vec<String>,
    pub best_time_to_visit: String,
    pub estimated_budget: String,
}

impl Default for GuideDefaults {
    fn default() -> Self {
        Self {
            country: "Unknown".to_string(),
            airport: "Check local airport information".to_string(),
            public_transport: vec!["Local public transport".to_string()],
            taxi: "Local taxi services".to_string(),
            transport_tips: vec!["Use a local transit app".to_string()],
            tips: vec![
                "Plan your trip in advance".to_string(),
                "Learn about local culture and customs".to_string(),
            ],
            best_time_to_visit: "Good all year round; pick the season you prefer.".to_string(),
            estimated_budget: "Set a budget that fits your needs.".to_string(),
        }
    }
}

pub fn default_config_path() -> Result<PathBuf> {
    let home = dirs::home_dir().ok_or(GuideError::HomeDirNotFound)?;
    Ok(home.join(DEFAULT_CONFIG_RELATIVE_PATH))
}

pub fn load_projector_config(path: Option<PathBuf>) -> Result<ProjectorConfig> {
    let config_path = match path {
        Some(path) => path,
        None => default_config_path()?,
    };

    if !config_path.exists() {
        tracing::debug!(path = %config_path.display(), "No projector config; using defaults");
        return Ok(ProjectorConfig::default());
    }

    let content = fs_err::read_to_string(&config_path).map_err(|source| GuideError::Io {
        context: format!("reading {}", config_path.display()),
        source,
    })?;
    toml::from_str::<ProjectorConfig>(&content).map_err(|err| GuideError::ConfigMalformed {
        path: config_path,
        details: err.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_defaults_when_file_missing() {
        let temp_dir = tempfile::tempdir().expect("temp dir");
        let path = temp_dir.path().join("missing.toml");
        let config = load_projector_config(Some(path)).expect("load config");
        assert_eq!(config, ProjectorConfig::default());
        assert_eq!(config.classifier.sentinel, "values");
        assert_eq!(config.phase.finalize_threshold_chars, 50);
    }

    #[test]
    fn load_parses_partial_tables() {
        let temp_dir = tempfile::tempdir().expect("temp dir");
        let path = temp_dir.path().join("projector.toml");
        fs_err::write(
            &path,
            r#"
[phase]
finalize_threshold_chars = 120

[guide]
country = "Japan"
tips = ["Carry cash"]
"#,
        )
        .expect("write config");

        let config = load_projector_config(Some(path)).expect("load config");
        assert_eq!(config.phase.finalize_threshold_chars, 120);
        assert_eq!(config.classifier.sentinel, "values");
        assert_eq!(config.guide.country, "Japan");
        assert_eq!(config.guide.tips, vec!["Carry cash".to_string()]);
        assert_eq!(config.guide.taxi, GuideDefaults::default().taxi);
    }

    #[test]
    fn load_rejects_malformed_file() {
        let temp_dir = tempfile::tempdir().expect("temp dir");
        let path = temp_dir.path().join("projector.toml");
        fs_err::write(&path, "[phase]\nfinalize_threshold_chars = \"many\"\n").expect("write");

        let err = load_projector_config(Some(path.clone())).expect_err("malformed");
        match err {
            GuideError::ConfigMalformed { path: reported, .. } => assert_eq!(reported, path),
            other => panic!("expected ConfigMalformed, got {:?}", other),
        }
    }
}
