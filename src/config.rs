use crate::domain::TagPattern;
use crate::error::{Result, SpecLedgerError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Environment variable that overrides `versioning.tag_prefix`.
pub const TAG_PREFIX_ENV: &str = "SPEC_LEDGER_TAG_PREFIX";

/// Suffix identifying specification documents during discovery.
pub const SPEC_FILE_SUFFIX: &str = ".spec.yaml";

/// Represents the complete configuration for spec-ledger.
///
/// Contains versioning behaviour (tag naming, automatic commit and tag) and
/// project settings such as the location of the specification document.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub struct Config {
    #[serde(default)]
    pub versioning: VersioningConfig,

    #[serde(default)]
    pub project: ProjectConfig,
}

/// Returns the default tag prefix.
fn default_tag_prefix() -> String {
    "v".to_string()
}

fn default_true() -> bool {
    true
}

/// Configuration for how versions are anchored in git.
///
/// `auto_commit = false` behaves as if `--no-commit` were always given, and
/// likewise `auto_tag = false` for `--no-tag`.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct VersioningConfig {
    #[serde(default = "default_tag_prefix")]
    pub tag_prefix: String,

    #[serde(default = "default_true")]
    pub auto_commit: bool,

    #[serde(default = "default_true")]
    pub auto_tag: bool,
}

impl Default for VersioningConfig {
    fn default() -> Self {
        VersioningConfig {
            tag_prefix: default_tag_prefix(),
            auto_commit: true,
            auto_tag: true,
        }
    }
}

/// Configuration for the project layout.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub struct ProjectConfig {
    /// Specification document, relative to the working directory.
    #[serde(default)]
    pub spec_file: Option<String>,
}

impl Config {
    /// Tag pattern in effect, honouring the environment override.
    pub fn tag_pattern(&self) -> TagPattern {
        match std::env::var(TAG_PREFIX_ENV) {
            Ok(prefix) => {
                debug!("Tag prefix '{}' taken from {}", prefix, TAG_PREFIX_ENV);
                TagPattern::new(prefix)
            }
            Err(_) => TagPattern::new(self.versioning.tag_prefix.clone()),
        }
    }
}

/// Loads configuration from file or returns defaults.
///
/// Attempts to load configuration in the following order:
/// 1. Custom path provided as parameter
/// 2. `specledger.toml` in current directory
/// 3. `spec-ledger/config.toml` in user config directory
/// 4. Default configuration if no file found
///
/// # Arguments
/// * `config_path` - Optional path to custom configuration file
///
/// # Returns
/// * `Ok(Config)` - Loaded or default configuration
/// * `Err` - If file exists but cannot be read or parsed
pub fn load_config(config_path: Option<&str>) -> Result<Config> {
    let path = if let Some(path) = config_path {
        PathBuf::from(path)
    } else if Path::new("./specledger.toml").exists() {
        PathBuf::from("./specledger.toml")
    } else if let Some(config_dir) = dirs::config_dir() {
        let user_path = config_dir.join("spec-ledger").join("config.toml");
        if user_path.exists() {
            user_path
        } else {
            return Ok(Config::default());
        }
    } else {
        return Ok(Config::default());
    };

    debug!("Loading configuration from {:?}", path);
    let config_str = fs::read_to_string(&path).map_err(|e| {
        SpecLedgerError::config(format!("cannot read {}: {}", path.display(), e))
    })?;
    toml::from_str(&config_str)
        .map_err(|e| SpecLedgerError::config(format!("invalid {}: {}", path.display(), e)))
}

/// Locate the specification document.
///
/// An explicit path wins, then `project.spec_file` relative to `dir`, then the
/// first `*.spec.yaml` in `dir` by name.
pub fn find_spec_file(dir: &Path, explicit: Option<&str>, config: &Config) -> Result<PathBuf> {
    if let Some(path) = explicit {
        return Ok(PathBuf::from(path));
    }
    if let Some(configured) = &config.project.spec_file {
        return Ok(dir.join(configured));
    }

    let mut candidates: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_file()
                && path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .map_or(false, |n| n.ends_with(SPEC_FILE_SUFFIX))
        })
        .collect();
    candidates.sort();

    candidates.into_iter().next().ok_or_else(|| {
        SpecLedgerError::not_found(format!(
            "no *{} file in {}; pass --file or set project.spec_file",
            SPEC_FILE_SUFFIX,
            dir.display()
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.versioning.tag_prefix, "v");
        assert!(config.versioning.auto_commit);
        assert!(config.versioning.auto_tag);
        assert_eq!(config.project.spec_file, None);
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let config: Config = toml::from_str("[versioning]\nauto_tag = false\n").unwrap();
        assert_eq!(config.versioning.tag_prefix, "v");
        assert!(config.versioning.auto_commit);
        assert!(!config.versioning.auto_tag);
    }

    #[test]
    fn test_find_spec_file_prefers_explicit_then_config() {
        let dir = TempDir::new().unwrap();
        let mut config = Config::default();

        let explicit = find_spec_file(dir.path(), Some("given.yaml"), &config).unwrap();
        assert_eq!(explicit, PathBuf::from("given.yaml"));

        config.project.spec_file = Some("docs/app.yaml".to_string());
        let configured = find_spec_file(dir.path(), None, &config).unwrap();
        assert_eq!(configured, dir.path().join("docs/app.yaml"));
    }

    #[test]
    fn test_find_spec_file_discovers_first_by_name() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("zeta.spec.yaml"), "").unwrap();
        fs::write(dir.path().join("alpha.spec.yaml"), "").unwrap();
        fs::write(dir.path().join("notes.yaml"), "").unwrap();

        let found = find_spec_file(dir.path(), None, &Config::default()).unwrap();
        assert_eq!(found, dir.path().join("alpha.spec.yaml"));
    }

    #[test]
    fn test_find_spec_file_none_found() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            find_spec_file(dir.path(), None, &Config::default()),
            Err(SpecLedgerError::NotFound(_))
        ));
    }
}
