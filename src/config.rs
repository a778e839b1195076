//! Configuration file support for githelp
//!
//! Reads from .githelp/config.toml, found by walking up from the current
//! directory. Environment variables override individual settings.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, warn};

/// Overrides the explanation model
pub const ENV_MODEL: &str = "GITHELP_MODEL";
/// Overrides the explanation backend executable
pub const ENV_EXPLAIN_PROGRAM: &str = "GITHELP_EXPLAIN_PROGRAM";
/// Overrides the overlay document location
pub const ENV_OVERLAYS: &str = "GITHELP_OVERLAYS";
/// Overrides the git executable
pub const ENV_GIT: &str = "GITHELP_GIT";

/// Configuration structure
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Config {
    /// Explanation backend settings
    #[serde(default)]
    pub explain: ExplainConfig,

    /// Tip page location
    #[serde(default)]
    pub overlays: OverlaysConfig,

    /// Save sequence behaviour
    #[serde(default)]
    pub save: SaveConfig,

    /// Git executable
    #[serde(default = "default_git")]
    pub git: String,
}

/// Which backend and model produce explanations
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ExplainConfig {
    /// Model passed to `<program> run <model>`
    /// Default: "llama2"
    #[serde(default = "default_model")]
    pub model: String,

    /// Backend executable
    /// Default: "ollama"
    #[serde(default = "default_program")]
    pub program: String,
}

#[derive(Debug, Deserialize, Serialize, Default, Clone, PartialEq)]
pub struct OverlaysConfig {
    /// Path to a YAML tip catalog. When unset the catalog shipped next to
    /// the executable (or the built-in one) is used.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Serialize, Default, Clone, PartialEq)]
pub struct SaveConfig {
    /// Keep going to `git commit` after a failed `git add`
    /// Default: false
    #[serde(default)]
    pub continue_on_add_failure: bool,
}

fn default_model() -> String {
    "llama2".to_string()
}

fn default_program() -> String {
    "ollama".to_string()
}

fn default_git() -> String {
    "git".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            explain: ExplainConfig::default(),
            overlays: OverlaysConfig::default(),
            save: SaveConfig::default(),
            git: default_git(),
        }
    }
}

impl Default for ExplainConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            program: default_program(),
        }
    }
}

impl Config {
    /// Load config from .githelp/config.toml, then apply environment
    /// overrides. Returns defaults if the file doesn't exist or can't be
    /// parsed.
    pub fn load() -> Self {
        let mut config = Self::find_config_path()
            .map(|path| Self::load_from(&path))
            .unwrap_or_default();
        config.apply_env(|key| std::env::var(key).ok());
        config
    }

    /// Parse one config file, falling back to defaults
    pub fn load_from(path: &std::path::Path) -> Self {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "config file unreadable, using defaults");
                return Self::default();
            }
        };
        match toml::from_str(&contents) {
            Ok(config) => {
                debug!(path = %path.display(), "loaded config");
                config
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "config file malformed, using defaults");
                Self::default()
            }
        }
    }

    /// Apply environment overrides using `lookup` to read variables
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(model) = non_empty(ENV_MODEL) {
            self.explain.model = model;
        }
        if let Some(program) = non_empty(ENV_EXPLAIN_PROGRAM) {
            self.explain.program = program;
        }
        if let Some(path) = non_empty(ENV_OVERLAYS) {
            self.overlays.path = Some(PathBuf::from(path));
        }
        if let Some(git) = non_empty(ENV_GIT) {
            self.git = git;
        }
    }

    /// Find config.toml by walking up directory tree
    fn find_config_path() -> Option<PathBuf> {
        let current_dir = std::env::current_dir().ok()?;
        let mut dir = current_dir.as_path();

        loop {
            let config_path = dir.join(".githelp").join("config.toml");
            if config_path.exists() {
                return Some(config_path);
            }

            match dir.parent() {
                Some(parent) => dir = parent,
                None => break,
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.explain.model, "llama2");
        assert_eq!(config.explain.program, "ollama");
        assert_eq!(config.git, "git");
        assert!(config.overlays.path.is_none());
        assert!(!config.save.continue_on_add_failure);
    }

    #[test]
    fn test_parse_config() {
        let toml = r#"
[explain]
model = "mistral"

[overlays]
path = "/opt/githelp/overlays.yml"

[save]
continue_on_add_failure = true
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.explain.model, "mistral");
        // unspecified keys keep their defaults
        assert_eq!(config.explain.program, "ollama");
        assert_eq!(
            config.overlays.path,
            Some(PathBuf::from("/opt/githelp/overlays.yml"))
        );
        assert!(config.save.continue_on_add_failure);
    }

    #[test]
    fn test_load_from_malformed_file_uses_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[explain\nmodel = ").unwrap();

        assert_eq!(Config::load_from(file.path()), Config::default());
    }

    #[test]
    fn test_load_from_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("nope.toml"));
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            (ENV_MODEL, "phi3"),
            (ENV_EXPLAIN_PROGRAM, "/usr/local/bin/ollama"),
            (ENV_OVERLAYS, "/tmp/tips.yml"),
            (ENV_GIT, ""),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.apply_env(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.explain.model, "phi3");
        assert_eq!(config.explain.program, "/usr/local/bin/ollama");
        assert_eq!(config.overlays.path, Some(PathBuf::from("/tmp/tips.yml")));
        // empty values are ignored
        assert_eq!(config.git, "git");
    }
}
