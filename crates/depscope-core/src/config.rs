//! Run configuration for config-driven invocations.
//!
//! Load order: TOML file → environment variables (`DEPSCOPE_*`) → defaults.

use crate::graph::NameCase;
use crate::manifest::ManifestFormat;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// What the run should print (and save).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputMode {
    /// ASCII dependency tree from the start package.
    #[default]
    Tree,
    /// Breadth-first traversal order.
    Bfs,
    /// Flat directed edge list.
    Edges,
    /// DOT (Graphviz) digraph text.
    Dot,
}

impl OutputMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Tree => "tree",
            Self::Bfs => "bfs",
            Self::Edges => "edges",
            Self::Dot => "dot",
        }
    }
}

/// Failures while loading or validating a run configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("failed to read config {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {}: {detail}", .path.display())]
    Parse { path: PathBuf, detail: String },

    #[error("required config field `{0}` is empty")]
    EmptyField(&'static str),
}

/// A config-driven run: which package, from which repository, rendered how.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Start package for traversal and rendering.
    pub package: String,
    /// Repository source: a manifest path or an index base URL.
    pub repository: String,
    /// Manifest format name; empty means auto-detect from the path.
    pub repo_mode: String,
    /// Informational only; not part of the graph.
    pub package_version: String,
    /// Output selection; unrecognized values fall back to `tree`.
    pub output_mode: String,
    /// Traverse and render over the reversed graph.
    pub reverse: bool,
    /// Upper-case every package name at parse time.
    pub uppercase: bool,
}

/// Apply an environment variable on top of a config field if set and parsable.
fn env_override<T: std::str::FromStr>(var: &str, target: &mut T) {
    if let Ok(v) = std::env::var(var)
        && let Ok(parsed) = v.parse()
    {
        *target = parsed;
    }
}

impl RunConfig {
    /// Load a config from a TOML file, apply env overrides, and validate the
    /// required fields.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config: Self = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            detail: e.to_string(),
        })?;

        env_override("DEPSCOPE_PACKAGE", &mut config.package);
        env_override("DEPSCOPE_REPOSITORY", &mut config.repository);
        env_override("DEPSCOPE_REPO_MODE", &mut config.repo_mode);
        env_override("DEPSCOPE_OUTPUT_MODE", &mut config.output_mode);
        env_override("DEPSCOPE_REVERSE", &mut config.reverse);
        env_override("DEPSCOPE_UPPERCASE", &mut config.uppercase);

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.package.trim().is_empty() {
            return Err(ConfigError::EmptyField("package"));
        }
        if self.repository.trim().is_empty() {
            return Err(ConfigError::EmptyField("repository"));
        }
        Ok(())
    }

    /// Explicit manifest format, or `None` to auto-detect from the path.
    /// An unrecognized mode falls back to auto-detection with a warning.
    pub fn manifest_format(&self) -> Option<ManifestFormat> {
        if self.repo_mode.trim().is_empty() {
            return None;
        }
        match self.repo_mode.parse() {
            Ok(format) => Some(format),
            Err(err) => {
                tracing::warn!("{err}; auto-detecting from repository path");
                None
            }
        }
    }

    /// Output mode with the historical fallback: unknown names warn and
    /// render a tree.
    pub fn output(&self) -> OutputMode {
        match self.output_mode.trim().to_lowercase().as_str() {
            "" | "tree" | "ascii_tree" => OutputMode::Tree,
            "bfs" | "order" => OutputMode::Bfs,
            "edges" | "edge-list" => OutputMode::Edges,
            "dot" | "graphviz" => OutputMode::Dot,
            other => {
                tracing::warn!("output_mode `{other}` not recognized; defaulting to tree");
                OutputMode::Tree
            }
        }
    }

    pub fn name_case(&self) -> NameCase {
        if self.uppercase {
            NameCase::Upper
        } else {
            NameCase::Preserve
        }
    }

    /// The start package, normalized the same way the graph was.
    pub fn start_package(&self) -> String {
        self.name_case().apply(self.package.trim())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_and_validate() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("depscope.toml");
        std::fs::write(
            &path,
            r#"
package = "bash"
repository = "deps.txt"
repo_mode = "line-ws"
output_mode = "bfs"
uppercase = true
"#,
        )
        .unwrap();

        let config = RunConfig::load(&path).unwrap();
        assert_eq!(config.package, "bash");
        assert_eq!(config.manifest_format(), Some(ManifestFormat::LineWs));
        assert_eq!(config.output(), OutputMode::Bfs);
        assert_eq!(config.start_package(), "BASH");
    }

    #[test]
    fn env_overrides_win_over_file_values() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("depscope.toml");
        std::fs::write(&path, "package = \"bash\"\nrepository = \"deps.txt\"\n").unwrap();

        // No other test touches these variables, so no cross-test races.
        unsafe {
            std::env::set_var("DEPSCOPE_PACKAGE", "ncurses");
            std::env::set_var("DEPSCOPE_REVERSE", "true");
            std::env::set_var("DEPSCOPE_UPPERCASE", "not-a-bool");
        }
        let config = RunConfig::load(&path);
        unsafe {
            std::env::remove_var("DEPSCOPE_PACKAGE");
            std::env::remove_var("DEPSCOPE_REVERSE");
            std::env::remove_var("DEPSCOPE_UPPERCASE");
        }

        let config = config.unwrap();
        assert_eq!(config.package, "ncurses");
        assert!(config.reverse);
        // Unparsable override values leave the file value in place.
        assert!(!config.uppercase);
        assert_eq!(config.repository, "deps.txt");
    }

    #[test]
    fn missing_config_is_not_found() {
        let err = RunConfig::load(Path::new("/nonexistent/depscope.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }

    #[test]
    fn empty_package_is_distinct_error() {
        let config = RunConfig {
            repository: "deps.txt".to_string(),
            ..RunConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::EmptyField("package"))
        ));
    }

    #[test]
    fn unknown_output_mode_falls_back_to_tree() {
        let config = RunConfig {
            output_mode: "hologram".to_string(),
            ..RunConfig::default()
        };
        assert_eq!(config.output(), OutputMode::Tree);
    }

    #[test]
    fn unknown_repo_mode_falls_back_to_detection() {
        let config = RunConfig {
            repo_mode: "carrier-pigeon".to_string(),
            ..RunConfig::default()
        };
        assert_eq!(config.manifest_format(), None);
    }
}
