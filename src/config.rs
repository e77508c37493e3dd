//! Input/output path configuration.
//!
//! Paths come from, in order: the command line, a `safe-migrate.toml` file,
//! then the built-in defaults.
//!
//! ```toml
//! [paths]
//! input = "db/manual_migration.sql"
//! output = "db/safe_migration.sql"
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{SafeMigrateError, SafeMigrateResult};

/// Script read when no input path is given.
pub const DEFAULT_INPUT: &str = "manual_migration.sql";
/// Script written when no output path is given.
pub const DEFAULT_OUTPUT: &str = "safe_migration.sql";
/// Config file picked up from the working directory when present.
pub const CONFIG_FILE: &str = "safe-migrate.toml";

/// Resolved paths for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub input: PathBuf,
    pub output: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input: PathBuf::from(DEFAULT_INPUT),
            output: PathBuf::from(DEFAULT_OUTPUT),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    #[serde(default)]
    paths: PathsSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct PathsSection {
    input: Option<PathBuf>,
    output: Option<PathBuf>,
}

impl Config {
    /// Parse TOML config text, filling gaps with the defaults.
    pub fn from_toml(path: &Path, content: &str) -> SafeMigrateResult<Self> {
        let file: ConfigFile = toml::from_str(content)
            .map_err(|e| SafeMigrateError::config(path, e.message()))?;
        let defaults = Self::default();
        Ok(Self {
            input: file.paths.input.unwrap_or(defaults.input),
            output: file.paths.output.unwrap_or(defaults.output),
        })
    }

    /// Load a config file that must exist.
    pub fn load(path: &Path) -> SafeMigrateResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| SafeMigrateError::config(path, e.to_string()))?;
        Self::from_toml(path, &content)
    }

    /// Load `path` if given, otherwise `safe-migrate.toml` from `dir` if it
    /// exists, otherwise the defaults.
    pub fn discover(path: Option<&Path>, dir: &Path) -> SafeMigrateResult<Self> {
        if let Some(path) = path {
            return Self::load(path);
        }
        let implicit = dir.join(CONFIG_FILE);
        if implicit.is_file() {
            Self::load(&implicit)
        } else {
            Ok(Self::default())
        }
    }

    /// Override paths given on the command line.
    pub fn with_overrides(mut self, input: Option<PathBuf>, output: Option<PathBuf>) -> Self {
        if let Some(input) = input {
            self.input = input;
        }
        if let Some(output) = output {
            self.output = output;
        }
        self
    }
}
