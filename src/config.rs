use crate::runtime::RunOptions;
use serde::Deserialize;
use std::{
    fs,
    path::{Path, PathBuf},
};
use thiserror::Error;

pub const CONFIG_FILE: &str = "minicpp.toml";

/// Settings read from `minicpp.toml`. Every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunConfig {
    pub run: RunSection,
    pub test: TestSection,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunSection {
    pub entry: String,
    pub max_call_depth: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TestSection {
    pub dir: PathBuf,
}

impl Default for RunSection {
    fn default() -> Self {
        Self {
            entry: "main".to_string(),
            max_call_depth: Some(10_000),
        }
    }
}

impl Default for TestSection {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("tests/conformance"),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {error}", path.display())]
    Io {
        path: PathBuf,
        error: std::io::Error,
    },
    #[error("invalid configuration in {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },
}

impl RunConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|error| ConfigError::Io {
            path: path.to_path_buf(),
            error,
        })?;
        toml::from_str(&content).map_err(|error| ConfigError::Parse {
            path: path.to_path_buf(),
            message: error.to_string(),
        })
    }

    /// Loads `minicpp.toml` from `dir`, falling back to defaults when the
    /// file does not exist.
    pub fn discover(dir: &Path) -> Result<Self, ConfigError> {
        let path = dir.join(CONFIG_FILE);
        if path.is_file() {
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn run_options(&self) -> RunOptions {
        RunOptions {
            entry: self.run.entry.clone(),
            max_call_depth: self.run.max_call_depth,
        }
    }
}
