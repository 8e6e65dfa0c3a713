//! Dashboard settings: optional YAML file, overridden by CLI flags.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::scrollspy::SpyOffsets;

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid config in {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("Invalid setting {key}: {message}")]
    Invalid { key: &'static str, message: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Rows per page on the full lists.
    pub page_size: u32,
    /// Numbered buttons in the pager.
    pub page_window: u32,
    /// Cards in the home works preview.
    pub preview_limit: usize,
    /// Rows kept above a year section after an anchor jump.
    pub scroll_offset: u32,
    pub scroll_offset_narrow: u32,
    /// Terminal width below which the narrow offset applies.
    pub narrow_breakpoint: u16,
    pub watch: bool,
    /// Artificial store latency in milliseconds.
    pub latency_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            page_size: 12,
            page_window: 5,
            preview_limit: 9,
            scroll_offset: 3,
            scroll_offset_narrow: 2,
            narrow_breakpoint: 100,
            watch: true,
            latency_ms: 0,
        }
    }
}

/// CLI values that take precedence over the file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub page_size: Option<u32>,
    pub latency_ms: Option<u64>,
    pub no_watch: bool,
}

impl Config {
    /// Read `path` if given, else defaults. A missing explicit file is an
    /// error; so is any invalid value.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(path) => {
                let content =
                    std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
                        path: path.to_path_buf(),
                        source,
                    })?;
                Self::from_yaml(path, &content)?
            }
            None => Self::default(),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml(path: &Path, content: &str) -> Result<Self, ConfigError> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    pub fn apply(mut self, overrides: &Overrides) -> Result<Self, ConfigError> {
        if let Some(size) = overrides.page_size {
            self.page_size = size;
        }
        if let Some(ms) = overrides.latency_ms {
            self.latency_ms = ms;
        }
        if overrides.no_watch {
            self.watch = false;
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("page_size", self.page_size as u64),
            ("page_window", self.page_window as u64),
            ("preview_limit", self.preview_limit as u64),
        ];
        for (key, value) in positive {
            if value == 0 {
                return Err(ConfigError::Invalid {
                    key,
                    message: "must be at least 1".to_string(),
                });
            }
        }
        Ok(())
    }

    pub fn spy_offsets(&self) -> SpyOffsets {
        SpyOffsets {
            wide: self.scroll_offset,
            narrow: self.scroll_offset_narrow,
            narrow_breakpoint: self.narrow_breakpoint,
        }
    }
}
