//! Settings for building and pruning suites, stored as TOML.

use std::{
    io,
    num::NonZeroUsize,
    path::{Path, PathBuf},
};

use non_empty_string::NonEmptyString;
use serde::{Deserialize, Serialize};

use crate::builder::DEFAULT_PAGE_SIZE;

/// Configuration for talking to the remote service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Versions", into = "Versions")]
pub struct Config {
    /// The number of records requested per page when listing sections and
    /// cases.
    page_size: NonZeroUsize,

    /// How nodes are removed from a suite.
    pub deletion: DeletionSettings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            deletion: DeletionSettings::default(),
        }
    }
}

/// Errors raised while loading or saving a [`Config`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read config file {}: {source}", path.display())]
    Read {
        /// The file that was read.
        path: PathBuf,
        /// The underlying error.
        source: io::Error,
    },

    /// The file is not a valid configuration.
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// The configuration could not be rendered as TOML.
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// The file could not be written.
    #[error("failed to write config file {}: {source}", path.display())]
    Write {
        /// The file that was written.
        path: PathBuf,
        /// The underlying error.
        source: io::Error,
    },
}

impl Config {
    /// Loads the configuration from a TOML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or if the TOML content is
    /// invalid.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(toml::from_str(&content)?)
    }

    /// Saves the configuration to a TOML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be serialized to TOML or if
    /// the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Returns the number of records requested per page.
    #[must_use]
    pub const fn page_size(&self) -> NonZeroUsize {
        self.page_size
    }

    /// Sets the number of records requested per page.
    pub const fn set_page_size(&mut self, page_size: NonZeroUsize) {
        self.page_size = page_size;
    }
}

/// How nodes are removed from a suite.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeletionSettings {
    /// Move nodes into holding sections instead of deleting them.
    pub mark_for_deletion: bool,

    /// Name of the holding section for cases. Sections are held in
    /// `<name>/sections`.
    ///
    /// Defaults to `__to_be_deleted__`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section_name: Option<NonEmptyString>,

    /// Only flag deleted nodes remotely. Ignored when marking for deletion.
    pub soft: bool,
}

impl Default for DeletionSettings {
    fn default() -> Self {
        Self {
            mark_for_deletion: true,
            section_name: None,
            soft: true,
        }
    }
}

const fn default_page_size() -> NonZeroUsize {
    DEFAULT_PAGE_SIZE
}

/// The serialized versions of the configuration.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "_version")]
enum Versions {
    #[serde(rename = "1")]
    V1 {
        #[serde(default = "default_page_size")]
        page_size: NonZeroUsize,

        #[serde(default)]
        deletion: DeletionSettings,
    },
}

impl From<Versions> for Config {
    fn from(versions: Versions) -> Self {
        match versions {
            Versions::V1 {
                page_size,
                deletion,
            } => Self {
                page_size,
                deletion,
            },
        }
    }
}

impl From<Config> for Versions {
    fn from(config: Config) -> Self {
        Self::V1 {
            page_size: config.page_size,
            deletion: config.deletion,
        }
    }
}
