//! Offline snapshots of everything the backend served for one variant.

use crate::{Category, CountTable, Fragment};
use ron::ser::PrettyConfig;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("failed to read snapshot '{path}': {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to parse snapshot '{path}': {source}")]
    Parse {
        path: String,
        source: ron::de::SpannedError,
    },
    #[error("failed to serialize snapshot: {0}")]
    Serialize(#[from] ron::Error),
    #[error("failed to write snapshot '{path}': {source}")]
    Write {
        path: String,
        source: std::io::Error,
    },
}

/// Fragments per category plus the allele count table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Backend the snapshot was taken from
    pub server: String,
    pub fragments: BTreeMap<Category, Vec<Fragment>>,
    #[serde(default)]
    pub counts: CountTable,
}

impl Snapshot {
    pub fn new(server: impl Into<String>) -> Self {
        Self {
            server: server.into(),
            ..Self::default()
        }
    }

    pub fn fragment_count(&self) -> usize {
        self.fragments.values().map(Vec::len).sum()
    }

    pub fn load(path: &Path) -> Result<Self, SnapshotError> {
        let text = fs::read_to_string(path).map_err(|source| SnapshotError::Read {
            path: path.display().to_string(),
            source,
        })?;

        ron::from_str(&text).map_err(|source| SnapshotError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn save(&self, path: &Path) -> Result<(), SnapshotError> {
        let pretty_config = PrettyConfig::new()
            .depth_limit(4)
            .indentor("  ".to_string());
        let text = ron::ser::to_string_pretty(self, pretty_config)?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| SnapshotError::Write {
                path: parent.display().to_string(),
                source,
            })?;
        }

        fs::write(path, text).map_err(|source| SnapshotError::Write {
            path: path.display().to_string(),
            source,
        })
    }
}
