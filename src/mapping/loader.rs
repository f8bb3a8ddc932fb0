//! Mapping loading from disk.
//!
//! # Responsibilities
//! - Walk the mapping directory recursively
//! - Parse every `*.json` file as an array of `MappingRecord`
//! - Concatenate the results in traversal order
//!
//! # Design Decisions
//! - Traversal is lexicographic by file name at every level, never filesystem-native order
//! - Any unreadable or malformed file fails the whole load; partial loads are never returned
//! - An empty directory is a valid, empty mapping set

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use thiserror::Error;
use walkdir::WalkDir;

use crate::mapping::types::MappingRecord;

/// Errors raised while reading the mapping source.
#[derive(Debug, Error)]
pub enum MappingError {
    #[error("opening mappings file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parsing mappings file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("walking mappings directory {}: {source}", root.display())]
    Walk {
        root: PathBuf,
        #[source]
        source: walkdir::Error,
    },
}

/// Something that can produce the full, ordered set of mapping records.
///
/// Called once at startup and again on every reload.
pub trait MappingSource: Send + Sync + std::fmt::Debug {
    fn load(&self) -> Result<Vec<MappingRecord>, MappingError>;

    /// Human-readable location, used in logs.
    fn describe(&self) -> String;
}

/// Loads mappings from a directory tree of JSON files.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    dir: PathBuf,
}

impl DirectorySource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl MappingSource for DirectorySource {
    fn load(&self) -> Result<Vec<MappingRecord>, MappingError> {
        load_mappings_from_dir(&self.dir)
    }

    fn describe(&self) -> String {
        self.dir.display().to_string()
    }
}

/// Load the mapping records of a single JSON file.
pub fn load_mappings_from_file(path: &Path) -> Result<Vec<MappingRecord>, MappingError> {
    let file = File::open(path).map_err(|source| MappingError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    serde_json::from_reader(BufReader::new(file)).map_err(|source| MappingError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Load every `*.json` file under `dir`, in lexicographic order.
pub fn load_mappings_from_dir(dir: &Path) -> Result<Vec<MappingRecord>, MappingError> {
    let mut all = Vec::new();
    let mut files = 0usize;

    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.map_err(|source| MappingError::Walk {
            root: dir.to_path_buf(),
            source,
        })?;

        if !entry.file_type().is_file() || !is_json(entry.path()) {
            continue;
        }

        let records = load_mappings_from_file(entry.path())?;
        tracing::debug!(file = %entry.path().display(), records = records.len(), "Loaded mappings file");
        all.extend(records);
        files += 1;
    }

    tracing::debug!(dir = %dir.display(), files, records = all.len(), "Mappings directory loaded");
    Ok(all)
}

fn is_json(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "json")
}
