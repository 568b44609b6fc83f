//! Stage responses and their aggregates
//!
//! Every stage returns a value describing what it did. Messages in `errors`
//! are either failures (the stage reports `success = false`) or advisories
//! the stage attaches while still succeeding.

use crate::map_name::MapName;
use serde::Serialize;
use std::path::PathBuf;

/// Outcome of the extraction stage
#[derive(Debug, Clone, Default, Serialize)]
pub struct ExtractResponse {
    pub success: bool,
    /// Map files present in the maps directory afterwards
    pub files: Vec<PathBuf>,
    /// Subset of `files` written by this run
    pub files_extracted: Vec<PathBuf>,
    pub errors: Vec<String>,
}

impl ExtractResponse {
    pub(crate) fn failure(message: impl Into<String>) -> Self {
        Self {
            errors: vec![message.into()],
            ..Default::default()
        }
    }
}

/// Outcome of the fast-dl stage
#[derive(Debug, Clone, Default, Serialize)]
pub struct FastDlResponse {
    pub success: bool,
    /// Base names of the uploaded originals
    pub files_uploaded: Vec<String>,
    pub errors: Vec<String>,
}

impl FastDlResponse {
    pub(crate) fn failure(message: impl Into<String>) -> Self {
        Self {
            errors: vec![message.into()],
            ..Default::default()
        }
    }
}

/// Outcome of a manifest insertion
#[derive(Debug, Clone, Default, Serialize)]
pub struct ManifestResponse {
    pub success: bool,
    pub wrote_to_file: bool,
    pub errors: Vec<String>,
}

/// Aggregate result of adding a map from a URL
#[derive(Debug, Clone, Default, Serialize)]
pub struct AddMapResponse {
    /// Every stage ran to the end
    pub completed: bool,
    pub map_name: Option<MapName>,
    /// Errors raised by the pipeline itself
    pub errors: Vec<String>,
    pub extract: Option<ExtractResponse>,
    pub fastdl: Option<FastDlResponse>,
    pub manifest: Option<ManifestResponse>,
}

impl AddMapResponse {
    pub fn files_extracted(&self) -> usize {
        self.extract.as_ref().map_or(0, |r| r.files_extracted.len())
    }

    pub fn files_uploaded(&self) -> usize {
        self.fastdl.as_ref().map_or(0, |r| r.files_uploaded.len())
    }

    pub fn wrote_to_file(&self) -> bool {
        self.manifest.as_ref().is_some_and(|r| r.wrote_to_file)
    }

    /// Completed and actually changed something
    pub fn is_success(&self) -> bool {
        self.completed
            && (self.files_uploaded() > 0 || self.files_extracted() > 0 || self.wrote_to_file())
    }

    /// All messages: pipeline, extraction, fast-dl, then manifest
    pub fn errors(&self) -> Vec<String> {
        let mut errors = self.errors.clone();
        if let Some(extract) = &self.extract {
            errors.extend(extract.errors.iter().cloned());
        }
        if let Some(fastdl) = &self.fastdl {
            errors.extend(fastdl.errors.iter().cloned());
        }
        if let Some(manifest) = &self.manifest {
            errors.extend(manifest.errors.iter().cloned());
        }
        errors
    }
}

/// Aggregate result of listing an installed map
#[derive(Debug, Clone, Default, Serialize)]
pub struct AddMapToManifestResponse {
    pub completed: bool,
    pub map_name: Option<MapName>,
    pub errors: Vec<String>,
    pub fastdl: Option<FastDlResponse>,
    pub manifest: Option<ManifestResponse>,
}

impl AddMapToManifestResponse {
    pub fn files_uploaded(&self) -> usize {
        self.fastdl.as_ref().map_or(0, |r| r.files_uploaded.len())
    }

    pub fn wrote_to_file(&self) -> bool {
        self.manifest.as_ref().is_some_and(|r| r.wrote_to_file)
    }

    pub fn is_success(&self) -> bool {
        self.completed && (self.files_uploaded() > 0 || self.wrote_to_file())
    }

    pub fn errors(&self) -> Vec<String> {
        let mut errors = self.errors.clone();
        if let Some(fastdl) = &self.fastdl {
            errors.extend(fastdl.errors.iter().cloned());
        }
        if let Some(manifest) = &self.manifest {
            errors.extend(manifest.errors.iter().cloned());
        }
        errors
    }
}
