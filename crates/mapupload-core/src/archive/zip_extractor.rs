//! Zip extractor implementation

use super::extractor::{write_chunked, Extractor};
use crate::map_name::{expected_files, MapName};
use crate::response::ExtractResponse;
use crate::Result;
use std::fs::File;
use std::path::Path;
use tracing::{debug, info};
use zip::result::ZipError;
use zip::ZipArchive;

/// Extracts the map's file set from a zip container
///
/// Only top-level entries named exactly `<map>.bsp`, `<map>.txt` or
/// `<map>.nav` are considered. Everything else in the archive is ignored.
pub struct ZipExtractor;

impl Default for ZipExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl ZipExtractor {
    /// Create a new zip extractor
    pub fn new() -> Self {
        Self
    }
}

impl Extractor for ZipExtractor {
    fn extract(
        &self,
        source: &Path,
        map_name: &MapName,
        maps_dir: &Path,
    ) -> Result<ExtractResponse> {
        let file = File::open(source)?;
        let mut archive = ZipArchive::new(file)?;
        let mut response = ExtractResponse::default();

        for name in expected_files(map_name) {
            let full_path = maps_dir.join(&name);

            if full_path.exists() {
                debug!("{:?} is already installed", full_path);
                response.files.push(full_path);
                response.errors.push(format!("{} already exists.", name));
                continue;
            }

            let mut entry = match archive.by_name(&name) {
                Ok(entry) => entry,
                Err(ZipError::FileNotFound) => continue,
                Err(e) => return Err(e.into()),
            };
            if entry.is_dir() {
                continue;
            }

            let written = write_chunked(&mut entry, &full_path)?;
            info!("Extracted {} ({} bytes)", name, written);
            response.files.push(full_path.clone());
            response.files_extracted.push(full_path);
        }

        response.success = true;
        Ok(response)
    }

    fn format_name(&self) -> &'static str {
        "zip"
    }
}
