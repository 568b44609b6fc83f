//! Single-payload archives: a bzip2-compressed or raw BSP

use super::extractor::{write_chunked, Extractor};
use crate::map_name::{MapName, PAYLOAD_EXT};
use crate::response::ExtractResponse;
use crate::Result;
use bzip2::read::MultiBzDecoder;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::{debug, info};

/// Installs a lone map payload as `<map>.bsp`
pub struct SingleExtractor {
    compressed: bool,
}

impl SingleExtractor {
    /// Extractor for a bzip2 stream wrapping the payload
    pub fn bzip2() -> Self {
        Self { compressed: true }
    }

    /// Extractor for an uncompressed payload
    pub fn raw() -> Self {
        Self { compressed: false }
    }
}

impl Extractor for SingleExtractor {
    fn extract(
        &self,
        source: &Path,
        map_name: &MapName,
        maps_dir: &Path,
    ) -> Result<ExtractResponse> {
        let name = map_name.file_name(PAYLOAD_EXT);
        let full_path = maps_dir.join(&name);
        let mut response = ExtractResponse {
            success: true,
            ..Default::default()
        };

        if full_path.exists() {
            debug!("{:?} is already installed", full_path);
            response.files.push(full_path);
            response.errors.push(format!("{} already exists.", name));
            return Ok(response);
        }

        let reader = BufReader::new(File::open(source)?);
        let written = if self.compressed {
            write_chunked(&mut MultiBzDecoder::new(reader), &full_path)?
        } else {
            let mut reader = reader;
            write_chunked(&mut reader, &full_path)?
        };

        info!("Extracted {} ({} bytes)", name, written);
        response.files.push(full_path.clone());
        response.files_extracted.push(full_path);
        Ok(response)
    }

    fn format_name(&self) -> &'static str {
        if self.compressed {
            "bzip2"
        } else {
            "bsp"
        }
    }
}
