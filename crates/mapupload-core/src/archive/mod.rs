//! Archive operations module
//!
//! Uploaded archives come in three shapes: a zip container holding the map
//! files, a bzip2 stream of the payload (a fast-dl `.bsp.bz2`), or the raw
//! payload itself. The shape is detected from file content, not from the
//! name.

pub mod extractor;
pub mod single;
pub mod zip_extractor;

pub use extractor::{Extractor, CHUNK_SIZE};

use crate::map_name::MapName;
use crate::response::ExtractResponse;
use serde::Serialize;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;
use tracing::{error, info};
use zip::ZipArchive;

/// Detected archive shape
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ArchiveKind {
    /// bzip2 stream wrapping a single payload
    CompressedSingle,
    /// Uncompressed Source BSP
    RawSingle,
    /// Zip archive holding several map files
    ZipContainer,
    Unrecognized,
}

impl ArchiveKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArchiveKind::CompressedSingle => "compressed_single",
            ArchiveKind::RawSingle => "raw_single",
            ArchiveKind::ZipContainer => "zip_container",
            ArchiveKind::Unrecognized => "unrecognized",
        }
    }
}

type Sniffer = fn(&Path) -> io::Result<bool>;

/// Detection order. A BSP embeds a zip lump, so the BSP magic must be tested
/// before the zip central directory.
const SNIFFERS: &[(ArchiveKind, Sniffer)] = &[
    (ArchiveKind::CompressedSingle, is_bzip2),
    (ArchiveKind::RawSingle, is_bsp),
    (ArchiveKind::ZipContainer, is_zip),
];

fn has_magic(path: &Path, magic: &[u8]) -> io::Result<bool> {
    let mut header = Vec::with_capacity(magic.len());
    File::open(path)?
        .take(magic.len() as u64)
        .read_to_end(&mut header)?;
    Ok(header == magic)
}

fn is_bzip2(path: &Path) -> io::Result<bool> {
    has_magic(path, b"BZh")
}

fn is_bsp(path: &Path) -> io::Result<bool> {
    has_magic(path, b"VBSP")
}

fn is_zip(path: &Path) -> io::Result<bool> {
    Ok(ZipArchive::new(File::open(path)?).is_ok())
}

/// Classify an archive by its content
pub fn classify<P: AsRef<Path>>(path: P) -> io::Result<ArchiveKind> {
    let path = path.as_ref();
    for (kind, sniff) in SNIFFERS {
        if sniff(path)? {
            return Ok(*kind);
        }
    }
    Ok(ArchiveKind::Unrecognized)
}

/// Create an extractor for the given archive shape
pub fn create_extractor(kind: ArchiveKind) -> Option<Box<dyn Extractor>> {
    match kind {
        ArchiveKind::CompressedSingle => Some(Box::new(single::SingleExtractor::bzip2())),
        ArchiveKind::RawSingle => Some(Box::new(single::SingleExtractor::raw())),
        ArchiveKind::ZipContainer => Some(Box::new(zip_extractor::ZipExtractor::new())),
        ArchiveKind::Unrecognized => None,
    }
}

/// Install the map files contained in `archive` into `maps_dir`
///
/// The archive itself is left in place.
pub fn extract<P: AsRef<Path>, Q: AsRef<Path>>(
    archive: P,
    map_name: &MapName,
    maps_dir: Q,
) -> ExtractResponse {
    let archive = archive.as_ref();
    let maps_dir = maps_dir.as_ref();

    let kind = match classify(archive) {
        Ok(kind) => kind,
        Err(e) => {
            error!("Failed to read archive {:?}: {}", archive, e);
            return ExtractResponse::failure("Failed to extract files.");
        }
    };

    let Some(extractor) = create_extractor(kind) else {
        info!("Archive {:?} has an unrecognized format", archive);
        return ExtractResponse::failure("Unrecognized file format.");
    };

    info!(
        "Extracting {} archive for map {} into {:?}",
        extractor.format_name(),
        map_name,
        maps_dir
    );

    match extractor.extract(archive, map_name, maps_dir) {
        Ok(response) => response,
        Err(e) => {
            error!("Failed to extract {:?}: {}", archive, e);
            ExtractResponse::failure("Failed to extract files.")
        }
    }
}
