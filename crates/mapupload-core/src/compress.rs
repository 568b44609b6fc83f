//! bzip2 compression of map files for fast-dl

use crate::archive::CHUNK_SIZE;
use crate::Result;
use bzip2::write::BzEncoder;
use bzip2::Compression;
use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use tempfile::{Builder, TempPath};
use tracing::{debug, warn};

/// Prefix of compressed temp files
const TEMP_PREFIX: &str = "mapupload_bz2_";

/// A map file and its compressed temporary copy
///
/// The temporary copy is deleted when this value is dropped.
#[derive(Debug)]
pub struct CompressedFile {
    pub real_file: PathBuf,
    pub compressed_file: TempPath,
}

fn compress_file(level: u32, source: &Path) -> Result<CompressedFile> {
    let mut input = File::open(source)?;
    let (output, compressed_file) = Builder::new()
        .prefix(TEMP_PREFIX)
        .tempfile()?
        .into_parts();

    let mut encoder = BzEncoder::new(BufWriter::new(output), Compression::new(level));
    let mut buffer = vec![0u8; CHUNK_SIZE];
    loop {
        let n = input.read(&mut buffer)?;
        if n == 0 {
            break;
        }
        encoder.write_all(&buffer[..n])?;
    }
    encoder.finish()?.flush()?;

    Ok(CompressedFile {
        real_file: source.to_path_buf(),
        compressed_file,
    })
}

/// Compress every file in `paths`, keeping input order
///
/// `level` is clamped to 1..=9. Files that fail are logged and left out.
pub fn compress_files<P: AsRef<Path>>(level: u32, paths: &[P]) -> Vec<CompressedFile> {
    let level = level.clamp(1, 9);

    paths
        .iter()
        .filter_map(|path| {
            let path = path.as_ref();
            match compress_file(level, path) {
                Ok(compressed) => {
                    debug!("Compressed {:?} to {:?}", path, compressed.compressed_file);
                    Some(compressed)
                }
                Err(e) => {
                    warn!("Failed to compress {:?}: {}", path, e);
                    None
                }
            }
        })
        .collect()
}
