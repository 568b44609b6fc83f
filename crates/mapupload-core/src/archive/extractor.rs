//! Extractor trait for map archives

use crate::map_name::MapName;
use crate::response::ExtractResponse;
use crate::Result;
use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::Path;
use tracing::warn;

/// Buffer size for every streamed copy
pub const CHUNK_SIZE: usize = 16_000;

/// Trait for map archive extractors
pub trait Extractor: Send + Sync {
    /// Install the map's files from `source` into `maps_dir`
    ///
    /// Files already in `maps_dir` are never overwritten. They are reported
    /// in `files` with an advisory. An `Err` means an I/O fault.
    fn extract(
        &self,
        source: &Path,
        map_name: &MapName,
        maps_dir: &Path,
    ) -> Result<ExtractResponse>;

    /// Get the format name for this extractor
    fn format_name(&self) -> &'static str;
}

/// Stream `reader` into a new file at `destination`
///
/// The partially written file is removed when the copy fails.
pub(crate) fn write_chunked<R: Read>(reader: &mut R, destination: &Path) -> io::Result<u64> {
    let result = File::create(destination).and_then(|mut file| {
        let mut buffer = vec![0u8; CHUNK_SIZE];
        let mut written = 0u64;
        loop {
            let n = match reader.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };
            file.write_all(&buffer[..n])?;
            written += n as u64;
        }
        file.flush()?;
        Ok(written)
    });

    if result.is_err() && destination.exists() {
        if let Err(e) = fs::remove_file(destination) {
            warn!("Failed to remove partial file {:?}: {}", destination, e);
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    struct FailingReader {
        served: bool,
    }

    impl Read for FailingReader {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.served {
                return Err(io::Error::new(io::ErrorKind::Other, "broken stream"));
            }
            self.served = true;
            buf[..4].copy_from_slice(b"VBSP");
            Ok(4)
        }
    }

    #[test]
    fn test_write_chunked_large_input() {
        let temp_dir = TempDir::new().unwrap();
        let destination = temp_dir.path().join("out.bsp");
        let data = vec![7u8; CHUNK_SIZE * 3 + 17];

        let written = write_chunked(&mut data.as_slice(), &destination).unwrap();
        assert_eq!(written, data.len() as u64);
        assert_eq!(fs::read(&destination).unwrap(), data);
    }

    #[test]
    fn test_write_chunked_removes_partial_file() {
        let temp_dir = TempDir::new().unwrap();
        let destination = temp_dir.path().join("out.bsp");

        let result = write_chunked(&mut FailingReader { served: false }, &destination);
        assert!(result.is_err());
        assert!(!destination.exists());
    }
}
