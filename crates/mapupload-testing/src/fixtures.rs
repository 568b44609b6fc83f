//! Map archive fixtures

use anyhow::Result;
use bzip2::write::BzEncoder;
use bzip2::Compression;
use std::fs;
use std::io::{Cursor, Write};
use std::path::Path;
use zip::write::{FileOptions, ZipWriter};
use zip::CompressionMethod;

/// A fake BSP payload of `len` bytes starting with the `VBSP` magic
pub fn bsp_payload(len: usize) -> Vec<u8> {
    let mut data = b"VBSP".to_vec();
    data.extend((0..len.saturating_sub(4)).map(|i| (i % 253) as u8));
    data.truncate(len.max(4));
    data
}

/// Zip archive bytes holding `entries` as (name, content) pairs
pub fn zip_bytes(entries: &[(&str, &[u8])]) -> Result<Vec<u8>> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = FileOptions::<'static, ()>::default()
        .compression_method(CompressionMethod::Deflated)
        .unix_permissions(0o644);

    for (name, content) in entries {
        writer.start_file(*name, options)?;
        writer.write_all(content)?;
    }

    Ok(writer.finish()?.into_inner())
}

/// bzip2 stream of `content`
pub fn bz2_bytes(content: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = BzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(content)?;
    Ok(encoder.finish()?)
}

/// Writes a zip archive holding `entries` to `path`
pub fn create_zip(path: &Path, entries: &[(&str, &[u8])]) -> Result<()> {
    fs::write(path, zip_bytes(entries)?)?;
    Ok(())
}

/// Writes `content` bzip2-compressed to `path`
pub fn create_bz2(path: &Path, content: &[u8]) -> Result<()> {
    fs::write(path, bz2_bytes(content)?)?;
    Ok(())
}

/// A complete map upload: payload, description and navigation mesh
pub fn map_zip(map_name: &str) -> Result<Vec<u8>> {
    let bsp = format!("{}.bsp", map_name);
    let txt = format!("{}.txt", map_name);
    let nav = format!("{}.nav", map_name);
    let payload = bsp_payload(4096);

    zip_bytes(&[
        (bsp.as_str(), payload.as_slice()),
        (txt.as_str(), b"Map description".as_slice()),
        (nav.as_str(), b"navigation mesh".as_slice()),
    ])
}
