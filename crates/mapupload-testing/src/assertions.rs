//! Common assertions for mapupload testing

use anyhow::Result;
use bzip2::read::BzDecoder;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Asserts that `path` is a bzip2 stream of `expected`
pub fn assert_bz2_content(path: &Path, expected: &[u8]) -> Result<()> {
    let mut content = Vec::new();
    BzDecoder::new(File::open(path)?).read_to_end(&mut content)?;

    assert_eq!(
        content.len(),
        expected.len(),
        "Decompressed size mismatch for {:?}",
        path
    );
    assert!(content == expected, "Content mismatch for {:?}", path);
    Ok(())
}

/// Asserts that the manifest at `path` holds exactly `expected`, in order
pub fn assert_manifest(path: &Path, expected: &[&str]) -> Result<()> {
    let content = std::fs::read_to_string(path)?;
    let lines: Vec<&str> = content.lines().collect();

    assert_eq!(lines, expected, "Manifest mismatch for {:?}", path);
    if !expected.is_empty() {
        assert!(
            content.ends_with('\n'),
            "Manifest {:?} lacks a trailing newline",
            path
        );
    }
    Ok(())
}
