//! Testing utilities and fixtures for mapupload
//!
//! This crate provides map archive builders, a scratch game server layout
//! and assertions shared by the mapupload test suites.

use anyhow::Result;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub mod assertions;
pub mod fixtures;
pub mod helpers;

/// Creates a temporary test directory with cleanup on drop
pub struct TestDir {
    dir: TempDir,
}

impl TestDir {
    /// Creates a new temporary test directory
    pub fn new() -> Result<Self> {
        Ok(Self {
            dir: TempDir::new()?,
        })
    }

    /// Returns the path to the temporary directory
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Creates a file with the given name and content in the test directory
    pub fn create_file(&self, name: &str, content: &[u8]) -> Result<PathBuf> {
        let path = self.dir.path().join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, content)?;
        Ok(path)
    }

    /// Creates a directory with the given name in the test directory
    pub fn create_dir(&self, name: &str) -> Result<PathBuf> {
        let path = self.dir.path().join(name);
        std::fs::create_dir_all(&path)?;
        Ok(path)
    }

    /// Lays out a game server with an empty maps directory, an empty fast-dl
    /// directory and a manifest holding `manifest_lines`
    pub fn server(&self, manifest_lines: &[&str]) -> Result<ServerLayout> {
        let maps_dir = self.create_dir("server/maps")?;
        let fastdl_dir = self.create_dir("fastdl/maps")?;

        let mut content = manifest_lines.join("\n");
        if !manifest_lines.is_empty() {
            content.push('\n');
        }
        let manifest = self.create_file("server/mapcycle.txt", content.as_bytes())?;

        Ok(ServerLayout {
            maps_dir,
            fastdl_dir,
            manifest,
        })
    }
}

/// Paths of a scratch game server
#[derive(Debug, Clone)]
pub struct ServerLayout {
    pub maps_dir: PathBuf,
    pub fastdl_dir: PathBuf,
    pub manifest: PathBuf,
}

impl ServerLayout {
    /// Path of an installed map file
    pub fn map_file(&self, name: &str) -> PathBuf {
        self.maps_dir.join(name)
    }

    /// Path of a fast-dl copy, `name` without the `.bz2` suffix
    pub fn fastdl_file(&self, name: &str) -> PathBuf {
        self.fastdl_dir.join(format!("{}.bz2", name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_test_dir() {
        let test_dir = TestDir::new().unwrap();
        assert!(test_dir.path().exists());
    }

    #[test]
    fn test_create_file() {
        let test_dir = TestDir::new().unwrap();
        let file_path = test_dir.create_file("test.txt", b"Hello, World!").unwrap();
        assert!(file_path.exists());
        assert_eq!(std::fs::read(&file_path).unwrap(), b"Hello, World!");
    }

    #[test]
    fn test_server_layout() {
        let test_dir = TestDir::new().unwrap();
        let server = test_dir.server(&["cs_office", "de_dust2"]).unwrap();
        assert!(server.maps_dir.is_dir());
        assert!(server.fastdl_dir.is_dir());
        assert_eq!(
            std::fs::read_to_string(&server.manifest).unwrap(),
            "cs_office\nde_dust2\n"
        );
        assert_eq!(
            server.fastdl_file("test.bsp"),
            server.fastdl_dir.join("test.bsp.bz2")
        );
    }

    #[test]
    fn test_empty_manifest() {
        let test_dir = TestDir::new().unwrap();
        let server = test_dir.server(&[]).unwrap();
        assert_eq!(std::fs::read_to_string(&server.manifest).unwrap(), "");
    }
}
