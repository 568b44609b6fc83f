//! Remote fast-dl store
//!
//! The fast-dl directory holds `<file>.bz2` copies of every map file the game
//! server offers for download. Stores are reached through a [`Connector`] so
//! each stage opens its own short-lived session.

pub mod local;
pub mod sftp;

pub use local::{LocalConnector, LocalStore};
pub use sftp::{SftpConnector, SftpStore};

use crate::config::{RemoteConfig, RemoteProtocol};
use crate::Result;
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;

/// An open session on the remote store
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Whether a file exists at `remote_path`
    async fn exists(&self, remote_path: &str) -> Result<bool>;

    /// Upload `local_path` to `remote_path`, replacing any existing file
    async fn put(&self, local_path: &Path, remote_path: &str) -> Result<()>;
}

/// Opens sessions on a remote store
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self) -> Result<Box<dyn RemoteStore>>;
}

/// Remote location of the compressed copy of `local_file`
///
/// `remote_dir` joined with the base name of `local_file` plus `.bz2`, with
/// backslashes turned into forward slashes.
pub fn remote_path(remote_dir: &str, local_file: &Path) -> String {
    let base = local_file
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_default();

    let joined = if remote_dir.is_empty() {
        base
    } else if remote_dir.ends_with('/') || remote_dir.ends_with('\\') {
        format!("{}{}", remote_dir, base)
    } else {
        format!("{}/{}", remote_dir, base)
    };

    format!("{}.bz2", joined.replace('\\', "/"))
}

/// Connector for the configured protocol
pub fn connector_for(config: &RemoteConfig) -> Arc<dyn Connector> {
    match config.protocol {
        RemoteProtocol::Sftp => Arc::new(SftpConnector::new(config.clone())),
        RemoteProtocol::Local => Arc::new(LocalConnector::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_path() {
        assert_eq!(
            remote_path("fastdl/maps", Path::new("/srv/maps/test.bsp")),
            "fastdl/maps/test.bsp.bz2"
        );
        assert_eq!(
            remote_path("fastdl/maps/", Path::new("test.txt")),
            "fastdl/maps/test.txt.bz2"
        );
        assert_eq!(
            remote_path("fastdl\\maps", Path::new("test.nav")),
            "fastdl/maps/test.nav.bz2"
        );
        assert_eq!(remote_path("", Path::new("maps/test.bsp")), "test.bsp.bz2");
    }
}
