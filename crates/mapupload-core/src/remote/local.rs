//! Directory-backed fast-dl store
//!
//! Used when the fast-dl directory is served from the same host as the game
//! server. Remote paths are plain filesystem paths.

use super::{Connector, RemoteStore};
use crate::Result;
use async_trait::async_trait;
use std::path::Path;
use tokio::fs;
use tracing::info;

#[derive(Debug, Clone, Copy, Default)]
pub struct LocalConnector;

impl LocalConnector {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Connector for LocalConnector {
    async fn connect(&self) -> Result<Box<dyn RemoteStore>> {
        Ok(Box::new(LocalStore))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LocalStore;

#[async_trait]
impl RemoteStore for LocalStore {
    async fn exists(&self, remote_path: &str) -> Result<bool> {
        Ok(fs::try_exists(remote_path).await?)
    }

    async fn put(&self, local_path: &Path, remote_path: &str) -> Result<()> {
        let written = fs::copy(local_path, remote_path).await?;
        info!("Copied {:?} to {} ({} bytes)", local_path, remote_path, written);
        Ok(())
    }
}
