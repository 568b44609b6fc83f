//! SFTP fast-dl store
//!
//! `ssh2` is blocking, so every call runs on the blocking pool. The channel
//! and the session live as long as the [`SftpStore`] and are closed on drop.

use super::{Connector, RemoteStore};
use crate::config::RemoteConfig;
use crate::{Error, Result};
use async_trait::async_trait;
use ssh2::{ErrorCode, Session, Sftp};
use std::fs::File;
use std::io::{self, BufReader};
use std::net::TcpStream;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// SFTP status codes for a missing file or parent directory
const SFTP_NO_SUCH_FILE: i32 = 2;
const SFTP_NO_SUCH_PATH: i32 = 10;

/// Opens password-authenticated SFTP sessions
#[derive(Debug, Clone)]
pub struct SftpConnector {
    config: RemoteConfig,
}

impl SftpConnector {
    pub fn new(config: RemoteConfig) -> Self {
        Self { config }
    }

    fn connect_blocking(config: RemoteConfig) -> Result<SftpStore> {
        let addr = format!("{}:{}", config.host, config.port);
        let tcp = TcpStream::connect(&addr)
            .map_err(|e| Error::Remote(format!("Failed to connect to {}: {}", addr, e)))?;

        let timeout = Duration::from_secs(config.timeout_secs);
        tcp.set_read_timeout(Some(timeout)).ok();
        tcp.set_write_timeout(Some(timeout)).ok();

        let mut session = Session::new()?;
        session.set_tcp_stream(tcp);
        session.set_timeout(u32::try_from(timeout.as_millis()).unwrap_or(u32::MAX));
        session.handshake()?;
        session
            .userauth_password(&config.username, &config.password)
            .map_err(|e| Error::Remote(format!("Password authentication failed: {}", e)))?;

        let sftp = session.sftp()?;
        debug!("Opened SFTP session to {}", addr);

        Ok(SftpStore {
            session: Arc::new(session),
            sftp: Some(Arc::new(sftp)),
        })
    }
}

#[async_trait]
impl Connector for SftpConnector {
    async fn connect(&self) -> Result<Box<dyn RemoteStore>> {
        let config = self.config.clone();
        let store = tokio::task::spawn_blocking(move || Self::connect_blocking(config)).await??;
        Ok(Box::new(store))
    }
}

/// An open SFTP channel on an authenticated SSH session
pub struct SftpStore {
    session: Arc<Session>,
    sftp: Option<Arc<Sftp>>,
}

impl SftpStore {
    fn channel(&self) -> Result<Arc<Sftp>> {
        self.sftp
            .clone()
            .ok_or_else(|| Error::Remote("SFTP channel is closed".to_string()))
    }
}

fn is_not_found(err: &ssh2::Error) -> bool {
    matches!(
        err.code(),
        ErrorCode::SFTP(SFTP_NO_SUCH_FILE) | ErrorCode::SFTP(SFTP_NO_SUCH_PATH)
    )
}

#[async_trait]
impl RemoteStore for SftpStore {
    async fn exists(&self, remote_path: &str) -> Result<bool> {
        let sftp = self.channel()?;
        let path = PathBuf::from(remote_path);

        tokio::task::spawn_blocking(move || match sftp.stat(&path) {
            Ok(_) => Ok(true),
            Err(e) if is_not_found(&e) => Ok(false),
            Err(e) => Err(Error::Remote(format!("Failed to stat {:?}: {}", path, e))),
        })
        .await?
    }

    async fn put(&self, local_path: &Path, remote_path: &str) -> Result<()> {
        let sftp = self.channel()?;
        let local_path = local_path.to_path_buf();
        let path = PathBuf::from(remote_path);

        tokio::task::spawn_blocking(move || {
            let mut reader = BufReader::new(File::open(&local_path)?);
            let mut remote = sftp
                .create(&path)
                .map_err(|e| Error::Remote(format!("Failed to create {:?}: {}", path, e)))?;
            let written = io::copy(&mut reader, &mut remote)?;
            info!("Uploaded {:?} ({} bytes)", path, written);
            Ok(())
        })
        .await?
    }
}

/// Run `f` on the blocking pool when inside a runtime, inline otherwise
fn off_runtime<F>(f: F)
where
    F: FnOnce() + Send + 'static,
{
    match tokio::runtime::Handle::try_current() {
        Ok(handle) => {
            handle.spawn_blocking(f);
        }
        Err(_) => f(),
    }
}

fn close(session: Arc<Session>, sftp: Option<Arc<Sftp>>) {
    // Channel first, then the session
    drop(sftp);
    let _ = session.disconnect(None, "Closing connection", None);
    debug!("Closed SFTP session");
}

impl Drop for SftpStore {
    fn drop(&mut self) {
        let session = Arc::clone(&self.session);
        let sftp = self.sftp.take();
        off_runtime(move || close(session, sftp));
    }
}
