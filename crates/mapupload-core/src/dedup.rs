//! Filtering out files the fast-dl store already has

use crate::remote::{remote_path, RemoteStore};
use std::path::{Path, PathBuf};
use tracing::{debug, error};

/// Local files whose compressed copy is missing from `remote_dir`
///
/// Order is preserved. `None` means at least one check failed, so the answer
/// is unknown.
pub async fn filter_new<P: AsRef<Path>>(
    store: &dyn RemoteStore,
    remote_dir: &str,
    local_paths: &[P],
) -> Option<Vec<PathBuf>> {
    let mut missing = Vec::new();

    for local in local_paths {
        let local = local.as_ref();
        let remote = remote_path(remote_dir, local);

        match store.exists(&remote).await {
            Ok(true) => debug!("Fast-dl already has {}", remote),
            Ok(false) => missing.push(local.to_path_buf()),
            Err(e) => {
                error!("Failed to check {} on fast-dl: {}", remote, e);
                return None;
            }
        }
    }

    Some(missing)
}
