//! Helper utilities for mapupload testing

use crate::ServerLayout;
use anyhow::Result;
use std::path::{Path, PathBuf};

/// Config file contents pointing every path at `server`
///
/// The fast-dl store is the layout's local fast-dl directory.
pub fn local_config(server: &ServerLayout, max_bytes: u64) -> String {
    format!(
        r#"[remote]
protocol = "local"
maps_dir = "{fastdl}"

[upload]
max_bytes = {max_bytes}

[compression]
ignore_regex = '\.nav'
level = 4

[server]
maps_dir = "{maps}"
manifest_file = "{manifest}"
"#,
        fastdl = toml_path(&server.fastdl_dir),
        maps = toml_path(&server.maps_dir),
        manifest = toml_path(&server.manifest),
        max_bytes = max_bytes,
    )
}

/// Writes [`local_config`] to `dir/config.toml`
pub fn write_local_config(dir: &Path, server: &ServerLayout, max_bytes: u64) -> Result<PathBuf> {
    let path = dir.join("config.toml");
    std::fs::write(&path, local_config(server, max_bytes))?;
    Ok(path)
}

fn toml_path(path: &Path) -> String {
    path.display()
        .to_string()
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
}
