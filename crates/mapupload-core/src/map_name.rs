//! Map names and the per-map file set

use percent_encoding::percent_decode_str;
use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

/// Extension of the compiled map (payload)
pub const PAYLOAD_EXT: &str = "bsp";
/// Extension of the map description (metadata)
pub const METADATA_EXT: &str = "txt";
/// Extension of the bot navigation mesh
pub const NAVIGATION_EXT: &str = "nav";

/// Normalized map identifier
///
/// The base name of an archive with directory components and every
/// extension removed. `de_dust2.bsp.bz2` and `C:\maps\de_dust2.bsp` both
/// become `de_dust2`. Case is preserved.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct MapName(String);

impl MapName {
    /// Derive a map name from a file name or path, `None` if nothing is left
    pub fn from_file_name(file_name: &str) -> Option<Self> {
        let base = file_name
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or(file_name);
        let name = match base.find('.') {
            Some(index) => &base[..index],
            None => base,
        };

        if name.is_empty() {
            None
        } else {
            Some(Self(name.to_string()))
        }
    }

    /// Derive a map name from a `Content-Disposition` header value
    pub fn from_content_disposition(value: &str) -> Option<Self> {
        let start = value.find("filename=")? + "filename=".len();
        let rest = &value[start..];
        let end = rest.find([';', '\n']).unwrap_or(rest.len());
        let file_name = rest[..end].trim_end_matches('\r');
        let file_name = file_name.strip_prefix('"').unwrap_or(file_name);
        let file_name = file_name.strip_suffix('"').unwrap_or(file_name);

        Self::from_file_name(file_name)
    }

    /// Derive a map name from the last segment of a URL path
    ///
    /// The segment is percent-decoded first, so `my%20map.bsp` gives `my map`.
    pub fn from_url(url: &reqwest::Url) -> Option<Self> {
        let segment = url.path().rsplit('/').next()?;
        let decoded = percent_decode_str(segment).decode_utf8_lossy();
        Self::from_file_name(&decoded)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// File name of one member of the map's file set
    pub fn file_name(&self, ext: &str) -> String {
        format!("{}.{}", self.0, ext)
    }
}

impl fmt::Display for MapName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The files a map may consist of: payload, metadata and navigation
pub fn expected_files(map_name: &MapName) -> [String; 3] {
    [
        map_name.file_name(PAYLOAD_EXT),
        map_name.file_name(METADATA_EXT),
        map_name.file_name(NAVIGATION_EXT),
    ]
}

/// Selection of a map's files for a given stage
#[derive(Debug, Clone, Copy, Default)]
pub struct MapFileQuery<'a> {
    /// Drop files matching the compression ignore pattern
    pub ignore: Option<&'a Regex>,
    /// Qualify names with this directory and keep only existing files
    pub local_dir: Option<&'a Path>,
}

/// Resolve the map's files according to `query`
///
/// Without a directory the bare file names are returned. With one, each name
/// is joined to it and files missing on disk are left out.
pub fn map_files(map_name: &MapName, query: MapFileQuery<'_>) -> Vec<PathBuf> {
    expected_files(map_name)
        .into_iter()
        .filter(|name| query.ignore.map_or(true, |re| !re.is_match(name)))
        .filter_map(|name| match query.local_dir {
            Some(dir) => {
                let full_path = dir.join(&name);
                full_path.exists().then_some(full_path)
            }
            None => Some(PathBuf::from(name)),
        })
        .collect()
}
