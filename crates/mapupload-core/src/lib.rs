//! mapupload - game map ingestion for Source dedicated servers
//!
//! This library downloads a map archive, installs its files into the server's
//! maps directory, mirrors them bzip2-compressed to the fast-dl store and
//! keeps the mapcycle manifest sorted.

pub mod archive;
pub mod compress;
pub mod config;
pub mod dedup;
pub mod error;
pub mod fetch;
pub mod manifest;
pub mod map_name;
pub mod pipeline;
pub mod remote;
pub mod response;

pub use error::{Error, Result};

// Re-export commonly used types
pub use archive::{classify, extract, ArchiveKind};
pub use config::Config;
pub use manifest::{ManifestStore, MatchMode};
pub use map_name::MapName;
pub use pipeline::Pipeline;
pub use remote::{connector_for, Connector, LocalConnector, RemoteStore, SftpConnector};
pub use response::{
    AddMapResponse, AddMapToManifestResponse, ExtractResponse, FastDlResponse, ManifestResponse,
};
