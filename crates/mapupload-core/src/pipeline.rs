//! The map ingestion pipeline
//!
//! Each entry point runs its stages in order and stops at the first failing
//! one. Stage outcomes are collected into the aggregate response, so callers
//! never see an `Err`.

use crate::archive;
use crate::compress::compress_files;
use crate::config::Config;
use crate::dedup::filter_new;
use crate::fetch::download;
use crate::manifest::ManifestStore;
use crate::map_name::{map_files, MapFileQuery, MapName};
use crate::remote::{remote_path, Connector};
use crate::response::{
    AddMapResponse, AddMapToManifestResponse, ExtractResponse, FastDlResponse, ManifestResponse,
};
use crate::Result;
use regex::Regex;
use reqwest::Client;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Runs map requests against one configuration and one remote store
pub struct Pipeline {
    config: Arc<Config>,
    connector: Arc<dyn Connector>,
    client: Client,
    ignore: Option<Regex>,
    sort: Regex,
}

impl Pipeline {
    /// Fails only when the configured patterns do not compile
    pub fn new(config: Config, connector: Arc<dyn Connector>, client: Client) -> Result<Self> {
        let ignore = config.ignore_pattern()?;
        let sort = config.sort_pattern()?;

        Ok(Self {
            config: Arc::new(config),
            connector,
            client,
            ignore,
            sort,
        })
    }

    fn manifest_store(&self) -> ManifestStore {
        ManifestStore::new(
            &self.config.server.manifest_file,
            self.config.server.manifest_match,
        )
    }

    /// Local files of `map_name`, optionally without ignored ones
    async fn local_files(&self, map_name: &MapName, upload_only: bool) -> Vec<PathBuf> {
        let map_name = map_name.clone();
        let maps_dir = self.config.server.maps_dir.clone();
        let ignore = if upload_only { self.ignore.clone() } else { None };

        let result = tokio::task::spawn_blocking(move || {
            map_files(
                &map_name,
                MapFileQuery {
                    ignore: ignore.as_ref(),
                    local_dir: Some(&maps_dir),
                },
            )
        })
        .await;

        result.unwrap_or_else(|e| {
            error!("Failed to list map files: {}", e);
            Vec::new()
        })
    }

    /// Download, extract, upload and list a map
    pub async fn add_map(&self, url: &str) -> AddMapResponse {
        let mut response = AddMapResponse::default();

        let fetched = download(&self.client, url, self.config.upload.max_bytes).await;
        let Some(downloaded) = fetched.download else {
            response.errors.extend(fetched.errors);
            response.errors.push("Failed to download file.".to_string());
            return response;
        };

        let map_name = downloaded.map_name.clone();
        response.map_name = Some(map_name.clone());

        let maps_dir = self.config.server.maps_dir.clone();
        let extract_name = map_name.clone();
        let extracted = tokio::task::spawn_blocking(move || {
            let result = archive::extract(&downloaded.archive, &extract_name, &maps_dir);
            // Removes the downloaded archive
            drop(downloaded);
            result
        })
        .await;

        let extract = extracted.unwrap_or_else(|e| {
            error!("Extraction task failed: {}", e);
            ExtractResponse::failure("Failed to extract files.")
        });
        let extract_ok = extract.success;
        let nothing_extracted = extract.files_extracted.is_empty();
        let nothing_present = extract.files.is_empty();
        response.extract = Some(extract);

        if !extract_ok {
            return response;
        }
        if nothing_extracted {
            response.errors.push("No files were extracted.".to_string());
            if nothing_present {
                return response;
            }
        }

        let fastdl = self.upload_map(&map_name).await;
        let fastdl_ok = fastdl.success;
        response.fastdl = Some(fastdl);
        if !fastdl_ok {
            return response;
        }

        let manifest = self.insert_into_manifest(&map_name).await;
        let manifest_ok = manifest.success;
        response.manifest = Some(manifest);
        if !manifest_ok {
            return response;
        }

        response.completed = true;
        info!(
            "Added map {}: {} extracted, {} uploaded",
            map_name,
            response.files_extracted(),
            response.files_uploaded()
        );
        response
    }

    /// Upload and list a map that is already installed
    pub async fn add_map_to_manifest(&self, name: &str) -> AddMapToManifestResponse {
        let mut response = AddMapToManifestResponse::default();

        let map_name = match MapName::from_file_name(name) {
            Some(map_name) => map_name,
            None => {
                response.errors.push("Map does not exist!".to_string());
                return response;
            }
        };
        response.map_name = Some(map_name.clone());

        if self.local_files(&map_name, false).await.is_empty() {
            info!("Map {} is not installed", map_name);
            response.errors.push("Map does not exist!".to_string());
            return response;
        }

        let fastdl = self.upload_map(&map_name).await;
        let fastdl_ok = fastdl.success;
        response.fastdl = Some(fastdl);
        if !fastdl_ok {
            return response;
        }

        let manifest = self.insert_into_manifest(&map_name).await;
        let manifest_ok = manifest.success;
        response.manifest = Some(manifest);
        if !manifest_ok {
            return response;
        }

        response.completed = true;
        response
    }

    /// Remove a map from the manifest, returns whether the file changed
    pub async fn remove_from_manifest(&self, name: &str) -> bool {
        let Some(map_name) = MapName::from_file_name(name) else {
            return false;
        };

        let store = self.manifest_store();
        let result =
            tokio::task::spawn_blocking(move || store.remove(map_name.as_str())).await;

        result.unwrap_or_else(|e| {
            error!("Manifest task failed: {}", e);
            false
        })
    }

    /// Put the map's missing files on fast-dl
    pub async fn upload_map(&self, map_name: &MapName) -> FastDlResponse {
        let remote_dir = self.config.remote.maps_dir.as_str();

        let local = self.local_files(map_name, true).await;
        if local.is_empty() {
            return FastDlResponse::failure("No map files to upload.");
        }

        let missing = match self.connector.connect().await {
            Ok(store) => filter_new(store.as_ref(), remote_dir, &local).await,
            Err(e) => {
                error!("Failed to connect to fast-dl: {}", e);
                None
            }
        };
        let Some(missing) = missing else {
            return FastDlResponse::failure("Failed to check fast-dl files.");
        };

        if missing.is_empty() {
            info!("Fast-dl already has every file of {}", map_name);
            return FastDlResponse {
                success: true,
                files_uploaded: Vec::new(),
                errors: vec!["Fast-dl already has all files.".to_string()],
            };
        }

        let level = self.config.compression.level;
        let compressed =
            tokio::task::spawn_blocking(move || compress_files(level, &missing)).await;
        let compressed = compressed.unwrap_or_else(|e| {
            error!("Compression task failed: {}", e);
            Vec::new()
        });
        if compressed.is_empty() {
            return FastDlResponse::failure("No files were compressed.");
        }

        let mut response = FastDlResponse {
            success: true,
            ..Default::default()
        };

        match self.connector.connect().await {
            Ok(store) => {
                for file in &compressed {
                    let target = remote_path(remote_dir, &file.real_file);
                    if let Err(e) = store.put(&file.compressed_file, &target).await {
                        error!("Failed to upload {}: {}", target, e);
                        response
                            .errors
                            .push("Failed to upload files to fast-dl!".to_string());
                        break;
                    }
                    if let Some(name) = file.real_file.file_name() {
                        response
                            .files_uploaded
                            .push(name.to_string_lossy().to_string());
                    }
                }
            }
            Err(e) => {
                error!("Failed to connect to fast-dl: {}", e);
                response
                    .errors
                    .push("Failed to upload files to fast-dl!".to_string());
            }
        }

        if response.files_uploaded.len() < compressed.len() {
            warn!(
                "Uploaded {} of {} files for {}",
                response.files_uploaded.len(),
                compressed.len(),
                map_name
            );
        }
        response
    }

    async fn insert_into_manifest(&self, map_name: &MapName) -> ManifestResponse {
        let store = self.manifest_store();
        let sort = self.sort.clone();
        let name = map_name.as_str().to_string();

        let result = tokio::task::spawn_blocking(move || store.insert(&name, &sort)).await;

        result.unwrap_or_else(|e| {
            error!("Manifest task failed: {}", e);
            ManifestResponse {
                errors: vec!["Failed to write manifest.".to_string()],
                ..Default::default()
            }
        })
    }
}
