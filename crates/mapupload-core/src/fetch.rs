//! Downloading map archives

use crate::map_name::MapName;
use crate::{Error, Result};
use futures_util::StreamExt;
use reqwest::header::{HeaderMap, CONTENT_DISPOSITION, CONTENT_LENGTH, CONTENT_TYPE};
use reqwest::{Client, Url};
use tempfile::{Builder, TempPath};
use tokio::io::AsyncWriteExt;
use tracing::{debug, error, info, warn};

/// Prefix of downloaded temp files
const TEMP_PREFIX: &str = "mapupload_";

/// Media types accepted for map archives
pub const ALLOWED_CONTENT_TYPES: &[&str] = &[
    "application/zip",
    "application/binary",
    "application/octet-stream",
];

/// A downloaded archive waiting to be extracted
///
/// The archive is deleted when this value is dropped.
#[derive(Debug)]
pub struct Download {
    pub archive: TempPath,
    pub map_name: MapName,
    pub size: u64,
}

/// Outcome of a download, `download` is `None` on failure
#[derive(Debug, Default)]
pub struct DownloadResponse {
    pub download: Option<Download>,
    pub errors: Vec<String>,
}

impl DownloadResponse {
    fn failure(message: impl Into<String>) -> Self {
        Self {
            download: None,
            errors: vec![message.into()],
        }
    }

    fn fault() -> Self {
        Self::default()
    }
}

fn size_limit_message(max_bytes: u64) -> String {
    format!("File size goes over limit of {} MB", max_bytes as f64 / 1e6)
}

/// Media type of a `Content-Type` value, lower-cased, parameters stripped
fn media_type(value: &str) -> String {
    value
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_lowercase()
}

/// Check the response headers, returning the announced size and map name
fn validate_headers(
    headers: &HeaderMap,
    url: &Url,
    max_bytes: u64,
) -> std::result::Result<(u64, MapName), String> {
    let content_length = headers
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .ok_or_else(|| "Response is missing Content-Length.".to_string())?;

    let content_type = headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| "Response is missing Content-Type.".to_string())?;
    let essence = media_type(content_type);
    if !ALLOWED_CONTENT_TYPES.contains(&essence.as_str()) {
        return Err(format!("Unsupported content type \"{}\".", content_type));
    }

    let map_name = headers
        .get(CONTENT_DISPOSITION)
        .and_then(|v| v.to_str().ok())
        .and_then(MapName::from_content_disposition)
        .or_else(|| MapName::from_url(url))
        .ok_or_else(|| "Could not determine file name.".to_string())?;

    if content_length > max_bytes {
        return Err(size_limit_message(max_bytes));
    }

    Ok((content_length, map_name))
}

fn parse_url(url: &str) -> Result<Url> {
    Url::parse(url).map_err(|e| {
        debug!("Rejected URL {:?}: {}", url, e);
        Error::InvalidUrl(url.to_string())
    })
}

/// Download `url` into a temporary file
///
/// Nothing is left on disk when the download fails.
pub async fn download(client: &Client, url: &str, max_bytes: u64) -> DownloadResponse {
    let parsed = match parse_url(url) {
        Ok(parsed) => parsed,
        Err(e) => return DownloadResponse::failure(e.to_string()),
    };

    info!("Downloading {}", parsed);
    let response = match client.get(parsed.clone()).send().await {
        Ok(response) => response,
        Err(e) => {
            error!("Request to {} failed: {}", parsed, e);
            return DownloadResponse::fault();
        }
    };

    if !response.status().is_success() {
        warn!("{} answered with status {}", parsed, response.status());
        return DownloadResponse::fault();
    }

    let final_url = response.url().clone();
    if final_url != parsed {
        debug!("{} redirected to {}", parsed, final_url);
    }

    let (content_length, map_name) =
        match validate_headers(response.headers(), &final_url, max_bytes) {
            Ok(validated) => validated,
            Err(message) => {
                info!("Rejected download from {}: {}", final_url, message);
                return DownloadResponse::failure(message);
            }
        };

    match write_body(response, max_bytes).await {
        Ok(Some((archive, size))) => {
            info!(
                "Downloaded map {} ({} bytes, {} announced)",
                map_name, size, content_length
            );
            DownloadResponse {
                download: Some(Download {
                    archive,
                    map_name,
                    size,
                }),
                errors: Vec::new(),
            }
        }
        Ok(None) => DownloadResponse::failure(size_limit_message(max_bytes)),
        Err(e) => {
            error!("Failed to download {}: {}", parsed, e);
            DownloadResponse::fault()
        }
    }
}

/// Stream the body into a temp file, `None` if it grew past `max_bytes`
async fn write_body(
    response: reqwest::Response,
    max_bytes: u64,
) -> Result<Option<(TempPath, u64)>> {
    let (file, path) = Builder::new()
        .prefix(TEMP_PREFIX)
        .tempfile()?
        .into_parts();
    let mut file = tokio::fs::File::from_std(file);
    let mut stream = response.bytes_stream();
    let mut size = 0u64;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        size += chunk.len() as u64;
        if size > max_bytes {
            warn!("Body passed the {} byte limit", max_bytes);
            return Ok(None);
        }
        file.write_all(&chunk).await?;
    }
    file.flush().await?;

    Ok(Some((path, size)))
}
