use async_trait::async_trait;
use mapupload_core::config::{Config, RemoteProtocol};
use mapupload_core::remote::{Connector, LocalConnector, RemoteStore};
use mapupload_core::{Error, Pipeline, Result};
use mapupload_testing::assertions::{assert_bz2_content, assert_manifest};
use mapupload_testing::fixtures::{bsp_payload, bz2_bytes, map_zip};
use mapupload_testing::{ServerLayout, TestDir};
use reqwest::Client;
use std::fs;
use std::sync::Arc;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config(server: &ServerLayout) -> Config {
    let mut config = Config::default();
    config.remote.protocol = RemoteProtocol::Local;
    config.remote.maps_dir = server.fastdl_dir.display().to_string();
    config.server.maps_dir = server.maps_dir.clone();
    config.server.manifest_file = server.manifest.clone();
    config
}

fn pipeline(server: &ServerLayout) -> Pipeline {
    Pipeline::new(config(server), Arc::new(LocalConnector::new()), Client::new()).unwrap()
}

/// Connector whose every session attempt fails
struct OfflineConnector;

#[async_trait]
impl Connector for OfflineConnector {
    async fn connect(&self) -> Result<Box<dyn RemoteStore>> {
        Err(Error::Remote("connection refused".to_string()))
    }
}

async fn serve(body: Vec<u8>, content_type: &str, file: &str) -> (MockServer, String) {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/{}", file)))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, content_type))
        .mount(&server)
        .await;
    let url = format!("{}/{}", server.uri(), file);
    (server, url)
}

#[tokio::test]
async fn test_add_map_from_zip() {
    let test_dir = TestDir::new().unwrap();
    let server = test_dir.server(&["cs_office", "de_dust2"]).unwrap();
    let (_mock, url) = serve(map_zip("test").unwrap(), "application/zip", "test.zip").await;

    let response = pipeline(&server).add_map(&url).await;

    assert!(response.completed);
    assert!(response.is_success(), "{:?}", response.errors());
    assert!(response.errors().is_empty());
    assert_eq!(response.map_name.as_ref().unwrap().as_str(), "test");
    assert_eq!(response.files_extracted(), 3);
    assert_eq!(
        response.fastdl.as_ref().unwrap().files_uploaded,
        vec!["test.bsp", "test.txt"]
    );
    assert!(response.wrote_to_file());

    assert_eq!(
        fs::read(server.map_file("test.bsp")).unwrap(),
        bsp_payload(4096)
    );
    assert!(server.map_file("test.nav").exists());
    assert_bz2_content(&server.fastdl_file("test.bsp"), &bsp_payload(4096)).unwrap();
    assert_bz2_content(&server.fastdl_file("test.txt"), b"Map description").unwrap();
    assert!(!server.fastdl_file("test.nav").exists());
    assert_manifest(&server.manifest, &["cs_office", "de_dust2", "test"]).unwrap();
}

#[tokio::test]
async fn test_add_map_from_bzip2() {
    let test_dir = TestDir::new().unwrap();
    let server = test_dir.server(&["zm_x"]).unwrap();
    let payload = bsp_payload(70_000);
    let (_mock, url) = serve(
        bz2_bytes(&payload).unwrap(),
        "application/octet-stream",
        "Surf_Mesa.bsp.bz2",
    )
    .await;

    let response = pipeline(&server).add_map(&url).await;

    assert!(response.is_success(), "{:?}", response.errors());
    assert_eq!(fs::read(server.map_file("Surf_Mesa.bsp")).unwrap(), payload);
    assert_bz2_content(&server.fastdl_file("Surf_Mesa.bsp"), &payload).unwrap();
    assert_manifest(&server.manifest, &["Surf_Mesa", "zm_x"]).unwrap();
}

#[tokio::test]
async fn test_repeated_zip_add_changes_nothing() {
    let test_dir = TestDir::new().unwrap();
    let server = test_dir.server(&["cs_office"]).unwrap();
    let (_mock, url) = serve(map_zip("test").unwrap(), "application/zip", "test.zip").await;
    let pipeline = pipeline(&server);

    let first = pipeline.add_map(&url).await;
    assert!(first.is_success(), "{:?}", first.errors());
    assert_eq!(first.files_uploaded(), 2);

    let second = pipeline.add_map(&url).await;
    let errors = second.errors();

    assert!(second.completed);
    assert!(!second.is_success());
    assert_eq!(second.files_extracted(), 0);
    assert_eq!(second.files_uploaded(), 0);
    assert!(!second.wrote_to_file());
    for message in [
        "No files were extracted.",
        "test.bsp already exists.",
        "test.txt already exists.",
        "Fast-dl already has all files.",
        "Map test already exists in manifest.",
    ] {
        assert!(errors.iter().any(|e| e == message), "{:?}", errors);
    }
    assert_manifest(&server.manifest, &["cs_office", "test"]).unwrap();
}

#[tokio::test]
async fn test_add_installed_map_changes_nothing() {
    let test_dir = TestDir::new().unwrap();
    let server = test_dir.server(&["test"]).unwrap();
    fs::write(server.map_file("test.bsp"), b"installed").unwrap();
    fs::write(server.fastdl_file("test.bsp"), b"compressed").unwrap();
    let (_mock, url) = serve(bsp_payload(512), "application/binary", "test.bsp").await;

    let response = pipeline(&server).add_map(&url).await;

    assert!(response.completed);
    assert!(!response.is_success());
    assert_eq!(response.files_extracted(), 0);
    assert_eq!(response.files_uploaded(), 0);
    assert_eq!(
        response.errors(),
        vec![
            "No files were extracted.",
            "test.bsp already exists.",
            "Fast-dl already has all files.",
            "Map test already exists in manifest.",
        ]
    );
    assert_eq!(fs::read(server.map_file("test.bsp")).unwrap(), b"installed");
    assert_manifest(&server.manifest, &["test"]).unwrap();
}

#[tokio::test]
async fn test_add_map_without_map_files() {
    let test_dir = TestDir::new().unwrap();
    let server = test_dir.server(&[]).unwrap();
    let body = mapupload_testing::fixtures::zip_bytes(&[("readme.txt", b"hi".as_slice())]).unwrap();
    let (_mock, url) = serve(body, "application/zip", "test.zip").await;

    let response = pipeline(&server).add_map(&url).await;

    assert!(!response.completed);
    assert!(response.fastdl.is_none());
    assert_eq!(response.errors(), vec!["No files were extracted."]);
}

#[tokio::test]
async fn test_add_map_unrecognized_format() {
    let test_dir = TestDir::new().unwrap();
    let server = test_dir.server(&[]).unwrap();
    let (_mock, url) = serve(b"not a map".to_vec(), "application/octet-stream", "test.bsp").await;

    let response = pipeline(&server).add_map(&url).await;

    assert!(!response.is_success());
    assert_eq!(response.errors(), vec!["Unrecognized file format."]);
    assert!(!server.map_file("test.bsp").exists());
}

#[tokio::test]
async fn test_add_map_download_failure() {
    let test_dir = TestDir::new().unwrap();
    let server = test_dir.server(&[]).unwrap();
    let (_mock, url) = serve(b"<html>".to_vec(), "text/html", "test.zip").await;

    let response = pipeline(&server).add_map(&url).await;

    assert!(!response.is_success());
    assert!(response.extract.is_none());
    assert_eq!(
        response.errors(),
        vec![
            "Unsupported content type \"text/html\".",
            "Failed to download file."
        ]
    );
}

#[tokio::test]
async fn test_add_map_with_offline_fastdl() {
    let test_dir = TestDir::new().unwrap();
    let server = test_dir.server(&["a"]).unwrap();
    let (_mock, url) = serve(map_zip("test").unwrap(), "application/zip", "test.zip").await;

    let pipeline = Pipeline::new(config(&server), Arc::new(OfflineConnector), Client::new()).unwrap();
    let response = pipeline.add_map(&url).await;

    assert!(!response.completed);
    assert!(!response.is_success());
    assert_eq!(response.files_extracted(), 3);
    assert_eq!(response.errors(), vec!["Failed to check fast-dl files."]);
    assert!(response.manifest.is_none());
    assert_manifest(&server.manifest, &["a"]).unwrap();
}

#[tokio::test]
async fn test_add_map_to_manifest_twice() {
    let test_dir = TestDir::new().unwrap();
    let server = test_dir.server(&["b", "d"]).unwrap();
    fs::write(server.map_file("c.bsp"), bsp_payload(128)).unwrap();
    fs::write(server.map_file("c.nav"), b"nav").unwrap();
    let pipeline = pipeline(&server);

    let first = pipeline.add_map_to_manifest("c").await;
    assert!(first.is_success(), "{:?}", first.errors());
    assert_eq!(first.files_uploaded(), 1);
    assert_manifest(&server.manifest, &["b", "c", "d"]).unwrap();
    let manifest_before = fs::read(&server.manifest).unwrap();

    let second = pipeline.add_map_to_manifest("c").await;
    assert!(second.completed);
    assert!(!second.is_success());
    assert_eq!(
        second.errors(),
        vec![
            "Fast-dl already has all files.",
            "Map c already exists in manifest."
        ]
    );
    assert_eq!(fs::read(&server.manifest).unwrap(), manifest_before);
}

#[tokio::test]
async fn test_add_missing_map_to_manifest() {
    let test_dir = TestDir::new().unwrap();
    let server = test_dir.server(&[]).unwrap();

    let response = pipeline(&server).add_map_to_manifest("nothere").await;

    assert!(!response.is_success());
    assert_eq!(response.errors(), vec!["Map does not exist!"]);
    assert!(response.fastdl.is_none());
}

#[tokio::test]
async fn test_add_map_to_missing_manifest() {
    let test_dir = TestDir::new().unwrap();
    let server = test_dir.server(&[]).unwrap();
    fs::remove_file(&server.manifest).unwrap();
    fs::write(server.map_file("c.bsp"), bsp_payload(128)).unwrap();

    let response = pipeline(&server).add_map_to_manifest("c").await;

    assert!(!response.completed);
    assert_eq!(response.files_uploaded(), 1);
    assert_eq!(response.errors(), vec!["Manifest file does not exist."]);
    assert!(!server.manifest.exists());
}

#[tokio::test]
async fn test_remove_from_manifest() {
    let test_dir = TestDir::new().unwrap();
    let server = test_dir.server(&["a", "b", "c"]).unwrap();
    let pipeline = pipeline(&server);

    assert!(pipeline.remove_from_manifest("b").await);
    assert_manifest(&server.manifest, &["a", "c"]).unwrap();

    assert!(!pipeline.remove_from_manifest("b").await);
    assert_manifest(&server.manifest, &["a", "c"]).unwrap();
}

#[tokio::test]
async fn test_upload_only_missing_files() {
    let test_dir = TestDir::new().unwrap();
    let server = test_dir.server(&[]).unwrap();
    fs::write(server.map_file("c.bsp"), bsp_payload(128)).unwrap();
    fs::write(server.map_file("c.txt"), b"about").unwrap();
    fs::write(server.fastdl_file("c.bsp"), b"already there").unwrap();

    let map = mapupload_core::MapName::from_file_name("c").unwrap();
    let response = pipeline(&server).upload_map(&map).await;

    assert!(response.success);
    assert_eq!(response.files_uploaded, vec!["c.txt"]);
    assert_eq!(fs::read(server.fastdl_file("c.bsp")).unwrap(), b"already there");
    assert_bz2_content(&server.fastdl_file("c.txt"), b"about").unwrap();
}
