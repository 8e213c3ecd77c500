//! End-to-end fetch tests against a loopback mock of the ImageServer.

mod common;

use common::{geotiff_bytes, MockServer};
use std::fs;
use tempfile::TempDir;
use terreng_dem::{
    BoundingBox, FetchRequest, GeoPoint, HoydedataClient, RasterInfo, ServiceConfig, TerrainError,
};

fn config_for(server: &MockServer) -> ServiceConfig {
    ServiceConfig::default()
        .with_endpoint(&server.endpoint)
        .expect("mock endpoint")
}

#[test]
fn test_fetch_centered_writes_geotiff() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("terrain.tif");

    let body = geotiff_bytes(100, 100, 257_740.0, 6_655_808.0);
    let server = MockServer::start(200, "image/tiff", body.clone());
    let config = config_for(&server);

    let center = GeoPoint::new(59.9639, 10.6683).unwrap();
    let fetch = FetchRequest::centered(&config, center, 1000.0, 1000.0, 10.0, &output).unwrap();
    assert_eq!((fetch.pixels.width, fetch.pixels.height), (100, 100));

    let client = HoydedataClient::new(config).unwrap();
    let outcome = client.fetch(&fetch).unwrap();
    assert_eq!(outcome.path, output);
    assert_eq!(outcome.bytes_written, body.len() as u64);
    assert_eq!(fs::metadata(&output).unwrap().len(), body.len() as u64);

    let target = server.request_target();
    assert!(target.starts_with("/arcgis/rest/services/DTM/ImageServer/exportImage?"), "{target}");
    assert!(target.contains("bboxSR=25833"));
    assert!(target.contains("imageSR=25833"));
    assert!(target.contains("size=100%2C100"));
    assert!(target.contains("format=tiff"));
    assert!(target.contains("f=image"));

    let info = RasterInfo::from_file(&output).unwrap();
    assert!(info.width.abs_diff(fetch.pixels.width) <= 1);
    assert!(info.height.abs_diff(fetch.pixels.height) <= 1);
    assert_eq!(info.epsg, Some(25833));
}

#[test]
fn test_fetch_bbox_writes_geotiff() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("nested").join("area.tif");

    let server = MockServer::start(200, "image/tiff", geotiff_bytes(16, 8, 0.0, 0.0));
    let config = config_for(&server);

    let bbox = BoundingBox::new(59.9, 10.6, 60.0, 10.8).unwrap();
    let fetch = FetchRequest::bounded(&config, bbox, 50.0, &output).unwrap();
    let expected_size = format!("size={}%2C{}", fetch.pixels.width, fetch.pixels.height);

    HoydedataClient::new(config).unwrap().fetch(&fetch).unwrap();
    assert!(output.exists());
    assert!(server.request_target().contains(&expected_size));
}

#[test]
fn test_server_error_leaves_no_file() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("terrain.tif");

    let server = MockServer::start(500, "text/html", b"<html>down</html>".to_vec());
    let config = config_for(&server);
    let center = GeoPoint::new(59.9639, 10.6683).unwrap();
    let fetch = FetchRequest::centered(&config, center, 100.0, 100.0, 1.0, &output).unwrap();

    let result = HoydedataClient::new(config).unwrap().fetch(&fetch);
    assert!(
        matches!(result, Err(TerrainError::ServiceError { status: 500, .. })),
        "{result:?}"
    );
    assert!(!output.exists());
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    server.request_target();
}

#[test]
fn test_arcgis_json_error() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("terrain.tif");

    let body = br#"{"error":{"code":400,"message":"Unable to complete operation.","details":["The requested image exceeds the size limit."]}}"#;
    let server = MockServer::start(200, "application/json; charset=utf-8", body.to_vec());
    let config = config_for(&server);
    let center = GeoPoint::new(59.9639, 10.6683).unwrap();
    let fetch = FetchRequest::centered(&config, center, 100.0, 100.0, 1.0, &output).unwrap();

    match HoydedataClient::new(config).unwrap().fetch(&fetch) {
        Err(TerrainError::ServiceError { status, message }) => {
            assert_eq!(status, 400);
            assert!(message.contains("exceeds the size limit"), "{message}");
        }
        other => panic!("expected ServiceError, got {other:?}"),
    }
    assert!(!output.exists());
    server.request_target();
}

#[test]
fn test_empty_response() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("terrain.tif");

    let server = MockServer::start(200, "image/tiff", Vec::new());
    let config = config_for(&server);
    let center = GeoPoint::new(59.9639, 10.6683).unwrap();
    let fetch = FetchRequest::centered(&config, center, 100.0, 100.0, 1.0, &output).unwrap();

    assert!(matches!(
        HoydedataClient::new(config).unwrap().fetch(&fetch),
        Err(TerrainError::EmptyResponse)
    ));
    assert!(!output.exists());
    server.request_target();
}

#[test]
fn test_connection_refused_is_http_error() {
    // bind and drop to get a port nobody listens on
    let port = std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port();
    let config = ServiceConfig::default()
        .with_endpoint(&format!("http://127.0.0.1:{port}/exportImage"))
        .unwrap();
    let dir = TempDir::new().unwrap();
    let center = GeoPoint::new(59.9639, 10.6683).unwrap();
    let fetch =
        FetchRequest::centered(&config, center, 100.0, 100.0, 1.0, dir.path().join("t.tif")).unwrap();

    assert!(matches!(
        HoydedataClient::new(config).unwrap().fetch(&fetch),
        Err(TerrainError::Http(_))
    ));
}
