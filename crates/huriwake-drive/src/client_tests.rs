//! HTTP-level tests for the Drive client against a mock server.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use wiremock::matchers::{body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::api::DriveApi;
use crate::client::{DriveClient, DriveConfig};
use crate::error::{DriveError, DriveResult};
use crate::retry::RetryConfig;
use crate::token_cache::{AccessTokenSource, StaticToken};

// =============================================================================
// Test Helpers
// =============================================================================

fn test_config(base_url: &str) -> DriveConfig {
    DriveConfig {
        shared_drive_id: None,
        api_base_url: base_url.to_string(),
        upload_base_url: format!("{}/upload", base_url),
        timeout: Duration::from_secs(5),
        connect_timeout: Duration::from_secs(2),
        page_size: 1000,
        retry: RetryConfig {
            max_retries: 2,
            base_delay_ms: 1,
            max_delay_ms: 5,
        },
    }
}

fn client_for(server: &MockServer) -> DriveClient {
    DriveClient::new(test_config(&server.uri()), Arc::new(StaticToken::new("test-token")))
        .unwrap()
}

/// Hands out `stale` until invalidated, then `fresh`.
struct RotatingToken {
    invalidations: AtomicUsize,
}

#[async_trait]
impl AccessTokenSource for RotatingToken {
    async fn access_token(&self) -> DriveResult<String> {
        if self.invalidations.load(Ordering::SeqCst) == 0 {
            Ok("stale".to_string())
        } else {
            Ok("fresh".to_string())
        }
    }

    async fn invalidate(&self) {
        self.invalidations.fetch_add(1, Ordering::SeqCst);
    }
}

// =============================================================================
// Listing
// =============================================================================

#[tokio::test]
async fn test_list_child_folders_sends_folder_query() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/files"))
        .and(query_param(
            "q",
            "'root' in parents and mimeType = 'application/vnd.google-apps.folder' and trashed = false",
        ))
        .and(query_param("supportsAllDrives", "true"))
        .and(query_param("includeItemsFromAllDrives", "true"))
        .and(header("authorization", "Bearer test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "files": [{"id": "f1", "name": "3~5"}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let page = client_for(&server)
        .list_child_folders("root", None)
        .await
        .unwrap();

    assert_eq!(page.files.len(), 1);
    assert_eq!(page.files[0].name, "3~5");
    assert!(page.next_page_token.is_none());
}

#[tokio::test]
async fn test_shared_drive_scope_is_attached_to_listings() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/files"))
        .and(query_param("corpora", "drive"))
        .and(query_param("driveId", "team-drive"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"files": []})))
        .expect(1)
        .mount(&server)
        .await;

    let mut config = test_config(&server.uri());
    config.shared_drive_id = Some("team-drive".to_string());
    let client = DriveClient::new(config, Arc::new(StaticToken::new("t"))).unwrap();

    client.list_child_folders("root", None).await.unwrap();
}

#[tokio::test]
async fn test_list_all_images_follows_pages() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/files"))
        .and(query_param("pageToken", "page-2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "files": [{"id": "img-3", "name": "c.jpg", "parents": ["b1"]}]
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/files"))
        .and(query_param("orderBy", "createdTime"))
        .and(query_param(
            "q",
            "('b1' in parents or 'b2' in parents) and mimeType contains 'image/' and trashed = false",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "files": [
                {"id": "img-1", "name": "a.jpg", "parents": ["b1"]},
                {"id": "img-2", "name": "b.jpg", "parents": ["b2"]}
            ],
            "nextPageToken": "page-2"
        })))
        .mount(&server)
        .await;

    let files = client_for(&server)
        .list_all_images(&["b1".to_string(), "b2".to_string()])
        .await
        .unwrap();

    let ids: Vec<_> = files.iter().map(|f| f.id.as_str()).collect();
    assert_eq!(ids, vec!["img-1", "img-2", "img-3"]);
}

#[tokio::test]
async fn test_list_images_with_no_parents_makes_no_call() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let page = client_for(&server).list_images(&[], None).await.unwrap();
    assert!(page.files.is_empty());
}

#[tokio::test]
async fn test_listing_retries_server_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/files"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/files"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"files": []})))
        .expect(1)
        .mount(&server)
        .await;

    let page = client_for(&server).list_child_folders("root", None).await;
    assert!(page.is_ok());
}

// =============================================================================
// Mutations and metadata
// =============================================================================

#[tokio::test]
async fn test_create_folder_posts_metadata() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/files"))
        .and(query_param("supportsAllDrives", "true"))
        .and(body_string_contains("application/vnd.google-apps.folder"))
        .and(body_string_contains("\"parents\":[\"root\"]"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "new-folder"})))
        .expect(1)
        .mount(&server)
        .await;

    let id = client_for(&server).create_folder("root", "other").await.unwrap();
    assert_eq!(id, "new-folder");
}

#[tokio::test]
async fn test_create_folder_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/files"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;

    let result = client_for(&server).create_folder("root", "other").await;
    assert!(matches!(result, Err(DriveError::ServerError(503, _))));
}

#[tokio::test]
async fn test_upload_uses_multipart_related() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/upload/files"))
        .and(query_param("uploadType", "multipart"))
        .and(query_param("supportsAllDrives", "true"))
        .and(body_string_contains("\"name\":\"shot.png\""))
        .and(body_string_contains("PNGDATA"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "file-1"})))
        .expect(1)
        .mount(&server)
        .await;

    let id = client_for(&server)
        .upload_file("bucket", "shot.png", "image/png", b"PNGDATA".to_vec())
        .await
        .unwrap();
    assert_eq!(id, "file-1");
}

#[tokio::test]
async fn test_get_parents_maps_404_to_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/files/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_string("File not found"))
        .expect(1)
        .mount(&server)
        .await;

    let err = client_for(&server).get_parents("missing").await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_reparent_adds_and_removes_in_one_call() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/files/file-1"))
        .and(query_param("addParents", "target"))
        .and(query_param("removeParents", "src,extra"))
        .and(query_param("supportsAllDrives", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "file-1",
            "parents": ["target"]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let file = client_for(&server)
        .reparent("file-1", "target", &["src".to_string(), "extra".to_string()])
        .await
        .unwrap();
    assert_eq!(file.parents, vec!["target".to_string()]);
}

#[tokio::test]
async fn test_download_returns_bytes_and_type() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/files/img-1"))
        .and(query_param("alt", "media"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "image/png")
                .set_body_bytes(b"PNG".to_vec()),
        )
        .expect(1)
        .mount(&server)
        .await;

    let download = client_for(&server).download("img-1").await.unwrap();
    assert_eq!(download.bytes, b"PNG".to_vec());
    assert_eq!(download.content_type, "image/png");
}

// =============================================================================
// Auth
// =============================================================================

#[tokio::test]
async fn test_401_refreshes_token_and_retries_once() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/files/file-1"))
        .and(header("authorization", "Bearer stale"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/files/file-1"))
        .and(header("authorization", "Bearer fresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "file-1",
            "parents": ["p1"]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let tokens = Arc::new(RotatingToken {
        invalidations: AtomicUsize::new(0),
    });
    let client = DriveClient::new(test_config(&server.uri()), tokens.clone()).unwrap();

    let parents = client.get_parents("file-1").await.unwrap();
    assert_eq!(parents, vec!["p1".to_string()]);
    assert_eq!(tokens.invalidations.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_check_connectivity_reads_root_folder() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/files/root"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "root"})))
        .expect(1)
        .mount(&server)
        .await;

    assert!(client_for(&server).check_connectivity(Some("root")).await.is_ok());
}

#[tokio::test]
async fn test_check_connectivity_without_root_reads_about() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/about"))
        .and(query_param("fields", "user"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"user": {}})))
        .expect(1)
        .mount(&server)
        .await;

    assert!(client_for(&server).check_connectivity(None).await.is_ok());
}
