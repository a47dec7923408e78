use axum::{
    extract::{Multipart, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::post,
    Json, Router,
};
use portfolio_media::{
    AssetFile, AssetUploader, HttpAssetUploader, HttpAssetUploaderOptions, MediaError,
    OwnerContext,
};
use serde_json::json;
use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

#[derive(Debug, Clone, Default)]
struct ReceivedUpload {
    authorization: Option<String>,
    fields: HashMap<String, String>,
    file_name: Option<String>,
    content_type: Option<String>,
    file_len: usize,
}

type Received = Arc<Mutex<Vec<ReceivedUpload>>>;

async fn handle_upload(
    State(received): State<Received>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> impl IntoResponse {
    let mut upload = ReceivedUpload {
        authorization: headers
            .get("authorization")
            .and_then(|value| value.to_str().ok())
            .map(str::to_string),
        ..ReceivedUpload::default()
    };

    while let Some(field) = multipart.next_field().await.unwrap() {
        let name = field.name().unwrap_or_default().to_string();
        if name == "file" {
            upload.file_name = field.file_name().map(str::to_string);
            upload.content_type = field.content_type().map(str::to_string);
            upload.file_len = field.bytes().await.unwrap().len();
        } else {
            upload.fields.insert(name, field.text().await.unwrap());
        }
    }

    received.lock().unwrap().push(upload);
    Json(json!({ "url": "https://cdn.example.com/uploads/new.png" }))
}

async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind listener");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve");
    });
    format!("http://{addr}")
}

#[tokio::test]
async fn http_uploader_sends_multipart_form_and_returns_url() {
    let received: Received = Arc::default();
    let app = Router::new()
        .route("/upload-image", post(handle_upload))
        .with_state(received.clone());
    let base_url = serve(app).await;

    let uploader = HttpAssetUploader::new(HttpAssetUploaderOptions {
        base_url: Some(base_url),
        api_key: Some("secret".to_string()),
        ..Default::default()
    });

    let url = uploader
        .upload(
            AssetFile::new("hero.png", "image/png", vec![7u8; 512]),
            &OwnerContext::new("fintech-redesign"),
            Some("https://cdn.example.com/img-A.png"),
        )
        .await
        .expect("upload should succeed");

    assert_eq!(url, "https://cdn.example.com/uploads/new.png");

    let received = received.lock().unwrap().clone();
    assert_eq!(received.len(), 1);
    let upload = &received[0];
    assert_eq!(upload.authorization.as_deref(), Some("Bearer secret"));
    assert_eq!(upload.file_name.as_deref(), Some("hero.png"));
    assert_eq!(upload.content_type.as_deref(), Some("image/png"));
    assert_eq!(upload.file_len, 512);
    assert_eq!(
        upload.fields.get("projectId").map(String::as_str),
        Some("fintech-redesign")
    );
    assert_eq!(
        upload.fields.get("oldImageUrl").map(String::as_str),
        Some("https://cdn.example.com/img-A.png")
    );
}

#[tokio::test]
async fn http_uploader_omits_previous_url_when_absent() {
    let received: Received = Arc::default();
    let app = Router::new()
        .route("/upload-image", post(handle_upload))
        .with_state(received.clone());
    let base_url = serve(app).await;

    let uploader = HttpAssetUploader::new(HttpAssetUploaderOptions {
        base_url: Some(base_url),
        ..Default::default()
    });

    uploader
        .upload(
            AssetFile::new("hero.png", "image/png", vec![1u8; 16]),
            &OwnerContext::new("p1"),
            None,
        )
        .await
        .expect("upload should succeed");

    let received = received.lock().unwrap().clone();
    assert!(!received[0].fields.contains_key("oldImageUrl"));
    assert_eq!(received[0].authorization, None);
}

#[tokio::test]
async fn http_uploader_reports_endpoint_failures() {
    let app = Router::new().route(
        "/upload-image",
        post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "bucket unavailable") }),
    );
    let base_url = serve(app).await;

    let uploader = HttpAssetUploader::new(HttpAssetUploaderOptions {
        base_url: Some(base_url),
        ..Default::default()
    });

    let err = uploader
        .upload(
            AssetFile::new("hero.png", "image/png", vec![1u8; 16]),
            &OwnerContext::new("p1"),
            None,
        )
        .await
        .expect_err("500 should fail");

    assert!(
        matches!(&err, MediaError::StatusCode(status, body)
            if status.as_u16() == 500 && body == "bucket unavailable"),
        "unexpected error: {err:?}"
    );
}

#[tokio::test]
async fn http_uploader_rejects_responses_without_url() {
    let app = Router::new().route("/upload-image", post(|| async { Json(json!({})) }));
    let base_url = serve(app).await;

    let uploader = HttpAssetUploader::new(HttpAssetUploaderOptions {
        base_url: Some(base_url),
        ..Default::default()
    });

    let err = uploader
        .upload(
            AssetFile::new("hero.png", "image/png", vec![1u8; 16]),
            &OwnerContext::new("p1"),
            None,
        )
        .await
        .expect_err("missing url should fail");

    match err {
        MediaError::Invariant(endpoint, message) => {
            assert_eq!(endpoint, "upload");
            assert_eq!(message, "No URL in upload response");
        }
        other => panic!("unexpected error variant: {other:?}"),
    }
}
