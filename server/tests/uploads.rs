use axum::body::Body;
use axum::extract::{Multipart, Path};
use axum::http::Request;
use axum::routing::post;
use axum::{Json, Router};
use jsonwebtoken::{encode, EncodingKey, Header};
use server::auth::{AuthKeys, SessionClaims};
use server::cloudinary::CloudinaryClient;
use server::db;
use server::startup::build_api_router;
use server::state::AppState;
use serde_json::{json, Value};
use sqlx::sqlite::SqlitePoolOptions;
use std::sync::Arc;
use tower::ServiceExt;

const TEST_SECRET: &str = "upload-test-secret";
const BOUNDARY: &str = "test-boundary-7d93b07ae4b324fb";

fn session_token(sub: &str) -> String {
    let now = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_secs() as i64;
    let claims = SessionClaims {
        sub: sub.to_string(),
        iat: now,
        exp: now + 3600,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(TEST_SECRET.as_bytes()),
    )
    .unwrap()
}

// Stub provider: accepts the signed multipart upload and answers with fixed
// metadata. Videos get no duration field on purpose.
async fn stub_upload(
    Path((_cloud, resource)): Path<(String, String)>,
    mut multipart: Multipart,
) -> Json<Value> {
    let mut file_bytes = 0usize;
    let mut saw_signature = false;
    while let Some(field) = multipart.next_field().await.unwrap() {
        match field.name() {
            Some("file") => file_bytes = field.bytes().await.unwrap().len(),
            Some("signature") => {
                saw_signature = !field.text().await.unwrap().is_empty();
            }
            _ => {
                let _ = field.text().await.unwrap();
            }
        }
    }
    assert!(file_bytes > 0, "stub provider expected a file part");
    assert!(saw_signature, "stub provider expected a signature");

    Json(json!({
        "public_id": format!("{}-uploads/stub-asset", resource),
        "bytes": file_bytes,
        "secure_url": format!("https://res.example.com/demo/{}/upload/stub-asset", resource),
    }))
}

async fn failing_upload() -> (axum::http::StatusCode, String) {
    (
        axum::http::StatusCode::INTERNAL_SERVER_ERROR,
        "simulated provider outage".to_string(),
    )
}

async fn spawn_stub_provider(failing: bool) -> String {
    let app = if failing {
        Router::new().route("/v1_1/:cloud/:resource/upload", post(failing_upload))
    } else {
        Router::new().route("/v1_1/:cloud/:resource/upload", post(stub_upload))
    };

    let server =
        axum::Server::bind(&"127.0.0.1:0".parse().unwrap()).serve(app.into_make_service());
    let addr = server.local_addr();
    tokio::spawn(server);
    format!("http://{}", addr)
}

async fn api_app(provider_base: Option<String>) -> Router {
    // single connection so all requests share the same in-memory database
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("create in-memory db");
    db::initialize_database(pool.clone()).await.expect("init db");

    let provider = provider_base
        .map(|base| CloudinaryClient::new("demo", "test-key", "test-secret").with_base_url(base));

    let state = Arc::new(AppState {
        pool,
        provider,
        auth: AuthKeys::new(TEST_SECRET, None),
    });
    build_api_router(state)
}

// (name, filename, bytes) triples; filename None means a plain text field
fn multipart_body(parts: &[(&str, Option<&str>, &[u8])]) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, filename, data) in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match filename {
            Some(f) => body.extend_from_slice(
                format!(
                    "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: application/octet-stream\r\n\r\n",
                    name, f
                )
                .as_bytes(),
            ),
            None => body.extend_from_slice(
                format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name).as_bytes(),
            ),
        }
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

fn upload_request(path: &str, token: Option<&str>, body: Vec<u8>) -> Request<Body> {
    let mut builder = Request::builder().method("POST").uri(path).header(
        "content-type",
        format!("multipart/form-data; boundary={}", BOUNDARY),
    );
    if let Some(t) = token {
        builder = builder.header("authorization", format!("Bearer {}", t));
    }
    builder.body(Body::from(body)).unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = hyper::body::to_bytes(response.into_body()).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn video_form(title: &str, description: &str, original_size: &str) -> Vec<u8> {
    multipart_body(&[
        ("file", Some("clip.mp4"), b"fake mp4 payload bytes"),
        ("title", None, title.as_bytes()),
        ("description", None, description.as_bytes()),
        ("originalSize", None, original_size.as_bytes()),
    ])
}

#[tokio::test]
async fn image_upload_without_auth_returns_401() {
    let app = api_app(None).await;
    let body = multipart_body(&[("file", Some("photo.jpg"), b"jpegdata")]);
    let response = app
        .oneshot(upload_request("/api/image-upload", None, body))
        .await
        .unwrap();
    assert_eq!(response.status(), 401);
    assert_eq!(json_body(response).await["error"], "Unauthorized");
}

#[tokio::test]
async fn image_upload_missing_file_returns_400() {
    let app = api_app(None).await;
    let token = session_token("user_1");
    let body = multipart_body(&[("note", None, b"no file here")]);
    let response = app
        .oneshot(upload_request("/api/image-upload", Some(&token), body))
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
    assert_eq!(json_body(response).await["error"], "File not found");
}

#[tokio::test]
async fn image_upload_succeeds_and_returns_public_id() {
    let base = spawn_stub_provider(false).await;
    let app = api_app(Some(base)).await;
    let token = session_token("user_1");
    let body = multipart_body(&[("file", Some("photo.jpg"), b"jpegdata")]);
    let response = app
        .oneshot(upload_request("/api/image-upload", Some(&token), body))
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    assert_eq!(json_body(response).await["publicId"], "image-uploads/stub-asset");
}

#[tokio::test]
async fn image_upload_malformed_body_returns_500() {
    let app = api_app(None).await;
    let token = session_token("user_1");
    // declared boundary never appears in the body
    let body = b"this is not a multipart payload".to_vec();
    let response = app
        .oneshot(upload_request("/api/image-upload", Some(&token), body))
        .await
        .unwrap();
    assert_eq!(response.status(), 500);
    assert_eq!(json_body(response).await["error"], "Upload image failed");
}

#[tokio::test]
async fn video_upload_malformed_body_returns_500() {
    let base = spawn_stub_provider(false).await;
    let app = api_app(Some(base)).await;
    let token = session_token("user_1");
    let body = b"this is not a multipart payload".to_vec();
    let response = app
        .oneshot(upload_request("/api/video-upload", Some(&token), body))
        .await
        .unwrap();
    assert_eq!(response.status(), 500);
    assert_eq!(json_body(response).await["error"], "Upload video failed");
}

#[tokio::test]
async fn image_upload_provider_failure_returns_500() {
    let base = spawn_stub_provider(true).await;
    let app = api_app(Some(base)).await;
    let token = session_token("user_1");
    let body = multipart_body(&[("file", Some("photo.jpg"), b"jpegdata")]);
    let response = app
        .oneshot(upload_request("/api/image-upload", Some(&token), body))
        .await
        .unwrap();
    assert_eq!(response.status(), 500);
    assert_eq!(json_body(response).await["error"], "Upload image failed");
}

#[tokio::test]
async fn video_upload_without_auth_returns_401() {
    let app = api_app(None).await;
    let response = app
        .oneshot(upload_request(
            "/api/video-upload",
            None,
            video_form("T", "D", "1000"),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), 401);
}

#[tokio::test]
async fn video_upload_without_credentials_returns_400() {
    let app = api_app(None).await;
    let token = session_token("user_1");
    let response = app
        .oneshot(upload_request(
            "/api/video-upload",
            Some(&token),
            video_form("T", "D", "1000"),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
    assert_eq!(
        json_body(response).await["error"],
        "Media provider credentials are missing"
    );
}

#[tokio::test]
async fn video_upload_missing_file_returns_400() {
    let base = spawn_stub_provider(false).await;
    let app = api_app(Some(base)).await;
    let token = session_token("user_1");
    let body = multipart_body(&[
        ("title", None, b"T"),
        ("description", None, b"D"),
        ("originalSize", None, b"1000"),
    ]);
    let response = app
        .oneshot(upload_request("/api/video-upload", Some(&token), body))
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
    assert_eq!(json_body(response).await["error"], "File not found");
}

#[tokio::test]
async fn video_upload_creates_record_with_defaults() {
    let base = spawn_stub_provider(false).await;
    let app = api_app(Some(base)).await;
    let token = session_token("user_1");
    let response = app
        .oneshot(upload_request(
            "/api/video-upload",
            Some(&token),
            video_form("T", "D", "1000"),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let record = json_body(response).await;
    assert_eq!(record["title"], "T");
    assert_eq!(record["description"], "D");
    assert_eq!(record["originalSize"], "1000");
    assert_eq!(record["publicId"], "video-uploads/stub-asset");
    // stub reports no duration: defaults to zero
    assert_eq!(record["duration"], 0.0);
    assert!(!record["url"].as_str().unwrap().is_empty());
    // compressed size is the provider-reported byte count, as text
    assert_eq!(
        record["compressedSize"],
        b"fake mp4 payload bytes".len().to_string()
    );
}

#[tokio::test]
async fn video_upload_provider_failure_returns_500_and_no_record() {
    let base = spawn_stub_provider(true).await;
    let app = api_app(Some(base)).await;
    let token = session_token("user_1");
    let response = app
        .clone()
        .oneshot(upload_request(
            "/api/video-upload",
            Some(&token),
            video_form("T", "D", "1000"),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), 500);
    assert_eq!(json_body(response).await["error"], "Upload video failed");

    // failure before persistence leaves no trace
    let response = app
        .oneshot(Request::builder().uri("/api/videos").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let listed = json_body(response).await;
    assert_eq!(listed.as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn uploaded_video_appears_in_listing() {
    let base = spawn_stub_provider(false).await;
    let app = api_app(Some(base)).await;
    let token = session_token("user_1");

    let response = app
        .clone()
        .oneshot(upload_request(
            "/api/video-upload",
            Some(&token),
            video_form("Roundtrip", "via listing", "2048"),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let created = json_body(response).await;

    let listing = |app: Router| async move {
        let response = app
            .oneshot(Request::builder().uri("/api/videos").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), 200);
        json_body(response).await
    };

    let first = listing(app.clone()).await;
    let items = first.as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["id"], created["id"]);
    assert_eq!(items[0]["title"], "Roundtrip");

    // idempotent with no intervening writes
    let second = listing(app).await;
    assert_eq!(first, second);
}
