use super::*;
use std::sync::Arc;

use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use shared::{domain::HistoryId, error::ErrorCode};
use tokio::{
    net::TcpListener,
    sync::{oneshot, Mutex},
};

#[derive(Debug)]
struct ReceivedUpload {
    file_name: Option<String>,
    content_type: Option<String>,
    bytes: Vec<u8>,
    direction: Option<String>,
}

#[derive(Clone)]
struct ServerState {
    tx: Arc<Mutex<Option<oneshot::Sender<ReceivedUpload>>>>,
}

async fn handle_generate(
    State(state): State<ServerState>,
    mut multipart: Multipart,
) -> Json<serde_json::Value> {
    let mut received = ReceivedUpload {
        file_name: None,
        content_type: None,
        bytes: Vec::new(),
        direction: None,
    };
    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("file") => {
                received.file_name = field.file_name().map(str::to_string);
                received.content_type = field.content_type().map(str::to_string);
                received.bytes = field.bytes().await.map(|b| b.to_vec()).unwrap_or_default();
            }
            Some("direction") => received.direction = field.text().await.ok(),
            _ => {}
        }
    }
    if let Some(tx) = state.tx.lock().await.take() {
        let _ = tx.send(received);
    }
    Json(serde_json::json!({
        "he_path": "/data/images/he_42.png",
        "bf_path": "/data/images/bf_42.png",
        "id": 42
    }))
}

async fn handle_history() -> Json<serde_json::Value> {
    Json(serde_json::json!([
        {"id": 2, "bf_path": "/data/images/bf_2.png", "he_path": "/data/images/he_2.png", "timestamp": "2026-05-01T10:15:00.000001"},
        {"id": 3, "bf_path": "/data/images/bf_3.png", "he_path": "/data/images/he_3.png", "timestamp": "garbage"},
        {"id": "1", "bf_path": "/data/images/bf_1.png", "he_path": "/data/images/he_1.png", "timestamp": "2026-04-30T08:00:00Z"}
    ]))
}

async fn handle_model_down() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(serde_json::json!({"detail": "Model is not initialized."})),
    )
}

async fn serve(app: Router) -> String {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    format!("http://{addr}")
}

async fn spawn_stain_server() -> (String, oneshot::Receiver<ReceivedUpload>) {
    let (tx, rx) = oneshot::channel();
    let state = ServerState {
        tx: Arc::new(Mutex::new(Some(tx))),
    };
    let app = Router::new()
        .route("/generate", post(handle_generate))
        .route("/history", get(handle_history))
        .with_state(state);
    (serve(app).await, rx)
}

#[tokio::test]
async fn generate_posts_multipart_and_resolves_result_path() {
    let (server_url, upload_rx) = spawn_stain_server().await;
    let client = StainClient::new(format!("{server_url}/")).expect("client");

    let upload = UploadFile::from_bytes("section_12.png", b"png-bytes".to_vec());
    let result = client
        .generate(&upload, Direction::Reverse)
        .await
        .expect("generate");

    assert_eq!(result.as_str(), format!("{server_url}/data/images/he_42.png"));
    let received = upload_rx.await.expect("upload received");
    assert_eq!(received.file_name.as_deref(), Some("section_12.png"));
    assert_eq!(received.content_type.as_deref(), Some("image/png"));
    assert_eq!(received.bytes, b"png-bytes");
    assert_eq!(received.direction.as_deref(), Some("BtoA"));
}

#[tokio::test]
async fn history_keeps_service_order_and_skips_bad_records() {
    let (server_url, _upload_rx) = spawn_stain_server().await;
    let client = StainClient::new(server_url.clone()).expect("client");

    let items = client.history().await.expect("history");
    let ids: Vec<&HistoryId> = items.iter().map(|item| &item.id).collect();
    assert_eq!(ids, vec![&HistoryId::from("2"), &HistoryId::from("1")]);
    assert_eq!(
        items[0].bf_url.as_str(),
        format!("{server_url}/data/images/bf_2.png")
    );

    let again = client.history().await.expect("history");
    assert_eq!(again, items);
}

#[tokio::test]
async fn non_success_status_carries_service_detail() {
    let app = Router::new()
        .route("/generate", post(handle_model_down))
        .route("/history", get(handle_model_down));
    let server_url = serve(app).await;
    let client = StainClient::new(server_url).expect("client");

    let upload = UploadFile::from_bytes("a.png", b"a".to_vec());
    let err = client
        .generate(&upload, Direction::Forward)
        .await
        .expect_err("must fail");
    match err {
        ClientError::Status { status, api } => {
            assert_eq!(status, 500);
            assert_eq!(api.map(|api| api.code), Some(ErrorCode::ModelUnavailable));
        }
        other => panic!("unexpected error {other:?}"),
    }

    assert!(matches!(
        StainService::history(&client).await,
        Err(ClientError::Status { status: 500, .. })
    ));
}

#[tokio::test]
async fn malformed_body_is_a_decode_error() {
    let app = Router::new().route("/history", get(|| async { "not json" }));
    let server_url = serve(app).await;
    let client = StainClient::new(server_url).expect("client");

    assert!(matches!(client.history().await, Err(ClientError::Decode(_))));
}

#[tokio::test]
async fn unreachable_service_is_a_transport_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);

    let client = StainClient::with_timeout(format!("http://{addr}"), Duration::from_secs(2))
        .expect("client");
    assert!(matches!(client.history().await, Err(ClientError::Transport(_))));
}

#[tokio::test]
async fn fetch_result_downloads_image_bytes() {
    let app = Router::new().route("/data/images/he_1.png", get(|| async { "PNGDATA" }));
    let server_url = serve(app).await;
    let client = StainClient::new(server_url.clone()).expect("client");

    let url = Url::parse(&format!("{server_url}/data/images/he_1.png")).expect("url");
    assert_eq!(client.fetch_result(&url).await.expect("fetch"), b"PNGDATA");
}

#[test]
fn rejects_unparseable_base_address() {
    assert!(matches!(
        StainClient::new("not a url"),
        Err(ClientError::InvalidBaseUrl { .. })
    ));
    assert_eq!(
        StainClient::new("").expect("default").api_url(),
        "http://localhost:8000"
    );
}

#[test]
fn settings_select_timeout_policy() {
    let mut settings = ClientSettings::default();
    settings.api_url = "http://stain.internal:9000".into();
    let client = StainClient::from_settings(&settings).expect("client");
    assert_eq!(client.api_url(), "http://stain.internal:9000");

    settings.request_timeout_secs = 0;
    assert!(StainClient::from_settings(&settings).is_ok());
}
