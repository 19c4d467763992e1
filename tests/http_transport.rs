mod common;

use std::net::{SocketAddr, TcpListener as StdTcpListener};
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::post,
    Json, Router,
};
use common::{small_params, Aggregator};
use fhesrv::transport::{
    ErrorResponse, EvalRequest, EvalResponse, HttpTransport, TimestampRange, Transport,
    UploadRequest, UploadResponse, TOKEN_HEADER,
};
use fhesrv::{Error, KeyStore, ProtocolClient};

const TOKEN: &str = "test-token";

struct AppState {
    server: Aggregator,
    token: String,
}

type HandlerError = (StatusCode, Json<ErrorResponse>);

fn reject(status: StatusCode, error: impl Into<String>) -> HandlerError {
    (
        status,
        Json(ErrorResponse {
            error: error.into(),
        }),
    )
}

fn check_token(state: &AppState, headers: &HeaderMap) -> Result<(), HandlerError> {
    match headers.get(TOKEN_HEADER).and_then(|v| v.to_str().ok()) {
        Some(token) if token == state.token => Ok(()),
        _ => Err(reject(StatusCode::UNAUTHORIZED, "invalid token")),
    }
}

async fn handle_upload(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<UploadRequest>,
) -> Result<Json<UploadResponse>, HandlerError> {
    check_token(&state, &headers)?;
    let bytes = hex::decode(&body.file).map_err(|e| reject(StatusCode::BAD_REQUEST, e.to_string()))?;
    let message = state
        .server
        .store(&bytes)
        .map_err(|e| reject(StatusCode::BAD_REQUEST, format!("Upload failed: {}", e)))?;
    Ok(Json(UploadResponse { message }))
}

async fn handle_eval(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<EvalRequest>,
) -> Result<Json<EvalResponse>, HandlerError> {
    check_token(&state, &headers)?;
    let query = hex::decode(&body.request).map_err(|e| reject(StatusCode::BAD_REQUEST, e.to_string()))?;
    let range = TimestampRange::new(body.from_timestamp, body.to_timestamp)
        .map_err(|e| reject(StatusCode::BAD_REQUEST, e.to_string()))?;
    let reply = state
        .server
        .evaluate(&query, range)
        .map_err(|e| reject(StatusCode::BAD_REQUEST, format!("Evaluation failed: {}", e)))?;
    Ok(Json(EvalResponse {
        message: reply.message,
        response: hex::encode(reply.result),
    }))
}

/// Serve the aggregator on its own runtime thread; returns the base URL
fn spawn_server() -> String {
    let state = Arc::new(AppState {
        server: Aggregator::new(),
        token: TOKEN.to_string(),
    });
    let app = Router::new()
        .route("/upload", post(handle_upload))
        .route("/eval", post(handle_eval))
        .with_state(state);

    let listener = StdTcpListener::bind("127.0.0.1:0").expect("bind should succeed");
    listener.set_nonblocking(true).expect("nonblocking");
    let addr: SocketAddr = listener.local_addr().expect("local addr");

    std::thread::spawn(move || {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()
            .expect("runtime");
        runtime.block_on(async move {
            let listener = tokio::net::TcpListener::from_std(listener).expect("listener");
            axum::serve(listener, app).await.expect("server should run");
        });
    });

    format!("http://{}", addr)
}

#[test]
fn http_write_and_evaluate() {
    let base_url = spawn_server();
    let dir = tempfile::tempdir().unwrap();
    let params = small_params();

    let transport = HttpTransport::new(&base_url, TOKEN).unwrap();
    let client = ProtocolClient::new(transport, KeyStore::in_dir(dir.path()));
    client.generate_keys(&params).unwrap();

    let rows = vec![vec![1u64, 2, 3], vec![4, 0, 6]];
    assert_eq!(client.write_many(&params, &rows).unwrap(), 2);

    let sums = client.evaluate(&params, 0, 2).unwrap();
    assert_eq!(&sums[..3], &[5, 2, 9]);
    assert!(sums[3..].iter().all(|&v| v == 0));
}

#[test]
fn http_wrong_token_is_server_error() {
    let base_url = spawn_server();
    let transport = HttpTransport::new(&base_url, "not-the-token").unwrap();

    match transport.upload(b"anything") {
        Err(Error::Server { status, message }) => {
            assert_eq!(status, 401);
            assert_eq!(message, "invalid token");
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn http_rejected_envelope_is_server_error() {
    let base_url = spawn_server();
    let transport = HttpTransport::new(&base_url, TOKEN).unwrap();

    match transport.upload(b"not an envelope") {
        Err(Error::Server { status, message }) => {
            assert_eq!(status, 400);
            assert!(message.starts_with("Upload failed"), "{message}");
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn http_evaluate_times_out_against_silent_endpoint() {
    // Accepts connections (via the backlog) but never answers.
    let silent = StdTcpListener::bind("127.0.0.1:0").unwrap();
    let base_url = format!("http://{}", silent.local_addr().unwrap());

    let dir = tempfile::tempdir().unwrap();
    let params = small_params();
    let deadline = Duration::from_millis(300);
    let transport = HttpTransport::with_deadline(&base_url, TOKEN, deadline).unwrap();
    let client = ProtocolClient::new(transport, KeyStore::in_dir(dir.path()));
    client.generate_keys(&params).unwrap();

    let start = Instant::now();
    let err = client.evaluate(&params, 0, 10).unwrap_err();
    let elapsed = start.elapsed();

    assert!(matches!(err, Error::Timeout(d) if d == deadline), "got {err:?}");
    assert!(err.is_transient());
    assert!(elapsed < deadline + Duration::from_secs(5), "took {elapsed:?}");
    drop(silent);
}
