//! End-to-end tests against a fake Element endpoint served over HTTP.

use assert_matches::assert_matches;
use axum::extract::State;
use axum::http::{header::AUTHORIZATION, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use element_reconciler::{
    AccountFields, ClientConfig, ElementClient, Error, Reconcilers, Resource, ResourceData,
    VolumeFields,
};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

const USERNAME: &str = "admin";
const PASSWORD: &str = "solidfire";

// =============================================================================
// Fake Cluster
// =============================================================================

#[derive(Default)]
struct FakeCluster {
    methods: Mutex<Vec<String>>,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

impl FakeCluster {
    fn methods(&self) -> Vec<String> {
        self.methods.lock().unwrap().clone()
    }
}

fn reply(result: Value) -> Response {
    Json(json!({"id": 1, "result": result})).into_response()
}

fn api_error(name: &str, message: &str) -> Response {
    Json(json!({"id": 1, "error": {"code": 500, "name": name, "message": message}}))
        .into_response()
}

async fn element(
    State(cluster): State<Arc<FakeCluster>>,
    headers: HeaderMap,
    Json(request): Json<Value>,
) -> Response {
    let expected = element_reconciler::rpc::basic_auth_header(USERNAME, PASSWORD);
    let authorized = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map_or(false, |v| v == expected);
    if !authorized {
        return (StatusCode::UNAUTHORIZED, "<html>401 Unauthorized</html>").into_response();
    }

    let method = request["method"].as_str().unwrap_or_default().to_string();
    let params = request["params"].clone();
    cluster.methods.lock().unwrap().push(method.clone());

    match method.as_str() {
        "GetAccountByID" => match params["accountID"].as_i64() {
            Some(7) => reply(json!({"account": {
                "accountID": 7,
                "username": "tenant-a",
                "status": "active",
                "volumes": [42]
            }})),
            _ => api_error("xUnknownAccount", "Account not found"),
        },
        "AddAccount" => reply(json!({"accountID": 7})),
        "ListVolumes" => reply(json!({"volumes": []})),
        "DeleteVolume" => reply(json!({})),
        "PurgeDeletedVolume" => api_error("xVolumeBusy", "Volume is busy"),
        "GetClusterInfo" => reply(json!({"clusterInfo": {"name": "lab"}})),
        "Broken" => (StatusCode::OK, "this is not json").into_response(),
        "Empty" => Json(json!({"id": 1})).into_response(),
        "Slow" => {
            let now = cluster.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            cluster.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(50)).await;
            cluster.in_flight.fetch_sub(1, Ordering::SeqCst);
            reply(json!({}))
        }
        other => api_error("xUnknownAPIMethod", &format!("Unknown method {}", other)),
    }
}

async fn start() -> (SocketAddr, Arc<FakeCluster>) {
    let cluster = Arc::new(FakeCluster::default());
    let app = Router::new()
        .route("/json-rpc/1.0", post(element))
        .with_state(cluster.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (addr, cluster)
}

fn connect(addr: SocketAddr, password: &str, max_concurrency: Option<usize>) -> ElementClient {
    ElementClient::builder(ClientConfig {
        host: format!("http://{}", addr),
        username: USERNAME.into(),
        password: password.into(),
        max_concurrency,
        ..Default::default()
    })
    .build()
    .unwrap()
}

// =============================================================================
// Tests
// =============================================================================

#[tokio::test]
async fn test_raw_call_round_trip() {
    let (addr, cluster) = start().await;
    let client = connect(addr, PASSWORD, None);

    let result = client
        .call_api_method::<Value>("GetClusterInfo", None)
        .await
        .unwrap();

    assert_eq!(result["clusterInfo"]["name"], "lab");
    assert_eq!(cluster.methods(), vec!["GetClusterInfo"]);
    assert_eq!(client.metrics().successes, 1);
}

#[tokio::test]
async fn test_bad_credentials_are_unauthenticated() {
    let (addr, cluster) = start().await;
    let client = connect(addr, "wrong", None);

    let err = client
        .call_api_method::<Value>("GetClusterInfo", None)
        .await
        .unwrap_err();

    assert_matches!(err.root(), Error::Unauthenticated);
    assert!(cluster.methods().is_empty());
}

/// Read one HTTP request off the socket: headers plus `Content-Length` bytes
async fn read_request(socket: &mut tokio::net::TcpStream) {
    use tokio::io::AsyncReadExt;

    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        let n = socket.read(&mut chunk).await.unwrap();
        if n == 0 {
            return;
        }
        buf.extend_from_slice(&chunk[..n]);

        let text = String::from_utf8_lossy(&buf);
        if let Some(end) = text.find("\r\n\r\n") {
            let length = text[..end]
                .lines()
                .filter_map(|line| line.split_once(':'))
                .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
                .and_then(|(_, value)| value.trim().parse::<usize>().ok())
                .unwrap_or(0);
            if buf.len() >= end + 4 + length {
                return;
            }
        }
    }
}

#[tokio::test]
async fn test_unauthorized_with_truncated_body() {
    use tokio::io::AsyncWriteExt;

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        read_request(&mut socket).await;
        socket
            .write_all(b"HTTP/1.1 401 Unauthorized\r\nContent-Length: 100\r\n\r\nshort")
            .await
            .unwrap();
        socket.shutdown().await.unwrap();
    });

    let client = connect(addr, PASSWORD, None);
    let err = client
        .call_api_method::<Value>("GetClusterInfo", None)
        .await
        .unwrap_err();

    assert_matches!(err.root(), Error::Unauthenticated);
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn test_malformed_envelopes() {
    let (addr, _cluster) = start().await;
    let client = connect(addr, PASSWORD, None);

    let err = client.call_api_method::<Value>("Broken", None).await.unwrap_err();
    assert_matches!(err.root(), Error::Decode(_));

    let err = client.call_api_method::<Value>("Empty", None).await.unwrap_err();
    assert_matches!(err.root(), Error::NoResult);

    let err = client.call_api_method::<Value>("Frobnicate", None).await.unwrap_err();
    assert_eq!(err.api_error().unwrap().name, "xUnknownAPIMethod");
    assert!(!err.is_not_found());
}

#[tokio::test]
async fn test_unreachable_endpoint_is_http_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = connect(addr, PASSWORD, None);
    let err = client
        .call_api_method::<Value>("GetClusterInfo", None)
        .await
        .unwrap_err();

    assert_matches!(err.root(), Error::Http(_));
    assert!(err.is_transient());
    assert_eq!(client.in_flight(), 0);
}

#[tokio::test]
async fn test_concurrency_bound_over_http() {
    let (addr, cluster) = start().await;
    let client = connect(addr, PASSWORD, Some(2));

    let calls = (0..6).map(|_| {
        let client = client.clone();
        async move { client.call_api_method::<Value>("Slow", None).await }
    });
    let results = futures::future::join_all(calls).await;

    assert!(results.iter().all(|r| r.is_ok()));
    assert!(cluster.peak.load(Ordering::SeqCst) <= 2);
    assert_eq!(client.metrics().peak_in_flight, 2);
    assert_eq!(client.in_flight(), 0);
}

#[tokio::test]
async fn test_account_lifecycle() {
    let (addr, cluster) = start().await;
    let reconcilers = Reconcilers::new(connect(addr, PASSWORD, None));

    let mut account = ResourceData::new(AccountFields {
        username: Some("tenant-a".into()),
        initiator_secret: Some("ini-secret-123".into()),
        ..Default::default()
    });
    reconcilers.accounts.create(&mut account).await.unwrap();
    assert_eq!(account.id(), Some("7"));
    assert_eq!(account.fields.status.as_deref(), Some("active"));
    assert!(reconcilers.accounts.exists(&mut account).await.unwrap());

    let mut stale = ResourceData::with_id("8", AccountFields::default());
    assert!(!reconcilers.accounts.exists(&mut stale).await.unwrap());
    assert_eq!(stale.id(), None);

    assert_eq!(
        cluster.methods(),
        vec!["AddAccount", "GetAccountByID", "GetAccountByID", "GetAccountByID"]
    );
}

#[tokio::test]
async fn test_volume_read_and_purge_failure() {
    let (addr, cluster) = start().await;
    let reconcilers = Reconcilers::new(connect(addr, PASSWORD, None));

    let mut volume = ResourceData::with_id("42", VolumeFields::default());
    let err = reconcilers.volumes.read(&mut volume).await.unwrap_err();
    assert_matches!(err.root(), Error::UnexpectedCount { count: 0, .. });

    let mut volume = ResourceData::with_id("9", VolumeFields::default());
    let err = reconcilers.volumes.delete(&mut volume).await.unwrap_err();
    assert_eq!(err.api_error().unwrap().name, "xVolumeBusy");
    assert_eq!(volume.id(), Some("9"));

    assert_eq!(
        cluster.methods(),
        vec!["ListVolumes", "DeleteVolume", "PurgeDeletedVolume"]
    );
}
