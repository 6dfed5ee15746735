use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use reqwest::StatusCode;
use serde_json::json;

use vitalscan_bridge::BridgeConfig;
use vitalscan_broker::{BrokerClient, BrokerError, BrokerState, QueueMessage};
use vitalscan_jobs::{InMemoryJobStore, JobStore, SimulatorConfig};

/// Broker that is always down; every submission takes the fallback path.
struct DownBroker;

impl BrokerClient for DownBroker {
    fn publish(&self, _message: &QueueMessage) -> Result<(), BrokerError> {
        Err(BrokerError::unavailable("connection refused"))
    }

    fn state(&self) -> BrokerState {
        BrokerState::Disconnected
    }
}

struct TestServer {
    base_url: String,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    /// Same router as prod, but with an in-memory store, a dead broker, a
    /// fast simulator, and no registration helper on disk.
    async fn spawn() -> Self {
        let store: Arc<dyn JobStore> = Arc::new(InMemoryJobStore::new());
        let services = Arc::new(vitalscan_api::app::services::assemble(
            store,
            Arc::new(DownBroker),
            SimulatorConfig {
                delay: Duration::from_millis(100),
            },
            BridgeConfig {
                command: PathBuf::from("/nonexistent/registration-helper"),
                timeout: Duration::from_secs(1),
            },
        ));

        let app = vitalscan_api::app::build_app(services);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { base_url, handle }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn poll_until_terminal(
    client: &reqwest::Client,
    base_url: &str,
    job_id: &str,
) -> serde_json::Value {
    // Submission is async by contract; poll until the simulator lands the
    // terminal record.
    for _ in 0..100 {
        let res = client
            .get(format!("{}/api/analysis/jobs/{}", base_url, job_id))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);

        let body: serde_json::Value = res.json().await.unwrap();
        if body["status"] != "Processing" {
            return body;
        }

        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    panic!("job never reached a terminal status");
}

#[tokio::test]
async fn submission_is_accepted_and_completes_via_fallback() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client
        .post(format!("{}/api/analysis", srv.base_url))
        .json(&json!({"kind": "signal-analysis", "payload": {"samplingRate": 500}}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::ACCEPTED);

    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["status"], "Processing");
    let job_id = body["jobId"].as_str().unwrap().to_string();
    assert_eq!(
        body["checkStatusUrl"],
        format!("/api/analysis/jobs/{job_id}")
    );

    let terminal = poll_until_terminal(&client, &srv.base_url, &job_id).await;
    assert_eq!(terminal["status"], "Completed");
    assert_eq!(terminal["simulated"], true);
    assert!(terminal["result"]["heartRateBpm"].is_number());
    assert!(terminal["completedAt"].is_string());
}

#[tokio::test]
async fn unknown_job_id_reads_as_processing() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client
        .get(format!(
            "{}/api/analysis/jobs/{}",
            srv.base_url,
            uuid::Uuid::now_v7()
        ))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["status"], "Processing");
    assert!(body.get("result").is_none());
}

#[tokio::test]
async fn malformed_job_id_is_rejected() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client
        .get(format!("{}/api/analysis/jobs/not-a-uuid", srv.base_url))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "invalid_job_id");
}

#[tokio::test]
async fn registration_degrades_to_simulated_result() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client
        .post(format!("{}/api/registration", srv.base_url))
        .json(&json!({"image": "uploads/chest-001.png", "modality": "xray"}))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["status"], "success");
    assert_eq!(body["simulated"], true);
    assert!(body["registration_metrics"]["mace_mm"].is_number());
}

#[tokio::test]
async fn registration_without_image_is_rejected() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client
        .post(format!("{}/api/registration", srv.base_url))
        .json(&json!({"modality": "xray"}))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "invalid_request");
}

#[tokio::test]
async fn health_reports_broker_state() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client
        .get(format!("{}/health", srv.base_url))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["broker"], "disconnected");
}
