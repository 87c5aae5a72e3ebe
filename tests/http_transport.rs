//! HTTP transport tests against a mock management server

use std::sync::Arc;

use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use mpack_wizard::provision::{HttpTransport, ProvisionTarget, ProvisioningOrchestrator, Transport};
use mpack_wizard::repos::MpackRecord;
use mpack_wizard::types::{FailureKind, ProvisionState};
use mpack_wizard::wizard::steps::DownloadMpacksStep;
use mpack_wizard::wizard::{WizardContent, WizardStep};
use mpack_wizard::WizardConfig;

fn transport(server: &MockServer) -> Arc<HttpTransport> {
    let config = WizardConfig {
        base_url: server.uri(),
        verify_delay_ms: 1,
        ..WizardConfig::default()
    };
    Arc::new(HttpTransport::new(&config).unwrap())
}

fn record(name: &str, url: &str) -> MpackRecord {
    MpackRecord {
        name: name.to_string(),
        display_name: name.to_string(),
        version: "1.0.0".to_string(),
        public_url: url.to_string(),
        download_url: url.to_string(),
        operating_systems: Vec::new(),
    }
}

async fn mount_download(server: &MockServer, name: &str, response: ResponseTemplate) {
    Mock::given(method("POST"))
        .and(path("/api/v1/mpacks"))
        .and(body_json(json!({
            "MpackInfo": {
                "mpack_name": name,
                "mpack_uri": format!("http://repo.example.com/{name}.tar.gz"),
            }
        })))
        .respond_with(response)
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_download_sends_mpack_info() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/mpacks"))
        .and(header("X-Requested-By", "ambari"))
        .and(body_json(json!({
            "MpackInfo": {
                "mpack_name": "CORE",
                "mpack_uri": "http://repo.example.com/CORE.tar.gz",
            }
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"MpackInfo": {"mpack_id": 2}})))
        .expect(1)
        .mount(&server)
        .await;

    let resource = transport(&server)
        .download_mpack("CORE", "http://repo.example.com/CORE.tar.gz")
        .await
        .unwrap();
    assert_eq!(resource.resource_id.as_deref(), Some("2"));
}

#[tokio::test]
async fn test_download_with_empty_body() {
    let server = MockServer::start().await;
    mount_download(&server, "ODS", ResponseTemplate::new(201)).await;

    let resource = transport(&server)
        .download_mpack("ODS", "http://repo.example.com/ODS.tar.gz")
        .await
        .unwrap();
    assert_eq!(resource.resource_id, None);
}

#[tokio::test]
async fn test_error_status_is_reported() {
    let server = MockServer::start().await;
    mount_download(&server, "CORE", ResponseTemplate::new(400)).await;

    let err = transport(&server)
        .download_mpack("CORE", "http://repo.example.com/CORE.tar.gz")
        .await
        .unwrap_err();
    assert_eq!(err.status, Some(400));
    assert_eq!(err.status_text, "Bad Request");
}

#[tokio::test]
async fn test_unreachable_server_has_no_status() {
    let config = WizardConfig {
        base_url: "http://127.0.0.1:1".to_string(),
        http_timeout_secs: 5,
        ..WizardConfig::default()
    };
    let transport = HttpTransport::new(&config).unwrap();

    let err = transport
        .download_mpack("CORE", "http://repo.example.com/CORE.tar.gz")
        .await
        .unwrap_err();
    assert_eq!(err.status, None);
}

#[tokio::test]
async fn test_orchestrator_over_http() {
    let server = MockServer::start().await;
    mount_download(&server, "CORE", ResponseTemplate::new(201)).await;
    mount_download(&server, "ODS", ResponseTemplate::new(409)).await;
    mount_download(&server, "HDF", ResponseTemplate::new(500)).await;

    let mut orchestrator = ProvisioningOrchestrator::new(transport(&server));
    let targets = ["CORE", "ODS", "HDF"].map(|name| {
        (
            name.to_string(),
            ProvisionTarget::DownloadMpack {
                name: name.to_string(),
                url: format!("http://repo.example.com/{name}.tar.gz"),
            },
        )
    });
    orchestrator.launch(targets).unwrap();
    orchestrator.settle_all().await;

    assert_eq!(orchestrator.get("CORE").unwrap().state, ProvisionState::Succeeded);
    // Already registered on the server
    assert_eq!(orchestrator.get("ODS").unwrap().state, ProvisionState::Succeeded);

    let failed = orchestrator.get("HDF").unwrap();
    assert_eq!(failed.state, ProvisionState::Failed);
    let failure = failed.failure.as_ref().unwrap();
    assert_eq!(failure.kind, FailureKind::ServerError);
    assert_eq!(failure.message, "Internal Server Error");
    assert!(!orchestrator.can_advance());
}

#[tokio::test]
async fn test_download_step_retry_after_server_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/mpacks"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v1/mpacks"))
        .respond_with(ResponseTemplate::new(201))
        .mount(&server)
        .await;

    let content = WizardContent {
        selected_mpacks: vec![record("CORE", "http://repo.example.com/CORE.tar.gz")],
        ..Default::default()
    };
    let mut step = DownloadMpacksStep::new(transport(&server));
    step.load(&content).unwrap();
    step.settle_all().await;
    assert!(!step.can_advance());
    assert_eq!(step.items()[0].id, "CORE1.0.0");
    assert_eq!(step.items()[0].state, ProvisionState::Failed);

    step.retry("CORE1.0.0").unwrap();
    step.settle_all().await;
    assert_eq!(step.items()[0].state, ProvisionState::Succeeded);
    assert_eq!(step.items()[0].generation, 2);
    assert!(step.can_advance());
}
