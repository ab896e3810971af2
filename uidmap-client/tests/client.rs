use serde_json::json;
use uidmap_client::ConsoleClient;
use uidmap_core::domain::job::{JobKind, JobStatus};
use uidmap_core::domain::work_item::AddressTagAction;
use uidmap_core::domain::work_item::MappingOperation;
use uidmap_core::dto::mapping::{BulkMappingRequest, SubnetMappingRequest};
use uidmap_core::dto::tag::{IpTagItem, IpTagRequest};
use uuid::Uuid;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn bulk_request(count: usize) -> BulkMappingRequest {
    BulkMappingRequest {
        count,
        user_prefix: "corp\\user".to_string(),
        base_ip: "10.0.0.1".to_string(),
        timeout: 3600,
        operation: Default::default(),
        uia_url: None,
    }
}

#[tokio::test]
async fn bulk_mapping_returns_job_handle() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    let job_id = Uuid::new_v4();
    Mock::given(method("POST"))
        .and(path("/bulk-mapping"))
        .and(body_partial_json(json!({ "count": 25, "operation": "login" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": "Started mapping login job with 25 item(s)",
            "job_id": job_id,
            "kind": "mapping-login",
            "total": 25,
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = ConsoleClient::new(server.uri());
    let submitted = client.bulk_mapping(&bulk_request(25)).await?;

    assert_eq!(submitted.job_id, job_id);
    assert_eq!(submitted.kind, JobKind::MappingLogin);
    assert_eq!(submitted.total, 25);
    Ok(())
}

#[tokio::test]
async fn map_subnet_posts_cidr() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    let job_id = Uuid::new_v4();
    Mock::given(method("POST"))
        .and(path("/map-subnet"))
        .and(body_partial_json(json!({ "subnet": "10.20.0.0/24", "operation": "logout" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": "Started mapping logout job with 254 item(s)",
            "job_id": job_id,
            "kind": "mapping-logout",
            "total": 254,
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = ConsoleClient::new(server.uri());
    let submitted = client
        .map_subnet(&SubnetMappingRequest {
            subnet: "10.20.0.0/24".to_string(),
            user_prefix: "corp\\host".to_string(),
            timeout: 3600,
            operation: MappingOperation::Logout,
            uia_url: None,
        })
        .await?;

    assert_eq!(submitted.job_id, job_id);
    assert_eq!(submitted.kind, JobKind::MappingLogout);
    assert_eq!(submitted.total, 254);
    Ok(())
}

#[tokio::test]
async fn conflict_surfaces_server_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/update-ip-tags"))
        .respond_with(
            ResponseTemplate::new(409)
                .set_body_json(json!({ "error": "job 42 is already running" })),
        )
        .mount(&server)
        .await;

    let client = ConsoleClient::new(server.uri());
    let err = client
        .update_ip_tags(&IpTagRequest {
            items: vec![IpTagItem {
                ip: "10.0.0.1".to_string(),
                tag: "quarantine".to_string(),
            }],
            action: AddressTagAction::Register,
            uia_url: None,
        })
        .await
        .unwrap_err();

    assert!(err.is_conflict());
    assert!(err.to_string().contains("job 42 is already running"));
}

#[tokio::test]
async fn unverified_connection_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/bulk-mapping"))
        .respond_with(ResponseTemplate::new(412).set_body_json(json!({
            "error": "agent connection 127.0.0.1:5006 is not verified; run a connection test first"
        })))
        .mount(&server)
        .await;

    let client = ConsoleClient::new(server.uri());
    let err = client.bulk_mapping(&bulk_request(1)).await.unwrap_err();
    assert!(err.is_unverified());
}

#[tokio::test]
async fn stop_passes_job_id() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    let job_id = Uuid::new_v4();
    Mock::given(method("POST"))
        .and(path("/stop-mapping"))
        .and(query_param("job_id", job_id.to_string()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": "Stop requested; the job halts after its current item"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = ConsoleClient::new(server.uri());
    let ack = client.stop(Some(job_id)).await?;
    assert!(ack.message.starts_with("Stop requested"));
    Ok(())
}

#[tokio::test]
async fn progress_and_job_snapshot() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/progress"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "current": 10, "total": 100, "running": true
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/job"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "job_id": null,
            "kind": null,
            "current": 0,
            "total": 0,
            "status": "idle",
            "created_at": null,
            "completed_at": null,
            "failure": null,
        })))
        .mount(&server)
        .await;

    let client = ConsoleClient::new(server.uri());
    let progress = client.progress().await?;
    assert_eq!((progress.current, progress.total, progress.running), (10, 100, true));

    let snapshot = client.job().await?;
    assert_eq!(snapshot.status, JobStatus::Idle);
    assert!(snapshot.job_id.is_none());
    Ok(())
}

#[tokio::test]
async fn logs_use_limit() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/get-logs"))
        .and(query_param("limit", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "logs": ["12:00:01 [INFO] one", "12:00:02 [SUCCESS] two"]
        })))
        .mount(&server)
        .await;

    let client = ConsoleClient::new(server.uri());
    let logs = client.logs(Some(2)).await?;
    assert_eq!(logs.len(), 2);
    assert!(logs[1].ends_with("[SUCCESS] two"));
    Ok(())
}

#[tokio::test]
async fn failed_probe_is_server_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/test-connection"))
        .and(body_partial_json(json!({ "uia_url": "10.1.1.1:5006", "force": false })))
        .respond_with(ResponseTemplate::new(502).set_body_json(json!({
            "error": "Verification failed: [TCP] port 5006 is not reachable"
        })))
        .mount(&server)
        .await;

    let client = ConsoleClient::new(server.uri());
    let err = client
        .test_connection("10.1.1.1:5006", false)
        .await
        .unwrap_err();
    assert!(err.is_server_error());
    assert!(err.to_string().contains("[TCP]"));
}

#[tokio::test]
async fn plain_text_errors_are_kept() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/status"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let client = ConsoleClient::new(server.uri());
    let err = client.status().await.unwrap_err();
    assert!(err.to_string().contains("boom"));
}
