use std::time::Duration;

use pretty_assertions::assert_eq;
use serde_json::json;
use syncwatch_core::{JobStatus, MailboxStatus};
use syncwatch_engine::{
    ActionGateway, ClientSettings, CommandError, FailureKind, HttpClient, StatusSource,
};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> HttpClient {
    HttpClient::new(ClientSettings {
        base_url: format!("{}/api", server.uri()),
        ..ClientSettings::default()
    })
    .expect("client")
}

fn job_body() -> serde_json::Value {
    json!({
        "id": "6f1c",
        "name": "Tenant move",
        "status": "running",
        "progress": 50,
        "total": 2,
        "completed": 1,
        "failed": 0,
        "source": "imap.old.example",
        "target": "imap.new.example",
        "created_at": "2024-05-01 10:00:00",
        "mailboxes": [
            {"id": 1, "user": "a@old", "target_user": "a@new", "status": "success", "msg": null},
            {"id": 2, "user": "b@old", "target_user": "b@new", "status": "running", "msg": "Syncing"}
        ]
    })
}

#[tokio::test]
async fn job_snapshot_is_decoded() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/jobs/6f1c"))
        .respond_with(ResponseTemplate::new(200).set_body_json(job_body()))
        .mount(&server)
        .await;

    let job = client_for(&server).job("6f1c").await.expect("job");
    assert_eq!(job.status, JobStatus::Running);
    assert_eq!(job.mailboxes.len(), 2);
    assert_eq!(job.mailboxes[0].status, MailboxStatus::Success);
    assert_eq!(job.mailboxes[0].msg, None);
    assert_eq!(job.mailboxes[1].msg.as_deref(), Some("Syncing"));
}

#[tokio::test]
async fn missing_job_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/jobs/nope"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"detail": "Job not found"})))
        .mount(&server)
        .await;

    let err = client_for(&server).job("nope").await.unwrap_err();
    assert_eq!(err.kind, FailureKind::NotFound);
}

#[tokio::test]
async fn expired_token_is_unauthorized() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/jobs"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let err = client_for(&server).jobs().await.unwrap_err();
    assert_eq!(err.kind, FailureKind::Unauthorized);
}

#[tokio::test]
async fn bearer_token_is_sent_when_configured() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/mailboxes/2/logs"))
        .and(header("authorization", "Bearer s3cret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"logs": "Host1: login ok\n"})))
        .expect(1)
        .mount(&server)
        .await;

    let client = HttpClient::new(ClientSettings {
        base_url: format!("{}/api", server.uri()),
        access_token: Some("s3cret".to_string()),
        ..ClientSettings::default()
    })
    .unwrap();
    let text = client.mailbox_log(2).await.expect("log");
    assert_eq!(text, "Host1: login ok\n");
}

#[tokio::test]
async fn malformed_body_is_a_decode_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/jobs/6f1c"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>gateway</html>"))
        .mount(&server)
        .await;

    let err = client_for(&server).job("6f1c").await.unwrap_err();
    assert_eq!(err.kind, FailureKind::Decode);
}

#[tokio::test]
async fn slow_server_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/jobs/6f1c"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(job_body())
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&server)
        .await;

    let client = HttpClient::new(ClientSettings {
        base_url: format!("{}/api", server.uri()),
        request_timeout: Duration::from_millis(100),
        ..ClientSettings::default()
    })
    .unwrap();
    let err = client.job("6f1c").await.unwrap_err();
    assert_eq!(err.kind, FailureKind::Timeout);
}

#[tokio::test]
async fn dashboard_survives_stats_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/jobs"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([job_body()])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/stats"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let dashboard = client_for(&server).dashboard().await.expect("dashboard");
    assert_eq!(dashboard.jobs.len(), 1);
    assert_eq!(dashboard.jobs[0].id, "6f1c");
    assert!(dashboard.stats.is_none());
}

#[tokio::test]
async fn rejected_command_carries_server_detail() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/mailboxes/2/retry"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({"detail": "Mailbox is already running"})),
        )
        .mount(&server)
        .await;

    let err = client_for(&server).retry_mailbox(2).await.unwrap_err();
    assert_eq!(
        err,
        CommandError::Rejected {
            status: 400,
            detail: Some("Mailbox is already running".to_string()),
        }
    );
}

#[tokio::test]
async fn accepted_commands_use_expected_routes() {
    let server = MockServer::start().await;
    for (verb, route) in [
        ("POST", "/api/mailboxes/2/stop"),
        ("POST", "/api/jobs/6f1c/cancel"),
        ("DELETE", "/api/jobs"),
    ] {
        Mock::given(method(verb))
            .and(path(route))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"message": "ok"})))
            .expect(1)
            .mount(&server)
            .await;
    }

    let client = client_for(&server);
    client.stop_mailbox(2).await.expect("stop");
    client.cancel_job("6f1c").await.expect("cancel");
    client.delete_all_jobs().await.expect("delete");
}

#[tokio::test]
async fn unreachable_server_is_a_transport_error() {
    let client = HttpClient::new(ClientSettings {
        base_url: "http://127.0.0.1:9/api".to_string(),
        connect_timeout: Duration::from_millis(200),
        ..ClientSettings::default()
    })
    .unwrap();
    let err = client.stop_mailbox(1).await.unwrap_err();
    assert!(matches!(err, CommandError::Transport(_)));
}
