use phishnet_client::ReputationClient;
use phishnet_core::{AnalysisStatus, Lookup, PhishnetError, ReputationService};
use serde_json::json;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const HASH: &str = "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9";

fn client_for(server: &MockServer) -> ReputationClient {
    ReputationClient::builder("test-key")
        .base_url(server.uri())
        .build()
        .unwrap()
}

fn file_report(malicious: u32, harmless: u32) -> serde_json::Value {
    json!({
        "data": {
            "id": HASH,
            "type": "file",
            "attributes": {
                "last_analysis_stats": {
                    "malicious": malicious,
                    "suspicious": 0,
                    "harmless": harmless,
                    "undetected": 0
                }
            }
        }
    })
}

#[tokio::test]
async fn lookup_found_parses_stats() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/files/{HASH}")))
        .and(header("x-apikey", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(file_report(2, 6)))
        .expect(1)
        .mount(&server)
        .await;

    let lookup = client_for(&server).lookup(HASH).await.unwrap();
    match lookup {
        Lookup::Found(report) => {
            assert_eq!(report.sha256, HASH);
            assert_eq!(report.stats.total_engines(), 8);
            assert!((report.malicious_ratio() - 0.25).abs() < f64::EPSILON);
        }
        Lookup::NotFound => panic!("expected a report"),
    }
}

#[tokio::test]
async fn lookup_404_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/files/{HASH}")))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": {"code": "NotFoundError", "message": "File not found"}
        })))
        .mount(&server)
        .await;

    let lookup = client_for(&server).files().lookup(HASH).await.unwrap();
    assert_eq!(lookup, Lookup::NotFound);
}

#[tokio::test]
async fn lookup_other_status_carries_code_and_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/files/{HASH}")))
        .respond_with(ResponseTemplate::new(503).set_body_string("upstream down"))
        .mount(&server)
        .await;

    let err = client_for(&server).lookup(HASH).await.unwrap_err();
    match err {
        PhishnetError::Network { status, body } => {
            assert_eq!(status, 503);
            assert_eq!(body, "upstream down");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn lookup_malformed_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/files/{HASH}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": {"attributes": {}}})))
        .mount(&server)
        .await;

    let err = client_for(&server).lookup(HASH).await.unwrap_err();
    assert!(matches!(err, PhishnetError::MalformedResponse(_)));
    assert!(err.is_network());
}

#[tokio::test]
async fn submit_uploads_multipart_and_returns_job_id() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/files"))
        .and(header("x-apikey", "test-key"))
        .and(body_string_contains("name=\"file\""))
        .and(body_string_contains("filename=\"invoice.pdf\""))
        .and(body_string_contains("%PDF-1.4 fake"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"type": "analysis", "id": "job-42"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let job_id = client_for(&server)
        .submit(b"%PDF-1.4 fake", "invoice.pdf")
        .await
        .unwrap();
    assert_eq!(job_id, "job-42");
}

#[tokio::test]
async fn submit_accepts_202() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/files"))
        .respond_with(ResponseTemplate::new(202).set_body_json(json!({
            "data": {"type": "analysis", "id": "job-7"}
        })))
        .mount(&server)
        .await;

    let job_id = client_for(&server).files().submit(b"x", "a.bin").await.unwrap();
    assert_eq!(job_id, "job-7");
}

#[tokio::test]
async fn submit_rejects_other_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/files"))
        .respond_with(ResponseTemplate::new(413).set_body_string("too large"))
        .mount(&server)
        .await;

    let err = client_for(&server).submit(b"x", "a.bin").await.unwrap_err();
    assert_eq!(err.status_code(), Some(413));
}

#[tokio::test]
async fn submit_without_job_id_is_malformed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/files"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": {}})))
        .mount(&server)
        .await;

    let err = client_for(&server).submit(b"x", "a.bin").await.unwrap_err();
    assert!(matches!(err, PhishnetError::MalformedResponse(_)));
}

#[tokio::test]
async fn poll_status_maps_wire_states() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/analyses/job-queued"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"id": "job-queued", "type": "analysis", "attributes": {"status": "queued"}}
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/analyses/job-done"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"id": "job-done", "type": "analysis", "attributes": {"status": "completed"}}
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);

    let queued = client.poll_status("job-queued").await.unwrap();
    assert_eq!(queued.status, AnalysisStatus::Pending);

    let done = client.analyses().status("job-done").await.unwrap();
    assert_eq!(done.status, AnalysisStatus::Completed);
    assert_eq!(done.raw_report["data"]["id"], "job-done");
}

#[tokio::test]
async fn poll_status_non_200_is_network_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/analyses/job-1"))
        .respond_with(ResponseTemplate::new(401).set_body_string("bad key"))
        .mount(&server)
        .await;

    let err = client_for(&server).poll_status("job-1").await.unwrap_err();
    assert!(matches!(err, PhishnetError::Network { status: 401, .. }));
}

#[tokio::test]
async fn quota_still_allows_first_call() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/files/{HASH}")))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let client = ReputationClient::builder("test-key")
        .base_url(server.uri())
        .requests_per_minute(4)
        .build()
        .unwrap();

    assert_eq!(client.lookup(HASH).await.unwrap(), Lookup::NotFound);
}
