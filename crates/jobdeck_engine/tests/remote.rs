use std::time::Duration;

use jobdeck_core::JobId;
use jobdeck_engine::{FailureKind, FetchSettings, RemoteActions, ReqwestRemote};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn fetches_and_decodes_snapshot() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/job-actions"))
        .and(header("authorization", "Bearer secret"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            r#"{"favorites":[3,"x-7"],"archived":[2],"hidden":[],"version":12}"#,
            "application/json",
        ))
        .expect(1)
        .mount(&server)
        .await;

    let remote = ReqwestRemote::new(
        format!("{}/api/job-actions", server.uri()),
        FetchSettings::default(),
    )
    .with_bearer_token("secret");

    let snapshot = remote.fetch_snapshot().await.expect("fetch ok");
    assert!(snapshot.favorites.contains(&JobId::from(3)));
    assert!(snapshot.favorites.contains(&JobId::from("x-7")));
    assert!(snapshot.archived.contains(&JobId::from(2)));
    assert!(snapshot.hidden.is_empty());
    assert_eq!(snapshot.version, 12);
}

#[tokio::test]
async fn http_error_status_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/job-actions"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let remote = ReqwestRemote::new(
        format!("{}/api/job-actions", server.uri()),
        FetchSettings::default(),
    );
    let err = remote.fetch_snapshot().await.unwrap_err();
    assert_eq!(err.kind, FailureKind::HttpStatus(503));
}

#[tokio::test]
async fn slow_server_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_millis(250))
                .set_body_string("{}"),
        )
        .mount(&server)
        .await;

    let settings = FetchSettings {
        request_timeout: Duration::from_millis(50),
        ..FetchSettings::default()
    };
    let remote = ReqwestRemote::new(server.uri(), settings);
    let err = remote.fetch_snapshot().await.unwrap_err();
    assert_eq!(err.kind, FailureKind::Timeout);
}

#[tokio::test]
async fn oversized_snapshot_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Content-Type", "application/json")
                .set_body_string(r#"{"favorites":[1,2,3,4,5,6,7,8,9]}"#),
        )
        .mount(&server)
        .await;

    let settings = FetchSettings {
        max_bytes: 10,
        ..FetchSettings::default()
    };
    let remote = ReqwestRemote::new(server.uri(), settings);
    let err = remote.fetch_snapshot().await.unwrap_err();
    assert!(matches!(
        err.kind,
        FailureKind::TooLarge { max_bytes: 10, .. }
    ));
}

#[tokio::test]
async fn malformed_body_is_a_decode_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>login</html>"))
        .mount(&server)
        .await;

    let remote = ReqwestRemote::new(server.uri(), FetchSettings::default());
    let err = remote.fetch_snapshot().await.unwrap_err();
    assert_eq!(err.kind, FailureKind::Decode);
}

#[tokio::test]
async fn invalid_endpoint_is_rejected_before_sending() {
    let remote = ReqwestRemote::new("not a url", FetchSettings::default());
    let err = remote.fetch_snapshot().await.unwrap_err();
    assert_eq!(err.kind, FailureKind::InvalidUrl);
}
