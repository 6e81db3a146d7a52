use livevod::{HttpClient, HttpMetadataProvider, LivevodError, MetadataProvider, SessionConfig};
use wiremock::{
    matchers::{header, method, path},
    Mock, MockServer, ResponseTemplate,
};

use crate::METADATA;

const METADATA_PATH: &str = "/recording-started-latest.json";

async fn setup_mock_server(response: ResponseTemplate, expected_requests: u64) -> MockServer {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(METADATA_PATH))
        .respond_with(response)
        .expect(expected_requests)
        .mount(&mock_server)
        .await;

    mock_server
}

fn provider(server: &MockServer, retry: u32) -> HttpMetadataProvider {
    let config = SessionConfig {
        distribution_domain: server.uri(),
        retry,
        retry_backoff_ms: 10,
        ..Default::default()
    };
    let client = HttpClient::new(reqwest::Client::builder()).unwrap();
    HttpMetadataProvider::from_config(client, &config).unwrap()
}

#[tokio::test]
async fn test_fetch_metadata() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(METADATA_PATH))
        .and(header("content-type", "application/json"))
        .and(header(
            "user-agent",
            concat!("livevod/", env!("CARGO_PKG_VERSION")),
        ))
        .respond_with(ResponseTemplate::new(200).set_body_string(METADATA))
        .expect(1)
        .mount(&server)
        .await;

    let metadata = provider(&server, 0).fetch().await?;
    assert!(metadata.is_channel_live);
    assert_eq!(metadata.playlist_duration, 600);
    assert_eq!(
        metadata.vod_url(&server.uri())?.as_str(),
        format!("{}/recording/master.m3u8", server.uri())
    );

    Ok(())
}

#[tokio::test]
async fn test_http_error_is_network_failure() {
    let server = setup_mock_server(ResponseTemplate::new(404), 1).await;

    let error = provider(&server, 0).fetch().await.unwrap_err();
    assert!(error.is_network_failure());
    assert!(matches!(error, LivevodError::HttpError(status) if status == 404));
}

#[tokio::test]
async fn test_malformed_payload_is_not_retried() {
    let server = setup_mock_server(
        ResponseTemplate::new(200).set_body_string("{\"isChannelLive\": tru"),
        1,
    )
    .await;

    let error = provider(&server, 3).fetch().await.unwrap_err();
    assert!(error.is_decode_failure());
    match error {
        LivevodError::DecodeError { body, .. } => assert_eq!(body, "{\"isChannelLive\": tru"),
        e => panic!("unexpected error: {e}"),
    }
}

#[tokio::test]
async fn test_transient_failures_are_retried() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(METADATA_PATH))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(METADATA_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string(METADATA))
        .expect(1)
        .mount(&server)
        .await;

    let metadata = provider(&server, 3).fetch().await?;
    assert_eq!(metadata.master_key, "recording/master.m3u8");

    Ok(())
}

#[tokio::test]
async fn test_retries_exhausted() {
    let server = setup_mock_server(ResponseTemplate::new(503), 3).await;

    let error = provider(&server, 2).fetch().await.unwrap_err();
    assert!(matches!(error, LivevodError::HttpError(status) if status == 503));
}
