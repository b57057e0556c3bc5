use std::time::Duration;

use futures_util::StreamExt;
use imgrab_engine::{FetchSettings, Fetcher, ReqwestFetcher, TransportError};
use pretty_assertions::assert_eq;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn fetcher() -> ReqwestFetcher {
    ReqwestFetcher::new(FetchSettings::default()).expect("client")
}

fn url_of(server: &MockServer, p: &str) -> Url {
    Url::parse(&format!("{}{}", server.uri(), p)).unwrap()
}

#[tokio::test]
async fn page_fetch_returns_text_and_final_url() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/doc"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw("<html>ok</html>", "text/html; charset=utf-8"),
        )
        .mount(&server)
        .await;

    let target = url_of(&server, "/doc");
    let page = fetcher().fetch_page(&target).await.expect("fetch ok");
    assert_eq!(page.text, "<html>ok</html>");
    assert_eq!(page.final_url, target);
}

#[tokio::test]
async fn non_success_status_is_a_transport_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let target = url_of(&server, "/missing");
    let err = fetcher().fetch_page(&target).await.unwrap_err();
    assert_eq!(
        err,
        TransportError::Status {
            url: target,
            status: 404
        }
    );
}

#[tokio::test]
async fn page_fetch_times_out_on_slow_response() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_millis(250))
                .set_body_string("slow"),
        )
        .mount(&server)
        .await;

    let settings = FetchSettings {
        request_timeout: Duration::from_millis(50),
        ..FetchSettings::default()
    };
    let fetcher = ReqwestFetcher::new(settings).expect("client");
    let target = url_of(&server, "/slow");

    let err = fetcher.fetch_page(&target).await.unwrap_err();
    assert_eq!(err, TransportError::Timeout { url: target });
}

#[tokio::test]
async fn oversized_page_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/large"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Content-Type", "text/html")
                .insert_header("Content-Length", "11")
                .set_body_string("01234567890"),
        )
        .mount(&server)
        .await;

    let settings = FetchSettings {
        max_page_bytes: 10,
        ..FetchSettings::default()
    };
    let fetcher = ReqwestFetcher::new(settings).expect("client");
    let target = url_of(&server, "/large");

    let err = fetcher.fetch_page(&target).await.unwrap_err();
    assert_eq!(
        err,
        TransportError::TooLarge {
            url: target,
            max_bytes: 10,
            actual: Some(11)
        }
    );
}

#[tokio::test]
async fn body_stream_delivers_the_whole_payload() {
    let server = MockServer::start().await;
    let payload: Vec<u8> = (0u8..=255).cycle().take(4096).collect();
    Mock::given(method("GET"))
        .and(path("/img"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(payload.clone(), "image/png"))
        .mount(&server)
        .await;

    let mut stream = fetcher()
        .fetch_body(&url_of(&server, "/img"))
        .await
        .expect("stream");
    let mut collected = Vec::new();
    while let Some(chunk) = stream.next().await {
        collected.extend_from_slice(&chunk.expect("chunk"));
    }
    assert_eq!(collected, payload);
}

#[tokio::test]
async fn image_status_failure_surfaces_before_any_stream() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/gone.png"))
        .respond_with(ResponseTemplate::new(410))
        .mount(&server)
        .await;

    let target = url_of(&server, "/gone.png");
    let Err(err) = fetcher().fetch_body(&target).await else {
        panic!("expected status failure");
    };
    assert_eq!(
        err,
        TransportError::Status {
            url: target,
            status: 410
        }
    );
}
