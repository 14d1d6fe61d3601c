use std::net::TcpListener;
use std::time::Duration;

use pretty_assertions::assert_eq;
use reqwest::header::{HeaderName, HeaderValue};
use reqwest::{Method, Request, Url};
use serde_json::json;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use typed_fetch::{
    typed_fetch, ConfigError, FetchError, Fetcher, FetcherBuilder, QueryResult, RequestInit, Todo,
};
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// A local URL nothing is listening on.
fn closed_port_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind ephemeral port");
    let port = listener.local_addr().expect("local addr").port();
    drop(listener);
    format!("http://127.0.0.1:{port}/todos/1")
}

async fn server_with(route: &str, response: ResponseTemplate) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(response)
        .mount(&server)
        .await;
    server
}

#[tokio::test]
async fn ok_response_decodes_into_success() {
    let server = server_with(
        "/todos/1",
        ResponseTemplate::new(200).set_body_json(json!({
            "id": 1,
            "title": "todo title",
            "completed": false
        })),
    )
    .await;

    let result = Fetcher::new()
        .fetch::<Todo>(format!("{}/todos/1", server.uri()), None)
        .await;

    match result {
        QueryResult::Success { result } => {
            assert_eq!(result.title, "todo title");
            assert_eq!(result.id, 1);
            assert!(!result.completed);
        }
        QueryResult::Error { error } => panic!("expected success, got {error}"),
    }
}

#[tokio::test]
async fn failed_status_becomes_status_error_without_decoding() {
    // The body is not JSON; decoding it would produce a Decode error instead.
    let server = server_with(
        "/todos/1",
        ResponseTemplate::new(501).set_body_string("<html>internal server error</html>"),
    )
    .await;
    let url = format!("{}/todos/1", server.uri());

    let result = Fetcher::new().fetch::<Todo>(url.as_str(), None).await;

    match result {
        QueryResult::Error {
            error:
                FetchError::Status {
                    code,
                    status_text,
                    url: reported,
                },
        } => {
            assert_eq!(code, 501);
            // wiremock sends the standard phrase for the code.
            assert_eq!(status_text, "Not Implemented");
            assert_eq!(reported, url);
        }
        other => panic!("expected status error, got {other:?}"),
    }
}

/// Serve one request with a fixed raw HTTP/1.1 response and return its URL.
async fn raw_server(response: &'static str) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral port");
    let addr = listener.local_addr().expect("local addr");

    tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.expect("accept");
        let mut request: Vec<u8> = Vec::new();
        let mut buf = [0u8; 1024];
        while !request.windows(4).any(|w| w == b"\r\n\r\n") {
            let n = stream.read(&mut buf).await.expect("read request");
            if n == 0 {
                break;
            }
            request.extend_from_slice(&buf[..n]);
        }
        stream
            .write_all(response.as_bytes())
            .await
            .expect("write response");
        stream.shutdown().await.ok();
    });

    format!("http://{addr}/todos/1")
}

#[tokio::test]
async fn status_text_is_the_reason_phrase_the_server_sent() {
    let url = raw_server(
        "HTTP/1.1 501 internal server error\r\n\
         content-length: 2\r\n\
         connection: close\r\n\
         \r\n\
         {}",
    )
    .await;

    let result = Fetcher::new().fetch::<Todo>(url.as_str(), None).await;

    match result {
        QueryResult::Error {
            error:
                FetchError::Status {
                    code,
                    status_text,
                    url: reported,
                },
        } => {
            assert_eq!(code, 501);
            assert_eq!(status_text, "internal server error");
            assert_eq!(reported, url);
        }
        other => panic!("expected status error, got {other:?}"),
    }
}

#[tokio::test]
async fn not_found_reports_code_and_kind() {
    let server = server_with("/todos/404", ResponseTemplate::new(404)).await;

    let result = Fetcher::new()
        .fetch::<Todo>(format!("{}/todos/404", server.uri()), None)
        .await;

    let error = result.err().expect("expected an error");
    assert_eq!(error.kind(), "status-error");
    assert_eq!(error.status_code(), Some(404));
}

#[tokio::test]
async fn refused_connection_becomes_network_error() {
    let url = closed_port_url();

    let result = Fetcher::new().fetch::<Todo>(url.as_str(), None).await;

    match result {
        QueryResult::Error {
            error: FetchError::Network { source, url: reported },
        } => {
            assert!(source.is_connect(), "unexpected transport error: {source}");
            assert_eq!(reported, url);
        }
        other => panic!("expected network error, got {other:?}"),
    }
}

#[tokio::test]
async fn unparseable_url_becomes_network_error_with_literal_url() {
    let result = Fetcher::new().fetch::<Todo>("not a url", None).await;

    let error = result.err().expect("expected an error");
    assert!(error.is_network());
    assert_eq!(error.url(), "not a url");
}

#[tokio::test]
async fn malformed_body_becomes_decode_error() {
    let server = server_with(
        "/todos/1",
        ResponseTemplate::new(200).set_body_string("{\"id\": 1, \"title\": "),
    )
    .await;
    let url = format!("{}/todos/1", server.uri());

    let result = Fetcher::new().fetch::<Todo>(url.as_str(), None).await;

    let error = result.err().expect("expected an error");
    assert!(error.is_decode());
    assert_eq!(error.kind(), "decode-error");
    assert_eq!(error.url(), url);
}

#[tokio::test]
async fn wrong_shape_becomes_decode_error() {
    let server = server_with(
        "/todos/1",
        ResponseTemplate::new(200).set_body_json(json!({ "unexpected": true })),
    )
    .await;

    let result = Fetcher::new()
        .fetch::<Todo>(format!("{}/todos/1", server.uri()), None)
        .await;

    assert!(result.err().is_some_and(FetchError::is_decode));
}

#[tokio::test]
async fn structured_request_reports_its_url() {
    let server = server_with("/todos/9", ResponseTemplate::new(500)).await;
    let url = Url::parse(&format!("{}/todos/9", server.uri())).unwrap();

    let result = Fetcher::new()
        .fetch::<Todo>(Request::new(Method::GET, url.clone()), None)
        .await;

    let error = result.err().expect("expected an error");
    assert_eq!(error.url(), url.as_str());
    assert_eq!(error.status_code(), Some(500));
}

#[tokio::test]
async fn request_init_is_passed_through() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/todos"))
        .and(header("x-request-id", "abc-123"))
        .and(header("content-type", "application/json"))
        .and(body_json(json!({ "title": "buy milk", "completed": false })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": 201,
            "userId": 1,
            "title": "buy milk",
            "completed": false
        })))
        .expect(1)
        .mount(&server)
        .await;

    let init = RequestInit::new()
        .method(Method::POST)
        .header(
            HeaderName::from_static("x-request-id"),
            HeaderValue::from_static("abc-123"),
        )
        .json(&json!({ "title": "buy milk", "completed": false }))
        .expect("serialize body");

    let result = Fetcher::new()
        .fetch::<Todo>(format!("{}/todos", server.uri()), Some(init))
        .await;

    let todo = result.into_result().expect("created todo");
    assert_eq!(todo.id, 201);
    assert_eq!(todo.user_id, Some(1));
}

#[tokio::test]
async fn per_request_timeout_becomes_network_error() {
    let server = server_with(
        "/todos/1",
        ResponseTemplate::new(200)
            .set_delay(Duration::from_secs(2))
            .set_body_json(json!({ "id": 1, "title": "late", "completed": false })),
    )
    .await;

    let init = RequestInit::new().timeout(Duration::from_millis(50));
    let result = Fetcher::new()
        .fetch::<Todo>(format!("{}/todos/1", server.uri()), Some(init))
        .await;

    match result {
        QueryResult::Error {
            error: FetchError::Network { source, .. },
        } => assert!(source.is_timeout()),
        other => panic!("expected timeout, got {other:?}"),
    }
}

#[tokio::test]
async fn builder_headers_reach_the_server() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/todos/1"))
        .and(header("user-agent", "typed-fetch-tests"))
        .and(header("x-api-version", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 1,
            "title": "todo title",
            "completed": true
        })))
        .expect(1)
        .mount(&server)
        .await;

    let fetcher = FetcherBuilder::new()
        .user_agent("typed-fetch-tests")
        .default_header(
            HeaderName::from_static("x-api-version"),
            HeaderValue::from_static("2"),
        )
        .build()
        .expect("build fetcher");

    let result = fetcher
        .fetch::<Todo>(format!("{}/todos/1", server.uri()), None)
        .await;
    assert!(result.is_success());
}

#[test]
fn builder_rejects_invalid_user_agent() {
    let err = FetcherBuilder::new()
        .user_agent("bad\nagent")
        .build()
        .unwrap_err();
    assert!(matches!(err, ConfigError::InvalidHeader { name: "user-agent", .. }));
}

#[tokio::test]
async fn free_function_and_concurrent_calls_are_independent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/todos/1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 1,
            "title": "first",
            "completed": false
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/todos/2"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let (first, second) = tokio::join!(
        typed_fetch::<Todo>(format!("{}/todos/1", server.uri()), None),
        typed_fetch::<Todo>(format!("{}/todos/2", server.uri()), None),
    );

    assert_eq!(first.result().map(|t| t.title.as_str()), Some("first"));
    assert_eq!(second.err().and_then(FetchError::status_code), Some(503));
}
