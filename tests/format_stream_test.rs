//! Integration tests for the streaming formatting client.
//!
//! Covers:
//! - Sanitized increments delivered to the renderer
//! - Multipart fields sent to the endpoint
//! - Input validation happening before any request
//! - Empty bodies and non-2xx responses
//! - Refresh-and-retry on the formatting endpoint

mod common;

use std::sync::Arc;

use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

use docstream::core::credentials::{CredentialStore, SessionStore};
use docstream::core::format::FormatClient;
use docstream::core::models::{CredentialPair, FormattingMode};
use docstream::core::stream::{NullRenderer, WriterRenderer};
use docstream::error::DocstreamError;
use docstream::test_utils::{TestDir, make_test_pipeline, make_test_source_text, make_test_store};
use docstream::{assert_contains, assert_not_contains};

use common::logger::TestLogger;
use common::{bearer, document_body, mount_refresh_ok};

const FORMAT_PATH: &str = "/papers/ai-format/";

fn formatter(server: &MockServer, store: Arc<SessionStore>) -> FormatClient {
    FormatClient::new(make_test_pipeline(&server.uri(), store))
}

#[tokio::test]
async fn streams_sanitized_document() {
    let log = TestLogger::new("streams_sanitized_document");
    log.phase("setup");

    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(FORMAT_PATH))
        .and(bearer("access-1"))
        .respond_with(ResponseTemplate::new(200).set_body_string(document_body()))
        .expect(1)
        .mount(&server)
        .await;

    log.phase("execute");
    let mut increments: Vec<String> = Vec::new();
    let document = formatter(&server, make_test_store())
        .format(FormattingMode::Paper, &make_test_source_text(), &mut increments)
        .await
        .unwrap();

    log.phase("verify");
    assert_eq!(
        document.html,
        "<html><body><h1>Title</h1><p>Body</p></body></html>"
    );
    assert_eq!(increments.concat(), document.html);
    assert_eq!(document.mode, FormattingMode::Paper);
    assert_not_contains!(document.html.as_str(), "think");
    log.finish_ok();
}

#[tokio::test]
async fn sends_mode_and_content_as_multipart() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(FORMAT_PATH))
        .respond_with(|req: &Request| {
            let body = String::from_utf8_lossy(&req.body).into_owned();
            let content_type = req
                .headers
                .get("content-type")
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default()
                .to_string();
            let ok = content_type.starts_with("multipart/form-data")
                && body.contains("name=\"mode\"")
                && body.contains("proposal")
                && body.contains("name=\"input_content\"")
                && body.contains("Streaming formatters");
            if ok {
                ResponseTemplate::new(200).set_body_string("<html>ok</html>")
            } else {
                ResponseTemplate::new(400).set_body_string(body)
            }
        })
        .expect(1)
        .mount(&server)
        .await;

    let document = formatter(&server, make_test_store())
        .format(FormattingMode::Proposal, &make_test_source_text(), &mut NullRenderer)
        .await
        .unwrap();

    assert_eq!(document.html, "<html>ok</html>");
}

#[tokio::test]
async fn short_input_makes_no_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let err = formatter(&server, make_test_store())
        .format(FormattingMode::Report, "too short", &mut NullRenderer)
        .await
        .unwrap_err();

    assert!(matches!(err, DocstreamError::InputTooShort { min: 200, .. }));
}

#[tokio::test]
async fn empty_body_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(FORMAT_PATH))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let err = formatter(&server, make_test_store())
        .format(FormattingMode::Paper, &make_test_source_text(), &mut NullRenderer)
        .await
        .unwrap_err();

    assert!(matches!(err, DocstreamError::EmptyBody { .. }));
}

#[tokio::test]
async fn body_without_marker_yields_empty_document() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(FORMAT_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string("I cannot format this."))
        .mount(&server)
        .await;

    let mut increments: Vec<String> = Vec::new();
    let document = formatter(&server, make_test_store())
        .format(FormattingMode::Paper, &make_test_source_text(), &mut increments)
        .await
        .unwrap();

    assert!(document.is_empty());
    assert!(increments.is_empty());
}

#[tokio::test]
async fn server_error_is_http_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(FORMAT_PATH))
        .respond_with(
            ResponseTemplate::new(402).set_body_json(serde_json::json!({"error": "Not enough credits"})),
        )
        .mount(&server)
        .await;

    let err = formatter(&server, make_test_store())
        .format(FormattingMode::Paper, &make_test_source_text(), &mut NullRenderer)
        .await
        .unwrap_err();

    match err {
        DocstreamError::Http { status, body, .. } => {
            assert_eq!(status, 402);
            assert_contains!(body.as_str(), "Not enough credits");
        }
        other => panic!("expected Http, got {other:?}"),
    }
}

#[tokio::test]
async fn expired_token_is_refreshed_before_streaming() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(FORMAT_PATH))
        .and(bearer("access-1"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(FORMAT_PATH))
        .and(bearer("access-2"))
        .respond_with(ResponseTemplate::new(200).set_body_string(document_body()))
        .expect(1)
        .mount(&server)
        .await;
    mount_refresh_ok(&server, "refresh-1", "access-2", 1).await;

    let store = make_test_store();
    let document = formatter(&server, store.clone())
        .format(FormattingMode::Paper, &make_test_source_text(), &mut NullRenderer)
        .await
        .unwrap();

    assert_contains!(document.html.as_str(), "<h1>Title</h1>");
    assert_eq!(store.get(), Some(CredentialPair::new("access-2", "refresh-1")));
}

#[tokio::test]
async fn writer_renderer_receives_document() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(FORMAT_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string(document_body()))
        .mount(&server)
        .await;

    let mut renderer = WriterRenderer::new(Vec::new());
    let document = formatter(&server, make_test_store())
        .format(FormattingMode::Paper, &make_test_source_text(), &mut renderer)
        .await
        .unwrap();

    let written = String::from_utf8(renderer.into_inner()).unwrap();
    assert_eq!(written.trim_end(), document.html);
    assert!(written.ends_with('\n'));
}

#[tokio::test]
async fn document_saves_under_export_name() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(FORMAT_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string(document_body()))
        .mount(&server)
        .await;

    let document = formatter(&server, Arc::new(SessionStore::in_memory()))
        .format(FormattingMode::Report, &make_test_source_text(), &mut NullRenderer)
        .await
        .unwrap();

    let dir = TestDir::new();
    let saved = document.save_to(&dir.path().join("exports")).unwrap();
    let name = saved.file_name().unwrap().to_string_lossy().into_owned();

    assert!(name.starts_with("formatted_report_"));
    assert!(name.ends_with(".html"));
    assert_eq!(std::fs::read_to_string(&saved).unwrap(), document.html);
    assert_eq!(document.plain_text(), "Title\nBody");
}
