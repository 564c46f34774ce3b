//! Common helpers for integration tests.
//!
//! # Modules
//!
//! - `log_capture`: capture tracing events for assertions
//! - `logger`: phase-tagged test logging
//!
//! The functions below mount the auth endpoints on a wiremock server, plus a
//! raw TCP server for bodies that break off mid-stream.
#![allow(dead_code)]

pub mod log_capture;
pub mod logger;

use serde_json::json;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const REFRESH_PATH: &str = "/auth/token/refresh/";

/// `Authorization` header matcher for a bearer token.
pub fn bearer(token: &str) -> wiremock::matchers::HeaderExactMatcher {
    header("authorization", format!("Bearer {token}").as_str())
}

/// Refresh endpoint that trades `refresh` for `new_access`, expected `times` times.
pub async fn mount_refresh_ok(server: &MockServer, refresh: &str, new_access: &str, times: u64) {
    Mock::given(method("POST"))
        .and(path(REFRESH_PATH))
        .and(body_json(json!({ "refresh": refresh })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "access": new_access })))
        .expect(times)
        .mount(server)
        .await;
}

/// Refresh endpoint that always answers `status`.
pub async fn mount_refresh_status(server: &MockServer, status: u16, times: u64) {
    Mock::given(method("POST"))
        .and(path(REFRESH_PATH))
        .respond_with(ResponseTemplate::new(status).set_body_json(json!({ "detail": "Token is invalid or expired" })))
        .expect(times)
        .mount(server)
        .await;
}

/// A streamed document body with a reasoning preamble.
#[must_use]
pub fn document_body() -> String {
    "<think>planning the outline</think>Sure! Here it is:\n<html><body><h1>Title</h1><p>Body</p></body></html>"
        .to_string()
}

/// Serve one request with a 200 whose body stops after `prefix`.
///
/// The response announces a longer `Content-Length` than it sends, so the
/// client sees `prefix` and then a read error. Returns the base URL.
pub async fn serve_truncated_once(prefix: &'static str) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        read_request(&mut socket).await;
        let head = format!(
            "HTTP/1.1 200 OK\r\ncontent-type: text/html\r\ncontent-length: {}\r\n\r\n",
            prefix.len() + 4096
        );
        socket.write_all(head.as_bytes()).await.unwrap();
        socket.write_all(prefix.as_bytes()).await.unwrap();
        socket.flush().await.unwrap();
        let _ = socket.shutdown().await;
    });

    format!("http://{addr}")
}

/// Read one full HTTP/1.1 request (headers plus a sized or chunked body).
async fn read_request(socket: &mut tokio::net::TcpStream) {
    let mut buf = Vec::new();
    let mut chunk = [0_u8; 4096];
    loop {
        let n = socket.read(&mut chunk).await.unwrap();
        if n == 0 {
            return;
        }
        buf.extend_from_slice(&chunk[..n]);

        let Some(header_end) = buf.windows(4).position(|w| w == b"\r\n\r\n") else {
            continue;
        };
        let head = String::from_utf8_lossy(&buf[..header_end]).to_ascii_lowercase();
        let body_len = buf.len() - header_end - 4;
        let content_length = head
            .lines()
            .find_map(|line| line.strip_prefix("content-length:"))
            .and_then(|v| v.trim().parse::<usize>().ok());

        let complete = match content_length {
            Some(len) => body_len >= len,
            None if head.contains("transfer-encoding: chunked") => buf.ends_with(b"0\r\n\r\n"),
            None => true,
        };
        if complete {
            return;
        }
    }
}
