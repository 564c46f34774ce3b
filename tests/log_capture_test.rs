//! Tests for the log capture infrastructure.

use tracing::{error, info, warn};

mod common;
use common::log_capture::TestLogCapture;
use common::logger::TestLogger;

#[test]
fn test_log_capture_basic() {
    let capture = TestLogCapture::start();

    info!("Session store opened");
    warn!("Stream ended without a document marker");

    capture.assert_logged("Session store opened");
    capture.assert_logged_at_level(tracing::Level::INFO, "store opened");
    capture.assert_logged_at_level(tracing::Level::WARN, "document marker");
}

#[test]
fn test_log_capture_structured() {
    let capture = TestLogCapture::start();

    info!(target_path = "/auth/profile/", status = 401, "Response received");

    capture.assert_field_logged("target_path", "/auth/profile/");
    capture.assert_field_logged("status", "401");
}

#[test]
#[should_panic(expected = "Secret leaked")]
fn test_log_capture_detects_secrets() {
    let capture = TestLogCapture::start();

    info!(token = "abc123", "Oops");
    capture.assert_never_logged("abc123");
}

#[test]
#[should_panic(expected = "Unexpected errors")]
fn test_log_capture_errors() {
    let capture = TestLogCapture::start();

    info!("Everything is fine");
    capture.assert_no_errors();

    error!("Something went wrong");
    capture.assert_no_errors();
}

#[test]
fn test_logger_with_capture_integration() {
    let (log, capture) = TestLogger::with_capture("test_logger_with_capture_integration");

    log.phase("execute");
    info!("Integration test log");

    capture.assert_logged("Integration test log");
    log.finish_ok();
}
