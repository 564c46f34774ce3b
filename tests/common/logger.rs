//! Phase-tagged test logging.
#![allow(dead_code)]
//!
//! Lines go to stderr, so they only show for failing tests or with
//! `--nocapture`. Set `TEST_LOG_JSON=1` for one JSON object per line.
//!
//! ```rust,ignore
//! let log = TestLogger::new("refresh_then_retry");
//! log.phase("setup");
//! log.http_request("POST", &url);
//! log.finish_ok();
//! ```

use std::cell::RefCell;
use std::time::Instant;

use chrono::Utc;
use serde_json::json;

use super::log_capture::TestLogCapture;

pub struct TestLogger {
    test_name: String,
    started: Instant,
    phase: RefCell<String>,
    json: bool,
}

impl TestLogger {
    #[must_use]
    pub fn new(test_name: &str) -> Self {
        let json = std::env::var("TEST_LOG_JSON").is_ok_and(|v| v == "1" || v == "true");
        let logger = Self {
            test_name: test_name.to_string(),
            started: Instant::now(),
            phase: RefCell::new("init".to_string()),
            json,
        };
        logger.emit("INFO", "test started");
        logger
    }

    /// Logger plus a capture of everything traced on this thread.
    #[must_use]
    pub fn with_capture(test_name: &str) -> (Self, TestLogCapture) {
        let capture = TestLogCapture::start();
        (Self::new(test_name), capture)
    }

    pub fn phase(&self, phase: &str) {
        *self.phase.borrow_mut() = phase.to_string();
        self.emit("DEBUG", &format!("phase: {phase}"));
    }

    pub fn info(&self, message: &str) {
        self.emit("INFO", message);
    }

    pub fn http_request(&self, method: &str, url: &str) {
        self.emit("DEBUG", &format!("{method} {url}"));
    }

    pub fn finish_ok(&self) {
        self.emit("INFO", &format!("passed in {}ms", self.elapsed_ms()));
    }

    #[must_use]
    pub fn elapsed_ms(&self) -> u64 {
        u64::try_from(self.started.elapsed().as_millis()).unwrap_or(u64::MAX)
    }

    fn emit(&self, level: &str, message: &str) {
        let phase = self.phase.borrow();
        if self.json {
            let line = json!({
                "ts": Utc::now().to_rfc3339(),
                "level": level,
                "test": self.test_name,
                "phase": *phase,
                "message": message,
            });
            eprintln!("{line}");
        } else {
            eprintln!("[{level:5}] {} [{}] {message}", self.test_name, *phase);
        }
    }
}
