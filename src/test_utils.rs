//! Test utilities for docstream.
//!
//! Provides shared helpers, test data factories, and assertion macros
//! for use across all test modules.
//!
//! # Usage
//!
//! ```rust,ignore
//! use docstream::test_utils::*;
//!
//! let store = make_test_store();
//! let pipeline = make_test_pipeline(&server.uri(), store.clone());
//! let dir = TestDir::new();
//! dir.create_file("config/config.toml", &make_test_config_toml(&server.uri()));
//! ```

use std::fs;
use std::io::{self, Write as IoWrite};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::core::credentials::{CredentialStore, SessionStore};
use crate::core::models::{CredentialPair, Identity};
use crate::core::pipeline::RequestPipeline;
use crate::storage::config::DEFAULT_REFRESH_PATH;

// =============================================================================
// Test Data Factories
// =============================================================================

/// Access token used by [`make_test_pair`].
pub const TEST_ACCESS_TOKEN: &str = "access-1";
/// Refresh token used by [`make_test_pair`].
pub const TEST_REFRESH_TOKEN: &str = "refresh-1";

/// Create a credential pair with well-known token values.
#[must_use]
pub fn make_test_pair() -> CredentialPair {
    CredentialPair::new(TEST_ACCESS_TOKEN, TEST_REFRESH_TOKEN)
}

/// Create a verified identity with credits.
#[must_use]
pub fn make_test_identity() -> Identity {
    Identity {
        id: Some(7),
        email: "ada@example.com".to_string(),
        first_name: "Ada".to_string(),
        last_name: "Lovelace".to_string(),
        credits: Some(42),
        is_verified: true,
    }
}

/// In-memory store holding [`make_test_pair`].
#[must_use]
pub fn make_test_store() -> Arc<SessionStore> {
    Arc::new(SessionStore::with_credentials(make_test_pair()))
}

/// Pipeline against `base_url` with the default refresh path and a short
/// timeout.
///
/// # Panics
///
/// Panics if the HTTP client cannot be built.
#[must_use]
pub fn make_test_pipeline(base_url: &str, store: Arc<SessionStore>) -> RequestPipeline {
    let store: Arc<dyn CredentialStore> = store;
    let client = reqwest::Client::builder()
        .build()
        .expect("Failed to build HTTP client");
    RequestPipeline::new(client, base_url, DEFAULT_REFRESH_PATH, store)
        .with_timeout(Duration::from_secs(5))
}

/// Source text long enough to pass input validation.
#[must_use]
pub fn make_test_source_text() -> String {
    "Streaming formatters turn rough notes into structured documents. "
        .repeat(5)
        .trim_end()
        .to_string()
}

/// Config file content pointing the client at `base_url`.
#[must_use]
pub fn make_test_config_toml(base_url: &str) -> String {
    format!(
        r#"[api]
base_url = "{base_url}"
timeout_seconds = 5
stream_idle_timeout_seconds = 5

[session]
backend = "file"

[format]
default_mode = "paper"
"#
    )
}

// =============================================================================
// Temporary Directory Helpers
// =============================================================================

/// An isolated temporary directory, removed on drop.
///
/// # Examples
///
/// ```rust,ignore
/// use docstream::test_utils::TestDir;
///
/// let dir = TestDir::new();
/// dir.create_file("config/config.toml", "[api]\ntimeout_seconds = 30");
/// assert!(dir.file_exists("config/config.toml"));
/// ```
pub struct TestDir {
    inner: tempfile::TempDir,
}

impl TestDir {
    /// Create a new isolated temporary directory.
    ///
    /// # Panics
    ///
    /// Panics if the temporary directory cannot be created.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: tempfile::tempdir().expect("Failed to create temp directory"),
        }
    }

    /// Get the path to the temporary directory.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.inner.path()
    }

    /// Create a file in the temporary directory with the given content.
    ///
    /// Creates parent directories as needed.
    ///
    /// # Panics
    ///
    /// Panics if the file cannot be created or written.
    pub fn create_file(&self, name: &str, content: &str) {
        let path = self.inner.path().join(name);

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent directories");
        }

        let mut file = fs::File::create(&path).expect("Failed to create test file");
        file.write_all(content.as_bytes())
            .expect("Failed to write test file");
    }

    /// Read a file from the temporary directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read.
    pub fn read_file(&self, name: &str) -> io::Result<String> {
        fs::read_to_string(self.inner.path().join(name))
    }

    /// Check if a file exists in the temporary directory.
    #[must_use]
    pub fn file_exists(&self, name: &str) -> bool {
        self.inner.path().join(name).exists()
    }

    /// Get the full path to a file in the temporary directory.
    #[must_use]
    pub fn file_path(&self, name: &str) -> PathBuf {
        self.inner.path().join(name)
    }
}

impl Default for TestDir {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Assertion Macros
// =============================================================================

/// Assert that a string contains a substring.
#[macro_export]
macro_rules! assert_contains {
    ($haystack:expr, $needle:expr) => {
        let haystack = $haystack;
        let needle = $needle;
        assert!(
            haystack.contains(needle),
            "Expected string to contain {:?}\n\nActual string:\n{:?}",
            needle,
            haystack
        );
    };
}

/// Assert that a string does NOT contain a substring.
#[macro_export]
macro_rules! assert_not_contains {
    ($haystack:expr, $needle:expr) => {
        let haystack = $haystack;
        let needle = $needle;
        assert!(
            !haystack.contains(needle),
            "Expected string NOT to contain {:?}\n\nActual string:\n{:?}",
            needle,
            haystack
        );
    };
}

/// Assert that a string is valid JSON.
#[macro_export]
macro_rules! assert_json_valid {
    ($json:expr) => {
        let json = $json;
        if let Err(e) = serde_json::from_str::<serde_json::Value>(json) {
            panic!(
                "Expected valid JSON, but parsing failed: {}\n\nJSON string:\n{}",
                e, json
            );
        }
    };
}
