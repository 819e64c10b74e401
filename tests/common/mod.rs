//! Helpers shared by the integration tests.

#![allow(dead_code)]

use std::fs;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing_subscriber::EnvFilter;

/// Setup logging of events reported by domain-hosts and the test suite.
///
/// Use the RUST_LOG environment variable to override the defaults.
///
/// E.g. To enable debug level logging:
///   RUST_LOG=DEBUG
///
/// Or to show only what the watcher is doing:
///   RUST_LOG=domain_hosts::watch=TRACE
pub fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_thread_ids(true)
        .without_time()
        .try_init()
        .ok();
}

/// Returns the path of a file in the test-data/hosts directory.
pub fn test_data(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("test-data")
        .join("hosts")
        .join(name)
}

/// Writes a hosts file, replacing its previous content.
pub fn write_hosts(path: &Path, content: &str) {
    fs::write(path, content).unwrap();
}

/// Waits until `check` returns true, giving up after `timeout`.
///
/// Returns whether the condition was met.
pub async fn wait_for<F>(timeout: Duration, mut check: F) -> bool
where
    F: FnMut() -> bool,
{
    let res = tokio::time::timeout(timeout, async {
        while !check() {
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await;
    res.is_ok()
}

/// Runs a future with a generous timeout so a broken watcher fails the
/// test instead of hanging it.
pub async fn with_timeout<F: Future>(fut: F) -> F::Output {
    tokio::time::timeout(Duration::from_secs(10), fut)
        .await
        .expect("timed out")
}
