//! Shared fixtures for integration tests.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use tempfile::TempDir;

/// Install the logging subscriber once; later calls are ignored.
pub fn init_logging() {
    let _ = config_store::observability::logging::init_logging("config_store=debug");
}

/// Write `content` to `name` inside a fresh temporary directory.
///
/// Keep the returned `TempDir` alive for as long as the file is needed.
pub fn write_fixture(name: &str, content: &str) -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    (dir, path)
}

/// Replace the file's content and push its modification time forward so the
/// change is visible even on filesystems with coarse timestamps.
#[allow(dead_code)]
pub fn rewrite(path: &Path, content: &str, bump: Duration) {
    fs::write(path, content).unwrap();
    touch(path, bump);
}

/// Set the file's modification time to `now + bump`.
#[allow(dead_code)]
pub fn touch(path: &Path, bump: Duration) {
    let file = fs::File::options().write(true).open(path).unwrap();
    file.set_modified(SystemTime::now() + bump).unwrap();
}

/// Poll `condition` every 20ms until it holds or `timeout` passes.
#[allow(dead_code)]
pub async fn wait_for<F: FnMut() -> bool>(timeout: Duration, mut condition: F) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    condition()
}
