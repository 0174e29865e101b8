// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Shared scaffolding for the integration suite.

#[cfg(feature = "logging")]
pub fn init_test_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[cfg(not(feature = "logging"))]
pub fn init_test_logging() {}

/// Poll `check` until it returns `true` or `timeout` elapses. The worker
/// pool delivers asynchronously, so every end-to-end test needs to wait
/// rather than assert immediately after `process_data`.
pub fn wait_until<F: Fn() -> bool>(timeout: std::time::Duration, check: F) -> bool {
    let deadline = std::time::Instant::now() + timeout;
    loop {
        if check() {
            return true;
        }
        if std::time::Instant::now() >= deadline {
            return false;
        }
        std::thread::sleep(std::time::Duration::from_millis(5));
    }
}
