//! Configuration loading and resolution.

use std::time::Duration;

use toolwire::config::DEFAULT_REQUEST_TIMEOUT;

pub const DEFAULT_ADDR: &str = "127.0.0.1:8765";
pub const DEFAULT_URL: &str = "ws://127.0.0.1:8765";

pub const ADDR_ENV: &str = "TOOLWIRE_ADDR";
pub const URL_ENV: &str = "TOOLWIRE_URL";

/// Resolve the listen address: explicit flag, then `TOOLWIRE_ADDR`, then the default.
pub fn resolve_addr(explicit: Option<&str>) -> String {
    resolve(explicit, std::env::var(ADDR_ENV).ok(), DEFAULT_ADDR)
}

/// Resolve the server URL a client connects to.
pub fn resolve_url(explicit: Option<&str>) -> String {
    resolve(explicit, std::env::var(URL_ENV).ok(), DEFAULT_URL)
}

pub fn resolve_timeout(timeout_ms: Option<u64>) -> Duration {
    match timeout_ms {
        Some(0) | None => DEFAULT_REQUEST_TIMEOUT,
        Some(ms) => Duration::from_millis(ms),
    }
}

fn resolve(explicit: Option<&str>, env: Option<String>, default: &str) -> String {
    if let Some(value) = explicit {
        return value.to_string();
    }

    match env {
        Some(value) if !value.trim().is_empty() => value,
        _ => default.to_string(),
    }
}
