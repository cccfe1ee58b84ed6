//! Shared HTTP Client Module
//!
//! One lazily built blocking client for every Graph and token request, so
//! connections and TLS sessions are reused across a long tree walk.

use once_cell::sync::Lazy;
use reqwest::blocking::Client;
use std::time::Duration;

/// Time allowed to establish a connection
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Whole-request limit. The blocking client counts body transfer against it,
/// so any fixed value caps the size of file that can be downloaded.
pub const REQUEST_TIMEOUT: Option<Duration> = None;

/// Global HTTP client for Graph API and token calls
///
/// - 30s connect timeout, no limit on the transfer itself
/// - 90s idle timeout for pooled connections
pub static GRAPH_CLIENT: Lazy<Client> = Lazy::new(|| {
    Client::builder()
        .connect_timeout(CONNECT_TIMEOUT)
        .timeout(REQUEST_TIMEOUT)
        .pool_max_idle_per_host(8)
        .pool_idle_timeout(Duration::from_secs(90))
        .tcp_keepalive(Duration::from_secs(60))
        .user_agent(concat!("sharepoint-loader/", env!("CARGO_PKG_VERSION")))
        .build()
        .expect("Failed to create Graph HTTP client")
});

/// Get the global Graph HTTP client
#[inline]
pub fn graph_client() -> &'static Client {
    &GRAPH_CLIENT
}
