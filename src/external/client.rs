use std::sync::LazyLock;
use std::time::Duration;

/// Shared HTTP client for task runners and settlement providers
///
/// Built lazily on first use so every outbound request reuses one
/// connection pool. Individual requests may still override the timeout.
pub static HTTP_CLIENT: LazyLock<reqwest::Client> = LazyLock::new(|| {
    reqwest::Client::builder()
        // Timeouts
        .timeout(Duration::from_secs(30))
        .connect_timeout(Duration::from_secs(10))
        // Connection pooling
        .pool_max_idle_per_host(10)
        .pool_idle_timeout(Duration::from_secs(90))
        // HTTP/2 settings
        .http2_adaptive_window(true)
        .http2_keep_alive_interval(Duration::from_secs(10))
        .http2_keep_alive_timeout(Duration::from_secs(20))
        // Enable compression (gzip, deflate, brotli, zstd)
        .gzip(true)
        .deflate(true)
        .brotli(true)
        .zstd(true)
        .use_rustls_tls()
        .user_agent(user_agent())
        .build()
        .expect("Failed to build HTTP client")
});

fn user_agent() -> String {
    format!("oracle-rs/{}", crate::pkg_version())
}
