// Each provider sits behind its own feature so builds can trim the set.

#[cfg(feature = "urban")]
pub mod urban;
#[cfg(feature = "youdao")]
pub mod youdao;

/// User agent sent by the HTTP-backed providers.
#[cfg(any(feature = "urban", feature = "youdao"))]
pub(crate) const USER_AGENT: &str = concat!("glossa/", env!("CARGO_PKG_VERSION"));

#[cfg(any(feature = "urban", feature = "youdao"))]
pub(crate) const REQUEST_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(20);

/// Shared client setup for the HTTP-backed providers.
#[cfg(any(feature = "urban", feature = "youdao"))]
pub(crate) fn http_client(
    timeout: std::time::Duration,
) -> Result<reqwest::Client, crate::error::ProviderError> {
    reqwest::Client::builder()
        .connect_timeout(std::time::Duration::from_secs(5))
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()
        .map_err(crate::error::ProviderError::HttpRequest)
}
