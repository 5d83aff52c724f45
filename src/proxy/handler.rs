//! Connection Handler
//!
//! Runs one request/response cycle: parse, serve from cache, or forward.

use tokio::io::{AsyncRead, AsyncWrite, BufReader};

use crate::cache::SharedCache;
use crate::config::Config;
use crate::error::Result;
use crate::proxy::{forward, read_request, CaptureLimits, Forwarded};

/// State shared by every connection task.
#[derive(Debug, Clone)]
pub struct ProxyState {
    /// Response cache
    pub cache: SharedCache,
    /// Caching bounds for forwarded responses
    pub limits: CaptureLimits,
}

impl ProxyState {
    pub fn new(cache: SharedCache, limits: CaptureLimits) -> Self {
        Self { cache, limits }
    }

    /// Creates an empty cache and limits from configuration.
    pub fn from_config(config: &Config) -> Self {
        Self::new(SharedCache::from_config(config), CaptureLimits::from(config))
    }
}

/// How a connection was answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Served from the cache
    Hit,
    /// Fetched from the origin
    Forwarded(Forwarded),
}

// == Handle Connection ==
/// Handles a single client connection.
///
/// The request line is fully validated before any cache or network work.
/// On error nothing more is written; the stream is closed when it is dropped
/// on return, on every path.
pub async fn handle_connection<S>(stream: S, state: &ProxyState) -> Result<Outcome>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let (reader, mut writer) = tokio::io::split(stream);
    let mut reader = BufReader::new(reader);

    let request = read_request(&mut reader).await?;
    let key = request.cache_key();

    if state.cache.serve(&key, &mut writer).await? {
        return Ok(Outcome::Hit);
    }

    let forwarded = forward(&request, &key, &mut writer, &state.cache, state.limits).await?;
    Ok(Outcome::Forwarded(forwarded))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{CacheEntry, CacheStore};
    use crate::error::{ProxyError, RequestError};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    fn state() -> ProxyState {
        ProxyState::new(
            SharedCache::new(CacheStore::new(1_000, 100)),
            CaptureLimits::default(),
        )
    }

    async fn exchange(state: &ProxyState, raw: &[u8]) -> (Result<Outcome>, Vec<u8>) {
        let (mut client, server) = tokio::io::duplex(64 * 1024);
        client.write_all(raw).await.unwrap();
        let result = handle_connection(server, state).await;
        let mut response = Vec::new();
        client.read_to_end(&mut response).await.unwrap();
        (result, response)
    }

    #[tokio::test]
    async fn test_cached_response_is_served_without_origin() {
        let state = state();
        state
            .cache
            .insert(CacheEntry::new(
                "origin.invalid/page",
                b"HTTP/1.0 200 OK\r\n\r\n".to_vec(),
                b"cached".to_vec(),
            ))
            .await
            .unwrap();

        let (result, response) =
            exchange(&state, b"GET http://origin.invalid/page HTTP/1.0\r\n\r\n").await;

        assert_eq!(result.unwrap(), Outcome::Hit);
        assert_eq!(response, b"HTTP/1.0 200 OK\r\n\r\ncached".to_vec());
    }

    #[tokio::test]
    async fn test_missing_scheme_rejected_before_io() {
        let state = state();
        let (result, response) = exchange(&state, b"GET /foo HTTP/1.0\r\n\r\n").await;

        assert!(matches!(
            result,
            Err(ProxyError::Request(RequestError::UnsupportedScheme(_)))
        ));
        assert!(response.is_empty());
        assert_eq!(state.cache.stats().await.misses, 0);
    }

    #[tokio::test]
    async fn test_non_get_rejected_with_no_response() {
        let state = state();
        let (result, response) =
            exchange(&state, b"POST http://h/ HTTP/1.0\r\n\r\n").await;

        assert!(matches!(
            result,
            Err(ProxyError::Request(RequestError::UnsupportedMethod(_)))
        ));
        assert!(response.is_empty());
    }
}
