//! Upstream Forwarding
//!
//! Sends a normalized HTTP/1.0 request to the origin and streams the
//! response back to the client while capturing a bounded copy for the cache.

use tokio::io::{AsyncBufRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tracing::{debug, warn};

use crate::cache::{CacheEntry, SharedCache};
use crate::config::Config;
use crate::error::{ProxyError, Result};
use crate::proxy::request::read_line;
use crate::proxy::ProxyRequest;

/// Size of each body read from the origin.
pub const RELAY_CHUNK_SIZE: usize = 10_000;

pub const USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64; rv:10.0.3) Gecko/20120305 Firefox/10.0.3";
pub const ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";
pub const ACCEPT_ENCODING: &str = "gzip, deflate";

// == Capture Limits ==
/// Caps on how much of a response is buffered for caching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureLimits {
    /// Largest status line + header block kept
    pub max_headers_size: usize,
    /// Largest body kept
    pub max_object_size: usize,
}

impl From<&Config> for CaptureLimits {
    fn from(config: &Config) -> Self {
        Self {
            max_headers_size: config.max_headers_size,
            max_object_size: config.max_object_size,
        }
    }
}

impl Default for CaptureLimits {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

/// Copy of relayed bytes that gives up once it would exceed its limit.
#[derive(Debug)]
struct CaptureBuffer {
    data: Option<Vec<u8>>,
    limit: usize,
}

impl CaptureBuffer {
    fn new(limit: usize) -> Self {
        Self {
            data: Some(Vec::new()),
            limit,
        }
    }

    fn push(&mut self, bytes: &[u8]) {
        if let Some(data) = &mut self.data {
            if data.len() + bytes.len() > self.limit {
                self.data = None;
            } else {
                data.extend_from_slice(bytes);
            }
        }
    }

    fn invalidate(&mut self) {
        self.data = None;
    }

    fn into_inner(self) -> Option<Vec<u8>> {
        self.data
    }
}

// == Relayed ==
/// What was sent to the client, plus the captured copy if it stayed in bounds.
#[derive(Debug, Default)]
pub struct Relayed {
    /// Status line and header bytes relayed
    pub header_bytes: usize,
    /// Body bytes relayed
    pub body_bytes: usize,
    /// Captured header block, None if it outgrew its limit or was incomplete
    pub headers: Option<Vec<u8>>,
    /// Captured body, None if it outgrew its limit
    pub body: Option<Vec<u8>>,
}

impl Relayed {
    /// Builds a cache entry when both captures are intact and the body is non-empty.
    pub fn into_entry(self, key: &str) -> Option<CacheEntry> {
        match (self.headers, self.body) {
            (Some(headers), Some(body)) if !body.is_empty() => {
                Some(CacheEntry::new(key, headers, body))
            }
            _ => None,
        }
    }
}

// == Forwarded ==
/// Summary of one forwarded exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Forwarded {
    pub header_bytes: usize,
    pub body_bytes: usize,
    /// Whether the response was stored in the cache
    pub cached: bool,
}

// == Build Request ==
/// Renders the request sent upstream.
///
/// Only the path and host come from the client; every header is fixed.
pub fn build_request(request: &ProxyRequest) -> String {
    format!(
        "GET {path} HTTP/1.0\r\n\
         Host: {host}\r\n\
         User-Agent: {USER_AGENT}\r\n\
         Accept: {ACCEPT}\r\n\
         Accept-Encoding: {ACCEPT_ENCODING}\r\n\
         Connection: close\r\n\
         Proxy-Connection: close\r\n\
         \r\n",
        path = request.path,
        host = request.host,
    )
}

// == Relay Response ==
/// Streams an origin response to the client line by line, then chunk by chunk.
///
/// Every byte read is written to the client before the next read, whether or
/// not it still fits in the capture buffers. Header lines are read at most
/// `MAX_LINE` bytes at a time; a longer line is relayed in pieces and makes
/// the response uncacheable.
pub async fn relay_response<R, W>(
    origin: &mut R,
    client: &mut W,
    limits: CaptureLimits,
) -> std::io::Result<Relayed>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut relayed = Relayed::default();
    let mut headers = CaptureBuffer::new(limits.max_headers_size);
    let mut line = Vec::new();
    let mut headers_complete = false;
    let mut at_line_start = true;

    loop {
        line.clear();
        let n = read_line(origin, &mut line).await?;
        if n == 0 {
            break;
        }
        client.write_all(&line).await?;
        relayed.header_bytes += n;

        let line_ended = line.ends_with(b"\n");
        if line_ended {
            headers.push(&line);
        } else {
            headers.invalidate();
        }
        if at_line_start && (line == b"\r\n" || line == b"\n") {
            headers_complete = true;
            break;
        }
        at_line_start = line_ended;
    }
    if !headers_complete {
        headers.invalidate();
    }

    let mut body = CaptureBuffer::new(limits.max_object_size);
    let mut chunk = vec![0u8; RELAY_CHUNK_SIZE];
    loop {
        let n = origin.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        client.write_all(&chunk[..n]).await?;
        body.push(&chunk[..n]);
        relayed.body_bytes += n;
    }
    client.flush().await?;

    relayed.headers = headers.into_inner();
    relayed.body = body.into_inner();
    Ok(relayed)
}

// == Forward ==
/// Fetches `request` from its origin, relays the response, and caches it under `key`.
///
/// Nothing is written to the client if the origin cannot be reached. The
/// upstream connection is closed on return.
pub async fn forward<W>(
    request: &ProxyRequest,
    key: &str,
    client: &mut W,
    cache: &SharedCache,
    limits: CaptureLimits,
) -> Result<Forwarded>
where
    W: AsyncWrite + Unpin,
{
    let mut upstream = TcpStream::connect((request.host.as_str(), request.port))
        .await
        .map_err(|source| ProxyError::UpstreamConnect {
            host: request.host.clone(),
            port: request.port,
            source,
        })?;

    upstream.write_all(build_request(request).as_bytes()).await?;

    let mut origin = BufReader::new(upstream);
    let relayed = relay_response(&mut origin, client, limits).await?;
    let mut forwarded = Forwarded {
        header_bytes: relayed.header_bytes,
        body_bytes: relayed.body_bytes,
        cached: false,
    };
    debug!(
        key,
        header_bytes = forwarded.header_bytes,
        body_bytes = forwarded.body_bytes,
        "Relayed origin response"
    );

    match relayed.into_entry(key) {
        Some(entry) => match cache.insert(entry).await {
            Ok(_) => forwarded.cached = true,
            Err(e) => warn!(key, error = %e, "Response not cached"),
        },
        None => debug!(key, "Response not cacheable"),
    }

    Ok(forwarded)
}
