//! Request Line Parsing
//!
//! Turns `GET http://host[:port]/path HTTP/x.y` into a validated target.

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt};

use crate::error::{ProxyError, RequestError};

/// Longest request or header line accepted from a client.
pub const MAX_LINE: usize = 8192;

/// Port used when the target names none.
pub const DEFAULT_HTTP_PORT: u16 = 80;

const SCHEME: &str = "http://";
const VERSION_PREFIX: &str = "HTTP/";

// == Proxy Request ==
/// A validated forwarding target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyRequest {
    /// Host name without scheme or port
    pub host: String,
    /// Origin port, 80 unless given
    pub port: u16,
    /// Path from the first `/` after the host, inclusive
    pub path: String,
}

impl ProxyRequest {
    // == Parse ==
    /// Validates a request line.
    ///
    /// Checks run in a fixed order and the first failure wins: token count,
    /// version prefix, method, scheme, path, host, port.
    pub fn parse(line: &str) -> Result<Self, RequestError> {
        let mut tokens = line.split_whitespace();
        let (method, target) = match (tokens.next(), tokens.next()) {
            (Some(method), Some(target)) => (method, target),
            _ => return Err(RequestError::TooFewTokens),
        };
        let version = tokens.next().unwrap_or_default();

        if !version.starts_with(VERSION_PREFIX) {
            return Err(RequestError::InvalidVersion(version.to_string()));
        }
        if !method.eq_ignore_ascii_case("GET") {
            return Err(RequestError::UnsupportedMethod(method.to_string()));
        }
        let rest = target
            .strip_prefix(SCHEME)
            .ok_or_else(|| RequestError::UnsupportedScheme(target.to_string()))?;
        let slash = rest
            .find('/')
            .ok_or_else(|| RequestError::MissingPath(target.to_string()))?;
        let (authority, path) = rest.split_at(slash);

        let (host, port) = match authority.split_once(':') {
            Some((host, port)) => {
                let port = port
                    .parse::<u16>()
                    .map_err(|_| RequestError::InvalidPort(port.to_string()))?;
                (host, port)
            }
            None => (authority, DEFAULT_HTTP_PORT),
        };
        if host.is_empty() {
            return Err(RequestError::MissingHost(target.to_string()));
        }

        Ok(Self {
            host: host.to_string(),
            port,
            path: path.to_string(),
        })
    }

    // == Cache Key ==
    /// Host immediately followed by path.
    ///
    /// Lookup and insertion must both derive their key from here.
    pub fn cache_key(&self) -> String {
        format!("{}{}", self.host, self.path)
    }
}

// == Read Request ==
/// Reads and validates the request line, then drains the client's headers.
///
/// Client headers are never forwarded; they are consumed up to the blank line
/// so the connection is left clean for the response.
pub async fn read_request<R>(reader: &mut R) -> Result<ProxyRequest, ProxyError>
where
    R: AsyncBufRead + Unpin,
{
    let mut line = Vec::new();
    let n = read_line(reader, &mut line).await?;
    if n == 0 {
        return Err(RequestError::Empty.into());
    }
    if !line.ends_with(b"\n") && n >= MAX_LINE {
        return Err(RequestError::Malformed.into());
    }
    let text = std::str::from_utf8(&line).map_err(|_| RequestError::Malformed)?;
    let request = ProxyRequest::parse(text)?;

    loop {
        line.clear();
        let n = read_line(reader, &mut line).await?;
        if n == 0 || line == b"\r\n" || line == b"\n" {
            break;
        }
    }

    Ok(request)
}

/// Reads up to and including the next `\n`, at most `MAX_LINE` bytes.
pub(crate) async fn read_line<R>(reader: &mut R, buf: &mut Vec<u8>) -> std::io::Result<usize>
where
    R: AsyncBufRead + Unpin,
{
    reader.take(MAX_LINE as u64).read_until(b'\n', buf).await
}
