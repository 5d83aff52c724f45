//! Connection Dispatcher
//!
//! Accept loop that starts one independent task per connection.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpStream;
use tracing::{debug, error, info, warn};

use crate::error::ProxyError;
use crate::proxy::listener::{ConnectionPermit, Listener, ListenerError};
use crate::proxy::{handle_connection, Outcome, ProxyState};

/// Pause after the first failed accept, doubled per consecutive failure.
const ACCEPT_BACKOFF_BASE: Duration = Duration::from_millis(10);
const ACCEPT_BACKOFF_MAX: Duration = Duration::from_secs(1);

// == Serve ==
/// Accepts connections until `shutdown` resolves.
///
/// Connection tasks are detached and never joined; they run to completion on
/// their own even after shutdown. Only a closed connection limiter ends the
/// loop early.
pub async fn serve<F>(listener: Listener, state: ProxyState, shutdown: F) -> Result<(), ListenerError>
where
    F: Future<Output = ()>,
{
    let connection_count = Arc::new(AtomicU64::new(0));
    let mut accept_failures = 0u32;
    tokio::pin!(shutdown);

    loop {
        let accepted = tokio::select! {
            _ = &mut shutdown => {
                info!("Shutting down listener");
                return Ok(());
            }
            accepted = listener.accept() => accepted,
        };

        match accepted {
            Ok((stream, peer, permit)) => {
                accept_failures = 0;
                let count = connection_count.fetch_add(1, Ordering::Relaxed);
                info!(connection = count, peer = %peer, "Connection made");
                tokio::spawn(run_connection(stream, peer, count, state.clone(), permit));
            }
            Err(ListenerError::Accept(e)) => {
                accept_failures = accept_failures.saturating_add(1);
                let delay = accept_backoff(accept_failures);
                warn!(error = %e, retry_in_ms = delay.as_millis() as u64, "Accept failed");
                tokio::select! {
                    _ = &mut shutdown => {
                        info!("Shutting down listener");
                        return Ok(());
                    }
                    _ = tokio::time::sleep(delay) => {}
                }
            }
            Err(e) => return Err(e),
        }
    }
}

async fn run_connection(
    stream: TcpStream,
    peer: SocketAddr,
    connection: u64,
    state: ProxyState,
    _permit: ConnectionPermit,
) {
    match handle_connection(stream, &state).await {
        Ok(Outcome::Hit) => debug!(connection, peer = %peer, "Served from cache"),
        Ok(Outcome::Forwarded(f)) => debug!(
            connection,
            peer = %peer,
            body_bytes = f.body_bytes,
            cached = f.cached,
            "Forwarded to origin"
        ),
        Err(ProxyError::Request(e)) => warn!(connection, peer = %peer, "Error parsing request: {}", e),
        Err(e @ ProxyError::UpstreamConnect { .. }) => warn!(connection, peer = %peer, "{}", e),
        Err(e) => error!(connection, peer = %peer, error = %e, "Connection failed"),
    }
}

/// Delay before retrying after `failures` consecutive accept errors.
fn accept_backoff(failures: u32) -> Duration {
    let doublings = failures.saturating_sub(1).min(16);
    ACCEPT_BACKOFF_BASE
        .saturating_mul(1 << doublings)
        .min(ACCEPT_BACKOFF_MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accept_backoff_doubles() {
        assert_eq!(accept_backoff(1), Duration::from_millis(10));
        assert_eq!(accept_backoff(2), Duration::from_millis(20));
        assert_eq!(accept_backoff(4), Duration::from_millis(80));
    }

    #[test]
    fn test_accept_backoff_is_capped() {
        assert_eq!(accept_backoff(8), ACCEPT_BACKOFF_MAX);
        assert_eq!(accept_backoff(u32::MAX), ACCEPT_BACKOFF_MAX);
    }

    #[test]
    fn test_accept_backoff_never_zero() {
        assert!(accept_backoff(0) > Duration::ZERO);
    }
}
