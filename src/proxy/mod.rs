//! Proxy Module
//!
//! The request pipeline: accept, parse, serve from cache or forward.
//!
//! # Flow
//! - `server` accepts connections and spawns a task per connection
//! - `request` validates the request line
//! - `handler` looks the key up in the cache
//! - `forward` fetches misses from the origin and caches the result

pub mod forward;
pub mod handler;
pub mod listener;
pub mod request;
pub mod server;

pub use forward::{build_request, forward, relay_response, CaptureLimits, Forwarded, Relayed};
pub use handler::{handle_connection, Outcome, ProxyState};
pub use listener::{ConnectionPermit, Listener, ListenerError};
pub use request::{read_request, ProxyRequest, DEFAULT_HTTP_PORT, MAX_LINE};
pub use server::serve;
