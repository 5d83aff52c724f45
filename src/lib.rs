//! Caching Proxy - A forwarding HTTP proxy with a shared response cache
//!
//! Forwards `GET http://host[:port]/path` requests to origin servers and
//! keeps small responses in a bounded in-memory cache keyed by host and path.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod proxy;
pub mod tasks;

pub use api::{create_router, AdminState};
pub use cache::SharedCache;
pub use config::Config;
pub use proxy::{Listener, ProxyState};
pub use tasks::spawn_stats_task;
