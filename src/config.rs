//! Configuration Module
//!
//! Handles loading and managing proxy configuration from environment variables.

use std::env;

use crate::cache::{DEFAULT_MAX_CACHE_SIZE, DEFAULT_MAX_HEADERS_SIZE, DEFAULT_MAX_OBJECT_SIZE};

/// Listening port used when none is given.
pub const DEFAULT_PORT: u16 = 32726;

/// Proxy configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Proxy listening port
    pub port: u16,
    /// Total body bytes the cache may hold
    pub max_cache_size: usize,
    /// Largest response body that is cached
    pub max_object_size: usize,
    /// Largest response header block that is cached
    pub max_headers_size: usize,
    /// Maximum number of connections handled at once
    pub max_connections: usize,
    /// Port for the admin API, disabled when None
    pub admin_port: Option<u16>,
    /// Seconds between stats log lines, 0 disables the reporter
    pub stats_interval: u64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `PROXY_PORT` - Listening port (default: 32726)
    /// - `MAX_CACHE_SIZE` - Cache capacity in body bytes (default: 1049000)
    /// - `MAX_OBJECT_SIZE` - Largest cacheable body (default: 102400)
    /// - `MAX_HEADERS_SIZE` - Largest cacheable header block (default: 50000)
    /// - `MAX_CONNECTIONS` - Concurrent connection bound (default: 1024)
    /// - `ADMIN_PORT` - Admin API port (default: disabled)
    /// - `STATS_INTERVAL` - Stats reporting frequency in seconds (default: 60)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            port: parse_var("PROXY_PORT").unwrap_or(defaults.port),
            max_cache_size: parse_var("MAX_CACHE_SIZE").unwrap_or(defaults.max_cache_size),
            max_object_size: parse_var("MAX_OBJECT_SIZE").unwrap_or(defaults.max_object_size),
            max_headers_size: parse_var("MAX_HEADERS_SIZE").unwrap_or(defaults.max_headers_size),
            max_connections: parse_var("MAX_CONNECTIONS").unwrap_or(defaults.max_connections),
            admin_port: parse_var("ADMIN_PORT"),
            stats_interval: parse_var("STATS_INTERVAL").unwrap_or(defaults.stats_interval),
        }
    }

    /// Checks that the limits are consistent with each other.
    pub fn validate(&self) -> Result<(), String> {
        if self.max_object_size > self.max_cache_size {
            return Err(format!(
                "MAX_OBJECT_SIZE ({}) must not exceed MAX_CACHE_SIZE ({})",
                self.max_object_size, self.max_cache_size
            ));
        }
        if self.max_connections == 0 {
            return Err("MAX_CONNECTIONS must be at least 1".to_string());
        }
        Ok(())
    }
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.parse().ok())
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            max_cache_size: DEFAULT_MAX_CACHE_SIZE,
            max_object_size: DEFAULT_MAX_OBJECT_SIZE,
            max_headers_size: DEFAULT_MAX_HEADERS_SIZE,
            max_connections: 1024,
            admin_port: None,
            stats_interval: 60,
        }
    }
}
