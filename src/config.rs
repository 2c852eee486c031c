//! Server configuration
//!
//! Defaults, overridden by `CHAT_*` environment variables. The binary
//! additionally accepts the bind address as its first argument.

use std::env;

use crate::error::AppError;

/// Default server address
pub const DEFAULT_ADDR: &str = "127.0.0.1:8080";

/// Maximum number of broadcast messages kept per room
pub const DEFAULT_HISTORY_LIMIT: usize = 100;

/// Maximum number of private messages kept per conversation
pub const DEFAULT_PRIVATE_HISTORY_LIMIT: usize = 1000;

/// Rooms that exist before anyone joins
pub const DEFAULT_ROOMS: &[&str] = &["General", "Juegos", "Tareas"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Address the TCP listener binds to
    pub addr: String,
    /// Room history cap (FIFO eviction beyond it)
    pub history_limit: usize,
    /// Private conversation cap, `None` for unbounded
    pub private_history_limit: Option<usize>,
    /// Rooms seeded into the directory at startup
    pub default_rooms: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: DEFAULT_ADDR.to_string(),
            history_limit: DEFAULT_HISTORY_LIMIT,
            private_history_limit: Some(DEFAULT_PRIVATE_HISTORY_LIMIT),
            default_rooms: DEFAULT_ROOMS.iter().map(|r| r.to_string()).collect(),
        }
    }
}

impl ServerConfig {
    /// Build a config from the process environment
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup
    ///
    /// Unset keys keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(addr) = lookup("CHAT_ADDR") {
            config.addr = addr;
        }

        if let Some(raw) = lookup("CHAT_HISTORY_LIMIT") {
            let limit = parse_limit("CHAT_HISTORY_LIMIT", &raw)?;
            if limit == 0 {
                return Err(AppError::Config(
                    "CHAT_HISTORY_LIMIT must be greater than zero".to_string(),
                ));
            }
            config.history_limit = limit;
        }

        if let Some(raw) = lookup("CHAT_PRIVATE_HISTORY_LIMIT") {
            // 0 disables the cap
            let limit = parse_limit("CHAT_PRIVATE_HISTORY_LIMIT", &raw)?;
            config.private_history_limit = (limit > 0).then_some(limit);
        }

        if let Some(raw) = lookup("CHAT_ROOMS") {
            config.default_rooms = raw
                .split(',')
                .map(str::trim)
                .filter(|r| !r.is_empty())
                .map(str::to_string)
                .collect();
        }

        Ok(config)
    }

    /// Replace the bind address (e.g. from the command line)
    pub fn with_addr(mut self, addr: impl Into<String>) -> Self {
        self.addr = addr.into();
        self
    }
}

fn parse_limit(key: &str, raw: &str) -> Result<usize, AppError> {
    raw.trim()
        .parse()
        .map_err(|e| AppError::Config(format!("{}={:?}: {}", key, raw, e)))
}
