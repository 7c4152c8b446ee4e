use crate::error::{ChatError, Result};
use crate::protocol::Language;
use std::env;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Chat server configuration
    pub server: ServerConfig,
    /// Broadcast dispatch pool configuration
    pub dispatch: DispatchConfig,
    /// Logging configuration
    pub log: LogConfig,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Host to bind to (default: 0.0.0.0)
    pub host: String,
    /// Port for the chat server (default: 50123)
    pub port: u16,
    /// Language for user-facing strings (english, portuguese)
    pub language: Language,
}

#[derive(Debug, Clone)]
pub struct DispatchConfig {
    /// Number of broadcast workers in the pool
    pub workers: usize,
    /// Capacity of the shared job queue; a full queue blocks the
    /// submitting connection handler
    pub queue_capacity: usize,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            workers: 10,
            queue_capacity: 256,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Log level (debug, info, warn, error)
    pub level: String,
    /// Output format (pretty, json)
    pub format: String,
    /// Directory for the append-only log file
    pub dir: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Ok(Config {
            server: ServerConfig {
                host: get_env_or("CHAT_HOST", "0.0.0.0"),
                port: get_env_or("CHAT_PORT", "50123").parse().map_err(|_| {
                    ChatError::InvalidConfig("CHAT_PORT must be a valid port number".into())
                })?,
                language: Language::from_str(&get_env_or("CHAT_LANG", "english")),
            },
            dispatch: DispatchConfig {
                workers: parse_positive("DISPATCH_WORKERS", "10")?,
                queue_capacity: parse_positive("DISPATCH_QUEUE_CAPACITY", "256")?,
            },
            log: LogConfig {
                level: get_env_or("LOG_LEVEL", "info"),
                format: get_env_or("LOG_FORMAT", "pretty"),
                dir: get_env_or("LOG_DIR", "logs"),
            },
        })
    }

    /// Get the chat server address
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

fn parse_positive(key: &str, default: &str) -> Result<usize> {
    let value: usize = get_env_or(key, default)
        .parse()
        .map_err(|_| ChatError::InvalidConfig(format!("{} must be a valid number", key)))?;
    if value == 0 {
        return Err(ChatError::InvalidConfig(format!(
            "{} must be greater than zero",
            key
        )));
    }
    Ok(value)
}

/// Get environment variable with a default value
fn get_env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}
