//! Startup error type
//!
//! Everything that can stop the server before it starts accepting.
//! Errors after startup are logged, never returned.

#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// A value that deserialized fine but cannot be used
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// `server.host`/`server.port` do not form a socket address
    #[error("{0}")]
    Address(String),

    /// Log files, listener sockets or the runtime failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
