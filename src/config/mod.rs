// Configuration module entry point
// Loads layered configuration and exposes the shared runtime state

mod state;
mod types;

use std::net::SocketAddr;

use crate::error::StartupError;

// Re-export public types
pub use state::AppState;
pub use types::{Config, HttpConfig};

/// Default config file name (without extension)
pub const DEFAULT_CONFIG_PATH: &str = "config";

impl Config {
    /// Load configuration from specified file path (without extension)
    ///
    /// The file is optional. Environment variables such as
    /// `BREZBAZE_SERVER__PORT` override both the file and the defaults.
    pub fn load_from(config_path: &str) -> Result<Self, StartupError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(
                config::Environment::with_prefix("BREZBAZE")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8080)?
            .set_default("logging.level", "info")?
            .set_default("logging.access_log", true)?
            .set_default("logging.access_log_format", "combined")?
            .set_default("performance.keep_alive_timeout", 75)?
            .set_default("performance.read_timeout", 30)?
            .set_default("performance.write_timeout", 30)?
            .set_default("performance.shutdown_timeout", 10)?
            .set_default("http.content_type", "text/plain; charset=utf-8")?
            .set_default("http.server_name", "brezbaze/0.1")?
            .build()?;

        let cfg: Self = settings.try_deserialize()?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Reject values that deserialize but would break startup
    fn validate(&self) -> Result<(), StartupError> {
        if self.server.workers == Some(0) {
            return Err(StartupError::InvalidConfig(
                "server.workers must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr, StartupError> {
        let addr = format!("{}:{}", self.server.host, self.server.port);
        addr.parse()
            .map_err(|e| StartupError::Address(format!("Invalid address '{addr}': {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn temp_config(name: &str, contents: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!("brezbaze-{}-{name}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_defaults_without_file() {
        let cfg = Config::load_from("/nonexistent/brezbaze/config").unwrap();
        assert_eq!(cfg.server.host, "127.0.0.1");
        assert_eq!(cfg.logging.level, "info");
        assert!(cfg.logging.access_log);
        assert_eq!(cfg.logging.access_log_format, "combined");
        assert_eq!(cfg.performance.read_timeout, 30);
        assert_eq!(cfg.performance.shutdown_timeout, 10);
        assert_eq!(cfg.performance.max_connections, None);
        assert_eq!(cfg.http.content_type, "text/plain; charset=utf-8");
    }

    #[test]
    fn test_file_overrides_defaults() {
        let path = temp_config(
            "override",
            r#"
[server]
host = "0.0.0.0"
port = 9090
workers = 2

[logging]
level = "warn"
access_log = false

[performance]
max_connections = 16
"#,
        );

        let cfg = Config::load_from(path.with_extension("").to_str().unwrap()).unwrap();
        assert_eq!(cfg.server.host, "0.0.0.0");
        assert_eq!(cfg.server.port, 9090);
        assert_eq!(cfg.server.workers, Some(2));
        assert_eq!(cfg.logging.level, "warn");
        assert!(!cfg.logging.access_log);
        assert_eq!(cfg.performance.max_connections, Some(16));
        // untouched sections keep their defaults
        assert_eq!(cfg.performance.keep_alive_timeout, 75);
        assert_eq!(cfg.http.server_name, "brezbaze/0.1");
    }

    #[test]
    fn test_zero_workers_rejected() {
        let path = temp_config("zero-workers", "[server]\nworkers = 0\n");
        let result = Config::load_from(path.with_extension("").to_str().unwrap());
        assert!(matches!(result, Err(StartupError::InvalidConfig(_))));
    }

    #[test]
    fn test_env_overrides_defaults() {
        // Only this test touches write_timeout, so parallel tests are unaffected
        const KEY: &str = "BREZBAZE_PERFORMANCE__WRITE_TIMEOUT";
        let previous = std::env::var(KEY).ok();
        std::env::set_var(KEY, "45");

        let result = Config::load_from("/nonexistent/brezbaze/config");

        match previous {
            Some(value) => std::env::set_var(KEY, value),
            None => std::env::remove_var(KEY),
        }
        assert_eq!(result.unwrap().performance.write_timeout, 45);
    }

    #[test]
    fn test_socket_addr() {
        let mut cfg = Config::load_from("/nonexistent/brezbaze/config").unwrap();
        cfg.server.host = "127.0.0.1".to_string();
        cfg.server.port = 8181;
        assert_eq!(
            cfg.get_socket_addr().unwrap(),
            "127.0.0.1:8181".parse::<SocketAddr>().unwrap()
        );

        cfg.server.host = "not a host".to_string();
        assert!(matches!(
            cfg.get_socket_addr(),
            Err(StartupError::Address(_))
        ));
    }
}
