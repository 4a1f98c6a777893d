// Application state module
// Holds the immutable config and the greeter built from it

use super::types::Config;
use crate::handler::StaticGreeter;

/// Application state shared by every connection
pub struct AppState {
    pub config: Config,
    pub greeter: StaticGreeter,
}

impl AppState {
    pub fn new(config: &Config) -> Self {
        Self {
            config: config.clone(),
            greeter: StaticGreeter::new(&config.http),
        }
    }

    pub const fn access_log_enabled(&self) -> bool {
        self.config.logging.access_log
    }
}
