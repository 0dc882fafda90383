pub mod catalog;
pub mod config;
pub mod logging;
pub mod models;
pub mod paths;
pub mod provider;
pub mod redact;
pub mod secrets;
pub mod suggest;

pub use config::{Config, ConfigError, LogLevel, LoggingConfig, ValidationError};
pub use logging::{init_logging, LoggingError, LoggingGuard};
pub use paths::{AppDirs, DirsError};

pub const APP_NAME: &str = "encore";
pub const APP_AUTHOR: &str = "Encore";
pub const APP_QUALIFIER: &str = "io";
