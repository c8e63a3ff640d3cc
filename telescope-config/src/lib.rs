pub mod config;
pub mod error;

pub use config::{load, AppConfig, Cli, ObserverLocation};
pub use error::{Error, Result};
