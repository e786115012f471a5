/// コアシステムモジュール
pub mod boot;
pub mod config;
pub mod config_validation;
pub mod connection_signal;

pub use boot::{is_fatal_error, BootError};
pub use config::{AppConfig, ConfigError};
pub use connection_signal::{ConnectionSignal, WaitOutcome};
