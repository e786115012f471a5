/// 通信モジュール
pub mod http;
#[cfg(target_os = "espidf")]
pub mod network_manager;
pub mod wifi;

#[cfg(target_os = "espidf")]
pub use network_manager::{NetworkManager, StationLink};
