/// HTTP ストリーミングサーバーモジュール
pub mod control;
pub mod mjpeg;
pub mod page;
#[cfg(target_os = "espidf")]
pub mod server;
pub mod status;

pub use control::{ControlCommand, ControlError};
#[cfg(target_os = "espidf")]
pub use server::{start_camera_server, CameraServers, ServerContext};
pub use status::DeviceStatus;
