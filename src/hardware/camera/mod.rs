/// カメラ制御モジュール
#[cfg(target_os = "espidf")]
pub mod controller;
/// ドライバに渡す静的設定
pub mod settings;

#[cfg(target_os = "espidf")]
pub use controller::{Camera, CameraError, FrameBuffer};
pub use settings::{CameraSettings, FrameSize, SettingsError};
