/// ハードウェア制御モジュール
pub mod camera;
pub mod led;
#[cfg(target_os = "espidf")]
pub mod pins;
#[cfg(target_os = "espidf")]
pub mod psram;

#[cfg(target_os = "espidf")]
pub use pins::CameraPins;
