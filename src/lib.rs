/*!
 * # ESP32-CAM Streamer Library
 *
 * AI-Thinker ESP32-CAM を起動し、WiFi ステーションとして接続したうえで
 * HTTP (MJPEG) で映像を配信するためのライブラリ
 *
 * ## モジュール構成
 * - `core`: 設定、接続通知、起動エラーの分類
 * - `hardware`: カメラ、フラッシュLED、PSRAM、ピン設定
 * - `communication`: WiFi ステーション、HTTP ストリーミングサーバー
 * - `storage`: NVS の初期化
 *
 * ESP-IDF に依存する部分は `target_os = "espidf"` のときだけビルドされ、
 * それ以外はホスト上でテストできる。
 */

// 公開モジュール
pub mod communication;
pub mod core;
pub mod hardware;
pub mod storage;

// 内部で使用する型をまとめてエクスポート
pub use communication::http::{ControlCommand, DeviceStatus};
pub use communication::wifi::{StationDriver, StationEvent, StationEventHandler};
pub use core::{is_fatal_error, AppConfig, BootError, ConfigError, ConnectionSignal, WaitOutcome};
pub use hardware::camera::{CameraSettings, FrameSize};
pub use storage::{init_with_recovery, NvsError, NvsFlash};

/// ライブラリのバージョン情報
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
