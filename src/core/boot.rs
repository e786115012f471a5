use std::time::Duration;

use crate::core::config::ConfigError;
use crate::storage::NvsError;

/// 起動シーケンスの失敗
#[derive(Debug, thiserror::Error)]
pub enum BootError {
    #[error("設定ファイルの読み込みエラー: {0}")]
    Config(#[from] ConfigError),
    #[error("Camera Init Failed: {0}")]
    CameraInit(String),
    #[error("Failed to set frame size: {0}")]
    FrameSize(String),
    #[error("NVSの初期化に失敗しました: {0}")]
    Nvs(#[from] NvsError),
    #[error("WiFiの初期化に失敗しました: {0}")]
    Wifi(String),
    #[error("WiFi接続がタイムアウトしました ({0:?})")]
    WifiTimeout(Duration),
    #[error("WiFi接続待機がキャンセルされました")]
    WifiCancelled,
    #[error("HTTPサーバーの起動に失敗しました: {0}")]
    HttpServer(String),
}

impl BootError {
    /// 致命的な失敗か
    ///
    /// カメラ関連はログを残して起動を打ち切るだけ (再起動で回復しうる)。
    /// それ以外はアボートしてシステムを再起動させる。
    pub fn is_fatal(&self) -> bool {
        !matches!(self, BootError::CameraInit(_) | BootError::FrameSize(_))
    }
}

/// `main` まで伝播したエラーが致命的か
///
/// `BootError` 以外 (ペリフェラル取得の `EspError` など) は常に致命的。
pub fn is_fatal_error(err: &anyhow::Error) -> bool {
    err.downcast_ref::<BootError>().map_or(true, BootError::is_fatal)
}
