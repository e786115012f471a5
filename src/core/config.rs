use std::time::Duration;

use crate::core::config_validation::{
    parse_auth_method, parse_connect_timeout_seconds, parse_fb_count, parse_frame_size,
    parse_http_port, parse_jpeg_quality, parse_xclk_freq_hz, validate_wifi_password,
    validate_wifi_ssid, AuthThreshold, ValidationError,
};
use crate::hardware::camera::settings::FrameSize;

/// アプリケーション設定
///
/// この構造体はビルド時に`toml_cfg`によって`cfg.toml`ファイルから
/// 読み込まれた設定を保持します。
#[toml_cfg::toml_config]
pub struct Config {
    #[default("")]
    wifi_ssid: &'static str,

    #[default("")]
    wifi_password: &'static str,

    #[default("wpa2")]
    wifi_auth_method: &'static str,

    #[default(0)] // 0 = 無制限に待機
    wifi_connect_timeout_seconds: u64,

    #[default("UXGA")] // バッファを最大サイズで確保する
    init_frame_size: &'static str,

    #[default("HD")]
    stream_frame_size: &'static str,

    #[default(12)]
    jpeg_quality: u8,

    #[default(2)]
    fb_count: u8,

    #[default(20000000)]
    xclk_freq_hz: u32,

    #[default(1000)]
    settle_delay_ms: u32,

    #[default(80)]
    http_port: u16,

    #[default(true)]
    led_flash_enabled: bool,

    #[default(255)]
    led_max_intensity: u8,
}

/// 設定エラー
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("WiFi SSIDが設定されていません")]
    MissingWifiSsid,
    #[error("WiFi SSIDが長すぎます (最大32バイト): {0}バイト")]
    WifiSsidTooLong(usize),
    #[error("WiFi パスワードが設定されていません")]
    MissingWifiPassword,
    #[error("WiFi パスワードが長すぎます (最大64バイト): {0}バイト")]
    WifiPasswordTooLong(usize),
    #[error("未対応の認証方式です: {0}")]
    UnknownAuthMethod(String),
    #[error("未対応のフレームサイズです: {0}")]
    UnknownFrameSize(String),
    #[error("jpeg_quality の値が無効です (0-63): {0}")]
    InvalidJpegQuality(u8),
    #[error("fb_count の値が無効です (1-3): {0}")]
    InvalidFbCount(u8),
    #[error("xclk_freq_hz の値が無効です (1-20000000): {0}")]
    InvalidXclkFrequency(u32),
    #[error("http_port の値が無効です (1-65534): {0}")]
    InvalidHttpPort(u16),
}

/// アプリケーション設定を表す構造体
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// WiFi SSID
    pub wifi_ssid: String,

    /// WiFi パスワード
    pub wifi_password: String,

    /// 接続を許可する最低認証方式
    pub wifi_auth: AuthThreshold,

    /// 接続待機タイムアウト (None は無制限)
    pub wifi_connect_timeout: Option<Duration>,

    /// 初期化時のフレームサイズ
    pub init_frame_size: FrameSize,

    /// 初期化直後に切り替えるストリーミング用フレームサイズ
    pub stream_frame_size: FrameSize,

    /// JPEG品質 (小さいほど高画質)
    pub jpeg_quality: u8,

    /// フレームバッファ数
    pub fb_count: u8,

    /// カメラクロック周波数 (Hz)
    pub xclk_freq_hz: u32,

    /// WiFi接続後、サーバー起動までの待機時間 (ms)
    pub settle_delay_ms: u32,

    /// HTTPサーバーのポート
    pub http_port: u16,

    /// フラッシュLEDを使用するか
    pub led_flash_enabled: bool,

    /// フラッシュLEDの最大輝度 (0-255)
    pub led_max_intensity: u8,
}

impl AppConfig {
    /// 設定ファイルから設定をロードします
    pub fn load() -> Result<Self, ConfigError> {
        // toml_cfg によって生成された定数
        Self::from_raw(&CONFIG)
    }

    fn from_raw(config: &Config) -> Result<Self, ConfigError> {
        // WiFi設定を取得・検証
        validate_wifi_ssid(config.wifi_ssid).map_err(map_validation_error)?;
        let wifi_auth = parse_auth_method(config.wifi_auth_method).map_err(map_validation_error)?;
        validate_wifi_password(config.wifi_password, wifi_auth).map_err(map_validation_error)?;
        let wifi_connect_timeout = parse_connect_timeout_seconds(config.wifi_connect_timeout_seconds);

        // フレームサイズ
        let init_frame_size =
            parse_frame_size(config.init_frame_size).map_err(map_validation_error)?;
        let stream_frame_size =
            parse_frame_size(config.stream_frame_size).map_err(map_validation_error)?;

        // カメラパラメータ
        let jpeg_quality = parse_jpeg_quality(config.jpeg_quality).map_err(map_validation_error)?;
        let fb_count = parse_fb_count(config.fb_count).map_err(map_validation_error)?;
        let xclk_freq_hz = parse_xclk_freq_hz(config.xclk_freq_hz).map_err(map_validation_error)?;

        let http_port = parse_http_port(config.http_port).map_err(map_validation_error)?;

        Ok(AppConfig {
            wifi_ssid: config.wifi_ssid.to_string(),
            wifi_password: config.wifi_password.to_string(),
            wifi_auth,
            wifi_connect_timeout,
            init_frame_size,
            stream_frame_size,
            jpeg_quality,
            fb_count,
            xclk_freq_hz,
            settle_delay_ms: config.settle_delay_ms,
            http_port,
            led_flash_enabled: config.led_flash_enabled,
            led_max_intensity: config.led_max_intensity,
        })
    }
}

fn map_validation_error(err: ValidationError) -> ConfigError {
    match err {
        ValidationError::MissingWifiSsid => ConfigError::MissingWifiSsid,
        ValidationError::WifiSsidTooLong(v) => ConfigError::WifiSsidTooLong(v),
        ValidationError::MissingWifiPassword => ConfigError::MissingWifiPassword,
        ValidationError::WifiPasswordTooLong(v) => ConfigError::WifiPasswordTooLong(v),
        ValidationError::UnknownAuthMethod(v) => ConfigError::UnknownAuthMethod(v),
        ValidationError::UnknownFrameSize(v) => ConfigError::UnknownFrameSize(v),
        ValidationError::InvalidJpegQuality(v) => ConfigError::InvalidJpegQuality(v),
        ValidationError::InvalidFbCount(v) => ConfigError::InvalidFbCount(v),
        ValidationError::InvalidXclkFrequency(v) => ConfigError::InvalidXclkFrequency(v),
        ValidationError::InvalidHttpPort(v) => ConfigError::InvalidHttpPort(v),
    }
}
