use crate::hardware::camera::settings::FrameSize;

/// WiFi の最低認証方式 (これより弱い AP には接続しない)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthThreshold {
    Open,
    Wep,
    Wpa,
    Wpa2,
    WpaWpa2,
    Wpa3,
    Wpa2Wpa3,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    MissingWifiSsid,
    WifiSsidTooLong(usize),
    WifiPasswordTooLong(usize),
    MissingWifiPassword,
    UnknownAuthMethod(String),
    UnknownFrameSize(String),
    InvalidJpegQuality(u8),
    InvalidFbCount(u8),
    InvalidXclkFrequency(u32),
    InvalidHttpPort(u16),
}

pub const WIFI_SSID_MAX_LEN: usize = 32;
pub const WIFI_PASSWORD_MAX_LEN: usize = 64;
pub const JPEG_QUALITY_MAX: u8 = 63;
pub const FB_COUNT_MAX: u8 = 3;
pub const XCLK_FREQ_MAX_HZ: u32 = 20_000_000;

pub fn validate_wifi_ssid(ssid: &str) -> Result<(), ValidationError> {
    if ssid.is_empty() {
        Err(ValidationError::MissingWifiSsid)
    } else if ssid.len() > WIFI_SSID_MAX_LEN {
        Err(ValidationError::WifiSsidTooLong(ssid.len()))
    } else {
        Ok(())
    }
}

pub fn parse_auth_method(value: &str) -> Result<AuthThreshold, ValidationError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "open" | "none" => Ok(AuthThreshold::Open),
        "wep" => Ok(AuthThreshold::Wep),
        "wpa" => Ok(AuthThreshold::Wpa),
        "wpa2" => Ok(AuthThreshold::Wpa2),
        "wpa_wpa2" => Ok(AuthThreshold::WpaWpa2),
        "wpa3" => Ok(AuthThreshold::Wpa3),
        "wpa2_wpa3" => Ok(AuthThreshold::Wpa2Wpa3),
        _ => Err(ValidationError::UnknownAuthMethod(value.to_string())),
    }
}

/// パスワードは認証方式と組み合わせて検証する (open 以外で空は不可)
pub fn validate_wifi_password(password: &str, auth: AuthThreshold) -> Result<(), ValidationError> {
    if password.len() > WIFI_PASSWORD_MAX_LEN {
        return Err(ValidationError::WifiPasswordTooLong(password.len()));
    }
    if password.is_empty() && auth != AuthThreshold::Open {
        return Err(ValidationError::MissingWifiPassword);
    }
    Ok(())
}

pub fn parse_frame_size(value: &str) -> Result<FrameSize, ValidationError> {
    FrameSize::from_name(value).ok_or_else(|| ValidationError::UnknownFrameSize(value.to_string()))
}

pub fn parse_jpeg_quality(value: u8) -> Result<u8, ValidationError> {
    if value > JPEG_QUALITY_MAX {
        Err(ValidationError::InvalidJpegQuality(value))
    } else {
        Ok(value)
    }
}

pub fn parse_fb_count(value: u8) -> Result<u8, ValidationError> {
    if value == 0 || value > FB_COUNT_MAX {
        Err(ValidationError::InvalidFbCount(value))
    } else {
        Ok(value)
    }
}

pub fn parse_xclk_freq_hz(value: u32) -> Result<u32, ValidationError> {
    if value == 0 || value > XCLK_FREQ_MAX_HZ {
        Err(ValidationError::InvalidXclkFrequency(value))
    } else {
        Ok(value)
    }
}

/// ストリーム用サーバーが `value + 1` を使うため、0 と 65535 は使えない
pub fn parse_http_port(value: u16) -> Result<u16, ValidationError> {
    if value == 0 || value == u16::MAX {
        Err(ValidationError::InvalidHttpPort(value))
    } else {
        Ok(value)
    }
}

/// 0 は無制限待機を意味する
pub fn parse_connect_timeout_seconds(value: u64) -> Option<std::time::Duration> {
    if value == 0 {
        None
    } else {
        Some(std::time::Duration::from_secs(value))
    }
}
