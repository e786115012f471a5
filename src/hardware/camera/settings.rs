//! カメラドライバに渡す静的設定
//!
//! ピン割り当てとキャプチャパラメータをまとめた設定レコード。ESP-IDF の
//! `camera_config_t` への変換は `controller` 側で行い、ここはホストでもテストできる
//! 純粋なデータと検証だけを持つ。

use crate::core::config::AppConfig;

/// ドライバのフレームサイズテーブル (OV2640 が扱える UXGA まで)
///
/// 判別値は `/control?var=framesize` で使うインデックス。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum FrameSize {
    R96x96 = 0,
    Qqvga = 1,
    Qcif = 2,
    Hqvga = 3,
    R240x240 = 4,
    Qvga = 5,
    Cif = 6,
    Hvga = 7,
    Vga = 8,
    Svga = 9,
    Xga = 10,
    Hd = 11,
    Sxga = 12,
    Uxga = 13,
}

impl FrameSize {
    pub const ALL: [FrameSize; 14] = [
        FrameSize::R96x96,
        FrameSize::Qqvga,
        FrameSize::Qcif,
        FrameSize::Hqvga,
        FrameSize::R240x240,
        FrameSize::Qvga,
        FrameSize::Cif,
        FrameSize::Hvga,
        FrameSize::Vga,
        FrameSize::Svga,
        FrameSize::Xga,
        FrameSize::Hd,
        FrameSize::Sxga,
        FrameSize::Uxga,
    ];

    pub fn index(self) -> u8 {
        self as u8
    }

    pub fn from_index(index: u8) -> Option<Self> {
        Self::ALL.get(index as usize).copied()
    }

    pub fn name(self) -> &'static str {
        match self {
            FrameSize::R96x96 => "96X96",
            FrameSize::Qqvga => "QQVGA",
            FrameSize::Qcif => "QCIF",
            FrameSize::Hqvga => "HQVGA",
            FrameSize::R240x240 => "240X240",
            FrameSize::Qvga => "QVGA",
            FrameSize::Cif => "CIF",
            FrameSize::Hvga => "HVGA",
            FrameSize::Vga => "VGA",
            FrameSize::Svga => "SVGA",
            FrameSize::Xga => "XGA",
            FrameSize::Hd => "HD",
            FrameSize::Sxga => "SXGA",
            FrameSize::Uxga => "UXGA",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|size| size.name().eq_ignore_ascii_case(name))
    }

    /// (幅, 高さ)
    pub fn dimensions(self) -> (u16, u16) {
        match self {
            FrameSize::R96x96 => (96, 96),
            FrameSize::Qqvga => (160, 120),
            FrameSize::Qcif => (176, 144),
            FrameSize::Hqvga => (240, 176),
            FrameSize::R240x240 => (240, 240),
            FrameSize::Qvga => (320, 240),
            FrameSize::Cif => (400, 296),
            FrameSize::Hvga => (480, 320),
            FrameSize::Vga => (640, 480),
            FrameSize::Svga => (800, 600),
            FrameSize::Xga => (1024, 768),
            FrameSize::Hd => (1280, 720),
            FrameSize::Sxga => (1280, 1024),
            FrameSize::Uxga => (1600, 1200),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    Jpeg,
    Rgb565,
    Yuv422,
    Grayscale,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrabMode {
    /// バッファが空いたときだけ取り込む
    WhenEmpty,
    /// 常に最新フレームで上書きする (2 バッファ以上が前提)
    Latest,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FbLocation {
    Psram,
    Dram,
}

/// カメラ用ピン番号 (-1 は未接続)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CameraPinMap {
    pub pwdn: i32,
    pub reset: i32,
    pub xclk: i32,
    pub sccb_sda: i32,
    pub sccb_scl: i32,
    pub data: [i32; 8],
    pub vsync: i32,
    pub href: i32,
    pub pclk: i32,
}

/// AI-Thinker ESP32-CAM のピン配置
pub const AI_THINKER_PINS: CameraPinMap = CameraPinMap {
    pwdn: 32,
    reset: -1,
    xclk: 0,
    sccb_sda: 26,
    sccb_scl: 27,
    data: [5, 18, 19, 21, 36, 39, 34, 35],
    vsync: 25,
    href: 23,
    pclk: 22,
};

impl CameraPinMap {
    /// 接続されているピンの一覧
    pub fn used_pins(&self) -> Vec<i32> {
        let mut pins = vec![
            self.pwdn,
            self.reset,
            self.xclk,
            self.sccb_sda,
            self.sccb_scl,
            self.vsync,
            self.href,
            self.pclk,
        ];
        pins.extend_from_slice(&self.data);
        pins.retain(|pin| *pin >= 0);
        pins
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SettingsError {
    #[error("JPEG品質が範囲外です (0-63): {0}")]
    InvalidJpegQuality(u8),
    #[error("フレームバッファ数が範囲外です (1-3): {0}")]
    InvalidFbCount(u8),
    #[error("XCLK周波数が範囲外です (1-20MHz): {0}Hz")]
    InvalidXclkFrequency(u32),
    #[error("GrabMode::Latest には2つ以上のフレームバッファが必要です (現在: {0})")]
    LatestNeedsMultipleBuffers(u8),
    #[error("DRAM上のフレームバッファでは {0:?} は大きすぎます (SVGAまで)")]
    FrameTooLargeForDram(FrameSize),
    #[error("GPIO{0} が重複して割り当てられています")]
    DuplicatePin(i32),
}

/// DRAM に置けるフレームサイズの上限
pub const DRAM_MAX_FRAME_SIZE: FrameSize = FrameSize::Svga;

/// カメラ初期化に渡す設定レコード
#[derive(Debug, Clone, PartialEq)]
pub struct CameraSettings {
    pub ledc_channel: u8,
    pub ledc_timer: u8,
    pub pins: CameraPinMap,
    pub xclk_freq_hz: u32,
    pub pixel_format: PixelFormat,
    pub frame_size: FrameSize,
    pub grab_mode: GrabMode,
    pub fb_location: FbLocation,
    pub jpeg_quality: u8,
    pub fb_count: u8,
}

impl CameraSettings {
    /// AI-Thinker 向けの既定値
    ///
    /// バッファを最大化するため初期化時は UXGA で確保する。
    pub fn ai_thinker() -> Self {
        Self {
            ledc_channel: 0,
            ledc_timer: 0,
            pins: AI_THINKER_PINS,
            xclk_freq_hz: 20_000_000,
            pixel_format: PixelFormat::Jpeg,
            frame_size: FrameSize::Uxga,
            grab_mode: GrabMode::Latest,
            fb_location: FbLocation::Psram,
            jpeg_quality: 12,
            fb_count: 2,
        }
    }

    /// 設定ファイルの値を反映した設定
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            xclk_freq_hz: config.xclk_freq_hz,
            frame_size: config.init_frame_size,
            jpeg_quality: config.jpeg_quality,
            fb_count: config.fb_count,
            grab_mode: if config.fb_count > 1 {
                GrabMode::Latest
            } else {
                GrabMode::WhenEmpty
            },
            ..Self::ai_thinker()
        }
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.jpeg_quality > 63 {
            return Err(SettingsError::InvalidJpegQuality(self.jpeg_quality));
        }
        if self.fb_count == 0 || self.fb_count > 3 {
            return Err(SettingsError::InvalidFbCount(self.fb_count));
        }
        if self.xclk_freq_hz == 0 || self.xclk_freq_hz > 20_000_000 {
            return Err(SettingsError::InvalidXclkFrequency(self.xclk_freq_hz));
        }
        if self.grab_mode == GrabMode::Latest && self.fb_count < 2 {
            return Err(SettingsError::LatestNeedsMultipleBuffers(self.fb_count));
        }
        if self.fb_location == FbLocation::Dram && self.frame_size > DRAM_MAX_FRAME_SIZE {
            return Err(SettingsError::FrameTooLargeForDram(self.frame_size));
        }

        let pins = self.pins.used_pins();
        for (i, pin) in pins.iter().enumerate() {
            if pins[i + 1..].contains(pin) {
                return Err(SettingsError::DuplicatePin(*pin));
            }
        }

        Ok(())
    }

    /// PSRAM が無い場合は DRAM 上の 1 バッファ構成へ落とす
    pub fn adapt_to_psram(mut self, psram_bytes: usize) -> Self {
        if psram_bytes > 0 {
            return self;
        }
        self.fb_location = FbLocation::Dram;
        self.fb_count = 1;
        self.grab_mode = GrabMode::WhenEmpty;
        if self.frame_size > DRAM_MAX_FRAME_SIZE {
            self.frame_size = DRAM_MAX_FRAME_SIZE;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ai_thinker_defaults_are_valid() {
        let settings = CameraSettings::ai_thinker();
        assert_eq!(settings.validate(), Ok(()));
        assert_eq!(settings.frame_size, FrameSize::Uxga);
        assert_eq!(settings.pixel_format, PixelFormat::Jpeg);
        assert_eq!(settings.grab_mode, GrabMode::Latest);
        assert_eq!(settings.fb_location, FbLocation::Psram);
        assert_eq!(settings.jpeg_quality, 12);
        assert_eq!(settings.fb_count, 2);
        assert_eq!(settings.xclk_freq_hz, 20_000_000);
    }

    #[test]
    fn ai_thinker_pins_skip_unconnected_reset() {
        let pins = AI_THINKER_PINS.used_pins();
        assert_eq!(pins.len(), 15);
        assert!(!pins.contains(&-1));
        // GPIO4 はフラッシュLED用に空いている
        assert!(!pins.contains(&4));
    }

    #[test]
    fn frame_size_index_eleven_is_hd() {
        assert_eq!(FrameSize::from_index(11), Some(FrameSize::Hd));
        assert_eq!(FrameSize::Hd.dimensions(), (1280, 720));
        assert_eq!(FrameSize::from_index(14), None);
    }

    #[test]
    fn frame_size_table_is_ordered_by_index() {
        for (i, size) in FrameSize::ALL.iter().enumerate() {
            assert_eq!(size.index() as usize, i);
            assert_eq!(FrameSize::from_name(size.name()), Some(*size));
        }
        assert_eq!(FrameSize::from_name("uxga"), Some(FrameSize::Uxga));
    }

    #[test]
    fn latest_grab_requires_two_buffers() {
        let settings = CameraSettings {
            fb_count: 1,
            ..CameraSettings::ai_thinker()
        };
        assert_eq!(
            settings.validate(),
            Err(SettingsError::LatestNeedsMultipleBuffers(1))
        );
    }

    #[test]
    fn duplicated_pin_is_rejected() {
        let mut settings = CameraSettings::ai_thinker();
        settings.pins.href = settings.pins.vsync;
        assert_eq!(settings.validate(), Err(SettingsError::DuplicatePin(25)));
    }

    #[test]
    fn out_of_range_parameters_are_rejected() {
        let quality = CameraSettings {
            jpeg_quality: 70,
            ..CameraSettings::ai_thinker()
        };
        assert_eq!(quality.validate(), Err(SettingsError::InvalidJpegQuality(70)));

        let xclk = CameraSettings {
            xclk_freq_hz: 0,
            ..CameraSettings::ai_thinker()
        };
        assert_eq!(xclk.validate(), Err(SettingsError::InvalidXclkFrequency(0)));
    }

    #[test]
    fn missing_psram_falls_back_to_single_dram_buffer() {
        let settings = CameraSettings::ai_thinker().adapt_to_psram(0);
        assert_eq!(settings.fb_location, FbLocation::Dram);
        assert_eq!(settings.fb_count, 1);
        assert_eq!(settings.grab_mode, GrabMode::WhenEmpty);
        assert_eq!(settings.frame_size, FrameSize::Svga);
        assert_eq!(settings.validate(), Ok(()));
    }

    #[test]
    fn psram_present_keeps_settings() {
        let settings = CameraSettings::ai_thinker().adapt_to_psram(4 * 1024 * 1024);
        assert_eq!(settings, CameraSettings::ai_thinker());
    }

    #[test]
    fn large_frame_in_dram_is_rejected() {
        let settings = CameraSettings {
            fb_location: FbLocation::Dram,
            ..CameraSettings::ai_thinker()
        };
        assert_eq!(
            settings.validate(),
            Err(SettingsError::FrameTooLargeForDram(FrameSize::Uxga))
        );
    }
}
