use serde::Serialize;

use crate::hardware::camera::settings::FrameSize;

/// `/status` が返す JSON
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviceStatus {
    pub framesize: u8,
    pub framesize_name: &'static str,
    pub quality: u8,
    pub led_intensity: u8,
    pub psram_bytes: usize,
    pub connected: bool,
}

impl DeviceStatus {
    pub fn new(
        frame_size: FrameSize,
        quality: u8,
        led_intensity: u8,
        psram_bytes: usize,
        connected: bool,
    ) -> Self {
        Self {
            framesize: frame_size.index(),
            framesize_name: frame_size.name(),
            quality,
            led_intensity,
            psram_bytes,
            connected,
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
