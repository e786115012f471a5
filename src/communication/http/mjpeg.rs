//! MJPEG (multipart/x-mixed-replace) ストリームのヘッダ生成

use std::time::Duration;

pub const PART_BOUNDARY: &str = "123456789000000000000987654321";

/// `/stream` レスポンスの Content-Type
pub fn stream_content_type() -> String {
    format!("multipart/x-mixed-replace;boundary={}", PART_BOUNDARY)
}

/// 各パートの前に送る区切り
pub fn boundary_line() -> String {
    format!("\r\n--{}\r\n", PART_BOUNDARY)
}

/// JPEG パートのヘッダ (`timestamp` はフレームの取り込み時刻)
pub fn part_header(jpeg_len: usize, timestamp: Duration) -> String {
    format!(
        "Content-Type: image/jpeg\r\nContent-Length: {}\r\nX-Timestamp: {}.{:06}\r\n\r\n",
        jpeg_len,
        timestamp.as_secs(),
        timestamp.subsec_micros()
    )
}

/// JPEG の SOI/EOI マーカーを確認する
pub fn looks_like_jpeg(data: &[u8]) -> bool {
    data.len() >= 4 && data[..2] == [0xFF, 0xD8] && data[data.len() - 2..] == [0xFF, 0xD9]
}

/// 直近フレームの間隔からフレームレートを平滑化して求める
#[derive(Debug, Default)]
pub struct FrameRateMeter {
    average_ms: Option<f32>,
}

impl FrameRateMeter {
    const SMOOTHING: f32 = 0.2;

    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, interval: Duration) -> f32 {
        let ms = interval.as_secs_f32() * 1000.0;
        let average = match self.average_ms {
            Some(prev) => prev + (ms - prev) * Self::SMOOTHING,
            None => ms,
        };
        self.average_ms = Some(average);
        self.fps()
    }

    pub fn fps(&self) -> f32 {
        match self.average_ms {
            Some(ms) if ms > 0.0 => 1000.0 / ms,
            _ => 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_type_carries_boundary() {
        assert_eq!(
            stream_content_type(),
            "multipart/x-mixed-replace;boundary=123456789000000000000987654321"
        );
        assert_eq!(boundary_line(), "\r\n--123456789000000000000987654321\r\n");
    }

    #[test]
    fn part_header_has_length_and_timestamp() {
        let header = part_header(5120, Duration::from_micros(12_000_345));
        assert_eq!(
            header,
            "Content-Type: image/jpeg\r\nContent-Length: 5120\r\nX-Timestamp: 12.000345\r\n\r\n"
        );
    }

    #[test]
    fn jpeg_markers_are_checked() {
        assert!(looks_like_jpeg(&[0xFF, 0xD8, 0x00, 0x11, 0xFF, 0xD9]));
        assert!(!looks_like_jpeg(&[0xFF, 0xD8, 0xFF, 0xD9][..3]));
        assert!(!looks_like_jpeg(&[0x00, 0xD8, 0x00, 0xFF, 0xD9]));
    }

    #[test]
    fn frame_rate_is_smoothed() {
        let mut meter = FrameRateMeter::new();
        assert_eq!(meter.fps(), 0.0);
        let first = meter.record(Duration::from_millis(100));
        assert!((first - 10.0).abs() < 0.01);
        let second = meter.record(Duration::from_millis(200));
        // 100 + (200 - 100) * 0.2 = 120ms
        assert!((second - 1000.0 / 120.0).abs() < 0.01);
    }
}
