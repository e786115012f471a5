/// フラッシュLED制御モジュール
#[cfg(target_os = "espidf")]
pub mod flash;

#[cfg(target_os = "espidf")]
pub use flash::{LedError, LedFlash};

use std::fmt::Display;
use std::time::Duration;

use log::warn;

/// 点灯してから露光に反映されるまでの待ち時間
pub const FLASH_SETTLE_TIME: Duration = Duration::from_millis(150);

/// フラッシュの点灯/消灯
pub trait FlashControl {
    type Error: Display;

    fn enable(&mut self, on: bool) -> Result<(), Self::Error>;
}

/// フラッシュを点灯し、`settle` 待ってから `f` を実行して消灯する
///
/// 点灯に失敗しても `f` は実行する。
pub fn with_flash<F: FlashControl, T>(flash: &mut F, settle: Duration, f: impl FnOnce() -> T) -> T {
    match flash.enable(true) {
        Ok(()) => std::thread::sleep(settle),
        Err(e) => warn!("フラッシュLEDの点灯に失敗しました: {}", e),
    }
    let result = f();
    if let Err(e) = flash.enable(false) {
        warn!("フラッシュLEDの消灯に失敗しました: {}", e);
    }
    result
}

/// 輝度 (0-255) を PWM デューティへ変換する
///
/// `max_intensity` を上限として、タイマー分解能の最大デューティ `max_duty` に比例させる。
pub fn duty_for_intensity(intensity: u8, max_intensity: u8, max_duty: u32) -> u32 {
    let capped = intensity.min(max_intensity) as u64;
    (capped * max_duty as u64 / u8::MAX as u64) as u32
}
