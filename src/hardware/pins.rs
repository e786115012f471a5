use esp_idf_svc::hal::gpio::*;

use crate::hardware::camera::settings::CameraPinMap;

/// カメラピン設定構造体 (AI-Thinker ESP32-CAM)
///
/// RESET は未接続。ピンの所有権をカメラドライバへ移すことで他の用途と競合させない。
pub struct CameraPins {
    pub pwdn: Gpio32,
    pub clock: Gpio0,
    pub sda: Gpio26,
    pub scl: Gpio27,
    pub d0: Gpio5,
    pub d1: Gpio18,
    pub d2: Gpio19,
    pub d3: Gpio21,
    pub d4: Gpio36,
    pub d5: Gpio39,
    pub d6: Gpio34,
    pub d7: Gpio35,
    pub vsync: Gpio25,
    pub href: Gpio23,
    pub pclk: Gpio22,
}

impl CameraPins {
    /// 個別のピンから作成
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        pwdn: Gpio32, clock: Gpio0, sda: Gpio26, scl: Gpio27,
        d0: Gpio5, d1: Gpio18, d2: Gpio19, d3: Gpio21,
        d4: Gpio36, d5: Gpio39, d6: Gpio34, d7: Gpio35,
        vsync: Gpio25, href: Gpio23, pclk: Gpio22,
    ) -> Self {
        Self {
            pwdn, clock, sda, scl, d0, d1, d2, d3, d4, d5, d6, d7,
            vsync, href, pclk,
        }
    }

    /// ドライバに渡すピン番号表
    pub fn pin_map(&self) -> CameraPinMap {
        CameraPinMap {
            pwdn: self.pwdn.pin() as i32,
            reset: -1,
            xclk: self.clock.pin() as i32,
            sccb_sda: self.sda.pin() as i32,
            sccb_scl: self.scl.pin() as i32,
            data: [
                self.d0.pin() as i32,
                self.d1.pin() as i32,
                self.d2.pin() as i32,
                self.d3.pin() as i32,
                self.d4.pin() as i32,
                self.d5.pin() as i32,
                self.d6.pin() as i32,
                self.d7.pin() as i32,
            ],
            vsync: self.vsync.pin() as i32,
            href: self.href.pin() as i32,
            pclk: self.pclk.pin() as i32,
        }
    }
}
