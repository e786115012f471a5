use esp_idf_svc::hal::gpio::Gpio4;
use esp_idf_svc::hal::ledc::config::TimerConfig;
use esp_idf_svc::hal::ledc::{LedcDriver, LedcTimerDriver, Resolution, CHANNEL1, TIMER1};
use esp_idf_svc::hal::units::FromValueType;
use log::info;

use super::{duty_for_intensity, FlashControl};

/// LEDの制御に関するエラー
#[derive(Debug, thiserror::Error)]
pub enum LedError {
    #[error("LEDの初期化に失敗しました: {0}")]
    InitFailed(String),

    #[error("LEDの点灯制御に失敗しました: {0}")]
    ControlFailed(String),
}

/// LEDC (PWM) で駆動するフラッシュLED
///
/// カメラの XCLK がタイマー0/チャネル0を使うため、タイマー1/チャネル1を使用する。
pub struct LedFlash {
    driver: LedcDriver<'static>,
    max_intensity: u8,
    intensity: u8,
    lit: bool,
}

impl LedFlash {
    /// デューティ0でPWMチャネルを構成します
    ///
    /// # エラー
    ///
    /// タイマーまたはチャネルの構成に失敗した場合にエラーを返します
    pub fn new(
        timer: TIMER1,
        channel: CHANNEL1,
        pin: Gpio4,
        max_intensity: u8,
    ) -> Result<Self, LedError> {
        let timer_config = TimerConfig::new()
            .frequency(5.kHz().into())
            .resolution(Resolution::Bits8);
        let timer_driver = LedcTimerDriver::new(timer, &timer_config)
            .map_err(|e| LedError::InitFailed(format!("{:?}", e)))?;
        let mut driver = LedcDriver::new(channel, timer_driver, pin)
            .map_err(|e| LedError::InitFailed(format!("{:?}", e)))?;
        driver
            .set_duty(0)
            .map_err(|e| LedError::InitFailed(format!("{:?}", e)))?;

        info!("フラッシュLEDを初期化しました (最大輝度: {})", max_intensity);
        Ok(Self {
            driver,
            max_intensity,
            intensity: 0,
            lit: false,
        })
    }

    pub fn intensity(&self) -> u8 {
        self.intensity
    }

    /// 輝度を変更します (点灯中であれば即座に反映)
    pub fn set_intensity(&mut self, intensity: u8) -> Result<(), LedError> {
        self.intensity = intensity.min(self.max_intensity);
        if self.lit {
            self.apply(self.intensity)?;
        }
        Ok(())
    }

    /// 設定された輝度で点灯、または消灯します
    pub fn enable(&mut self, on: bool) -> Result<(), LedError> {
        self.lit = on;
        self.apply(if on { self.intensity } else { 0 })
    }

    fn apply(&mut self, intensity: u8) -> Result<(), LedError> {
        let duty = duty_for_intensity(intensity, self.max_intensity, self.driver.get_max_duty());
        self.driver
            .set_duty(duty)
            .map_err(|e| LedError::ControlFailed(format!("{:?}", e)))
    }
}

impl FlashControl for LedFlash {
    type Error = LedError;

    fn enable(&mut self, on: bool) -> Result<(), LedError> {
        LedFlash::enable(self, on)
    }
}
