use std::marker::PhantomData;
use std::ptr::NonNull;
use std::sync::Mutex;
use std::time::Duration;

use esp_idf_svc::hal::ledc::{CHANNEL0, TIMER0};
use esp_idf_svc::sys::{camera, esp, EspError};
use log::{error, info};

use super::settings::{CameraSettings, FbLocation, FrameSize, GrabMode, PixelFormat, SettingsError};
use crate::hardware::CameraPins;

/// カメラ制御のエラー
#[derive(Debug, thiserror::Error)]
pub enum CameraError {
    #[error("カメラ設定が不正です: {0}")]
    InvalidSettings(#[from] SettingsError),
    #[error("カメラの初期化に失敗しました: {0}")]
    InitFailed(EspError),
    #[error("センサーを取得できません")]
    SensorUnavailable,
    #[error("フレームサイズの設定に失敗しました ({0:?}, 結果: {1})")]
    FrameSizeFailed(FrameSize, i32),
    #[error("JPEG品質の設定に失敗しました ({0}, 結果: {1})")]
    QualityFailed(u8, i32),
    #[error("フレームの取得に失敗しました")]
    CaptureFailed,
}

#[derive(Debug, Clone, Copy)]
struct SensorState {
    frame_size: FrameSize,
    quality: u8,
}

/// esp32-camera ドライバのハンドル
///
/// ピンと XCLK 用の LEDC タイマー0/チャネル0 を所有し、破棄時にドライバを停止する。
pub struct Camera {
    _pins: CameraPins,
    _xclk_timer: TIMER0,
    _xclk_channel: CHANNEL0,
    state: Mutex<SensorState>,
}

impl Camera {
    pub fn init(
        pins: CameraPins,
        xclk_timer: TIMER0,
        xclk_channel: CHANNEL0,
        settings: &CameraSettings,
    ) -> Result<Self, CameraError> {
        settings.validate()?;

        let config = camera::camera_config_t {
            pin_pwdn: settings.pins.pwdn,
            pin_reset: settings.pins.reset,
            pin_xclk: settings.pins.xclk,
            __bindgen_anon_1: camera::camera_config_t__bindgen_ty_1 {
                pin_sccb_sda: settings.pins.sccb_sda,
            },
            __bindgen_anon_2: camera::camera_config_t__bindgen_ty_2 {
                pin_sccb_scl: settings.pins.sccb_scl,
            },
            pin_d0: settings.pins.data[0],
            pin_d1: settings.pins.data[1],
            pin_d2: settings.pins.data[2],
            pin_d3: settings.pins.data[3],
            pin_d4: settings.pins.data[4],
            pin_d5: settings.pins.data[5],
            pin_d6: settings.pins.data[6],
            pin_d7: settings.pins.data[7],
            pin_vsync: settings.pins.vsync,
            pin_href: settings.pins.href,
            pin_pclk: settings.pins.pclk,
            xclk_freq_hz: settings.xclk_freq_hz as i32,
            ledc_timer: settings.ledc_timer as camera::ledc_timer_t,
            ledc_channel: settings.ledc_channel as camera::ledc_channel_t,
            pixel_format: pixel_format_to_sys(settings.pixel_format),
            frame_size: frame_size_to_sys(settings.frame_size),
            jpeg_quality: settings.jpeg_quality as i32,
            fb_count: settings.fb_count as usize,
            fb_location: fb_location_to_sys(settings.fb_location),
            grab_mode: grab_mode_to_sys(settings.grab_mode),
            ..Default::default()
        };

        esp!(unsafe { camera::esp_camera_init(&config) }).map_err(|e| {
            error!("Camera Init Failed: {}", e);
            CameraError::InitFailed(e)
        })?;

        info!(
            "✓ カメラを初期化しました ({} {}x{}, 品質 {}, バッファ {})",
            settings.frame_size.name(),
            settings.frame_size.dimensions().0,
            settings.frame_size.dimensions().1,
            settings.jpeg_quality,
            settings.fb_count
        );

        Ok(Self {
            _pins: pins,
            _xclk_timer: xclk_timer,
            _xclk_channel: xclk_channel,
            state: Mutex::new(SensorState {
                frame_size: settings.frame_size,
                quality: settings.jpeg_quality,
            }),
        })
    }

    fn sensor(&self) -> Result<NonNull<camera::sensor_t>, CameraError> {
        NonNull::new(unsafe { camera::esp_camera_sensor_get() }).ok_or(CameraError::SensorUnavailable)
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, SensorState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn set_frame_size(&self, frame_size: FrameSize) -> Result<(), CameraError> {
        let sensor = self.sensor()?;
        let result = unsafe {
            match (*sensor.as_ptr()).set_framesize {
                Some(set_framesize) => set_framesize(sensor.as_ptr(), frame_size_to_sys(frame_size)),
                None => -1,
            }
        };
        if result < 0 {
            error!("Failed to set frame size");
            return Err(CameraError::FrameSizeFailed(frame_size, result));
        }
        self.lock_state().frame_size = frame_size;
        info!("フレームサイズを {} に変更しました", frame_size.name());
        Ok(())
    }

    pub fn set_quality(&self, quality: u8) -> Result<(), CameraError> {
        let sensor = self.sensor()?;
        let result = unsafe {
            match (*sensor.as_ptr()).set_quality {
                Some(set_quality) => set_quality(sensor.as_ptr(), quality as i32),
                None => -1,
            }
        };
        if result < 0 {
            return Err(CameraError::QualityFailed(quality, result));
        }
        self.lock_state().quality = quality;
        Ok(())
    }

    pub fn frame_size(&self) -> FrameSize {
        self.lock_state().frame_size
    }

    pub fn quality(&self) -> u8 {
        self.lock_state().quality
    }

    /// 1フレーム取得する (ガードの破棄でドライバへ返却)
    pub fn capture(&self) -> Result<FrameBuffer<'_>, CameraError> {
        let fb = NonNull::new(unsafe { camera::esp_camera_fb_get() }).ok_or(CameraError::CaptureFailed)?;
        Ok(FrameBuffer {
            fb,
            _camera: PhantomData,
        })
    }
}

// SAFETY: 所有しているペリフェラルは保持するだけで操作しない。esp_camera_* はスレッドセーフ。
unsafe impl Sync for Camera {}

impl Drop for Camera {
    fn drop(&mut self) {
        if let Some(e) = EspError::from(unsafe { camera::esp_camera_deinit() }) {
            error!("カメラの停止に失敗しました: {}", e);
        }
    }
}

/// ドライバから借りているフレームバッファ
pub struct FrameBuffer<'a> {
    fb: NonNull<camera::camera_fb_t>,
    _camera: PhantomData<&'a Camera>,
}

impl FrameBuffer<'_> {
    pub fn data(&self) -> &[u8] {
        unsafe {
            let fb = self.fb.as_ref();
            std::slice::from_raw_parts(fb.buf, fb.len)
        }
    }

    pub fn width(&self) -> usize {
        unsafe { self.fb.as_ref().width }
    }

    pub fn height(&self) -> usize {
        unsafe { self.fb.as_ref().height }
    }

    /// 取り込み時刻 (起動からの経過時間)
    pub fn timestamp(&self) -> Duration {
        let ts = unsafe { self.fb.as_ref().timestamp };
        Duration::from_secs(ts.tv_sec as u64) + Duration::from_micros(ts.tv_usec as u64)
    }
}

impl Drop for FrameBuffer<'_> {
    fn drop(&mut self) {
        unsafe { camera::esp_camera_fb_return(self.fb.as_ptr()) };
    }
}

fn frame_size_to_sys(frame_size: FrameSize) -> camera::framesize_t {
    match frame_size {
        FrameSize::R96x96 => camera::framesize_t_FRAMESIZE_96X96,
        FrameSize::Qqvga => camera::framesize_t_FRAMESIZE_QQVGA,
        FrameSize::Qcif => camera::framesize_t_FRAMESIZE_QCIF,
        FrameSize::Hqvga => camera::framesize_t_FRAMESIZE_HQVGA,
        FrameSize::R240x240 => camera::framesize_t_FRAMESIZE_240X240,
        FrameSize::Qvga => camera::framesize_t_FRAMESIZE_QVGA,
        FrameSize::Cif => camera::framesize_t_FRAMESIZE_CIF,
        FrameSize::Hvga => camera::framesize_t_FRAMESIZE_HVGA,
        FrameSize::Vga => camera::framesize_t_FRAMESIZE_VGA,
        FrameSize::Svga => camera::framesize_t_FRAMESIZE_SVGA,
        FrameSize::Xga => camera::framesize_t_FRAMESIZE_XGA,
        FrameSize::Hd => camera::framesize_t_FRAMESIZE_HD,
        FrameSize::Sxga => camera::framesize_t_FRAMESIZE_SXGA,
        FrameSize::Uxga => camera::framesize_t_FRAMESIZE_UXGA,
    }
}

fn pixel_format_to_sys(format: PixelFormat) -> camera::pixformat_t {
    match format {
        PixelFormat::Jpeg => camera::pixformat_t_PIXFORMAT_JPEG,
        PixelFormat::Rgb565 => camera::pixformat_t_PIXFORMAT_RGB565,
        PixelFormat::Yuv422 => camera::pixformat_t_PIXFORMAT_YUV422,
        PixelFormat::Grayscale => camera::pixformat_t_PIXFORMAT_GRAYSCALE,
    }
}

fn grab_mode_to_sys(mode: GrabMode) -> camera::camera_grab_mode_t {
    match mode {
        GrabMode::WhenEmpty => camera::camera_grab_mode_t_CAMERA_GRAB_WHEN_EMPTY,
        GrabMode::Latest => camera::camera_grab_mode_t_CAMERA_GRAB_LATEST,
    }
}

fn fb_location_to_sys(location: FbLocation) -> camera::camera_fb_location_t {
    match location {
        FbLocation::Psram => camera::camera_fb_location_t_CAMERA_FB_IN_PSRAM,
        FbLocation::Dram => camera::camera_fb_location_t_CAMERA_FB_IN_DRAM,
    }
}

