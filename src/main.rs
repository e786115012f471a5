#[cfg(target_os = "espidf")]
use esp32_cam_streamer::{
    communication::{
        http::{start_camera_server, ServerContext},
        NetworkManager,
    },
    core::{is_fatal_error, AppConfig, BootError, ConnectionSignal},
    hardware::{
        camera::{Camera, CameraSettings},
        led::LedFlash,
        psram, CameraPins,
    },
    storage::{init_with_recovery, nvs::EspNvsFlash},
};
#[cfg(target_os = "espidf")]
use esp_idf_svc::{
    eventloop::EspSystemEventLoop,
    hal::{delay::FreeRtos, peripherals::Peripherals},
    nvs::EspDefaultNvsPartition,
};
#[cfg(target_os = "espidf")]
use log::{debug, error, info, warn};
#[cfg(target_os = "espidf")]
use std::sync::{Arc, Mutex};

/// アプリケーションのメインエントリーポイント
#[cfg(target_os = "espidf")]
fn main() -> anyhow::Result<()> {
    // ESP-IDFの基本初期化
    esp_idf_svc::sys::link_patches();
    esp_idf_svc::log::EspLogger::initialize_default();

    match run() {
        Ok(()) => Ok(()),
        Err(e) => {
            if is_fatal_error(&e) {
                return Err(e);
            }
            // カメラ関連の失敗はログを残して起動を打ち切る (再起動待ち)
            error!("{}", e);
            error!("起動を中断しました。デバイスを再起動してください");
            Ok(())
        }
    }
}

#[cfg(target_os = "espidf")]
fn run() -> anyhow::Result<()> {
    // 設定ファイル読み込み
    let app_config = AppConfig::load().map_err(|e| {
        error!("設定ファイルの読み込みに失敗しました: {}", e);
        BootError::from(e)
    })?;

    let psram_bytes = psram::psram_size();
    info!("PSRAM size: {} bytes", psram_bytes);

    // ペリフェラルとシステムリソースの初期化
    info!("ペリフェラルを初期化しています");
    let peripherals = Peripherals::take()?;
    let sysloop = EspSystemEventLoop::take()?;
    let pins = peripherals.pins;

    // カメラ用ピンの準備
    let camera_pins = CameraPins::new(
        pins.gpio32, pins.gpio0, pins.gpio26, pins.gpio27,
        pins.gpio5, pins.gpio18, pins.gpio19, pins.gpio21,
        pins.gpio36, pins.gpio39, pins.gpio34, pins.gpio35,
        pins.gpio25, pins.gpio23, pins.gpio22,
    );

    let settings = CameraSettings {
        pins: camera_pins.pin_map(),
        ..CameraSettings::from_config(&app_config)
    }
    .adapt_to_psram(psram_bytes);
    if psram_bytes == 0 {
        warn!("PSRAMが見つかりません。DRAM上の1バッファ構成で起動します");
    }

    let camera = Camera::init(
        camera_pins,
        peripherals.ledc.timer0,
        peripherals.ledc.channel0,
        &settings,
    )
    .map_err(|e| BootError::CameraInit(e.to_string()))?;

    // 起動直後に LWIP を圧迫しないよう、ストリーミング用のサイズへ落とす
    let stream_frame_size = app_config.stream_frame_size.min(settings.frame_size);
    camera
        .set_frame_size(stream_frame_size)
        .map_err(|e| BootError::FrameSize(e.to_string()))?;

    // WiFi が使用する NVS
    init_with_recovery(&mut EspNvsFlash).map_err(BootError::from)?;
    let nvs_partition = EspDefaultNvsPartition::take()?;

    // フラッシュLED (失敗しても配信は続ける)
    let flash = if app_config.led_flash_enabled {
        match LedFlash::new(
            peripherals.ledc.timer1,
            peripherals.ledc.channel1,
            pins.gpio4,
            app_config.led_max_intensity,
        ) {
            Ok(flash) => Some(Arc::new(Mutex::new(flash))),
            Err(e) => {
                warn!("フラッシュLEDを使用できません: {}", e);
                None
            }
        }
    } else {
        None
    };

    // WiFi ステーション接続
    let station = NetworkManager::connect_station(
        peripherals.modem,
        &sysloop,
        nvs_partition,
        &app_config,
        ConnectionSignal::new(),
    )?;

    // Let the things settle
    FreeRtos::delay_ms(app_config.settle_delay_ms);

    let ctx = ServerContext {
        camera: Arc::new(camera),
        flash,
        signal: station.signal().clone(),
        max_frame_size: settings.frame_size,
    };
    let _servers = start_camera_server(app_config.http_port, ctx)
        .map_err(|e| BootError::HttpServer(e.to_string()))?;

    let address = match station.ip() {
        Ok(ip) if app_config.http_port == 80 => ip.to_string(),
        Ok(ip) => format!("{}:{}", ip, app_config.http_port),
        Err(_) => "<device_ip>".to_string(),
    };
    info!("Camera Ready! Use 'http://{}' to connect", address);

    // サーバーと WiFi のイベント購読を保持し続ける
    loop {
        FreeRtos::delay_ms(10_000);
        debug!(
            "接続状態: {}, PSRAM空き: {} bytes",
            station.signal().is_connected(),
            psram::psram_free()
        );
    }
}

#[cfg(not(target_os = "espidf"))]
fn main() {
    eprintln!("このバイナリは ESP32 (espidf) ターゲット向けです");
}
