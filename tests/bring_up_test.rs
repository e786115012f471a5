// 起動シーケンスのハードウェア非依存部分の結合テスト

use std::net::Ipv4Addr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use esp32_cam_streamer::communication::http::{mjpeg, page, ControlCommand, ControlError, DeviceStatus};
use esp32_cam_streamer::hardware::camera::settings::{FbLocation, AI_THINKER_PINS};
use esp32_cam_streamer::{
    init_with_recovery, is_fatal_error, BootError, CameraSettings, ConnectionSignal, FrameSize, NvsError,
    NvsFlash, StationDriver, StationEvent, StationEventHandler, WaitOutcome,
};

#[derive(Clone, Default)]
struct CountingDriver {
    calls: Arc<AtomicUsize>,
}

impl StationDriver for CountingDriver {
    type Error = ();

    fn request_connect(&self) -> Result<(), ()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[test]
fn boot_waits_until_event_loop_reports_ip() {
    let signal = ConnectionSignal::new();
    let driver = CountingDriver::default();
    let handler = Arc::new(StationEventHandler::new(driver.clone(), signal.clone()));

    // イベントループ側のスレッド
    let events = Arc::clone(&handler);
    let event_loop = thread::spawn(move || {
        events.handle(StationEvent::Started);
        thread::sleep(Duration::from_millis(10));
        events.handle(StationEvent::Disconnected);
        thread::sleep(Duration::from_millis(10));
        events.handle(StationEvent::GotIp(Ipv4Addr::new(192, 168, 4, 2)));
    });

    assert_eq!(signal.wait(None), WaitOutcome::Connected);
    event_loop.join().unwrap();

    // 起動時と切断時の2回、接続を要求している
    assert_eq!(driver.calls.load(Ordering::SeqCst), 2);
}

#[test]
fn configured_timeout_turns_into_fatal_boot_error() {
    let signal = ConnectionSignal::new();
    let timeout = Duration::from_millis(20);
    let outcome = signal.wait(Some(timeout));
    assert_eq!(outcome, WaitOutcome::TimedOut);

    let err = BootError::WifiTimeout(timeout);
    assert!(err.is_fatal());
}

struct CorruptedOnce {
    inits: usize,
    erased: bool,
}

impl NvsFlash for CorruptedOnce {
    fn init(&mut self) -> Result<(), NvsError> {
        self.inits += 1;
        if self.erased {
            Ok(())
        } else {
            Err(NvsError::NewVersionFound)
        }
    }

    fn erase(&mut self) -> Result<(), NvsError> {
        self.erased = true;
        Ok(())
    }
}

#[test]
fn incompatible_nvs_is_erased_before_wifi() {
    let mut flash = CorruptedOnce {
        inits: 0,
        erased: false,
    };
    assert_eq!(init_with_recovery(&mut flash), Ok(()));
    assert!(flash.erased);
    assert_eq!(flash.inits, 2);
}

#[test]
fn nvs_failure_is_fatal_but_camera_failure_is_not() {
    assert!(BootError::from(NvsError::Other(-1)).is_fatal());
    assert!(!BootError::CameraInit("ESP_ERR_NOT_SUPPORTED".to_string()).is_fatal());
}

#[test]
fn init_size_is_maximal_then_downsized_for_streaming() {
    let settings = CameraSettings::ai_thinker();
    assert_eq!(settings.validate(), Ok(()));
    assert_eq!(settings.pins, AI_THINKER_PINS);
    assert_eq!(settings.frame_size, FrameSize::Uxga);

    let stream = FrameSize::from_index(11).unwrap();
    assert_eq!(stream, FrameSize::Hd);
    assert!(stream < settings.frame_size);
}

#[test]
fn no_psram_caps_stream_size_to_buffer() {
    let settings = CameraSettings::ai_thinker().adapt_to_psram(0);
    assert_eq!(settings.fb_location, FbLocation::Dram);
    assert_eq!(FrameSize::Hd.min(settings.frame_size), FrameSize::Svga);
}

#[test]
fn control_cannot_exceed_buffers_allocated_without_psram() {
    let settings = CameraSettings::ai_thinker().adapt_to_psram(0);
    let result = ControlCommand::parse("var=framesize&val=13")
        .and_then(|command| command.within_buffer(settings.frame_size));
    assert_eq!(
        result,
        Err(ControlError::FrameSizeExceedsBuffer {
            requested: FrameSize::Uxga,
            max: FrameSize::Svga,
        })
    );

    // PSRAM があれば UXGA まで戻せる
    let settings = CameraSettings::ai_thinker().adapt_to_psram(4 * 1024 * 1024);
    let result = ControlCommand::parse("var=framesize&val=13")
        .and_then(|command| command.within_buffer(settings.frame_size));
    assert_eq!(result, Ok(ControlCommand::FrameSize(FrameSize::Uxga)));
}

#[test]
fn main_keeps_running_only_after_camera_failures() {
    let camera: anyhow::Result<()> = Err(BootError::CameraInit("ESP_FAIL".to_string()).into());
    assert!(!is_fatal_error(&camera.unwrap_err()));

    let nvs: anyhow::Result<()> = Err(BootError::from(NvsError::NoFreePages).into());
    assert!(is_fatal_error(&nvs.unwrap_err()));

    // ペリフェラル取得などの BootError 以外
    assert!(is_fatal_error(&anyhow::anyhow!("ESP_ERR_INVALID_STATE")));
}

#[test]
fn stream_is_served_apart_from_control_endpoints() {
    let port = page::stream_port(80).unwrap();
    assert_eq!(port, 81);
    assert!(page::index_html(port).contains(":81/stream"));
}

#[test]
fn control_request_round_trip_to_status() {
    let command = ControlCommand::parse("var=framesize&val=8").unwrap();
    let size = match command {
        ControlCommand::FrameSize(size) => size,
        other => panic!("unexpected command: {:?}", other),
    };
    let status = DeviceStatus::new(size, 10, 0, 0, true);
    let json = status.to_json().unwrap();
    assert!(json.contains("\"framesize\":8"));
    assert!(json.contains("\"framesize_name\":\"VGA\""));
}

#[test]
fn stream_part_is_well_formed() {
    let jpeg = [0xFF, 0xD8, 0x01, 0x02, 0xFF, 0xD9];
    assert!(mjpeg::looks_like_jpeg(&jpeg));

    let mut part = Vec::new();
    part.extend_from_slice(mjpeg::boundary_line().as_bytes());
    part.extend_from_slice(mjpeg::part_header(jpeg.len(), Duration::from_secs(3)).as_bytes());
    part.extend_from_slice(&jpeg);

    let text = String::from_utf8_lossy(&part);
    assert!(text.starts_with("\r\n--123456789000000000000987654321\r\n"));
    assert!(text.contains("Content-Length: 6\r\n"));
    assert!(text.contains("X-Timestamp: 3.000000\r\n\r\n"));
    assert!(part.ends_with(&[0xFF, 0xD9]));
}
