use std::sync::{Arc, Mutex};
use std::time::Instant;

use esp_idf_svc::http::server::{Configuration, EspHttpServer};
use esp_idf_svc::http::Method;
use esp_idf_svc::io::Write;
use log::{debug, info, warn};

use super::control::{split_query, ControlCommand};
use super::mjpeg::{boundary_line, looks_like_jpeg, part_header, stream_content_type, FrameRateMeter};
use super::page::{index_html, stream_port};
use super::status::DeviceStatus;
use crate::core::ConnectionSignal;
use crate::hardware::camera::{Camera, CameraError, FrameBuffer, FrameSize};
use crate::hardware::led::{with_flash, LedFlash, FLASH_SETTLE_TIME};
use crate::hardware::psram;

/// `ctrl_port` の既定値 (ESP-IDF の `HTTPD_DEFAULT_CONFIG`)
const DEFAULT_CTRL_PORT: u16 = 32768;

/// ハンドラ間で共有する状態
#[derive(Clone)]
pub struct ServerContext {
    pub camera: Arc<Camera>,
    pub flash: Option<Arc<Mutex<LedFlash>>>,
    pub signal: ConnectionSignal,
    /// 起動時に確保したフレームバッファのサイズ
    pub max_frame_size: FrameSize,
}

impl ServerContext {
    /// フラッシュを点灯して1枚撮影する
    fn capture_lit(&self) -> Result<FrameBuffer<'_>, CameraError> {
        match &self.flash {
            Some(flash) => {
                let mut flash = flash.lock().unwrap_or_else(|e| e.into_inner());
                with_flash(&mut *flash, FLASH_SETTLE_TIME, || self.camera.capture())
            }
            None => self.camera.capture(),
        }
    }

    fn set_flash(&self, on: bool) {
        if let Some(flash) = &self.flash {
            let mut flash = flash.lock().unwrap_or_else(|e| e.into_inner());
            if let Err(e) = flash.enable(on) {
                warn!("フラッシュLEDの制御に失敗しました: {}", e);
            }
        }
    }

    fn flash_intensity(&self) -> u8 {
        self.flash
            .as_ref()
            .map(|flash| flash.lock().unwrap_or_else(|e| e.into_inner()).intensity())
            .unwrap_or(0)
    }

    fn apply(&self, command: ControlCommand) -> anyhow::Result<()> {
        match command {
            ControlCommand::FrameSize(size) => self.camera.set_frame_size(size)?,
            ControlCommand::Quality(quality) => self.camera.set_quality(quality)?,
            ControlCommand::LedIntensity(intensity) => match &self.flash {
                Some(flash) => flash
                    .lock()
                    .unwrap_or_else(|e| e.into_inner())
                    .set_intensity(intensity)?,
                None => anyhow::bail!("フラッシュLEDは無効です"),
            },
        }
        Ok(())
    }

    fn status(&self) -> DeviceStatus {
        DeviceStatus::new(
            self.camera.frame_size(),
            self.camera.quality(),
            self.flash_intensity(),
            psram::psram_size(),
            self.signal.is_connected(),
        )
    }
}

fn write_part<W: Write>(out: &mut W, jpeg: &[u8], timestamp: std::time::Duration) -> Result<(), W::Error> {
    out.write_all(boundary_line().as_bytes())?;
    out.write_all(part_header(jpeg.len(), timestamp).as_bytes())?;
    out.write_all(jpeg)?;
    out.flush()
}

/// 起動中の HTTP サーバー
///
/// 破棄するとハンドラも停止する。
pub struct CameraServers {
    _control: EspHttpServer<'static>,
    _stream: EspHttpServer<'static>,
}

/// HTTP サーバーを起動する
///
/// `/`, `/capture`, `/status`, `/control` は `port` で、
/// `/stream` は専用のサーバー (`port + 1`) で待ち受ける。
pub fn start_camera_server(port: u16, ctx: ServerContext) -> anyhow::Result<CameraServers> {
    let stream_port =
        stream_port(port).ok_or_else(|| anyhow::anyhow!("ストリーム用ポートを割り当てられません: {}", port))?;

    let control = start_control_server(port, stream_port, ctx.clone())?;
    let stream = start_stream_server(stream_port, ctx)?;

    Ok(CameraServers {
        _control: control,
        _stream: stream,
    })
}

fn start_control_server(
    port: u16,
    stream_port: u16,
    ctx: ServerContext,
) -> anyhow::Result<EspHttpServer<'static>> {
    let config = Configuration {
        http_port: port,
        ctrl_port: DEFAULT_CTRL_PORT,
        stack_size: 10240,
        ..Default::default()
    };
    let mut server = EspHttpServer::new(&config)?;

    let index = index_html(stream_port);
    server.fn_handler("/", Method::Get, move |req| -> anyhow::Result<()> {
        req.into_response(200, Some("OK"), &[("Content-Type", "text/html")])?
            .write_all(index.as_bytes())?;
        Ok(())
    })?;

    let capture_ctx = ctx.clone();
    server.fn_handler("/capture", Method::Get, move |req| -> anyhow::Result<()> {
        let frame = match capture_ctx.capture_lit() {
            Ok(frame) if looks_like_jpeg(frame.data()) => frame,
            Ok(frame) => {
                warn!("JPEGではないフレームを破棄しました ({}B)", frame.data().len());
                req.into_status_response(500)?;
                return Ok(());
            }
            Err(e) => {
                warn!("キャプチャに失敗しました: {}", e);
                req.into_status_response(500)?;
                return Ok(());
            }
        };
        let length = frame.data().len().to_string();
        let mut resp = req.into_response(
            200,
            Some("OK"),
            &[
                ("Content-Type", "image/jpeg"),
                ("Content-Disposition", "inline; filename=capture.jpg"),
                ("Content-Length", length.as_str()),
                ("Access-Control-Allow-Origin", "*"),
            ],
        )?;
        resp.write_all(frame.data())?;
        info!("JPEG: {}B ({}x{})", frame.data().len(), frame.width(), frame.height());
        Ok(())
    })?;

    let status_ctx = ctx.clone();
    server.fn_handler("/status", Method::Get, move |req| -> anyhow::Result<()> {
        let json = status_ctx.status().to_json()?;
        req.into_response(
            200,
            Some("OK"),
            &[
                ("Content-Type", "application/json"),
                ("Access-Control-Allow-Origin", "*"),
            ],
        )?
        .write_all(json.as_bytes())?;
        Ok(())
    })?;

    let control_ctx = ctx;
    server.fn_handler("/control", Method::Get, move |req| -> anyhow::Result<()> {
        let parsed = ControlCommand::parse(split_query(req.uri()))
            .and_then(|command| command.within_buffer(control_ctx.max_frame_size));
        let command = match parsed {
            Ok(command) => command,
            Err(e) => {
                warn!("不正な制御要求: {}", e);
                req.into_status_response(400)?.write_all(e.to_string().as_bytes())?;
                return Ok(());
            }
        };
        if let Err(e) = control_ctx.apply(command) {
            warn!("設定の反映に失敗しました ({:?}): {}", command, e);
            req.into_status_response(500)?.write_all(e.to_string().as_bytes())?;
            return Ok(());
        }
        info!("設定を変更しました: {:?}", command);
        req.into_response(200, Some("OK"), &[("Access-Control-Allow-Origin", "*")])?;
        Ok(())
    })?;

    info!("HTTPサーバーをポート {} で起動しました", port);
    Ok(server)
}

fn start_stream_server(port: u16, ctx: ServerContext) -> anyhow::Result<EspHttpServer<'static>> {
    // 2つ目の httpd は制御用ポートも別にする必要がある
    let config = Configuration {
        http_port: port,
        ctrl_port: DEFAULT_CTRL_PORT + 1,
        stack_size: 10240,
        ..Default::default()
    };
    let mut server = EspHttpServer::new(&config)?;

    server.fn_handler("/stream", Method::Get, move |req| -> anyhow::Result<()> {
        let content_type = stream_content_type();
        let mut resp = req.into_response(
            200,
            Some("OK"),
            &[
                ("Content-Type", content_type.as_str()),
                ("Access-Control-Allow-Origin", "*"),
            ],
        )?;

        info!("ストリーミングを開始します");
        ctx.set_flash(true);
        let mut meter = FrameRateMeter::new();
        let mut last_frame = Instant::now();

        loop {
            let frame = match ctx.camera.capture() {
                Ok(frame) => frame,
                Err(e) => {
                    warn!("キャプチャに失敗したためストリームを終了します: {}", e);
                    break;
                }
            };
            if !looks_like_jpeg(frame.data()) {
                debug!("JPEGではないフレームを読み飛ばしました ({}B)", frame.data().len());
                continue;
            }
            if let Err(e) = write_part(&mut resp, frame.data(), frame.timestamp()) {
                debug!("クライアントが切断しました: {:?}", e);
                break;
            }
            let fps = meter.record(last_frame.elapsed());
            last_frame = Instant::now();
            debug!("MJPG: {}B {:.1}fps", frame.data().len(), fps);
        }

        ctx.set_flash(false);
        info!("ストリーミングを終了しました");
        Ok(())
    })?;

    info!("ストリーミングサーバーをポート {} で起動しました", port);
    Ok(server)
}
