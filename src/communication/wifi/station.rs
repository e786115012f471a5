use std::net::Ipv4Addr;

use log::{info, warn};

use crate::core::connection_signal::ConnectionSignal;

/// ステーションのライフサイクルイベント
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StationEvent {
    Started,
    Disconnected,
    GotIp(Ipv4Addr),
    Other,
}

/// 接続要求を出す WiFi ドライバの抽象
pub trait StationDriver {
    type Error: std::fmt::Debug;

    fn request_connect(&self) -> Result<(), Self::Error>;
}

/// イベントを接続要求と接続フラグへ反映する
///
/// 切断時はバックオフも上限も無く再接続を要求し続ける。
pub struct StationEventHandler<D: StationDriver> {
    driver: D,
    signal: ConnectionSignal,
}

impl<D: StationDriver> StationEventHandler<D> {
    pub fn new(driver: D, signal: ConnectionSignal) -> Self {
        Self { driver, signal }
    }

    pub fn handle(&self, event: StationEvent) {
        match event {
            StationEvent::Started => {
                self.connect();
            }
            StationEvent::Disconnected => {
                self.connect();
                self.signal.set_disconnected();
                info!("APへの再接続を試みています");
            }
            StationEvent::GotIp(ip) => {
                info!("IPアドレスを取得しました: {}", ip);
                self.signal.set_connected();
            }
            StationEvent::Other => {}
        }
    }

    fn connect(&self) {
        if let Err(e) = self.driver.request_connect() {
            warn!("WiFi接続要求に失敗しました: {:?}", e);
        }
    }

    pub fn signal(&self) -> &ConnectionSignal {
        &self.signal
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Arc;

    #[derive(Clone, Default)]
    struct MockDriver {
        connect_calls: Arc<AtomicUsize>,
        fail: Arc<AtomicBool>,
    }

    impl StationDriver for MockDriver {
        type Error = &'static str;

        fn request_connect(&self) -> Result<(), Self::Error> {
            self.connect_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail.load(Ordering::SeqCst) {
                Err("not started")
            } else {
                Ok(())
            }
        }
    }

    fn handler() -> (StationEventHandler<MockDriver>, MockDriver) {
        let driver = MockDriver::default();
        (
            StationEventHandler::new(driver.clone(), ConnectionSignal::new()),
            driver,
        )
    }

    #[test]
    fn start_requests_connection() {
        let (handler, driver) = handler();
        handler.handle(StationEvent::Started);
        assert_eq!(driver.connect_calls.load(Ordering::SeqCst), 1);
        assert!(!handler.signal().is_connected());
    }

    #[test]
    fn got_ip_sets_connected() {
        let (handler, driver) = handler();
        handler.handle(StationEvent::GotIp(Ipv4Addr::new(192, 168, 1, 40)));
        assert!(handler.signal().is_connected());
        assert_eq!(driver.connect_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn disconnect_clears_flag_and_reconnects_every_time() {
        let (handler, driver) = handler();
        handler.handle(StationEvent::GotIp(Ipv4Addr::new(10, 0, 0, 2)));
        for _ in 0..5 {
            handler.handle(StationEvent::Disconnected);
        }
        assert!(!handler.signal().is_connected());
        assert_eq!(driver.connect_calls.load(Ordering::SeqCst), 5);
    }

    #[test]
    fn failed_connect_request_is_not_fatal() {
        let (handler, driver) = handler();
        driver.fail.store(true, Ordering::SeqCst);
        handler.handle(StationEvent::Started);
        handler.handle(StationEvent::Disconnected);
        assert_eq!(driver.connect_calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn other_events_are_ignored() {
        let (handler, driver) = handler();
        handler.handle(StationEvent::Other);
        assert_eq!(driver.connect_calls.load(Ordering::SeqCst), 0);
        assert!(!handler.signal().is_connected());
    }
}
