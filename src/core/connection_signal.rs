use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::time::{Duration, Instant};

/// 待機の結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    Connected,
    TimedOut,
    Cancelled,
}

#[derive(Debug, Default)]
struct SignalState {
    connected: bool,
    cancelled: bool,
}

/// ネットワーク接続状態の通知
///
/// イベントコールバック (生産者) が状態を更新し、起動シーケンス (消費者) が
/// 接続完了を待つ。ハンドルは clone して共有する。
#[derive(Debug, Clone, Default)]
pub struct ConnectionSignal {
    inner: Arc<(Mutex<SignalState>, Condvar)>,
}

impl ConnectionSignal {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, SignalState> {
        // 状態は bool のみなので poison されても値はそのまま使える
        self.inner.0.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn set_connected(&self) {
        self.lock().connected = true;
        self.inner.1.notify_all();
    }

    pub fn set_disconnected(&self) {
        self.lock().connected = false;
    }

    pub fn is_connected(&self) -> bool {
        self.lock().connected
    }

    /// 待機中の消費者を起こして `Cancelled` を返させる
    pub fn cancel(&self) {
        self.lock().cancelled = true;
        self.inner.1.notify_all();
    }

    /// 接続されるまで無期限に待機する
    pub fn wait_connected(&self) -> WaitOutcome {
        let mut state = self.lock();
        loop {
            if state.connected {
                return WaitOutcome::Connected;
            }
            if state.cancelled {
                return WaitOutcome::Cancelled;
            }
            state = self
                .inner
                .1
                .wait(state)
                .unwrap_or_else(|e| e.into_inner());
        }
    }

    pub fn wait_connected_timeout(&self, timeout: Duration) -> WaitOutcome {
        let deadline = Instant::now() + timeout;
        let mut state = self.lock();
        loop {
            if state.connected {
                return WaitOutcome::Connected;
            }
            if state.cancelled {
                return WaitOutcome::Cancelled;
            }
            let now = Instant::now();
            if now >= deadline {
                return WaitOutcome::TimedOut;
            }
            state = self
                .inner
                .1
                .wait_timeout(state, deadline - now)
                .unwrap_or_else(|e| e.into_inner())
                .0;
        }
    }

    /// タイムアウト指定が無ければ無期限待機
    pub fn wait(&self, timeout: Option<Duration>) -> WaitOutcome {
        match timeout {
            Some(timeout) => self.wait_connected_timeout(timeout),
            None => self.wait_connected(),
        }
    }
}
