/// WiFi ステーションのイベント処理
pub mod station;

pub use station::{StationDriver, StationEvent, StationEventHandler};
