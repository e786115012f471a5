/// 永続ストレージモジュール
pub mod nvs;

pub use nvs::{init_with_recovery, NvsError, NvsFlash};
