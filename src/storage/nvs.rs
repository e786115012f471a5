//! WiFi が使用する NVS (フラッシュ上のキー・バリューストア) の初期化

use log::{info, warn};

/// `nvs_flash_init` の失敗理由
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NvsError {
    #[error("NVSに空きページがありません")]
    NoFreePages,
    #[error("NVSのフォーマットが新しいバージョンです")]
    NewVersionFound,
    #[error("NVSの消去に失敗しました (コード: {0})")]
    EraseFailed(i32),
    #[error("NVSの初期化に失敗しました (コード: {0})")]
    Other(i32),
}

impl NvsError {
    /// 消去して再初期化すれば回復できるか
    pub fn is_recoverable_by_erase(&self) -> bool {
        matches!(self, NvsError::NoFreePages | NvsError::NewVersionFound)
    }
}

/// NVS パーティションの操作
pub trait NvsFlash {
    fn init(&mut self) -> Result<(), NvsError>;
    fn erase(&mut self) -> Result<(), NvsError>;
}

/// 初期化し、互換性が無い/破損している場合は一度だけ消去して再初期化する
pub fn init_with_recovery<F: NvsFlash>(flash: &mut F) -> Result<(), NvsError> {
    match flash.init() {
        Ok(()) => Ok(()),
        Err(e) if e.is_recoverable_by_erase() => {
            warn!("NVSの初期化に失敗しました ({})。消去して再初期化します", e);
            flash.erase()?;
            flash.init()?;
            info!("✓ NVSを消去して再初期化しました");
            Ok(())
        }
        Err(e) => Err(e),
    }
}

#[cfg(target_os = "espidf")]
pub use esp::EspNvsFlash;

#[cfg(target_os = "espidf")]
mod esp {
    use super::{NvsError, NvsFlash};
    use esp_idf_svc::sys::{
        nvs_flash_erase, nvs_flash_init, ESP_ERR_NVS_NEW_VERSION_FOUND, ESP_ERR_NVS_NO_FREE_PAGES,
        ESP_OK,
    };

    /// デフォルト NVS パーティション
    pub struct EspNvsFlash;

    impl NvsFlash for EspNvsFlash {
        fn init(&mut self) -> Result<(), NvsError> {
            let err = unsafe { nvs_flash_init() };
            match err {
                ESP_OK => Ok(()),
                e if e == ESP_ERR_NVS_NO_FREE_PAGES as i32 => Err(NvsError::NoFreePages),
                e if e == ESP_ERR_NVS_NEW_VERSION_FOUND as i32 => Err(NvsError::NewVersionFound),
                e => Err(NvsError::Other(e)),
            }
        }

        fn erase(&mut self) -> Result<(), NvsError> {
            let err = unsafe { nvs_flash_erase() };
            if err == ESP_OK {
                Ok(())
            } else {
                Err(NvsError::EraseFailed(err))
            }
        }
    }
}
