use esp_idf_svc::sys::{heap_caps_get_free_size, heap_caps_get_total_size, MALLOC_CAP_SPIRAM};

/// PSRAM の容量 (バイト)。未搭載または無効なら 0
pub fn psram_size() -> usize {
    unsafe { heap_caps_get_total_size(MALLOC_CAP_SPIRAM) }
}

pub fn psram_free() -> usize {
    unsafe { heap_caps_get_free_size(MALLOC_CAP_SPIRAM) }
}
