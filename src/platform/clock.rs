use env_sensors::MonotonicClock;
use esp_idf_svc::sys;

/// 起動からの経過時間（esp_timer）
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl MonotonicClock for SystemClock {
    fn now_ms(&self) -> u64 {
        // esp_timer はマイクロ秒単位で、起動後は負にならない
        let us = unsafe { sys::esp_timer_get_time() };
        (us.max(0) as u64) / 1000
    }
}
