use std::thread;
use std::time::Duration;

/// Block the calling thread for `ms` milliseconds. Zero returns immediately.
pub fn sleep_ms(ms: u64) {
    if ms == 0 {
        return;
    }
    thread::sleep(Duration::from_millis(ms));
}

/// Sleep for `secs` seconds, clamped at zero.
pub fn sleep_secs(secs: f64) {
    if secs.is_finite() && secs > 0.0 {
        thread::sleep(Duration::from_secs_f64(secs));
    }
}
