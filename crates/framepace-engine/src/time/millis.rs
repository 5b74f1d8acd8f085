/// Milliseconds on the system millisecond timer, wrapping at 32 bits.
///
/// On Windows this is `timeGetTime`, the timer the replaced routine reports
/// on. Elsewhere it counts from a process-wide epoch taken on first use.
pub fn system_millis() -> i32 {
    os::millis() as i32
}

#[cfg(windows)]
mod os {
    use windows_sys::Win32::Media::timeGetTime;

    pub(super) fn millis() -> u32 {
        // SAFETY: plain Win32 call without arguments.
        unsafe { timeGetTime() }
    }
}

#[cfg(not(windows))]
mod os {
    use std::sync::OnceLock;
    use std::time::Instant;

    static EPOCH: OnceLock<Instant> = OnceLock::new();

    pub(super) fn millis() -> u32 {
        let epoch = EPOCH.get_or_init(Instant::now);
        // Truncation wraps like the 32-bit system timer.
        epoch.elapsed().as_millis() as u32
    }
}
