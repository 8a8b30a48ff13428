use super::util::Result;

pub fn readable_size(bytes: usize) -> (f64, &'static str) {
    let units: Vec<(f64, &'static str)> = vec![
        (1.0, "B"),
        (1024.0, "KiB"),
        (1024.0 * 1024.0, "MiB"),
        (1024.0 * 1024.0 * 1024.0, "GiB"),
        (1024.0 * 1024.0 * 1024.0 * 1024.0, "TiB"),
    ];

    let value = bytes as f64;
    let mut unit = units[0];
    for next in units.iter().skip(1) {
        if value >= next.0 {
            unit = *next;
        } else {
            break;
        }
    }

    (value / unit.0, unit.1)
}

/// Peak resident set size in bytes, from the `VmHWM` line of `/proc/self/status`.
#[cfg(target_os = "linux")]
pub fn peak_memory_usage() -> Result<usize> {
    let status = std::fs::read_to_string("/proc/self/status")?;
    let kib = status
        .lines()
        .find_map(|line| line.strip_prefix("VmHWM:"))
        .and_then(|rest| rest.trim().strip_suffix("kB"))
        .ok_or_else(|| crate::rsidx_error!("VmHWM not reported in /proc/self/status"))?
        .trim()
        .parse::<usize>()?;
    Ok(kib * 1024)
}

#[cfg(target_os = "macos")]
pub fn peak_memory_usage() -> Result<usize> {
    unsafe {
        let mut rusage: libc::rusage = std::mem::zeroed();
        let retval = libc::getrusage(libc::RUSAGE_SELF, &mut rusage as *mut _);
        match retval {
            0 => Ok(rusage.ru_maxrss as usize),
            _ => Err(crate::rsidx_error!("libc::getrusage call failed")),
        }
    }
}

#[cfg(not(any(target_os = "linux", target_os = "macos")))]
pub fn peak_memory_usage() -> Result<usize> {
    Err(crate::rsidx_error!(
        "No peak_memory_usage implementation for this OS"
    ))
}
