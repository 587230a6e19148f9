// src/collect/system.rs

//! Facts about the worker host, read fresh on every call.

use std::path::Path;

use crate::fs::FileSystem;

const UNAVAILABLE: &str = "N/A";

/// Number of CPUs this process may use.
pub fn cpu_count() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

/// Operating system family, spelled the way benchmark reports show it.
pub fn worker_os() -> String {
    match std::env::consts::OS {
        "linux" => "Linux".to_string(),
        "macos" => "macOS".to_string(),
        "windows" => "Windows".to_string(),
        other => other.to_string(),
    }
}

/// Total physical memory, e.g. `"15.55 GB"`.
pub fn memory(fs: &dyn FileSystem) -> String {
    fs.read_to_string(Path::new("/proc/meminfo"))
        .ok()
        .and_then(|s| parse_meminfo_total_kb(&s))
        .map(|kb| format_bytes(kb * 1024))
        .unwrap_or_else(|| UNAVAILABLE.to_string())
}

/// CPU model string, e.g. `"Intel(R) Xeon(R) CPU E5-2680 v4 @ 2.40GHz"`.
pub fn cpu_speed(fs: &dyn FileSystem) -> String {
    fs.read_to_string(Path::new("/proc/cpuinfo"))
        .ok()
        .and_then(|s| parse_cpu_model(&s))
        .unwrap_or_else(|| UNAVAILABLE.to_string())
}

fn parse_meminfo_total_kb(meminfo: &str) -> Option<u64> {
    meminfo
        .lines()
        .find_map(|line| line.strip_prefix("MemTotal:"))
        .and_then(|rest| rest.split_whitespace().next())
        .and_then(|kb| kb.parse().ok())
}

fn parse_cpu_model(cpuinfo: &str) -> Option<String> {
    cpuinfo.lines().find_map(|line| {
        let (key, value) = line.split_once(':')?;
        let key = key.trim();
        // x86 uses "model name"; some ARM kernels only expose "Processor".
        if key == "model name" || key == "Processor" {
            let value = value.trim();
            (!value.is_empty()).then(|| value.to_string())
        } else {
            None
        }
    })
}

fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{value:.2} {}", UNITS[unit])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::mock::MockFileSystem;

    #[test]
    fn memory_is_read_from_meminfo() {
        let fs = MockFileSystem::new();
        fs.add_file(
            "/proc/meminfo",
            "MemTotal:       16305736 kB\nMemFree:         1000000 kB\n",
        );
        assert_eq!(memory(&fs), "15.55 GB");
    }

    #[test]
    fn cpu_model_is_read_from_cpuinfo() {
        let fs = MockFileSystem::new();
        fs.add_file(
            "/proc/cpuinfo",
            "processor\t: 0\nvendor_id\t: GenuineIntel\nmodel name\t: Intel(R) Core(TM) i7-7700 CPU @ 3.60GHz\n",
        );
        assert_eq!(cpu_speed(&fs), "Intel(R) Core(TM) i7-7700 CPU @ 3.60GHz");
    }

    #[test]
    fn missing_proc_files_are_reported_unavailable() {
        let fs = MockFileSystem::new();
        assert_eq!(memory(&fs), "N/A");
        assert_eq!(cpu_speed(&fs), "N/A");
    }

    #[test]
    fn format_bytes_picks_largest_unit() {
        assert_eq!(format_bytes(512), "512.00 B");
        assert_eq!(format_bytes(2048), "2.00 KB");
        assert_eq!(format_bytes(3 * 1024 * 1024 * 1024), "3.00 GB");
    }

    #[test]
    fn cpu_count_is_positive() {
        assert!(cpu_count() >= 1);
    }
}
