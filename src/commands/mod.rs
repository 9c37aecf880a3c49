//! Command implementations

pub mod erase;
pub mod info;
pub mod progress;
pub mod read;
pub mod write;

use core::time::Duration;

use sflash_core::chip;

/// Format a byte count with binary-unit suffixes
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KiB", "MiB", "GiB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} B", bytes)
    } else {
        format!("{:.2} {}", value, UNITS[unit])
    }
}

/// Format a duration as seconds or min + sec
pub fn format_duration(d: Duration) -> String {
    let secs = d.as_secs_f64();
    if secs < 60.0 {
        format!("{:.2}s", secs)
    } else {
        format!("{}m {:.1}s", (secs / 60.0) as u64, secs % 60.0)
    }
}

/// Throughput string for a completed phase
pub fn format_rate(bytes: u64, elapsed: Duration) -> String {
    let secs = elapsed.as_secs_f64();
    if secs <= 0.0 {
        return "-".to_string();
    }
    format!("{}/s", format_size((bytes as f64 / secs) as u64))
}

/// Print the chip registry as a table
pub fn list_chips() {
    println!("{:<12} {:<14} {:>9} {:>10}  Erase blocks", "Vendor", "Name", "JEDEC ID", "Size");
    for c in chip::chips() {
        let blocks: Vec<String> = c
            .erase_blocks
            .iter()
            .map(|eb| format_size(eb.size as u64))
            .collect();
        println!(
            "{:<12} {:<14} {:02X} {:04X}  {:>10}  {}",
            c.vendor,
            c.name,
            c.jedec_manufacturer,
            c.jedec_device,
            format_size(c.total_size as u64),
            blocks.join(", ")
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(256), "256 B");
        assert_eq!(format_size(4096), "4.00 KiB");
        assert_eq!(format_size(16 * 1024 * 1024), "16.00 MiB");
    }
}
