//! Info command implementation

use sflash_core::{FlashSession, SessionConfig, SpiTransport};

use super::format_size;

/// Print chip information without mutating anything
pub fn run_info<T: SpiTransport + ?Sized>(bus: &mut T) -> Result<(), Box<dyn std::error::Error>> {
    let session = FlashSession::open(bus, SessionConfig::default())?;
    let chip = session.geometry();

    println!("Flash Chip Information");
    println!("======================");
    println!();
    println!("Vendor:          {}", chip.vendor);
    println!("Name:            {}", chip.name);
    println!(
        "JEDEC ID:        {:02X} {:04X}",
        chip.jedec_manufacturer, chip.jedec_device
    );
    println!(
        "Size:            {} bytes ({})",
        chip.total_size,
        format_size(chip.total_size as u64)
    );
    println!("Page size:       {} bytes", chip.page_size);
    println!(
        "SPI clock:       {:.1} MHz",
        chip.max_clock_hz as f64 / 1e6
    );
    println!();
    println!("Erase blocks:");
    for eb in chip.erase_blocks {
        println!(
            "  Opcode 0x{:02X}: {} (typ. {} ms)",
            eb.opcode,
            format_size(eb.size as u64),
            eb.typical.as_millis()
        );
    }

    Ok(())
}
