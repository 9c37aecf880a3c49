//! Erase command implementation

use sflash_core::flash::AddressRange;
use sflash_core::{FlashSession, SessionConfig, SpiTransport};

use super::progress::CliProgress;
use super::{format_duration, format_size};

/// Run the erase command: a block-aligned range, or --all for the chip
pub fn run_erase<T: SpiTransport + ?Sized>(
    bus: &mut T,
    start: Option<u32>,
    length: Option<u32>,
    all: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = SessionConfig {
        auto_unlock: true,
        ..SessionConfig::default()
    };
    let mut session = FlashSession::open(bus, config)?;
    let chip = session.geometry();
    println!(
        "Found: {} {} ({})",
        chip.vendor,
        chip.name,
        format_size(chip.total_size as u64)
    );

    let mut progress = CliProgress::new();
    let result = if all {
        println!("Erasing entire chip...");
        session.erase_all(&mut progress)?
    } else {
        let (start, length) = match (start, length) {
            (Some(s), Some(l)) => (s, l),
            _ => return Err("--start and --length are both required (or use --all)".into()),
        };
        session.erase(AddressRange::new(start, length), &mut progress)?
    };
    progress.finish();

    println!(
        "Erased {} in {}",
        format_size(result.bytes as u64),
        format_duration(result.elapsed)
    );

    Ok(())
}
