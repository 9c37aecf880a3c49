//! Write command implementation

use std::fs;
use std::path::Path;

use sflash_core::{FlashSession, SessionConfig, SpiTransport, VerifyStatus, WriteOptions};

use super::progress::CliProgress;
use super::{format_duration, format_rate, format_size};

/// Run the write command: erase (unless opted out), program, verify
pub fn run_write<T: SpiTransport + ?Sized>(
    bus: &mut T,
    input: &Path,
    address: u32,
    verify: bool,
    erase: bool,
    chunk_size: Option<u32>,
) -> Result<(), Box<dyn std::error::Error>> {
    let data = fs::read(input)?;
    log::info!("read {} bytes from {}", data.len(), input.display());

    let mut config = SessionConfig {
        auto_unlock: true,
        ..SessionConfig::default()
    };
    if let Some(cs) = chunk_size {
        config.chunk_size = cs as usize;
    }

    let mut session = FlashSession::open(bus, config)?;
    let chip = session.geometry();
    println!(
        "Found: {} {} ({})",
        chip.vendor,
        chip.name,
        format_size(chip.total_size as u64)
    );

    if !chip.contains_range(address, data.len()) {
        return Err(format!(
            "file needs {} but only {} remain from 0x{:08X}",
            format_size(data.len() as u64),
            format_size((chip.total_size as u64).saturating_sub(address as u64)),
            address
        )
        .into());
    }

    if !erase {
        println!("Skipping erase; target range must already be erased");
    }

    let opts = WriteOptions {
        auto_erase: erase,
        verify,
    };
    let mut progress = CliProgress::new();
    let result = session.write(address, &data, opts, &mut progress)?;
    progress.finish();

    println!(
        "Wrote {} at 0x{:08X} in {} ({})",
        format_size(result.bytes as u64),
        address,
        format_duration(result.elapsed),
        format_rate(result.bytes as u64, result.elapsed)
    );
    match result.verification {
        VerifyStatus::Passed => println!("Verification passed"),
        VerifyStatus::NotRequested => println!("Verification skipped"),
    }

    Ok(())
}
