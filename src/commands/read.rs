//! Read command implementation

use std::fs;
use std::path::Path;
use std::time::Instant;

use sflash_core::{FlashSession, SessionConfig, SpiTransport};

use super::progress::CliProgress;
use super::{format_duration, format_rate, format_size};

/// Run the read command: dump a range of flash to a file
pub fn run_read<T: SpiTransport + ?Sized>(
    bus: &mut T,
    output: &Path,
    address: u32,
    length: Option<u32>,
    force: bool,
    chunk_size: Option<u32>,
) -> Result<(), Box<dyn std::error::Error>> {
    if output.exists() && !force {
        return Err(format!(
            "output file {} exists, pass --force to overwrite",
            output.display()
        )
        .into());
    }

    let mut config = SessionConfig::default();
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

    let length = match length {
        Some(len) => len,
        None => chip.total_size.saturating_sub(address),
    };

    let start = Instant::now();
    let mut progress = CliProgress::new();
    let data = session.read(address, length as usize, &mut progress)?;
    progress.finish();
    let elapsed = start.elapsed();

    fs::write(output, &data)?;
    println!(
        "Read {} from 0x{:08X} to {} in {} ({})",
        format_size(data.len() as u64),
        address,
        output.display(),
        format_duration(elapsed),
        format_rate(data.len() as u64, elapsed)
    );

    Ok(())
}
