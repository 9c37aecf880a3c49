//! SPI25 protocol command sequences
//!
//! The common JEDEC flash command sequences, expressed over any
//! [`SpiTransport`]. Each function issues complete commands (bracketed
//! by chip-select inside [`transport::execute`]) and, for mutating
//! commands, polls the busy bit until the chip goes idle or the
//! deadline passes.
//!
//! Typical poll cadences:
//! * Page program: ~100 us
//! * 4KB sector erase: ~5 ms
//! * 32KB/64KB block erase: ~15 ms
//! * Chip erase: ~1 s

use core::time::Duration;
use std::time::Instant;

use crate::error::{Error, Result};
use crate::spi::{opcodes, SpiCommand};
use crate::transport::{self, SpiTransport};

/// Busy-poll deadline as a multiple of the typical operation duration
///
/// Datasheets quote maximums around 4-8x typical; 20x leaves margin for
/// worn parts without hanging forever on a dead chip.
const DEADLINE_FACTOR: u32 = 20;

/// Floor for the poll interval so short operations are not flooded
const MIN_POLL: Duration = Duration::from_micros(100);

/// Read the JEDEC ID from the flash chip
///
/// Returns the raw 3 response bytes: manufacturer, device type,
/// capacity code.
pub fn read_jedec_id<T: SpiTransport + ?Sized>(bus: &mut T) -> Result<[u8; 3]> {
    let cmd = SpiCommand::read_reg(opcodes::RDID, 3);
    let resp = transport::execute(bus, &cmd)?;
    Ok([resp[0], resp[1], resp[2]])
}

/// Read status register 1
pub fn read_status1<T: SpiTransport + ?Sized>(bus: &mut T) -> Result<u8> {
    let cmd = SpiCommand::read_reg(opcodes::RDSR, 1);
    let resp = transport::execute(bus, &cmd)?;
    Ok(resp[0])
}

/// Send the Write Enable command
pub fn write_enable<T: SpiTransport + ?Sized>(bus: &mut T) -> Result<()> {
    transport::execute(bus, &SpiCommand::simple(opcodes::WREN)).map(|_| ())
}

/// Send the Write Disable command
pub fn write_disable<T: SpiTransport + ?Sized>(bus: &mut T) -> Result<()> {
    transport::execute(bus, &SpiCommand::simple(opcodes::WRDI)).map(|_| ())
}

/// Check if a write or erase operation is in progress
pub fn is_busy<T: SpiTransport + ?Sized>(bus: &mut T) -> Result<bool> {
    Ok(read_status1(bus)? & opcodes::SR1_WIP != 0)
}

/// Poll the busy bit until it clears or the deadline passes
///
/// Returns `Ok(true)` when the chip went idle, `Ok(false)` on deadline.
/// Transport errors propagate immediately; the bus state after a failed
/// poll is unknown, so no retry happens here.
pub fn wait_ready<T: SpiTransport + ?Sized>(
    bus: &mut T,
    poll: Duration,
    deadline: Duration,
) -> Result<bool> {
    let start = Instant::now();
    let poll = poll.max(MIN_POLL);

    loop {
        if !is_busy(bus)? {
            return Ok(true);
        }
        if start.elapsed() >= deadline {
            return Ok(false);
        }
        bus.delay_us(poll.as_micros() as u32);
    }
}

/// Write status register 1
///
/// Sends WREN first and waits for the register write to complete.
pub fn write_status1<T: SpiTransport + ?Sized>(bus: &mut T, value: u8) -> Result<()> {
    write_enable(bus)?;
    let data = [value];
    transport::execute(bus, &SpiCommand::write_reg(opcodes::WRSR, &data))?;
    // Status register writes typically take 5-200ms.
    if !wait_ready(bus, Duration::from_millis(10), Duration::from_millis(500))? {
        return Err(Error::CommandTimeout);
    }
    Ok(())
}

/// Read data with a single READ command
///
/// Fills all of `buf` in one chip-select bracket; callers chunk larger
/// reads themselves for progress reporting.
pub fn read_data<T: SpiTransport + ?Sized>(bus: &mut T, addr: u32, buf: &mut [u8]) -> Result<()> {
    let cmd = SpiCommand::read(opcodes::READ, addr, buf.len());
    let resp = transport::execute(bus, &cmd)?;
    buf.copy_from_slice(&resp);
    Ok(())
}

/// Program a single page (up to page_size bytes)
///
/// The data must not cross a page boundary; programs that wrap within a
/// page corrupt data silently, so callers split at boundaries first.
pub fn program_page<T: SpiTransport + ?Sized>(
    bus: &mut T,
    addr: u32,
    data: &[u8],
    typical: Duration,
) -> Result<()> {
    write_enable(bus)?;
    transport::execute(bus, &SpiCommand::write(opcodes::PP, addr, data))?;

    let poll = typical / 8;
    if !wait_ready(bus, poll, typical * DEADLINE_FACTOR)? {
        return Err(Error::ProgramTimeout { addr });
    }
    Ok(())
}

/// Erase one block at the given address
///
/// The address must be aligned to the block size for `opcode`; the chip
/// silently aligns it down otherwise.
pub fn erase_block<T: SpiTransport + ?Sized>(
    bus: &mut T,
    opcode: u8,
    addr: u32,
    typical: Duration,
) -> Result<()> {
    write_enable(bus)?;
    transport::execute(bus, &SpiCommand::erase(opcode, addr))?;

    let poll = typical / 8;
    if !wait_ready(bus, poll, typical * DEADLINE_FACTOR)? {
        return Err(Error::EraseTimeout { addr });
    }
    Ok(())
}

/// Erase the entire chip
pub fn chip_erase<T: SpiTransport + ?Sized>(bus: &mut T, typical: Duration) -> Result<()> {
    write_enable(bus)?;
    transport::execute(bus, &SpiCommand::simple(opcodes::CE_C7))?;

    let poll = Duration::from_secs(1).min(typical / 8);
    if !wait_ready(bus, poll, typical * DEADLINE_FACTOR)? {
        return Err(Error::EraseTimeout { addr: 0 });
    }
    Ok(())
}
