//! Transport abstraction
//!
//! The engine drives any byte-duplex SPI master through this trait.
//! Implementations live outside this crate (USB adapters, memory-mapped
//! controllers, the in-memory emulator); the engine only ever exchanges
//! whole command frames bracketed by chip-select.

use crate::error::{Error, Result};
use crate::spi::SpiCommand;

/// A byte-oriented SPI master with chip-select control
///
/// One transport corresponds to one chip-select line, so at most one
/// flash chip. Callers sharing a transport between logical sessions
/// must serialize access themselves; nothing here is re-entrant.
pub trait SpiTransport {
    /// Exchange bytes full duplex
    ///
    /// Clocks out all of `out` and returns the bytes shifted in, which
    /// must be exactly `out.len()` long. Chip-select must already be
    /// asserted.
    fn transceive(&mut self, out: &[u8]) -> Result<Vec<u8>>;

    /// Assert chip-select
    fn select_chip(&mut self) -> Result<()>;

    /// Deassert chip-select
    fn deselect_chip(&mut self) -> Result<()>;

    /// Set the SPI clock rate; called once during session setup with
    /// the chip's safe maximum frequency
    fn configure_clock(&mut self, hz: u32) -> Result<()>;

    /// Busy-wait for the given number of microseconds
    fn delay_us(&mut self, us: u32);
}

/// Execute one command as a chip-select-bracketed duplex exchange
///
/// Returns the response bytes (the last `read_len` bytes of the
/// exchange). Chip-select is deasserted even when the transfer fails,
/// so a fault never leaves the chip half-way through a command.
pub fn execute<T: SpiTransport + ?Sized>(bus: &mut T, cmd: &SpiCommand<'_>) -> Result<Vec<u8>> {
    let frame = cmd.to_frame();

    bus.select_chip()?;
    let exchanged = bus.transceive(&frame);
    bus.deselect_chip()?;

    let response = exchanged?;
    if response.len() < frame.len() {
        return Err(Error::ShortResponse {
            expected: frame.len(),
            got: response.len(),
        });
    }

    Ok(response[frame.len() - cmd.read_len..frame.len()].to_vec())
}
