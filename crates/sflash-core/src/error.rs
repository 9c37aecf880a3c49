//! Error types for sflash-core

/// Core error type
///
/// Alignment and range errors are raised before any chip-mutating
/// command is issued. Timeout errors leave the chip in an indeterminate
/// state; a timed-out program may have partially written a page, so the
/// caller must re-erase before retrying.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// JEDEC ID read returned all-0x00 or all-0xFF (no chip, or dead bus)
    #[error("no response from flash chip (bus reads back 0x{level:02X})")]
    NoDeviceResponse {
        /// The byte level the bus was stuck at
        level: u8,
    },

    /// Chip responded but its JEDEC ID is not in the registry
    #[error("unknown flash chip: JEDEC id {manufacturer:02X} {device:04X}")]
    UnknownChip {
        /// JEDEC manufacturer ID
        manufacturer: u8,
        /// JEDEC device ID (device type and capacity bytes)
        device: u16,
    },

    /// SPI transfer failed at the transport level
    #[error("SPI transfer failed")]
    SpiTransfer,

    /// Transport returned fewer bytes than the duplex exchange clocked out
    #[error("short SPI response: expected {expected} bytes, got {got}")]
    ShortResponse {
        /// Bytes clocked out
        expected: usize,
        /// Bytes received
        got: usize,
    },

    /// Opcode not implemented by the transport or emulator
    #[error("opcode 0x{0:02X} not supported")]
    UnsupportedOpcode(u8),

    /// Mutating operation attempted while the chip is protected
    #[error("flash chip is write protected")]
    WriteProtected,

    /// Erase range not coverable by the chip's erase granularities
    #[error("range 0x{start:08X}+0x{len:X} is not aligned to an erase granularity")]
    MisalignedRange {
        /// Range start offset
        start: u32,
        /// Range length in bytes
        len: u32,
    },

    /// Address range extends past the end of the chip
    #[error("range 0x{start:08X}+0x{len:X} exceeds chip capacity of {capacity} bytes")]
    AddressOutOfRange {
        /// Range start offset
        start: u32,
        /// Range length in bytes
        len: u32,
        /// Chip capacity in bytes
        capacity: u32,
    },

    /// Block erase did not complete within its deadline
    #[error("erase timed out at 0x{addr:08X}")]
    EraseTimeout {
        /// Address of the block being erased
        addr: u32,
    },

    /// Page program did not complete within its deadline
    #[error("program timed out at 0x{addr:08X}")]
    ProgramTimeout {
        /// Address of the page being programmed
        addr: u32,
    },

    /// Status register write stayed busy past its deadline
    #[error("status register write timed out")]
    CommandTimeout,

    /// Readback comparison found a mismatch
    #[error("verify failed at offset 0x{offset:X}: expected 0x{expected:02X}, found 0x{found:02X}")]
    VerifyFailed {
        /// Offset of the first mismatch, relative to the verified range
        offset: u32,
        /// Byte that was written
        expected: u8,
        /// Byte that was read back
        found: u8,
    },
}

/// Result type alias using the core error type
pub type Result<T> = core::result::Result<T, Error>;
