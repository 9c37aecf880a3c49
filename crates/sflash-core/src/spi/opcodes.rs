//! Standard JEDEC SPI flash opcodes
//!
//! The subset of JESD216 / common-convention commands this engine
//! issues, plus the status register bits it inspects.

// ============================================================================
// Write control
// ============================================================================

/// Write Enable - required before any write/erase operation
pub const WREN: u8 = 0x06;
/// Write Disable - clears WEL bit in status register
pub const WRDI: u8 = 0x04;

// ============================================================================
// Status register operations
// ============================================================================

/// Read Status Register 1
pub const RDSR: u8 = 0x05;
/// Write Status Register 1
pub const WRSR: u8 = 0x01;

// ============================================================================
// Identification
// ============================================================================

/// Read JEDEC ID (manufacturer + device ID)
pub const RDID: u8 = 0x9F;

// ============================================================================
// Read commands
// ============================================================================

/// Read Data (up to ~33 MHz)
pub const READ: u8 = 0x03;

// ============================================================================
// Page Program
// ============================================================================

/// Page Program with 3-byte address
pub const PP: u8 = 0x02;

// ============================================================================
// Erase commands
// ============================================================================

/// Sector Erase 4KB
pub const SE_20: u8 = 0x20;
/// Block Erase 32KB
pub const BE_52: u8 = 0x52;
/// Block Erase 64KB
pub const BE_D8: u8 = 0xD8;
/// Chip Erase (entire chip)
pub const CE_60: u8 = 0x60;
/// Chip Erase (alternate opcode)
pub const CE_C7: u8 = 0xC7;

// ============================================================================
// Status register bit definitions
// ============================================================================

/// Status Register 1: Write In Progress / Busy
pub const SR1_WIP: u8 = 0x01;
/// Status Register 1: Write Enable Latch
pub const SR1_WEL: u8 = 0x02;
/// Status Register 1: Block Protect bit 0
pub const SR1_BP0: u8 = 0x04;
/// Status Register 1: Block Protect bit 1
pub const SR1_BP1: u8 = 0x08;
/// Status Register 1: Block Protect bit 2
pub const SR1_BP2: u8 = 0x10;
/// Status Register 1: Top/Bottom Protect
pub const SR1_TB: u8 = 0x20;
/// Status Register 1: Sector/Block Protect
pub const SR1_SEC: u8 = 0x40;
/// Status Register 1: Status Register Protect 0
pub const SR1_SRP0: u8 = 0x80;

/// All block-protection bits in status register 1
pub const SR1_PROTECT_MASK: u8 = SR1_BP0 | SR1_BP1 | SR1_BP2 | SR1_TB | SR1_SEC;
