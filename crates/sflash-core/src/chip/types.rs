//! Flash chip type definitions

use core::time::Duration;

use bitflags::bitflags;

bitflags! {
    /// Feature flags for flash chips
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Features: u32 {
        /// Supports the Fast Read opcode (0x0B)
        const FAST_READ       = 1 << 0;
        /// Has a second status register
        const STATUS_REG_2    = 1 << 1;
        /// Supports deep power down
        const DEEP_POWER_DOWN = 1 << 2;
        /// Supports the whole-chip erase opcode
        const CHIP_ERASE      = 1 << 3;
    }
}

/// One erase granularity supported by a chip
///
/// Larger blocks erase faster per byte but must fit the requested range
/// exactly; the planner picks among these greedily.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EraseBlock {
    /// Block size in bytes; erase commands must be aligned to this
    pub size: u32,
    /// SPI opcode for this erase operation
    pub opcode: u8,
    /// Typical erase duration from the datasheet; the busy-poll
    /// deadline is derived from this
    pub typical: Duration,
}

impl EraseBlock {
    /// Create a new erase block definition
    pub const fn new(size: u32, opcode: u8, typical: Duration) -> Self {
        Self {
            size,
            opcode,
            typical,
        }
    }
}

/// Flash chip definition
///
/// All the information needed to identify and drive a specific chip
/// model. Entries are static records in the registry; geometry never
/// changes at runtime.
#[derive(Debug, Clone, Copy)]
pub struct ChipGeometry {
    /// Vendor name (e.g., "Winbond")
    pub vendor: &'static str,
    /// Chip model name (e.g., "W25Q128FV")
    pub name: &'static str,
    /// JEDEC manufacturer ID (first byte of RDID response)
    pub jedec_manufacturer: u8,
    /// JEDEC device ID (second and third bytes of RDID response)
    pub jedec_device: u16,
    /// Total flash size in bytes
    pub total_size: u32,
    /// Page size in bytes (maximum single program operation)
    pub page_size: u16,
    /// Safe maximum SPI clock frequency in Hz
    pub max_clock_hz: u32,
    /// Feature flags
    pub features: Features,
    /// Supported erase granularities, smallest to largest
    pub erase_blocks: &'static [EraseBlock],
    /// Typical whole-chip erase duration
    pub chip_erase_typical: Duration,
    /// Typical page program duration
    pub page_program_typical: Duration,
}

impl ChipGeometry {
    /// Get the JEDEC ID as a 24-bit value (manufacturer << 16 | device)
    pub fn jedec_id(&self) -> u32 {
        ((self.jedec_manufacturer as u32) << 16) | (self.jedec_device as u32)
    }

    /// Check if this chip matches the given JEDEC ID
    pub fn matches_jedec_id(&self, manufacturer: u8, device: u16) -> bool {
        self.jedec_manufacturer == manufacturer && self.jedec_device == device
    }

    /// Smallest supported erase block size
    ///
    /// Registry entries always carry at least one erase block.
    pub fn min_erase_size(&self) -> u32 {
        self.erase_blocks
            .iter()
            .map(|eb| eb.size)
            .min()
            .unwrap_or(self.total_size)
    }

    /// Largest supported erase block size
    pub fn max_erase_size(&self) -> u32 {
        self.erase_blocks
            .iter()
            .map(|eb| eb.size)
            .max()
            .unwrap_or(self.total_size)
    }

    /// Find the erase block definition for an exact size
    pub fn erase_block_for_size(&self, size: u32) -> Option<&'static EraseBlock> {
        self.erase_blocks.iter().find(|eb| eb.size == size)
    }

    /// Check that a range lies within the chip's address space
    pub fn contains_range(&self, addr: u32, len: usize) -> bool {
        let end = addr as u64 + len as u64;
        end <= self.total_size as u64
    }
}

/// JEDEC manufacturer IDs
pub mod manufacturer {
    /// EON
    pub const EON: u8 = 0x1C;
    /// GigaDevice
    pub const GIGADEVICE: u8 = 0xC8;
    /// ISSI
    pub const ISSI: u8 = 0x9D;
    /// Macronix
    pub const MACRONIX: u8 = 0xC2;
    /// Micron (also ST)
    pub const MICRON: u8 = 0x20;
    /// Winbond
    pub const WINBOND: u8 = 0xEF;
}
