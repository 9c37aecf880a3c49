//! Static registry of known flash chips
//!
//! Chips are matched by exact (manufacturer, device) JEDEC ID. Typical
//! operation durations come from the vendor datasheets and drive the
//! busy-poll deadlines.
//!
//! Only 3-byte-address parts (up to 16 MiB) are listed; SST parts using
//! AAI word programming are deliberately absent since the engine only
//! speaks page program.

use core::time::Duration;

use super::types::{manufacturer, ChipGeometry, EraseBlock, Features};
use crate::spi::opcodes;

/// The common 4K/32K/64K uniform-sector layout
static UNIFORM_4K_32K_64K: [EraseBlock; 3] = [
    EraseBlock::new(4 * 1024, opcodes::SE_20, Duration::from_millis(45)),
    EraseBlock::new(32 * 1024, opcodes::BE_52, Duration::from_millis(120)),
    EraseBlock::new(64 * 1024, opcodes::BE_D8, Duration::from_millis(150)),
];

/// Parts without a 32K block erase (Micron N25Q family)
static UNIFORM_4K_64K: [EraseBlock; 2] = [
    EraseBlock::new(4 * 1024, opcodes::SE_20, Duration::from_millis(50)),
    EraseBlock::new(64 * 1024, opcodes::BE_D8, Duration::from_millis(250)),
];

const MIB: u32 = 1024 * 1024;

macro_rules! chip {
    ($vendor:expr, $name:expr, $mfr:expr, $dev:expr, $size:expr, $clock:expr,
     $blocks:expr, $chip_erase_s:expr) => {
        ChipGeometry {
            vendor: $vendor,
            name: $name,
            jedec_manufacturer: $mfr,
            jedec_device: $dev,
            total_size: $size,
            page_size: 256,
            max_clock_hz: $clock,
            features: Features::FAST_READ
                .union(Features::STATUS_REG_2)
                .union(Features::CHIP_ERASE),
            erase_blocks: $blocks,
            chip_erase_typical: Duration::from_secs($chip_erase_s),
            page_program_typical: Duration::from_millis(3),
        }
    };
}

/// All chips known to the engine
static CHIPS: &[ChipGeometry] = &[
    // Winbond
    chip!("Winbond", "W25Q16FV", manufacturer::WINBOND, 0x4015, 2 * MIB, 50_000_000, &UNIFORM_4K_32K_64K, 5),
    chip!("Winbond", "W25Q32FV", manufacturer::WINBOND, 0x4016, 4 * MIB, 50_000_000, &UNIFORM_4K_32K_64K, 10),
    chip!("Winbond", "W25Q64FV", manufacturer::WINBOND, 0x4017, 8 * MIB, 50_000_000, &UNIFORM_4K_32K_64K, 20),
    chip!("Winbond", "W25Q128FV", manufacturer::WINBOND, 0x4018, 16 * MIB, 50_000_000, &UNIFORM_4K_32K_64K, 40),
    // Macronix
    chip!("Macronix", "MX25L3205D", manufacturer::MACRONIX, 0x2016, 4 * MIB, 33_000_000, &UNIFORM_4K_32K_64K, 12),
    chip!("Macronix", "MX25L6405D", manufacturer::MACRONIX, 0x2017, 8 * MIB, 33_000_000, &UNIFORM_4K_32K_64K, 25),
    chip!("Macronix", "MX25L12805D", manufacturer::MACRONIX, 0x2018, 16 * MIB, 33_000_000, &UNIFORM_4K_32K_64K, 50),
    // GigaDevice
    chip!("GigaDevice", "GD25Q32", manufacturer::GIGADEVICE, 0x4016, 4 * MIB, 33_000_000, &UNIFORM_4K_32K_64K, 10),
    chip!("GigaDevice", "GD25Q64", manufacturer::GIGADEVICE, 0x4017, 8 * MIB, 33_000_000, &UNIFORM_4K_32K_64K, 20),
    chip!("GigaDevice", "GD25Q128", manufacturer::GIGADEVICE, 0x4018, 16 * MIB, 33_000_000, &UNIFORM_4K_32K_64K, 40),
    // Micron
    chip!("Micron", "N25Q032A", manufacturer::MICRON, 0xBA16, 4 * MIB, 54_000_000, &UNIFORM_4K_64K, 15),
    chip!("Micron", "N25Q064A", manufacturer::MICRON, 0xBA17, 8 * MIB, 54_000_000, &UNIFORM_4K_64K, 30),
    chip!("Micron", "N25Q128A", manufacturer::MICRON, 0xBA18, 16 * MIB, 54_000_000, &UNIFORM_4K_64K, 60),
    // EON
    chip!("EON", "EN25Q32", manufacturer::EON, 0x3016, 4 * MIB, 33_000_000, &UNIFORM_4K_32K_64K, 10),
    chip!("EON", "EN25Q64", manufacturer::EON, 0x3017, 8 * MIB, 33_000_000, &UNIFORM_4K_32K_64K, 20),
    // ISSI
    chip!("ISSI", "IS25LP064", manufacturer::ISSI, 0x6017, 8 * MIB, 50_000_000, &UNIFORM_4K_32K_64K, 25),
];

/// All registry entries
pub fn chips() -> &'static [ChipGeometry] {
    CHIPS
}

/// Find a chip by its exact JEDEC ID
pub fn find_by_jedec_id(manufacturer: u8, device: u16) -> Option<&'static ChipGeometry> {
    CHIPS
        .iter()
        .find(|c| c.matches_jedec_id(manufacturer, device))
}

/// Find a chip by model name (case-insensitive exact match)
pub fn find_by_name(name: &str) -> Option<&'static ChipGeometry> {
    CHIPS.iter().find(|c| c.name.eq_ignore_ascii_case(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_by_jedec_id() {
        let chip = find_by_jedec_id(0xEF, 0x4018).unwrap();
        assert_eq!(chip.name, "W25Q128FV");
        assert_eq!(chip.vendor, "Winbond");
        assert_eq!(chip.total_size, 16 * 1024 * 1024);
        assert_eq!(chip.page_size, 256);
        assert_eq!(chip.min_erase_size(), 4096);
        assert_eq!(chip.max_erase_size(), 65536);
    }

    #[test]
    fn test_unknown_id_is_none() {
        assert!(find_by_jedec_id(0xEF, 0xFFFF).is_none());
        assert!(find_by_jedec_id(0x00, 0x0000).is_none());
    }

    #[test]
    fn test_find_by_name() {
        let chip = find_by_name("w25q64fv").unwrap();
        assert_eq!(chip.jedec_device, 0x4017);
        assert!(find_by_name("XY99").is_none());
    }

    #[test]
    fn test_registry_invariants() {
        for chip in chips() {
            assert!(!chip.erase_blocks.is_empty(), "{} has no erase blocks", chip.name);
            assert!(chip.total_size.is_multiple_of(chip.max_erase_size()));
            for eb in chip.erase_blocks {
                assert!(eb.size.is_multiple_of(chip.min_erase_size()));
            }
            assert!(chip.total_size <= 16 * 1024 * 1024, "{} needs 4-byte addressing", chip.name);
        }
    }
}
