//! Erase planning
//!
//! Covers a byte range with the fewest erase commands by greedily
//! picking, at each position, the largest granularity that is aligned
//! there and fits the remaining length. Mixed granularities are normal:
//! a 72 KiB range on a 4K/64K chip becomes one 64K block plus two 4K
//! sectors.

use crate::chip::EraseBlock;
use crate::error::{Error, Result};
use crate::flash::AddressRange;

/// One erase command in a plan
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EraseStep {
    /// Block start address
    pub addr: u32,
    /// The erase granularity to use
    pub block: &'static EraseBlock,
}

/// Plan the erase commands covering `range` exactly
///
/// Fails with [`Error::MisalignedRange`] if the start is not aligned to
/// the smallest granularity, or if some remainder of the range cannot
/// be covered exactly by any available block size. Validation happens
/// entirely up front; a planning failure issues no commands.
pub fn plan_erase(blocks: &'static [EraseBlock], range: AddressRange) -> Result<Vec<EraseStep>> {
    let misaligned = Error::MisalignedRange {
        start: range.start,
        len: range.len,
    };

    let min_size = blocks.iter().map(|b| b.size).min().ok_or(misaligned)?;
    if !range.start.is_multiple_of(min_size) {
        return Err(misaligned);
    }
    if range.is_empty() {
        return Ok(Vec::new());
    }

    let mut steps = Vec::new();
    let mut addr = range.start;
    // end() fits u32 once the caller has bounds-checked against capacity
    let end = range.end() as u32;

    while addr < end {
        let remaining = end - addr;
        let block = blocks
            .iter()
            .filter(|b| addr.is_multiple_of(b.size) && b.size <= remaining)
            .max_by_key(|b| b.size)
            .ok_or(misaligned)?;

        steps.push(EraseStep { addr, block });
        addr += block.size;
    }

    Ok(steps)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spi::opcodes;
    use core::time::Duration;

    static BLOCKS: [EraseBlock; 3] = [
        EraseBlock::new(4096, opcodes::SE_20, Duration::from_millis(45)),
        EraseBlock::new(32768, opcodes::BE_52, Duration::from_millis(120)),
        EraseBlock::new(65536, opcodes::BE_D8, Duration::from_millis(150)),
    ];

    fn sizes(steps: &[EraseStep]) -> Vec<u32> {
        steps.iter().map(|s| s.block.size).collect()
    }

    #[test]
    fn test_single_sector() {
        let steps = plan_erase(&BLOCKS, AddressRange::new(0x1000, 0x1000)).unwrap();
        assert_eq!(sizes(&steps), vec![4096]);
        assert_eq!(steps[0].addr, 0x1000);
        assert_eq!(steps[0].block.opcode, opcodes::SE_20);
    }

    #[test]
    fn test_prefers_largest_fitting_block() {
        // Two full 64K blocks, no 4K sectors
        let steps = plan_erase(&BLOCKS, AddressRange::new(0x10000, 0x20000)).unwrap();
        assert_eq!(sizes(&steps), vec![65536, 65536]);
        assert_eq!(steps[1].addr, 0x20000);
    }

    #[test]
    fn test_mixed_granularities() {
        // 72 KiB starting at a 64K boundary: 64K + 4K + 4K
        let steps = plan_erase(&BLOCKS, AddressRange::new(0x10000, 0x12000)).unwrap();
        assert_eq!(sizes(&steps), vec![65536, 4096, 4096]);
    }

    #[test]
    fn test_unaligned_start_walks_up_granularities() {
        // Starting at 4K alignment only: 4K sectors until a 32K
        // boundary, then 32K, then 64K blocks
        let steps = plan_erase(&BLOCKS, AddressRange::new(0x7000, 0x39000)).unwrap();
        assert_eq!(sizes(&steps), vec![4096, 32768, 65536, 65536, 65536]);
        let covered: u32 = sizes(&steps).iter().sum();
        assert_eq!(covered, 0x39000);
    }

    #[test]
    fn test_misaligned_start() {
        let err = plan_erase(&BLOCKS, AddressRange::new(0x1001, 0x1000)).unwrap_err();
        assert!(matches!(err, Error::MisalignedRange { start: 0x1001, .. }));
    }

    #[test]
    fn test_uncoverable_remainder() {
        let err = plan_erase(&BLOCKS, AddressRange::new(0, 0x1800)).unwrap_err();
        assert!(matches!(err, Error::MisalignedRange { .. }));
    }

    #[test]
    fn test_empty_range() {
        assert!(plan_erase(&BLOCKS, AddressRange::new(0x2000, 0)).unwrap().is_empty());
    }
}
