//! sflash-dummy - In-memory flash emulator
//!
//! A [`SpiTransport`] implementation that emulates a SPI NOR flash chip
//! in memory: it decodes command frames at the opcode level, models the
//! write-enable latch and block-protect bits, programs with AND
//! semantics (bits only clear, 1 -> 0), and erases back to 0xFF.
//!
//! Like real silicon, a program or erase aimed at a protected array is
//! silently ignored; a missing write-enable latch, however, is reported
//! as an error since it always indicates an engine bug rather than a
//! chip state.
//!
//! Every frame is recorded in an opcode trace so tests can assert on
//! the exact command sequence a higher layer produced.

use std::fs;
use std::io;
use std::path::PathBuf;

use sflash_core::chip::ChipGeometry;
use sflash_core::error::{Error, Result};
use sflash_core::flash::ERASED_VALUE;
use sflash_core::spi::opcodes;
use sflash_core::transport::SpiTransport;

/// Configuration for the emulated chip
#[derive(Debug, Clone)]
pub struct DummyConfig {
    /// JEDEC manufacturer ID
    pub manufacturer_id: u8,
    /// JEDEC device ID
    pub device_id: u16,
    /// Flash size in bytes
    pub size: usize,
    /// Page size for programming
    pub page_size: usize,
    /// Power up with the block-protect bits set
    pub locked: bool,
    /// Emulate a held WP# pin: protect bits cannot be cleared
    pub write_protect_pin: bool,
}

impl Default for DummyConfig {
    fn default() -> Self {
        Self {
            manufacturer_id: 0xEF, // Winbond
            device_id: 0x4018,     // W25Q128FV
            size: 16 * 1024 * 1024,
            page_size: 256,
            locked: false,
            write_protect_pin: false,
        }
    }
}

impl DummyConfig {
    /// Configuration matching a registry chip
    pub fn for_chip(chip: &ChipGeometry) -> Self {
        Self {
            manufacturer_id: chip.jedec_manufacturer,
            device_id: chip.jedec_device,
            size: chip.total_size as usize,
            page_size: chip.page_size as usize,
            ..Self::default()
        }
    }
}

/// In-memory flash chip emulator
pub struct DummyFlash {
    config: DummyConfig,
    data: Vec<u8>,
    status_reg1: u8,
    selected: bool,
    clock_hz: u32,
    trace: Vec<(u8, usize)>,
    image_path: Option<PathBuf>,
}

impl DummyFlash {
    /// Create a new emulated chip, fully erased
    pub fn new(config: DummyConfig) -> Self {
        let data = vec![ERASED_VALUE; config.size];
        let status_reg1 = if config.locked {
            opcodes::SR1_BP0 | opcodes::SR1_BP1 | opcodes::SR1_BP2
        } else {
            0
        };
        Self {
            config,
            data,
            status_reg1,
            selected: false,
            clock_hz: 0,
            trace: Vec::new(),
            image_path: None,
        }
    }

    /// Create an emulated W25Q128FV
    pub fn new_default() -> Self {
        Self::new(DummyConfig::default())
    }

    /// Create an emulated chip pre-loaded with data
    pub fn with_data(config: DummyConfig, initial_data: &[u8]) -> Self {
        let mut flash = Self::new(config);
        let len = initial_data.len().min(flash.data.len());
        flash.data[..len].copy_from_slice(&initial_data[..len]);
        flash
    }

    /// Create an emulated chip backed by an image file
    ///
    /// Loads the file if it exists (padding to chip size with 0xFF);
    /// [`DummyFlash::save_image`] writes the array back.
    pub fn with_image_file(config: DummyConfig, path: PathBuf) -> io::Result<Self> {
        let mut flash = match fs::read(&path) {
            Ok(contents) => {
                let len = contents.len().min(config.size);
                let mut flash = Self::new(config);
                flash.data[..len].copy_from_slice(&contents[..len]);
                flash
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Self::new(config),
            Err(e) => return Err(e),
        };
        flash.image_path = Some(path);
        Ok(flash)
    }

    /// Write the flash array back to the backing image file, if any
    pub fn save_image(&self) -> io::Result<()> {
        if let Some(path) = &self.image_path {
            fs::write(path, &self.data)?;
            log::debug!("saved {} bytes to {}", self.data.len(), path.display());
        }
        Ok(())
    }

    /// The emulated flash array
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Mutable access to the flash array (out-of-band corruption in tests)
    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Current status register 1 value
    pub fn status1(&self) -> u8 {
        self.status_reg1
    }

    /// The configuration in use
    pub fn config(&self) -> &DummyConfig {
        &self.config
    }

    /// All frames seen so far, as (opcode, frame length) pairs
    pub fn opcode_trace(&self) -> &[(u8, usize)] {
        &self.trace
    }

    /// Forget the recorded frames
    pub fn clear_trace(&mut self) {
        self.trace.clear();
    }

    /// Number of frames carrying the given opcode
    pub fn count_opcode(&self, opcode: u8) -> usize {
        self.trace.iter().filter(|(op, _)| *op == opcode).count()
    }

    /// Frame lengths of all frames carrying the given opcode
    pub fn frame_lens(&self, opcode: u8) -> Vec<usize> {
        self.trace
            .iter()
            .filter(|(op, _)| *op == opcode)
            .map(|(_, len)| *len)
            .collect()
    }

    fn wel(&self) -> bool {
        self.status_reg1 & opcodes::SR1_WEL != 0
    }

    fn clear_wel(&mut self) {
        self.status_reg1 &= !opcodes::SR1_WEL;
    }

    fn protected(&self) -> bool {
        self.status_reg1 & opcodes::SR1_PROTECT_MASK != 0
    }

    fn frame_addr(out: &[u8]) -> u32 {
        ((out[1] as u32) << 16) | ((out[2] as u32) << 8) | out[3] as u32
    }

    fn handle_read(&self, out: &[u8], resp: &mut [u8]) -> Result<()> {
        let addr = Self::frame_addr(out) as usize;
        let len = out.len() - 4;
        if addr + len > self.data.len() {
            return Err(Error::AddressOutOfRange {
                start: addr as u32,
                len: len as u32,
                capacity: self.data.len() as u32,
            });
        }
        resp[4..].copy_from_slice(&self.data[addr..addr + len]);
        Ok(())
    }

    fn handle_page_program(&mut self, out: &[u8]) -> Result<()> {
        if !self.wel() {
            return Err(Error::WriteProtected);
        }
        self.clear_wel();
        if self.protected() {
            log::warn!("page program ignored: array is protected");
            return Ok(());
        }

        let addr = Self::frame_addr(out) as usize;
        let payload = &out[4..];
        if addr >= self.data.len() {
            return Err(Error::AddressOutOfRange {
                start: addr as u32,
                len: payload.len() as u32,
                capacity: self.data.len() as u32,
            });
        }

        // Program wraps within the page, exactly like the silicon: a
        // write crossing the boundary corrupts the start of the page.
        let page = self.config.page_size;
        let page_base = addr - (addr % page);
        for (i, &byte) in payload.iter().enumerate() {
            let idx = page_base + (addr - page_base + i) % page;
            self.data[idx] &= byte;
        }
        Ok(())
    }

    fn handle_block_erase(&mut self, out: &[u8], block_size: usize) -> Result<()> {
        if !self.wel() {
            return Err(Error::WriteProtected);
        }
        self.clear_wel();
        if self.protected() {
            log::warn!("erase ignored: array is protected");
            return Ok(());
        }

        // The chip aligns the address down to the block boundary
        let addr = Self::frame_addr(out) as usize;
        let aligned = addr - (addr % block_size);
        if aligned + block_size > self.data.len() {
            return Err(Error::AddressOutOfRange {
                start: aligned as u32,
                len: block_size as u32,
                capacity: self.data.len() as u32,
            });
        }

        self.data[aligned..aligned + block_size].fill(ERASED_VALUE);
        Ok(())
    }

    fn handle_chip_erase(&mut self) -> Result<()> {
        if !self.wel() {
            return Err(Error::WriteProtected);
        }
        self.clear_wel();
        if self.protected() {
            log::warn!("chip erase ignored: array is protected");
            return Ok(());
        }
        self.data.fill(ERASED_VALUE);
        Ok(())
    }

    fn handle_write_status1(&mut self, out: &[u8]) {
        if !self.wel() {
            // Real chips drop WRSR without the latch; no error
            return;
        }
        let mut new = out.get(1).copied().unwrap_or(0);
        if self.config.write_protect_pin {
            new = (new & !opcodes::SR1_PROTECT_MASK)
                | (self.status_reg1 & opcodes::SR1_PROTECT_MASK);
        }
        self.status_reg1 = new & !(opcodes::SR1_WIP | opcodes::SR1_WEL);
    }
}

impl SpiTransport for DummyFlash {
    fn transceive(&mut self, out: &[u8]) -> Result<Vec<u8>> {
        if !self.selected {
            return Err(Error::SpiTransfer);
        }
        if out.is_empty() {
            return Ok(Vec::new());
        }

        let opcode = out[0];
        self.trace.push((opcode, out.len()));
        let mut resp = vec![0u8; out.len()];

        match opcode {
            // Addressed commands need the full opcode + 3-byte address header
            opcodes::READ | opcodes::PP | opcodes::SE_20 | opcodes::BE_52 | opcodes::BE_D8
                if out.len() < 4 =>
            {
                return Err(Error::SpiTransfer)
            }
            opcodes::RDID => {
                if out.len() >= 4 {
                    resp[1] = self.config.manufacturer_id;
                    resp[2] = (self.config.device_id >> 8) as u8;
                    resp[3] = self.config.device_id as u8;
                }
            }
            opcodes::RDSR => {
                // Status repeats for as long as the master clocks
                for byte in resp[1..].iter_mut() {
                    *byte = self.status_reg1;
                }
            }
            opcodes::WRSR => self.handle_write_status1(out),
            opcodes::WREN => self.status_reg1 |= opcodes::SR1_WEL,
            opcodes::WRDI => self.clear_wel(),
            opcodes::READ => self.handle_read(out, &mut resp)?,
            opcodes::PP => self.handle_page_program(out)?,
            opcodes::SE_20 => self.handle_block_erase(out, 4 * 1024)?,
            opcodes::BE_52 => self.handle_block_erase(out, 32 * 1024)?,
            opcodes::BE_D8 => self.handle_block_erase(out, 64 * 1024)?,
            opcodes::CE_60 | opcodes::CE_C7 => self.handle_chip_erase()?,
            _ => return Err(Error::UnsupportedOpcode(opcode)),
        }

        Ok(resp)
    }

    fn select_chip(&mut self) -> Result<()> {
        self.selected = true;
        Ok(())
    }

    fn deselect_chip(&mut self) -> Result<()> {
        self.selected = false;
        Ok(())
    }

    fn configure_clock(&mut self, hz: u32) -> Result<()> {
        self.clock_hz = hz;
        log::debug!("emulated clock set to {} Hz", hz);
        Ok(())
    }

    fn delay_us(&mut self, _us: u32) {
        // In-memory operations complete instantly
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sflash_core::flash::{AddressRange, NullProgress, ProgressSink};
    use sflash_core::{
        protocol, Error, FlashSession, SessionConfig, VerifyOutcome, VerifyStatus, WriteOptions,
    };

    fn pattern(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i % 251) as u8).collect()
    }

    fn open_session(flash: &mut DummyFlash) -> FlashSession<'_, DummyFlash> {
        let mut session = FlashSession::open(flash, SessionConfig::default()).unwrap();
        session.unlock().unwrap();
        session
    }

    #[test]
    fn test_read_jedec_id() {
        let mut flash = DummyFlash::new_default();
        let id = protocol::read_jedec_id(&mut flash).unwrap();
        assert_eq!(id, [0xEF, 0x40, 0x18]);
    }

    #[test]
    fn test_identify_matches_registry() {
        let mut flash = DummyFlash::new_default();
        let chip = sflash_core::identify(&mut flash).unwrap();
        assert_eq!(chip.name, "W25Q128FV");
        assert_eq!(chip.total_size, 16 * 1024 * 1024);
    }

    #[test]
    fn test_identify_dead_bus() {
        let mut flash = DummyFlash::new(DummyConfig {
            manufacturer_id: 0x00,
            device_id: 0x0000,
            ..DummyConfig::default()
        });
        assert_eq!(
            sflash_core::identify(&mut flash).unwrap_err(),
            Error::NoDeviceResponse { level: 0x00 }
        );

        let mut flash = DummyFlash::new(DummyConfig {
            manufacturer_id: 0xFF,
            device_id: 0xFFFF,
            ..DummyConfig::default()
        });
        assert_eq!(
            sflash_core::identify(&mut flash).unwrap_err(),
            Error::NoDeviceResponse { level: 0xFF }
        );
    }

    #[test]
    fn test_identify_unknown_chip() {
        let mut flash = DummyFlash::new(DummyConfig {
            manufacturer_id: 0xAA,
            device_id: 0x1234,
            ..DummyConfig::default()
        });
        assert_eq!(
            sflash_core::identify(&mut flash).unwrap_err(),
            Error::UnknownChip {
                manufacturer: 0xAA,
                device: 0x1234
            }
        );
    }

    #[test]
    fn test_program_without_wel_rejected() {
        let mut flash = DummyFlash::new_default();
        flash.select_chip().unwrap();
        let frame = [opcodes::PP, 0, 0, 0, 0x42];
        assert_eq!(flash.transceive(&frame).unwrap_err(), Error::WriteProtected);
    }

    #[test]
    fn test_session_round_trip() {
        let mut flash = DummyFlash::new_default();
        let mut session = open_session(&mut flash);

        let data = pattern(1024);
        let result = session
            .write(0x20000, &data, WriteOptions::default(), &mut NullProgress)
            .unwrap();
        assert_eq!(result.bytes, data.len());
        assert_eq!(result.verification, VerifyStatus::Passed);

        let readback = session.read(0x20000, data.len(), &mut NullProgress).unwrap();
        assert_eq!(readback, data);
    }

    #[test]
    fn test_write_auto_erase_scenario() {
        // 16 MiB chip: a 128 KiB write at 0x10000 must become exactly
        // two 64K block erases and 512 page programs of 256 bytes.
        let mut flash = DummyFlash::new_default();
        flash.data_mut()[0x10000..0x30000].fill(0x00);
        flash.data_mut()[0xFFFF] = 0xAB;
        flash.data_mut()[0x30000] = 0xCD;

        let data = pattern(128 * 1024);
        {
            let mut session = open_session(&mut flash);
            session
                .write(0x10000, &data, WriteOptions::default(), &mut NullProgress)
                .unwrap();
        }

        assert_eq!(flash.count_opcode(opcodes::BE_D8), 2);
        assert_eq!(flash.count_opcode(opcodes::SE_20), 0);
        assert_eq!(flash.count_opcode(opcodes::BE_52), 0);
        assert_eq!(flash.count_opcode(opcodes::CE_C7), 0);
        assert_eq!(flash.count_opcode(opcodes::PP), 512);
        assert!(flash
            .frame_lens(opcodes::PP)
            .iter()
            .all(|&len| len == 4 + 256));

        // Neighbors outside the covering erase range are untouched
        assert_eq!(flash.data()[0xFFFF], 0xAB);
        assert_eq!(flash.data()[0x30000], 0xCD);
        assert_eq!(&flash.data()[0x10000..0x30000], &data[..]);
    }

    #[test]
    fn test_page_boundary_split() {
        // 100 bytes at offset 200 must split at the page boundary:
        // 56 bytes, then 44 bytes. One 100-byte program would wrap
        // within the page and corrupt offset 0.
        let mut flash = DummyFlash::new_default();
        let data = pattern(100);
        {
            let mut session = open_session(&mut flash);
            session.program(200, &data, &mut NullProgress).unwrap();
        }

        assert_eq!(flash.frame_lens(opcodes::PP), vec![4 + 56, 4 + 44]);
        assert_eq!(&flash.data()[200..300], &data[..]);
        assert_eq!(flash.data()[0], 0xFF);
    }

    #[test]
    fn test_erase_misaligned() {
        let mut flash = DummyFlash::new_default();
        let mut session = open_session(&mut flash);

        let err = session
            .erase(AddressRange::new(0x1001, 0x1000), &mut NullProgress)
            .unwrap_err();
        assert!(matches!(err, Error::MisalignedRange { start: 0x1001, .. }));
    }

    #[test]
    fn test_erase_idempotent() {
        let mut flash = DummyFlash::new_default();
        flash.data_mut()[0x4000..0x5000].fill(0x5A);
        let mut session = open_session(&mut flash);

        let range = AddressRange::new(0x4000, 0x1000);
        let first = session.erase(range, &mut NullProgress).unwrap();
        let second = session.erase(range, &mut NullProgress).unwrap();
        assert_eq!(first.bytes, 0x1000);
        assert_eq!(second.bytes, 0x1000);

        let readback = session.read(0x4000, 0x1000, &mut NullProgress).unwrap();
        assert!(readback.iter().all(|&b| b == 0xFF));
    }

    #[test]
    fn test_verify_reports_first_mismatch() {
        let mut flash = DummyFlash::new_default();
        let data = pattern(256);
        {
            let mut session = open_session(&mut flash);
            session
                .write(0x8000, &data, WriteOptions::default(), &mut NullProgress)
                .unwrap();
        }

        // Corrupt byte 50 behind the engine's back
        flash.data_mut()[0x8000 + 50] ^= 0xFF;

        let mut session = open_session(&mut flash);
        let outcome = session.verify(0x8000, &data, &mut NullProgress).unwrap();
        assert_eq!(
            outcome,
            VerifyOutcome::Mismatch {
                offset: 50,
                expected: data[50],
                found: data[50] ^ 0xFF,
            }
        );
    }

    #[test]
    fn test_protection_gate() {
        let mut flash = DummyFlash::new(DummyConfig {
            locked: true,
            ..DummyConfig::default()
        });

        let mut session = FlashSession::open(&mut flash, SessionConfig::default()).unwrap();
        let err = session
            .write(0, &pattern(256), WriteOptions::default(), &mut NullProgress)
            .unwrap_err();
        assert_eq!(err, Error::WriteProtected);
        drop(session);

        // Nothing mutating reached the bus, not even a write-enable
        for opcode in [
            opcodes::WREN,
            opcodes::PP,
            opcodes::SE_20,
            opcodes::BE_52,
            opcodes::BE_D8,
            opcodes::CE_C7,
        ] {
            assert_eq!(flash.count_opcode(opcode), 0, "opcode 0x{:02X} issued", opcode);
        }
    }

    #[test]
    fn test_unlock_clears_protection() {
        let mut flash = DummyFlash::new(DummyConfig {
            locked: true,
            ..DummyConfig::default()
        });
        let mut session = FlashSession::open(&mut flash, SessionConfig::default()).unwrap();
        session.unlock().unwrap();
        session
            .write(0, &pattern(512), WriteOptions::default(), &mut NullProgress)
            .unwrap();
        drop(session);
        assert_eq!(flash.status1() & opcodes::SR1_PROTECT_MASK, 0);
    }

    #[test]
    fn test_auto_unlock_config() {
        let mut flash = DummyFlash::new(DummyConfig {
            locked: true,
            ..DummyConfig::default()
        });
        let config = SessionConfig {
            auto_unlock: true,
            ..SessionConfig::default()
        };
        let mut session = FlashSession::open(&mut flash, config).unwrap();
        session
            .write(0, &pattern(512), WriteOptions::default(), &mut NullProgress)
            .unwrap();
    }

    #[test]
    fn test_wp_pin_blocks_unlock() {
        let mut flash = DummyFlash::new(DummyConfig {
            locked: true,
            write_protect_pin: true,
            ..DummyConfig::default()
        });
        let mut session = FlashSession::open(&mut flash, SessionConfig::default()).unwrap();
        assert_eq!(session.unlock().unwrap_err(), Error::WriteProtected);
    }

    #[test]
    fn test_erase_all_uses_chip_erase() {
        let mut flash = DummyFlash::new_default();
        flash.data_mut().fill(0x00);
        {
            let mut session = open_session(&mut flash);
            session.erase_all(&mut NullProgress).unwrap();
        }
        assert_eq!(flash.count_opcode(opcodes::CE_C7), 1);
        assert!(flash.data().iter().all(|&b| b == 0xFF));
    }

    #[test]
    fn test_full_range_erase_is_not_promoted() {
        // A range spanning the whole chip still goes block by block;
        // only erase_all() reaches the chip-erase opcode.
        let capacity = 16 * 1024 * 1024;
        let mut flash = DummyFlash::new_default();
        {
            let mut session = open_session(&mut flash);
            session
                .erase(AddressRange::new(0, capacity), &mut NullProgress)
                .unwrap();
        }
        assert_eq!(flash.count_opcode(opcodes::CE_C7), 0);
        assert_eq!(flash.count_opcode(opcodes::CE_60), 0);
        assert_eq!(flash.count_opcode(opcodes::BE_D8), capacity as usize / 65536);
    }

    #[test]
    fn test_read_out_of_range() {
        let mut flash = DummyFlash::new_default();
        let mut session = FlashSession::open(&mut flash, SessionConfig::default()).unwrap();
        let capacity = session.capacity();
        let err = session
            .read(capacity - 4, 8, &mut NullProgress)
            .unwrap_err();
        assert!(matches!(err, Error::AddressOutOfRange { .. }));
    }

    #[derive(Default)]
    struct CountingSink {
        erase_total: usize,
        program_total: usize,
        program_calls: usize,
        verify_total: usize,
    }

    impl ProgressSink for CountingSink {
        fn erasing(&mut self, total_bytes: usize) {
            self.erase_total = total_bytes;
        }
        fn programming(&mut self, total_bytes: usize) {
            self.program_total = total_bytes;
        }
        fn program_progress(&mut self, _bytes_done: usize) {
            self.program_calls += 1;
        }
        fn verifying(&mut self, total_bytes: usize) {
            self.verify_total = total_bytes;
        }
    }

    #[test]
    fn test_progress_callbacks() {
        let mut flash = DummyFlash::new_default();
        let mut session = open_session(&mut flash);

        let mut sink = CountingSink::default();
        let data = pattern(8192);
        session
            .write(0, &data, WriteOptions::default(), &mut sink)
            .unwrap();

        assert_eq!(sink.erase_total, 8192);
        assert_eq!(sink.program_total, 8192);
        assert_eq!(sink.program_calls, 8192 / 256);
        assert_eq!(sink.verify_total, 8192);
    }

    #[test]
    fn test_image_file_round_trip() {
        let dir = std::env::temp_dir().join("sflash-dummy-test");
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("image.bin");
        let _ = fs::remove_file(&path);

        let data = pattern(4096);
        {
            let mut flash =
                DummyFlash::with_image_file(DummyConfig::default(), path.clone()).unwrap();
            let mut session = open_session(&mut flash);
            session
                .write(0, &data, WriteOptions::default(), &mut NullProgress)
                .unwrap();
            drop(session);
            flash.save_image().unwrap();
        }

        let flash = DummyFlash::with_image_file(DummyConfig::default(), path.clone()).unwrap();
        assert_eq!(&flash.data()[..4096], &data[..]);
        fs::remove_file(&path).unwrap();
    }
}
