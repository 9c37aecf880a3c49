//! Flash session orchestration

use core::time::Duration;
use std::time::Instant;

use crate::chip::{registry, ChipGeometry};
use crate::error::{Error, Result};
use crate::flash::{plan_erase, AddressRange, ProgressSink};
use crate::protocol;
use crate::spi::opcodes;
use crate::transport::SpiTransport;

/// Identify the attached flash chip
///
/// Sends the JEDEC ID command and matches the response against the
/// static chip registry. A bus stuck at all-zeros or all-ones means no
/// chip is answering at all, which is reported separately from an
/// unrecognized ID.
pub fn identify<T: SpiTransport + ?Sized>(bus: &mut T) -> Result<&'static ChipGeometry> {
    let id = protocol::read_jedec_id(bus)?;

    if id.iter().all(|&b| b == 0xFF) || id.iter().all(|&b| b == 0x00) {
        return Err(Error::NoDeviceResponse { level: id[0] });
    }

    let manufacturer = id[0];
    let device = ((id[1] as u16) << 8) | id[2] as u16;
    log::debug!("JEDEC id: {:02X} {:04X}", manufacturer, device);

    registry::find_by_jedec_id(manufacturer, device).ok_or(Error::UnknownChip {
        manufacturer,
        device,
    })
}

/// Session configuration
#[derive(Debug, Clone, Copy)]
pub struct SessionConfig {
    /// Chunk size for read and verify operations; bounds temporary
    /// buffers and sets the progress-callback cadence
    pub chunk_size: usize,
    /// Unlock automatically on the first mutating operation instead of
    /// failing with `WriteProtected`
    pub auto_unlock: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            chunk_size: 4096,
            auto_unlock: false,
        }
    }
}

/// Options for [`FlashSession::write`]
///
/// Both default to on; skipping the erase or the verification is an
/// explicit caller opt-out.
#[derive(Debug, Clone, Copy)]
pub struct WriteOptions {
    /// Erase the covering block range before programming
    pub auto_erase: bool,
    /// Read back and compare after programming
    pub verify: bool,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            auto_erase: true,
            verify: true,
        }
    }
}

/// Verification status carried in an [`OperationResult`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifyStatus {
    /// Verification was not requested
    NotRequested,
    /// Readback matched the written data
    Passed,
}

/// Outcome of a standalone verify
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifyOutcome {
    /// All bytes matched
    Pass,
    /// First mismatching byte
    Mismatch {
        /// Offset of the mismatch, relative to the verified range start
        offset: u32,
        /// Byte expected at that offset
        expected: u8,
        /// Byte actually read
        found: u8,
    },
}

/// Outcome of a completed erase/program/write operation
#[derive(Debug, Clone, Copy)]
pub struct OperationResult {
    /// Bytes erased, programmed, or written
    pub bytes: usize,
    /// Wall-clock duration of the operation
    pub elapsed: Duration,
    /// Verification status (writes only; otherwise `NotRequested`)
    pub verification: VerifyStatus,
}

/// An open session against one identified flash chip
///
/// The session borrows the transport for its whole lifetime, so the
/// transport outlives it and at most one session drives a chip-select
/// at a time. No state is buffered between calls; each operation is
/// self-contained over the range it targets.
pub struct FlashSession<'t, T: SpiTransport + ?Sized> {
    bus: &'t mut T,
    chip: &'static ChipGeometry,
    unlocked: bool,
    config: SessionConfig,
}

impl<'t, T: SpiTransport + ?Sized> FlashSession<'t, T> {
    /// Identify the chip and open a session
    ///
    /// Configures the transport clock to the chip's safe maximum.
    pub fn open(bus: &'t mut T, config: SessionConfig) -> Result<Self> {
        let chip = identify(bus)?;
        bus.configure_clock(chip.max_clock_hz)?;
        log::info!(
            "found {} {} ({} bytes)",
            chip.vendor,
            chip.name,
            chip.total_size
        );
        Ok(Self {
            bus,
            chip,
            unlocked: false,
            config,
        })
    }

    /// The identified chip's geometry
    pub fn geometry(&self) -> &'static ChipGeometry {
        self.chip
    }

    /// Total chip capacity in bytes
    pub fn capacity(&self) -> u32 {
        self.chip.total_size
    }

    /// Whether protection has been lifted this session
    pub fn is_unlocked(&self) -> bool {
        self.unlocked
    }

    /// Lift write protection
    ///
    /// Clears the block-protect bits in status register 1 and re-reads
    /// the register; bits that stay set (WP# pin held, OTP lock) make
    /// the chip effectively read-only and fail the unlock.
    pub fn unlock(&mut self) -> Result<()> {
        let sr1 = protocol::read_status1(self.bus)?;
        if sr1 & opcodes::SR1_PROTECT_MASK != 0 {
            log::debug!("clearing protection bits (SR1 = {:#04X})", sr1);
            protocol::write_status1(self.bus, sr1 & !(opcodes::SR1_PROTECT_MASK | opcodes::SR1_SRP0))?;

            let sr1 = protocol::read_status1(self.bus)?;
            if sr1 & opcodes::SR1_PROTECT_MASK != 0 {
                return Err(Error::WriteProtected);
            }
        }
        self.unlocked = true;
        Ok(())
    }

    /// Restore write protection (protect-all)
    ///
    /// Never called implicitly; a caller that unlocks and walks away
    /// leaves the chip unlocked.
    pub fn lock(&mut self) -> Result<()> {
        let sr1 = protocol::read_status1(self.bus)?;
        protocol::write_status1(
            self.bus,
            sr1 | opcodes::SR1_BP0 | opcodes::SR1_BP1 | opcodes::SR1_BP2,
        )?;
        self.unlocked = false;
        Ok(())
    }

    fn ensure_unlocked(&mut self) -> Result<()> {
        if self.unlocked {
            return Ok(());
        }
        if self.config.auto_unlock {
            self.unlock()
        } else {
            Err(Error::WriteProtected)
        }
    }

    fn check_range(&self, start: u32, len: usize) -> Result<()> {
        if !self.chip.contains_range(start, len) {
            return Err(Error::AddressOutOfRange {
                start,
                len: len.try_into().unwrap_or(u32::MAX),
                capacity: self.chip.total_size,
            });
        }
        Ok(())
    }

    /// Erase an exact block-aligned range
    ///
    /// The range is covered by the fewest erase commands the chip's
    /// granularities allow. A range equal to the full capacity is still
    /// erased block by block; the chip-erase opcode is only reachable
    /// through [`FlashSession::erase_all`].
    pub fn erase(
        &mut self,
        range: AddressRange,
        progress: &mut dyn ProgressSink,
    ) -> Result<OperationResult> {
        self.check_range(range.start, range.len as usize)?;
        let steps = plan_erase(self.chip.erase_blocks, range)?;
        self.ensure_unlocked()?;

        let start = Instant::now();
        progress.erasing(range.len as usize);

        let mut done = 0usize;
        for step in &steps {
            log::debug!(
                "erase {} bytes @ 0x{:08X} (opcode 0x{:02X})",
                step.block.size,
                step.addr,
                step.block.opcode
            );
            protocol::erase_block(self.bus, step.block.opcode, step.addr, step.block.typical)?;
            done += step.block.size as usize;
            progress.erase_progress(done);
        }

        log::info!("erased {} bytes in {} commands", range.len, steps.len());
        Ok(OperationResult {
            bytes: range.len as usize,
            elapsed: start.elapsed(),
            verification: VerifyStatus::NotRequested,
        })
    }

    /// Erase the entire chip with the dedicated chip-erase opcode
    pub fn erase_all(&mut self, progress: &mut dyn ProgressSink) -> Result<OperationResult> {
        self.ensure_unlocked()?;

        let start = Instant::now();
        let total = self.capacity() as usize;
        progress.erasing(total);
        protocol::chip_erase(self.bus, self.chip.chip_erase_typical)?;
        progress.erase_progress(total);

        log::info!("chip erased ({} bytes)", total);
        Ok(OperationResult {
            bytes: total,
            elapsed: start.elapsed(),
            verification: VerifyStatus::NotRequested,
        })
    }

    /// Program already-erased flash
    ///
    /// Splits the data into page-program commands that never cross a
    /// page boundary; the chip wraps within the page on a crossing
    /// write, corrupting data silently. The target range must read as
    /// erased; composing the erase belongs to [`FlashSession::write`].
    pub fn program(
        &mut self,
        offset: u32,
        data: &[u8],
        progress: &mut dyn ProgressSink,
    ) -> Result<OperationResult> {
        self.check_range(offset, data.len())?;
        self.ensure_unlocked()?;

        let start = Instant::now();
        let page_size = self.chip.page_size as usize;
        progress.programming(data.len());

        let mut written = 0usize;
        while written < data.len() {
            let addr = offset + written as u32;
            let page_remaining = page_size - (addr as usize % page_size);
            let chunk_len = page_remaining.min(data.len() - written);
            let chunk = &data[written..written + chunk_len];

            protocol::program_page(self.bus, addr, chunk, self.chip.page_program_typical)?;
            written += chunk_len;
            progress.program_progress(written);
        }

        Ok(OperationResult {
            bytes: written,
            elapsed: start.elapsed(),
            verification: VerifyStatus::NotRequested,
        })
    }

    /// Read a range of flash
    ///
    /// Issued in `chunk_size` pieces purely to bound buffers and to
    /// report progress; reads need no busy-polling.
    pub fn read(
        &mut self,
        offset: u32,
        len: usize,
        progress: &mut dyn ProgressSink,
    ) -> Result<Vec<u8>> {
        self.check_range(offset, len)?;

        let mut out = vec![0u8; len];
        progress.reading(len);

        let chunk_size = self.config.chunk_size.max(1);
        let mut done = 0usize;
        while done < len {
            let n = chunk_size.min(len - done);
            protocol::read_data(self.bus, offset + done as u32, &mut out[done..done + n])?;
            done += n;
            progress.read_progress(done);
        }

        Ok(out)
    }

    /// Compare flash contents against `expected`
    ///
    /// Pure check: reads back and reports the first mismatch (offset
    /// relative to `offset`). Never mutates, safe to re-run.
    pub fn verify(
        &mut self,
        offset: u32,
        expected: &[u8],
        progress: &mut dyn ProgressSink,
    ) -> Result<VerifyOutcome> {
        self.check_range(offset, expected.len())?;
        progress.verifying(expected.len());

        let chunk_size = self.config.chunk_size.max(1);
        let mut buf = vec![0u8; chunk_size];
        let mut done = 0usize;
        while done < expected.len() {
            let n = chunk_size.min(expected.len() - done);
            let chunk = &mut buf[..n];
            protocol::read_data(self.bus, offset + done as u32, chunk)?;

            let want = &expected[done..done + n];
            if let Some(i) = chunk.iter().zip(want.iter()).position(|(a, b)| a != b) {
                return Ok(VerifyOutcome::Mismatch {
                    offset: (done + i) as u32,
                    expected: want[i],
                    found: chunk[i],
                });
            }

            done += n;
            progress.verify_progress(done);
        }

        Ok(VerifyOutcome::Pass)
    }

    /// Write data: erase the covering range, program, verify
    ///
    /// The central composition. With default options the covering
    /// erase range is computed by rounding `offset` down and
    /// `offset + data.len()` up to the smallest erase granularity, the
    /// data is programmed page by page, and the result is read back; a
    /// mismatch surfaces as [`Error::VerifyFailed`], never as success.
    pub fn write(
        &mut self,
        offset: u32,
        data: &[u8],
        opts: WriteOptions,
        progress: &mut dyn ProgressSink,
    ) -> Result<OperationResult> {
        self.check_range(offset, data.len())?;
        if data.is_empty() {
            return Ok(OperationResult {
                bytes: 0,
                elapsed: Duration::ZERO,
                verification: VerifyStatus::NotRequested,
            });
        }
        let start = Instant::now();

        if opts.auto_erase {
            let range = self.covering_erase_range(offset, data.len());
            self.erase(range, progress)?;
        }

        self.program(offset, data, progress)?;

        let verification = if opts.verify {
            match self.verify(offset, data, progress)? {
                VerifyOutcome::Pass => VerifyStatus::Passed,
                VerifyOutcome::Mismatch {
                    offset,
                    expected,
                    found,
                } => {
                    return Err(Error::VerifyFailed {
                        offset,
                        expected,
                        found,
                    })
                }
            }
        } else {
            VerifyStatus::NotRequested
        };

        Ok(OperationResult {
            bytes: data.len(),
            elapsed: start.elapsed(),
            verification,
        })
    }

    /// Smallest block-aligned range containing `[offset, offset + len)`
    ///
    /// Capacity is always a multiple of every granularity, so the
    /// rounded-up end never leaves the chip.
    fn covering_erase_range(&self, offset: u32, len: usize) -> AddressRange {
        let min = self.chip.min_erase_size() as u64;
        let start = (offset as u64 / min) * min;
        let end = (offset as u64 + len as u64).div_ceil(min) * min;
        AddressRange::new(start as u32, (end - start) as u32)
    }
}
