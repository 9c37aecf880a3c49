//! Progress reporting seam
//!
//! Engines report per-chunk progress through this observer so that
//! presentation (progress bars, logging) stays out of the engine. All
//! methods default to no-ops; implement only the phases of interest.

/// Observer for long-running flash operations
///
/// `*_progress` methods report cumulative bytes completed, called once
/// after every chunk or block.
pub trait ProgressSink {
    /// An erase phase is starting, covering `total_bytes`
    fn erasing(&mut self, total_bytes: usize) {
        let _ = total_bytes;
    }

    /// Erase progress, in bytes of coverage completed
    fn erase_progress(&mut self, bytes_done: usize) {
        let _ = bytes_done;
    }

    /// A program phase is starting
    fn programming(&mut self, total_bytes: usize) {
        let _ = total_bytes;
    }

    /// Program progress
    fn program_progress(&mut self, bytes_done: usize) {
        let _ = bytes_done;
    }

    /// A read phase is starting
    fn reading(&mut self, total_bytes: usize) {
        let _ = total_bytes;
    }

    /// Read progress
    fn read_progress(&mut self, bytes_done: usize) {
        let _ = bytes_done;
    }

    /// A verify phase is starting
    fn verifying(&mut self, total_bytes: usize) {
        let _ = total_bytes;
    }

    /// Verify progress
    fn verify_progress(&mut self, bytes_done: usize) {
        let _ = bytes_done;
    }
}

/// Sink that discards all progress events
pub struct NullProgress;

impl ProgressSink for NullProgress {}
