//! Progress bars for flash operations
//!
//! Adapts the engine's `ProgressSink` seam to indicatif bars, one bar
//! per phase.

use indicatif::{ProgressBar, ProgressStyle};
use sflash_core::flash::ProgressSink;

/// Terminal progress bars driven by engine callbacks
pub struct CliProgress {
    current: Option<ProgressBar>,
}

impl CliProgress {
    pub fn new() -> Self {
        Self { current: None }
    }

    fn start_phase(&mut self, total: usize, phase: &'static str) {
        self.finish();
        let pb = ProgressBar::new(total as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template(&format!(
                    "{{spinner:.green}} [{{elapsed_precise}}] [{{bar:40.cyan/blue}}] {{bytes}}/{{total_bytes}} ({{bytes_per_sec}}, {{eta}}) {}",
                    phase
                ))
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        self.current = Some(pb);
    }

    fn set_position(&mut self, pos: usize) {
        if let Some(pb) = &self.current {
            pb.set_position(pos as u64);
        }
    }

    /// Finish and clear the active bar
    pub fn finish(&mut self) {
        if let Some(pb) = self.current.take() {
            pb.finish_and_clear();
        }
    }
}

impl Drop for CliProgress {
    fn drop(&mut self) {
        self.finish();
    }
}

impl ProgressSink for CliProgress {
    fn erasing(&mut self, total_bytes: usize) {
        self.start_phase(total_bytes, "Erasing");
    }

    fn erase_progress(&mut self, bytes_done: usize) {
        self.set_position(bytes_done);
    }

    fn programming(&mut self, total_bytes: usize) {
        self.start_phase(total_bytes, "Writing");
    }

    fn program_progress(&mut self, bytes_done: usize) {
        self.set_position(bytes_done);
    }

    fn reading(&mut self, total_bytes: usize) {
        self.start_phase(total_bytes, "Reading");
    }

    fn read_progress(&mut self, bytes_done: usize) {
        self.set_position(bytes_done);
    }

    fn verifying(&mut self, total_bytes: usize) {
        self.start_phase(total_bytes, "Verifying");
    }

    fn verify_progress(&mut self, bytes_done: usize) {
        self.set_position(bytes_done);
    }
}
