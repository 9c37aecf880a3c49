//! Programmer backends
//!
//! Maps a device spec string like `dummy:chip=W25Q64FV,image=flash.bin`
//! to an opened transport. Only the in-memory emulator ships in-tree;
//! hardware adapters implement `SpiTransport` out of tree and slot in
//! here.

use std::path::PathBuf;

use sflash_core::chip;
use sflash_dummy::{DummyConfig, DummyFlash};

/// Errors opening a programmer from a device spec
#[derive(Debug, thiserror::Error)]
pub enum ProgrammerError {
    #[error("unknown programmer '{0}' (available: dummy)")]
    UnknownProgrammer(String),

    #[error("unknown chip model '{0}'")]
    UnknownChip(String),

    #[error("invalid device parameter '{0}'")]
    InvalidParameter(String),

    #[error("failed to load image: {0}")]
    Image(#[from] std::io::Error),
}

/// Open the transport described by a device spec
pub fn open(spec: &str) -> Result<DummyFlash, ProgrammerError> {
    let (name, params) = spec.split_once(':').unwrap_or((spec, ""));
    match name {
        "dummy" => open_dummy(params),
        other => Err(ProgrammerError::UnknownProgrammer(other.to_string())),
    }
}

fn open_dummy(params: &str) -> Result<DummyFlash, ProgrammerError> {
    let mut config = DummyConfig::default();
    let mut image = None;

    for param in params.split(',').filter(|p| !p.is_empty()) {
        let (key, value) = param
            .split_once('=')
            .unwrap_or((param, ""));
        match key {
            "chip" => {
                let chip = chip::find_by_name(value)
                    .ok_or_else(|| ProgrammerError::UnknownChip(value.to_string()))?;
                config = DummyConfig::for_chip(chip);
            }
            "image" => image = Some(PathBuf::from(value)),
            "locked" => config.locked = true,
            _ => return Err(ProgrammerError::InvalidParameter(param.to_string())),
        }
    }

    match image {
        Some(path) => DummyFlash::with_image_file(config, path).map_err(Into::into),
        None => Ok(DummyFlash::new(config)),
    }
}
