//! sflash-core - Core library for SPI NOR flash programming
//!
//! This crate provides the engine for reading, writing, and erasing
//! serial NOR flash chips over a byte-oriented SPI transport. The
//! transport itself (USB adapter, GPIO bitbang, emulator) is supplied
//! by the caller through the [`SpiTransport`] trait.
//!
//! # Example
//!
//! ```ignore
//! use sflash_core::{FlashSession, SessionConfig, WriteOptions};
//! use sflash_core::flash::NullProgress;
//!
//! fn flash_firmware<T: sflash_core::SpiTransport>(bus: &mut T, image: &[u8]) {
//!     let mut session = FlashSession::open(bus, SessionConfig::default()).unwrap();
//!     session.unlock().unwrap();
//!     session
//!         .write(0, image, WriteOptions::default(), &mut NullProgress)
//!         .unwrap();
//! }
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod chip;
pub mod error;
pub mod flash;
pub mod protocol;
pub mod spi;
pub mod transport;

pub use error::{Error, Result};
pub use flash::{
    identify, AddressRange, FlashSession, OperationResult, SessionConfig, VerifyOutcome,
    VerifyStatus, WriteOptions,
};
pub use transport::SpiTransport;
