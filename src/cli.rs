//! CLI argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Parse a string as a hex or decimal u32
fn parse_hex_u32(s: &str) -> Result<u32, String> {
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u32::from_str_radix(hex, 16).map_err(|e| format!("Invalid hex value: {}", e))
    } else {
        s.parse::<u32>().map_err(|e| format!("Invalid number: {}", e))
    }
}

/// Parse a byte count: decimal, 0x-prefixed hex, or K/M/G suffixed
/// (binary units, so 4K = 4096)
pub fn parse_size(s: &str) -> Result<u32, String> {
    let s = s.trim();
    if s.starts_with("0x") || s.starts_with("0X") {
        return parse_hex_u32(s);
    }

    let (digits, multiplier) = match s.chars().last() {
        Some('k') | Some('K') => (&s[..s.len() - 1], 1024u64),
        Some('m') | Some('M') => (&s[..s.len() - 1], 1024 * 1024),
        Some('g') | Some('G') => (&s[..s.len() - 1], 1024 * 1024 * 1024),
        _ => (s, 1),
    };

    let value = digits
        .parse::<u64>()
        .map_err(|e| format!("Invalid size: {}", e))?;
    let bytes = value
        .checked_mul(multiplier)
        .ok_or_else(|| format!("Size too large: {}", s))?;
    u32::try_from(bytes).map_err(|_| format!("Size too large: {}", s))
}

#[derive(Parser)]
#[command(name = "sflash")]
#[command(author, version, about = "SPI NOR flash programmer", long_about = None)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show chip information without mutating anything
    Info {
        /// Device spec (e.g. dummy:chip=W25Q64FV,image=flash.bin)
        #[arg(short, long, default_value = "dummy:")]
        device: String,
    },

    /// Read flash contents to a file
    Read {
        /// Device spec
        #[arg(short, long, default_value = "dummy:")]
        device: String,

        /// Output file path
        #[arg(short, long)]
        output: PathBuf,

        /// Start address (hex or decimal)
        #[arg(short, long, value_parser = parse_hex_u32, default_value = "0")]
        address: u32,

        /// Number of bytes to read (decimal, hex, or K/M/G suffixed);
        /// defaults to the rest of the chip
        #[arg(short, long, value_parser = parse_size)]
        length: Option<u32>,

        /// Overwrite the output file if it exists
        #[arg(long)]
        force: bool,

        /// Read chunk size
        #[arg(long, value_parser = parse_size)]
        chunk_size: Option<u32>,
    },

    /// Write a file to flash (erase + program + verify)
    Write {
        /// Device spec
        #[arg(short, long, default_value = "dummy:")]
        device: String,

        /// Input file path
        #[arg(short, long)]
        input: PathBuf,

        /// Target address (hex or decimal)
        #[arg(short, long, value_parser = parse_hex_u32, default_value = "0")]
        address: u32,

        /// Skip the readback verification
        #[arg(long)]
        no_verify: bool,

        /// Don't erase before programming (target must already be erased)
        #[arg(long)]
        no_erase: bool,

        /// Read/verify chunk size
        #[arg(long, value_parser = parse_size)]
        chunk_size: Option<u32>,
    },

    /// Erase a block-aligned range, or the whole chip with --all
    Erase {
        /// Device spec
        #[arg(short, long, default_value = "dummy:")]
        device: String,

        /// Start address of the range (hex or decimal)
        #[arg(long, value_parser = parse_hex_u32)]
        start: Option<u32>,

        /// Length of the range (decimal, hex, or K/M/G suffixed)
        #[arg(long, value_parser = parse_size)]
        length: Option<u32>,

        /// Erase the entire chip
        #[arg(long, conflicts_with_all = ["start", "length"])]
        all: bool,
    },

    /// List supported chips
    ListChips,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_size_plain() {
        assert_eq!(parse_size("4096").unwrap(), 4096);
        assert_eq!(parse_size("0x1000").unwrap(), 0x1000);
    }

    #[test]
    fn test_parse_size_suffixed() {
        assert_eq!(parse_size("4K").unwrap(), 4096);
        assert_eq!(parse_size("4k").unwrap(), 4096);
        assert_eq!(parse_size("16M").unwrap(), 16 * 1024 * 1024);
        assert_eq!(parse_size("1G").unwrap(), 1024 * 1024 * 1024);
    }

    #[test]
    fn test_parse_size_invalid() {
        assert!(parse_size("").is_err());
        assert!(parse_size("K").is_err());
        assert!(parse_size("12Q").is_err());
        assert!(parse_size("8G").is_err());
    }
}
