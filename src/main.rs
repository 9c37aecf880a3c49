//! sflash - SPI NOR flash programmer
//!
//! Reads, writes, and erases serial NOR flash chips through any
//! transport implementing `sflash_core::SpiTransport`. The in-tree
//! backend is the `dummy:` emulator (optionally file-backed); hardware
//! adapters plug in through `programmers::open`.

mod cli;
mod commands;
mod programmers;

use clap::Parser;
use cli::{Cli, Commands};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.verbose {
        0 => {} // default (info)
        1 => log::set_max_level(log::LevelFilter::Debug),
        _ => log::set_max_level(log::LevelFilter::Trace),
    }

    match cli.command {
        Commands::Info { device } => {
            let mut bus = programmers::open(&device)?;
            commands::info::run_info(&mut bus)
        }
        Commands::Read {
            device,
            output,
            address,
            length,
            force,
            chunk_size,
        } => {
            let mut bus = programmers::open(&device)?;
            commands::read::run_read(&mut bus, &output, address, length, force, chunk_size)
        }
        Commands::Write {
            device,
            input,
            address,
            no_verify,
            no_erase,
            chunk_size,
        } => {
            let mut bus = programmers::open(&device)?;
            let result =
                commands::write::run_write(&mut bus, &input, address, !no_verify, !no_erase, chunk_size);
            // Persist whatever state the chip ended up in, success or not
            bus.save_image()?;
            result
        }
        Commands::Erase {
            device,
            start,
            length,
            all,
        } => {
            let mut bus = programmers::open(&device)?;
            let result = commands::erase::run_erase(&mut bus, start, length, all);
            bus.save_image()?;
            result
        }
        Commands::ListChips => {
            commands::list_chips();
            Ok(())
        }
    }
}
