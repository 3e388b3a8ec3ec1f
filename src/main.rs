use std::fs::{self, File};

use anyhow::{Context, Result};
use gumdrop::Options;
use log::LevelFilter;
use simplelog::{CombinedLogger, Config, TermLogger, TerminalMode};

use ferroboy_core::{
    Cartridge, CartridgeError, Emulator, EmulatorOptionsBuilder, NullInput, NullSink, PpmDumpSink, BOOT_ROM_SIZE,
};

#[derive(Options, Debug)]
struct AppOptions {
    /// Print this help message
    #[options()]
    help: bool,
    /// Path to the cartridge ROM image
    #[options(free)]
    rom_path: Option<String>,
    /// Path to a 256-byte DMG boot ROM image
    #[options()]
    boot_rom: Option<String>,
    /// Raise log verbosity to debug
    #[options(short = "v")]
    verbose: bool,
    /// Lower log verbosity to errors only
    #[options(short = "q")]
    quiet: bool,
    /// Dump every presented frame as a binary PPM to this path
    #[options()]
    dump_frame: Option<String>,
}

/// Mirrors the documented CLI exit codes: 0 on a clean host close, 2 on a cartridge
/// parse failure, 1 for any other startup I/O error.
fn exit_code_for(err: &anyhow::Error) -> i32 {
    if err.chain().any(|cause| cause.downcast_ref::<CartridgeError>().is_some()) {
        2
    } else {
        1
    }
}

fn main() {
    let options = AppOptions::parse_args_default_or_exit();

    let level = if options.verbose {
        LevelFilter::Debug
    } else if options.quiet {
        LevelFilter::Error
    } else {
        LevelFilter::Info
    };
    CombinedLogger::init(vec![TermLogger::new(level, Config::default(), TerminalMode::Mixed)])
        .expect("a second logger was not already installed");

    if let Err(err) = run(options) {
        log::error!("{:#}", err);
        std::process::exit(exit_code_for(&err));
    }
}

fn run(options: AppOptions) -> Result<()> {
    let rom_path = options.rom_path.context("no cartridge path given; pass the ROM file as a positional argument")?;

    let rom_bytes = fs::read(&rom_path).with_context(|| format!("failed to read cartridge image at '{}'", rom_path))?;
    let cartridge = Cartridge::new(rom_bytes).with_context(|| format!("'{}' is not a valid cartridge image", rom_path))?;

    let boot_rom = match options.boot_rom {
        Some(path) => Some(read_boot_rom(&path)?),
        None => None,
    };

    let emulator_options = EmulatorOptionsBuilder::new().boot_rom(boot_rom).build();
    let mut emulator = Emulator::new(cartridge, emulator_options);
    let mut input = NullInput::new();

    match options.dump_frame {
        Some(path) => {
            let file = File::create(&path).with_context(|| format!("failed to create frame dump at '{}'", path))?;
            let mut sink = PpmDumpSink::new(file);
            loop {
                emulator.run_frame(&mut sink, &mut input);
            }
        }
        None => {
            let mut sink = NullSink::new();
            loop {
                emulator.run_frame(&mut sink, &mut input);
            }
        }
    }
}

fn read_boot_rom(path: &str) -> Result<[u8; BOOT_ROM_SIZE]> {
    let bytes = fs::read(path).with_context(|| format!("failed to read boot ROM at '{}'", path))?;
    if bytes.len() != BOOT_ROM_SIZE {
        anyhow::bail!("boot ROM at '{}' is {} bytes, expected {}", path, bytes.len(), BOOT_ROM_SIZE);
    }
    let mut image = [0u8; BOOT_ROM_SIZE];
    image.copy_from_slice(&bytes);
    Ok(image)
}
