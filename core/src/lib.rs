pub mod bus;
pub mod cartridge;
pub mod cpu;
pub mod emulator;
pub mod host;
pub mod interrupts;
pub mod joypad;
pub mod ppu;
pub mod registers;
pub mod savestate;
pub mod timer;

mod bootrom;
mod dma;
mod io_stub;

pub use crate::bootrom::BOOT_ROM_SIZE;
pub use crate::cartridge::{Cartridge, CartridgeError};
pub use crate::emulator::{Emulator, EmulatorOptions, EmulatorOptionsBuilder};
pub use crate::host::{InputSource, NullInput, NullSink, PixelSink, PpmDumpSink};
pub use crate::joypad::InputKey;
pub use crate::ppu::palette::DmgColor;
pub use crate::savestate::{EmulatorState, SaveStateError};
