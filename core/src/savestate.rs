//! Save-state DTOs: a small plain-data mirror of each component's state, encoded with
//! `nanoserde`'s `SerBin`/`DeBin` derive (spec §9 resolves the save-state Open Question
//! this way, matching the teacher crate's existing `nanoserde` dependency). This is an
//! orthogonal layer: the timing substrate works identically whether or not a caller
//! ever touches it.
//!
//! Loading a state never panics on malformed input — a save file is host-provided,
//! untrusted data — and always produces a `Result`.

use nanoserde::{DeBin, DeBinErr, SerBin};

#[derive(Debug, Clone, PartialEq, SerBin, DeBin)]
pub struct CpuState {
    pub a: u8,
    pub b: u8,
    pub c: u8,
    pub d: u8,
    pub e: u8,
    pub f: u8,
    pub h: u8,
    pub l: u8,
    pub sp: u16,
    pub pc: u16,
    pub ime: bool,
    pub ei_pending: bool,
    pub halted: bool,
    pub halt_bug: bool,
}

#[derive(Debug, Clone, PartialEq, SerBin, DeBin)]
pub struct TimerState {
    pub system_counter: u16,
    pub tima: u8,
    pub tma: u8,
    pub tac: u8,
    pub prev_tac_bit: bool,
    pub overflow_delay: u8,
}

#[derive(Debug, Clone, PartialEq, SerBin, DeBin)]
pub struct InterruptState {
    pub enable: u8,
    pub flag: u8,
}

#[derive(Debug, Clone, PartialEq, SerBin, DeBin)]
pub struct JoypadState {
    pub pressed_buttons: u8,
    pub pressed_directions: u8,
    pub selected: u8,
}

#[derive(Debug, Clone, PartialEq, SerBin, DeBin)]
pub struct DmaState {
    pub source_page: u8,
    pub pending: bool,
    pub running: bool,
    pub offset: u8,
    pub last_byte: u8,
}

/// Register-level PPU state plus the two video memories. Deliberately does not mirror
/// the pixel FIFOs or the fetcher's mid-scanline phase: loading a state restarts the
/// scanline the saved `ly` was on from OAM scan, rather than resuming mid-fetch. A
/// save taken outside of VBlank therefore redraws, not resumes, its current line.
#[derive(Debug, Clone, PartialEq, SerBin, DeBin)]
pub struct PpuState {
    pub lcdc: u8,
    pub stat: u8,
    pub scy: u8,
    pub scx: u8,
    pub ly: u8,
    pub lyc: u8,
    pub wy: u8,
    pub wx: u8,
    pub bgp: u8,
    pub obp0: u8,
    pub obp1: u8,
    pub vram: Vec<u8>,
    pub oam: Vec<u8>,
}

/// Battery-backed cartridge RAM only; ROM-bank-register state is not persisted (the
/// host re-supplies the ROM image on load, and the two bank shapes this core
/// implements reset their registers to power-on defaults, same as real hardware
/// re-inserting a cartridge).
#[derive(Debug, Clone, PartialEq, SerBin, DeBin)]
pub struct CartridgeRamState {
    pub ram: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, SerBin, DeBin)]
pub struct EmulatorState {
    pub cpu: CpuState,
    pub timer: TimerState,
    pub interrupts: InterruptState,
    pub joypad: JoypadState,
    pub dma: DmaState,
    pub ppu: PpuState,
    pub cartridge_ram: CartridgeRamState,
}

/// Never a panic: a save state is host-provided, untrusted data, so both a malformed
/// binary encoding and a structurally-valid-but-wrong-shaped record (e.g. a VRAM
/// buffer that isn't exactly 0x2000 bytes) surface here instead.
#[derive(Debug)]
pub enum SaveStateError {
    Decode(DeBinErr),
    InvalidShape(&'static str),
}

impl std::fmt::Display for SaveStateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SaveStateError::Decode(err) => write!(f, "save state failed to decode: {:?}", err),
            SaveStateError::InvalidShape(reason) => write!(f, "save state has an invalid shape: {}", reason),
        }
    }
}

impl std::error::Error for SaveStateError {}

impl EmulatorState {
    pub fn encode(&self) -> Vec<u8> {
        SerBin::serialize_bin(self)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, SaveStateError> {
        let state: EmulatorState = DeBin::deserialize_bin(bytes).map_err(SaveStateError::Decode)?;
        if state.ppu.vram.len() != 0x2000 {
            return Err(SaveStateError::InvalidShape("PPU VRAM must be exactly 0x2000 bytes"));
        }
        if state.ppu.oam.len() != 0xA0 {
            return Err(SaveStateError::InvalidShape("PPU OAM must be exactly 0xA0 bytes"));
        }
        Ok(state)
    }
}
