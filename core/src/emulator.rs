//! Top-level driver: owns the bus and CPU, and the pacing/host-polling loop that ties
//! a whole frame of CPU/PPU/timer/DMA activity to a single `PixelSink`/`InputSource`
//! pair. The core crate itself never touches a window or a file.

use std::time::{Duration, Instant};

use crate::bootrom::{BootRom, BOOT_ROM_SIZE};
use crate::bus::Bus;
use crate::cartridge::Cartridge;
use crate::cpu::Cpu;
use crate::host::{InputSource, PixelSink};
use crate::joypad::InputKey;
use crate::savestate::{CartridgeRamState, EmulatorState, SaveStateError};

/// ~59.73 Hz, the DMG's real refresh rate (4_194_304 / 70_224 T-cycles per frame).
const FRAME_DURATION: Duration = Duration::from_micros(16_740);

/// Caller-supplied construction parameters for an `Emulator`. Built via
/// `EmulatorOptionsBuilder` rather than a constructor with a long parameter list.
#[derive(Debug, Default)]
pub struct EmulatorOptions {
    pub boot_rom: Option<[u8; BOOT_ROM_SIZE]>,
    pub frame_pacing: bool,
}

#[derive(Debug, Default)]
pub struct EmulatorOptionsBuilder {
    boot_rom: Option<[u8; BOOT_ROM_SIZE]>,
    frame_pacing: bool,
}

impl EmulatorOptionsBuilder {
    pub fn new() -> Self {
        EmulatorOptionsBuilder { boot_rom: None, frame_pacing: true }
    }

    pub fn boot_rom(mut self, boot_rom: Option<[u8; BOOT_ROM_SIZE]>) -> Self {
        self.boot_rom = boot_rom;
        self
    }

    pub fn frame_pacing(mut self, enabled: bool) -> Self {
        self.frame_pacing = enabled;
        self
    }

    pub fn build(self) -> EmulatorOptions {
        EmulatorOptions { boot_rom: self.boot_rom, frame_pacing: self.frame_pacing }
    }
}

impl From<EmulatorOptions> for EmulatorOptionsBuilder {
    fn from(from: EmulatorOptions) -> Self {
        EmulatorOptionsBuilder { boot_rom: from.boot_rom, frame_pacing: from.frame_pacing }
    }
}

pub struct Emulator {
    cpu: Cpu,
    bus: Bus,
    frame_pacing: bool,
    next_frame_deadline: Instant,
}

impl Emulator {
    pub fn new(cartridge: Cartridge, options: EmulatorOptions) -> Self {
        let has_boot_rom = options.boot_rom.is_some();
        let boot_rom = BootRom::new(options.boot_rom);
        let cpu = if has_boot_rom { Cpu::new() } else { Cpu::new_post_boot() };

        Emulator {
            cpu,
            bus: Bus::new(cartridge, boot_rom),
            frame_pacing: options.frame_pacing,
            next_frame_deadline: Instant::now() + FRAME_DURATION,
        }
    }

    pub fn press_key(&mut self, key: InputKey) {
        self.bus.press_key(key);
    }

    pub fn release_key(&mut self, key: InputKey) {
        self.bus.release_key(key);
    }

    /// Runs exactly one CPU step (an instruction, an idle HALT cycle, or an interrupt
    /// dispatch), draining any pixels the PPU produced along the way into `sink`.
    /// Returns `true` once a full frame was presented during this step.
    pub fn step(&mut self, sink: &mut dyn PixelSink) -> bool {
        self.cpu.step(&mut self.bus);

        while let Some(pixel) = self.bus.ppu.pop_pixel() {
            sink.push_pixel(pixel);
        }

        if self.bus.ppu.take_frame_presented() {
            sink.present_frame();
            true
        } else {
            false
        }
    }

    /// Runs until a frame has been presented, polling `input` and pacing to the
    /// wall-clock frame deadline once it is.
    pub fn run_frame(&mut self, sink: &mut dyn PixelSink, input: &mut dyn InputSource) {
        loop {
            if self.step(sink) {
                for (key, down) in input.poll() {
                    if down {
                        self.bus.press_key(key);
                    } else {
                        self.bus.release_key(key);
                    }
                }
                if self.frame_pacing {
                    self.pace_frame();
                }
                break;
            }
        }
    }

    /// Snapshots CPU, timer, interrupt, joypad, DMA, and PPU register/VRAM/OAM state
    /// plus battery-backed cartridge RAM into a binary-encoded save state. The host is
    /// responsible for persisting the returned bytes (to a file, a slot, wherever).
    pub fn save_state(&self) -> Vec<u8> {
        let state = EmulatorState {
            cpu: self.cpu.to_state(),
            timer: self.bus.timer.to_state(),
            interrupts: self.bus.interrupts.to_state(),
            joypad: self.bus.joypad.to_state(),
            dma: self.bus.dma.to_state(),
            ppu: self.bus.ppu.to_state(),
            cartridge_ram: CartridgeRamState { ram: self.bus.cartridge.ram_snapshot() },
        };
        state.encode()
    }

    /// Restores a state produced by `save_state`. Never panics on malformed input:
    /// a decode or shape failure is reported as `Err` and leaves `self` untouched.
    pub fn load_state(&mut self, bytes: &[u8]) -> Result<(), SaveStateError> {
        let state = EmulatorState::decode(bytes)?;

        self.cpu.load_state(&state.cpu);
        self.bus.timer.load_state(&state.timer);
        self.bus.interrupts.load_state(&state.interrupts);
        self.bus.joypad.load_state(&state.joypad);
        self.bus.dma.load_state(&state.dma);
        self.bus.ppu.load_state(&state.ppu);
        self.bus.cartridge.load_ram_snapshot(&state.cartridge_ram.ram);

        Ok(())
    }

    fn pace_frame(&mut self) {
        let now = Instant::now();
        if now < self.next_frame_deadline {
            std::thread::sleep(self.next_frame_deadline - now);
            self.next_frame_deadline += FRAME_DURATION;
        } else {
            // Fell behind real time; resync instead of trying to catch up in a burst.
            self.next_frame_deadline = now + FRAME_DURATION;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::NullSink;
    use pretty_assertions::assert_eq;

    fn rom_only_cartridge() -> Cartridge {
        let mut rom = vec![0u8; 0x8000];
        rom[0x147] = 0x00;
        Cartridge::new(rom).unwrap()
    }

    #[test]
    fn test_no_boot_rom_initializes_post_boot_registers() {
        let options = EmulatorOptionsBuilder::new().frame_pacing(false).build();
        let emulator = Emulator::new(rom_only_cartridge(), options);
        assert_eq!(emulator.cpu.regs.pc, 0x0100);
        assert_eq!(emulator.cpu.regs.sp, 0xFFFE);
        assert_eq!(emulator.cpu.regs.af(), 0x01B0);
    }

    #[test]
    fn test_run_frame_presents_exactly_one_frame_of_pixels() {
        let options = EmulatorOptionsBuilder::new().frame_pacing(false).build();
        let mut emulator = Emulator::new(rom_only_cartridge(), options);
        emulator.bus.write(0xFF40, 0x91); // LCD on, BG on, matching scenario 5 of the spec
        let mut sink = NullSink::new();
        let mut input = crate::host::NullInput::new();

        emulator.run_frame(&mut sink, &mut input);

        assert_eq!(sink.frames_presented(), 1);
    }

    #[test]
    fn test_save_state_round_trip_restores_cpu_and_ppu_state() {
        let options = EmulatorOptionsBuilder::new().frame_pacing(false).build();
        let mut emulator = Emulator::new(rom_only_cartridge(), options);
        emulator.bus.write(0xFF40, 0x91);
        let mut sink = NullSink::new();
        let mut input = crate::host::NullInput::new();
        emulator.run_frame(&mut sink, &mut input);

        let saved = emulator.save_state();

        // Diverge the live emulator so the load is actually exercised, not a no-op.
        emulator.cpu.regs.pc = 0xDEAD;
        emulator.bus.ppu.write_vram(0x8000, 0x42);

        emulator.load_state(&saved).unwrap();

        assert_eq!(emulator.cpu.regs.pc, 0x0100);
        assert_eq!(emulator.bus.ppu.read_vram(0x8000), 0x00);
    }

    #[test]
    fn test_load_state_rejects_garbage_without_panicking() {
        let options = EmulatorOptionsBuilder::new().frame_pacing(false).build();
        let mut emulator = Emulator::new(rom_only_cartridge(), options);

        let result = emulator.load_state(&[0x01, 0x02, 0x03]);

        assert!(result.is_err());
    }
}
