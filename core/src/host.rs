//! Abstract collaborator ports: the core never touches a window, a file, or an audio
//! device directly. A concrete binary supplies implementations of these traits.

use std::io::{self, Write};

use crate::joypad::InputKey;
use crate::ppu::palette::DmgColor;

pub const SCREEN_WIDTH: usize = 160;
pub const SCREEN_HEIGHT: usize = 144;

/// A back-pressure-free RGBA8 framebuffer sink. `push_pixel` is called exactly
/// `SCREEN_WIDTH * SCREEN_HEIGHT` times per frame, in raster order; `present_frame`
/// is then called once, at VBlank entry.
pub trait PixelSink {
    fn push_pixel(&mut self, color: DmgColor);
    fn present_frame(&mut self);
}

/// A pollable source of key transitions. The core calls `poll` at its own cadence
/// (coarser than per-T-cycle) and applies each returned event to the joypad.
pub trait InputSource {
    fn poll(&mut self) -> Vec<(InputKey, bool)>;
}

/// Discards every pixel; used by headless tests and benchmarks that don't care about
/// the resulting image.
#[derive(Debug, Default)]
pub struct NullSink {
    pushed: usize,
    frames: usize,
}

impl NullSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frames_presented(&self) -> usize {
        self.frames
    }
}

impl PixelSink for NullSink {
    fn push_pixel(&mut self, _color: DmgColor) {
        self.pushed += 1;
    }

    fn present_frame(&mut self) {
        self.frames += 1;
        self.pushed = 0;
    }
}

/// Never reports a press; used wherever no live input device is wired up.
#[derive(Debug, Default)]
pub struct NullInput;

impl NullInput {
    pub fn new() -> Self {
        NullInput
    }
}

impl InputSource for NullInput {
    fn poll(&mut self) -> Vec<(InputKey, bool)> {
        Vec::new()
    }
}

/// Writes each presented frame as a binary PPM (P6) to the wrapped writer, overwriting
/// whatever was written for the previous frame. Used by the CLI's `--dump-frame` flag
/// for manual verification; not meant for real-time playback.
pub struct PpmDumpSink<W: Write> {
    writer: W,
    buffer: Vec<DmgColor>,
    frames_presented: usize,
}

impl<W: Write> PpmDumpSink<W> {
    pub fn new(writer: W) -> Self {
        PpmDumpSink { writer, buffer: Vec::with_capacity(SCREEN_WIDTH * SCREEN_HEIGHT), frames_presented: 0 }
    }

    pub fn frames_presented(&self) -> usize {
        self.frames_presented
    }
}

impl<W: Write> PixelSink for PpmDumpSink<W> {
    fn push_pixel(&mut self, color: DmgColor) {
        self.buffer.push(color);
    }

    fn present_frame(&mut self) {
        if self.buffer.len() == SCREEN_WIDTH * SCREEN_HEIGHT {
            if let Err(err) = self.write_ppm() {
                log::warn!(target: "ferroboy_core::host", "failed writing frame dump: {}", err);
            }
        } else {
            log::warn!(
                target: "ferroboy_core::host",
                "dropping short frame ({} of {} pixels)",
                self.buffer.len(),
                SCREEN_WIDTH * SCREEN_HEIGHT
            );
        }
        self.buffer.clear();
        self.frames_presented += 1;
    }
}

impl<W: Write> PpmDumpSink<W> {
    fn write_ppm(&mut self) -> io::Result<()> {
        write!(self.writer, "P6\n{} {}\n255\n", SCREEN_WIDTH, SCREEN_HEIGHT)?;
        for color in &self.buffer {
            let [r, g, b, _a] = color.to_rgba();
            self.writer.write_all(&[r, g, b])?;
        }
        self.writer.flush()
    }
}
