use bitflags::bitflags;

bitflags! {
    /// FF40. Unlike VRAM/OAM, LCDC is never access-locked and may be written mid-line.
    #[derive(Default)]
    pub struct LcdControl: u8 {
        const BG_WINDOW_PRIORITY    = 0b0000_0001;
        const SPRITE_DISPLAY_ENABLE = 0b0000_0010;
        const SPRITE_SIZE           = 0b0000_0100;
        const BG_TILE_MAP_SELECT    = 0b0000_1000;
        const BG_WINDOW_TILE_SELECT = 0b0001_0000;
        const WINDOW_DISPLAY        = 0b0010_0000;
        const WINDOW_MAP_SELECT     = 0b0100_0000;
        const LCD_DISPLAY           = 0b1000_0000;
    }
}

impl LcdControl {
    pub fn sprite_height(&self) -> u8 {
        if self.contains(LcdControl::SPRITE_SIZE) { 16 } else { 8 }
    }

    pub fn bg_tile_map_base(&self) -> u16 {
        if self.contains(LcdControl::BG_TILE_MAP_SELECT) { 0x9C00 } else { 0x9800 }
    }

    pub fn window_tile_map_base(&self) -> u16 {
        if self.contains(LcdControl::WINDOW_MAP_SELECT) { 0x9C00 } else { 0x9800 }
    }
}

bitflags! {
    /// FF41. The low 3 bits (mode, coincidence) are hardware-driven and not writable
    /// directly; only the four interrupt-enable bits (3..6) are CPU-settable.
    #[derive(Default)]
    pub struct LcdStatus: u8 {
        const MODE_FLAG_0           = 0b0000_0001;
        const MODE_FLAG_1           = 0b0000_0010;
        const COINCIDENCE_FLAG      = 0b0000_0100;
        const MODE_0_H_INTERRUPT    = 0b0000_1000;
        const MODE_1_V_INTERRUPT    = 0b0001_0000;
        const MODE_2_OAM_INTERRUPT  = 0b0010_0000;
        const COINCIDENCE_INTERRUPT = 0b0100_0000;
    }
}

impl LcdStatus {
    pub const WRITABLE_MASK: u8 = 0b0111_1000;

    pub fn mode_flag(&self) -> PpuMode {
        match self.bits() & 0x3 {
            0 => PpuMode::HBlank,
            1 => PpuMode::VBlank,
            2 => PpuMode::OamScan,
            _ => PpuMode::PixelTransfer,
        }
    }

    pub fn set_mode_flag(&mut self, mode: PpuMode) {
        let bits = (self.bits() & !0x03) | mode.stat_bits();
        *self = LcdStatus::from_bits_truncate(bits);
    }
}

bitflags! {
    /// OAM entry byte 3.
    #[derive(Default)]
    pub struct AttributeFlags: u8 {
        const PALETTE_NUMBER     = 0b0001_0000;
        const X_FLIP             = 0b0010_0000;
        const Y_FLIP             = 0b0100_0000;
        const OBJ_TO_BG_PRIORITY = 0b1000_0000;
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum PpuMode {
    HBlank,
    VBlank,
    OamScan,
    PixelTransfer,
}

impl PpuMode {
    fn stat_bits(self) -> u8 {
        match self {
            PpuMode::HBlank => 0,
            PpuMode::VBlank => 1,
            PpuMode::OamScan => 2,
            PpuMode::PixelTransfer => 3,
        }
    }
}
