use bitflags::bitflags;

use crate::savestate::InterruptState;

bitflags! {
    /// Backs both IF and IE; the top three bits are unused and always read/write as zero.
    #[derive(Default)]
    pub struct InterruptFlags: u8 {
        const VBLANK  = 0b0000_0001;
        const LCD     = 0b0000_0010;
        const TIMER   = 0b0000_0100;
        const SERIAL  = 0b0000_1000;
        const JOYPAD  = 0b0001_0000;
    }
}

/// The five interrupt sources, in dispatch-priority order (lowest bit wins).
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Interrupt {
    VBlank,
    LcdStat,
    Timer,
    Serial,
    Joypad,
}

impl Interrupt {
    pub const ORDER: [Interrupt; 5] = [
        Interrupt::VBlank,
        Interrupt::LcdStat,
        Interrupt::Timer,
        Interrupt::Serial,
        Interrupt::Joypad,
    ];

    pub fn flag(self) -> InterruptFlags {
        match self {
            Interrupt::VBlank => InterruptFlags::VBLANK,
            Interrupt::LcdStat => InterruptFlags::LCD,
            Interrupt::Timer => InterruptFlags::TIMER,
            Interrupt::Serial => InterruptFlags::SERIAL,
            Interrupt::Joypad => InterruptFlags::JOYPAD,
        }
    }

    pub fn vector(self) -> u16 {
        match self {
            Interrupt::VBlank => 0x40,
            Interrupt::LcdStat => 0x48,
            Interrupt::Timer => 0x50,
            Interrupt::Serial => 0x58,
            Interrupt::Joypad => 0x60,
        }
    }

    /// Picks the lowest-bit pending, enabled interrupt out of a raw `IE & IF` mask.
    pub fn from_pending_mask(mask: u8) -> Option<Interrupt> {
        Interrupt::ORDER
            .iter()
            .copied()
            .find(|i| mask & i.flag().bits() != 0)
    }
}

/// Owns IE and IF; the sole path by which other components request an interrupt.
#[derive(Debug, Default)]
pub struct InterruptController {
    pub enable: InterruptFlags,
    pub flag: InterruptFlags,
}

impl InterruptController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request(&mut self, interrupt: Interrupt) {
        self.flag.insert(interrupt.flag());
    }

    pub fn clear(&mut self, interrupt: Interrupt) {
        self.flag.remove(interrupt.flag());
    }

    pub fn read_ie(&self) -> u8 {
        self.enable.bits()
    }

    pub fn write_ie(&mut self, value: u8) {
        self.enable = InterruptFlags::from_bits_truncate(value);
    }

    pub fn read_if(&self) -> u8 {
        // Unused bits read back high on real hardware.
        0xE0 | self.flag.bits()
    }

    pub fn write_if(&mut self, value: u8) {
        self.flag = InterruptFlags::from_bits_truncate(value);
    }

    /// `IE & IF`, masked to the five real bits — the CPU's dispatch precondition.
    pub fn pending_mask(&self) -> u8 {
        (self.enable & self.flag).bits()
    }

    pub fn pending(&self) -> Option<Interrupt> {
        Interrupt::from_pending_mask(self.pending_mask())
    }

    pub fn to_state(&self) -> InterruptState {
        InterruptState { enable: self.enable.bits(), flag: self.flag.bits() }
    }

    pub fn load_state(&mut self, state: &InterruptState) {
        self.enable = InterruptFlags::from_bits_truncate(state.enable);
        self.flag = InterruptFlags::from_bits_truncate(state.flag);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_interrupt_priority_order() {
        assert_eq!(
            Interrupt::ORDER,
            [
                Interrupt::VBlank,
                Interrupt::LcdStat,
                Interrupt::Timer,
                Interrupt::Serial,
                Interrupt::Joypad,
            ]
        );
    }

    #[test]
    fn test_pending_mask_respects_enable() {
        let mut ic = InterruptController::new();
        ic.request(Interrupt::Timer);
        ic.request(Interrupt::VBlank);
        assert_eq!(ic.pending_mask(), 0);

        ic.write_ie(InterruptFlags::TIMER.bits());
        assert_eq!(ic.pending(), Some(Interrupt::Timer));
    }

    #[test]
    fn test_lowest_bit_wins() {
        let mut ic = InterruptController::new();
        ic.write_ie(0x1F);
        ic.request(Interrupt::Joypad);
        ic.request(Interrupt::LcdStat);

        assert_eq!(ic.pending(), Some(Interrupt::LcdStat));
    }

    #[test]
    fn test_if_top_bits_always_clear_on_write() {
        let mut ic = InterruptController::new();
        ic.write_if(0xFF);
        assert_eq!(ic.flag.bits() & 0xE0, 0);
        assert_eq!(ic.read_if() & 0xE0, 0xE0);
    }
}
