mod header;
mod mbc;

use std::fmt;

pub use header::CartridgeHeader;
use mbc::{Mbc, Mbc0, Mbc1};

#[derive(Debug)]
pub enum CartridgeError {
    /// The image is too short to contain a full header (bytes 0x0000..0x0150).
    TooShort { len: usize },
}

impl fmt::Display for CartridgeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CartridgeError::TooShort { len } => {
                write!(f, "cartridge image is only {} bytes, too short for a header", len)
            }
        }
    }
}

impl std::error::Error for CartridgeError {}

/// Translates CPU-visible ROM/RAM addresses to underlying cartridge bytes, selecting
/// an MBC implementation from the header's cartridge-type byte at construction.
pub struct Cartridge {
    header: CartridgeHeader,
    mbc: Box<dyn Mbc>,
}

impl fmt::Debug for Cartridge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Cartridge {{ header: {:?} }}", self.header)
    }
}

impl Cartridge {
    pub fn new(rom: Vec<u8>) -> Result<Self, CartridgeError> {
        if rom.len() < 0x150 {
            return Err(CartridgeError::TooShort { len: rom.len() });
        }

        let header = CartridgeHeader::parse(&rom);
        if !header.checksum_valid(&rom) {
            log::warn!(
                target: "ferroboy_core::cartridge",
                "header checksum mismatch for '{}', loading anyway",
                header.title
            );
        }

        let mbc: Box<dyn Mbc> = match header.cartridge_type {
            0x00 => Box::new(Mbc0::new(rom)),
            0x01..=0x03 => Box::new(Mbc1::new(rom)),
            other => {
                log::warn!(
                    target: "ferroboy_core::cartridge",
                    "unrecognized cartridge type {:#04x}, treating as MBC1",
                    other
                );
                Box::new(Mbc1::new(rom))
            }
        };

        Ok(Cartridge { header, mbc })
    }

    pub fn header(&self) -> &CartridgeHeader {
        &self.header
    }

    pub fn read_rom(&self, address: u16) -> u8 {
        self.mbc.read_rom(address)
    }

    pub fn write_rom(&mut self, address: u16, value: u8) {
        self.mbc.write_rom(address, value);
    }

    pub fn read_ram(&self, address: u16) -> u8 {
        self.mbc.read_ram(address)
    }

    pub fn write_ram(&mut self, address: u16, value: u8) {
        self.mbc.write_ram(address, value);
    }

    pub fn ram_snapshot(&self) -> Vec<u8> {
        self.mbc.ram_bytes().to_vec()
    }

    pub fn load_ram_snapshot(&mut self, bytes: &[u8]) {
        self.mbc.load_ram_bytes(bytes);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn minimal_rom(cartridge_type: u8) -> Vec<u8> {
        let mut rom = vec![0u8; 0x8000];
        rom[0x147] = cartridge_type;
        rom
    }

    #[test]
    fn test_rejects_short_image() {
        let result = Cartridge::new(vec![0u8; 0x10]);
        assert!(matches!(result, Err(CartridgeError::TooShort { len: 0x10 })));
    }

    #[test]
    fn test_mbc0_selected_for_type_zero() {
        let cart = Cartridge::new(minimal_rom(0x00)).unwrap();
        // MBC0 ignores bank-register writes entirely.
        let mut cart = cart;
        cart.write_rom(0x2000, 0x05);
        assert_eq!(cart.read_rom(0x4000), 0);
    }

    #[test]
    fn test_unknown_type_falls_back_to_mbc1_with_warning() {
        let cart = Cartridge::new(minimal_rom(0x9A)).unwrap();
        assert_eq!(cart.header().cartridge_type, 0x9A);
    }
}
