use std::str::from_utf8;

pub const HEADER_START: u16 = 0x0100;
pub const HEADER_END: u16 = 0x014F;

#[derive(Debug, Default, Clone)]
pub struct CartridgeHeader {
    /// Upper case ASCII, up to 16 characters, zero-filled if shorter.
    pub title: String,
    pub cgb_flag: bool,
    pub new_licensee_code: u16,
    pub sgb_flag: bool,
    /// Selects the MBC kind; see `Cartridge::new`.
    pub cartridge_type: u8,
    pub rom_size: u8,
    pub ram_size: u8,
    pub is_japanese: bool,
    pub old_licensee_code: u8,
    pub mask_rom_version_number: u8,
    pub header_checksum: u8,
    pub global_checksum: u16,
}

impl CartridgeHeader {
    pub fn parse(rom: &[u8]) -> Self {
        CartridgeHeader {
            title: read_title(rom),
            cgb_flag: matches!(rom[0x143], 0x80 | 0xC0),
            new_licensee_code: u16::from_be_bytes([rom[0x144], rom[0x145]]),
            sgb_flag: rom[0x146] == 0x03,
            cartridge_type: rom[0x147],
            rom_size: rom[0x148],
            ram_size: rom[0x149],
            is_japanese: rom[0x14A] == 0x00,
            old_licensee_code: rom[0x14B],
            mask_rom_version_number: rom[0x14C],
            header_checksum: rom[0x14D],
            global_checksum: u16::from_be_bytes([rom[0x14E], rom[0x14F]]),
        }
    }

    /// True if the header's own checksum byte matches the computed value.
    pub fn checksum_valid(&self, rom: &[u8]) -> bool {
        let computed = rom[0x134..=0x14C]
            .iter()
            .fold(0u8, |acc, &b| acc.wrapping_sub(b).wrapping_sub(1));
        computed == self.header_checksum
    }
}

fn read_title(rom: &[u8]) -> String {
    from_utf8(&rom[0x134..=0x143])
        .unwrap_or("")
        .trim_matches(char::from(0))
        .to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_read_title() {
        let mut rom = vec![0u8; 0x150];
        let title = b"HELLO WORLD";
        rom[0x134..0x134 + title.len()].copy_from_slice(title);

        let header = CartridgeHeader::parse(&rom);
        assert_eq!(header.title, "HELLO WORLD");
    }

    #[test]
    fn test_cgb_flag() {
        let mut rom = vec![0u8; 0x150];
        rom[0x143] = 0xC0;
        assert!(CartridgeHeader::parse(&rom).cgb_flag);
    }
}
