use enum_iterator::Sequence;
use log::info;
use strum_macros::{Display, EnumString};

use crate::memory::raw_memory::RawMemory;
use crate::util::unit::KIBIBYTE;

pub const LANGUAGE_CARD_ROM_SIZE: u32 = 12 * KIBIBYTE;
pub const INTERNAL_CX_ROM_SIZE: u32 = 4 * KIBIBYTE;
pub const CUSTOM_F8_ROM_SIZE: u32 = 2 * KIBIBYTE;

#[derive(PartialEq, Eq, Clone, Copy, Debug, Default, Display, EnumString, Sequence)]
#[strum(ascii_case_insensitive)]
pub enum MachineType {
    #[strum(to_string = "apple2")]
    Apple2,
    #[strum(to_string = "apple2plus")]
    Apple2Plus,
    #[strum(to_string = "apple2e")]
    Apple2e,
    #[default]
    #[strum(to_string = "apple2eenhanced")]
    Apple2eEnhanced,
}

impl MachineType {
    // The original ][ and ][+: no auxiliary memory, no internal slot firmware.
    pub fn is_apple2(self) -> bool {
        matches!(self, MachineType::Apple2 | MachineType::Apple2Plus)
    }

    pub fn rom_size(self) -> u32 {
        if self.is_apple2() {
            LANGUAGE_CARD_ROM_SIZE
        } else {
            INTERNAL_CX_ROM_SIZE + LANGUAGE_CARD_ROM_SIZE
        }
    }
}

// The motherboard firmware: $C000-$CFFF (//e only) and $D000-$FFFF.
#[derive(Clone, Debug)]
pub struct SystemRom {
    internal_cx_rom: RawMemory,
    language_card_rom: RawMemory,
}

impl SystemRom {
    pub fn load(machine_type: MachineType, image: &[u8]) -> Result<SystemRom, String> {
        let expected_size = machine_type.rom_size();
        if image.len() != expected_size as usize {
            return Err(format!(
                "The {machine_type} ROM image must be {}KiB, but was {} bytes.",
                expected_size / KIBIBYTE,
                image.len(),
            ));
        }

        info!("Loaded {machine_type} ROM. CRC32: {:08X}", crc32fast::hash(image));

        let (internal_cx_rom, language_card_rom) = if machine_type.is_apple2() {
            (RawMemory::new(INTERNAL_CX_ROM_SIZE), RawMemory::from_vec(image.to_vec()))
        } else {
            let (cx, language_card) = image.split_at(INTERNAL_CX_ROM_SIZE as usize);
            (RawMemory::from_vec(cx.to_vec()), RawMemory::from_vec(language_card.to_vec()))
        };

        Ok(SystemRom { internal_cx_rom, language_card_rom })
    }

    // Replaces the monitor ROM at $F800-$FFFF. On error the stock ROM is left in place.
    pub fn apply_custom_f8_rom(&mut self, image: &[u8]) -> Result<(), String> {
        if image.len() != CUSTOM_F8_ROM_SIZE as usize {
            return Err(format!(
                "A custom F8 ROM must be {}KiB, but was {} bytes.",
                CUSTOM_F8_ROM_SIZE / KIBIBYTE,
                image.len(),
            ));
        }

        info!("Loaded custom F8 ROM. CRC32: {:08X}", crc32fast::hash(image));
        let start = LANGUAGE_CARD_ROM_SIZE - CUSTOM_F8_ROM_SIZE;
        self.language_card_rom
            .slice_mut(start..LANGUAGE_CARD_ROM_SIZE)
            .copy_from_slice(image);
        Ok(())
    }

    pub fn internal_cx_rom(&self) -> &RawMemory {
        &self.internal_cx_rom
    }

    pub fn language_card_rom(&self) -> &RawMemory {
        &self.language_card_rom
    }
}
