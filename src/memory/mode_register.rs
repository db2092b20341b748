use enum_iterator::{all, Sequence};
use log::info;
use modular_bitfield::prelude::*;
use strum_macros::Display;

// The memory management soft switches. Field order matches the packed flag word, least
// significant bit first, so that a saved word can be restored directly.
#[bitfield(bits = 16)]
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ModeRegister {
    pub store_80: bool,
    pub alt_zp: bool,
    pub aux_read: bool,
    pub aux_write: bool,
    pub bank2: bool,
    pub high_ram: bool,
    pub hires: bool,
    pub page2: bool,
    pub slot_c3_rom: bool,
    pub slot_cx_rom: bool,
    pub write_ram: bool,
    #[skip] __: B5,
}

const VALID_BITS: u16 = 0b0000_0111_1111_1111;

impl ModeRegister {
    // Power-on and Ctrl+Reset state.
    pub fn cold_start() -> ModeRegister {
        ModeRegister::new()
            .with_bank2(true)
            .with_slot_cx_rom(true)
            .with_write_ram(true)
    }

    pub fn from_word(word: u32) -> Result<ModeRegister, String> {
        if word & !u32::from(VALID_BITS) != 0 {
            return Err(format!("Memory mode ${word:08X} has bits set outside of ${VALID_BITS:04X}."));
        }

        Ok(ModeRegister::from_bytes((word as u16).to_le_bytes()))
    }

    pub fn to_word(self) -> u32 {
        u32::from(u16::from_le_bytes(self.into_bytes()))
    }

    pub fn flag(self, flag: ModeFlag) -> bool {
        use ModeFlag::*;
        match flag {
            Store80 => self.store_80(),
            AltZp => self.alt_zp(),
            AuxRead => self.aux_read(),
            AuxWrite => self.aux_write(),
            Bank2 => self.bank2(),
            HighRam => self.high_ram(),
            Hires => self.hires(),
            Page2 => self.page2(),
            SlotC3Rom => self.slot_c3_rom(),
            SlotCxRom => self.slot_cx_rom(),
            WriteRam => self.write_ram(),
        }
    }

    pub fn set_flag(&mut self, flag: ModeFlag, value: bool) {
        use ModeFlag::*;
        match flag {
            Store80 => self.set_store_80(value),
            AltZp => self.set_alt_zp(value),
            AuxRead => self.set_aux_read(value),
            AuxWrite => self.set_aux_write(value),
            Bank2 => self.set_bank2(value),
            HighRam => self.set_high_ram(value),
            Hires => self.set_hires(value),
            Page2 => self.set_page2(value),
            SlotC3Rom => self.set_slot_c3_rom(value),
            SlotCxRom => self.set_slot_cx_rom(value),
            WriteRam => self.set_write_ram(value),
        }
    }

    pub fn log_changes(old: ModeRegister, new: ModeRegister) {
        for flag in all::<ModeFlag>() {
            let message = match (old.flag(flag), new.flag(flag)) {
                (false, true) => format!("\t{flag} enabled."),
                (true, false) => format!("\t{flag} disabled."),
                _ => continue,
            };
            info!(target: "softswitch", "{message}");
        }
    }
}

impl Default for ModeRegister {
    fn default() -> ModeRegister {
        ModeRegister::cold_start()
    }
}

impl std::fmt::Debug for ModeRegister {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let enabled: Vec<String> = all::<ModeFlag>()
            .filter(|&flag| self.flag(flag))
            .map(|flag| flag.to_string())
            .collect();
        write!(f, "ModeRegister(${:03X} [{}])", self.to_word(), enabled.join(" "))
    }
}

#[derive(PartialEq, Eq, Clone, Copy, Debug, Display, Sequence)]
pub enum ModeFlag {
    #[strum(serialize = "80STORE")]
    Store80,
    #[strum(serialize = "ALTZP")]
    AltZp,
    #[strum(serialize = "RAMRD")]
    AuxRead,
    #[strum(serialize = "RAMWRT")]
    AuxWrite,
    #[strum(serialize = "BANK2")]
    Bank2,
    #[strum(serialize = "HIGHRAM")]
    HighRam,
    #[strum(serialize = "HIRES")]
    Hires,
    #[strum(serialize = "PAGE2")]
    Page2,
    #[strum(serialize = "SLOTC3ROM")]
    SlotC3Rom,
    #[strum(serialize = "SLOTCXROM")]
    SlotCxRom,
    #[strum(serialize = "WRITERAM")]
    WriteRam,
}
