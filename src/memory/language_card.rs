use log::info;
use splitbits::splitbits_named;
use strum_macros::{Display, EnumString};

use crate::memory::mode_register::ModeRegister;
use crate::util::unit::KIBIBYTE;

pub const SATURN_BANK_COUNT: u8 = 8;
pub const SATURN_BANK_SIZE: u32 = 16 * KIBIBYTE;

#[derive(PartialEq, Eq, Clone, Copy, Debug, Default, Display, EnumString)]
pub enum LanguageCardKind {
    #[default]
    #[strum(to_string = "standard", serialize = "16k")]
    Standard16K,
    #[strum(to_string = "saturn", serialize = "128k")]
    Saturn128K,
}

// The $C080-$C08F bank switch decode.
//
// Standard 16K card, low address nibble:
//   .... b... : 0 = $D000 bank 2, 1 = $D000 bank 1
//   .... ..ll : 00 and 11 read RAM, 01 and 10 read ROM
//   odd addresses enable writes, but only on the second consecutive read
// Saturn 128K card: the same, except that $C0n4-$C0n7 and $C0nC-$C0nF select one of eight 16K banks.
#[derive(Clone, Debug)]
pub struct LanguageCard {
    kind: LanguageCardKind,
    last_was_odd_read: bool,
    saturn_bank: u8,
}

impl LanguageCard {
    pub fn new(kind: LanguageCardKind) -> LanguageCard {
        LanguageCard { kind, last_was_odd_read: false, saturn_bank: 0 }
    }

    pub fn kind(&self) -> LanguageCardKind {
        self.kind
    }

    pub fn last_was_odd_read(&self) -> bool {
        self.last_was_odd_read
    }

    pub fn set_last_was_odd_read(&mut self, value: bool) {
        self.last_was_odd_read = value;
    }

    // None unless this is a Saturn card.
    pub fn saturn_bank(&self) -> Option<u8> {
        match self.kind {
            LanguageCardKind::Standard16K => None,
            LanguageCardKind::Saturn128K => Some(self.saturn_bank),
        }
    }

    pub fn set_saturn_bank(&mut self, bank: u8) -> Result<(), String> {
        if self.kind != LanguageCardKind::Saturn128K {
            return Err("Only a Saturn card has selectable banks.".to_owned());
        }

        if bank >= SATURN_BANK_COUNT {
            return Err(format!("Saturn bank {bank} doesn't exist, there are only {SATURN_BANK_COUNT}."));
        }

        self.saturn_bank = bank;
        Ok(())
    }

    // Clears the write-enable priming history, as done by Ctrl+Reset.
    pub fn reset(&mut self) {
        self.last_was_odd_read = false;
    }

    pub fn power_on(&mut self) {
        self.last_was_odd_read = false;
        self.saturn_bank = 0;
    }

    // Applies an access to $C080 + address_nibble to the mode register.
    pub fn access(&mut self, mode: &mut ModeRegister, address_nibble: u8, write: bool) {
        let address_nibble = address_nibble & 0xF;
        if self.kind == LanguageCardKind::Saturn128K && address_nibble & 0b0111 > 3 {
            let bank = splitbits_named!(address_nibble, "....b.bb");
            if bank != self.saturn_bank {
                info!(target: "languagecard", "Saturn bank {} -> {}", self.saturn_bank, bank);
            }

            self.saturn_bank = bank;
            return;
        }

        let (bank1, low_bits) = splitbits_named!(address_nibble, "....b.ll");
        let odd = address_nibble & 1 == 1;
        mode.set_bank2(!bank1);
        mode.set_high_ram(low_bits == 0b00 || low_bits == 0b11);

        match self.kind {
            LanguageCardKind::Standard16K => {
                mode.set_write_ram(odd && !write && self.last_was_odd_read);
                self.last_was_odd_read = odd && !write;
            }
            // The Saturn primes on any pair of odd accesses, reads or writes.
            LanguageCardKind::Saturn128K => {
                mode.set_write_ram(odd && self.last_was_odd_read);
                self.last_was_odd_read = odd;
            }
        }

        info!(target: "languagecard", "$C08{:X} {}: BANK2={} HIGHRAM={} WRITERAM={}",
            address_nibble,
            if write { "write" } else { "read" },
            u8::from(mode.bank2()),
            u8::from(mode.high_ram()),
            u8::from(mode.write_ram()),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_odd_read_does_not_enable_writes() {
        let mut card = LanguageCard::new(LanguageCardKind::Standard16K);
        let mut mode = ModeRegister::cold_start();
        card.access(&mut mode, 0x9, false);
        assert!(!mode.high_ram());
        assert!(!mode.bank2());
        assert!(!mode.write_ram());
        assert!(card.last_was_odd_read());
    }

    #[test]
    fn second_odd_read_enables_writes() {
        let mut card = LanguageCard::new(LanguageCardKind::Standard16K);
        let mut mode = ModeRegister::cold_start();
        card.access(&mut mode, 0xB, false);
        card.access(&mut mode, 0xB, false);
        assert!(mode.high_ram());
        assert!(!mode.bank2());
        assert!(mode.write_ram());
    }

    #[test]
    fn odd_write_breaks_priming() {
        let mut card = LanguageCard::new(LanguageCardKind::Standard16K);
        let mut mode = ModeRegister::new();
        card.access(&mut mode, 0x1, false);
        card.access(&mut mode, 0x1, true);
        assert!(!mode.write_ram());
        card.access(&mut mode, 0x1, false);
        assert!(!mode.write_ram());
        card.access(&mut mode, 0x1, false);
        assert!(mode.write_ram());
    }

    #[test]
    fn read_ram_decode() {
        let mut card = LanguageCard::new(LanguageCardKind::Standard16K);
        let expected = [true, false, false, true];
        for nibble in 0..0x10 {
            let mut mode = ModeRegister::new();
            card.access(&mut mode, nibble, false);
            assert_eq!(mode.high_ram(), expected[usize::from(nibble & 3)], "$C08{nibble:X}");
            assert_eq!(mode.bank2(), nibble < 8, "$C08{nibble:X}");
        }
    }

    #[test]
    fn even_access_write_protects() {
        let mut card = LanguageCard::new(LanguageCardKind::Standard16K);
        let mut mode = ModeRegister::cold_start();
        card.access(&mut mode, 0x0, false);
        assert!(mode.high_ram());
        assert!(mode.bank2());
        assert!(!mode.write_ram());
    }

    #[test]
    fn saturn_bank_select_leaves_mode_alone() {
        let mut card = LanguageCard::new(LanguageCardKind::Saturn128K);
        let mut mode = ModeRegister::cold_start();
        card.access(&mut mode, 0x5, false);
        assert_eq!(card.saturn_bank(), Some(1));
        card.access(&mut mode, 0xE, false);
        assert_eq!(card.saturn_bank(), Some(6));
        assert_eq!(mode, ModeRegister::cold_start());
    }

    #[test]
    fn saturn_primes_on_odd_writes() {
        let mut card = LanguageCard::new(LanguageCardKind::Saturn128K);
        let mut mode = ModeRegister::new();
        card.access(&mut mode, 0x3, true);
        card.access(&mut mode, 0x3, true);
        assert!(mode.write_ram());
        card.access(&mut mode, 0x0, false);
        assert!(!mode.write_ram());
    }

    #[test]
    fn kind_parses_from_command_line_names() {
        assert_eq!("saturn".parse::<LanguageCardKind>(), Ok(LanguageCardKind::Saturn128K));
        assert_eq!("16k".parse::<LanguageCardKind>(), Ok(LanguageCardKind::Standard16K));
    }

    #[test]
    fn standard_card_has_no_banks() {
        let mut card = LanguageCard::new(LanguageCardKind::Standard16K);
        assert_eq!(card.saturn_bank(), None);
        assert!(card.set_saturn_bank(1).is_err());
    }
}
