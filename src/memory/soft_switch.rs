use crate::memory::mode_register::ModeFlag;

// What an access to $C000-$C07F does to the memory subsystem.
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub enum SwitchAccess {
    // Sets or clears a memory management flag. Display related flags are also seen by the video
    // hardware on the motherboard.
    Mode { flag: ModeFlag, value: bool, motherboard_too: bool },
    // Bit 7 reports a flag (or its complement), bits 0-6 come from the keyboard latch.
    Status { flag: ModeFlag, inverted: bool },
    // The value written selects the active auxiliary bank.
    AuxBankSelect,
    // Not memory related.
    Motherboard,
}

// Decodes the low byte of a $C000-$C07F address. The ][ and ][+ have none of the //e switches.
pub fn decode(address_low: u8, write: bool, apple2: bool) -> SwitchAccess {
    use ModeFlag::*;
    use SwitchAccess::*;

    let mode = |flag, value, motherboard_too| {
        if apple2 { Motherboard } else { Mode { flag, value, motherboard_too } }
    };

    match (address_low, write) {
        (0x00, true) => mode(Store80, false, true),
        (0x01, true) => mode(Store80, true, true),
        (0x02, true) => mode(AuxRead, false, false),
        (0x03, true) => mode(AuxRead, true, false),
        (0x04, true) => mode(AuxWrite, false, false),
        (0x05, true) => mode(AuxWrite, true, false),
        // INTCXROM is the complement of SLOTCXROM.
        (0x06, true) => mode(SlotCxRom, true, false),
        (0x07, true) => mode(SlotCxRom, false, false),
        (0x08, true) => mode(AltZp, false, false),
        (0x09, true) => mode(AltZp, true, false),
        (0x0A, true) => mode(SlotC3Rom, false, false),
        (0x0B, true) => mode(SlotC3Rom, true, false),

        (0x11, false) => Status { flag: Bank2, inverted: false },
        (0x12, false) => Status { flag: HighRam, inverted: false },
        (0x13, false) => Status { flag: AuxRead, inverted: false },
        (0x14, false) => Status { flag: AuxWrite, inverted: false },
        (0x15, false) => Status { flag: SlotCxRom, inverted: true },
        (0x16, false) => Status { flag: AltZp, inverted: false },
        (0x17, false) => Status { flag: SlotC3Rom, inverted: false },
        (0x18, false) => Status { flag: Store80, inverted: false },
        (0x1C, false) => Status { flag: Page2, inverted: false },
        (0x1D, false) => Status { flag: Hires, inverted: false },

        (0x54, _) => mode(Page2, false, true),
        (0x55, _) => mode(Page2, true, true),
        (0x56, _) => mode(Hires, false, true),
        (0x57, _) => mode(Hires, true, true),

        (0x71 | 0x73, true) if !apple2 => AuxBankSelect,

        _ => Motherboard,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_switches_respond_to_writes_only() {
        assert_eq!(decode(0x03, true, false), SwitchAccess::Mode { flag: ModeFlag::AuxRead, value: true, motherboard_too: false });
        // Reads of $C000-$C00F are the keyboard.
        assert_eq!(decode(0x03, false, false), SwitchAccess::Motherboard);
        assert_eq!(decode(0x0C, true, false), SwitchAccess::Motherboard);
    }

    #[test]
    fn display_switches_respond_to_reads_and_writes() {
        for write in [false, true] {
            assert_eq!(decode(0x55, write, false), SwitchAccess::Mode { flag: ModeFlag::Page2, value: true, motherboard_too: true });
        }
    }

    #[test]
    fn intcxrom_is_inverted() {
        assert_eq!(decode(0x07, true, false), SwitchAccess::Mode { flag: ModeFlag::SlotCxRom, value: false, motherboard_too: false });
        assert_eq!(decode(0x15, false, false), SwitchAccess::Status { flag: ModeFlag::SlotCxRom, inverted: true });
    }

    #[test]
    fn status_reads() {
        assert_eq!(decode(0x1D, false, false), SwitchAccess::Status { flag: ModeFlag::Hires, inverted: false });
        assert_eq!(decode(0x10, false, false), SwitchAccess::Motherboard);
        assert_eq!(decode(0x19, false, false), SwitchAccess::Motherboard);
        assert_eq!(decode(0x11, true, false), SwitchAccess::Motherboard);
    }

    #[test]
    fn apple2_has_no_memory_switches() {
        assert_eq!(decode(0x05, true, true), SwitchAccess::Motherboard);
        assert_eq!(decode(0x57, false, true), SwitchAccess::Motherboard);
        assert_eq!(decode(0x73, true, true), SwitchAccess::Motherboard);
    }

    #[test]
    fn aux_bank_select() {
        assert_eq!(decode(0x71, true, false), SwitchAccess::AuxBankSelect);
        assert_eq!(decode(0x73, true, false), SwitchAccess::AuxBankSelect);
        assert_eq!(decode(0x73, false, false), SwitchAccess::Motherboard);
        assert_eq!(decode(0x72, true, false), SwitchAccess::Motherboard);
    }
}
