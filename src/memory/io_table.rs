use log::info;

pub const IO_TABLE_SIZE: usize = 0x100;
pub const SLOT_COUNT: u8 = 8;

// Who services a 16 byte block of $C000-$CFFF.
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub enum IoHandler {
    // $C000-$C07F.
    SoftSwitches,
    // $C080-$C08F, the slot 0 registers.
    LanguageCard,
    // $C0n0-$C0nF of a populated slot.
    SlotRegisters(u8),
    // $Cn00-$CnFF of a slot whose card services its own ROM space.
    CardRom(u8),
    // The generic slot ROM and expansion ROM decode.
    ExpansionDecode,
    // Floating bus reads, ignored writes.
    Null,
}

// The I/O dispatch table, indexed by bits 4-11 of the address.
#[derive(Clone, Debug)]
pub struct IoDispatchTable {
    handlers: [IoHandler; IO_TABLE_SIZE],
    // What each slot's $Cn00-$CnFF entries hold while the slot ROMs are switched in.
    cx_handlers: [IoHandler; SLOT_COUNT as usize],
    populated: [bool; SLOT_COUNT as usize],
    cards_in: bool,
}

impl IoDispatchTable {
    pub fn new() -> IoDispatchTable {
        let mut handlers = [IoHandler::ExpansionDecode; IO_TABLE_SIZE];
        handlers[0x00..0x08].fill(IoHandler::SoftSwitches);
        handlers[0x08] = IoHandler::LanguageCard;
        handlers[0x09..0x10].fill(IoHandler::Null);

        IoDispatchTable {
            handlers,
            cx_handlers: [IoHandler::ExpansionDecode; SLOT_COUNT as usize],
            populated: [false; SLOT_COUNT as usize],
            cards_in: true,
        }
    }

    pub fn handler(&self, address: u16) -> IoHandler {
        assert!((0xC000..=0xCFFF).contains(&address));
        self.handlers[usize::from((address >> 4) & 0xFF)]
    }

    pub fn is_populated(&self, slot: u8) -> bool {
        self.populated[usize::from(slot)]
    }

    // Slot 0 is reserved for the language card.
    pub fn register(&mut self, slot: u8, handles_own_rom: bool) {
        assert!(slot >= 1 && slot < SLOT_COUNT, "Slot {slot} can't hold a card.");
        self.handlers[0x08 + usize::from(slot)] = IoHandler::SlotRegisters(slot);
        self.cx_handlers[usize::from(slot)] =
            if handles_own_rom { IoHandler::CardRom(slot) } else { IoHandler::ExpansionDecode };
        self.populated[usize::from(slot)] = true;
        if self.cards_in {
            self.install_cx_handler(slot);
        }
    }

    // The internal ROM has taken over $C100-$C7FF.
    pub fn cards_out(&mut self) {
        info!(target: "softswitch", "Slot ROM handlers switched out.");
        self.cards_in = false;
        self.handlers[0x10..0x80].fill(IoHandler::ExpansionDecode);
    }

    pub fn cards_in(&mut self) {
        info!(target: "softswitch", "Slot ROM handlers switched in.");
        self.cards_in = true;
        for slot in 1..SLOT_COUNT {
            self.install_cx_handler(slot);
        }
    }

    pub fn are_cards_in(&self) -> bool {
        self.cards_in
    }

    fn install_cx_handler(&mut self, slot: u8) {
        let handler = if self.cards_in { self.cx_handlers[usize::from(slot)] } else { IoHandler::ExpansionDecode };
        let start = usize::from(slot) * 0x10;
        self.handlers[start..start + 0x10].fill(handler);
    }
}

impl Default for IoDispatchTable {
    fn default() -> IoDispatchTable {
        IoDispatchTable::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_layout() {
        let table = IoDispatchTable::new();
        assert_eq!(table.handler(0xC000), IoHandler::SoftSwitches);
        assert_eq!(table.handler(0xC07F), IoHandler::SoftSwitches);
        assert_eq!(table.handler(0xC08B), IoHandler::LanguageCard);
        assert_eq!(table.handler(0xC0E0), IoHandler::Null);
        assert_eq!(table.handler(0xC600), IoHandler::ExpansionDecode);
        assert_eq!(table.handler(0xCFFF), IoHandler::ExpansionDecode);
        assert!(!table.is_populated(6));
    }

    #[test]
    fn registration_installs_handlers() {
        let mut table = IoDispatchTable::new();
        table.register(6, true);
        table.register(2, false);
        assert_eq!(table.handler(0xC0EC), IoHandler::SlotRegisters(6));
        assert_eq!(table.handler(0xC65C), IoHandler::CardRom(6));
        assert_eq!(table.handler(0xC0A0), IoHandler::SlotRegisters(2));
        assert_eq!(table.handler(0xC200), IoHandler::ExpansionDecode);
        assert!(table.is_populated(6));
    }

    #[test]
    fn cards_out_and_back_in() {
        let mut table = IoDispatchTable::new();
        table.register(4, true);
        table.cards_out();
        assert_eq!(table.handler(0xC400), IoHandler::ExpansionDecode);
        // Device registers are unaffected.
        assert_eq!(table.handler(0xC0C0), IoHandler::SlotRegisters(4));

        // Registering while switched out takes effect on the way back in.
        table.register(5, true);
        assert_eq!(table.handler(0xC500), IoHandler::ExpansionDecode);
        table.cards_in();
        assert_eq!(table.handler(0xC400), IoHandler::CardRom(4));
        assert_eq!(table.handler(0xC5FF), IoHandler::CardRom(5));
    }

    #[test]
    #[should_panic]
    fn slot_zero_is_reserved() {
        IoDispatchTable::new().register(0, false);
    }
}
