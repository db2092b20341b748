use log::{info, warn};
use num_derive::FromPrimitive;

pub const EXPANSION_ROM_START: u16 = 0xC800;
pub const EXPANSION_ROM_END: u16 = 0xCFFF;
pub const EXPANSION_ROM_SIZE: u32 = 0x800;
// Accessing this location releases the shared window.
pub const EXPANSION_ROM_RELEASE: u16 = 0xCFFF;

#[derive(PartialEq, Eq, Clone, Copy, Debug, Default, FromPrimitive)]
pub enum ExpansionRomType {
    #[default]
    Null = 0,
    Internal = 1,
    Peripheral = 2,
}

// What the $C800-$CFFF window must be overwritten with.
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub enum WindowFill {
    Clear,
    Internal,
    Peripheral(u8),
}

// The machine state that the overlay decode depends upon. On a ][ or ][+ both SLOTCXROM and
// SLOTC3ROM should be reported as set, since nothing can switch the slot ROMs out.
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub struct SlotRomContext {
    pub apple2: bool,
    pub slot_cx_rom: bool,
    pub slot_c3_rom: bool,
    // Bit n is set if slot n has a 2KB expansion ROM.
    pub expansion_roms: u8,
}

// The I/O SELECT and I/O STROBE latches that decide who drives $C800-$CFFF.
// A slot's ROM becomes visible once its $Cn00-$CnFF page has been accessed (select) and then any
// part of the window has been accessed (strobe). An access to $CFFF releases the window.
#[derive(PartialEq, Eq, Clone, Copy, Debug, Default)]
pub struct ExpansionRomOverlay {
    io_select: u8,
    io_select_internal: bool,
    rom_type: ExpansionRomType,
    peripheral_slot: u8,
}

impl ExpansionRomOverlay {
    pub fn new() -> ExpansionRomOverlay {
        ExpansionRomOverlay::default()
    }

    pub fn restore(
        io_select: u8,
        io_select_internal: bool,
        rom_type: ExpansionRomType,
        peripheral_slot: u8,
    ) -> Result<ExpansionRomOverlay, String> {
        if peripheral_slot > 7 {
            return Err(format!("Peripheral ROM slot {peripheral_slot} must be 0 through 7."));
        }

        if rom_type == ExpansionRomType::Peripheral && peripheral_slot == 0 {
            return Err("A peripheral expansion ROM must belong to slots 1 through 7.".to_owned());
        }

        Ok(ExpansionRomOverlay { io_select, io_select_internal, rom_type, peripheral_slot })
    }

    pub fn io_select(&self) -> u8 {
        self.io_select
    }

    pub fn io_select_internal(&self) -> bool {
        self.io_select_internal
    }

    pub fn rom_type(&self) -> ExpansionRomType {
        self.rom_type
    }

    pub fn peripheral_slot(&self) -> u8 {
        self.peripheral_slot
    }

    pub fn is_null(&self) -> bool {
        self.rom_type == ExpansionRomType::Null
    }

    // The contents the window should have according to the current state.
    pub fn current_fill(&self) -> WindowFill {
        match self.rom_type {
            ExpansionRomType::Null => WindowFill::Clear,
            ExpansionRomType::Internal => WindowFill::Internal,
            ExpansionRomType::Peripheral => WindowFill::Peripheral(self.peripheral_slot),
        }
    }

    // Steps the release and slot latches for an access to $C100-$CFFF.
    pub fn access(&mut self, address: u16, context: SlotRomContext) -> Option<WindowFill> {
        assert!((0xC100..=0xCFFF).contains(&address));
        let mut fill = None;

        if address == EXPANSION_ROM_RELEASE {
            self.io_select = 0;
            self.io_select_internal = false;
            self.peripheral_slot = 0;
            // With SLOTCXROM off the internal ROM stays in place.
            if context.slot_cx_rom {
                info!(target: "expansionrom", "Expansion ROM released.");
                self.rom_type = ExpansionRomType::Null;
                fill = Some(WindowFill::Clear);
            }
        }

        let slot_page = address < EXPANSION_ROM_START;
        let io_strobe = !slot_page;

        if context.apple2 || context.slot_cx_rom {
            if slot_page {
                let slot = ((address >> 8) & 0x7) as u8;
                let has_rom = context.expansion_roms & (1 << slot) != 0;
                if slot != 3 || context.slot_c3_rom {
                    if has_rom {
                        self.io_select |= 1 << slot;
                    }
                } else {
                    self.io_select_internal = true;
                }
            }

            if self.io_select != 0 && io_strobe {
                let slot = self.io_select.trailing_zeros() as u8;
                if self.io_select & !(1 << slot) != 0 {
                    warn!(target: "expansionrom", "Multiple slots selected (${:02X}), slot {slot} wins.", self.io_select);
                }

                let has_rom = context.expansion_roms & (1 << slot) != 0;
                if has_rom && !(self.rom_type == ExpansionRomType::Peripheral && self.peripheral_slot == slot) {
                    info!(target: "expansionrom", "Slot {slot} expansion ROM switched in.");
                    self.rom_type = ExpansionRomType::Peripheral;
                    self.peripheral_slot = slot;
                    fill = Some(WindowFill::Peripheral(slot));
                }
            } else if self.io_select_internal && io_strobe && self.rom_type != ExpansionRomType::Internal {
                fill = Some(self.switch_in_internal());
            }
        }

        fill
    }

    // With SLOTCXROM off, any access to $C100-$C7FF selects the internal ROM and any access to the
    // window then strobes it in. Runs after `access`, once a no-slot clock has declined the read.
    pub fn internal_access(&mut self, address: u16, context: SlotRomContext) -> Option<WindowFill> {
        assert!((0xC100..=0xCFFF).contains(&address));
        if context.apple2 || context.slot_cx_rom {
            return None;
        }

        if address < EXPANSION_ROM_START {
            self.io_select_internal = true;
            return None;
        }

        if self.io_select_internal && self.rom_type != ExpansionRomType::Internal {
            Some(self.switch_in_internal())
        } else {
            None
        }
    }

    // Internal firmware pages where a no-slot clock may be listening: $C3xx whenever the internal
    // $C300 ROM is showing, and $C8xx while SLOTCXROM is off.
    pub fn is_clock_window(address: u16, context: SlotRomContext) -> bool {
        if context.apple2 {
            return false;
        }

        match address >> 8 {
            0xC3 => !context.slot_cx_rom || !context.slot_c3_rom,
            0xC8 => !context.slot_cx_rom,
            _ => false,
        }
    }

    // SLOTCXROM turned on: nothing drives the window until a card is selected.
    pub fn slot_cx_rom_enabled(&mut self) -> WindowFill {
        info!(target: "expansionrom", "Internal expansion ROM switched out.");
        self.io_select_internal = false;
        self.rom_type = ExpansionRomType::Null;
        self.peripheral_slot = 0;
        WindowFill::Clear
    }

    // SLOTCXROM turned off: the internal ROM takes over the window.
    pub fn slot_cx_rom_disabled(&mut self) -> WindowFill {
        self.switch_in_internal()
    }

    fn switch_in_internal(&mut self) -> WindowFill {
        info!(target: "expansionrom", "Internal expansion ROM switched in.");
        self.rom_type = ExpansionRomType::Internal;
        self.peripheral_slot = 0;
        WindowFill::Internal
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SLOTS_ON: SlotRomContext = SlotRomContext {
        apple2: false,
        slot_cx_rom: true,
        slot_c3_rom: false,
        expansion_roms: 0b0000_1100,
    };

    #[test]
    fn select_then_strobe_switches_in_slot_rom() {
        let mut overlay = ExpansionRomOverlay::new();
        let context = SlotRomContext { slot_c3_rom: true, ..SLOTS_ON };
        assert_eq!(overlay.access(0xC305, context), None);
        assert_eq!(overlay.io_select(), 0b0000_1000);
        assert_eq!(overlay.access(0xC800, context), Some(WindowFill::Peripheral(3)));
        assert_eq!(overlay.rom_type(), ExpansionRomType::Peripheral);
        // Already visible.
        assert_eq!(overlay.access(0xC900, context), None);
    }

    #[test]
    fn release_clears_latches_and_window() {
        let mut overlay = ExpansionRomOverlay::new();
        overlay.access(0xC200, SLOTS_ON);
        overlay.access(0xC800, SLOTS_ON);
        assert_eq!(overlay.access(0xCFFF, SLOTS_ON), Some(WindowFill::Clear));
        assert_eq!(overlay, ExpansionRomOverlay::new());
    }

    #[test]
    fn slot_without_rom_is_not_selected() {
        let mut overlay = ExpansionRomOverlay::new();
        overlay.access(0xC600, SLOTS_ON);
        assert_eq!(overlay.io_select(), 0);
        assert_eq!(overlay.access(0xC800, SLOTS_ON), None);
        assert!(overlay.is_null());
    }

    #[test]
    fn internal_c3_rom_selects_internal_window() {
        let mut overlay = ExpansionRomOverlay::new();
        overlay.access(0xC300, SLOTS_ON);
        assert!(overlay.io_select_internal());
        assert_eq!(overlay.access(0xCA00, SLOTS_ON), Some(WindowFill::Internal));
        assert_eq!(overlay.rom_type(), ExpansionRomType::Internal);
    }

    #[test]
    fn release_keeps_internal_rom_without_slot_cx_rom() {
        let context = SlotRomContext { slot_cx_rom: false, ..SLOTS_ON };
        let mut overlay = ExpansionRomOverlay::new();
        overlay.slot_cx_rom_disabled();
        assert_eq!(overlay.access(0xCFFF, context), None);
        assert_eq!(overlay.rom_type(), ExpansionRomType::Internal);
        assert_eq!(overlay.io_select(), 0);
    }

    #[test]
    fn apple2_always_decodes_slot_roms() {
        let context = SlotRomContext { apple2: true, slot_cx_rom: false, slot_c3_rom: true, expansion_roms: 0b1000 };
        let mut overlay = ExpansionRomOverlay::new();
        overlay.access(0xC3FF, context);
        assert_eq!(overlay.access(0xC800, context), Some(WindowFill::Peripheral(3)));
        assert!(!overlay.io_select_internal());
    }

    #[test]
    fn lowest_selected_slot_wins() {
        let context = SlotRomContext { slot_c3_rom: true, ..SLOTS_ON };
        let mut overlay = ExpansionRomOverlay::new();
        overlay.access(0xC300, context);
        overlay.access(0xC200, context);
        assert_eq!(overlay.access(0xC800, context), Some(WindowFill::Peripheral(2)));
    }

    #[test]
    fn internal_rom_needs_a_slot_page_access_first() {
        let context = SlotRomContext { slot_cx_rom: false, ..SLOTS_ON };
        let mut overlay = ExpansionRomOverlay::new();
        assert_eq!(overlay.access(0xC800, context), None);
        assert_eq!(overlay.internal_access(0xC800, context), None);
        assert!(overlay.is_null());

        assert_eq!(overlay.access(0xC600, context), None);
        assert_eq!(overlay.internal_access(0xC600, context), None);
        assert!(overlay.io_select_internal());
        assert_eq!(overlay.internal_access(0xCC00, context), Some(WindowFill::Internal));
        assert_eq!(overlay.internal_access(0xCC01, context), None);
        // Slot ROMs enabled: nothing for the internal decode to do.
        assert_eq!(ExpansionRomOverlay::new().internal_access(0xC600, SLOTS_ON), None);
    }

    #[test]
    fn clock_window_follows_the_internal_rom() {
        let internal = SlotRomContext { slot_cx_rom: false, ..SLOTS_ON };
        assert!(ExpansionRomOverlay::is_clock_window(0xC300, internal));
        assert!(ExpansionRomOverlay::is_clock_window(0xC8FF, internal));
        assert!(!ExpansionRomOverlay::is_clock_window(0xC900, internal));
        // SLOTC3ROM clear leaves the internal $C300 page showing.
        assert!(ExpansionRomOverlay::is_clock_window(0xC304, SLOTS_ON));
        assert!(!ExpansionRomOverlay::is_clock_window(0xC800, SLOTS_ON));
        let slot_c3 = SlotRomContext { slot_c3_rom: true, ..SLOTS_ON };
        assert!(!ExpansionRomOverlay::is_clock_window(0xC300, slot_c3));
        let apple2 = SlotRomContext { apple2: true, ..internal };
        assert!(!ExpansionRomOverlay::is_clock_window(0xC300, apple2));
    }

    #[test]
    fn restore_validates_slot() {
        assert!(ExpansionRomOverlay::restore(0, false, ExpansionRomType::Peripheral, 0).is_err());
        assert!(ExpansionRomOverlay::restore(0, false, ExpansionRomType::Null, 8).is_err());
        assert!(ExpansionRomOverlay::restore(0x04, false, ExpansionRomType::Peripheral, 2).is_ok());
    }
}
