use crate::memory::read_result::ReadResult;

// The video scanner. When nothing drives the data bus, a read returns whatever byte the scanner
// fetched from display memory during the same cycle.
pub trait FloatingBus {
    fn scanner_address(&self) -> u16;
}

// A scanner parked at a fixed address.
#[derive(Clone, Copy, Debug)]
pub struct FixedScanner(pub u16);

impl Default for FixedScanner {
    fn default() -> FixedScanner {
        // The first byte of text page 1.
        FixedScanner(0x0400)
    }
}

impl FloatingBus for FixedScanner {
    fn scanner_address(&self) -> u16 {
        self.0
    }
}

// The rest of the motherboard I/O: keyboard, video mode, speaker, game port and cassette.
pub trait Motherboard {
    // The keyboard latch. Only the low seven bits show up in the soft switch status reads.
    fn keycode(&self) -> u8 {
        0x00
    }

    // An access to $C000-$C07F that isn't a memory management switch (or that also affects
    // video, as 80STORE, PAGE2 and HIRES do). Writes pass Some(value).
    fn access(&mut self, _address: u16, _write: Option<u8>) -> ReadResult {
        ReadResult::FLOATING_BUS
    }

    // An access to internal firmware at $C3xx or $C8xx, where a no-slot clock sitting under the ROM
    // watches for its unlock sequence. Some(value) drives the bus in place of the ROM.
    fn internal_rom_access(&mut self, _address: u16) -> Option<u8> {
        None
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct NullMotherboard;

impl Motherboard for NullMotherboard {}
