use crate::memory::expansion_rom::EXPANSION_ROM_SIZE;
use crate::memory::memory::Memory;
use crate::memory::read_result::ReadResult;
use crate::util::unit::PAGE_SIZE;

// A peripheral card plugged into one of slots 1-7.
//
// Handlers receive the whole address space so that a card can move data to and from memory
// itself. While one of its handlers runs, the card's slot appears empty.
pub trait Card {
    fn name(&self) -> &str;

    // $C0n0-$C0nF, where n is 8 + the slot number.
    fn io_read(&mut self, memory: &mut Memory, address: u16) -> ReadResult;
    fn io_write(&mut self, memory: &mut Memory, address: u16, value: u8);

    // Whether the card services its own $Cn00-$CnFF page instead of leaving it to the generic
    // slot ROM decode.
    fn handles_own_rom(&self) -> bool {
        false
    }

    fn rom_read(&mut self, memory: &mut Memory, address: u16) -> ReadResult {
        ReadResult::full(memory.expansion_decode(address))
    }

    fn rom_write(&mut self, memory: &mut Memory, address: u16, _value: u8) {
        memory.expansion_decode(address);
    }
}

// The ROM images a card brings with it.
#[derive(Clone, Debug, Default)]
pub struct Firmware {
    // Appears at $Cn00-$CnFF.
    pub slot_rom: Option<Vec<u8>>,
    // Appears at $C800-$CFFF once selected.
    pub expansion_rom: Option<Vec<u8>>,
}

impl Firmware {
    pub fn none() -> Firmware {
        Firmware::default()
    }

    pub fn validate(&self) -> Result<(), String> {
        if let Some(slot_rom) = &self.slot_rom && slot_rom.len() != PAGE_SIZE as usize {
            return Err(format!("A slot ROM must be {PAGE_SIZE} bytes, but was {} bytes.", slot_rom.len()));
        }

        if let Some(expansion_rom) = &self.expansion_rom && expansion_rom.len() != EXPANSION_ROM_SIZE as usize {
            return Err(format!(
                "An expansion ROM must be {EXPANSION_ROM_SIZE} bytes, but was {} bytes.",
                expansion_rom.len(),
            ));
        }

        Ok(())
    }
}

// A card that is nothing but firmware: its device registers float.
#[derive(Clone, Debug)]
pub struct FirmwareCard {
    name: String,
}

impl FirmwareCard {
    pub fn new(name: &str) -> FirmwareCard {
        FirmwareCard { name: name.to_owned() }
    }
}

impl Card for FirmwareCard {
    fn name(&self) -> &str {
        &self.name
    }

    fn io_read(&mut self, _memory: &mut Memory, _address: u16) -> ReadResult {
        ReadResult::FLOATING_BUS
    }

    fn io_write(&mut self, _memory: &mut Memory, _address: u16, _value: u8) {}
}
