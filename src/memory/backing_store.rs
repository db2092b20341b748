use crate::memory::aux_bank::AuxBankSelector;
use crate::memory::language_card::{SATURN_BANK_COUNT, SATURN_BANK_SIZE};
use crate::memory::page_table::{BackingBuffer, PageSource};
use crate::memory::raw_memory::RawMemory;
use crate::memory::system_rom::SystemRom;
use crate::util::unit::{KIBIBYTE, PAGE_SIZE};

pub const MAIN_MEMORY_SIZE: u32 = 64 * KIBIBYTE;
// $C000-$C7FF holds each slot's 256 byte ROM, $C800-$CFFF the selected expansion ROM.
pub const PERIPHERAL_CX_ROM_SIZE: u32 = 4 * KIBIBYTE;

// Every buffer that can back part of the address space.
#[derive(Clone, Debug)]
pub struct BackingStore {
    pub main: RawMemory,
    pub aux: AuxBankSelector,
    pub rom: SystemRom,
    pub peripheral_cx_rom: RawMemory,
    // Empty unless a Saturn card is installed.
    pub saturn: Vec<RawMemory>,
}

impl BackingStore {
    pub fn new(rom: SystemRom, aux_bank_count: u8, saturn: bool) -> BackingStore {
        let saturn_bank_count = if saturn { SATURN_BANK_COUNT } else { 0 };
        BackingStore {
            main: RawMemory::new(MAIN_MEMORY_SIZE),
            aux: AuxBankSelector::new(aux_bank_count),
            rom,
            peripheral_cx_rom: RawMemory::new(PERIPHERAL_CX_ROM_SIZE),
            saturn: (0..saturn_bank_count).map(|_| RawMemory::new(SATURN_BANK_SIZE)).collect(),
        }
    }

    pub fn buffer(&self, buffer: BackingBuffer) -> &RawMemory {
        match buffer {
            BackingBuffer::Main => &self.main,
            BackingBuffer::Aux(bank) => self.aux.bank(bank),
            BackingBuffer::Rom => self.rom.language_card_rom(),
            BackingBuffer::InternalCxRom => self.rom.internal_cx_rom(),
            BackingBuffer::PeripheralCxRom => &self.peripheral_cx_rom,
            BackingBuffer::Saturn(bank) => &self.saturn[usize::from(bank)],
        }
    }

    // Only RAM can be written back to. ROM pages never accept writes.
    pub fn ram_mut(&mut self, buffer: BackingBuffer) -> Option<&mut RawMemory> {
        match buffer {
            BackingBuffer::Main => Some(&mut self.main),
            BackingBuffer::Aux(bank) => Some(self.aux.bank_mut(bank)),
            BackingBuffer::Saturn(bank) => Some(&mut self.saturn[usize::from(bank)]),
            BackingBuffer::Rom | BackingBuffer::InternalCxRom | BackingBuffer::PeripheralCxRom => None,
        }
    }

    pub fn page(&self, source: PageSource) -> &[u8; PAGE_SIZE as usize] {
        self.buffer(source.buffer).page(source.offset)
    }

    pub fn clear_ram(&mut self) {
        self.main.as_mut_slice().fill(0);
        self.aux.clear();
        for bank in &mut self.saturn {
            bank.as_mut_slice().fill(0);
        }
    }
}
