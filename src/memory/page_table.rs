use crate::memory::mode_register::ModeRegister;

pub const PAGE_COUNT: usize = 0x100;

// The physical buffers that can back a 256-byte page of the CPU address space.
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub enum BackingBuffer {
    Main,
    Aux(u8),
    // The 12KB $D000-$FFFF firmware.
    Rom,
    // The 4KB $C000-$CFFF firmware internal to the //e.
    InternalCxRom,
    // Slot firmware scratch: $Cn00 pages for each slot, then the shared expansion window copy.
    PeripheralCxRom,
    // One of the 16KB banks of a 128K language card.
    Saturn(u8),
}

impl BackingBuffer {
    pub fn is_ram(self) -> bool {
        matches!(self, BackingBuffer::Main | BackingBuffer::Aux(_) | BackingBuffer::Saturn(_))
    }
}

#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub struct PageSource {
    pub buffer: BackingBuffer,
    pub offset: u32,
}

impl PageSource {
    pub const fn new(buffer: BackingBuffer, offset: u32) -> PageSource {
        PageSource { buffer, offset }
    }

    const fn main(page: usize) -> PageSource {
        PageSource::new(BackingBuffer::Main, (page as u32) << 8)
    }

    const fn aux(bank: u8, page: usize) -> PageSource {
        PageSource::new(BackingBuffer::Aux(bank), (page as u32) << 8)
    }
}

#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub enum WriteTarget {
    // The write lands in the flat view and reaches the backing buffer at the next reconcile.
    FlatView,
    // The read source differs from the write destination, so bypass the flat view.
    Direct(PageSource),
    Discard,
}

// What the paging tables resolve against besides the mode register.
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub struct BankSelection {
    pub aux_bank: u8,
    // Present only when a 128K language card is installed.
    pub saturn_bank: Option<u8>,
    // The original ][ and ][+ always expose peripheral firmware at $C100-$C7FF.
    pub peripheral_rom_only: bool,
}

// The shadow map (what each page should show) and the write map (where writes to each page go).
#[derive(PartialEq, Eq, Clone, Debug)]
pub struct PageTable {
    shadow: [PageSource; PAGE_COUNT],
    write: [WriteTarget; PAGE_COUNT],
}

impl PageTable {
    pub fn resolve(mode: ModeRegister, banks: BankSelection) -> PageTable {
        let mut shadow = [PageSource::main(0); PAGE_COUNT];
        let mut write = [WriteTarget::Discard; PAGE_COUNT];

        let main_or_aux = |use_aux: bool, page: usize| {
            if use_aux { PageSource::aux(banks.aux_bank, page) } else { PageSource::main(page) }
        };

        // Zero page and stack.
        for page in 0x00..0x02 {
            shadow[page] = main_or_aux(mode.alt_zp(), page);
            write[page] = WriteTarget::FlatView;
        }

        for page in 0x02..0xC0 {
            shadow[page] = main_or_aux(mode.aux_read(), page);
            write[page] = if mode.aux_read() == mode.aux_write() {
                WriteTarget::FlatView
            } else {
                WriteTarget::Direct(main_or_aux(mode.aux_write(), page))
            };
        }

        // Slot firmware. Writes here are I/O, never memory.
        for page in 0xC0..0xC8 {
            let offset = ((page & 0x0F) as u32) << 8;
            let peripheral = if page == 0xC3 {
                mode.slot_cx_rom() && (mode.slot_c3_rom() || banks.peripheral_rom_only)
            } else {
                mode.slot_cx_rom() || banks.peripheral_rom_only
            };
            let buffer = if peripheral { BackingBuffer::PeripheralCxRom } else { BackingBuffer::InternalCxRom };
            shadow[page] = PageSource::new(buffer, offset);
        }

        // The expansion ROM overlay manages what is actually visible here.
        for page in 0xC8..0xD0 {
            let offset = ((page & 0x0F) as u32) << 8;
            shadow[page] = PageSource::new(BackingBuffer::InternalCxRom, offset);
        }

        for page in 0xD0..0x100 {
            let language_card_ram = language_card_ram_source(mode, banks, page);
            shadow[page] = if mode.high_ram() {
                language_card_ram
            } else {
                PageSource::new(BackingBuffer::Rom, ((page - 0xD0) as u32) << 8)
            };

            write[page] = match (mode.write_ram(), mode.high_ram()) {
                (false, _) => WriteTarget::Discard,
                (true, true) => WriteTarget::FlatView,
                (true, false) => WriteTarget::Direct(language_card_ram),
            };
        }

        if mode.store_80() {
            // PAGE2 picks the bank for display memory regardless of RAMRD, and writes always use
            // the flat view even if RAMWRT disagrees with the bank being shown.
            let mut override_page = |page: usize| {
                shadow[page] = main_or_aux(mode.page2(), page);
                write[page] = WriteTarget::FlatView;
            };

            (0x04..0x08).for_each(&mut override_page);
            if mode.hires() {
                (0x20..0x40).for_each(&mut override_page);
            }
        }

        PageTable { shadow, write }
    }

    pub fn shadow(&self, page: usize) -> PageSource {
        self.shadow[page]
    }

    pub fn write_target(&self, page: usize) -> WriteTarget {
        self.write[page]
    }

    // The flat view page (if any) that currently shows the specified backing page.
    pub fn page_showing(&self, source: PageSource) -> Option<usize> {
        let candidate = (source.offset >> 8) as usize;
        let candidates = [Some(candidate), candidate.checked_add(0x10)];
        candidates.into_iter()
            .flatten()
            .filter(|&page| page < PAGE_COUNT)
            .find(|&page| self.shadow[page] == source)
    }
}

// Bank 2 of $D000-$DFFF is stored 4KB lower than bank 1, in the otherwise unused $C000-$CFFF
// region of the selected RAM bank.
fn language_card_ram_source(mode: ModeRegister, banks: BankSelection, page: usize) -> PageSource {
    let bank_offset: u32 = if mode.bank2() { 0x1000 } else { 0 };
    match banks.saturn_bank {
        Some(bank) => {
            let buffer = BackingBuffer::Saturn(bank);
            match page {
                0xD0..=0xDF => PageSource::new(buffer, 0x1000 - bank_offset + (((page - 0xD0) as u32) << 8)),
                0xE0..=0xFF => PageSource::new(buffer, 0x2000 + (((page - 0xE0) as u32) << 8)),
                _ => unreachable!(),
            }
        }
        None => {
            let buffer = if mode.alt_zp() { BackingBuffer::Aux(banks.aux_bank) } else { BackingBuffer::Main };
            match page {
                0xD0..=0xDF => PageSource::new(buffer, ((page as u32) << 8) - bank_offset),
                0xE0..=0xFF => PageSource::new(buffer, (page as u32) << 8),
                _ => unreachable!(),
            }
        }
    }
}
