use bitvec::prelude::*;
use log::info;

use crate::memory::backing_store::BackingStore;
use crate::memory::page_table::{PageSource, PageTable, WriteTarget, PAGE_COUNT};
use crate::memory::raw_memory::RawMemory;
use crate::util::unit::{KIBIBYTE, PAGE_SIZE};

pub const FLAT_VIEW_SIZE: u32 = 64 * KIBIBYTE;

#[derive(PartialEq, Eq, Clone, Copy, Debug, Default)]
pub struct ReconcileStats {
    pub pages_flushed: u32,
    pub pages_copied: u32,
}

// Maintains the flat 64K view that the CPU reads and writes directly. Every page of the view is a
// cached copy of the backing page its shadow entry names. Writes land in the view and only reach
// the backing buffer when the page is remapped or flushed.
#[derive(Clone)]
pub struct PagingEngine {
    flat: RawMemory,
    table: PageTable,
    dirty: BitArr!(for PAGE_COUNT),
}

impl PagingEngine {
    pub fn new(table: PageTable) -> PagingEngine {
        PagingEngine {
            flat: RawMemory::new(FLAT_VIEW_SIZE),
            table,
            dirty: BitArray::ZERO,
        }
    }

    pub fn table(&self) -> &PageTable {
        &self.table
    }

    pub fn flat(&self) -> &RawMemory {
        &self.flat
    }

    // For overwriting the expansion ROM window directly, outside of the page table.
    pub fn flat_mut(&mut self) -> &mut RawMemory {
        &mut self.flat
    }

    pub fn is_dirty(&self, page: usize) -> bool {
        self.dirty[page]
    }

    pub fn dirty_page_count(&self) -> usize {
        self.dirty.count_ones()
    }

    // Installs a new page table, moving page contents between the flat view and the backing
    // buffers as needed. With initialize set, every page is reloaded and pending writes in the
    // flat view are abandoned.
    pub fn reconcile(&mut self, store: &mut BackingStore, table: PageTable, initialize: bool) -> ReconcileStats {
        let mut stats = ReconcileStats::default();
        for page in 0..PAGE_COUNT {
            let old_source = self.table.shadow(page);
            let new_source = table.shadow(page);
            if !initialize && old_source == new_source {
                continue;
            }

            // The stack page is written by the CPU without the page being marked dirty.
            if !initialize && (self.dirty[page] || page <= 1) {
                self.write_back(store, page, old_source);
                stats.pages_flushed += 1;
            }

            self.dirty.set(page, false);
            self.flat.page_mut(page_start(page)).copy_from_slice(store.page(new_source));
            stats.pages_copied += 1;
        }

        self.table = table;
        if initialize {
            self.dirty.fill(false);
        }

        if stats.pages_copied > 0 {
            info!(target: "paging", "Reconciled{}: {} pages flushed, {} pages copied.",
                if initialize { " (initialize)" } else { "" },
                stats.pages_flushed,
                stats.pages_copied,
            );
        }

        stats
    }

    // Recopies a page whose backing ROM contents changed. Pending writes to the page are lost.
    pub fn reload(&mut self, store: &BackingStore, page: usize) {
        let source = self.table.shadow(page);
        self.flat.page_mut(page_start(page)).copy_from_slice(store.page(source));
        self.dirty.set(page, false);
    }

    // Writes every dirty page back to its backing buffer.
    pub fn flush(&mut self, store: &mut BackingStore) -> u32 {
        let mut pages_flushed = 0;
        for page in 0..PAGE_COUNT {
            if self.dirty[page] || page <= 1 {
                self.write_back(store, page, self.table.shadow(page));
                self.dirty.set(page, false);
                pages_flushed += 1;
            }
        }

        pages_flushed
    }

    pub fn read(&self, address: u16) -> u8 {
        self.flat[u32::from(address)]
    }

    pub fn write(&mut self, store: &mut BackingStore, address: u16, value: u8) {
        let page = usize::from(address >> 8);
        match self.table.write_target(page) {
            WriteTarget::FlatView => {
                self.flat[u32::from(address)] = value;
                self.dirty.set(page, true);
            }
            WriteTarget::Direct(target) => {
                if let Some(memory) = store.ram_mut(target.buffer) {
                    memory[target.offset + u32::from(address & 0xFF)] = value;
                }
            }
            WriteTarget::Discard => {}
        }
    }

    // Reads a byte of a backing buffer, preferring the flat view's copy if it is showing that page.
    pub fn peek(&self, store: &BackingStore, source: PageSource, low_byte: u8) -> u8 {
        match self.table.page_showing(source) {
            Some(page) => self.flat[page_start(page) + u32::from(low_byte)],
            None => store.page(source)[usize::from(low_byte)],
        }
    }

    fn write_back(&self, store: &mut BackingStore, page: usize, source: PageSource) {
        if let Some(memory) = store.ram_mut(source.buffer) {
            memory.page_mut(source.offset).copy_from_slice(self.flat.page(page_start(page)));
        }
    }
}

fn page_start(page: usize) -> u32 {
    page as u32 * PAGE_SIZE
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::mode_register::ModeRegister;
    use crate::memory::page_table::{BackingBuffer, BankSelection};
    use crate::memory::system_rom::{MachineType, SystemRom};

    const BANKS: BankSelection = BankSelection { aux_bank: 0, saturn_bank: None, peripheral_rom_only: false };

    fn setup(mode: ModeRegister) -> (PagingEngine, BackingStore) {
        let mut image = vec![0xCC; 0x4000];
        image[0x1000..].fill(0xDD);
        let rom = SystemRom::load(MachineType::Apple2eEnhanced, &image).unwrap();
        let mut store = BackingStore::new(rom, 1, false);
        for address in 0..0x10000u32 {
            store.main[address] = (address >> 8) as u8;
            store.aux.bank_mut(0)[address] = !(address >> 8) as u8;
        }

        let table = PageTable::resolve(mode, BANKS);
        let mut engine = PagingEngine::new(table.clone());
        engine.reconcile(&mut store, table, true);
        (engine, store)
    }

    fn switch(engine: &mut PagingEngine, store: &mut BackingStore, mode: ModeRegister) -> ReconcileStats {
        engine.reconcile(store, PageTable::resolve(mode, BANKS), false)
    }

    #[test]
    fn initialize_copies_every_page() {
        let (engine, _) = setup(ModeRegister::cold_start());
        assert_eq!(engine.read(0x1234), 0x12);
        assert_eq!(engine.read(0xC8FF), 0xCC);
        assert_eq!(engine.read(0xD000), 0xDD);
        assert_eq!(engine.dirty_page_count(), 0);
    }

    #[test]
    fn reconcile_without_change_copies_nothing() {
        let (mut engine, mut store) = setup(ModeRegister::cold_start());
        let stats = switch(&mut engine, &mut store, ModeRegister::cold_start());
        assert_eq!(stats, ReconcileStats::default());
    }

    #[test]
    fn dirty_page_is_flushed_before_remap() {
        let mode = ModeRegister::cold_start();
        let (mut engine, mut store) = setup(mode);
        engine.write(&mut store, 0x2000, 0x42);
        assert!(engine.is_dirty(0x20));
        assert_eq!(store.main[0x2000], 0x20);

        let stats = switch(&mut engine, &mut store, mode.with_aux_read(true).with_aux_write(true));
        assert_eq!(store.main[0x2000], 0x42);
        assert_eq!(engine.read(0x2000), !0x20);
        // Only pages $02-$BF changed.
        assert_eq!(stats.pages_copied, 0xBE);
        assert_eq!(stats.pages_flushed, 1);
    }

    #[test]
    fn direct_write_skips_flat_view() {
        let mode = ModeRegister::cold_start().with_aux_write(true);
        let (mut engine, mut store) = setup(mode);
        engine.write(&mut store, 0x3000, 0x77);
        assert_eq!(engine.read(0x3000), 0x30);
        assert_eq!(store.aux.bank(0)[0x3000], 0x77);
        assert!(!engine.is_dirty(0x30));
    }

    #[test]
    fn discarded_write_changes_nothing() {
        let mode = ModeRegister::cold_start().with_write_ram(false);
        let (mut engine, mut store) = setup(mode);
        engine.write(&mut store, 0xE000, 0x01);
        assert_eq!(engine.read(0xE000), 0xDD);
        assert_eq!(store.main[0xE000], 0xE0);
    }

    #[test]
    fn peek_sees_unflushed_writes() {
        let (mut engine, mut store) = setup(ModeRegister::cold_start());
        engine.write(&mut store, 0x0456, 0x99);
        let source = PageSource::new(BackingBuffer::Main, 0x0400);
        assert_eq!(engine.peek(&store, source, 0x56), 0x99);
        assert_eq!(engine.peek(&store, PageSource::new(BackingBuffer::Aux(0), 0x0400), 0x56), !0x04);
    }

    #[test]
    fn flush_writes_dirty_pages_only() {
        let (mut engine, mut store) = setup(ModeRegister::cold_start());
        engine.write(&mut store, 0x0800, 0x11);
        // Pages 0 and 1 are always written back.
        assert_eq!(engine.flush(&mut store), 3);
        assert_eq!(store.main[0x0800], 0x11);
        assert_eq!(engine.dirty_page_count(), 0);
    }
}
