use std::collections::BTreeMap;

use log::{info, warn};
use num_traits::FromPrimitive;
use rand::rngs::StdRng;

use crate::config::Config;
use crate::memory::aux_bank::{AuxBankSelector, MAX_AUX_BANK_COUNT};
use crate::memory::backing_store::BackingStore;
use crate::memory::card::{Card, Firmware};
use crate::memory::expansion_rom::{
    ExpansionRomOverlay, ExpansionRomType, SlotRomContext, WindowFill,
    EXPANSION_ROM_SIZE, EXPANSION_ROM_START,
};
use crate::memory::init_pattern::{seeded_rng, MemoryFill};
use crate::memory::io_table::{IoDispatchTable, IoHandler, SLOT_COUNT};
use crate::memory::language_card::{LanguageCard, LanguageCardKind};
use crate::memory::mode_register::{ModeFlag, ModeRegister};
use crate::memory::motherboard::{FixedScanner, FloatingBus, Motherboard, NullMotherboard};
use crate::memory::page_table::{BackingBuffer, BankSelection, PageSource, PageTable};
use crate::memory::paging::{PagingEngine, ReconcileStats};
use crate::memory::raw_memory::RawMemory;
use crate::memory::read_result::ReadResult;
use crate::memory::snapshot::{
    aux_bank_key, AuxSlotSnapshot, MemoryBlock, MemorySnapshot, SaturnSnapshot,
    EIGHTY_COLUMN, EXTENDED_EIGHTY_COLUMN, RAMWORKS_III,
};
use crate::memory::soft_switch::{self, SwitchAccess};
use crate::memory::system_rom::{MachineType, SystemRom};
use crate::util::unit::PAGE_SIZE;

const IO_START: u16 = 0xC000;
const IO_END: u16 = 0xCFFF;
// The shared window's copy inside the peripheral Cx ROM scratch buffer.
const WINDOW_SCRATCH_START: u32 = 0x800;
const WINDOW_SCRATCH_END: u32 = WINDOW_SCRATCH_START + EXPANSION_ROM_SIZE;
const WINDOW_FLAT_START: u32 = EXPANSION_ROM_START as u32;
const WINDOW_FLAT_END: u32 = WINDOW_FLAT_START + EXPANSION_ROM_SIZE;

// What a memory management access changes before the page tables are brought up to date.
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
enum PagingChange {
    Flag(ModeFlag, bool),
    LanguageCard,
    AuxBank(u8),
}

// The complete memory subsystem of one machine: every backing buffer, the flat view that the CPU
// sees, and the $C000-$CFFF I/O decode.
pub struct Memory {
    machine_type: MachineType,
    mode: ModeRegister,
    store: BackingStore,
    paging: PagingEngine,
    io_table: IoDispatchTable,
    overlay: ExpansionRomOverlay,
    language_card: LanguageCard,
    // Index 0 is never populated.
    cards: [Option<Box<dyn Card>>; SLOT_COUNT as usize],
    expansion_roms: [Option<RawMemory>; SLOT_COUNT as usize],
    // Set when an instruction pattern asked for the page table update to wait for the next switch.
    deferred_reconcile: bool,
    memory_fill: MemoryFill,
    rng: StdRng,
    motherboard: Box<dyn Motherboard>,
    floating_bus: Box<dyn FloatingBus>,
}

impl std::fmt::Debug for Memory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Memory")
            .field("machine_type", &self.machine_type)
            .field("mode", &self.mode)
            .finish_non_exhaustive()
    }
}

impl Memory {
    pub fn new(config: &Config) -> Result<Memory, String> {
        let mut rom = SystemRom::load(config.machine_type, &config.rom_image)?;
        if let Some(custom_f8_rom) = &config.custom_f8_rom
            && let Err(err) = rom.apply_custom_f8_rom(custom_f8_rom)
        {
            warn!("{err} Keeping the stock ROM.");
        }

        if !(1..=MAX_AUX_BANK_COUNT).contains(&config.aux_bank_count) {
            return Err(format!(
                "The aux bank count must be 1 through {MAX_AUX_BANK_COUNT}, but was {}.",
                config.aux_bank_count,
            ));
        }

        let saturn = config.language_card == LanguageCardKind::Saturn128K;
        let language_card = LanguageCard::new(config.language_card);
        let mode = ModeRegister::cold_start();
        let banks = BankSelection {
            aux_bank: 0,
            saturn_bank: language_card.saturn_bank(),
            peripheral_rom_only: config.machine_type.is_apple2(),
        };

        let mut memory = Memory {
            machine_type: config.machine_type,
            mode,
            store: BackingStore::new(rom, config.aux_bank_count, saturn),
            paging: PagingEngine::new(PageTable::resolve(mode, banks)),
            io_table: IoDispatchTable::new(),
            overlay: ExpansionRomOverlay::new(),
            language_card,
            cards: std::array::from_fn(|_| None),
            expansion_roms: std::array::from_fn(|_| None),
            deferred_reconcile: false,
            memory_fill: config.memory_fill,
            rng: seeded_rng(config.fill_seed),
            motherboard: Box::new(NullMotherboard),
            floating_bus: Box::new(FixedScanner::default()),
        };
        memory.cold_reset();
        Ok(memory)
    }

    pub fn set_motherboard(&mut self, motherboard: Box<dyn Motherboard>) {
        self.motherboard = motherboard;
    }

    pub fn set_floating_bus(&mut self, floating_bus: Box<dyn FloatingBus>) {
        self.floating_bus = floating_bus;
    }

    pub fn machine_type(&self) -> MachineType {
        self.machine_type
    }

    pub fn mode(&self) -> ModeRegister {
        self.mode
    }

    pub fn io_select_state(&self) -> ExpansionRomOverlay {
        self.overlay
    }

    pub fn language_card(&self) -> &LanguageCard {
        &self.language_card
    }

    pub fn aux_banks(&self) -> &AuxBankSelector {
        &self.store.aux
    }

    pub fn page_table(&self) -> &PageTable {
        self.paging.table()
    }

    pub fn io_handler(&self, address: u16) -> IoHandler {
        self.io_table.handler(address)
    }

    pub fn is_reconcile_deferred(&self) -> bool {
        self.deferred_reconcile
    }

    // What the CPU currently sees at the specified page.
    pub fn flat_page(&self, page: usize) -> &[u8; PAGE_SIZE as usize] {
        self.paging.flat().page(page as u32 * PAGE_SIZE)
    }

    // The backing bytes that the specified page is mapped to.
    pub fn shadow_page(&self, page: usize) -> &[u8; PAGE_SIZE as usize] {
        self.store.page(self.paging.table().shadow(page))
    }

    pub fn cold_reset(&mut self) {
        info!("Cold reset.");
        self.store.clear_ram();
        let pattern = self.memory_fill.pick(&mut self.rng);
        info!("Filling main memory with the {pattern} pattern.");
        pattern.fill(&mut self.store.main, &mut self.rng);

        self.overlay = ExpansionRomOverlay::new();
        self.language_card.power_on();
        self.mode = ModeRegister::cold_start();
        if !self.io_table.are_cards_in() {
            self.io_table.cards_in();
        }

        self.remap(true);
    }

    // Ctrl+Reset. Memory contents survive.
    pub fn soft_reset(&mut self) {
        info!("Soft reset.");
        let old_mode = self.mode;
        self.language_card.reset();
        self.mode = ModeRegister::cold_start();
        ModeRegister::log_changes(old_mode, self.mode);
        if old_mode.slot_cx_rom() != self.mode.slot_cx_rom() {
            self.slot_cx_rom_changed();
        }

        self.reconcile(false);
    }

    // Brings the page tables and the flat view up to date with the mode register and the selected
    // banks. With initialize set, pending writes are flushed, every page is reloaded and the $C800
    // window is redrawn.
    pub fn reconcile(&mut self, initialize: bool) -> ReconcileStats {
        let pages_flushed = if initialize { self.flush() } else { 0 };
        let mut stats = self.remap(initialize);
        stats.pages_flushed += pages_flushed;
        stats
    }

    // Only for when the backing buffers were just replaced wholesale: with initialize set, whatever
    // the flat view holds is discarded rather than written back over the new contents.
    fn remap(&mut self, initialize: bool) -> ReconcileStats {
        let table = PageTable::resolve(self.mode, self.bank_selection());
        let stats = self.paging.reconcile(&mut self.store, table, initialize);
        self.deferred_reconcile = false;
        if initialize {
            self.apply_window_fill(self.overlay.current_fill());
        }

        stats
    }

    // Writes every dirty page of the flat view back to its backing buffer.
    pub fn flush(&mut self) -> u32 {
        self.paging.flush(&mut self.store)
    }

    pub fn cpu_read(&mut self, program_counter: u16, address: u16) -> u8 {
        self.read(Some(program_counter), address)
    }

    pub fn cpu_write(&mut self, program_counter: u16, address: u16, value: u8) {
        self.write(Some(program_counter), address, value);
    }

    // For DMA style transfers. Routed exactly like a CPU access.
    pub fn read_byte(&mut self, address: u16) -> u8 {
        self.read(None, address)
    }

    pub fn write_byte(&mut self, address: u16, value: u8) {
        self.write(None, address, value);
    }

    // Side effect free reads of physical RAM, including writes that haven't been flushed yet.
    pub fn peek_main(&self, address: u16) -> u8 {
        self.peek(BackingBuffer::Main, address)
    }

    pub fn peek_aux(&self, address: u16) -> u8 {
        self.peek(BackingBuffer::Aux(self.store.aux.active()), address)
    }

    pub fn register_card(&mut self, slot: u8, card: Box<dyn Card>, firmware: Firmware) -> Result<(), String> {
        if slot == 0 || slot >= SLOT_COUNT {
            return Err(format!("Cards can only be registered in slots 1 through 7, not slot {slot}."));
        }

        if self.io_table.is_populated(slot) {
            return Err(format!("Slot {slot} already holds a card."));
        }

        firmware.validate()?;

        if let Some(slot_rom) = &firmware.slot_rom {
            let start = u32::from(slot) * PAGE_SIZE;
            self.store.peripheral_cx_rom
                .slice_mut(start..start + PAGE_SIZE)
                .copy_from_slice(slot_rom);
            self.paging.reload(&self.store, 0xC0 + usize::from(slot));
        }

        self.expansion_roms[usize::from(slot)] = firmware.expansion_rom.map(RawMemory::from_vec);
        self.io_table.register(slot, card.handles_own_rom());
        info!("Slot {slot}: {} registered.", card.name());
        self.cards[usize::from(slot)] = Some(card);
        Ok(())
    }

    // The generic $C100-$CFFF decode: steps the expansion ROM latches, then reads the flat view
    // unless nothing is driving the bus.
    pub fn expansion_decode(&mut self, address: u16) -> u8 {
        let context = self.slot_rom_context();
        if let Some(fill) = self.overlay.access(address, context) {
            self.apply_window_fill(fill);
        }

        if ExpansionRomOverlay::is_clock_window(address, context)
            && let Some(value) = self.motherboard.internal_rom_access(address)
        {
            return value;
        }

        if let Some(fill) = self.overlay.internal_access(address, context) {
            self.apply_window_fill(fill);
        }

        if address < EXPANSION_ROM_START {
            let slot = ((address >> 8) & 0x7) as u8;
            let peripheral_rom_visible = self.machine_type.is_apple2()
                || (self.mode.slot_cx_rom() && !(slot == 3 && !self.mode.slot_c3_rom()));
            if peripheral_rom_visible && !self.io_table.is_populated(slot) {
                return self.floating_bus();
            }
        } else if self.overlay.is_null() {
            return self.floating_bus();
        }

        self.paging.read(address)
    }

    // The byte the video scanner is fetching this cycle.
    pub fn floating_bus(&self) -> u8 {
        self.paging.read(self.floating_bus.scanner_address())
    }

    pub fn save_state(&mut self) -> MemorySnapshot {
        self.flush();

        let aux_slot = if self.machine_type.is_apple2() {
            None
        } else {
            let aux = &self.store.aux;
            let card = if aux.bank_count() == 1 { EXTENDED_EIGHTY_COLUMN } else { RAMWORKS_III };
            let banks: BTreeMap<String, MemoryBlock> = aux.allocated_banks()
                .map(|(bank, memory)| (aux_bank_key(bank), MemoryBlock(memory.as_slice().to_vec())))
                .collect();
            Some(AuxSlotSnapshot {
                card: card.to_owned(),
                bank_count: aux.bank_count(),
                active_bank: aux.active(),
                banks,
            })
        };

        let saturn = self.language_card.saturn_bank().map(|active_bank| SaturnSnapshot {
            active_bank,
            banks: self.store.saturn.iter().map(|bank| MemoryBlock(bank.as_slice().to_vec())).collect(),
        });

        info!(target: "snapshot", "Saved memory state: mode {:?}, {} aux banks.",
            self.mode,
            aux_slot.as_ref().map_or(0, |aux| aux.banks.len()),
        );

        MemorySnapshot {
            memory_mode: self.mode.to_word(),
            last_ram_write: u32::from(self.language_card.last_was_odd_read()),
            io_select: self.overlay.io_select(),
            io_select_internal_rom: u8::from(self.overlay.io_select_internal()),
            expansion_rom_type: self.overlay.rom_type() as u32,
            peripheral_rom_slot: self.overlay.peripheral_slot(),
            main_memory: MemoryBlock(self.store.main.as_slice().to_vec()),
            aux_slot,
            saturn,
        }
    }

    // Nothing is changed unless the whole snapshot is valid for this machine.
    pub fn load_state(&mut self, snapshot: &MemorySnapshot) -> Result<(), String> {
        snapshot.validate()?;

        let mode = ModeRegister::from_word(snapshot.memory_mode)?;
        let rom_type = ExpansionRomType::from_u32(snapshot.expansion_rom_type)
            .ok_or_else(|| format!("'Expansion ROM Type' {} is not a valid type.", snapshot.expansion_rom_type))?;
        let overlay = ExpansionRomOverlay::restore(
            snapshot.io_select,
            snapshot.io_select_internal_rom != 0,
            rom_type,
            snapshot.peripheral_rom_slot,
        )?;

        let aux = match (&snapshot.aux_slot, self.machine_type.is_apple2()) {
            (None, true) => None,
            (Some(_), true) => return Err(format!("An {} has no aux slot, but 'Aux Slot' is present.", self.machine_type)),
            (None, false) => return Err("Missing key 'Aux Slot'.".to_owned()),
            // A plain 80 column card has no memory of its own, leave a cleared base bank.
            (Some(aux), false) if aux.card == EIGHTY_COLUMN => Some((1, 0, Vec::new())),
            (Some(aux), false) => Some((aux.bank_count, aux.active_bank, aux.bank_contents()?)),
        };

        let mut language_card = self.language_card.clone();
        language_card.set_last_was_odd_read(snapshot.last_ram_write != 0);
        match (&snapshot.saturn, language_card.kind()) {
            (Some(saturn), LanguageCardKind::Saturn128K) => language_card.set_saturn_bank(saturn.active_bank)?,
            (None, LanguageCardKind::Saturn128K) => return Err("Missing key 'Saturn'.".to_owned()),
            (Some(_), LanguageCardKind::Standard16K) =>
                return Err("The snapshot has Saturn banks, but a standard language card is installed.".to_owned()),
            (None, LanguageCardKind::Standard16K) => {}
        }

        // Buffers first, then latches and mode, then the page tables.
        self.store.main.as_mut_slice().copy_from_slice(&snapshot.main_memory.0);
        if let Some((bank_count, active, contents)) = aux {
            self.store.aux.restore(bank_count, active, contents);
        }

        if let Some(saturn) = &snapshot.saturn {
            for (bank, block) in self.store.saturn.iter_mut().zip(&saturn.banks) {
                bank.as_mut_slice().copy_from_slice(&block.0);
            }
        }

        self.language_card = language_card;
        self.overlay = overlay;
        self.mode = mode;
        self.remap(true);
        if self.mode.slot_cx_rom() {
            self.io_table.cards_in();
        } else {
            self.io_table.cards_out();
        }

        info!(target: "snapshot", "Loaded memory state: mode {:?}, overlay {:?}.", self.mode, self.overlay.rom_type());
        Ok(())
    }

    fn read(&mut self, program_counter: Option<u16>, address: u16) -> u8 {
        if (IO_START..=IO_END).contains(&address) {
            self.io_access(program_counter, address, None)
        } else {
            self.paging.read(address)
        }
    }

    fn write(&mut self, program_counter: Option<u16>, address: u16, value: u8) {
        if (IO_START..=IO_END).contains(&address) {
            self.io_access(program_counter, address, Some(value));
        } else {
            self.paging.write(&mut self.store, address, value);
        }
    }

    fn peek(&self, buffer: BackingBuffer, address: u16) -> u8 {
        let source = PageSource::new(buffer, u32::from(address & 0xFF00));
        self.paging.peek(&self.store, source, address as u8)
    }

    // Writes pass Some(value). The return value is meaningless for writes.
    fn io_access(&mut self, program_counter: Option<u16>, address: u16, write: Option<u8>) -> u8 {
        match self.io_table.handler(address) {
            IoHandler::SoftSwitches => self.soft_switch_access(program_counter, address, write),
            IoHandler::LanguageCard =>
                self.set_paging(program_counter, address, write, PagingChange::LanguageCard, false),
            IoHandler::SlotRegisters(slot) => self.card_access(slot, address, write, false),
            IoHandler::CardRom(slot) => self.card_access(slot, address, write, true),
            IoHandler::ExpansionDecode => self.expansion_decode(address),
            IoHandler::Null => self.unclaimed_access(write),
        }
    }

    fn soft_switch_access(&mut self, program_counter: Option<u16>, address: u16, write: Option<u8>) -> u8 {
        match soft_switch::decode(address as u8, write.is_some(), self.machine_type.is_apple2()) {
            SwitchAccess::Mode { flag, value, motherboard_too } => {
                let change = PagingChange::Flag(flag, value);
                self.set_paging(program_counter, address, write, change, motherboard_too)
            }
            SwitchAccess::AuxBankSelect => {
                let change = PagingChange::AuxBank(write.unwrap_or_default());
                self.set_paging(program_counter, address, write, change, false)
            }
            SwitchAccess::Status { flag, inverted } => {
                let set = self.mode.flag(flag) != inverted;
                ReadResult::high_bit(set).resolve(self.motherboard.keycode())
            }
            SwitchAccess::Motherboard => self.motherboard_access(address, write),
        }
    }

    fn set_paging(
        &mut self,
        program_counter: Option<u16>,
        address: u16,
        write: Option<u8>,
        change: PagingChange,
        motherboard_too: bool,
    ) -> u8 {
        let old_mode = self.mode;
        let old_banks = self.bank_selection();
        match change {
            PagingChange::Flag(flag, value) => self.mode.set_flag(flag, value),
            PagingChange::LanguageCard =>
                self.language_card.access(&mut self.mode, (address & 0xF) as u8, write.is_some()),
            PagingChange::AuxBank(bank) => {
                self.store.aux.select(bank);
            }
        }

        ModeRegister::log_changes(old_mode, self.mode);

        if let Some(program_counter) = program_counter
            && self.next_instruction_switches_read_bank(program_counter, address as u8)
        {
            info!(target: "paging", "Deferring reconcile for the instruction at ${program_counter:04X}.");
            self.deferred_reconcile = true;
            return match write {
                Some(_) => 0,
                None => ReadResult::high_bit(true).resolve(self.floating_bus()),
            };
        }

        if self.mode != old_mode || self.bank_selection() != old_banks || self.deferred_reconcile {
            if old_mode.slot_cx_rom() != self.mode.slot_cx_rom() {
                self.slot_cx_rom_changed();
            }

            self.reconcile(false);
        }

        if motherboard_too {
            self.motherboard_access(address, write)
        } else {
            self.unclaimed_access(write)
        }
    }

    // A write to RAMWRT (or a language card switch) immediately followed by STA $C002-$C005 only
    // makes sense as a pair, so the page tables are left stale until the second switch.
    fn next_instruction_switches_read_bank(&self, program_counter: u16, switch: u8) -> bool {
        let opcode = self.paging.read(program_counter);
        let operand_low = self.paging.read(program_counter.wrapping_add(1));
        let operand_high = self.paging.read(program_counter.wrapping_add(2));
        // STA $C0xx, absolute.
        let stores_to_switch = opcode == 0x8D && operand_high == 0xC0;
        match switch {
            0x04 | 0x05 => stores_to_switch && operand_low & 0xFE == 0x02,
            0x80..=0x8F => program_counter < IO_START
                && stores_to_switch
                && matches!(operand_low & 0xFE, 0x02 | 0x04),
            _ => false,
        }
    }

    fn slot_cx_rom_changed(&mut self) {
        let fill = if self.mode.slot_cx_rom() {
            self.io_table.cards_in();
            self.overlay.slot_cx_rom_enabled()
        } else {
            self.io_table.cards_out();
            self.overlay.slot_cx_rom_disabled()
        };
        self.apply_window_fill(fill);
    }

    // The $C800-$CFFF window is written directly, outside of the page tables.
    fn apply_window_fill(&mut self, fill: WindowFill) {
        let window = WINDOW_FLAT_START..WINDOW_FLAT_END;
        match fill {
            WindowFill::Clear => {
                self.store.peripheral_cx_rom.fill(WINDOW_SCRATCH_START..WINDOW_SCRATCH_END, 0);
                self.paging.flat_mut().fill(window, 0);
            }
            WindowFill::Internal => {
                let internal = self.store.rom.internal_cx_rom().slice(WINDOW_SCRATCH_START..WINDOW_SCRATCH_END);
                self.paging.flat_mut().slice_mut(window).copy_from_slice(internal);
            }
            WindowFill::Peripheral(slot) => match &self.expansion_roms[usize::from(slot)] {
                Some(rom) => {
                    self.store.peripheral_cx_rom
                        .slice_mut(WINDOW_SCRATCH_START..WINDOW_SCRATCH_END)
                        .copy_from_slice(rom.as_slice());
                    self.paging.flat_mut().slice_mut(window).copy_from_slice(rom.as_slice());
                }
                None => self.apply_window_fill(WindowFill::Clear),
            },
        }
    }

    fn card_access(&mut self, slot: u8, address: u16, write: Option<u8>, rom: bool) -> u8 {
        // The card is out of its slot while its handler runs.
        let Some(mut card) = self.cards[usize::from(slot)].take() else {
            return self.unclaimed_access(write);
        };

        let result = match (write, rom) {
            (None, false) => Some(card.io_read(self, address)),
            (None, true) => Some(card.rom_read(self, address)),
            (Some(value), false) => {
                card.io_write(self, address, value);
                None
            }
            (Some(value), true) => {
                card.rom_write(self, address, value);
                None
            }
        };

        self.cards[usize::from(slot)] = Some(card);
        result.map_or(0, |result| result.resolve(self.floating_bus()))
    }

    fn motherboard_access(&mut self, address: u16, write: Option<u8>) -> u8 {
        let result = self.motherboard.access(address, write);
        match write {
            Some(_) => 0,
            None => result.resolve(self.floating_bus()),
        }
    }

    fn unclaimed_access(&self, write: Option<u8>) -> u8 {
        match write {
            Some(_) => 0,
            None => self.floating_bus(),
        }
    }

    fn bank_selection(&self) -> BankSelection {
        BankSelection {
            aux_bank: self.store.aux.active(),
            saturn_bank: self.language_card.saturn_bank(),
            peripheral_rom_only: self.machine_type.is_apple2(),
        }
    }

    fn slot_rom_context(&self) -> SlotRomContext {
        let apple2 = self.machine_type.is_apple2();
        let expansion_roms = self.expansion_roms.iter()
            .enumerate()
            .filter(|(_, rom)| rom.is_some())
            .fold(0u8, |mask, (slot, _)| mask | (1 << slot));
        SlotRomContext {
            apple2,
            slot_cx_rom: apple2 || self.mode.slot_cx_rom(),
            slot_c3_rom: apple2 || self.mode.slot_c3_rom(),
            expansion_roms,
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::card::FirmwareCard;

    struct Keyboard(u8);

    impl Motherboard for Keyboard {
        fn keycode(&self) -> u8 {
            self.0
        }

        fn access(&mut self, address: u16, write: Option<u8>) -> ReadResult {
            match (address, write) {
                (0xC000, None) => ReadResult::full(self.0),
                _ => ReadResult::FLOATING_BUS,
            }
        }
    }

    #[test]
    fn cold_start_shows_rom_and_cleared_ram() {
        let mut memory = test_data::memory();
        assert_eq!(memory.read_byte(0x1234), 0x00);
        assert_eq!(memory.read_byte(0xD000), 0xD0);
        assert_eq!(memory.read_byte(0xFFFC), 0xFF);
        assert_eq!(memory.mode(), ModeRegister::cold_start());
        // Compatibility fixups.
        assert_eq!(memory.read_byte(0x004E) & 0x20, 0x20);
    }

    #[test]
    fn status_reads_combine_flag_and_keyboard() {
        let mut memory = test_data::memory();
        memory.set_motherboard(Box::new(Keyboard(0xC1)));
        // BANK2 is on at cold start.
        assert_eq!(memory.read_byte(0xC011), 0xC1);
        // HIGHRAM is off.
        assert_eq!(memory.read_byte(0xC012), 0x41);
        // INTCXROM reads as the complement of SLOTCXROM.
        assert_eq!(memory.read_byte(0xC015), 0x41);
        memory.write_byte(0xC007, 0);
        assert_eq!(memory.read_byte(0xC015), 0xC1);
        assert_eq!(memory.read_byte(0xC000), 0xC1);
    }

    #[test]
    fn ram_write_switches_redirect_writes() {
        let mut memory = test_data::memory();
        memory.write_byte(0xC005, 0);
        memory.write_byte(0x3000, 0x5A);
        assert_eq!(memory.read_byte(0x3000), 0x00);
        assert_eq!(memory.peek_aux(0x3000), 0x5A);
        memory.write_byte(0xC003, 0);
        assert_eq!(memory.read_byte(0x3000), 0x5A);
    }

    #[test]
    fn turning_off_slot_cx_rom_switches_in_internal_rom() {
        let mut memory = test_data::memory();
        assert_eq!(memory.read_byte(0xC600), memory.floating_bus());
        memory.write_byte(0xC007, 0);
        assert_eq!(memory.read_byte(0xC600), 0xC6);
        assert_eq!(memory.read_byte(0xC800), 0xC8);
        assert_eq!(memory.io_select_state().rom_type(), ExpansionRomType::Internal);

        memory.write_byte(0xC006, 0);
        assert!(memory.io_select_state().is_null());
        assert_eq!(memory.read_byte(0xC800), memory.floating_bus());
    }

    #[test]
    fn card_slot_rom_becomes_visible() {
        let mut memory = test_data::memory();
        let firmware = Firmware { slot_rom: Some(vec![0x42; 0x100]), expansion_rom: None };
        memory.register_card(5, Box::new(FirmwareCard::new("test")), firmware).unwrap();
        assert_eq!(memory.read_byte(0xC510), 0x42);
        assert!(memory.register_card(5, Box::new(FirmwareCard::new("again")), Firmware::none()).is_err());
        assert!(memory.register_card(0, Box::new(FirmwareCard::new("zero")), Firmware::none()).is_err());
    }

    #[test]
    fn soft_reset_keeps_memory() {
        let mut memory = test_data::memory();
        memory.write_byte(0x0800, 0x77);
        memory.write_byte(0xC009, 0);
        memory.write_byte(0xC007, 0);
        memory.soft_reset();
        assert_eq!(memory.mode(), ModeRegister::cold_start());
        assert_eq!(memory.read_byte(0x0800), 0x77);
        assert!(memory.io_select_state().is_null());
    }

    #[test]
    fn apple2_has_no_aux_switches() {
        let mut memory = Memory::new(&test_data::config(MachineType::Apple2Plus)).unwrap();
        memory.write_byte(0xC005, 0);
        assert_eq!(memory.mode(), ModeRegister::cold_start());
        // The language card works the same.
        memory.read_byte(0xC080);
        assert!(memory.mode().high_ram());
        assert!(memory.save_state().aux_slot.is_none());
    }
}
