#![allow(dead_code)]

use a2mem::config::Config;
use a2mem::memory::init_pattern::{MemoryFill, MemoryInitPattern};
use a2mem::memory::memory::Memory;
use a2mem::memory::system_rom::MachineType;

// Every ROM byte holds the high byte of the address it appears at, so $D123 reads $D1.
pub fn rom_image(machine_type: MachineType) -> Vec<u8> {
    let start: u32 = if machine_type.is_apple2() { 0xD000 } else { 0xC000 };
    (0..machine_type.rom_size())
        .map(|offset| ((start + offset) >> 8) as u8)
        .collect()
}

// Zero filled RAM and a fixed seed, so every run starts out the same.
pub fn config(machine_type: MachineType) -> Config {
    let mut config = Config::with_rom(machine_type, rom_image(machine_type));
    config.memory_fill = MemoryFill::Fixed(MemoryInitPattern::Zero);
    config.fill_seed = Some(0);
    config
}

pub fn memory() -> Memory {
    memory_with(config(MachineType::Apple2eEnhanced))
}

pub fn memory_with(config: Config) -> Memory {
    Memory::new(&config).unwrap()
}

// A 2KB expansion ROM whose bytes can't be mistaken for the internal ROM's.
pub fn expansion_rom(seed: u8) -> Vec<u8> {
    (0..0x800u32).map(|offset| (offset as u8) ^ seed).collect()
}

// The $C800-$CFFF window is drawn outside of the page tables, so it is skipped.
pub fn assert_flat_view_matches_shadow(memory: &Memory) {
    for page in (0x00..0x100).filter(|page| !(0xC8..0xD0).contains(page)) {
        assert_eq!(
            memory.flat_page(page),
            memory.shadow_page(page),
            "Page ${page:02X} differs from {:?} in mode {:?}",
            memory.page_table().shadow(page),
            memory.mode(),
        );
    }
}

// Reads the same language card switch twice, as software does to enable writes.
pub fn double_read(memory: &mut Memory, address: u16) {
    memory.read_byte(address);
    memory.read_byte(address);
}
