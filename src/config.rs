use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use itertools::Itertools;
use structopt::StructOpt;

use crate::logging::logger::Logger;
use crate::memory::card::Firmware;
use crate::memory::init_pattern::MemoryFill;
use crate::memory::io_table::SLOT_COUNT;
use crate::memory::language_card::LanguageCardKind;
use crate::memory::system_rom::MachineType;

// The machine as configured at power on. Never changes while the machine runs.
#[derive(Clone, Debug)]
pub struct Config {
    pub machine_type: MachineType,
    pub rom_image: Vec<u8>,
    pub custom_f8_rom: Option<Vec<u8>>,
    pub memory_fill: MemoryFill,
    // Without a seed, each run fills memory differently.
    pub fill_seed: Option<u64>,
    pub aux_bank_count: u8,
    pub language_card: LanguageCardKind,
}

impl Config {
    pub fn new(opt: &Opt) -> Result<Config, String> {
        let rom_image = read_file(&opt.rom_path)?;
        let custom_f8_rom = opt.custom_f8_rom_path.as_deref()
            .map(read_file)
            .transpose()?;

        Ok(Config {
            machine_type: opt.machine_type,
            rom_image,
            custom_f8_rom,
            memory_fill: opt.memory_fill,
            fill_seed: opt.fill_seed,
            aux_bank_count: opt.aux_bank_count,
            language_card: opt.language_card,
        })
    }

    // Defaults for everything but the machine itself.
    pub fn with_rom(machine_type: MachineType, rom_image: Vec<u8>) -> Config {
        Config {
            machine_type,
            rom_image,
            custom_f8_rom: None,
            memory_fill: MemoryFill::default(),
            fill_seed: None,
            aux_bank_count: 1,
            language_card: LanguageCardKind::default(),
        }
    }

    pub fn logger(opt: &Opt) -> Logger {
        Logger {
            log_soft_switches: opt.log_soft_switches,
            log_paging: opt.log_paging,
            log_expansion_rom: opt.log_expansion_rom,
            log_language_card: opt.log_language_card,
            log_aux_banks: opt.log_aux_banks,
            log_snapshots: opt.log_snapshots,
        }
    }

    // The firmware of each slot that was given any on the command line.
    pub fn slot_firmware(opt: &Opt) -> Result<BTreeMap<u8, Firmware>, String> {
        let mut firmware: BTreeMap<u8, Firmware> = BTreeMap::new();
        for SlotFile { slot, path } in &opt.slot_roms {
            firmware.entry(*slot).or_default().slot_rom = Some(read_file(path)?);
        }

        for SlotFile { slot, path } in &opt.expansion_roms {
            firmware.entry(*slot).or_default().expansion_rom = Some(read_file(path)?);
        }

        Ok(firmware)
    }
}

fn read_file(path: &Path) -> Result<Vec<u8>, String> {
    fs::read(path).map_err(|err| format!("Failed to read '{}'. {err}", path.display()))
}

#[derive(Debug, StructOpt)]
#[structopt(name = "A2MEM", about = "Apple ][ and //e memory subsystem.")]
pub struct Opt {
    #[structopt(name = "ROM", parse(from_os_str))]
    pub rom_path: PathBuf,

    #[structopt(short, long = "machine", default_value = "apple2eenhanced")]
    pub machine_type: MachineType,

    // Replaces $F800-$FFFF.
    #[structopt(long = "custom-f8", parse(from_os_str))]
    pub custom_f8_rom_path: Option<PathBuf>,

    #[structopt(long = "fill", default_value = "ffff0000")]
    pub memory_fill: MemoryFill,

    #[structopt(long = "seed")]
    pub fill_seed: Option<u64>,

    #[structopt(long = "aux-banks", default_value = "1")]
    pub aux_bank_count: u8,

    #[structopt(long, default_value = "standard")]
    pub language_card: LanguageCardKind,

    // SLOT=PATH
    #[structopt(long = "slot-rom")]
    pub slot_roms: Vec<SlotFile>,

    // SLOT=PATH
    #[structopt(long = "expansion-rom")]
    pub expansion_roms: Vec<SlotFile>,

    #[structopt(long, parse(from_os_str))]
    pub load_snapshot: Option<PathBuf>,

    #[structopt(long, parse(from_os_str))]
    pub save_snapshot: Option<PathBuf>,

    // Hex addresses to read once the machine is set up.
    #[structopt(long)]
    pub peek: Vec<HexAddress>,

    #[structopt(long)]
    pub log_soft_switches: bool,
    #[structopt(long)]
    pub log_paging: bool,
    #[structopt(long)]
    pub log_expansion_rom: bool,
    #[structopt(long)]
    pub log_language_card: bool,
    #[structopt(long)]
    pub log_aux_banks: bool,
    #[structopt(long)]
    pub log_snapshots: bool,
}

#[derive(PartialEq, Eq, Clone, Debug)]
pub struct SlotFile {
    pub slot: u8,
    pub path: PathBuf,
}

impl FromStr for SlotFile {
    type Err = String;

    fn from_str(value: &str) -> Result<SlotFile, String> {
        let (slot, path) = value.split_once('=')
            .ok_or_else(|| format!("Expected SLOT=PATH, but got '{value}'."))?;
        let slot: u8 = slot.trim().parse()
            .map_err(|_| format!("Invalid slot '{slot}'."))?;
        if slot == 0 || slot >= SLOT_COUNT {
            let slots = (1..SLOT_COUNT).join(", ");
            return Err(format!("Slot {slot} can't hold a card. Valid slots: {slots}"));
        }

        Ok(SlotFile { slot, path: PathBuf::from(path) })
    }
}

#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub struct HexAddress(pub u16);

impl FromStr for HexAddress {
    type Err = String;

    fn from_str(value: &str) -> Result<HexAddress, String> {
        let digits = value.trim_start_matches('$').trim_start_matches("0x");
        u16::from_str_radix(digits, 16)
            .map(HexAddress)
            .map_err(|_| format!("Invalid hex address '{value}'."))
    }
}
