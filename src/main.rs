use std::fs;
use std::process;

use itertools::Itertools;
use log::{error, info};
use structopt::StructOpt;

use a2mem::config::{Config, Opt};
use a2mem::logging::logger;
use a2mem::memory::card::FirmwareCard;
use a2mem::memory::memory::Memory;
use a2mem::memory::snapshot::MemorySnapshot;

fn main() {
    let opt = Opt::from_args();
    logger::init(Config::logger(&opt)).expect("Logger can only be initialized once.");

    if let Err(err) = run(&opt) {
        error!("{err}");
        process::exit(1);
    }
}

fn run(opt: &Opt) -> Result<(), String> {
    let config = Config::new(opt)?;
    let mut memory = Memory::new(&config)?;

    for (slot, firmware) in Config::slot_firmware(opt)? {
        let card = FirmwareCard::new(&format!("Slot {slot} firmware"));
        memory.register_card(slot, Box::new(card), firmware)?;
    }

    if let Some(path) = &opt.load_snapshot {
        let text = fs::read_to_string(path)
            .map_err(|err| format!("Failed to read snapshot '{}'. {err}", path.display()))?;
        memory.load_state(&MemorySnapshot::from_json(&text)?)?;
        info!("Loaded snapshot '{}'.", path.display());
    }

    if !opt.peek.is_empty() {
        let values = opt.peek.iter()
            .map(|address| format!("${:04X}: ${:02X}", address.0, memory.read_byte(address.0)))
            .join("\n");
        println!("{values}");
    }

    println!("{:?}", memory.mode());

    if let Some(path) = &opt.save_snapshot {
        let text = memory.save_state().to_json()?;
        fs::write(path, text)
            .map_err(|err| format!("Failed to write snapshot '{}'. {err}", path.display()))?;
        info!("Saved snapshot '{}'.", path.display());
    }

    Ok(())
}
