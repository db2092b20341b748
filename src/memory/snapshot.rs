use std::collections::BTreeMap;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::memory::aux_bank::{AUX_BANK_SIZE, MAX_AUX_BANK_COUNT};
use crate::memory::backing_store::MAIN_MEMORY_SIZE;
use crate::memory::language_card::{SATURN_BANK_COUNT, SATURN_BANK_SIZE};

pub const EIGHTY_COLUMN: &str = "80 Column";
pub const EXTENDED_EIGHTY_COLUMN: &str = "Extended 80 Column";
pub const RAMWORKS_III: &str = "RamWorksIII";

// The memory subsystem's part of a machine snapshot.
#[derive(Serialize, Deserialize, Clone, PartialEq, Eq, Debug)]
pub struct MemorySnapshot {
    #[serde(rename = "Memory Mode")]
    pub memory_mode: u32,
    #[serde(rename = "Last RAM Write")]
    pub last_ram_write: u32,
    #[serde(rename = "IO_SELECT")]
    pub io_select: u8,
    #[serde(rename = "IO_SELECT_InternalROM")]
    pub io_select_internal_rom: u8,
    #[serde(rename = "Expansion ROM Type")]
    pub expansion_rom_type: u32,
    #[serde(rename = "Peripheral ROM Slot")]
    pub peripheral_rom_slot: u8,
    #[serde(rename = "Main Memory")]
    pub main_memory: MemoryBlock,
    #[serde(rename = "Aux Slot", default, skip_serializing_if = "Option::is_none")]
    pub aux_slot: Option<AuxSlotSnapshot>,
    #[serde(rename = "Saturn", default, skip_serializing_if = "Option::is_none")]
    pub saturn: Option<SaturnSnapshot>,
}

// The //e auxiliary slot card.
#[derive(Serialize, Deserialize, Clone, PartialEq, Eq, Debug)]
pub struct AuxSlotSnapshot {
    #[serde(rename = "Card")]
    pub card: String,
    #[serde(rename = "Num Aux Banks")]
    pub bank_count: u8,
    #[serde(rename = "Active Aux Bank")]
    pub active_bank: u8,
    // Only banks that have been allocated, keyed by aux_bank_key().
    #[serde(rename = "Auxiliary Memory Banks", default)]
    pub banks: BTreeMap<String, MemoryBlock>,
}

#[derive(Serialize, Deserialize, Clone, PartialEq, Eq, Debug)]
pub struct SaturnSnapshot {
    #[serde(rename = "Active Bank")]
    pub active_bank: u8,
    #[serde(rename = "Banks")]
    pub banks: Vec<MemoryBlock>,
}

pub fn aux_bank_key(bank: u8) -> String {
    format!("Auxiliary Memory Bank{bank:02X}")
}

impl MemorySnapshot {
    pub fn to_json(&self) -> Result<String, String> {
        serde_json::to_string_pretty(self)
            .map_err(|err| format!("Failed to serialize memory snapshot. {err}"))
    }

    // Fails with the name of the first missing or malformed key.
    pub fn from_json(text: &str) -> Result<MemorySnapshot, String> {
        serde_json::from_str(text)
            .map_err(|err| format!("Invalid memory snapshot: {err}"))
    }

    // Checks everything that can be checked without a machine to apply the snapshot to.
    pub fn validate(&self) -> Result<(), String> {
        if self.main_memory.len() != MAIN_MEMORY_SIZE as usize {
            return Err(format!(
                "'Main Memory' must be {MAIN_MEMORY_SIZE} bytes, but was {} bytes.",
                self.main_memory.len(),
            ));
        }

        if self.last_ram_write > 1 {
            return Err(format!("'Last RAM Write' must be 0 or 1, but was {}.", self.last_ram_write));
        }

        if self.io_select_internal_rom > 1 {
            return Err(format!("'IO_SELECT_InternalROM' must be 0 or 1, but was {}.", self.io_select_internal_rom));
        }

        if let Some(aux_slot) = &self.aux_slot {
            aux_slot.validate()?;
        }

        if let Some(saturn) = &self.saturn {
            saturn.validate()?;
        }

        Ok(())
    }
}

impl AuxSlotSnapshot {
    pub fn validate(&self) -> Result<(), String> {
        match self.card.as_str() {
            EIGHTY_COLUMN if self.bank_count != 0 =>
                return Err(format!("An {EIGHTY_COLUMN} card has no aux banks, but {} were specified.", self.bank_count)),
            EXTENDED_EIGHTY_COLUMN if self.bank_count != 1 || self.active_bank != 0 =>
                return Err(format!("An {EXTENDED_EIGHTY_COLUMN} card has exactly one aux bank.")),
            RAMWORKS_III if !(2..=MAX_AUX_BANK_COUNT).contains(&self.bank_count) =>
                return Err(format!(
                    "A {RAMWORKS_III} card must have 2 to {MAX_AUX_BANK_COUNT} aux banks, but {} were specified.",
                    self.bank_count,
                )),
            EIGHTY_COLUMN | EXTENDED_EIGHTY_COLUMN | RAMWORKS_III => {}
            card => return Err(format!("Unknown aux slot card '{card}'.")),
        }

        if self.bank_count > 0 && self.active_bank >= self.bank_count {
            return Err(format!(
                "'Active Aux Bank' {} must be less than 'Num Aux Banks' {}.",
                self.active_bank,
                self.bank_count,
            ));
        }

        for (key, block) in &self.banks {
            let bank = self.bank_from_key(key)?;
            if bank >= self.bank_count {
                return Err(format!("'{key}' is beyond 'Num Aux Banks' {}.", self.bank_count));
            }

            if block.len() != AUX_BANK_SIZE as usize {
                return Err(format!("'{key}' must be {AUX_BANK_SIZE} bytes, but was {} bytes.", block.len()));
            }
        }

        if self.bank_count > 0 && !self.banks.contains_key(&aux_bank_key(0)) {
            return Err(format!("Missing key '{}'.", aux_bank_key(0)));
        }

        Ok(())
    }

    // Bank numbers and contents in bank order. Call only after validate() succeeds.
    pub fn bank_contents(&self) -> Result<Vec<(u8, Vec<u8>)>, String> {
        self.banks.iter()
            .map(|(key, block)| Ok((self.bank_from_key(key)?, block.0.clone())))
            .collect()
    }

    fn bank_from_key(&self, key: &str) -> Result<u8, String> {
        key.strip_prefix("Auxiliary Memory Bank")
            .and_then(|number| u8::from_str_radix(number, 16).ok())
            .ok_or_else(|| format!("Unexpected aux bank key '{key}'."))
    }
}

impl SaturnSnapshot {
    pub fn validate(&self) -> Result<(), String> {
        if self.active_bank >= SATURN_BANK_COUNT {
            return Err(format!("Saturn 'Active Bank' {} must be less than {SATURN_BANK_COUNT}.", self.active_bank));
        }

        if self.banks.len() != usize::from(SATURN_BANK_COUNT) {
            return Err(format!("A Saturn card has {SATURN_BANK_COUNT} banks, but {} were saved.", self.banks.len()));
        }

        if let Some(bank) = self.banks.iter().position(|bank| bank.len() != SATURN_BANK_SIZE as usize) {
            return Err(format!("Saturn bank {bank} must be {SATURN_BANK_SIZE} bytes."));
        }

        Ok(())
    }
}

// A block of memory, base64 encoded when serialized.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct MemoryBlock(pub Vec<u8>);

impl MemoryBlock {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for MemoryBlock {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(&self.0))
    }
}

impl<'de> Deserialize<'de> for MemoryBlock {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<MemoryBlock, D::Error> {
        let text = String::deserialize(deserializer)?;
        STANDARD.decode(text.as_bytes())
            .map(MemoryBlock)
            .map_err(|err| serde::de::Error::custom(format!("invalid base64 memory block: {err}")))
    }
}
