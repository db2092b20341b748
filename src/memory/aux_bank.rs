use log::{info, warn};

use crate::memory::raw_memory::RawMemory;
use crate::util::unit::KIBIBYTE;

pub const AUX_BANK_SIZE: u32 = 64 * KIBIBYTE;
// RamWorks III with 8MB.
pub const MAX_AUX_BANK_COUNT: u8 = 0x7F;

// The 64K auxiliary banks. Bank 0 is the Extended 80 Column card's memory and always exists, the
// others belong to a RamWorks style card and are only allocated once they are first selected.
#[derive(Clone, Debug)]
pub struct AuxBankSelector {
    // Unallocated banks are empty.
    banks: Vec<RawMemory>,
    active: u8,
}

impl AuxBankSelector {
    pub fn new(bank_count: u8) -> AuxBankSelector {
        assert!(bank_count >= 1 && bank_count <= MAX_AUX_BANK_COUNT, "Invalid aux bank count {bank_count}.");
        let mut banks = vec![RawMemory::new(0); usize::from(bank_count)];
        banks[0] = RawMemory::new(AUX_BANK_SIZE);
        AuxBankSelector { banks, active: 0 }
    }

    pub fn bank_count(&self) -> u8 {
        self.banks.len() as u8
    }

    pub fn active(&self) -> u8 {
        self.active
    }

    pub fn is_allocated(&self, bank: u8) -> bool {
        self.banks.get(usize::from(bank)).is_some_and(|memory| !memory.is_empty())
    }

    // Returns true if the active bank changed. Banks beyond the configured count are ignored.
    pub fn select(&mut self, bank: u8) -> bool {
        let Some(memory) = self.banks.get_mut(usize::from(bank)) else {
            info!(target: "auxbank", "Ignoring selection of aux bank ${bank:02X}, there are only {} banks.",
                self.banks.len());
            return false;
        };

        if memory.is_empty() {
            info!(target: "auxbank", "Allocating aux bank ${bank:02X}.");
            *memory = RawMemory::new(AUX_BANK_SIZE);
        }

        if bank == self.active {
            return false;
        }

        info!(target: "auxbank", "Aux bank ${:02X} -> ${bank:02X}", self.active);
        self.active = bank;
        true
    }

    pub fn bank(&self, bank: u8) -> &RawMemory {
        let memory = &self.banks[usize::from(bank)];
        assert!(!memory.is_empty(), "Aux bank {bank} is not allocated.");
        memory
    }

    pub fn bank_mut(&mut self, bank: u8) -> &mut RawMemory {
        let memory = &mut self.banks[usize::from(bank)];
        assert!(!memory.is_empty(), "Aux bank {bank} is not allocated.");
        memory
    }

    pub fn allocated_banks(&self) -> impl Iterator<Item = (u8, &RawMemory)> {
        self.banks.iter()
            .enumerate()
            .filter(|(_, memory)| !memory.is_empty())
            .map(|(index, memory)| (index as u8, memory))
    }

    // Power-on: every allocated bank is cleared and the base bank is active again.
    pub fn clear(&mut self) {
        for memory in &mut self.banks {
            memory.as_mut_slice().fill(0);
        }

        self.active = 0;
    }

    // Replaces every bank. Banks missing from the list become unallocated (except bank 0).
    pub fn restore(&mut self, bank_count: u8, active: u8, contents: Vec<(u8, Vec<u8>)>) {
        if bank_count != self.bank_count() {
            warn!(target: "auxbank", "Aux bank count changing from {} to {bank_count}.", self.bank_count());
        }

        *self = AuxBankSelector::new(bank_count);
        for (index, memory) in contents {
            self.banks[usize::from(index)] = RawMemory::from_vec(memory);
        }

        self.active = active;
        if !self.is_allocated(active) {
            self.banks[usize::from(active)] = RawMemory::new(AUX_BANK_SIZE);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extra_banks_allocate_on_first_selection() {
        let mut banks = AuxBankSelector::new(4);
        assert!(banks.is_allocated(0));
        assert!(!banks.is_allocated(2));
        assert!(banks.select(2));
        assert!(banks.is_allocated(2));
        assert_eq!(banks.active(), 2);
        assert_eq!(banks.allocated_banks().map(|(index, _)| index).collect::<Vec<_>>(), vec![0, 2]);
    }

    #[test]
    fn out_of_range_selection_is_ignored() {
        let mut banks = AuxBankSelector::new(2);
        assert!(!banks.select(2));
        assert!(!banks.select(0x7F));
        assert_eq!(banks.active(), 0);
    }

    #[test]
    fn reselecting_active_bank_is_not_a_change() {
        let mut banks = AuxBankSelector::new(1);
        assert!(!banks.select(0));
    }

    #[test]
    fn clear_keeps_allocations() {
        let mut banks = AuxBankSelector::new(3);
        banks.select(1);
        banks.bank_mut(1)[0x1234] = 0x56;
        banks.clear();
        assert_eq!(banks.active(), 0);
        assert!(banks.is_allocated(1));
        assert_eq!(banks.bank(1)[0x1234], 0);
    }
}
