use std::ops::{Index, IndexMut, Range};

use crate::util::unit::PAGE_SIZE;

// A chunk of primitive memory. Allows indexing on u32s instead of usizes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawMemory(Vec<u8>);

impl RawMemory {
    pub fn new(size: u32) -> Self {
        Self(vec![0; size as usize])
    }

    pub fn from_vec(vec: Vec<u8>) -> Self {
        assert!(vec.len() <= u32::MAX as usize);
        Self(vec)
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.0[..]
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.0[..]
    }

    pub fn slice(&self, range: Range<u32>) -> &[u8] {
        &self.0[range.start as usize..range.end as usize]
    }

    pub fn slice_mut(&mut self, range: Range<u32>) -> &mut [u8] {
        &mut self.0[range.start as usize..range.end as usize]
    }

    // The 256 bytes starting at the specified offset. The offset need not be page aligned.
    pub fn page(&self, start: u32) -> &[u8; PAGE_SIZE as usize] {
        self.sized_slice(start)
    }

    pub fn page_mut(&mut self, start: u32) -> &mut [u8; PAGE_SIZE as usize] {
        self.sized_slice_mut(start)
    }

    pub fn sized_slice<const SIZE: usize>(&self, start: u32) -> &[u8; SIZE] {
        let start = start as usize;
        (&self.0[start..start + SIZE]).try_into().unwrap()
    }

    pub fn sized_slice_mut<const SIZE: usize>(&mut self, start: u32) -> &mut [u8; SIZE] {
        let start = start as usize;
        (&mut self.0[start..start + SIZE]).try_into().unwrap()
    }

    pub fn fill(&mut self, range: Range<u32>, value: u8) {
        self.slice_mut(range).fill(value);
    }

    pub fn size(&self) -> u32 {
        self.0.len() as u32
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Index<u32> for RawMemory {
    type Output = u8;

    fn index(&self, index: u32) -> &u8 {
        &self.0[index as usize]
    }
}

impl IndexMut<u32> for RawMemory {
    fn index_mut(&mut self, index: u32) -> &mut u8 {
        &mut self.0[index as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_slices_are_offset_from_start() {
        let mut memory = RawMemory::new(0x400);
        memory.page_mut(0x100)[0] = 0xAB;
        memory.page_mut(0x180)[0xFF] = 0xCD;

        assert_eq!(memory[0x100], 0xAB);
        assert_eq!(memory[0x27F], 0xCD);
        assert_eq!(memory.page(0x100)[0x7F], 0xCD);
    }

    #[test]
    fn fill_only_touches_range() {
        let mut memory = RawMemory::new(0x10);
        memory.fill(4..8, 0xFF);
        assert_eq!(memory.as_slice(), &[0, 0, 0, 0, 0xFF, 0xFF, 0xFF, 0xFF, 0, 0, 0, 0, 0, 0, 0, 0]);
    }
}
