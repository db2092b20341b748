// The bits of a read that some device actually drives. Undriven bits come from the floating bus.
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub struct ReadResult {
    pub value: u8,
    pub mask: u8,
}

impl ReadResult {
    pub const FLOATING_BUS: Self = Self { value: 0, mask: 0b0000_0000 };

    pub fn full(value: u8) -> Self {
        Self { value, mask: 0b1111_1111 }
    }

    pub fn partial(value: u8, mask: u8) -> Self {
        Self { value: value & mask, mask }
    }

    // Only bit 7 is driven, as with the soft switch status flags.
    pub fn high_bit(set: bool) -> Self {
        Self::partial(if set { 0b1000_0000 } else { 0 }, 0b1000_0000)
    }

    pub fn resolve(self, floating_bus_value: u8) -> u8 {
        (self.value & self.mask) | (floating_bus_value & !self.mask)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn floating_bus_passes_through() {
        assert_eq!(ReadResult::FLOATING_BUS.resolve(0x5A), 0x5A);
    }

    #[test]
    fn full_read_ignores_floating_bus() {
        assert_eq!(ReadResult::full(0x12).resolve(0xFF), 0x12);
    }

    #[test]
    fn high_bit_merges_with_floating_bus() {
        assert_eq!(ReadResult::high_bit(true).resolve(0x15), 0x95);
        assert_eq!(ReadResult::high_bit(false).resolve(0x95), 0x15);
    }
}
