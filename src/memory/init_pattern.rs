use std::str::FromStr;

use enum_iterator::{all, cardinality, Sequence};
use log::info;
use num_derive::FromPrimitive;
use num_traits::FromPrimitive;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use strum_macros::{Display, EnumString};

use crate::memory::raw_memory::RawMemory;

// Only main RAM below the I/O space is filled.
const FILL_END: u32 = 0xC000;

// What uninitialized main RAM looks like at power on. Real machines vary, and a few programs
// depend on the particular pattern of the machine they were written on.
#[derive(PartialEq, Eq, Clone, Copy, Debug, Default, Display, EnumString, FromPrimitive, Sequence)]
#[strum(ascii_case_insensitive)]
pub enum MemoryInitPattern {
    #[strum(to_string = "zero")]
    Zero,
    // FF FF 00 00 repeating, with noise at xx28, xx29, xx68 and xx69 of every other page.
    #[default]
    #[strum(to_string = "ffff0000")]
    FfFf0000,
    // Alternating pages of FF and 00, with 00 at xx28 and xx68 of the FF pages.
    #[strum(to_string = "ff00fullpage")]
    Ff00FullPage,
    #[strum(to_string = "00ffhalfpage")]
    ZeroFfHalfPage,
    #[strum(to_string = "ff00halfpage")]
    FfZeroHalfPage,
    #[strum(to_string = "random")]
    Random,
    #[strum(to_string = "pageaddresslow")]
    PageAddressLow,
    #[strum(to_string = "pageaddresshigh")]
    PageAddressHigh,
}

impl MemoryInitPattern {
    pub fn fill(self, main: &mut RawMemory, rng: &mut StdRng) {
        use MemoryInitPattern::*;
        main.fill(0..FILL_END, 0x00);
        match self {
            Zero => {}
            FfFf0000 => {
                for address in (0..FILL_END).step_by(4) {
                    main[address] = 0xFF;
                    main[address + 1] = 0xFF;
                }

                for block in (0..FILL_END).step_by(0x200) {
                    for offset in [0x28, 0x29, 0x68, 0x69] {
                        main[block + offset] = rng.r#gen();
                    }
                }
            }
            Ff00FullPage => {
                for block in (0..FILL_END).step_by(0x200) {
                    main.fill(block..block + 0x100, 0xFF);
                    main[block + 0x28] = 0x00;
                    main[block + 0x68] = 0x00;
                }
            }
            ZeroFfHalfPage => {
                for page in (0..FILL_END).step_by(0x100) {
                    main.fill(page + 0x80..page + 0x100, 0xFF);
                }
            }
            FfZeroHalfPage => {
                for page in (0..FILL_END).step_by(0x100) {
                    main.fill(page..page + 0x80, 0xFF);
                }
            }
            Random => rng.fill(main.slice_mut(0..FILL_END)),
            PageAddressLow => {
                for address in 0..FILL_END {
                    main[address] = address as u8;
                }
            }
            PageAddressHigh => {
                for address in 0..FILL_END {
                    main[address] = (address >> 8) as u8;
                }
            }
        }

        // Locations that cold-booting software is known to depend on.
        main[0x4E] = 0x20 | rng.r#gen::<u8>();
        main[0x4F] = 0x20 | rng.r#gen::<u8>();
        main[0x620B] = 0x00;
        main.fill(0xBFFD..0xC000, 0x00);
    }
}

// Either a specific pattern, or one picked at each cold start.
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub enum MemoryFill {
    Fixed(MemoryInitPattern),
    AnyPattern,
}

impl MemoryFill {
    pub fn pick(self, rng: &mut StdRng) -> MemoryInitPattern {
        match self {
            MemoryFill::Fixed(pattern) => pattern,
            MemoryFill::AnyPattern => {
                let index = rng.gen_range(0..cardinality::<MemoryInitPattern>());
                match MemoryInitPattern::from_usize(index) {
                    // Breaks too many programs to be picked unless asked for.
                    Some(MemoryInitPattern::PageAddressLow) | None => MemoryInitPattern::FfFf0000,
                    Some(pattern) => pattern,
                }
            }
        }
    }
}

impl Default for MemoryFill {
    fn default() -> MemoryFill {
        MemoryFill::Fixed(MemoryInitPattern::default())
    }
}

impl FromStr for MemoryFill {
    type Err = String;

    fn from_str(value: &str) -> Result<MemoryFill, String> {
        if value.eq_ignore_ascii_case("any") {
            return Ok(MemoryFill::AnyPattern);
        }

        value.parse()
            .map(MemoryFill::Fixed)
            .map_err(|_| {
                let names: Vec<String> = all::<MemoryInitPattern>().map(|pattern| pattern.to_string()).collect();
                format!("Invalid memory fill pattern '{value}'. Expected 'any' or one of: {}", names.join(", "))
            })
    }
}

pub fn seeded_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => {
            let seed = rand::random();
            info!("Memory fill seed: {seed}");
            StdRng::seed_from_u64(seed)
        }
    }
}
