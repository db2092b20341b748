pub const KIBIBYTE: u32 = 1024;
pub const PAGE_SIZE: u32 = 0x100;
