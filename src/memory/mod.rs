pub mod aux_bank;
pub mod backing_store;
pub mod card;
pub mod expansion_rom;
pub mod init_pattern;
pub mod io_table;
pub mod language_card;
pub mod memory;
pub mod mode_register;
pub mod motherboard;
pub mod page_table;
pub mod paging;
pub mod raw_memory;
pub mod read_result;
pub mod snapshot;
pub mod soft_switch;
pub mod system_rom;
