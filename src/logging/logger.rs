use log::{Level, LevelFilter, Metadata, Record, SetLoggerError};

pub fn init(logger: Logger) -> Result<(), SetLoggerError> {
    log::set_boxed_logger(Box::new(logger))
        .map(|()| log::set_max_level(LevelFilter::Info))
}

#[derive(Clone, Copy, Default, Debug)]
pub struct Logger {
    pub log_soft_switches: bool,
    pub log_paging: bool,
    pub log_expansion_rom: bool,
    pub log_language_card: bool,
    pub log_aux_banks: bool,
    pub log_snapshots: bool,
}

impl log::Log for Logger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        match metadata.target() {
            "" => true,
            "softswitch" => self.log_soft_switches,
            "paging" => self.log_paging,
            "expansionrom" => self.log_expansion_rom,
            "languagecard" => self.log_language_card,
            "auxbank" => self.log_aux_banks,
            "snapshot" => self.log_snapshots,
            target => {
                let chunks: Vec<&str> = target.split("::").collect();
                match chunks[..] {
                    ["a2mem", ..] => true,
                    // Third-party crates only get to report problems.
                    _ => metadata.level() <= Level::Warn,
                }
            }
        }
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            if record.level() < Level::Info {
                print!("{} - ", record.level());
            }

            match record.target() {
                "softswitch" => print!("SOFT SWITCH "),
                "expansionrom" => print!("EXPANSION ROM "),
                "languagecard" => print!("LANGUAGE CARD "),
                _ => {}
            }

            println!("{}", record.args());
        }
    }

    fn flush(&self) {}
}
