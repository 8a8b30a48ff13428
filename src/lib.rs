pub mod cli;
pub mod commands;
pub mod error;

pub mod core {
    pub mod allele;
    pub mod chromosome;
    pub mod dedup;
    pub mod field;
    pub mod matcher;
    pub mod qc;
    pub mod scanner;
}

pub mod io {
    pub mod format;
    pub mod readers;
    pub mod reference;
    pub mod router;
    pub mod table;
    pub mod writers;
}

pub mod utils {
    pub mod util;
    pub mod util_intern;
}

pub mod constants;
