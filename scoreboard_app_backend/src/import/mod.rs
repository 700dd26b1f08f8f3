mod roster_reader;

pub use roster_reader::{
    parse_group_cell, roster_template_csv, ParseResult, ParseWarning, RosterImportError, RosterReaderConfig,
};
