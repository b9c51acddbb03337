//! CLI module containing argument parsing and related functionality

pub mod args;
pub mod year_parser;

pub use args::{parse_args, validate_args, Args};
pub use year_parser::{parse_years, YearParseError};
