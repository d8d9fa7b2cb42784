// Text parsers for dataset cells and command-line arguments

pub mod filter;
pub mod lexer;
pub mod timestamp;

// Public API re-exports
pub use filter::{parse_alias_arg, parse_filter_arg, parse_value_set};
pub use timestamp::{format_timestamp, parse_timestamp};
