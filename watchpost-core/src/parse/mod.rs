//! Parsers turning sanitized remote output into typed rows
//!
//! One parser per check type. All parsers are tolerant by design: lines
//! that do not match the expected shape are skipped, and missing data is
//! reported as an empty result rather than an error — the classifier
//! decides what absence means for each check.

mod disk;
mod pods;
mod table;

pub use disk::parse_mount_usage;
pub use pods::parse_pod_lines;
pub use table::{TableParse, TableSpec, extract_remote_now, newest_timestamp, parse_table};
