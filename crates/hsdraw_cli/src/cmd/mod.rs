/// Round-trip verification command.
pub mod check;
/// File-level information command.
pub mod info;
/// Node table listing command.
pub mod nodes;
/// Orphan listing command.
pub mod orphans;
/// Structure walk command.
pub mod structs;

mod source;
mod util;
