//! Public library API for reading and editing HSD `.dat` archives.

/// Section splitting, relocation, structure resolution, and resize support.
pub mod dat;
