mod blob;
mod bytes;
mod error;
mod header;
mod kind;
mod nodes;
mod offsets;
mod patch;
mod relocation;
mod resize;
mod resolver;
mod sections;
mod shared;
mod source;
mod strings;
mod value;

/// Loaded blob, load options, and dirty-region tracking.
pub use blob::{Blob, DirtyRegions, LoadOptions};
/// Error and result aliases.
pub use error::{DatError, Result};
/// File header representation and derived section boundaries.
pub use header::{DatHeader, HeaderInfo};
/// Closed set of record kinds and their field layouts.
pub use kind::{FieldDef, FieldType, StructureKind};
/// Node table entries and struct/label classification.
pub use nodes::{Node, NodePartition, NodeRole, NodeTable, RootsAndLabels, classify_node, parse_node_table, partition_nodes};
/// Sorted structure offset index.
pub use offsets::StructureIndex;
/// Relocation index and pointer pairs.
pub use relocation::{Pointer, RelocationIndex};
/// Resize granularity.
pub use resize::ALIGNMENT;
/// Resolved structures, handles, and root expansion.
pub use resolver::{ExpandOptions, ExpandSummary, ExpandTruncation, Structure, StructureHandle};
/// Raw section split.
pub use sections::Sections;
/// Lock-guarded blob handle.
pub use shared::SharedBlob;
/// Byte storage abstraction.
pub use source::{ByteSource, MemorySource};
/// Label table codec.
pub use strings::StringTable;
/// Decoded field values.
pub use value::{FieldValue, Value};
