pub mod export;
pub mod snapshot;

pub use snapshot::{ArchiveRow, RowKind};
