mod gateway;
mod parse;
mod types;

pub use gateway::{AggregateGateway, EntitySort, SnapshotGateway, SortOrder, load_snapshot_gateway};
pub use types::{CoOccurrenceRow, EntityKind, EntityRow, SectionCount};
