//! Core library for the Nostr Hero content pipeline editors.
//! Loads directories of per-entity JSON files (monsters, items) into flat
//! key-value records and provides the shared filter/sort/bulk-edit engine
//! plus the file-backed persistence the desktop tools build on.

pub mod engine;
mod record;
pub mod statics;
mod store;
mod value;

pub use engine::{
    BulkIssue, BulkOutcome, Criterion, FilterSet, SortSpec, apply, bulk_apply, field_kind,
};
pub use record::{Record, slug};
pub use store::{LoadWarning, NamingScheme, RecordStore, SaveReport};
pub use value::{CoerceError, FieldKind, FieldNumber, FieldValue, parse_bool, split_list};
