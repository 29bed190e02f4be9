#![forbid(unsafe_code)]

pub mod content_pack;
pub mod record;
pub mod repository;
pub mod sqlite;

pub use content_pack::{ContentPackError, load_content_dir};
pub use record::{CURRENT_SCHEMA_VERSION, ProgressRecord, RecordError};
pub use repository::{
    InMemoryRepository, ProgressRecordRepository, Storage, StorageError, StorageKey,
};
