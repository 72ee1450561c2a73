#![deny(warnings)]

//! Persistence layer: key-value state stores, snapshots and save slots.

pub mod repo;
pub mod saves;
pub mod snapshot;
pub mod store;

pub use repo::{load_state, save_keys, save_state};
pub use saves::{create_save, init_db, list_saves, load_snapshot, store_snapshot, SaveSlot};
pub use snapshot::{
    decode_document, export_document, export_json, import_json, parse_json, SnapshotDocument,
    SnapshotError, SNAPSHOT_VERSION,
};
pub use store::{JsonFileStore, KeyValueStore, MemoryStore, StoreError};

/// Returns the default SQLite URL used for local save slots.
pub fn default_sqlite_url() -> &'static str {
    "sqlite://./saves/main.db"
}

/// Returns the default path of the live JSON save.
pub fn default_save_path() -> &'static str {
    "./saves/state.json"
}
