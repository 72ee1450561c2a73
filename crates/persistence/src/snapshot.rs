//! Whole-state export and all-or-nothing import.
//!
//! Document format:
//!   { "version": 1, "state": { "<semanticKey>": <json>, ... } }
//!
//! Import decodes and validates every entry before touching the store.

use crate::store::{KeyValueStore, StoreError};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::info;
use tycoon_core::{validate_state, GameState, StateKey, ValidationError};

/// Current export format version.
pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SnapshotDocument {
    pub version: u32,
    pub state: BTreeMap<String, Value>,
}

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("malformed snapshot: {0}")]
    Parse(String),
    #[error("unsupported snapshot version {0}")]
    UnsupportedVersion(u32),
    #[error("unknown state key: {0}")]
    UnknownKey(String),
    #[error("invalid value for {key}: {message}")]
    InvalidEntry { key: String, message: String },
    #[error("state violates invariants: {0}")]
    Invalid(#[from] ValidationError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Capture the full persisted state.
pub fn export_document<S: KeyValueStore + ?Sized>(
    store: &S,
) -> Result<SnapshotDocument, SnapshotError> {
    Ok(SnapshotDocument {
        version: SNAPSHOT_VERSION,
        state: store.entries()?,
    })
}

/// Export as pretty-printed JSON.
pub fn export_json<S: KeyValueStore + ?Sized>(store: &S) -> Result<String, SnapshotError> {
    let doc = export_document(store)?;
    serde_json::to_string_pretty(&doc).map_err(|e| SnapshotError::Parse(e.to_string()))
}

/// Decode and validate a document into the state it describes.
///
/// Keys absent from the document take their defaults.
pub fn decode_document(doc: &SnapshotDocument) -> Result<GameState, SnapshotError> {
    if doc.version != SNAPSHOT_VERSION {
        return Err(SnapshotError::UnsupportedVersion(doc.version));
    }
    let mut state = GameState::default();
    for (name, value) in &doc.state {
        let key = StateKey::parse(name).ok_or_else(|| SnapshotError::UnknownKey(name.clone()))?;
        state
            .set_entry(key, value.clone())
            .map_err(|e| SnapshotError::InvalidEntry {
                key: name.clone(),
                message: e.to_string(),
            })?;
    }
    validate_state(&state)?;
    Ok(state)
}

/// Parse a JSON document without touching any store.
pub fn parse_json(json: &str) -> Result<(SnapshotDocument, GameState), SnapshotError> {
    let doc: SnapshotDocument =
        serde_json::from_str(json).map_err(|e| SnapshotError::Parse(e.to_string()))?;
    let state = decode_document(&doc)?;
    Ok((doc, state))
}

/// Replace the store content with `json`; on any error the store is untouched.
pub fn import_json<S: KeyValueStore + ?Sized>(
    store: &mut S,
    json: &str,
) -> Result<GameState, SnapshotError> {
    let (doc, state) = parse_json(json)?;
    store.replace_all(doc.state)?;
    info!(level = state.progress.level, "snapshot imported");
    Ok(state)
}
