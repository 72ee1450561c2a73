//! Typed access to player state held in a [`KeyValueStore`].

use crate::store::{KeyValueStore, StoreError};
use tracing::warn;
use tycoon_core::{GameState, StateKey};

/// Read every entity, falling back to its default when missing or malformed.
pub fn load_state<S: KeyValueStore + ?Sized>(store: &S) -> Result<GameState, StoreError> {
    let mut state = GameState::default();
    for key in StateKey::ALL {
        let Some(value) = store.get(key.as_str())? else {
            continue;
        };
        if let Err(e) = state.set_entry(key, value) {
            warn!(%key, error = %e, "malformed stored value; using default");
        }
    }
    Ok(state)
}

/// Write the given entities of `state` in a single store batch.
pub fn save_keys<S: KeyValueStore + ?Sized>(
    store: &mut S,
    state: &GameState,
    keys: &[StateKey],
) -> Result<(), StoreError> {
    if keys.is_empty() {
        return Ok(());
    }
    let values = keys
        .iter()
        .map(|&key| {
            state
                .entry(key)
                .map(|value| (key.as_str().to_string(), value))
                .map_err(|e| StoreError::Corrupt(format!("{key}: {e}")))
        })
        .collect::<Result<Vec<_>, _>>()?;
    store.set_many(values)
}

/// Write every entity of `state`.
pub fn save_state<S: KeyValueStore + ?Sized>(
    store: &mut S,
    state: &GameState,
) -> Result<(), StoreError> {
    save_keys(store, state, &StateKey::ALL)
}
