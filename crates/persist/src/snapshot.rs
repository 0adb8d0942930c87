use dungeon_common::Coordinate;
use dungeon_kernel::GameState;
use serde::{Deserialize, Serialize};

use crate::store::{StoreError, cbor_serialize, sha256_hex};

/// A content-addressed copy of the whole game state.
///
/// The hash covers the CBOR encoding of the state, so a snapshot that was
/// altered after capture fails [`SaveSnapshot::verify`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveSnapshot {
    /// Commands issued when the snapshot was taken.
    pub turn: u64,
    /// Hero position at capture time (for listings without a full decode).
    pub hero_position: Coordinate,
    /// The state itself. Transient fields (saved flag, events) are not included.
    pub state: GameState,
    /// SHA-256 of the CBOR-encoded state.
    pub hash: String,
}

impl SaveSnapshot {
    /// Capture the current state.
    pub fn capture(state: &GameState) -> Result<Self, StoreError> {
        let hash = sha256_hex(&cbor_serialize(state)?);
        Ok(Self {
            turn: state.command_history().command_count(),
            hero_position: state.hero_position(),
            state: state.clone(),
            hash,
        })
    }

    /// Verify the snapshot integrity by recomputing the hash.
    pub fn verify(&self) -> Result<bool, StoreError> {
        Ok(sha256_hex(&cbor_serialize(&self.state)?) == self.hash)
    }

    /// Rebuild a live game state from this snapshot.
    ///
    /// Fails closed if the restored state breaks a kernel invariant. The
    /// returned state matches what is persisted, so it starts out saved.
    pub fn restore(&self) -> Result<GameState, StoreError> {
        let mut state = self.state.clone();
        state.check_invariants()?;
        state.drain_events();
        state.mark_saved();
        Ok(state)
    }
}
