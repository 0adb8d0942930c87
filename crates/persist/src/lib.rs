//! Persistence: save snapshots of the whole game state, compressed save
//! slots on disk, and a hash-chained integrity manifest.
//!
//! # Invariants
//! - Save slots are append-only; an existing slot is never rewritten.
//! - Every slot is listed in the manifest with its SHA-256 and its
//!   predecessor's hash.
//! - A restored state passes the kernel invariant check and starts saved.

mod snapshot;
mod store;

pub use snapshot::SaveSnapshot;
pub use store::{IntegrityManifest, ManifestEntry, SaveMeta, SaveStore, StoreError};

pub fn crate_info() -> &'static str {
    "dungeon-persist v0.1.0"
}
