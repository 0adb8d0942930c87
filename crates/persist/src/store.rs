//! File-backed save slots.
//!
//! Layout inside the store directory:
//! ```text
//! game.meta.json            - metadata and schema version
//! saves/
//!   000001.save.cbor.zst    - CBOR+zstd compressed save snapshots
//! integrity/
//!   manifest.json           - hash chain manifest
//! ```

use crate::snapshot::SaveSnapshot;
use dungeon_kernel::{GameState, KernelError};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

/// Current schema version of the save format.
const SAVE_SCHEMA_VERSION: u32 = 1;

const META_FILE: &str = "game.meta.json";
const SAVES_DIR: &str = "saves";
const INTEGRITY_DIR: &str = "integrity";
const MANIFEST_FILE: &str = "manifest.json";

/// Errors from file-backed persistence operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CBOR serialization error: {0}")]
    CborEncode(String),
    #[error("CBOR deserialization error: {0}")]
    CborDecode(String),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("integrity check failed: expected {expected}, got {actual}")]
    IntegrityMismatch { expected: String, actual: String },
    #[error("schema version mismatch: file has v{file_version}, expected v{expected_version}")]
    SchemaMismatch {
        file_version: u32,
        expected_version: u32,
    },
    #[error("restored state is inconsistent: {0}")]
    Corrupt(#[from] KernelError),
    #[error("no saves found")]
    NoSaves,
    #[error("save slot {0} does not exist")]
    NoSuchSlot(u32),
}

/// Metadata stored in game.meta.json.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveMeta {
    pub schema_version: u32,
    pub save_count: u32,
    /// Name of the hero in the most recent save, for listings.
    pub hero_name: Option<String>,
}

/// A single entry in the integrity manifest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub filename: String,
    pub sha256: String,
    pub prev_hash: Option<String>,
}

/// Integrity manifest tracking all save hashes in a chain.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IntegrityManifest {
    pub entries: Vec<ManifestEntry>,
}

/// File-backed save store with schema versioning and integrity checking.
///
/// This is the persistence routine that owns the game state's `saved` flag:
/// [`SaveStore::save`] sets it after the slot is on disk, and states returned
/// by the load functions start saved.
pub struct SaveStore {
    root: PathBuf,
    meta: SaveMeta,
    manifest: IntegrityManifest,
}

impl SaveStore {
    /// Open or create a save store at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let root = path.as_ref().to_path_buf();
        std::fs::create_dir_all(root.join(SAVES_DIR))?;
        std::fs::create_dir_all(root.join(INTEGRITY_DIR))?;

        let meta_path = root.join(META_FILE);
        let manifest_path = root.join(INTEGRITY_DIR).join(MANIFEST_FILE);

        let (meta, manifest) = if meta_path.exists() {
            let meta: SaveMeta = serde_json::from_reader(std::fs::File::open(&meta_path)?)?;
            if meta.schema_version != SAVE_SCHEMA_VERSION {
                return Err(StoreError::SchemaMismatch {
                    file_version: meta.schema_version,
                    expected_version: SAVE_SCHEMA_VERSION,
                });
            }
            let mut manifest: IntegrityManifest = if manifest_path.exists() {
                serde_json::from_reader(std::fs::File::open(&manifest_path)?)?
            } else {
                IntegrityManifest::default()
            };
            // Entries past save_count belong to a save whose meta write failed.
            manifest.entries.truncate(meta.save_count as usize);
            (meta, manifest)
        } else {
            let meta = SaveMeta {
                schema_version: SAVE_SCHEMA_VERSION,
                save_count: 0,
                hero_name: None,
            };
            let manifest = IntegrityManifest::default();
            serde_json::to_writer_pretty(std::fs::File::create(&meta_path)?, &meta)?;
            serde_json::to_writer_pretty(std::fs::File::create(&manifest_path)?, &manifest)?;
            (meta, manifest)
        };

        tracing::debug!(root = %root.display(), saves = meta.save_count, "opened save store");
        Ok(Self {
            root,
            meta,
            manifest,
        })
    }

    /// Write the state to a new save slot and mark it saved.
    ///
    /// Returns the slot number. On error the state keeps its previous
    /// `saved` value.
    pub fn save(&mut self, state: &mut GameState) -> Result<u32, StoreError> {
        let snap = SaveSnapshot::capture(state)?;
        let slot = self.meta.save_count + 1;
        let filename = slot_filename(slot);
        let path = self.root.join(SAVES_DIR).join(&filename);

        let cbor_bytes = cbor_serialize(&snap)?;
        let compressed = zstd_compress(&cbor_bytes)?;

        let hash = sha256_hex(&compressed);
        let prev_hash = self.manifest.entries.last().map(|e| e.sha256.clone());

        std::fs::write(&path, &compressed)?;

        // Manifest before meta, and memory only after both: the meta on disk
        // must never name a slot the manifest has no entry for.
        let mut manifest = self.manifest.clone();
        manifest.entries.push(ManifestEntry {
            filename,
            sha256: hash,
            prev_hash,
        });
        let meta = SaveMeta {
            save_count: slot,
            hero_name: Some(state.hero().name().to_string()),
            ..self.meta.clone()
        };
        self.write_manifest(&manifest)?;
        self.write_meta(&meta)?;
        self.manifest = manifest;
        self.meta = meta;

        state.mark_saved();
        tracing::info!(slot, bytes = compressed.len(), "game saved");
        Ok(slot)
    }

    /// Load the most recent save.
    pub fn load_latest(&self) -> Result<GameState, StoreError> {
        if self.meta.save_count == 0 {
            return Err(StoreError::NoSaves);
        }
        self.load(self.meta.save_count)
    }

    /// Load a specific save slot (1-based).
    pub fn load(&self, slot: u32) -> Result<GameState, StoreError> {
        if slot == 0 || slot > self.meta.save_count {
            return Err(StoreError::NoSuchSlot(slot));
        }
        let snap = self.load_snapshot(slot)?;
        if !snap.verify()? {
            tracing::warn!(slot, "save snapshot hash mismatch");
            return Err(StoreError::IntegrityMismatch {
                expected: snap.hash.clone(),
                actual: "snapshot hash mismatch".into(),
            });
        }
        let state = snap.restore()?;
        tracing::info!(slot, position = %state.hero_position(), "game loaded");
        Ok(state)
    }

    /// Verify all integrity hashes in the manifest.
    pub fn verify_integrity(&self) -> Result<(), StoreError> {
        let mut prev_hash: Option<String> = None;
        for entry in &self.manifest.entries {
            if entry.prev_hash != prev_hash {
                tracing::warn!(file = %entry.filename, "manifest chain broken");
                return Err(StoreError::IntegrityMismatch {
                    expected: prev_hash.unwrap_or_else(|| "None".into()),
                    actual: entry
                        .prev_hash
                        .clone()
                        .unwrap_or_else(|| "None".into()),
                });
            }

            let data = std::fs::read(self.root.join(SAVES_DIR).join(&entry.filename))?;
            let actual_hash = sha256_hex(&data);
            if actual_hash != entry.sha256 {
                tracing::warn!(file = %entry.filename, "save file hash mismatch");
                return Err(StoreError::IntegrityMismatch {
                    expected: entry.sha256.clone(),
                    actual: actual_hash,
                });
            }

            prev_hash = Some(entry.sha256.clone());
        }
        Ok(())
    }

    /// Get the path to the store root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Get the metadata.
    pub fn meta(&self) -> &SaveMeta {
        &self.meta
    }

    fn load_snapshot(&self, slot: u32) -> Result<SaveSnapshot, StoreError> {
        let filename = slot_filename(slot);
        let compressed = std::fs::read(self.root.join(SAVES_DIR).join(&filename))?;

        self.verify_file_hash(&filename, &compressed)?;

        let cbor_bytes = zstd_decompress(&compressed)?;
        cbor_deserialize(&cbor_bytes)
    }

    fn verify_file_hash(&self, filename: &str, data: &[u8]) -> Result<(), StoreError> {
        let actual = sha256_hex(data);
        match self.manifest.entries.iter().find(|e| e.filename == filename) {
            Some(entry) if entry.sha256 != actual => {
                tracing::warn!(file = filename, "save file hash mismatch");
                Err(StoreError::IntegrityMismatch {
                    expected: entry.sha256.clone(),
                    actual,
                })
            }
            Some(_) => Ok(()),
            None => Err(StoreError::IntegrityMismatch {
                expected: format!("manifest entry for {filename}"),
                actual: "none".into(),
            }),
        }
    }

    fn write_meta(&self, meta: &SaveMeta) -> Result<(), StoreError> {
        let path = self.root.join(META_FILE);
        serde_json::to_writer_pretty(std::fs::File::create(path)?, meta)?;
        Ok(())
    }

    fn write_manifest(&self, manifest: &IntegrityManifest) -> Result<(), StoreError> {
        let path = self.root.join(INTEGRITY_DIR).join(MANIFEST_FILE);
        serde_json::to_writer_pretty(std::fs::File::create(path)?, manifest)?;
        Ok(())
    }
}

fn slot_filename(slot: u32) -> String {
    format!("{slot:06}.save.cbor.zst")
}

pub(crate) fn cbor_serialize<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, StoreError> {
    let mut buf = Vec::new();
    ciborium::into_writer(value, &mut buf).map_err(|e| StoreError::CborEncode(e.to_string()))?;
    Ok(buf)
}

fn cbor_deserialize<T: for<'de> Deserialize<'de>>(data: &[u8]) -> Result<T, StoreError> {
    ciborium::from_reader(data).map_err(|e| StoreError::CborDecode(e.to_string()))
}

fn zstd_compress(data: &[u8]) -> Result<Vec<u8>, StoreError> {
    let mut encoder = zstd::Encoder::new(Vec::new(), 3)?;
    encoder.write_all(data)?;
    Ok(encoder.finish()?)
}

fn zstd_decompress(data: &[u8]) -> Result<Vec<u8>, StoreError> {
    let mut decoder = zstd::Decoder::new(data)?;
    let mut buf = Vec::new();
    decoder.read_to_end(&mut buf)?;
    Ok(buf)
}

pub(crate) fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use dungeon_common::{Coordinate, Direction};

    fn explored_state() -> GameState {
        let mut state = GameState::with_hero_name("Ada");
        for direction in [Direction::North, Direction::North, Direction::East] {
            state.record_command(direction.name());
            state.move_hero_in(direction).unwrap();
        }
        state.set_using_bars(true);
        state.next_hint(&["a", "b", "c"]);
        state
    }

    #[test]
    fn store_open_creates_dirs() {
        let tmp = tempfile::tempdir().unwrap();
        let store = SaveStore::open(tmp.path().join("game_data")).unwrap();
        assert_eq!(store.meta().save_count, 0);
        assert!(store.meta().hero_name.is_none());
        assert!(store.root().join("saves").is_dir());
        assert!(store.root().join("integrity").is_dir());
    }

    #[test]
    fn save_marks_state_saved() {
        let tmp = tempfile::tempdir().unwrap();
        let mut store = SaveStore::open(tmp.path().join("game_data")).unwrap();
        let mut state = explored_state();
        assert!(!state.is_saved());

        let slot = store.save(&mut state).unwrap();
        assert_eq!(slot, 1);
        assert!(state.is_saved());
        assert_eq!(store.meta().hero_name.as_deref(), Some("Ada"));
    }

    #[test]
    fn save_and_load_roundtrip() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("game_data");
        let mut state = explored_state();
        {
            let mut store = SaveStore::open(&path).unwrap();
            store.save(&mut state).unwrap();
        }

        let store = SaveStore::open(&path).unwrap();
        let loaded = store.load_latest().unwrap();
        assert!(loaded.is_saved());
        assert_eq!(loaded.hero_position(), Coordinate::new(1, 2));
        assert_eq!(loaded.hero().id(), state.hero().id());
        assert_eq!(loaded.hero().name(), "Ada");
        assert_eq!(loaded.world(), state.world());
        assert_eq!(
            loaded.hero().exploration_log(),
            state.hero().exploration_log()
        );
        assert_eq!(loaded.command_history(), state.command_history());
        assert_eq!(loaded.preferences(), state.preferences());
        assert_eq!(loaded.hint_index(), 1);
        loaded.check_invariants().unwrap();
    }

    #[test]
    fn later_saves_take_new_slots() {
        let tmp = tempfile::tempdir().unwrap();
        let mut store = SaveStore::open(tmp.path().join("game_data")).unwrap();
        let mut state = GameState::new();
        store.save(&mut state).unwrap();
        state.move_hero(Coordinate::new(0, -1)).unwrap();
        assert_eq!(store.save(&mut state).unwrap(), 2);

        assert_eq!(store.load(1).unwrap().hero_position(), Coordinate::ORIGIN);
        assert_eq!(
            store.load_latest().unwrap().hero_position(),
            Coordinate::new(0, -1)
        );
        store.verify_integrity().unwrap();
    }

    #[test]
    fn failed_manifest_write_leaves_store_unchanged() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("game_data");
        let mut store = SaveStore::open(&path).unwrap();
        let manifest_path = path.join("integrity").join("manifest.json");
        std::fs::remove_file(&manifest_path).unwrap();
        std::fs::create_dir(&manifest_path).unwrap();

        let mut state = explored_state();
        assert!(store.save(&mut state).is_err());
        assert!(!state.is_saved());
        assert_eq!(store.meta().save_count, 0);

        std::fs::remove_dir(&manifest_path).unwrap();
        let mut reopened = SaveStore::open(&path).unwrap();
        assert_eq!(reopened.meta().save_count, 0);
        assert!(matches!(reopened.load_latest(), Err(StoreError::NoSaves)));

        assert_eq!(reopened.save(&mut state).unwrap(), 1);
        assert_eq!(
            reopened.load_latest().unwrap().hero_position(),
            Coordinate::new(1, 2)
        );
        reopened.verify_integrity().unwrap();
    }

    #[test]
    fn manifest_entry_without_meta_is_dropped_on_open() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("game_data");
        let mut store = SaveStore::open(&path).unwrap();
        let mut state = GameState::new();
        store.save(&mut state).unwrap();

        // Leave the disk as a save that stopped after its manifest write.
        let meta_path = path.join("game.meta.json");
        let meta_before = std::fs::read(&meta_path).unwrap();
        state.move_hero(Coordinate::new(1, 0)).unwrap();
        store.save(&mut state).unwrap();
        std::fs::write(&meta_path, meta_before).unwrap();

        let mut reopened = SaveStore::open(&path).unwrap();
        assert_eq!(reopened.meta().save_count, 1);
        state.move_hero(Coordinate::new(2, 0)).unwrap();
        assert_eq!(reopened.save(&mut state).unwrap(), 2);
        assert_eq!(
            reopened.load_latest().unwrap().hero_position(),
            Coordinate::new(2, 0)
        );
        reopened.verify_integrity().unwrap();
    }

    #[test]
    fn load_without_saves_fails() {
        let tmp = tempfile::tempdir().unwrap();
        let store = SaveStore::open(tmp.path().join("game_data")).unwrap();
        assert!(matches!(store.load_latest(), Err(StoreError::NoSaves)));
        assert!(matches!(store.load(3), Err(StoreError::NoSuchSlot(3))));
    }

    #[test]
    fn store_integrity_fail_closed_on_corruption() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("game_data");
        let mut store = SaveStore::open(&path).unwrap();
        store.save(&mut explored_state()).unwrap();

        let save_path = path.join("saves").join("000001.save.cbor.zst");
        let mut data = std::fs::read(&save_path).unwrap();
        if let Some(byte) = data.last_mut() {
            *byte ^= 0xff;
        }
        std::fs::write(&save_path, &data).unwrap();

        let store2 = SaveStore::open(&path).unwrap();
        assert!(store2.verify_integrity().is_err());
        assert!(matches!(
            store2.load_latest(),
            Err(StoreError::IntegrityMismatch { .. })
        ));
    }

    #[test]
    fn schema_mismatch_fail_closed() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("game_data");
        let _store = SaveStore::open(&path).unwrap();

        let meta_path = path.join("game.meta.json");
        let mut meta: SaveMeta =
            serde_json::from_reader(std::fs::File::open(&meta_path).unwrap()).unwrap();
        meta.schema_version = 999;
        serde_json::to_writer_pretty(std::fs::File::create(&meta_path).unwrap(), &meta).unwrap();

        match SaveStore::open(&path) {
            Err(StoreError::SchemaMismatch {
                file_version,
                expected_version,
            }) => {
                assert_eq!(file_version, 999);
                assert_eq!(expected_version, SAVE_SCHEMA_VERSION);
            }
            Err(e) => panic!("expected SchemaMismatch, got: {e}"),
            Ok(_) => panic!("expected error, got Ok"),
        }
    }
}
