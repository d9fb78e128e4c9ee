//! # Local Store
//!
//! Synchronous file-backed persistence of the two logical keys the engine
//! owns: the session cache and the user data aggregate.
//!
//! ## Write Discipline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Atomic Whole-Value Writes                         │
//! │                                                                         │
//! │   set("user_data", blob)                                               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │   1. write <root>/user_data.json.tmp                                   │
//! │   2. flush                                                             │
//! │   3. rename over <root>/user_data.json                                 │
//! │                                                                         │
//! │  A crash mid-write leaves the previous complete value in place.        │
//! │  There is no partial state a reader can observe.                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use lifehub_core::{SessionRecord, UserData};

use crate::error::{StoreError, StoreResult};
use crate::schema;

/// Logical key for the cached session record.
pub const KEY_SESSION: &str = "session";

/// Logical key for the user data aggregate.
pub const KEY_USER_DATA: &str = "user_data";

/// Durable, synchronous key-value store.
///
/// One JSON file per logical key under a root directory. All operations
/// complete before returning; nothing here suspends.
#[derive(Debug, Clone)]
pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    /// Opens (creating if needed) a store rooted at the given directory.
    pub fn open(root: impl Into<PathBuf>) -> StoreResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        debug!(?root, "Local store opened");
        Ok(LocalStore { root })
    }

    /// Opens the store at the platform default data directory.
    pub fn open_default() -> StoreResult<Self> {
        let dirs = directories::ProjectDirs::from("app", "lifehub", "lifehub")
            .ok_or(StoreError::NoDataDir)?;
        Self::open(dirs.data_dir())
    }

    /// The store's root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(format!("{key}.json"))
    }

    // =========================================================================
    // Raw Key-Value Primitives
    // =========================================================================

    /// Reads the raw blob for a key. `None` when the key has never been set.
    pub fn get_raw(&self, key: &str) -> StoreResult<Option<String>> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(fs::read_to_string(&path)?))
    }

    /// Writes the raw blob for a key atomically.
    pub fn set_raw(&self, key: &str, value: &str) -> StoreResult<()> {
        let path = self.path_for(key);
        atomic_write(&path, value.as_bytes())?;
        debug!(key, bytes = value.len(), "Local store write");
        Ok(())
    }

    /// Removes a key. Removing an absent key is not an error.
    pub fn remove(&self, key: &str) -> StoreResult<()> {
        let path = self.path_for(key);
        if path.exists() {
            fs::remove_file(&path)?;
        }
        Ok(())
    }

    // =========================================================================
    // Typed Accessors
    // =========================================================================

    /// Loads and decodes a typed value.
    ///
    /// A corrupt blob reads as absent (logged): cache state must degrade,
    /// never crash a startup path. I/O failures and blobs written by a
    /// newer build still surface as errors.
    pub fn get_value<T: DeserializeOwned>(&self, key: &str) -> StoreResult<Option<T>> {
        let Some(raw) = self.get_raw(key)? else {
            return Ok(None);
        };

        match schema::decode(&raw) {
            Ok(value) => Ok(Some(value)),
            Err(StoreError::Encode(reason)) => {
                warn!(key, %reason, "Discarding corrupt stored value");
                Ok(None)
            }
            Err(other) => Err(other),
        }
    }

    /// Encodes and writes a typed value.
    pub fn set_value<T: Serialize>(&self, key: &str, value: &T) -> StoreResult<()> {
        let raw = schema::encode(value)?;
        self.set_raw(key, &raw)
    }

    // =========================================================================
    // Session Cache
    // =========================================================================

    /// Fast-path read of the cached session record.
    pub fn load_session(&self) -> StoreResult<Option<SessionRecord>> {
        self.get_value(KEY_SESSION)
    }

    /// Caches the session record for fast-path reads.
    pub fn save_session(&self, session: &SessionRecord) -> StoreResult<()> {
        self.set_value(KEY_SESSION, session)
    }

    /// Destroys the cached session record.
    pub fn clear_session(&self) -> StoreResult<()> {
        self.remove(KEY_SESSION)
    }

    // =========================================================================
    // User Data Aggregate
    // =========================================================================

    /// Loads the locally-cached aggregate.
    pub fn load_user_data(&self) -> StoreResult<Option<UserData>> {
        self.get_value(KEY_USER_DATA)
    }

    /// Persists the whole aggregate (last write wins).
    pub fn save_user_data(&self, data: &UserData) -> StoreResult<()> {
        self.set_value(KEY_USER_DATA, data)
    }
}

/// Writes bytes to a temp file, then renames over the target path.
///
/// The rename is the commit point: readers observe either the old complete
/// value or the new complete value.
fn atomic_write(path: &Path, bytes: &[u8]) -> StoreResult<()> {
    let tmp_path = path.with_extension("json.tmp");

    {
        let mut file = File::create(&tmp_path)?;
        file.write_all(bytes)?;
        file.flush()?;
    }

    fs::rename(&tmp_path, path)?;
    Ok(())
}
