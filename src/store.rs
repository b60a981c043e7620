use simd_r_drive::storage_engine::DataStore;
use simd_r_drive::storage_engine::traits::{DataStoreReader, DataStoreWriter};
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{info, warn};

use crate::constants::store::{
    BITCODE_PREFIX, DEALS_KEY, DEFAULT_STORE_DIR, DEFAULT_STORE_FILENAME, META_KEY,
    STARRED_LEASES_KEY, STORE_VERSION, VALUE_PREFIX, VALUE_RECORD_VERSION, VALUE_TOMBSTONE,
};
use crate::data::{Comparable, LeaseId};
use crate::deals::{self, Deal, DealDetails, DealStage, seed_deals};
use crate::errors::CompsError;
use crate::types::{DealId, LegacyLeaseKey, StoreKey, SubscriptionId};

/// String key/value persistence backend.
///
/// Values are UTF-8 JSON text. No transactional guarantee spans keys.
pub trait KvBackend: Send + Sync {
    /// Return the value stored under `key`, if any.
    fn get(&self, key: &str) -> Result<Option<String>, CompsError>;
    /// Store `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> Result<(), CompsError>;
    /// Forget `key`. Removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<(), CompsError>;
}

/// In-memory backend, mainly for tests.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    values: RwLock<HashMap<StoreKey, String>>,
}

impl MemoryBackend {
    /// Create an empty backend.
    pub fn new() -> Self {
        Self::default()
    }
}

impl KvBackend for MemoryBackend {
    fn get(&self, key: &str) -> Result<Option<String>, CompsError> {
        Ok(self
            .values
            .read()
            .map_err(|_| CompsError::Store("memory backend lock poisoned".into()))?
            .get(key)
            .cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), CompsError> {
        self.values
            .write()
            .map_err(|_| CompsError::Store("memory backend lock poisoned".into()))?
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), CompsError> {
        self.values
            .write()
            .map_err(|_| CompsError::Store("memory backend lock poisoned".into()))?
            .remove(key);
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, bitcode::Encode, bitcode::Decode)]
/// Versioned metadata header stored in file backends.
struct StoreMeta {
    version: u8,
}

fn encode_store_meta(meta: &StoreMeta) -> Vec<u8> {
    encode_bitcode_payload(&bitcode::encode(meta))
}

fn decode_store_meta(bytes: &[u8]) -> Result<StoreMeta, CompsError> {
    let raw = decode_bitcode_payload(bytes)?;
    bitcode::decode(&raw)
        .map_err(|err| CompsError::Store(format!("failed to decode store metadata: {err}")))
}

/// Single-file durable backend.
///
/// Values live under prefixed keys; removal writes a tombstone record.
pub struct FileBackend {
    store: DataStore,
    path: PathBuf,
}

impl fmt::Debug for FileBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileBackend")
            .field("path", &self.path)
            .finish()
    }
}

impl FileBackend {
    /// Open (or create) a store file at `path`.
    ///
    /// An existing directory is treated as the parent of the default file.
    pub fn open<P: Into<PathBuf>>(path: P) -> Result<Self, CompsError> {
        let path = coerce_store_path(path.into());
        ensure_parent_dir(&path)?;
        let store = DataStore::open(path.as_path()).map_err(map_store_err)?;
        let backend = Self { store, path };
        backend.verify_metadata()?;
        info!(path = %backend.path.display(), "opened CRM store");
        Ok(backend)
    }

    /// Default store file path under `.lease_comps_store/`.
    pub fn default_path() -> PathBuf {
        Self::default_path_in_dir(DEFAULT_STORE_DIR)
    }

    /// Default store file path inside `dir`.
    pub fn default_path_in_dir<P: AsRef<Path>>(dir: P) -> PathBuf {
        dir.as_ref().join(DEFAULT_STORE_FILENAME)
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn verify_metadata(&self) -> Result<(), CompsError> {
        match read_bytes(&self.store, META_KEY)? {
            Some(bytes) => {
                let meta = decode_store_meta(&bytes)?;
                if meta.version != STORE_VERSION {
                    return Err(CompsError::Store(format!(
                        "store version mismatch (expected {}, found {})",
                        STORE_VERSION, meta.version
                    )));
                }
            }
            None => {
                let payload = encode_store_meta(&StoreMeta {
                    version: STORE_VERSION,
                });
                write_bytes(&self.store, META_KEY, &payload)?;
            }
        }
        Ok(())
    }
}

impl KvBackend for FileBackend {
    fn get(&self, key: &str) -> Result<Option<String>, CompsError> {
        match read_bytes(&self.store, &value_key(key))? {
            Some(bytes) => decode_value(key, &bytes),
            None => Ok(None),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), CompsError> {
        write_bytes(&self.store, &value_key(key), &encode_value(Some(value)))
    }

    fn remove(&self, key: &str) -> Result<(), CompsError> {
        write_bytes(&self.store, &value_key(key), &encode_value(None))
    }
}

fn value_key(key: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(VALUE_PREFIX.len() + key.len());
    out.extend_from_slice(VALUE_PREFIX);
    out.extend_from_slice(key.as_bytes());
    out
}

fn encode_value(value: Option<&str>) -> Vec<u8> {
    match value {
        None => vec![VALUE_TOMBSTONE],
        Some(value) => {
            let mut buf = Vec::with_capacity(1 + value.len());
            buf.push(VALUE_RECORD_VERSION);
            buf.extend_from_slice(value.as_bytes());
            buf
        }
    }
}

fn decode_value(key: &str, bytes: &[u8]) -> Result<Option<String>, CompsError> {
    if bytes.is_empty() || bytes[0] == VALUE_TOMBSTONE {
        return Ok(None);
    }
    if bytes[0] != VALUE_RECORD_VERSION {
        return Err(CompsError::Corrupt {
            key: key.to_string(),
            reason: "value record version mismatch".into(),
        });
    }
    String::from_utf8(bytes[1..].to_vec())
        .map(Some)
        .map_err(|err| CompsError::Corrupt {
            key: key.to_string(),
            reason: err.to_string(),
        })
}

fn read_bytes(store: &DataStore, key: &[u8]) -> Result<Option<Vec<u8>>, CompsError> {
    let entry = store.read(key).map_err(map_store_err)?;
    Ok(entry.map(|entry| entry.as_ref().to_vec()))
}

fn write_bytes(store: &DataStore, key: &[u8], payload: &[u8]) -> Result<(), CompsError> {
    store.write(key, payload).map_err(map_store_err)?;
    Ok(())
}

fn encode_bitcode_payload(bytes: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(1 + bytes.len());
    out.push(BITCODE_PREFIX);
    out.extend_from_slice(bytes);
    out
}

fn decode_bitcode_payload(bytes: &[u8]) -> Result<Vec<u8>, CompsError> {
    if bytes.first().copied() != Some(BITCODE_PREFIX) {
        return Err(CompsError::Store(
            "bitcode payload missing expected prefix".into(),
        ));
    }
    Ok(bytes[1..].to_vec())
}

fn coerce_store_path(path: PathBuf) -> PathBuf {
    if path.is_dir() {
        return path.join(DEFAULT_STORE_FILENAME);
    }
    path
}

fn ensure_parent_dir(path: &Path) -> Result<(), CompsError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}

fn map_store_err(err: io::Error) -> CompsError {
    CompsError::Store(err.to_string())
}

/// Change notification delivered to store subscribers after a write.
#[derive(Clone, Debug, PartialEq)]
pub enum StoreEvent {
    /// The starred set now holds these identities.
    StarredChanged(Vec<LeaseId>),
    /// The deal list was replaced with these deals.
    DealsChanged(Vec<Deal>),
}

type Subscriber = Arc<dyn Fn(&StoreEvent) + Send + Sync + 'static>;

/// Typed CRM state (starred leases and deals) over an injected backend.
pub struct CrmStore<B: KvBackend> {
    backend: B,
    subscribers: RwLock<Vec<(SubscriptionId, Subscriber)>>,
    next_subscription: AtomicU64,
}

impl<B: KvBackend + fmt::Debug> fmt::Debug for CrmStore<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CrmStore")
            .field("backend", &self.backend)
            .finish()
    }
}

impl CrmStore<MemoryBackend> {
    /// Store backed by a fresh in-memory backend.
    pub fn in_memory() -> Self {
        Self::new(MemoryBackend::new())
    }
}

impl<B: KvBackend> CrmStore<B> {
    /// Wrap `backend`.
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            subscribers: RwLock::new(Vec::new()),
            next_subscription: AtomicU64::new(1),
        }
    }

    /// Underlying backend.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Register `callback` for change events.
    pub fn subscribe<F>(&self, callback: F) -> Result<SubscriptionId, CompsError>
    where
        F: Fn(&StoreEvent) + Send + Sync + 'static,
    {
        let id = self.next_subscription.fetch_add(1, Ordering::Relaxed);
        self.subscribers
            .write()
            .map_err(|_| CompsError::Store("subscriber lock poisoned".into()))?
            .push((id, Arc::new(callback)));
        Ok(id)
    }

    /// Drop a subscription. Returns `false` when `id` was not registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> Result<bool, CompsError> {
        let mut guard = self
            .subscribers
            .write()
            .map_err(|_| CompsError::Store("subscriber lock poisoned".into()))?;
        let before = guard.len();
        guard.retain(|(existing, _)| *existing != id);
        Ok(guard.len() != before)
    }

    /// Starred lease identities, in the order they were starred.
    pub fn starred(&self) -> Result<Vec<LeaseId>, CompsError> {
        let Some(raw) = self.backend.get(STARRED_LEASES_KEY)? else {
            return Ok(Vec::new());
        };
        match serde_json::from_str::<Vec<LeaseId>>(&raw) {
            Ok(ids) => Ok(ids),
            Err(err) => {
                let reason = if serde_json::from_str::<Vec<LegacyLeaseKey>>(&raw).is_ok() {
                    "holds legacy composite keys; run migrate_legacy_starred".to_string()
                } else {
                    err.to_string()
                };
                warn!(key = STARRED_LEASES_KEY, %reason, "starred leases unreadable");
                Err(CompsError::Corrupt {
                    key: STARRED_LEASES_KEY.to_string(),
                    reason,
                })
            }
        }
    }

    /// True when `id` is starred.
    pub fn is_starred(&self, id: &LeaseId) -> Result<bool, CompsError> {
        Ok(self.starred()?.contains(id))
    }

    /// Replace the starred set (duplicates dropped, first occurrence kept).
    pub fn set_starred(&self, ids: Vec<LeaseId>) -> Result<(), CompsError> {
        let mut unique: Vec<LeaseId> = Vec::with_capacity(ids.len());
        for id in ids {
            if !unique.contains(&id) {
                unique.push(id);
            }
        }
        self.write_json(STARRED_LEASES_KEY, &unique)?;
        self.notify(&StoreEvent::StarredChanged(unique));
        Ok(())
    }

    /// Star `id` if unstarred, unstar it otherwise. Returns the new state.
    pub fn toggle_starred(&self, id: LeaseId) -> Result<bool, CompsError> {
        let mut ids = self.starred()?;
        let now_starred = match ids.iter().position(|existing| *existing == id) {
            Some(pos) => {
                ids.remove(pos);
                false
            }
            None => {
                ids.push(id);
                true
            }
        };
        self.set_starred(ids)?;
        Ok(now_starred)
    }

    /// Star every comparable whose legacy key appears in `keys`.
    ///
    /// Legacy keys are matched by rendering each comparable's key, never by
    /// splitting on `-`. A key shared by several comparables stars all of them.
    /// Returns how many identities were newly starred.
    pub fn import_legacy_starred(
        &self,
        keys: &[LegacyLeaseKey],
        comps: &[Comparable],
    ) -> Result<usize, CompsError> {
        let mut ids = self.starred()?;
        let added = merge_legacy_keys(&mut ids, keys, comps);
        if added > 0 {
            self.set_starred(ids)?;
        }
        Ok(added)
    }

    /// Convert a stored list of legacy composite keys into structured identities.
    ///
    /// Keys matching none of `comps` are dropped. Returns how many identities
    /// were stored; `0` when the stored value is already structured or absent.
    pub fn migrate_legacy_starred(&self, comps: &[Comparable]) -> Result<usize, CompsError> {
        let Some(raw) = self.backend.get(STARRED_LEASES_KEY)? else {
            return Ok(0);
        };
        if serde_json::from_str::<Vec<LeaseId>>(&raw).is_ok() {
            return Ok(0);
        }
        let keys: Vec<LegacyLeaseKey> =
            serde_json::from_str(&raw).map_err(|err| CompsError::Corrupt {
                key: STARRED_LEASES_KEY.to_string(),
                reason: err.to_string(),
            })?;
        let mut ids = Vec::new();
        let added = merge_legacy_keys(&mut ids, &keys, comps);
        if added < keys.len() {
            warn!(
                unmatched = keys.len() - added,
                "legacy starred keys without a matching comparable were dropped"
            );
        }
        self.set_starred(ids)?;
        Ok(added)
    }

    /// Starred comparables from `comps`, in `comps` order.
    pub fn starred_comparables(&self, comps: &[Comparable]) -> Result<Vec<Comparable>, CompsError> {
        let ids = self.starred()?;
        Ok(comps
            .iter()
            .filter(|comp| ids.iter().any(|id| id.matches(comp)))
            .cloned()
            .collect())
    }

    /// Saved deals, or the seed deals when none have been saved.
    pub fn deals(&self) -> Result<Vec<Deal>, CompsError> {
        Ok(self.read_json(DEALS_KEY)?.unwrap_or_else(seed_deals))
    }

    /// Persist the full deal list.
    pub fn save_deals(&self, deals: &[Deal]) -> Result<(), CompsError> {
        self.write_json(DEALS_KEY, deals)?;
        self.notify(&StoreEvent::DealsChanged(deals.to_vec()));
        Ok(())
    }

    /// Add or update a deal and persist the list.
    pub fn submit_deal(
        &self,
        details: DealDetails,
        existing_id: Option<&str>,
    ) -> Result<DealId, CompsError> {
        let mut deals = self.deals()?;
        let id = deals::submit_deal(&mut deals, details, existing_id)?;
        self.save_deals(&deals)?;
        Ok(id)
    }

    /// Move a deal to `stage` and persist the list.
    pub fn move_deal(&self, id: &str, stage: DealStage) -> Result<(), CompsError> {
        let mut deals = self.deals()?;
        deals::move_deal(&mut deals, id, stage)?;
        self.save_deals(&deals)
    }

    fn read_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, CompsError> {
        let Some(raw) = self.backend.get(key)? else {
            return Ok(None);
        };
        serde_json::from_str(&raw).map(Some).map_err(|err| {
            warn!(key, error = %err, "stored value unreadable");
            CompsError::Corrupt {
                key: key.to_string(),
                reason: err.to_string(),
            }
        })
    }

    fn write_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), CompsError> {
        let raw = serde_json::to_string(value)
            .map_err(|err| CompsError::Store(format!("failed to encode '{key}': {err}")))?;
        self.backend.set(key, &raw)
    }

    fn notify(&self, event: &StoreEvent) {
        let subscribers: Vec<Subscriber> = match self.subscribers.read() {
            Ok(guard) => guard.iter().map(|(_, callback)| callback.clone()).collect(),
            Err(_) => {
                warn!("subscriber lock poisoned; skipping change notification");
                return;
            }
        };
        for callback in subscribers {
            callback(event);
        }
    }
}

fn merge_legacy_keys(
    ids: &mut Vec<LeaseId>,
    keys: &[LegacyLeaseKey],
    comps: &[Comparable],
) -> usize {
    let mut added = 0;
    for comp in comps {
        if !keys.contains(&comp.legacy_key()) {
            continue;
        }
        let id = comp.lease_id();
        if !ids.contains(&id) {
            ids.push(id);
            added += 1;
        }
    }
    added
}
