//! # Persistent key/value storage
//!
//! Each device owns a [`Dictionary`] where its identity is persisted, and refers to a preset
//! dictionary shared by devices of the same configuration. The on-disk format is up to the
//! [`Store`] implementation; [`MemoryStore`] keeps everything in memory.

use std::collections::BTreeMap;
use std::fmt::{Debug, Formatter};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::core::utils::{Closable, Closer};

use crate::prelude::*;

/// Dictionary change observer.
pub type Observer = Arc<dyn Fn() + Send + Sync>;

/// Active subscription to dictionary changes.
///
/// The observer is detached once the subscription is dropped.
#[derive(Debug)]
#[must_use]
pub struct Subscription(#[allow(dead_code)] Closer);

impl Subscription {
    /// Creates a subscription and the closable the dictionary watches to detach the observer.
    pub fn new() -> (Self, Closable) {
        let closer = Closer::new();
        let closable = closer.to_closable();
        (Self(closer), closable)
    }
}

/// Persisted key/value dictionary.
///
/// Changes made with [`put`](Dictionary::put), [`remove`](Dictionary::remove) and
/// [`clear`](Dictionary::clear) are visible immediately and persisted on
/// [`commit`](Dictionary::commit), which also notifies observers.
pub trait Dictionary: Debug + Send + Sync {
    /// Key of this dictionary within the store.
    fn key(&self) -> &str;

    /// Value stored under `key`.
    fn get(&self, key: &str) -> Option<String>;

    /// Stores `value` under `key`.
    fn put(&self, key: &str, value: String);

    /// Removes `key`.
    fn remove(&self, key: &str);

    /// Removes all keys.
    fn clear(&self);

    /// Persists pending changes.
    fn commit(&self) -> Result<()>;

    /// Returns `true` if nothing is persisted in this dictionary.
    fn is_new(&self) -> bool;

    /// Registers an observer called after each commit.
    fn subscribe(&self, observer: Observer) -> Subscription;
}

/// Storage of device and preset dictionaries.
pub trait Store: Debug + Send + Sync {
    /// Dictionary of the device with given identifier.
    fn device(&self, id: &DeviceId) -> Arc<dyn Dictionary>;

    /// Preset dictionary with given key.
    fn preset(&self, key: &str) -> Arc<dyn Dictionary>;

    /// Identifiers of all persisted devices.
    fn devices(&self) -> Vec<DeviceId>;
}

#[derive(Default)]
struct DictionaryInner {
    values: BTreeMap<String, String>,
    committed: BTreeMap<String, String>,
    observers: Vec<(Closable, Observer)>,
}

/// In-memory [`Dictionary`].
pub struct MemoryDictionary {
    key: String,
    inner: Mutex<DictionaryInner>,
}

impl MemoryDictionary {
    /// Creates an empty dictionary.
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            inner: Mutex::new(DictionaryInner::default()),
        }
    }

    /// Number of attached observers.
    pub fn observers(&self) -> usize {
        let mut inner = self.lock();
        inner.observers.retain(|(state, _)| !state.is_closed());
        inner.observers.len()
    }

    fn lock(&self) -> MutexGuard<'_, DictionaryInner> {
        self.inner.lock().unwrap_or_else(|err| err.into_inner())
    }
}

impl Debug for MemoryDictionary {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let inner = self.lock();
        f.debug_struct("MemoryDictionary")
            .field("key", &self.key)
            .field("values", &inner.values)
            .finish_non_exhaustive()
    }
}

impl Dictionary for MemoryDictionary {
    fn key(&self) -> &str {
        self.key.as_str()
    }

    fn get(&self, key: &str) -> Option<String> {
        self.lock().values.get(key).cloned()
    }

    fn put(&self, key: &str, value: String) {
        self.lock().values.insert(key.to_string(), value);
    }

    fn remove(&self, key: &str) {
        self.lock().values.remove(key);
    }

    fn clear(&self) {
        self.lock().values.clear();
    }

    fn commit(&self) -> Result<()> {
        let observers: Vec<Observer> = {
            let mut inner = self.inner.lock()?;
            inner.committed = inner.values.clone();
            inner.observers.retain(|(state, _)| !state.is_closed());
            inner
                .observers
                .iter()
                .map(|(_, observer)| observer.clone())
                .collect()
        };

        for observer in observers {
            observer();
        }
        Ok(())
    }

    fn is_new(&self) -> bool {
        self.lock().committed.is_empty()
    }

    fn subscribe(&self, observer: Observer) -> Subscription {
        let (subscription, state) = Subscription::new();
        self.lock().observers.push((state, observer));
        subscription
    }
}

/// In-memory [`Store`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    devices: Mutex<BTreeMap<DeviceId, Arc<MemoryDictionary>>>,
    presets: Mutex<BTreeMap<String, Arc<MemoryDictionary>>>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl Store for MemoryStore {
    fn device(&self, id: &DeviceId) -> Arc<dyn Dictionary> {
        let mut devices = self.devices.lock().unwrap_or_else(|err| err.into_inner());
        devices
            .entry(id.clone())
            .or_insert_with(|| Arc::new(MemoryDictionary::new(id.as_str())))
            .clone()
    }

    fn preset(&self, key: &str) -> Arc<dyn Dictionary> {
        let mut presets = self.presets.lock().unwrap_or_else(|err| err.into_inner());
        presets
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(MemoryDictionary::new(key)))
            .clone()
    }

    fn devices(&self) -> Vec<DeviceId> {
        let devices = self.devices.lock().unwrap_or_else(|err| err.into_inner());
        devices
            .iter()
            .filter(|(_, dictionary)| !dictionary.is_new())
            .map(|(id, _)| id.clone())
            .collect()
    }
}
