//! Settings persistence.
//!
//! [`SettingsStore`] implements [`SettingsPort`] on top of any
//! [`StoragePort`] (EEPROM emulation on the board, [`MemoryStorage`] on the
//! host).  The record is `postcard`-encoded with the version byte first.
//! Whenever the stored record is missing, unreadable or of another version,
//! the compiled defaults are written back and returned: defaults are
//! authoritative after a layout change.

use std::collections::HashMap;

use log::{info, warn};

use crate::app::ports::{ConfigError, SettingsPort, StorageError, StoragePort};
use crate::config::{SETTINGS_VERSION, Settings};
use crate::error::Error;

pub const SETTINGS_NAMESPACE: &str = "chiller";
pub const SETTINGS_KEY: &str = "settings";

/// Upper bound on the encoded record size.
const MAX_RECORD_LEN: usize = 64;

/// Loads and saves [`Settings`] through a key-value store.
pub struct SettingsStore<S> {
    storage: S,
}

impl<S: StoragePort> SettingsStore<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    /// Write the compiled defaults and return them.
    fn reinitialise(&mut self, reason: &str) -> Settings {
        warn!("SettingsStore: {reason}, restoring defaults (version {SETTINGS_VERSION})");
        let defaults = Settings::default();
        if let Err(e) = self.save(&defaults) {
            // Still run on defaults; the next boot retries the write.
            warn!("SettingsStore: could not persist defaults: {e}");
        }
        defaults
    }
}

fn validation_error(e: Error) -> ConfigError {
    match e {
        Error::Config(msg) => ConfigError::ValidationFailed(msg),
        _ => ConfigError::ValidationFailed("invalid settings"),
    }
}

impl<S: StoragePort> SettingsPort for SettingsStore<S> {
    fn load(&mut self) -> Result<Settings, ConfigError> {
        let mut buf = [0u8; MAX_RECORD_LEN];
        let len = match self.storage.read(SETTINGS_NAMESPACE, SETTINGS_KEY, &mut buf) {
            Ok(len) => len,
            Err(StorageError::NotFound) => return Ok(self.reinitialise("no stored settings")),
            Err(e) => return Err(ConfigError::Storage(e)),
        };

        let record = &buf[..len];
        match record.first() {
            Some(&v) if v == SETTINGS_VERSION => {}
            Some(&v) => return Ok(self.reinitialise(&format!("stored version {v}"))),
            None => return Ok(self.reinitialise("empty record")),
        }

        let settings: Settings = match postcard::from_bytes(record) {
            Ok(s) => s,
            Err(_) => return Ok(self.reinitialise("corrupt record")),
        };
        if let Err(e) = settings.validate() {
            return Ok(self.reinitialise(&format!("stored settings invalid ({e})")));
        }
        info!("SettingsStore: loaded version {} ({len} bytes)", settings.version);
        Ok(settings)
    }

    fn save(&mut self, settings: &Settings) -> Result<(), ConfigError> {
        settings.validate().map_err(validation_error)?;
        let bytes = postcard::to_allocvec(settings).map_err(|_| ConfigError::Encode)?;
        if bytes.len() > MAX_RECORD_LEN {
            return Err(ConfigError::Encode);
        }
        self.storage.write(SETTINGS_NAMESPACE, SETTINGS_KEY, &bytes)?;
        info!("SettingsStore: saved ({} bytes)", bytes.len());
        Ok(())
    }
}

// ── In-memory storage ─────────────────────────────────────────

/// `HashMap`-backed [`StoragePort`] for the host.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    store: HashMap<String, Vec<u8>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn composite_key(namespace: &str, key: &str) -> String {
        format!("{namespace}::{key}")
    }
}

impl StoragePort for MemoryStorage {
    fn read(&self, namespace: &str, key: &str, buf: &mut [u8]) -> Result<usize, StorageError> {
        match self.store.get(&Self::composite_key(namespace, key)) {
            Some(data) => {
                let len = data.len().min(buf.len());
                buf[..len].copy_from_slice(&data[..len]);
                Ok(len)
            }
            None => Err(StorageError::NotFound),
        }
    }

    fn write(&mut self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError> {
        self.store.insert(Self::composite_key(namespace, key), data.to_vec());
        Ok(())
    }

    fn delete(&mut self, namespace: &str, key: &str) -> Result<(), StorageError> {
        self.store.remove(&Self::composite_key(namespace, key));
        Ok(())
    }

    fn exists(&self, namespace: &str, key: &str) -> bool {
        self.store.contains_key(&Self::composite_key(namespace, key))
    }
}
