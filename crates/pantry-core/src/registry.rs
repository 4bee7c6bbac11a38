use tracing::{debug, error, info, warn};

use crate::error::RegistryError;
use crate::item::DEFAULT_LIST;
use crate::notify::{Change, Notifier};
use crate::storage::Storage;

pub const LISTS_KEY: &str = "savedLists";

/// Ordered, duplicate-free names of the user's lists.
///
/// `"default"` is implied and never stored. Deleting or renaming a list does
/// not touch the items filed under it.
#[derive(Debug)]
pub struct ListRegistry<S: Storage> {
    storage: S,
    key: String,
    names: Vec<String>,
    notifier: Notifier,
}

impl<S: Storage> ListRegistry<S> {
    pub fn open(storage: S, key: &str) -> Self {
        Self::open_with_notifier(storage, key, Notifier::new())
    }

    #[tracing::instrument(skip(storage, notifier))]
    pub fn open_with_notifier(storage: S, key: &str, notifier: Notifier) -> Self {
        let names = load_names(&storage, key);
        info!(count = names.len(), "loaded list registry");
        Self {
            storage,
            key: key.to_string(),
            names,
            notifier,
        }
    }

    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Exact match. `"default"` always counts as present.
    pub fn contains(&self, name: &str) -> bool {
        name == DEFAULT_LIST || self.names.iter().any(|existing| existing == name)
    }

    /// Appends `name` trimmed and returns the stored form.
    pub fn create(&mut self, name: &str) -> Result<String, RegistryError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(RegistryError::InvalidName);
        }
        if self.contains(name) {
            return Err(RegistryError::DuplicateName {
                name: name.to_string(),
            });
        }

        self.names.push(name.to_string());
        debug!(name, "created list");
        self.commit();
        Ok(name.to_string())
    }

    /// Replaces `old` in place with `new` trimmed and returns the stored form.
    pub fn rename(&mut self, old: &str, new: &str) -> Result<String, RegistryError> {
        let new = new.trim();
        if new.is_empty() {
            return Err(RegistryError::InvalidName);
        }

        let Some(idx) = self.names.iter().position(|existing| existing == old) else {
            return Err(RegistryError::NotFound {
                name: old.to_string(),
            });
        };

        if new != old && self.contains(new) {
            return Err(RegistryError::DuplicateName {
                name: new.to_string(),
            });
        }

        self.names[idx] = new.to_string();
        debug!(old, new, "renamed list");
        self.commit();
        Ok(new.to_string())
    }

    /// Returns whether an entry was removed.
    pub fn delete(&mut self, name: &str) -> bool {
        let before = self.names.len();
        self.names.retain(|existing| existing != name);
        if self.names.len() == before {
            debug!(name, "delete for unknown list ignored");
            return false;
        }

        debug!(name, "deleted list");
        self.commit();
        true
    }

    fn commit(&self) {
        self.persist();
        self.notifier.notify(Change::Lists);
    }

    #[tracing::instrument(skip(self), fields(key = %self.key, count = self.names.len()))]
    fn persist(&self) {
        let payload = match serde_json::to_string(&self.names) {
            Ok(payload) => payload,
            Err(error) => {
                error!(%error, "failed serializing list registry");
                return;
            }
        };

        if let Err(error) = self.storage.write(&self.key, &payload) {
            warn!(%error, "failed persisting list registry; keeping in-memory state");
        }
    }
}

#[tracing::instrument(skip(storage))]
fn load_names<S: Storage>(storage: &S, key: &str) -> Vec<String> {
    let raw = match storage.read(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => {
            debug!("no stored list registry");
            return Vec::new();
        }
        Err(error) => {
            warn!(%error, "failed reading list registry; starting empty");
            return Vec::new();
        }
    };

    let stored = match serde_json::from_str::<Vec<String>>(&raw) {
        Ok(stored) => stored,
        Err(error) => {
            error!(%error, "failed parsing list registry; starting empty");
            return Vec::new();
        }
    };

    let mut names: Vec<String> = Vec::with_capacity(stored.len());
    for name in stored {
        if name.trim().is_empty() || name == DEFAULT_LIST || names.contains(&name) {
            warn!(name = %name, "dropping invalid list registry entry");
            continue;
        }
        names.push(name);
    }
    names
}
