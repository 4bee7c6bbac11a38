use tracing::{debug, info};

use crate::config::Config;
use crate::error::RegistryError;
use crate::item::DEFAULT_LIST;
use crate::notify::{Change, Notifier, SubscriptionId};
use crate::registry::{LISTS_KEY, ListRegistry};
use crate::storage::Storage;
use crate::store::{ITEMS_KEY, ListStore};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOptions {
    pub items_key: String,
    pub lists_key: String,
    /// Also clear a list's items when the list is deleted.
    pub cascade_delete: bool,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            items_key: ITEMS_KEY.to_string(),
            lists_key: LISTS_KEY.to_string(),
            cascade_delete: false,
        }
    }
}

impl SessionOptions {
    pub fn from_config(cfg: &Config) -> Self {
        let defaults = Self::default();
        Self {
            items_key: cfg.get("storage.items_key").unwrap_or(defaults.items_key),
            lists_key: cfg.get("storage.lists_key").unwrap_or(defaults.lists_key),
            cascade_delete: cfg
                .get_bool("lists.cascade_delete")
                .unwrap_or(defaults.cascade_delete),
        }
    }
}

/// The list engine: one store and one registry over a shared storage handle,
/// reporting changes through one notifier.
#[derive(Debug)]
pub struct Session<S: Storage + Clone> {
    store: ListStore<S>,
    registry: ListRegistry<S>,
    notifier: Notifier,
    cascade_delete: bool,
}

impl<S: Storage + Clone> Session<S> {
    #[tracing::instrument(skip(storage))]
    pub fn open(storage: S, options: SessionOptions) -> Self {
        let notifier = Notifier::new();
        let store =
            ListStore::open_with_notifier(storage.clone(), &options.items_key, notifier.clone());
        let registry =
            ListRegistry::open_with_notifier(storage, &options.lists_key, notifier.clone());

        info!(
            items = store.items().len(),
            lists = registry.len(),
            cascade_delete = options.cascade_delete,
            "opened session"
        );

        Self {
            store,
            registry,
            notifier,
            cascade_delete: options.cascade_delete,
        }
    }

    pub fn store(&self) -> &ListStore<S> {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut ListStore<S> {
        &mut self.store
    }

    pub fn registry(&self) -> &ListRegistry<S> {
        &self.registry
    }

    /// Registry mutations made here skip the cascade of `delete_list`.
    pub fn registry_mut(&mut self) -> &mut ListRegistry<S> {
        &mut self.registry
    }

    pub fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: FnMut(Change) + 'static,
    {
        self.notifier.subscribe(callback)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.notifier.unsubscribe(id)
    }

    /// `"default"` first, then registry order.
    pub fn list_ids(&self) -> Vec<String> {
        std::iter::once(DEFAULT_LIST.to_string())
            .chain(self.registry.names().iter().cloned())
            .collect()
    }

    pub fn is_known_list(&self, list_id: &str) -> bool {
        self.registry.contains(list_id)
    }

    /// List ids that still own items but are no longer registered.
    pub fn orphaned_list_ids(&self) -> Vec<String> {
        let mut orphans: Vec<String> = Vec::new();
        for item in self.store.items() {
            if !self.is_known_list(&item.list_id) && !orphans.contains(&item.list_id) {
                orphans.push(item.list_id.clone());
            }
        }
        orphans
    }

    pub fn create_list(&mut self, name: &str) -> Result<String, RegistryError> {
        self.registry.create(name)
    }

    /// Items keep their list id, so the old list's items become orphaned.
    pub fn rename_list(&mut self, old: &str, new: &str) -> Result<String, RegistryError> {
        self.registry.rename(old, new)
    }

    /// Returns whether the registry entry existed.
    pub fn delete_list(&mut self, name: &str) -> bool {
        let removed = self.registry.delete(name);
        if removed && self.cascade_delete {
            debug!(name, "cascading list delete to items");
            self.store.clear_list(name);
        }
        removed
    }
}
