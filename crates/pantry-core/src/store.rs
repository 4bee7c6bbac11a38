use std::collections::HashSet;

use tracing::{debug, error, info, warn};

use crate::filter::ItemFilter;
use crate::item::{Item, new_item_id};
use crate::notify::{Change, Notifier};
use crate::storage::Storage;

pub const ITEMS_KEY: &str = "shoppingList";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListSummary {
    pub total: usize,
    pub remaining: usize,
    pub completed: usize,
}

/// Owns every item of every list.
///
/// Mutations never fail: blank names and unknown ids are ignored. Any call
/// that changes state writes the whole collection back to storage and then
/// notifies subscribers before returning. Write failures are logged only;
/// the in-memory state stays authoritative until the next successful write.
#[derive(Debug)]
pub struct ListStore<S: Storage> {
    storage: S,
    key: String,
    items: Vec<Item>,
    notifier: Notifier,
}

impl<S: Storage> ListStore<S> {
    pub fn open(storage: S, key: &str) -> Self {
        Self::open_with_notifier(storage, key, Notifier::new())
    }

    #[tracing::instrument(skip(storage, notifier))]
    pub fn open_with_notifier(storage: S, key: &str, notifier: Notifier) -> Self {
        let items = load_items(&storage, key);
        info!(count = items.len(), "loaded items");
        Self {
            storage,
            key: key.to_string(),
            items,
            notifier,
        }
    }

    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn items_for(&self, list_id: &str) -> Vec<Item> {
        self.items
            .iter()
            .filter(|item| item.belongs_to(list_id))
            .cloned()
            .collect()
    }

    pub fn filtered(&self, list_id: &str, filter: &ItemFilter) -> Vec<Item> {
        self.items
            .iter()
            .filter(|item| item.belongs_to(list_id) && filter.matches(item))
            .cloned()
            .collect()
    }

    pub fn get(&self, id: &str) -> Option<&Item> {
        self.items.iter().find(|item| item.id == id)
    }

    pub fn summary(&self, list_id: &str) -> ListSummary {
        let mut summary = ListSummary::default();
        for item in self.items.iter().filter(|item| item.belongs_to(list_id)) {
            summary.total += 1;
            if item.completed {
                summary.completed += 1;
            } else {
                summary.remaining += 1;
            }
        }
        summary
    }

    pub fn add(&mut self, list_id: &str, name: &str, category: Option<&str>) {
        if name.trim().is_empty() {
            debug!("ignoring add with blank name");
            return;
        }

        let item = Item::new(name, normalize_category(category), list_id);
        debug!(id = %item.id, list = %list_id, "adding item");
        self.items.push(item);
        self.commit();
    }

    pub fn toggle(&mut self, id: &str) {
        let Some(item) = self.items.iter_mut().find(|item| item.id == id) else {
            debug!(id, "toggle for unknown item ignored");
            return;
        };

        item.completed = !item.completed;
        debug!(id, completed = item.completed, "toggled item");
        self.commit();
    }

    pub fn edit(&mut self, id: &str, name: &str, category: Option<&str>) {
        let name = name.trim();
        if name.is_empty() {
            debug!(id, "ignoring edit with blank name");
            return;
        }

        let Some(item) = self.items.iter_mut().find(|item| item.id == id) else {
            debug!(id, "edit for unknown item ignored");
            return;
        };

        item.name = name.to_string();
        item.category = normalize_category(category);
        debug!(id, "edited item");
        self.commit();
    }

    pub fn delete(&mut self, id: &str) {
        let Some(idx) = self.items.iter().position(|item| item.id == id) else {
            debug!(id, "delete for unknown item ignored");
            return;
        };

        self.items.remove(idx);
        debug!(id, "deleted item");
        self.commit();
    }

    pub fn clear_completed(&mut self, list_id: &str) {
        self.remove_where(|item| item.belongs_to(list_id) && item.completed);
    }

    pub fn clear_list(&mut self, list_id: &str) {
        self.remove_where(|item| item.belongs_to(list_id));
    }

    pub fn complete_all(&mut self, list_id: &str) {
        let mut changed = 0usize;
        for item in self
            .items
            .iter_mut()
            .filter(|item| item.belongs_to(list_id) && !item.completed)
        {
            item.completed = true;
            changed += 1;
        }

        debug!(list = %list_id, changed, "completed all items");
        if changed > 0 {
            self.commit();
        }
    }

    /// Appends a fresh-id duplicate of every `source` item to `target`.
    pub fn copy(&mut self, source: &str, target: &str) {
        let copies: Vec<Item> = self
            .items
            .iter()
            .filter(|item| item.belongs_to(source))
            .map(|item| item.duplicate_into(target))
            .collect();

        debug!(source, target, count = copies.len(), "copying list");
        if copies.is_empty() {
            return;
        }

        self.items.extend(copies);
        self.commit();
    }

    fn remove_where<F>(&mut self, predicate: F)
    where
        F: Fn(&Item) -> bool,
    {
        let before = self.items.len();
        self.items.retain(|item| !predicate(item));
        let removed = before - self.items.len();

        debug!(removed, "removed items");
        if removed > 0 {
            self.commit();
        }
    }

    fn commit(&self) {
        self.persist();
        self.notifier.notify(Change::Items);
    }

    #[tracing::instrument(skip(self), fields(key = %self.key, count = self.items.len()))]
    fn persist(&self) {
        let payload = match serde_json::to_string(&self.items) {
            Ok(payload) => payload,
            Err(error) => {
                error!(%error, "failed serializing items");
                return;
            }
        };

        if let Err(error) = self.storage.write(&self.key, &payload) {
            warn!(%error, "failed persisting items; keeping in-memory state");
        }
    }
}

fn normalize_category(category: Option<&str>) -> Option<String> {
    category
        .map(str::trim)
        .filter(|category| !category.is_empty())
        .map(str::to_string)
}

#[tracing::instrument(skip(storage))]
fn load_items<S: Storage>(storage: &S, key: &str) -> Vec<Item> {
    let raw = match storage.read(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => {
            debug!("no stored items");
            return Vec::new();
        }
        Err(error) => {
            warn!(%error, "failed reading stored items; starting empty");
            return Vec::new();
        }
    };

    let mut items = match serde_json::from_str::<Vec<Item>>(&raw) {
        Ok(items) => items,
        Err(error) => {
            error!(%error, "failed parsing stored items; starting empty");
            return Vec::new();
        }
    };

    let repaired = repair_ids(&mut items);
    if repaired > 0 {
        warn!(repaired, "assigned fresh ids to blank or colliding items");
    }
    items
}

fn repair_ids(items: &mut [Item]) -> usize {
    let mut seen = HashSet::with_capacity(items.len());
    let mut repaired = 0;
    for item in items.iter_mut() {
        if item.id.trim().is_empty() || seen.contains(&item.id) {
            item.id = new_item_id();
            repaired += 1;
        }
        seen.insert(item.id.clone());
    }
    repaired
}
