use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use anyhow::{Context, anyhow};
use tempfile::NamedTempFile;
use tracing::{debug, info};

/// Key-value string store the engine reads once at startup and writes after
/// every mutation.
///
/// Implementations are handles: cloning one must yield another view of the
/// same underlying data, so a store and a registry can share it.
pub trait Storage {
    fn read(&self, key: &str) -> anyhow::Result<Option<String>>;

    fn write(&self, key: &str, value: &str) -> anyhow::Result<()>;
}

/// In-process storage. Clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    entries: Rc<RefCell<BTreeMap<String, String>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(self, key: &str, value: &str) -> Self {
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        self
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

impl Storage for MemoryStorage {
    fn read(&self, key: &str) -> anyhow::Result<Option<String>> {
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> anyhow::Result<()> {
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// One `<key>.json` file per key inside `data_dir`.
#[derive(Debug, Clone)]
pub struct FileStorage {
    pub data_dir: PathBuf,
}

impl FileStorage {
    #[tracing::instrument(skip(data_dir))]
    pub fn open(data_dir: &Path) -> anyhow::Result<Self> {
        let data_dir = data_dir.to_path_buf();
        fs::create_dir_all(&data_dir)
            .with_context(|| format!("failed to create {}", data_dir.display()))?;

        info!(data_dir = %data_dir.display(), "opened file storage");
        Ok(Self { data_dir })
    }

    pub fn path_for(&self, key: &str) -> anyhow::Result<PathBuf> {
        validate_key(key)?;
        Ok(self.data_dir.join(format!("{key}.json")))
    }
}

impl Storage for FileStorage {
    #[tracing::instrument(skip(self))]
    fn read(&self, key: &str) -> anyhow::Result<Option<String>> {
        let path = self.path_for(key)?;
        if !path.exists() {
            debug!(file = %path.display(), "no stored value");
            return Ok(None);
        }

        let raw = fs::read_to_string(&path)
            .with_context(|| format!("failed reading {}", path.display()))?;
        debug!(file = %path.display(), bytes = raw.len(), "read stored value");
        Ok(Some(raw))
    }

    #[tracing::instrument(skip(self, value))]
    fn write(&self, key: &str, value: &str) -> anyhow::Result<()> {
        let path = self.path_for(key)?;
        debug!(file = %path.display(), bytes = value.len(), "writing value atomically");

        let mut temp = NamedTempFile::new_in(&self.data_dir)?;
        temp.write_all(value.as_bytes())?;
        temp.flush()?;
        temp.persist(&path)
            .map_err(|err| anyhow!("failed to persist {}: {}", path.display(), err))?;

        Ok(())
    }
}

fn validate_key(key: &str) -> anyhow::Result<()> {
    let valid = !key.is_empty()
        && !key.starts_with('.')
        && key
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_' | '.'));
    if valid {
        Ok(())
    } else {
        Err(anyhow!("invalid storage key: {key:?}"))
    }
}

/// Storage whose writes always fail, for exercising the log-and-continue path.
#[cfg(test)]
#[derive(Debug, Clone, Default)]
pub(crate) struct FailingStorage {
    attempts: Rc<std::cell::Cell<usize>>,
}

#[cfg(test)]
impl FailingStorage {
    pub(crate) fn attempts(&self) -> usize {
        self.attempts.get()
    }
}

#[cfg(test)]
impl Storage for FailingStorage {
    fn read(&self, _key: &str) -> anyhow::Result<Option<String>> {
        Ok(None)
    }

    fn write(&self, key: &str, _value: &str) -> anyhow::Result<()> {
        self.attempts.set(self.attempts.get() + 1);
        Err(anyhow!("disk full while writing {key}"))
    }
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn memory_clones_share_entries() {
        let storage = MemoryStorage::new();
        let other = storage.clone();

        storage.write("shoppingList", "[]").expect("write");
        assert_eq!(
            other.read("shoppingList").expect("read").as_deref(),
            Some("[]")
        );
        assert_eq!(other.len(), 1);
    }

    #[test]
    fn file_storage_roundtrip_and_missing_key() {
        let temp = tempdir().expect("tempdir");
        let storage = FileStorage::open(&temp.path().join("data")).expect("open");

        assert_eq!(storage.read("savedLists").expect("read missing"), None);

        storage.write("savedLists", r#"["Party"]"#).expect("write");
        storage.write("savedLists", r#"["Party","Hardware"]"#).expect("overwrite");

        assert_eq!(
            storage.read("savedLists").expect("read").as_deref(),
            Some(r#"["Party","Hardware"]"#)
        );
        assert!(temp.path().join("data").join("savedLists.json").exists());
    }

    #[test]
    fn file_storage_rejects_path_like_keys() {
        let temp = tempdir().expect("tempdir");
        let storage = FileStorage::open(temp.path()).expect("open");

        assert!(storage.write("../escape", "[]").is_err());
        assert!(storage.read("a/b").is_err());
        assert!(storage.read("").is_err());
        assert!(storage.read(".hidden").is_err());
    }
}
