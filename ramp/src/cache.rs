use crate::artifact::ArtifactKey;
use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, trace, warn};

/// Read access to persisted raw result artifacts.
pub trait ArtifactStore: Send + Sync {
    fn contains(&self, key: &ArtifactKey) -> bool;

    /// Location handed to the external tools that write or read the artifact.
    fn path(&self, key: &ArtifactKey) -> PathBuf;

    /// Drops an artifact so the rate is attacked again on the next sweep.
    fn discard(&self, key: &ArtifactKey) -> io::Result<()>;
}

/// Artifacts kept as `results_<key>.bin` files in a directory.
#[derive(Debug, Clone)]
pub struct DirectoryStore {
    directory: PathBuf,
}

impl DirectoryStore {
    pub fn new(directory: impl AsRef<Path>) -> Self {
        Self {
            directory: directory.as_ref().to_path_buf(),
        }
    }
}

impl ArtifactStore for DirectoryStore {
    fn contains(&self, key: &ArtifactKey) -> bool {
        self.path(key).is_file()
    }

    fn path(&self, key: &ArtifactKey) -> PathBuf {
        self.directory.join(key.file_name())
    }

    fn discard(&self, key: &ArtifactKey) -> io::Result<()> {
        match std::fs::remove_file(self.path(key)) {
            Err(error) if error.kind() != io::ErrorKind::NotFound => Err(error),
            _ => Ok(()),
        }
    }
}

/// In-memory store, shared between clones.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    keys: Arc<RwLock<HashSet<ArtifactKey>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, key: ArtifactKey) {
        self.keys
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key);
    }
}

impl ArtifactStore for MemoryStore {
    fn contains(&self, key: &ArtifactKey) -> bool {
        self.keys
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(key)
    }

    fn path(&self, key: &ArtifactKey) -> PathBuf {
        PathBuf::from(key.file_name())
    }

    fn discard(&self, key: &ArtifactKey) -> io::Result<()> {
        self.keys
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
        Ok(())
    }
}

/// Tells which rates of a sweep already have a reusable artifact.
pub struct RunCache {
    store: Arc<dyn ArtifactStore>,
}

impl RunCache {
    pub fn new(store: Arc<dyn ArtifactStore>) -> Self {
        Self { store }
    }

    pub fn exists(&self, rate: f64) -> bool {
        let key = ArtifactKey::from_rate(rate);
        let exists = self.store.contains(&key);
        trace!(
            "Artifact {} for rate {rate}/s cached: {exists}",
            key.file_name()
        );
        exists
    }

    pub fn artifact_path(&self, rate: f64) -> PathBuf {
        self.store.path(&ArtifactKey::from_rate(rate))
    }

    /// Removes a possibly partial artifact, logging instead of failing.
    pub fn discard(&self, rate: f64) {
        let key = ArtifactKey::from_rate(rate);
        match self.store.discard(&key) {
            Ok(()) => debug!("Discarded artifact {} for rate {rate}/s", key.file_name()),
            Err(error) => warn!(
                "Cannot discard artifact {} for rate {rate}/s: {error}",
                key.file_name()
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ladder::RateLadder;
    use std::fs;

    #[test]
    fn directory_store_reports_existing_artifacts_only() {
        let directory = tempfile::tempdir().unwrap();
        let cache = RunCache::new(Arc::new(DirectoryStore::new(directory.path())));

        assert!(!cache.exists(1.0));
        fs::write(directory.path().join("results_1000.bin"), b"").unwrap();
        assert!(cache.exists(1.0));
        assert!(!cache.exists(1.2589254117941673));
        assert_eq!(
            cache.artifact_path(1.0),
            directory.path().join("results_1000.bin")
        );
    }

    #[test]
    fn directory_store_ignores_directories_named_like_artifacts() {
        let directory = tempfile::tempdir().unwrap();
        fs::create_dir(directory.path().join("results_1000.bin")).unwrap();
        let cache = RunCache::new(Arc::new(DirectoryStore::new(directory.path())));
        assert!(!cache.exists(1.0));
    }

    #[test]
    fn discarding_removes_artifact_and_tolerates_missing_ones() {
        let directory = tempfile::tempdir().unwrap();
        let cache = RunCache::new(Arc::new(DirectoryStore::new(directory.path())));
        fs::write(directory.path().join("results_1000.bin"), b"partial").unwrap();

        cache.discard(1.0);
        assert!(!cache.exists(1.0));
        cache.discard(1.0);
        assert!(!cache.exists(1.0));
    }

    #[test]
    fn memory_store_is_shared_between_clones() {
        let store = MemoryStore::new();
        let cache = RunCache::new(Arc::new(store.clone()));

        assert!(!cache.exists(10.0));
        store.insert(ArtifactKey::from_rate(10.0));
        assert!(cache.exists(10.0));
    }

    #[test]
    fn memory_store_keeps_working_after_a_panicking_writer() {
        let store = MemoryStore::new();
        let keys = store.keys.clone();
        let poisoned = std::thread::spawn(move || {
            let _guard = keys.write().unwrap();
            panic!("writer panicked while holding the lock");
        })
        .join();
        assert!(poisoned.is_err());
        assert!(store.keys.is_poisoned());

        store.insert(ArtifactKey::from_rate(1.0));
        assert!(store.contains(&ArtifactKey::from_rate(1.0)));
        store.discard(&ArtifactKey::from_rate(1.0)).unwrap();
        assert!(!store.contains(&ArtifactKey::from_rate(1.0)));
    }

    #[test]
    fn default_ladder_never_shares_an_artifact_name() {
        let ladder = RateLadder::generate(50, 10f64.powf(0.1), 1.0).unwrap();
        let names = ladder
            .rates()
            .iter()
            .map(|&rate| ArtifactKey::from_rate(rate).file_name())
            .collect::<HashSet<_>>();
        assert_eq!(names.len(), ladder.len());
    }
}
