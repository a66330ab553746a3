//! In-process cache for loaded artifacts.
//!
//! Entries are keyed by path and remember the file's modification time; an
//! entry is reused only while that time is unchanged and it is younger than
//! the TTL. Loading itself stays in [`crate::artifact`].

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant, SystemTime};

use hdbresale_core::GeocodedRecord;
use tracing::debug;

use crate::{StoreError, artifact};

struct Entry<T> {
    modified: SystemTime,
    loaded_at: Instant,
    value: Arc<T>,
}

pub struct ArtifactCache<T> {
    ttl: Duration,
    entries: Mutex<HashMap<PathBuf, Entry<T>>>,
}

impl<T> ArtifactCache<T> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Return the cached value for `path`, or load it with `load` when the
    /// entry is missing, stale, or the file changed on disk.
    pub fn get_or_load_with<F>(&self, path: &Path, load: F) -> Result<Arc<T>, StoreError>
    where
        F: FnOnce(&Path) -> Result<T, StoreError>,
    {
        let modified = std::fs::metadata(path)?.modified()?;

        {
            let entries = self.lock()?;
            if let Some(entry) = entries.get(path)
                && entry.modified == modified
                && entry.loaded_at.elapsed() < self.ttl
            {
                debug!(path = %path.display(), "artifact cache hit");
                return Ok(Arc::clone(&entry.value));
            }
        }

        debug!(path = %path.display(), "artifact cache miss");
        let value = Arc::new(load(path)?);
        self.lock()?.insert(
            path.to_path_buf(),
            Entry {
                modified,
                loaded_at: Instant::now(),
                value: Arc::clone(&value),
            },
        );
        Ok(value)
    }

    /// Drop every entry.
    pub fn clear(&self) -> Result<(), StoreError> {
        self.lock()?.clear();
        Ok(())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<PathBuf, Entry<T>>>, StoreError> {
        self.entries
            .lock()
            .map_err(|e| StoreError::Other(format!("mutex poisoned: {e}")))
    }
}

impl ArtifactCache<Vec<GeocodedRecord>> {
    /// Load records through [`artifact::read_records`].
    pub fn get_or_load(&self, path: &Path) -> Result<Arc<Vec<GeocodedRecord>>, StoreError> {
        self.get_or_load_with(path, artifact::read_records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use tempfile::TempDir;

    fn counting_loader<'a>(
        calls: &'a Cell<usize>,
    ) -> impl Fn(&Path) -> Result<String, StoreError> + 'a {
        move |path| {
            calls.set(calls.get() + 1);
            Ok(std::fs::read_to_string(path)?)
        }
    }

    #[test]
    fn second_load_hits_cache() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("a.txt");
        std::fs::write(&path, "one").unwrap();

        let cache = ArtifactCache::new(Duration::from_secs(300));
        let calls = Cell::new(0);
        let load = counting_loader(&calls);
        let a = cache.get_or_load_with(&path, &load).unwrap();
        let b = cache.get_or_load_with(&path, &load).unwrap();
        assert_eq!(calls.get(), 1);
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn modified_file_reloads() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("a.txt");
        std::fs::write(&path, "one").unwrap();

        let cache = ArtifactCache::new(Duration::from_secs(300));
        let calls = Cell::new(0);
        let load = counting_loader(&calls);
        cache.get_or_load_with(&path, &load).unwrap();

        std::fs::write(&path, "two").unwrap();
        let file = std::fs::File::options().write(true).open(&path).unwrap();
        file.set_modified(SystemTime::now() + Duration::from_secs(60))
            .unwrap();

        let value = cache.get_or_load_with(&path, &load).unwrap();
        assert_eq!(calls.get(), 2);
        assert_eq!(value.as_str(), "two");
    }

    #[test]
    fn zero_ttl_always_reloads() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("a.txt");
        std::fs::write(&path, "one").unwrap();

        let cache = ArtifactCache::new(Duration::ZERO);
        let calls = Cell::new(0);
        let load = counting_loader(&calls);
        cache.get_or_load_with(&path, &load).unwrap();
        cache.get_or_load_with(&path, &load).unwrap();
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn clear_forces_reload() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("a.txt");
        std::fs::write(&path, "one").unwrap();

        let cache = ArtifactCache::new(Duration::from_secs(300));
        let calls = Cell::new(0);
        let load = counting_loader(&calls);
        cache.get_or_load_with(&path, &load).unwrap();
        cache.clear().unwrap();
        cache.get_or_load_with(&path, &load).unwrap();
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn missing_file_errors() {
        let cache: ArtifactCache<Vec<GeocodedRecord>> = ArtifactCache::new(Duration::from_secs(1));
        assert!(matches!(
            cache.get_or_load(Path::new("/nonexistent/a.parquet")),
            Err(StoreError::Io(_))
        ));
    }
}
