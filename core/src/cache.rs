use std::collections::HashMap;
use std::sync::{Arc, Mutex, Weak};

use crate::file::Directory;
use crate::path::Path;

/// Advisory sizing constants carried from the original
/// (`file/cache/DirectoryCache.h`). Neither is read anywhere: the original
/// never implements eviction either, and this port keeps that behavior
/// rather than inventing an eviction policy the spec doesn't ask for.
#[allow(dead_code)]
const MAX_FOLDER_CACHE_SIZE: usize = 10_000;
#[allow(dead_code)]
const FOLDER_CACHE_TO_PURGE_RATIO: f32 = 0.1;

/// At-most-one live `Directory` node per path, for a single context.
///
/// Holds only weak references: the strong owner of a `Directory` is
/// whoever is currently using it, not the cache. A directory that nobody
/// holds onto disappears from here lazily, the next time `get` sees its
/// `Weak` fail to upgrade.
#[derive(Default)]
pub struct DirectoryCache {
    entries: Mutex<HashMap<Path, Weak<Directory>>>,
}

impl DirectoryCache {
    pub fn new() -> Self {
        DirectoryCache { entries: Mutex::new(HashMap::new()) }
    }

    pub fn get(&self, path: &Path) -> Option<Arc<Directory>> {
        let mut entries = self.entries.lock().unwrap();
        match entries.get(path).and_then(Weak::upgrade) {
            Some(dir) => Some(dir),
            None => {
                entries.remove(path);
                None
            }
        }
    }

    pub fn set(&self, path: Path, dir: &Arc<Directory>) {
        self.entries.lock().unwrap().insert(path, Arc::downgrade(dir));
    }

    pub fn clear(&self) {
        self.entries.lock().unwrap().clear();
    }

    /// Look up `path`, or build and insert a fresh directory with `build`
    /// if absent. `build` runs while the lock is held so that two threads
    /// racing on the same uncached path cannot both construct a
    /// `Directory` for it -- the lock-then-recheck pattern the original's
    /// `LocalFileService::getFile` relies on.
    pub fn get_or_insert_with(
        &self,
        path: &Path,
        build: impl FnOnce() -> crate::error::Result<Arc<Directory>>,
    ) -> crate::error::Result<Arc<Directory>> {
        let mut entries = self.entries.lock().unwrap();
        if let Some(dir) = entries.get(path).and_then(Weak::upgrade) {
            return Ok(dir);
        }
        let dir = build()?;
        entries.insert(path.clone(), Arc::downgrade(&dir));
        Ok(dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file::{FileKind, FileMeta};

    fn dummy_meta(path: Path) -> FileMeta {
        FileMeta { path, kind: FileKind::Directory, mode: 0o755, mtime: 0 }
    }

    #[test]
    fn cache_returns_none_once_last_strong_ref_is_dropped() {
        let cache = DirectoryCache::new();
        let path = Path::parse("/a");
        {
            let dir = Directory::new(dummy_meta(path.clone()), crate::accessor::LocalDirectoryAccessor::test_stub());
            cache.set(path.clone(), &dir);
            assert!(cache.get(&path).is_some());
        }
        assert!(cache.get(&path).is_none());
    }
}
