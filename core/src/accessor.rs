use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::container::{self, RegularFileContainer};
use crate::error::{FileServiceError, Result};
use crate::file::{DataAccessor, File, FileKind, FileMeta, RegularFile};
use crate::index::IndexEntry;
use crate::path::Path;

fn now_unix() -> i64 {
    SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_secs() as i64).unwrap_or(0)
}

/// What a directory node needs in order to list and create its children.
/// Implemented by `LocalDirectoryAccessor` (filesystem + tar containers)
/// and by `http_client::RemoteDirectoryAccessor` (HTTP proxying), so
/// `file::Directory` can hold either behind one trait object.
pub trait DirectoryAccessor: Send + Sync {
    fn get_child_kind(&self, name: &str) -> Result<Option<FileKind>>;
    fn get_regular_file(&self, logical_path: &Path, name: &str) -> Result<RegularFile>;
    fn create_directory(&self, name: &str) -> Result<()>;
    fn create_regular_file(
        &self,
        writer: &str,
        logical_path: &Path,
        name: &str,
        mode: u32,
        data: &[u8],
    ) -> Result<RegularFile>;
    fn list_files(&self, logical_path: &Path) -> Result<Vec<File>>;
}

/// Lists and creates the children of one directory on disk: subdirectories
/// map 1:1 to filesystem directories, regular files live packed inside
/// this directory's `RegularFileContainer`s.
///
/// Grounded on `original_source/src/local/LocalDirectoryAccessor.cpp`.
pub struct LocalDirectoryAccessor {
    dir_path: PathBuf,
    logical_path: Path,
    containers: Mutex<HashMap<(String, u64), Arc<RegularFileContainer>>>,
}

impl LocalDirectoryAccessor {
    pub fn new(dir_path: PathBuf, logical_path: Path) -> Result<Self> {
        let accessor = LocalDirectoryAccessor { dir_path, logical_path, containers: Mutex::new(HashMap::new()) };
        accessor.refresh_file_containers()?;
        Ok(accessor)
    }

    #[cfg(test)]
    pub fn test_stub() -> Self {
        LocalDirectoryAccessor {
            dir_path: PathBuf::from("/dev/null/unused"),
            logical_path: Path::root(),
            containers: Mutex::new(HashMap::new()),
        }
    }

    pub fn logical_path(&self) -> &Path {
        &self.logical_path
    }

    /// Scans this directory's entries for `files_<ctx>_v<ver>_<order>.tar`
    /// files and opens any container not already loaded. Matches the
    /// original's `_refresh_file_containers` readdir + pattern-match loop.
    pub fn refresh_file_containers(&self) -> Result<()> {
        let read_dir = match std::fs::read_dir(&self.dir_path) {
            Ok(rd) => rd,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(FileServiceError::NotFound { path: self.logical_path.to_string() })
            }
            Err(e) => return Err(FileServiceError::io(self.dir_path.display().to_string(), e)),
        };

        let mut containers = self.containers.lock().unwrap();
        for entry in read_dir {
            let entry = entry.map_err(|e| FileServiceError::io(self.dir_path.display().to_string(), e))?;
            let filename = entry.file_name();
            let filename = filename.to_string_lossy();
            if let Some((ctx_name, _version, order)) = container::parse_container_filename(&filename) {
                let key = (ctx_name.clone(), order);
                if !containers.contains_key(&key) {
                    tracing::debug!(
                        dir = %self.dir_path.display(),
                        context = %ctx_name,
                        order,
                        "discovered container"
                    );
                    let opened = RegularFileContainer::open(&self.dir_path, &ctx_name, order)?;
                    containers.insert(key, Arc::new(opened));
                }
            }
        }
        Ok(())
    }

    fn container_list(&self) -> Vec<Arc<RegularFileContainer>> {
        self.containers.lock().unwrap().values().cloned().collect()
    }

    fn fs_path_for_child(&self, name: &str) -> PathBuf {
        self.dir_path.join(name)
    }

    /// Looks up a direct child by name. A subdirectory is checked on disk
    /// first; if that's not a directory, every known container is
    /// searched for a matching member, swallowing per-container read
    /// errors so one corrupt container doesn't hide files in another
    /// (mirrors the original's try/catch-and-continue loop). If nothing
    /// is found among the containers already loaded, containers are
    /// refreshed once and only the newly discovered ones are searched --
    /// avoids re-scanning containers that have already proven they don't
    /// have this file.
    fn get_child_kind_impl(&self, name: &str) -> Result<Option<FileKind>> {
        let fs_path = self.fs_path_for_child(name);
        match std::fs::metadata(&fs_path) {
            Ok(meta) if meta.is_dir() => return Ok(Some(FileKind::Directory)),
            Ok(_) => {}
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => {
                return Err(FileServiceError::io(fs_path.display().to_string(), e))
            }
            Err(_) => {}
        }

        let known_before: Vec<_> = self.containers.lock().unwrap().keys().cloned().collect();
        if self.find_in_containers(name, &self.container_list())?.is_some() {
            return Ok(Some(FileKind::Regular));
        }

        self.refresh_file_containers()?;
        let new_containers: Vec<_> = self
            .containers
            .lock()
            .unwrap()
            .iter()
            .filter(|(k, _)| !known_before.contains(k))
            .map(|(_, v)| v.clone())
            .collect();
        if self.find_in_containers(name, &new_containers)?.is_some() {
            return Ok(Some(FileKind::Regular));
        }
        Ok(None)
    }

    fn find_in_containers(
        &self,
        name: &str,
        containers: &[Arc<RegularFileContainer>],
    ) -> Result<Option<(Arc<RegularFileContainer>, IndexEntry)>> {
        for container in containers {
            if let Err(e) = container.refresh_index() {
                tracing::warn!(
                    context = %container.context_name,
                    order = container.order,
                    error = %e,
                    "skipping container with unreadable index"
                );
                continue;
            }
            if let Some(entry) = container.index_entry(name) {
                return Ok(Some((container.clone(), entry)));
            }
        }
        Ok(None)
    }

    fn get_regular_file_impl(&self, logical_path: &Path, name: &str) -> Result<RegularFile> {
        let known_before: Vec<_> = self.containers.lock().unwrap().keys().cloned().collect();
        if let Some((container, entry)) = self.find_in_containers(name, &self.container_list())? {
            return Ok(Self::file_from_entry(logical_path, container, entry));
        }
        self.refresh_file_containers()?;
        let new_containers: Vec<_> = self
            .containers
            .lock()
            .unwrap()
            .iter()
            .filter(|(k, _)| !known_before.contains(k))
            .map(|(_, v)| v.clone())
            .collect();
        if let Some((container, entry)) = self.find_in_containers(name, &new_containers)? {
            return Ok(Self::file_from_entry(logical_path, container, entry));
        }
        Err(FileServiceError::NotFound { path: logical_path.join(name).to_string() })
    }

    fn file_from_entry(logical_path: &Path, container: Arc<RegularFileContainer>, entry: IndexEntry) -> RegularFile {
        let meta = FileMeta {
            path: logical_path.join(&entry.name),
            kind: FileKind::Regular,
            mode: entry.mode,
            mtime: entry.mtime,
        };
        let offset = entry.offset;
        let size = entry.size;
        let accessor: DataAccessor = Arc::new(move || container.read_at(offset, size));
        RegularFile::new(meta, entry.size, entry.offset, accessor)
    }

    fn create_directory_impl(&self, name: &str) -> Result<PathBuf> {
        let fs_path = self.fs_path_for_child(name);
        if fs_path.exists() {
            return Err(FileServiceError::AlreadyExists { path: self.logical_path.join(name).to_string() });
        }
        std::fs::create_dir(&fs_path).map_err(|e| FileServiceError::io(fs_path.display().to_string(), e))?;
        Ok(fs_path)
    }

    /// Creates a new regular file, appending into `writer`'s
    /// highest-order local container or starting a fresh one (`order = 1 +
    /// max(local order)`) if none exist yet. Grounded on the original's
    /// `_new_writable_file_container` selection rule.
    fn create_regular_file_impl(
        &self,
        writer: &str,
        logical_path: &Path,
        name: &str,
        mode: u32,
        data: &[u8],
    ) -> Result<RegularFile> {
        if self.get_child_kind_impl(name)?.is_some() {
            return Err(FileServiceError::AlreadyExists { path: logical_path.join(name).to_string() });
        }

        let container = self.writable_container(writer)?;
        let entry = container.write_regular_file(name, mode, now_unix(), data)?;
        Ok(Self::file_from_entry(logical_path, container, entry))
    }

    fn writable_container(&self, writer: &str) -> Result<Arc<RegularFileContainer>> {
        let mut containers = self.containers.lock().unwrap();
        let max_local_order =
            containers.keys().filter(|(ctx, _)| ctx == writer).map(|(_, order)| *order).max();

        if let Some(order) = max_local_order {
            return Ok(containers.get(&(writer.to_string(), order)).unwrap().clone());
        }

        let order = 1;
        let created = RegularFileContainer::create(&self.dir_path, writer, order)?;
        let created = Arc::new(created);
        containers.insert((writer.to_string(), order), created.clone());
        Ok(created)
    }

    /// Lists every direct child: subdirectories from `readdir`, regular
    /// files flattened out of every known container's index.
    fn list_files_impl(&self, logical_path: &Path) -> Result<Vec<File>> {
        self.refresh_file_containers()?;
        let mut out = Vec::new();

        for entry in std::fs::read_dir(&self.dir_path)
            .map_err(|e| FileServiceError::io(self.dir_path.display().to_string(), e))?
        {
            let entry = entry.map_err(|e| FileServiceError::io(self.dir_path.display().to_string(), e))?;
            let file_type = entry.file_type().map_err(|e| FileServiceError::io(self.dir_path.display().to_string(), e))?;
            if !file_type.is_dir() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().to_string();
            let meta = FileMeta { path: logical_path.join(&name), kind: FileKind::Directory, mode: 0o755, mtime: now_unix() };
            out.push(File::Directory(crate::file::Directory::new(
                meta,
                LocalDirectoryAccessor::new(self.fs_path_for_child(&name), logical_path.join(&name))?,
            )));
        }

        for container in self.container_list() {
            container.refresh_index().ok();
            for entry in container.list_regular_files() {
                let meta = FileMeta {
                    path: logical_path.join(&entry.name),
                    kind: FileKind::Regular,
                    mode: entry.mode,
                    mtime: entry.mtime,
                };
                let container = container.clone();
                let (offset, size) = (entry.offset, entry.size);
                let accessor: DataAccessor = Arc::new(move || container.read_at(offset, size));
                out.push(File::Regular(RegularFile::new(meta, entry.size, entry.offset, accessor)));
            }
        }
        Ok(out)
    }
}

impl DirectoryAccessor for LocalDirectoryAccessor {
    fn get_child_kind(&self, name: &str) -> Result<Option<FileKind>> {
        self.get_child_kind_impl(name)
    }

    fn get_regular_file(&self, logical_path: &Path, name: &str) -> Result<RegularFile> {
        self.get_regular_file_impl(logical_path, name)
    }

    fn create_directory(&self, name: &str) -> Result<()> {
        self.create_directory_impl(name).map(|_| ())
    }

    fn create_regular_file(
        &self,
        writer: &str,
        logical_path: &Path,
        name: &str,
        mode: u32,
        data: &[u8],
    ) -> Result<RegularFile> {
        self.create_regular_file_impl(writer, logical_path, name, mode, data)
    }

    fn list_files(&self, logical_path: &Path) -> Result<Vec<File>> {
        self.list_files_impl(logical_path)
    }
}
