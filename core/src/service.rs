use std::path::PathBuf;
use std::sync::Arc;

use crate::accessor::LocalDirectoryAccessor;
use crate::context::LocalContext;
use crate::error::{FileServiceError, Result};
use crate::file::{Directory, File, FileKind, RegularFile};
use crate::path::Path;

/// Uniform interface over the directory substrate, implemented locally
/// (`LocalFileService`) and over HTTP (`http_client::HttpFileService`).
///
/// Synchronous by design (spec §5): every implementation blocks the
/// calling thread rather than returning a future, so a single trait
/// object works for both the FUSE bridge and the HTTP server edge without
/// either one needing an async runtime of its own.
pub trait FileService: Send + Sync {
    fn get_file(&self, path: &Path) -> Result<File>;
    fn get_directory(&self, path: &Path) -> Result<Arc<Directory>>;
    fn get_regular_file(&self, path: &Path) -> Result<RegularFile>;
    fn create_directory(&self, path: &Path) -> Result<Arc<Directory>>;
    fn create_regular_file(&self, path: &Path, mode: u32, data: &[u8]) -> Result<RegularFile>;
    fn list_files(&self, path: &Path) -> Result<Vec<File>>;
}

/// Type-checking helpers shared by every `FileService` implementation,
/// grounded on `original_source/src/file/FileService.cpp`'s
/// `getDirectory`/`getRegularFile` wrappers around `getFile`.
pub fn as_directory(file: File, path: &Path) -> Result<Arc<Directory>> {
    match file {
        File::Directory(d) => Ok(d),
        File::Regular(_) => Err(FileServiceError::NotADirectory { path: path.to_string() }),
    }
}

pub fn as_regular_file(file: File, path: &Path) -> Result<RegularFile> {
    match file {
        File::Regular(r) => Ok(r),
        File::Directory(_) => Err(FileServiceError::IsADirectory { path: path.to_string() }),
    }
}

/// The local, on-disk implementation. Walks from the context's root,
/// consulting the directory cache at each level before touching the
/// filesystem, exactly as `LocalFileService::getFile` does in the
/// original.
pub struct LocalFileService {
    context: Arc<LocalContext>,
}

impl LocalFileService {
    pub fn new(context_name: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        LocalFileService { context: Arc::new(LocalContext::new(context_name, root)) }
    }

    pub fn context(&self) -> &Arc<LocalContext> {
        &self.context
    }

    fn root_fs_path(&self) -> PathBuf {
        self.context.root.clone()
    }

    fn directory_at(&self, path: &Path) -> Result<Arc<Directory>> {
        if let Some(cached) = self.context.cache.get(path) {
            return Ok(cached);
        }
        self.context.cache.get_or_insert_with(path, || {
            let mut fs_path = self.root_fs_path();
            for component in path.components() {
                fs_path.push(component);
            }
            let meta = crate::file::FileMeta {
                path: path.clone(),
                kind: FileKind::Directory,
                mode: 0o755,
                mtime: 0,
            };
            let accessor = LocalDirectoryAccessor::new(fs_path, path.clone())?;
            Ok(Directory::new(meta, accessor))
        })
    }
}

impl FileService for LocalFileService {
    fn get_file(&self, path: &Path) -> Result<File> {
        if path.is_root() {
            return Ok(File::Directory(self.directory_at(path)?));
        }
        let parent = path.dirname();
        let parent_dir = self.directory_at(&parent)?;
        let accessor = parent_dir.accessor.lock().unwrap();
        match accessor.get_child_kind(path.basename())? {
            Some(FileKind::Directory) => {
                drop(accessor);
                Ok(File::Directory(self.directory_at(path)?))
            }
            Some(FileKind::Regular) => Ok(File::Regular(accessor.get_regular_file(&parent, path.basename())?)),
            None => Err(FileServiceError::NotFound { path: path.to_string() }),
        }
    }

    fn get_directory(&self, path: &Path) -> Result<Arc<Directory>> {
        as_directory(self.get_file(path)?, path)
    }

    fn get_regular_file(&self, path: &Path) -> Result<RegularFile> {
        as_regular_file(self.get_file(path)?, path)
    }

    fn create_directory(&self, path: &Path) -> Result<Arc<Directory>> {
        if path.is_root() {
            return Err(FileServiceError::AlreadyExists { path: path.to_string() });
        }
        let parent_dir = self.directory_at(&path.dirname())?;
        parent_dir.accessor.lock().unwrap().create_directory(path.basename())?;
        self.directory_at(path)
    }

    fn create_regular_file(&self, path: &Path, mode: u32, data: &[u8]) -> Result<RegularFile> {
        if path.is_root() {
            return Err(FileServiceError::InvalidPath { path: path.to_string() });
        }
        let parent = path.dirname();
        let parent_dir = self.directory_at(&parent)?;
        let accessor = parent_dir.accessor.lock().unwrap();
        accessor.create_regular_file(&self.context.name, &parent, path.basename(), mode, data)
    }

    fn list_files(&self, path: &Path) -> Result<Vec<File>> {
        let dir = self.directory_at(path)?;
        dir.accessor.lock().unwrap().list_files(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_then_read_a_regular_file_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let service = LocalFileService::new("alice", dir.path());
        let path = Path::parse("/hello.txt");
        service.create_regular_file(&path, 0o644, b"hi there").unwrap();

        let file = service.get_regular_file(&path).unwrap();
        assert_eq!(file.content().unwrap(), b"hi there");
    }

    #[test]
    fn creating_a_directory_then_a_file_inside_it_works() {
        let dir = tempfile::tempdir().unwrap();
        let service = LocalFileService::new("alice", dir.path());
        service.create_directory(&Path::parse("/sub")).unwrap();
        service
            .create_regular_file(&Path::parse("/sub/a.txt"), 0o644, b"contents")
            .unwrap();

        let listing = service.list_files(&Path::parse("/sub")).unwrap();
        assert_eq!(listing.len(), 1);
    }

    #[test]
    fn get_file_on_a_missing_regular_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let service = LocalFileService::new("alice", dir.path());
        let err = service.get_file(&Path::parse("/nope.txt")).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn creating_a_file_that_already_exists_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let service = LocalFileService::new("alice", dir.path());
        let path = Path::parse("/a.txt");
        service.create_regular_file(&path, 0o644, b"one").unwrap();
        let err = service.create_regular_file(&path, 0o644, b"two").unwrap_err();
        assert!(matches!(err, FileServiceError::AlreadyExists { .. }));
    }

    #[test]
    fn two_contexts_can_each_write_their_own_container_in_the_same_directory() {
        let dir = tempfile::tempdir().unwrap();
        let alice = LocalFileService::new("alice", dir.path());
        let bob = LocalFileService::new("bob", dir.path());

        alice.create_regular_file(&Path::parse("/a.txt"), 0o644, b"from alice").unwrap();
        bob.create_regular_file(&Path::parse("/b.txt"), 0o644, b"from bob").unwrap();

        // bob can read alice's file: containers are visible to every peer,
        // only writes are restricted to one's own context.
        assert_eq!(bob.get_regular_file(&Path::parse("/a.txt")).unwrap().content().unwrap(), b"from alice");
        assert_eq!(alice.get_regular_file(&Path::parse("/b.txt")).unwrap().content().unwrap(), b"from bob");
    }
}
