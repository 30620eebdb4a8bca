use std::sync::{Arc, Mutex};

use crate::accessor::DirectoryAccessor;
use crate::error::Result;
use crate::mime;
use crate::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Regular,
    Directory,
}

/// Common metadata shared by regular files and directories.
#[derive(Debug, Clone)]
pub struct FileMeta {
    pub path: Path,
    pub kind: FileKind,
    pub mode: u32,
    pub mtime: i64,
}

impl FileMeta {
    pub fn mime_type(&self) -> &'static str {
        match self.kind {
            FileKind::Directory => mime::DIRECTORY_MIME_TYPE,
            FileKind::Regular => mime::mime_type_for_extension(self.path.extension()),
        }
    }
}

/// A lazily-evaluated accessor for a regular file's bytes: capturing the
/// owning container, address, and size instead of eagerly reading, so
/// listing a directory never touches file content.
///
/// The accessor closure only needs `&self` because `RegularFileContainer`
/// serializes its own reads internally.
pub type DataAccessor = Arc<dyn Fn() -> Result<Vec<u8>> + Send + Sync>;

pub struct RegularFile {
    pub meta: FileMeta,
    pub size: u64,
    pub address: u64,
    data: DataAccessor,
}

impl RegularFile {
    pub fn new(meta: FileMeta, size: u64, address: u64, data: DataAccessor) -> Self {
        RegularFile { meta, size, address, data }
    }

    /// Reads the whole file content through the lazy accessor. Matches the
    /// original's `RegularFile::data()` behavior of reading on demand.
    pub fn content(&self) -> Result<Vec<u8>> {
        (self.data)()
    }
}

impl std::fmt::Debug for RegularFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegularFile")
            .field("meta", &self.meta)
            .field("size", &self.size)
            .field("address", &self.address)
            .finish()
    }
}

/// In-memory variant used at the HTTP client boundary, where bytes have
/// already crossed the wire and a lazy container-backed accessor makes no
/// sense.
pub struct InMemoryRegularFile {
    pub meta: FileMeta,
    pub data: Vec<u8>,
}

pub enum File {
    Regular(RegularFile),
    Directory(Arc<Directory>),
}

impl File {
    pub fn meta(&self) -> &FileMeta {
        match self {
            File::Regular(r) => &r.meta,
            File::Directory(d) => &d.meta,
        }
    }
}

/// A directory node. Holds the accessor used to list/create children,
/// behind a trait object so the same type serves both the local,
/// filesystem-backed tree (`LocalDirectoryAccessor`) and the HTTP client's
/// remote-proxying one (`http_client::RemoteDirectoryAccessor`).
///
/// The accessor holds no reference back to its owning context or cache,
/// so there's no `Directory -> accessor -> context -> cache -> Directory`
/// cycle to break: the cache (`cache::DirectoryCache`) only ever stores a
/// `Weak<Directory>`, and a `Directory` that nothing else is holding is
/// simply dropped.
pub struct Directory {
    pub meta: FileMeta,
    pub(crate) accessor: Mutex<Box<dyn DirectoryAccessor>>,
}

impl Directory {
    pub fn new(meta: FileMeta, accessor: impl DirectoryAccessor + 'static) -> Arc<Self> {
        Arc::new(Directory { meta, accessor: Mutex::new(Box::new(accessor)) })
    }

    pub fn path(&self) -> &Path {
        &self.meta.path
    }
}
