use std::fs::{File as StdFile, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path as StdPath, PathBuf};
use std::sync::Mutex;

use tar::{EntryType, Header};

use crate::error::{FileServiceError, Result};
use crate::index::{IndexEntry, RegularFileIndex};

pub const CONTAINER_VERSION: u32 = 0;

/// `files_<context>_v<version>_<order>`, without extension.
pub fn container_stem(context_name: &str, order: u64) -> String {
    format!("files_{}_v{}_{}", context_name, CONTAINER_VERSION, order)
}

/// Parses a container or index filename back into `(context_name, version, order)`.
/// Mirrors the original's `sscanf("files_%*[^_]_v%u_%lu", ...)` pattern matching.
pub fn parse_container_filename(filename: &str) -> Option<(String, u32, u64)> {
    let stem = filename.strip_suffix(".tar").or_else(|| filename.strip_suffix(".csv"))?;
    let rest = stem.strip_prefix("files_")?;
    let (context_name, rest) = rest.rsplit_once("_v")?;
    let (version, order) = rest.split_once('_')?;
    Some((context_name.to_string(), version.parse().ok()?, order.parse().ok()?))
}

/// An append-only tar container holding many small regular files, paired
/// with a CSV sidecar index for random-access reads.
///
/// Grounded on `original_source/src/local/RegularFileContainer.cpp`: each
/// write appends one ustar header + the file's bytes (padded to a 512-byte
/// boundary) to the end of the `.tar` file, then records the byte offset
/// of the header (address 0 is valid for the first member, per spec §3)
/// in the sidecar index. Reads seek straight to that header and parse one
/// tar entry from there -- no scanning the rest of the archive.
pub struct RegularFileContainer {
    tar_path: PathBuf,
    pub context_name: String,
    pub order: u64,
    file: Mutex<StdFile>,
    index: Mutex<RegularFileIndex>,
}

impl RegularFileContainer {
    pub fn create(dir: &StdPath, context_name: &str, order: u64) -> Result<Self> {
        let stem = container_stem(context_name, order);
        let tar_path = dir.join(format!("{stem}.tar"));
        let csv_path = dir.join(format!("{stem}.csv"));
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&tar_path)
            .map_err(|e| FileServiceError::io(tar_path.display().to_string(), e))?;
        let index = RegularFileIndex::open(csv_path)?;
        tracing::debug!(context_name, order, tar_path = %tar_path.display(), "container opened");
        Ok(RegularFileContainer {
            tar_path,
            context_name: context_name.to_string(),
            order,
            file: Mutex::new(file),
            index: Mutex::new(index),
        })
    }

    pub fn open(dir: &StdPath, context_name: &str, order: u64) -> Result<Self> {
        Self::create(dir, context_name, order)
    }

    pub fn tar_path(&self) -> &StdPath {
        &self.tar_path
    }

    pub fn count(&self) -> usize {
        self.index.lock().unwrap().count()
    }

    /// Appends `data` as a new tar member named `name`, reentrant-lock
    /// protected so concurrent writers targeting the same container
    /// serialize their appends. `address` (recorded into the index) is the
    /// offset of the tar **header**, matching spec §3 ("address 0 is valid
    /// for the first member") and the original's `RegularFileContainer.cpp`,
    /// which takes `position = ftell()` before `archive_write_header`.
    pub fn write_regular_file(&self, name: &str, mode: u32, mtime: i64, data: &[u8]) -> Result<IndexEntry> {
        let mut file = self.file.lock().unwrap();
        let mut header = Header::new_ustar();
        header
            .set_path(name)
            .map_err(|e| FileServiceError::io(name.to_string(), e))?;
        header.set_size(data.len() as u64);
        header.set_mode(mode);
        header.set_mtime(mtime.max(0) as u64);
        header.set_entry_type(EntryType::Regular);
        header.set_cksum();

        let header_offset = file
            .seek(SeekFrom::End(0))
            .map_err(|e| FileServiceError::io(self.tar_path.display().to_string(), e))?;
        file.write_all(header.as_bytes())
            .map_err(|e| FileServiceError::io(self.tar_path.display().to_string(), e))?;
        file.write_all(data)
            .map_err(|e| FileServiceError::io(self.tar_path.display().to_string(), e))?;
        let padding = (512 - (data.len() % 512)) % 512;
        if padding > 0 {
            file.write_all(&vec![0u8; padding])
                .map_err(|e| FileServiceError::io(self.tar_path.display().to_string(), e))?;
        }
        file.sync_data().map_err(|e| FileServiceError::io(self.tar_path.display().to_string(), e))?;
        drop(file);

        let entry = IndexEntry { offset: header_offset, size: data.len() as u64, mode, mtime, name: name.to_string() };
        self.index.lock().unwrap().add(entry.clone())?;
        tracing::debug!(name, size = data.len(), offset = header_offset, "appended regular file to container");
        Ok(entry)
    }

    /// Reads the bytes of a member by seeking to its tar **header** offset
    /// and parsing one entry from there, matching the original's
    /// `getRegularFileContent` (open read-only, seek to `address`, open a
    /// tar reader, extract up to `size` bytes). Each call opens its own
    /// read handle rather than sharing the writer's append handle, per
    /// spec §4.4's "preferred: one read handle per call" guidance.
    pub fn read_at(&self, offset: u64, size: u64) -> Result<Vec<u8>> {
        let mut file = StdFile::open(&self.tar_path)
            .map_err(|e| FileServiceError::io(self.tar_path.display().to_string(), e))?;
        file.seek(SeekFrom::Start(offset))
            .map_err(|e| FileServiceError::io(self.tar_path.display().to_string(), e))?;
        let mut archive = tar::Archive::new(file);
        let mut entries = archive
            .entries()
            .map_err(|e| FileServiceError::io(self.tar_path.display().to_string(), e))?;
        let mut entry = entries
            .next()
            .ok_or_else(|| {
                let io = std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "no tar member at the recorded address");
                FileServiceError::io(self.tar_path.display().to_string(), io)
            })?
            .map_err(|e| FileServiceError::io(self.tar_path.display().to_string(), e))?;
        let mut buf = vec![0u8; size as usize];
        entry
            .read_exact(&mut buf)
            .map_err(|e| FileServiceError::io(self.tar_path.display().to_string(), e))?;
        Ok(buf)
    }

    pub fn refresh_index(&self) -> Result<()> {
        self.index.lock().unwrap().refresh()
    }

    pub fn index_entry(&self, name: &str) -> Option<IndexEntry> {
        self.index.lock().unwrap().get(name).cloned()
    }

    pub fn list_regular_files(&self) -> Vec<IndexEntry> {
        self.index.lock().unwrap().entries().to_vec()
    }

    /// Fallback used when the sidecar index is missing or doesn't have an
    /// entry the tar file actually contains (e.g. a crash between the tar
    /// append and the CSV append): scans the tar structure itself via
    /// `tar::Archive`. Grounded on
    /// `original_source/src/local/LocalDirectoryAccessor.cpp`'s
    /// `getRegularFileFromRawContainer`.
    pub fn get_regular_file_from_raw_container(&self, name: &str) -> Result<Option<Vec<u8>>> {
        let file = StdFile::open(&self.tar_path)
            .map_err(|e| FileServiceError::io(self.tar_path.display().to_string(), e))?;
        let mut archive = tar::Archive::new(file);
        let entries = archive
            .entries()
            .map_err(|e| FileServiceError::io(self.tar_path.display().to_string(), e))?;
        for entry in entries {
            let mut entry = entry.map_err(|e| FileServiceError::io(self.tar_path.display().to_string(), e))?;
            let path = entry
                .path()
                .map_err(|e| FileServiceError::io(self.tar_path.display().to_string(), e))?
                .to_string_lossy()
                .to_string();
            if path == name {
                let mut buf = Vec::new();
                entry
                    .read_to_end(&mut buf)
                    .map_err(|e| FileServiceError::io(self.tar_path.display().to_string(), e))?;
                return Ok(Some(buf));
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_then_read_at_round_trips_content() {
        let dir = tempfile::tempdir().unwrap();
        let container = RegularFileContainer::create(dir.path(), "ctx", 1).unwrap();
        let entry = container.write_regular_file("a.txt", 0o644, 1700000000, b"hello world").unwrap();
        let content = container.read_at(entry.offset, entry.size).unwrap();
        assert_eq!(content, b"hello world");
        assert_eq!(container.count(), 1);
    }

    #[test]
    fn parses_container_filenames() {
        let (ctx, version, order) = parse_container_filename("files_alice_v0_3.tar").unwrap();
        assert_eq!(ctx, "alice");
        assert_eq!(version, 0);
        assert_eq!(order, 3);
    }

    #[test]
    fn multiple_appends_are_each_independently_addressable() {
        let dir = tempfile::tempdir().unwrap();
        let container = RegularFileContainer::create(dir.path(), "ctx", 1).unwrap();
        let e1 = container.write_regular_file("a.txt", 0o644, 1, b"first").unwrap();
        let e2 = container.write_regular_file("b.txt", 0o644, 2, b"second-file").unwrap();
        assert_eq!(container.read_at(e1.offset, e1.size).unwrap(), b"first");
        assert_eq!(container.read_at(e2.offset, e2.size).unwrap(), b"second-file");
    }
}
