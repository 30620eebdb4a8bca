use std::fs::{File as StdFile, OpenOptions};
use std::io::{BufRead, BufReader, Seek, SeekFrom, Write};
use std::path::{Path as StdPath, PathBuf};

use crate::error::{FileServiceError, Result};

/// One record in a `RegularFileIndex`: the byte range of a member inside
/// its container, plus the metadata needed to answer `getFile` without
/// re-reading the container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexEntry {
    pub offset: u64,
    pub size: u64,
    pub mode: u32,
    pub mtime: i64,
    pub name: String,
}

impl IndexEntry {
    /// Formats one CSV line, matching the original's
    /// `sprintf("%lu;%lu;%o;%ld;%s\n", ...)`.
    fn to_line(&self) -> String {
        format!("{};{};{:o};{};{}\n", self.offset, self.size, self.mode, self.mtime, self.name)
    }

    /// Parses one CSV line. Returns `None` if the line doesn't have all
    /// five fields -- the original's `sscanf` returning fewer than 5
    /// matches, which happens on a partially-written trailing line after a
    /// crash.
    fn parse_line(line: &str) -> Option<IndexEntry> {
        let mut parts = line.splitn(5, ';');
        let offset: u64 = parts.next()?.parse().ok()?;
        let size: u64 = parts.next()?.parse().ok()?;
        let mode = u32::from_str_radix(parts.next()?, 8).ok()?;
        let mtime: i64 = parts.next()?.parse().ok()?;
        let name = parts.next()?.trim_end_matches(['\n', '\r']).to_string();
        if name.is_empty() {
            return None;
        }
        Some(IndexEntry { offset, size, mode, mtime, name })
    }
}

/// The CSV sidecar index for one `RegularFileContainer`.
///
/// Append-only: `add` appends a line and fsyncs. `refresh` re-reads any
/// bytes written since the last refresh (by another process or thread),
/// tolerating a final line that was cut short by a crash -- that partial
/// line is left unconsumed, its byte offset is not advanced past it, and a
/// subsequent `add` will overwrite it from that position onward the next
/// time the writer for this container appends.
pub struct RegularFileIndex {
    path: PathBuf,
    entries: Vec<IndexEntry>,
    /// Byte offset in the CSV file up to which `entries` is known-valid.
    read_position: u64,
}

impl RegularFileIndex {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let mut index = RegularFileIndex { path, entries: Vec::new(), read_position: 0 };
        index.refresh()?;
        Ok(index)
    }

    pub fn path(&self) -> &StdPath {
        &self.path
    }

    pub fn count(&self) -> usize {
        self.entries.len()
    }

    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    pub fn get(&self, name: &str) -> Option<&IndexEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    /// Re-reads new lines appended since the last call. A missing CSV file
    /// is treated as an empty index, matching the original's tolerance of
    /// a container directory entry whose sidecar hasn't been created yet.
    pub fn refresh(&mut self) -> Result<()> {
        let file = match StdFile::open(&self.path) {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(FileServiceError::io(self.path.display().to_string(), e)),
        };

        let len = file
            .metadata()
            .map_err(|e| FileServiceError::io(self.path.display().to_string(), e))?
            .len();
        if len <= self.read_position {
            return Ok(());
        }

        let mut reader = BufReader::new(file);
        reader
            .seek(SeekFrom::Start(self.read_position))
            .map_err(|e| FileServiceError::io(self.path.display().to_string(), e))?;

        let mut loaded = 0;
        loop {
            let mut line = String::new();
            let before = self.read_position;
            let bytes_read = reader
                .read_line(&mut line)
                .map_err(|e| FileServiceError::io(self.path.display().to_string(), e))?;
            if bytes_read == 0 {
                break;
            }
            if !line.ends_with('\n') {
                // Partial trailing line (crash mid-write): stop here,
                // don't advance read_position past `before`, and don't
                // record the entry.
                break;
            }
            match IndexEntry::parse_line(&line) {
                Some(entry) => {
                    self.entries.push(entry);
                    self.read_position = before + bytes_read as u64;
                    loaded += 1;
                }
                None => break,
            }
        }
        tracing::debug!(path = %self.path.display(), loaded, total = self.entries.len(), "refreshed index");
        Ok(())
    }

    /// Appends one entry to the sidecar and fsyncs before returning, so a
    /// reader that opens the file afterward is guaranteed to see it (or
    /// nothing, never a torn write visible as complete).
    pub fn add(&mut self, entry: IndexEntry) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| FileServiceError::io(self.path.display().to_string(), e))?;
        let line = entry.to_line();
        file.write_all(line.as_bytes())
            .map_err(|e| FileServiceError::io(self.path.display().to_string(), e))?;
        file.sync_data().map_err(|e| FileServiceError::io(self.path.display().to_string(), e))?;
        self.read_position += line.len() as u64;
        self.entries.push(entry);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    #[test]
    fn round_trips_entries_through_add_and_a_fresh_open() {
        let dir = tempfile::tempdir().unwrap();
        let csv = dir.path().join("files_ctx_v0_1.csv");
        let mut index = RegularFileIndex::open(&csv).unwrap();
        index
            .add(IndexEntry { offset: 0, size: 5, mode: 0o644, mtime: 1700000000, name: "a.txt".into() })
            .unwrap();
        index
            .add(IndexEntry { offset: 512, size: 9, mode: 0o644, mtime: 1700000001, name: "b.bin".into() })
            .unwrap();

        let reopened = RegularFileIndex::open(&csv).unwrap();
        assert_eq!(reopened.count(), 2);
        assert_eq!(reopened.get("b.bin").unwrap().offset, 512);
    }

    #[test]
    fn tolerates_a_truncated_trailing_line() {
        let dir = tempfile::tempdir().unwrap();
        let csv = dir.path().join("files_ctx_v0_1.csv");
        {
            let mut f = StdFile::create(&csv).unwrap();
            writeln!(f, "0;5;644;1700000000;a.txt").unwrap();
            write!(f, "5;9;644;1700000001;b.b").unwrap(); // no trailing newline
        }
        let index = RegularFileIndex::open(&csv).unwrap();
        assert_eq!(index.count(), 1);
        assert!(index.get("a.txt").is_some());
        assert!(index.get("b.b").is_none());
    }
}
