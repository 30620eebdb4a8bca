use super::prelude::*;

/// Buffers a write into the handle's in-memory map, keyed by offset.
/// Nothing touches the backing store until `release`.
#[allow(clippy::too_many_arguments)]
pub fn write(
    fs: &mut MountFs,
    _req: &Request<'_>,
    _ino: u64,
    fh: u64,
    offset: i64,
    data: &[u8],
    _write_flags: u32,
    _flags: i32,
    _lock_owner: Option<u64>,
    reply: ReplyWrite,
) {
    match fs.open_files.get_mut(&fh) {
        Some(open_file) => {
            open_file.buffer.insert(offset, data.to_vec());
            reply.written(data.len() as u32);
        }
        None => reply.error(EBADF),
    }
}

/// Assembles the handle's buffered writes into one byte string and issues
/// exactly one `FileService::create_regular_file` call. This is the one
/// place a file this bridge created actually reaches the backing store --
/// unlike the teacher's `release`, there is no prior "create empty file"
/// call to reconcile against, so there is no read-modify-write here, just
/// a single append.
pub fn release(
    fs: &mut MountFs,
    _req: &Request<'_>,
    ino: u64,
    fh: u64,
    _flags: i32,
    _lock_owner: Option<u64>,
    _flush: bool,
    reply: ReplyEmpty,
) {
    let Some(open_file) = fs.open_files.remove(&fh) else {
        reply.ok();
        return;
    };

    let mut bytes = Vec::new();
    let mut offsets: Vec<i64> = open_file.buffer.keys().copied().collect();
    offsets.sort_unstable();
    for offset in offsets {
        let chunk = &open_file.buffer[&offset];
        let start = offset as usize;
        let end = start + chunk.len();
        if end > bytes.len() {
            bytes.resize(end, 0);
        }
        bytes[start..end].copy_from_slice(chunk);
    }

    match fs.service.create_regular_file(&open_file.path, open_file.mode, &bytes) {
        Ok(regular) => {
            let ttl = Duration::from_secs(fs.config.cache_ttl_seconds);
            let attr = file_attr(ino, FileType::RegularFile, regular.size, regular.meta.mode, regular.meta.mtime);
            fs.attribute_cache.put(ino, attr, ttl);
            reply.ok();
        }
        Err(e) => {
            tracing::warn!(path = %open_file.path, error = %e, "create_regular_file failed in release");
            fs.attribute_cache.remove(&ino);
            reply.error(EIO);
        }
    }
}

pub fn flush(_fs: &mut MountFs, _req: &Request<'_>, _ino: u64, _fh: u64, _lock_owner: u64, reply: ReplyEmpty) {
    reply.ok();
}
