use super::prelude::*;

/// Resolves an inode to its current attributes, consulting the cache
/// first. On a miss, looks up the inode's path and asks the `FileService`
/// directly -- no network round trip bookkeeping is needed here since the
/// service call already blocks until it has an answer.
pub fn fetch_and_cache_attributes(fs: &mut MountFs, ino: u64) -> Option<FileAttr> {
    if let Some(attr) = fs.attribute_cache.get(&ino) {
        return Some(attr);
    }

    let path = fs.inode_to_path.get(&ino)?.clone();
    let file = fs.service.get_file(&path).ok()?;
    let attr = match file {
        File::Directory(dir) => file_attr(ino, FileType::Directory, 0, dir.meta.mode, dir.meta.mtime),
        File::Regular(regular) => {
            file_attr(ino, FileType::RegularFile, regular.size, regular.meta.mode, regular.meta.mtime)
        }
    };

    let ttl = Duration::from_secs(fs.config.cache_ttl_seconds);
    fs.attribute_cache.put(ino, attr.clone(), ttl);
    Some(attr)
}

pub fn getattr(fs: &mut MountFs, _req: &Request, ino: u64, reply: ReplyAttr) {
    match fetch_and_cache_attributes(fs, ino) {
        Some(attr) => reply.attr(&TTL, &attr),
        None => reply.error(ENOENT),
    }
}

/// `chmod` and truncate-via-`setattr` both need an in-place overwrite the
/// append-only container model can't do, so they return `ENOSYS` rather
/// than faking success. Calls that only touch ignored fields (atime/mtime
/// bumps from a plain `touch`, for instance) succeed and just return the
/// current attributes unchanged.
#[allow(clippy::too_many_arguments)]
pub fn setattr(
    fs: &mut MountFs,
    _req: &Request<'_>,
    ino: u64,
    mode: Option<u32>,
    _uid: Option<u32>,
    _gid: Option<u32>,
    size: Option<u64>,
    _atime: Option<TimeOrNow>,
    _mtime: Option<TimeOrNow>,
    _ctime: Option<SystemTime>,
    _fh: Option<u64>,
    _crtime: Option<SystemTime>,
    _chgtime: Option<SystemTime>,
    _bkuptime: Option<SystemTime>,
    _flags: Option<u32>,
    reply: ReplyAttr,
) {
    if mode.is_some() || size.is_some() {
        tracing::debug!(ino, "setattr chmod/truncate unsupported: no in-place overwrite on an append-only container");
        reply.error(ENOSYS);
        return;
    }

    match fetch_and_cache_attributes(fs, ino) {
        Some(attr) => reply.attr(&TTL, &attr),
        None => reply.error(ENOENT),
    }
}
