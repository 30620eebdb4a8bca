use super::prelude::*;

/// Handles FUSE `create` (`open(..., O_CREAT)`). Unlike the teacher, this
/// does **not** touch the backing store yet -- eagerly `PUT`ing an empty
/// file and later overwriting it in `release` is exactly the
/// read-modify-write pattern the append-only container can't support. The
/// new inode and its write buffer are registered locally; the single
/// `FileService::create_regular_file` call happens once, in `release`.
pub fn create(
    fs: &mut MountFs,
    req: &Request<'_>,
    parent: u64,
    name: &OsStr,
    mode: u32,
    _umask: u32,
    _flags: i32,
    reply: ReplyCreate,
) {
    let parent_path = match fs.inode_to_path.get(&parent) {
        Some(p) => p.clone(),
        None => {
            reply.error(ENOENT);
            return;
        }
    };
    let Some(filename) = name.to_str() else {
        reply.error(ENOENT);
        return;
    };
    let full_path = parent_path.join(filename);

    let inode = fs.inode_for(full_path.clone(), FileType::RegularFile);
    let fh = fs.next_fh;
    fs.next_fh += 1;
    fs.open_files.insert(fh, OpenWriteFile { path: full_path, mode, buffer: HashMap::new() });

    let ts = SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_secs() as i64).unwrap_or(0);
    let mut attr = file_attr(inode, FileType::RegularFile, 0, mode, ts);
    attr.uid = req.uid();
    attr.gid = req.gid();

    let ttl = Duration::from_secs(fs.config.cache_ttl_seconds);
    fs.attribute_cache.put(inode, attr.clone(), ttl);
    fs.attribute_cache.remove(&parent);

    reply.created(&TTL, &attr, 0, fh, 0);
}

/// Handles FUSE `mkdir`. Directory creation has no overwrite concerns, so
/// this calls straight through to `FileService::create_directory`.
pub fn mkdir(fs: &mut MountFs, req: &Request<'_>, parent: u64, name: &OsStr, mode: u32, _umask: u32, reply: ReplyEntry) {
    let parent_path = match fs.inode_to_path.get(&parent) {
        Some(p) => p.clone(),
        None => {
            reply.error(ENOENT);
            return;
        }
    };
    let Some(dirname) = name.to_str() else {
        reply.error(ENOENT);
        return;
    };
    let full_path = parent_path.join(dirname);

    if let Err(e) = fs.service.create_directory(&full_path) {
        tracing::debug!(%full_path, error = %e, "mkdir failed");
        reply.error(EIO);
        return;
    }

    let inode = fs.inode_for(full_path, FileType::Directory);
    let ts = SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_secs() as i64).unwrap_or(0);
    let mut attr = file_attr(inode, FileType::Directory, 0, mode, ts);
    attr.uid = req.uid();
    attr.gid = req.gid();

    let ttl = Duration::from_secs(fs.config.cache_ttl_seconds);
    fs.attribute_cache.put(inode, attr.clone(), ttl);
    fs.attribute_cache.remove(&parent);

    reply.entry(&TTL, &attr, 0);
}
