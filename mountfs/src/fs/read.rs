use super::prelude::*;

/// Handles FUSE `lookup`: resolves `parent/name` through the `FileService`
/// directly (it already walks/caches directories on the core side), rather
/// than listing the whole parent the way the teacher's HTTP-backed
/// `lookup` has to.
pub fn lookup(fs: &mut MountFs, _req: &Request, parent: u64, name: &OsStr, reply: ReplyEntry) {
    let parent_path = match fs.inode_to_path.get(&parent) {
        Some(p) => p.clone(),
        None => {
            reply.error(ENOENT);
            return;
        }
    };
    let Some(name_str) = name.to_str() else {
        reply.error(ENOENT);
        return;
    };
    let child_path = parent_path.join(name_str);

    match fs.service.get_file(&child_path) {
        Ok(File::Directory(dir)) => {
            let ino = fs.inode_for(child_path, FileType::Directory);
            let attr = file_attr(ino, FileType::Directory, 0, dir.meta.mode, dir.meta.mtime);
            let ttl = Duration::from_secs(fs.config.cache_ttl_seconds);
            fs.attribute_cache.put(ino, attr.clone(), ttl);
            reply.entry(&TTL, &attr, 0);
        }
        Ok(File::Regular(regular)) => {
            let ino = fs.inode_for(child_path, FileType::RegularFile);
            let attr = file_attr(ino, FileType::RegularFile, regular.size, regular.meta.mode, regular.meta.mtime);
            let ttl = Duration::from_secs(fs.config.cache_ttl_seconds);
            fs.attribute_cache.put(ino, attr.clone(), ttl);
            reply.entry(&TTL, &attr, 0);
        }
        Err(_) => reply.error(ENOENT),
    }
}

/// Handles FUSE `readdir`, adding the synthetic `.`/`..` entries and then
/// one entry per child from `FileService::list_files`.
pub fn readdir(fs: &mut MountFs, _req: &Request, ino: u64, _fh: u64, offset: i64, mut reply: ReplyDirectory) {
    let dir_path = match fs.inode_to_path.get(&ino) {
        Some(p) => p.clone(),
        None => {
            reply.error(ENOENT);
            return;
        }
    };

    let mut entries_to_add: Vec<(u64, FileType, String)> = Vec::new();
    if offset == 0 {
        entries_to_add.push((ino, FileType::Directory, ".".to_string()));
        let parent_ino = if ino == ROOT_INODE {
            ROOT_INODE
        } else {
            fs.path_to_inode.get(&dir_path.dirname()).copied().unwrap_or(ROOT_INODE)
        };
        entries_to_add.push((parent_ino, FileType::Directory, "..".to_string()));
    }

    if offset < 2 {
        match fs.service.list_files(&dir_path) {
            Ok(files) => {
                for file in files {
                    let meta = file.meta();
                    let name = meta.path.basename().to_string();
                    let child_path = dir_path.join(&name);
                    let kind = match &file {
                        File::Directory(_) => FileType::Directory,
                        File::Regular(_) => FileType::RegularFile,
                    };
                    let ino = fs.inode_for(child_path, kind);
                    entries_to_add.push((ino, kind, name));
                }
            }
            Err(e) => {
                tracing::debug!(%dir_path, error = %e, "list_files failed in readdir");
                reply.ok();
                return;
            }
        }
    }

    for (i, (entry_ino, entry_kind, entry_name)) in entries_to_add.into_iter().enumerate().skip(offset as usize) {
        if reply.add(entry_ino, (i + 1) as i64, entry_kind, &entry_name) {
            break;
        }
    }
    reply.ok();
}

/// Handles FUSE `read`: fetches the whole file through the lazy
/// `DataAccessor` and slices out the requested range. Matches the
/// teacher's whole-file-then-slice strategy in `client/src/fs/read.rs`.
pub fn read(
    fs: &mut MountFs,
    _req: &Request<'_>,
    ino: u64,
    _fh: u64,
    offset: i64,
    size: u32,
    _flags: i32,
    _lock_owner: Option<u64>,
    reply: ReplyData,
) {
    let Some(path) = fs.inode_to_path.get(&ino).cloned() else {
        reply.error(ENOENT);
        return;
    };

    match fs.service.get_regular_file(&path).and_then(|f| f.content()) {
        Ok(content) => {
            let start = offset as usize;
            if start >= content.len() {
                reply.data(&[]);
                return;
            }
            let end = std::cmp::min(start + size as usize, content.len());
            reply.data(&content[start..end]);
        }
        Err(_) => reply.error(ENOENT),
    }
}

/// Handles FUSE `open`. Read-only opens need no handle. Write opens on an
/// *existing* file are refused outright (`EACCES`): the container format
/// has no in-place overwrite, so there is no way a subsequent `write` +
/// `release` on this handle could ever succeed. New files go through
/// `create` instead, which does support a single-shot write.
pub fn open(fs: &mut MountFs, _req: &Request<'_>, ino: u64, flags: i32, reply: ReplyOpen) {
    let write_access = (flags & libc::O_WRONLY != 0) || (flags & libc::O_RDWR != 0);
    if write_access {
        let path = fs.inode_to_path.get(&ino).cloned();
        tracing::debug!(?path, "refusing write-mode open of an existing file: no in-place overwrite");
        reply.error(libc::EACCES);
        return;
    }
    reply.opened(0, 0);
}
