//! Root of the FUSE filesystem implementation.
//!
//! Holds the `MountFs` state struct (inode maps, attribute cache, open
//! write buffers) and the `FsWrapper` dispatcher. Grounded on the teacher's
//! `client/src/fs/mod.rs` shape, but built around a synchronous
//! `Box<dyn FileService>` instead of an HTTP-only `RemoteFS` plus a Tokio
//! runtime -- every callback below calls the service directly, no
//! `block_on` needed.

use std::collections::HashMap;
use std::ffi::OsStr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use fuser::{
    FileAttr, FileType, Filesystem, ReplyAttr, ReplyCreate, ReplyData, ReplyDirectory, ReplyEmpty,
    ReplyEntry, ReplyOpen, ReplyWrite, ReplyXattr, Request,
};

use flocons_core::{FileService, Path};

use crate::config::Config;
use crate::fs::cache::AttributeCache;

pub mod cache;
pub mod prelude;
mod attr;
mod create;
mod delete;
mod read;
mod rename;
mod write;
mod xattr;

/// Default TTL handed back to the kernel for attribute/entry caching.
pub const TTL: Duration = Duration::from_secs(5);
pub const ROOT_INODE: u64 = 1;

/// In-memory write buffer for one open file handle. `release` assembles
/// this into a single byte string and issues exactly one
/// `FileService::create_regular_file` call -- the container format has no
/// in-place overwrite, so unlike the teacher's read-modify-write `release`,
/// this bridge can only ever append a file once per handle.
pub struct OpenWriteFile {
    pub(crate) path: Path,
    pub(crate) mode: u32,
    pub(crate) buffer: HashMap<i64, Vec<u8>>,
}

/// The main bridge state. One instance per mount.
pub struct MountFs {
    pub(crate) service: Box<dyn FileService>,
    pub(crate) inode_to_path: HashMap<u64, Path>,
    pub(crate) path_to_inode: HashMap<Path, u64>,
    pub(crate) inode_to_type: HashMap<u64, FileType>,
    pub(crate) next_inode: u64,
    pub(crate) attribute_cache: AttributeCache,
    pub(crate) config: Config,
    pub(crate) open_files: HashMap<u64, OpenWriteFile>,
    pub(crate) next_fh: u64,
}

impl MountFs {
    pub fn new(service: Box<dyn FileService>, config: Config) -> Self {
        let mut fs = MountFs {
            service,
            inode_to_path: HashMap::new(),
            path_to_inode: HashMap::new(),
            inode_to_type: HashMap::new(),
            next_inode: 2, // 1 is root
            attribute_cache: AttributeCache::new(&config),
            config,
            open_files: HashMap::new(),
            next_fh: 1,
        };

        fs.inode_to_path.insert(ROOT_INODE, Path::root());
        fs.path_to_inode.insert(Path::root(), ROOT_INODE);
        fs.inode_to_type.insert(ROOT_INODE, FileType::Directory);
        fs
    }

    /// Looks up or allocates an inode for `path`, recording its kind.
    pub(crate) fn inode_for(&mut self, path: Path, kind: FileType) -> u64 {
        if let Some(&ino) = self.path_to_inode.get(&path) {
            self.inode_to_type.insert(ino, kind);
            return ino;
        }
        let ino = self.next_inode;
        self.next_inode += 1;
        self.path_to_inode.insert(path.clone(), ino);
        self.inode_to_path.insert(ino, path);
        self.inode_to_type.insert(ino, kind);
        ino
    }
}

#[derive(Clone)]
pub struct FsWrapper(pub Arc<Mutex<MountFs>>);

/// Dispatcher: every FUSE kernel callback lands here and is forwarded to
/// the matching sub-module, mirroring the teacher's `impl Filesystem for
/// FsWrapper` layout in `client/src/fs/mod.rs`.
impl Filesystem for FsWrapper {
    fn getattr(&mut self, req: &Request, ino: u64, reply: ReplyAttr) {
        attr::getattr(&mut self.0.lock().unwrap(), req, ino, reply);
    }

    #[allow(clippy::too_many_arguments)]
    fn setattr(
        &mut self,
        req: &Request<'_>,
        ino: u64,
        mode: Option<u32>,
        uid: Option<u32>,
        gid: Option<u32>,
        size: Option<u64>,
        atime: Option<fuser::TimeOrNow>,
        mtime: Option<fuser::TimeOrNow>,
        ctime: Option<std::time::SystemTime>,
        fh: Option<u64>,
        crtime: Option<std::time::SystemTime>,
        chgtime: Option<std::time::SystemTime>,
        bkuptime: Option<std::time::SystemTime>,
        flags: Option<u32>,
        reply: ReplyAttr,
    ) {
        attr::setattr(
            &mut self.0.lock().unwrap(),
            req,
            ino,
            mode,
            uid,
            gid,
            size,
            atime,
            mtime,
            ctime,
            fh,
            crtime,
            chgtime,
            bkuptime,
            flags,
            reply,
        );
    }

    fn lookup(&mut self, req: &Request, parent: u64, name: &OsStr, reply: ReplyEntry) {
        read::lookup(&mut self.0.lock().unwrap(), req, parent, name, reply);
    }

    fn readdir(&mut self, req: &Request, ino: u64, fh: u64, offset: i64, reply: ReplyDirectory) {
        read::readdir(&mut self.0.lock().unwrap(), req, ino, fh, offset, reply);
    }

    #[allow(clippy::too_many_arguments)]
    fn read(
        &mut self,
        req: &Request<'_>,
        ino: u64,
        fh: u64,
        offset: i64,
        size: u32,
        flags: i32,
        lock_owner: Option<u64>,
        reply: ReplyData,
    ) {
        read::read(&mut self.0.lock().unwrap(), req, ino, fh, offset, size, flags, lock_owner, reply);
    }

    fn open(&mut self, req: &Request<'_>, ino: u64, flags: i32, reply: ReplyOpen) {
        read::open(&mut self.0.lock().unwrap(), req, ino, flags, reply);
    }

    #[allow(clippy::too_many_arguments)]
    fn write(
        &mut self,
        req: &Request<'_>,
        ino: u64,
        fh: u64,
        offset: i64,
        data: &[u8],
        write_flags: u32,
        flags: i32,
        lock_owner: Option<u64>,
        reply: ReplyWrite,
    ) {
        write::write(&mut self.0.lock().unwrap(), req, ino, fh, offset, data, write_flags, flags, lock_owner, reply);
    }

    fn release(
        &mut self,
        req: &Request<'_>,
        ino: u64,
        fh: u64,
        flags: i32,
        lock_owner: Option<u64>,
        flush: bool,
        reply: ReplyEmpty,
    ) {
        write::release(&mut self.0.lock().unwrap(), req, ino, fh, flags, lock_owner, flush, reply);
    }

    fn flush(&mut self, req: &Request<'_>, ino: u64, fh: u64, lock_owner: u64, reply: ReplyEmpty) {
        write::flush(&mut self.0.lock().unwrap(), req, ino, fh, lock_owner, reply);
    }

    fn create(
        &mut self,
        req: &Request<'_>,
        parent: u64,
        name: &OsStr,
        mode: u32,
        umask: u32,
        flags: i32,
        reply: ReplyCreate,
    ) {
        create::create(&mut self.0.lock().unwrap(), req, parent, name, mode, umask, flags, reply);
    }

    fn mkdir(&mut self, req: &Request<'_>, parent: u64, name: &OsStr, mode: u32, umask: u32, reply: ReplyEntry) {
        create::mkdir(&mut self.0.lock().unwrap(), req, parent, name, mode, umask, reply);
    }

    fn unlink(&mut self, req: &Request<'_>, parent: u64, name: &OsStr, reply: ReplyEmpty) {
        delete::unlink(&mut self.0.lock().unwrap(), req, parent, name, reply);
    }

    fn rmdir(&mut self, req: &Request<'_>, parent: u64, name: &OsStr, reply: ReplyEmpty) {
        delete::rmdir(&mut self.0.lock().unwrap(), req, parent, name, reply);
    }

    #[allow(clippy::too_many_arguments)]
    fn rename(
        &mut self,
        req: &Request<'_>,
        parent: u64,
        name: &OsStr,
        newparent: u64,
        newname: &OsStr,
        flags: u32,
        reply: ReplyEmpty,
    ) {
        rename::rename(&mut self.0.lock().unwrap(), req, parent, name, newparent, newname, flags, reply);
    }

    fn getxattr(&mut self, req: &Request, ino: u64, name: &OsStr, size: u32, reply: ReplyXattr) {
        xattr::getxattr(&mut self.0.lock().unwrap(), req, ino, name, size, reply);
    }

    fn setxattr(
        &mut self,
        req: &Request,
        ino: u64,
        name: &OsStr,
        value: &[u8],
        flags: i32,
        position: u32,
        reply: ReplyEmpty,
    ) {
        xattr::setxattr(&mut self.0.lock().unwrap(), req, ino, name, value, flags, position, reply);
    }

    fn listxattr(&mut self, req: &Request, ino: u64, size: u32, reply: ReplyXattr) {
        xattr::listxattr(&mut self.0.lock().unwrap(), req, ino, size, reply);
    }

    fn removexattr(&mut self, req: &Request, ino: u64, name: &OsStr, reply: ReplyEmpty) {
        xattr::removexattr(&mut self.0.lock().unwrap(), req, ino, name, reply);
    }
}

/// Builds a `FileAttr` from core metadata, shared by `attr`/`read`/`create`.
pub(crate) fn file_attr(ino: u64, kind: FileType, size: u64, mode: u32, mtime: i64) -> FileAttr {
    let mtime = std::time::UNIX_EPOCH + Duration::from_secs(mtime.max(0) as u64);
    FileAttr {
        ino,
        size,
        blocks: (size + 511) / 512,
        atime: mtime,
        mtime,
        ctime: mtime,
        crtime: mtime,
        kind,
        perm: mode as u16,
        nlink: if kind == FileType::Directory { 2 } else { 1 },
        uid: 501,
        gid: 20,
        rdev: 0,
        flags: 0,
        blksize: 512,
    }
}
