//! Shared imports for the `fs` sub-modules, adapted from the teacher's
//! `client/src/fs/prelude.rs`. Drops the HTTP `api_client` re-exports in
//! favor of `flocons_core`'s `FileService` surface.

pub use fuser::{
    FileAttr, FileType, ReplyAttr, ReplyCreate, ReplyData, ReplyDirectory, ReplyEmpty, ReplyEntry,
    ReplyOpen, ReplyWrite, ReplyXattr, Request, TimeOrNow,
};

pub use libc::{EBADF, EIO, ENOENT, ENOSYS};
#[cfg(target_os = "macos")]
pub use libc::ENOATTR;
#[cfg(not(target_os = "macos"))]
pub use libc::ENODATA;

pub use std::collections::HashMap;
pub use std::ffi::OsStr;
pub use std::time::{Duration, SystemTime, UNIX_EPOCH};

pub use flocons_core::{File, Path};

pub use super::{file_attr, MountFs, OpenWriteFile, ROOT_INODE, TTL};
