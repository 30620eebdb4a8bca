use super::prelude::*;

/// Always replies "no such attribute". Harmless: lets Finder/clients probe
/// for extended attributes without treating it as a real error.
pub fn getxattr(_fs: &mut MountFs, _req: &Request, _ino: u64, _name: &OsStr, _size: u32, reply: ReplyXattr) {
    #[cfg(target_os = "macos")]
    reply.error(ENOATTR);

    #[cfg(not(target_os = "macos"))]
    reply.error(ENODATA);
}

/// Fakes success without storing anything. Avoids user-visible errors when
/// Finder (or similar) tries to tag a file with metadata this system has
/// no place to keep.
pub fn setxattr(_fs: &mut MountFs, _req: &Request, _ino: u64, _name: &OsStr, _value: &[u8], _flags: i32, _position: u32, reply: ReplyEmpty) {
    reply.ok();
}

pub fn listxattr(_fs: &mut MountFs, _req: &Request, _ino: u64, size: u32, reply: ReplyXattr) {
    if size == 0 {
        reply.size(0);
    } else {
        reply.data(&[]);
    }
}

pub fn removexattr(_fs: &mut MountFs, _req: &Request, _ino: u64, _name: &OsStr, reply: ReplyEmpty) {
    reply.ok();
}
