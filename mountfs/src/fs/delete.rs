use super::prelude::*;

/// Deletion is a Non-goal at the core: no `FileService` method removes a
/// file or directory, so both callbacks return `ENOSYS`.
pub fn unlink(_fs: &mut MountFs, _req: &Request<'_>, _parent: u64, name: &OsStr, reply: ReplyEmpty) {
    tracing::debug!(?name, "unlink unsupported: no deletion at the core");
    reply.error(ENOSYS);
}

pub fn rmdir(_fs: &mut MountFs, _req: &Request<'_>, _parent: u64, name: &OsStr, reply: ReplyEmpty) {
    tracing::debug!(?name, "rmdir unsupported: no deletion at the core");
    reply.error(ENOSYS);
}
