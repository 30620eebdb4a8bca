use super::prelude::*;

/// `rename` would need to delete the source, which is a Non-goal at the
/// core -- no client-side copy+delete fallback the way the teacher
/// implements it, since there is no delete to fall back on here.
#[allow(clippy::too_many_arguments)]
pub fn rename(
    _fs: &mut MountFs,
    _req: &Request<'_>,
    _parent: u64,
    name: &OsStr,
    _newparent: u64,
    _newname: &OsStr,
    _flags: u32,
    reply: ReplyEmpty,
) {
    tracing::debug!(?name, "rename unsupported: no deletion at the core");
    reply.error(ENOSYS);
}
