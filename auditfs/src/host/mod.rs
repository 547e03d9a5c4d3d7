//! The kernel side of the filesystem
//!
//! [`Host`] receives requests from the FUSE kernel module through `fuser`,
//! resolves inode numbers to paths, checks the operation table and runs the
//! matching handler on the blocking thread pool.

#![allow(
    clippy::as_conversions,
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_sign_loss,
    clippy::too_many_arguments
)]

mod inode;

pub use self::inode::InodeTable;

#[allow(clippy::wildcard_imports)]
use auditfs_ops::ops::*;
use auditfs_ops::types::{FileAttr, FileType, Timestamp, PATH_MAX};
use auditfs_ops::{CallContext, Errno, FileSystem, Handler};

use std::ffi::OsStr;
use std::ops::ControlFlow;
use std::os::raw::c_int;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, SystemTime};

use blocking::unblock;
use fuser::{
    KernelConfig, ReplyAttr, ReplyData, ReplyDirectory, ReplyEmpty, ReplyEntry, ReplyOpen,
    ReplyStatfs, ReplyWrite, ReplyXattr, Request, TimeOrNow,
};
use memchr::memchr;
use tracing::{debug, error};

/// How long the kernel may cache entries and attributes
const TTL: Duration = Duration::from_secs(1);

/// Returns early with an error reply
macro_rules! try_reply {
    ($reply:ident, $expr:expr) => {
        match $expr {
            Ok(val) => val,
            Err(errno) => {
                let errno: Errno = errno;
                return $reply.error(errno.as_raw());
            }
        }
    };
}

/// Calls the handler for `O`
fn call<F, O>(fs: &F, cx: &CallContext, op: O) -> Result<O::Reply, Errno>
where
    F: Handler<O> + ?Sized,
    O: Operation,
{
    fs.handle(cx, op)
}

/// Runs `f` on the blocking thread pool without waiting for it
fn spawn(f: impl FnOnce() + Send + 'static) {
    unblock(f).detach();
}

fn context(req: &Request<'_>) -> CallContext {
    CallContext::new(req.uid(), req.gid(), req.pid())
}

const fn fuse_kind(ty: FileType) -> fuser::FileType {
    match ty {
        FileType::NamedPipe => fuser::FileType::NamedPipe,
        FileType::CharacterDevice => fuser::FileType::CharDevice,
        FileType::Directory => fuser::FileType::Directory,
        FileType::BlockDevice => fuser::FileType::BlockDevice,
        FileType::SymbolicLink => fuser::FileType::Symlink,
        FileType::Socket => fuser::FileType::Socket,
        FileType::Regular | FileType::Unknown => fuser::FileType::RegularFile,
    }
}

/// Converts attributes, replacing the host inode number with `ino`
fn fuse_attr(ino: u64, attr: &FileAttr) -> fuser::FileAttr {
    fuser::FileAttr {
        ino,
        size: attr.size,
        blocks: attr.blocks,
        atime: attr.atime,
        mtime: attr.mtime,
        ctime: attr.ctime,
        crtime: attr.ctime,
        kind: fuse_kind(attr.file_type()),
        perm: attr.st_mode().permissions() as u16,
        nlink: attr.nlink as u32,
        uid: attr.uid,
        gid: attr.gid,
        rdev: attr.rdev as u32,
        blksize: attr.blksize,
        flags: 0,
    }
}

fn timestamp(time: Option<TimeOrNow>) -> Timestamp {
    match time {
        None => Timestamp::Omit,
        Some(TimeOrNow::Now) => Timestamp::Now,
        Some(TimeOrNow::SpecificTime(time)) => Timestamp::At(time),
    }
}

/// Numbers the entries of one directory listing and passes on those after
/// `skip`, which the kernel has not seen yet
struct DirReply<A> {
    add: A,
    /// entries up to this offset were returned by an earlier call
    skip: i64,
    /// offset of the last entry
    offset: i64,
}

impl<A> DirReply<A>
where
    A: FnMut(u64, i64, fuser::FileType, &OsStr) -> bool,
{
    /// `add` returns `true` when the entry did not fit
    fn new(skip: i64, add: A) -> Self {
        Self {
            add,
            skip,
            offset: 0,
        }
    }
}

impl<A> DirSink for DirReply<A>
where
    A: FnMut(u64, i64, fuser::FileType, &OsStr) -> bool,
{
    fn push(&mut self, name: &OsStr, attr: &FileAttr) -> ControlFlow<()> {
        self.offset = self.offset.wrapping_add(1);
        if self.offset <= self.skip {
            return ControlFlow::Continue(());
        }
        let kind = fuse_kind(attr.file_type());
        if (self.add)(attr.ino, self.offset, kind, name) {
            // the buffer is full
            return ControlFlow::Break(());
        }
        ControlFlow::Continue(())
    }
}

/// A FUSE filesystem backed by a path based [`FileSystem`]
pub struct Host<F> {
    fs: Arc<F>,
    inodes: Arc<Mutex<InodeTable>>,
}

impl<F> std::fmt::Debug for Host<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Host").finish()
    }
}

fn lock(inodes: &Mutex<InodeTable>) -> MutexGuard<'_, InodeTable> {
    match inodes.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

impl<F> Host<F>
where
    F: FileSystem + 'static,
{
    #[must_use]
    pub fn new(fs: F) -> Self {
        Self {
            fs: Arc::new(fs),
            inodes: Arc::new(Mutex::new(InodeTable::new())),
        }
    }

    fn supports(&self, kind: OpKind) -> Result<(), Errno> {
        if self.fs.operations().supports(kind) {
            Ok(())
        } else {
            debug!(op = %kind, "unsupported operation");
            Err(Errno::ENOSYS)
        }
    }

    fn path(&self, ino: u64) -> Result<PathBuf, Errno> {
        match lock(&self.inodes).path(ino) {
            Some(path) => Ok(path.to_owned()),
            None => {
                error!(ino, "unknown inode");
                Err(Errno::ENOENT)
            }
        }
    }

    fn child(&self, parent: u64, name: &OsStr) -> Result<PathBuf, Errno> {
        match lock(&self.inodes).child(parent, name) {
            Some(path) => Ok(path),
            None => {
                error!(parent, ?name, "unknown parent inode");
                Err(Errno::ENOENT)
            }
        }
    }

    /// Runs `f`, then looks up the created `path` and replies its entry
    fn create_entry(
        &self,
        cx: CallContext,
        path: PathBuf,
        reply: ReplyEntry,
        f: impl FnOnce(&F, &CallContext, &Path) -> Result<(), Errno> + Send + 'static,
    ) {
        let fs = Arc::clone(&self.fs);
        let inodes = Arc::clone(&self.inodes);
        spawn(move || {
            try_reply!(reply, f(&*fs, &cx, &path));
            let attr = try_reply!(reply, call(&*fs, &cx, OpGetAttr::new(&path)));
            let ino = lock(&inodes).remember(path);
            reply.entry(&TTL, &fuse_attr(ino, &attr), 0);
        });
    }

    /// Runs the steps of a `setattr` request in order. Nothing is changed
    /// when a step has no slot.
    #[allow(clippy::needless_pass_by_value)]
    fn set_attr(fs: &F, cx: &CallContext, path: &Path, attrs: SetAttr) -> Result<FileAttr, Errno> {
        let times = attrs.atime.is_some() || attrs.mtime.is_some();
        if times && !fs.operations().supports(OpKind::Utimens) {
            debug!(op = %OpKind::Utimens, "unsupported operation");
            return Err(Errno::ENOSYS);
        }
        if let Some(mode) = attrs.mode {
            call(fs, cx, OpChmod::new(path, mode))?;
        }
        if attrs.uid.is_some() || attrs.gid.is_some() {
            let uid = attrs.uid.unwrap_or(u32::MAX);
            let gid = attrs.gid.unwrap_or(u32::MAX);
            call(fs, cx, OpChown::new(path, uid, gid))?;
        }
        if let Some(size) = attrs.size {
            call(fs, cx, OpTruncate::new(path, size as i64))?;
        }
        if times {
            let op = OpUtimens::new(path, timestamp(attrs.atime), timestamp(attrs.mtime));
            call(fs, cx, op)?;
        }
        call(fs, cx, OpGetAttr::new(path))
    }
}

/// The attributes a `setattr` request changes
#[derive(Debug, Default)]
struct SetAttr {
    mode: Option<u32>,
    uid: Option<u32>,
    gid: Option<u32>,
    size: Option<u64>,
    atime: Option<TimeOrNow>,
    mtime: Option<TimeOrNow>,
}

impl<F> fuser::Filesystem for Host<F>
where
    F: FileSystem + 'static,
{
    fn init(&mut self, _req: &Request<'_>, _config: &mut KernelConfig) -> Result<(), c_int> {
        debug!(operations = ?self.fs.operations(), "initialized");
        Ok(())
    }

    fn destroy(&mut self) {
        debug!("destroyed");
    }

    fn lookup(&mut self, req: &Request<'_>, parent: u64, name: &OsStr, reply: ReplyEntry) {
        let path = try_reply!(reply, self.child(parent, name));
        let cx = context(req);
        let fs = Arc::clone(&self.fs);
        let inodes = Arc::clone(&self.inodes);
        spawn(move || {
            let attr = try_reply!(reply, call(&*fs, &cx, OpGetAttr::new(&path)));
            let ino = lock(&inodes).remember(path);
            reply.entry(&TTL, &fuse_attr(ino, &attr), 0);
        });
    }

    fn forget(&mut self, _req: &Request<'_>, ino: u64, nlookup: u64) {
        lock(&self.inodes).forget(ino, nlookup);
    }

    fn getattr(&mut self, req: &Request<'_>, ino: u64, _fh: Option<u64>, reply: ReplyAttr) {
        let path = try_reply!(reply, self.path(ino));
        let cx = context(req);
        let fs = Arc::clone(&self.fs);
        spawn(move || {
            let attr = try_reply!(reply, call(&*fs, &cx, OpGetAttr::new(&path)));
            reply.attr(&TTL, &fuse_attr(ino, &attr));
        });
    }

    fn setattr(
        &mut self,
        req: &Request<'_>,
        ino: u64,
        mode: Option<u32>,
        uid: Option<u32>,
        gid: Option<u32>,
        size: Option<u64>,
        atime: Option<TimeOrNow>,
        mtime: Option<TimeOrNow>,
        _ctime: Option<SystemTime>,
        _fh: Option<u64>,
        _crtime: Option<SystemTime>,
        _chgtime: Option<SystemTime>,
        _bkuptime: Option<SystemTime>,
        _flags: Option<u32>,
        reply: ReplyAttr,
    ) {
        let path = try_reply!(reply, self.path(ino));
        let attrs = SetAttr {
            mode,
            uid,
            gid,
            size,
            atime,
            mtime,
        };
        let cx = context(req);
        let fs = Arc::clone(&self.fs);
        spawn(move || {
            let attr = try_reply!(reply, Self::set_attr(&*fs, &cx, &path, attrs));
            reply.attr(&TTL, &fuse_attr(ino, &attr));
        });
    }

    fn readlink(&mut self, req: &Request<'_>, ino: u64, reply: ReplyData) {
        let path = try_reply!(reply, self.path(ino));
        let cx = context(req);
        let fs = Arc::clone(&self.fs);
        spawn(move || {
            let mut buf = vec![0_u8; PATH_MAX.wrapping_add(1)];
            try_reply!(reply, call(&*fs, &cx, OpReadLink::new(&path, &mut buf)));
            let len = memchr(0, &buf).unwrap_or(buf.len());
            reply.data(&buf[..len]);
        });
    }

    fn mknod(
        &mut self,
        req: &Request<'_>,
        parent: u64,
        name: &OsStr,
        mode: u32,
        _umask: u32,
        rdev: u32,
        reply: ReplyEntry,
    ) {
        let path = try_reply!(reply, self.child(parent, name));
        self.create_entry(context(req), path, reply, move |fs, cx, path| {
            call(fs, cx, OpMkNod::new(path, mode, u64::from(rdev)))
        });
    }

    fn mkdir(
        &mut self,
        req: &Request<'_>,
        parent: u64,
        name: &OsStr,
        mode: u32,
        _umask: u32,
        reply: ReplyEntry,
    ) {
        let path = try_reply!(reply, self.child(parent, name));
        self.create_entry(context(req), path, reply, move |fs, cx, path| {
            call(fs, cx, OpMkDir::new(path, mode))
        });
    }

    fn unlink(&mut self, req: &Request<'_>, parent: u64, name: &OsStr, reply: ReplyEmpty) {
        let path = try_reply!(reply, self.child(parent, name));
        let cx = context(req);
        let fs = Arc::clone(&self.fs);
        let inodes = Arc::clone(&self.inodes);
        spawn(move || {
            try_reply!(reply, call(&*fs, &cx, OpUnlink::new(&path)));
            lock(&inodes).remove(&path);
            reply.ok();
        });
    }

    fn rmdir(&mut self, req: &Request<'_>, parent: u64, name: &OsStr, reply: ReplyEmpty) {
        let path = try_reply!(reply, self.child(parent, name));
        let cx = context(req);
        let fs = Arc::clone(&self.fs);
        let inodes = Arc::clone(&self.inodes);
        spawn(move || {
            try_reply!(reply, call(&*fs, &cx, OpRmDir::new(&path)));
            lock(&inodes).remove(&path);
            reply.ok();
        });
    }

    fn symlink(
        &mut self,
        req: &Request<'_>,
        parent: u64,
        link_name: &OsStr,
        target: &Path,
        reply: ReplyEntry,
    ) {
        let path = try_reply!(reply, self.child(parent, link_name));
        let target = target.to_owned();
        self.create_entry(context(req), path, reply, move |fs, cx, path| {
            call(fs, cx, OpSymLink::new(&target, path))
        });
    }

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
        // rename(2) can not honor RENAME_NOREPLACE or RENAME_EXCHANGE
        if flags != 0 {
            return reply.error(libc::EINVAL);
        }
        let from = try_reply!(reply, self.child(parent, name));
        let to = try_reply!(reply, self.child(newparent, newname));
        let cx = context(req);
        let fs = Arc::clone(&self.fs);
        let inodes = Arc::clone(&self.inodes);
        spawn(move || {
            try_reply!(reply, call(&*fs, &cx, OpRename::new(&from, &to)));
            lock(&inodes).rename(&from, &to);
            reply.ok();
        });
    }

    fn link(
        &mut self,
        req: &Request<'_>,
        ino: u64,
        newparent: u64,
        newname: &OsStr,
        reply: ReplyEntry,
    ) {
        let from = try_reply!(reply, self.path(ino));
        let to = try_reply!(reply, self.child(newparent, newname));
        self.create_entry(context(req), to, reply, move |fs, cx, to| {
            call(fs, cx, OpLink::new(&from, to))
        });
    }

    fn open(&mut self, req: &Request<'_>, ino: u64, flags: i32, reply: ReplyOpen) {
        let path = try_reply!(reply, self.path(ino));
        let cx = context(req);
        let fs = Arc::clone(&self.fs);
        spawn(move || {
            try_reply!(reply, call(&*fs, &cx, OpOpen::new(&path, flags)));
            reply.opened(0, 0);
        });
    }

    fn read(
        &mut self,
        req: &Request<'_>,
        ino: u64,
        _fh: u64,
        offset: i64,
        size: u32,
        _flags: i32,
        _lock_owner: Option<u64>,
        reply: ReplyData,
    ) {
        let path = try_reply!(reply, self.path(ino));
        let cx = context(req);
        let fs = Arc::clone(&self.fs);
        spawn(move || {
            let mut buf = vec![0_u8; size as usize];
            let n = try_reply!(reply, call(&*fs, &cx, OpRead::new(&path, offset, &mut buf)));
            reply.data(&buf[..n]);
        });
    }

    fn write(
        &mut self,
        req: &Request<'_>,
        ino: u64,
        _fh: u64,
        offset: i64,
        data: &[u8],
        _write_flags: u32,
        _flags: i32,
        _lock_owner: Option<u64>,
        reply: ReplyWrite,
    ) {
        let path = try_reply!(reply, self.path(ino));
        let data = data.to_owned();
        let cx = context(req);
        let fs = Arc::clone(&self.fs);
        spawn(move || {
            let n = try_reply!(reply, call(&*fs, &cx, OpWrite::new(&path, offset, &data)));
            reply.written(n as u32);
        });
    }

    fn readdir(
        &mut self,
        req: &Request<'_>,
        ino: u64,
        _fh: u64,
        offset: i64,
        mut reply: ReplyDirectory,
    ) {
        let path = try_reply!(reply, self.path(ino));
        let cx = context(req);
        let fs = Arc::clone(&self.fs);
        spawn(move || {
            let mut sink = DirReply::new(offset, |ino, off, kind, name| {
                reply.add(ino, off, kind, name)
            });
            try_reply!(reply, call(&*fs, &cx, OpReadDir::new(&path, &mut sink)));
            reply.ok();
        });
    }

    fn statfs(&mut self, req: &Request<'_>, ino: u64, reply: ReplyStatfs) {
        let path = try_reply!(reply, self.path(ino));
        let cx = context(req);
        let fs = Arc::clone(&self.fs);
        spawn(move || {
            let st = try_reply!(reply, call(&*fs, &cx, OpStatFs::new(&path)));
            reply.statfs(
                st.blocks, st.bfree, st.bavail, st.files, st.ffree, st.bsize, st.namelen,
                st.frsize,
            );
        });
    }

    fn setxattr(
        &mut self,
        req: &Request<'_>,
        ino: u64,
        name: &OsStr,
        value: &[u8],
        flags: i32,
        _position: u32,
        reply: ReplyEmpty,
    ) {
        try_reply!(reply, self.supports(OpKind::SetXAttr));
        let path = try_reply!(reply, self.path(ino));
        let (name, value) = (name.to_owned(), value.to_owned());
        let cx = context(req);
        let fs = Arc::clone(&self.fs);
        spawn(move || {
            let op = OpSetXAttr::new(&path, &name, &value, flags);
            try_reply!(reply, call(&*fs, &cx, op));
            reply.ok();
        });
    }

    fn getxattr(
        &mut self,
        req: &Request<'_>,
        ino: u64,
        name: &OsStr,
        size: u32,
        reply: ReplyXattr,
    ) {
        try_reply!(reply, self.supports(OpKind::GetXAttr));
        let path = try_reply!(reply, self.path(ino));
        let name = name.to_owned();
        let cx = context(req);
        let fs = Arc::clone(&self.fs);
        spawn(move || {
            let mut buf = vec![0_u8; size as usize];
            let n = try_reply!(reply, call(&*fs, &cx, OpGetXAttr::new(&path, &name, &mut buf)));
            if size == 0 {
                reply.size(n as u32);
            } else {
                reply.data(&buf[..n]);
            }
        });
    }

    fn listxattr(&mut self, req: &Request<'_>, ino: u64, size: u32, reply: ReplyXattr) {
        try_reply!(reply, self.supports(OpKind::ListXAttr));
        let path = try_reply!(reply, self.path(ino));
        let cx = context(req);
        let fs = Arc::clone(&self.fs);
        spawn(move || {
            let mut buf = vec![0_u8; size as usize];
            let n = try_reply!(reply, call(&*fs, &cx, OpListXAttr::new(&path, &mut buf)));
            if size == 0 {
                reply.size(n as u32);
            } else {
                reply.data(&buf[..n]);
            }
        });
    }

    fn removexattr(&mut self, req: &Request<'_>, ino: u64, name: &OsStr, reply: ReplyEmpty) {
        try_reply!(reply, self.supports(OpKind::RemoveXAttr));
        let path = try_reply!(reply, self.path(ino));
        let name = name.to_owned();
        let cx = context(req);
        let fs = Arc::clone(&self.fs);
        spawn(move || {
            try_reply!(reply, call(&*fs, &cx, OpRemoveXAttr::new(&path, &name)));
            reply.ok();
        });
    }

    fn access(&mut self, req: &Request<'_>, ino: u64, mask: i32, reply: ReplyEmpty) {
        let path = try_reply!(reply, self.path(ino));
        let cx = context(req);
        let fs = Arc::clone(&self.fs);
        spawn(move || {
            try_reply!(reply, call(&*fs, &cx, OpAccess::new(&path, mask)));
            reply.ok();
        });
    }

    fn fallocate(
        &mut self,
        req: &Request<'_>,
        ino: u64,
        _fh: u64,
        offset: i64,
        length: i64,
        mode: i32,
        reply: ReplyEmpty,
    ) {
        try_reply!(reply, self.supports(OpKind::Fallocate));
        let path = try_reply!(reply, self.path(ino));
        let cx = context(req);
        let fs = Arc::clone(&self.fs);
        spawn(move || {
            let op = OpFallocate::new(&path, mode, offset, length);
            try_reply!(reply, call(&*fs, &cx, op));
            reply.ok();
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::log::{CallLog, MemoryLog, Outcome, Record};
    use crate::passthrough::PassthroughFs;

    use auditfs_ops::types::PERMISSION_MASK;
    use auditfs_ops::{Capabilities, Capability, OperationTable};

    use std::ffi::OsString;
    use std::fs;
    use std::io;
    use std::os::unix::fs::{MetadataExt, PermissionsExt};
    use std::time::UNIX_EPOCH;

    fn setup(caps: Capabilities) -> (PassthroughFs, Arc<MemoryLog>) {
        let log = Arc::new(MemoryLog::new());
        let table = OperationTable::new(caps);
        let pt = PassthroughFs::new(Arc::clone(&log) as Arc<dyn CallLog>, table);
        (pt, log)
    }

    fn kinds(log: &MemoryLog) -> Vec<OpKind> {
        log.records()
            .iter()
            .map(|record| match *record {
                Record::Entry(kind, _) | Record::Outcome(kind, _) => kind,
            })
            .collect()
    }

    /// Lists `dir` into a buffer with room for `room` entries
    fn list(pt: &PassthroughFs, dir: &Path, skip: i64, room: usize) -> Vec<(i64, OsString)> {
        let mut out = Vec::new();
        let mut sink = DirReply::new(skip, |_, offset, _, name: &OsStr| {
            if out.len() == room {
                return true;
            }
            out.push((offset, name.to_owned()));
            false
        });
        call(pt, &CallContext::default(), OpReadDir::new(dir, &mut sink)).unwrap();
        out
    }

    #[test]
    fn setattr_runs_steps_in_order() -> io::Result<()> {
        let tmp = tempfile::tempdir()?;
        let path = tmp.path().join("file");
        fs::write(&path, b"hello")?;
        let meta = fs::metadata(&path)?;
        let (pt, log) = setup(Capabilities::detect());

        let mtime = UNIX_EPOCH + Duration::from_secs(1_000_000);
        let attrs = SetAttr {
            mode: Some(0o600),
            uid: Some(meta.uid()),
            gid: Some(meta.gid()),
            size: Some(2),
            atime: None,
            mtime: Some(TimeOrNow::SpecificTime(mtime)),
        };
        let cx = CallContext::default();
        let attr = Host::<PassthroughFs>::set_attr(&pt, &cx, &path, attrs).unwrap();
        assert_eq!(attr.st_mode().permissions(), 0o600);
        assert_eq!(attr.size, 2);
        assert_eq!(attr.mtime, mtime);

        assert_eq!(
            kinds(&log),
            [
                OpKind::Chmod,
                OpKind::Chmod,
                OpKind::Chown,
                OpKind::Chown,
                OpKind::Truncate,
                OpKind::Truncate,
                OpKind::Utimens,
                OpKind::Utimens,
                OpKind::GetAttr,
                OpKind::GetAttr,
            ]
        );
        for record in log.records() {
            if let Record::Outcome(kind, outcome) = record {
                assert_eq!(outcome, Outcome::Success, "{}", kind);
            }
        }
        Ok(())
    }

    #[test]
    fn setattr_skips_unset_fields() -> io::Result<()> {
        let tmp = tempfile::tempdir()?;
        let path = tmp.path().join("file");
        fs::write(&path, b"hello")?;
        let (pt, log) = setup(Capabilities::detect());

        let attrs = SetAttr {
            size: Some(0),
            ..SetAttr::default()
        };
        let cx = CallContext::default();
        let attr = Host::<PassthroughFs>::set_attr(&pt, &cx, &path, attrs).unwrap();
        assert_eq!(attr.size, 0);
        assert_eq!(
            kinds(&log),
            [
                OpKind::Truncate,
                OpKind::Truncate,
                OpKind::GetAttr,
                OpKind::GetAttr,
            ]
        );
        Ok(())
    }

    #[test]
    fn setattr_without_utimens_changes_nothing() -> io::Result<()> {
        let tmp = tempfile::tempdir()?;
        let path = tmp.path().join("file");
        fs::write(&path, b"hello")?;
        fs::set_permissions(&path, fs::Permissions::from_mode(0o644))?;
        let (pt, log) = setup(Capabilities::detect().without(Capability::Utimens));

        let attrs = SetAttr {
            mode: Some(0o600),
            size: Some(0),
            mtime: Some(TimeOrNow::Now),
            ..SetAttr::default()
        };
        let cx = CallContext::default();
        let err = Host::<PassthroughFs>::set_attr(&pt, &cx, &path, attrs).unwrap_err();
        assert_eq!(err, Errno::ENOSYS);

        let meta = fs::metadata(&path)?;
        assert_eq!(meta.permissions().mode() & PERMISSION_MASK, 0o644);
        assert_eq!(meta.len(), 5);
        assert!(log.records().is_empty());
        Ok(())
    }

    #[test]
    fn unsupported_slots_answer_enosys() {
        let caps = Capabilities::detect()
            .without(Capability::XAttr)
            .without(Capability::Fallocate);
        let (pt, log) = setup(caps);
        let host = Host::new(pt);

        let empty = [
            OpKind::Fallocate,
            OpKind::SetXAttr,
            OpKind::GetXAttr,
            OpKind::ListXAttr,
            OpKind::RemoveXAttr,
        ];
        for &kind in empty.iter() {
            assert_eq!(host.supports(kind), Err(Errno::ENOSYS), "{}", kind);
        }
        assert_eq!(host.supports(OpKind::Read), Ok(()));
        assert!(log.records().is_empty());
    }

    #[test]
    fn readdir_resumes_after_offset() -> io::Result<()> {
        let tmp = tempfile::tempdir()?;
        for name in &["a", "b", "c"] {
            fs::write(tmp.path().join(name), b"")?;
        }
        let (pt, _log) = setup(Capabilities::detect());

        let all = list(&pt, tmp.path(), 0, usize::MAX);
        let offsets: Vec<i64> = all.iter().map(|&(offset, _)| offset).collect();
        assert_eq!(offsets, [1, 2, 3, 4, 5]);

        assert_eq!(list(&pt, tmp.path(), 2, usize::MAX), all[2..].to_vec());
        assert!(list(&pt, tmp.path(), 5, usize::MAX).is_empty());
        Ok(())
    }

    #[test]
    fn readdir_stops_when_buffer_is_full() -> io::Result<()> {
        let tmp = tempfile::tempdir()?;
        for name in &["a", "b", "c"] {
            fs::write(tmp.path().join(name), b"")?;
        }
        let (pt, log) = setup(Capabilities::detect());
        let all = list(&pt, tmp.path(), 0, usize::MAX);

        let first = list(&pt, tmp.path(), 0, 2);
        assert_eq!(first, all[..2].to_vec());
        let rest = list(&pt, tmp.path(), first[1].0, usize::MAX);
        assert_eq!(rest, all[2..].to_vec());

        // a listing cut short still succeeds
        let records = log.records();
        assert_eq!(records[3], Record::Outcome(OpKind::ReadDir, Outcome::Success));
        Ok(())
    }

    #[test]
    fn attr_conversion() {
        let attr = FileAttr {
            ino: 1234,
            size: 10,
            mode: libc::S_IFLNK | 0o777,
            nlink: 1,
            uid: 1000,
            mtime: UNIX_EPOCH + Duration::from_secs(5),
            ..FileAttr::default()
        };
        let fuse = fuse_attr(7, &attr);
        assert_eq!(fuse.ino, 7);
        assert_eq!(fuse.size, 10);
        assert_eq!(fuse.kind, fuser::FileType::Symlink);
        assert_eq!(fuse.perm, 0o777);
        assert_eq!(fuse.uid, 1000);
        assert_eq!(fuse.mtime, attr.mtime);
    }

    #[test]
    fn unknown_entries_are_regular() {
        assert_eq!(fuse_kind(FileType::Unknown), fuser::FileType::RegularFile);
        assert_eq!(fuse_kind(FileType::NamedPipe), fuser::FileType::NamedPipe);
    }

    #[test]
    fn omitted_times() {
        assert_eq!(timestamp(None), Timestamp::Omit);
        assert_eq!(timestamp(Some(TimeOrNow::Now)), Timestamp::Now);
        assert_eq!(
            timestamp(Some(TimeOrNow::SpecificTime(UNIX_EPOCH))),
            Timestamp::At(UNIX_EPOCH)
        );
    }
}
