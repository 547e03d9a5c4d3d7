//! The passthrough dispatcher
//!
//! Every handler forwards its operation to the host filesystem at the same
//! path and appends the call to the [`CallLog`]. Handlers keep no state
//! across calls, any descriptor they open is closed before they return.

#![allow(
    clippy::as_conversions,
    clippy::cast_sign_loss,
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap
)]

use crate::dir::Dir;
use crate::fd::FileDesc;
use crate::log::{CallLog, Outcome};
use crate::syscall;

#[allow(clippy::wildcard_imports)]
use auditfs_ops::ops::*;
use auditfs_ops::types::{system_time, FileAttr, StMode, StatFs, Timestamp};
use auditfs_ops::{CallContext, Errno, FileSystem, Handler, OperationTable};

use std::fmt;
use std::io;
use std::os::unix::io::AsRawFd;
use std::sync::Arc;
use std::time::UNIX_EPOCH;

use tracing::{debug, debug_span};

/// A filesystem which mirrors the host filesystem and logs every call
pub struct PassthroughFs {
    /// shared by all calls
    log: Arc<dyn CallLog>,
    /// the slots this instance announces
    table: OperationTable,
}

impl fmt::Debug for PassthroughFs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PassthroughFs")
            .field("table", &self.table)
            .finish()
    }
}

impl PassthroughFs {
    #[must_use]
    pub fn new(log: Arc<dyn CallLog>, table: OperationTable) -> Self {
        Self { log, table }
    }

    /// Appends the entry line, runs `f` and appends the outcome line
    fn record<O, T>(
        &self,
        cx: &CallContext,
        op: O,
        f: impl FnOnce(O) -> io::Result<T>,
    ) -> Result<T, Errno>
    where
        O: Operation,
    {
        let span = debug_span!("call", op = %O::KIND, uid = cx.uid(), pid = cx.pid());
        let _enter = span.enter();

        debug!(%op);
        if O::KIND.names_requester() {
            self.log.entry(O::KIND, &format_args!("{}, by {}", op, cx.uid()));
        } else {
            self.log.entry(O::KIND, &op);
        }

        match f(op) {
            Ok(reply) => {
                self.log.outcome(O::KIND, Outcome::Success);
                debug!("succeeded");
                Ok(reply)
            }
            Err(err) => {
                let errno = Errno::from(err);
                self.log.outcome(O::KIND, Outcome::Failure(errno));
                debug!(?errno, "failed");
                Err(errno)
            }
        }
    }
}

/// Converts the result of `lstat(2)`
#[allow(clippy::useless_conversion)]
fn file_attr(st: &libc::stat) -> FileAttr {
    FileAttr {
        ino: st.st_ino,
        size: st.st_size as u64,
        blocks: st.st_blocks as u64,
        atime: system_time(st.st_atime, st.st_atime_nsec),
        mtime: system_time(st.st_mtime, st.st_mtime_nsec),
        ctime: system_time(st.st_ctime, st.st_ctime_nsec),
        mode: st.st_mode,
        nlink: u64::from(st.st_nlink),
        uid: st.st_uid,
        gid: st.st_gid,
        rdev: st.st_rdev,
        blksize: st.st_blksize as u32,
    }
}

/// Converts the result of `statvfs(3)`
fn stat_fs(st: &libc::statvfs) -> StatFs {
    StatFs {
        blocks: st.f_blocks,
        bfree: st.f_bfree,
        bavail: st.f_bavail,
        files: st.f_files,
        ffree: st.f_ffree,
        bsize: st.f_bsize as u32,
        namelen: st.f_namemax as u32,
        frsize: st.f_frsize as u32,
    }
}

fn timespec(ts: Timestamp) -> libc::timespec {
    match ts {
        Timestamp::Now => libc::timespec {
            tv_sec: 0,
            tv_nsec: libc::UTIME_NOW,
        },
        Timestamp::Omit => libc::timespec {
            tv_sec: 0,
            tv_nsec: libc::UTIME_OMIT,
        },
        Timestamp::At(time) => match time.duration_since(UNIX_EPOCH) {
            Ok(d) => libc::timespec {
                tv_sec: d.as_secs() as libc::time_t,
                tv_nsec: libc::c_long::from(d.subsec_nanos()),
            },
            Err(before) => {
                // before the epoch: round the seconds down, keep nsec positive
                let d = before.duration();
                let (mut sec, mut nsec) = (-(d.as_secs() as i64), i64::from(d.subsec_nanos()));
                if nsec > 0 {
                    sec -= 1;
                    nsec = 1_000_000_000 - nsec;
                }
                libc::timespec {
                    tv_sec: sec as libc::time_t,
                    tv_nsec: nsec as libc::c_long,
                }
            }
        },
    }
}

impl Handler<OpGetAttr<'_>> for PassthroughFs {
    fn handle(&self, cx: &CallContext, op: OpGetAttr<'_>) -> Result<FileAttr, Errno> {
        self.record(cx, op, |op| {
            let st = syscall::lstat(op.path())?;
            Ok(file_attr(&st))
        })
    }
}

impl Handler<OpAccess<'_>> for PassthroughFs {
    fn handle(&self, cx: &CallContext, op: OpAccess<'_>) -> Result<(), Errno> {
        self.record(cx, op, |op| syscall::access(op.path(), op.mask()))
    }
}

impl Handler<OpReadLink<'_>> for PassthroughFs {
    fn handle(&self, cx: &CallContext, op: OpReadLink<'_>) -> Result<(), Errno> {
        self.record(cx, op, |mut op| {
            let path = op.path();
            let buf = op.buf_mut();
            // one byte is kept for the terminator
            let cap = match buf.len().checked_sub(1) {
                Some(cap) => cap,
                None => return Err(Errno::EINVAL.into()),
            };
            let n = syscall::readlink(path, &mut buf[..cap])?;
            buf[n] = 0;
            Ok(())
        })
    }
}

impl Handler<OpReadDir<'_>> for PassthroughFs {
    fn handle(&self, cx: &CallContext, op: OpReadDir<'_>) -> Result<(), Errno> {
        self.record(cx, op, |mut op| {
            let mut dir = Dir::open(op.path())?;
            let sink = op.sink_mut();
            let mut entries = dir.entries();
            while let Some(entry) = entries.next_entry() {
                let entry = entry?;
                let attr = FileAttr {
                    ino: entry.ino(),
                    mode: u32::from(entry.d_type()) << 12,
                    ..FileAttr::default()
                };
                if sink.push(entry.name(), &attr).is_break() {
                    break;
                }
            }
            Ok(())
        })
    }
}

impl Handler<OpMkNod<'_>> for PassthroughFs {
    fn handle(&self, cx: &CallContext, op: OpMkNod<'_>) -> Result<(), Errno> {
        self.record(cx, op, |op| {
            let st_mode = StMode::from_raw(op.mode());
            if st_mode.is_regular() {
                let flags = libc::O_CREAT | libc::O_EXCL | libc::O_WRONLY;
                let fd = FileDesc::open(op.path(), flags, op.mode())?;
                drop(fd);
                Ok(())
            } else if st_mode.is_fifo() {
                syscall::mkfifo(op.path(), op.mode())
            } else {
                syscall::mknod(op.path(), op.mode(), op.rdev())
            }
        })
    }
}

impl Handler<OpMkDir<'_>> for PassthroughFs {
    fn handle(&self, cx: &CallContext, op: OpMkDir<'_>) -> Result<(), Errno> {
        self.record(cx, op, |op| syscall::mkdir(op.path(), op.mode()))
    }
}

impl Handler<OpUnlink<'_>> for PassthroughFs {
    fn handle(&self, cx: &CallContext, op: OpUnlink<'_>) -> Result<(), Errno> {
        self.record(cx, op, |op| syscall::unlink(op.path()))
    }
}

impl Handler<OpRmDir<'_>> for PassthroughFs {
    fn handle(&self, cx: &CallContext, op: OpRmDir<'_>) -> Result<(), Errno> {
        self.record(cx, op, |op| syscall::rmdir(op.path()))
    }
}

impl Handler<OpSymLink<'_>> for PassthroughFs {
    fn handle(&self, cx: &CallContext, op: OpSymLink<'_>) -> Result<(), Errno> {
        self.record(cx, op, |op| syscall::symlink(op.target(), op.path()))
    }
}

impl Handler<OpRename<'_>> for PassthroughFs {
    fn handle(&self, cx: &CallContext, op: OpRename<'_>) -> Result<(), Errno> {
        self.record(cx, op, |op| syscall::rename(op.from(), op.to()))
    }
}

impl Handler<OpLink<'_>> for PassthroughFs {
    fn handle(&self, cx: &CallContext, op: OpLink<'_>) -> Result<(), Errno> {
        self.record(cx, op, |op| syscall::link(op.from(), op.to()))
    }
}

impl Handler<OpChmod<'_>> for PassthroughFs {
    fn handle(&self, cx: &CallContext, op: OpChmod<'_>) -> Result<(), Errno> {
        self.record(cx, op, |op| syscall::chmod(op.path(), op.mode()))
    }
}

impl Handler<OpChown<'_>> for PassthroughFs {
    fn handle(&self, cx: &CallContext, op: OpChown<'_>) -> Result<(), Errno> {
        self.record(cx, op, |op| syscall::lchown(op.path(), op.uid(), op.gid()))
    }
}

impl Handler<OpTruncate<'_>> for PassthroughFs {
    fn handle(&self, cx: &CallContext, op: OpTruncate<'_>) -> Result<(), Errno> {
        self.record(cx, op, |op| syscall::truncate(op.path(), op.size()))
    }
}

impl Handler<OpUtimens<'_>> for PassthroughFs {
    fn handle(&self, cx: &CallContext, op: OpUtimens<'_>) -> Result<(), Errno> {
        self.record(cx, op, |op| {
            let times = [timespec(op.atime()), timespec(op.mtime())];
            syscall::lutimens(op.path(), &times)
        })
    }
}

impl Handler<OpOpen<'_>> for PassthroughFs {
    fn handle(&self, cx: &CallContext, op: OpOpen<'_>) -> Result<(), Errno> {
        self.record(cx, op, |op| {
            let fd = FileDesc::open(op.path(), op.flags(), 0)?;
            drop(fd);
            Ok(())
        })
    }
}

impl Handler<OpRead<'_>> for PassthroughFs {
    fn handle(&self, cx: &CallContext, op: OpRead<'_>) -> Result<usize, Errno> {
        self.record(cx, op, |mut op| {
            let fd = FileDesc::open(op.path(), libc::O_RDONLY, 0)?;
            let offset = op.offset();
            syscall::pread(fd.as_raw_fd(), op.buf_mut(), offset)
        })
    }
}

impl Handler<OpWrite<'_>> for PassthroughFs {
    fn handle(&self, cx: &CallContext, op: OpWrite<'_>) -> Result<usize, Errno> {
        self.record(cx, op, |op| {
            let fd = FileDesc::open(op.path(), libc::O_WRONLY, 0)?;
            syscall::pwrite(fd.as_raw_fd(), op.data(), op.offset())
        })
    }
}

impl Handler<OpStatFs<'_>> for PassthroughFs {
    fn handle(&self, cx: &CallContext, op: OpStatFs<'_>) -> Result<StatFs, Errno> {
        self.record(cx, op, |op| {
            let st = syscall::statvfs(op.path())?;
            Ok(stat_fs(&st))
        })
    }
}

impl Handler<OpFallocate<'_>> for PassthroughFs {
    fn handle(&self, cx: &CallContext, op: OpFallocate<'_>) -> Result<(), Errno> {
        self.record(cx, op, |op| {
            if op.mode() != 0 {
                return Err(Errno::EOPNOTSUPP.into());
            }
            let fd = FileDesc::open(op.path(), libc::O_WRONLY, 0)?;
            syscall::posix_fallocate(fd.as_raw_fd(), op.offset(), op.length())
        })
    }
}

impl Handler<OpSetXAttr<'_>> for PassthroughFs {
    fn handle(&self, cx: &CallContext, op: OpSetXAttr<'_>) -> Result<(), Errno> {
        self.record(cx, op, |op| {
            syscall::lsetxattr(op.path(), op.name(), op.value(), op.flags())
        })
    }
}

impl Handler<OpGetXAttr<'_>> for PassthroughFs {
    fn handle(&self, cx: &CallContext, op: OpGetXAttr<'_>) -> Result<usize, Errno> {
        self.record(cx, op, |mut op| {
            let (path, name) = (op.path(), op.name());
            syscall::lgetxattr(path, name, op.buf_mut())
        })
    }
}

impl Handler<OpListXAttr<'_>> for PassthroughFs {
    fn handle(&self, cx: &CallContext, op: OpListXAttr<'_>) -> Result<usize, Errno> {
        self.record(cx, op, |mut op| {
            let path = op.path();
            syscall::llistxattr(path, op.buf_mut())
        })
    }
}

impl Handler<OpRemoveXAttr<'_>> for PassthroughFs {
    fn handle(&self, cx: &CallContext, op: OpRemoveXAttr<'_>) -> Result<(), Errno> {
        self.record(cx, op, |op| syscall::lremovexattr(op.path(), op.name()))
    }
}

impl FileSystem for PassthroughFs {
    #[inline]
    fn operations(&self) -> &OperationTable {
        &self.table
    }
}
