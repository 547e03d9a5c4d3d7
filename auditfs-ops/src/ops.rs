//! Operations
//!
//! Every operation borrows its paths, names and buffers from the host for
//! the duration of one call. Its `Display` impl renders the entry line of
//! the call log.

use crate::table::Capability;
use crate::types::{FileAttr, StatFs, Timestamp};

use std::ffi::{OsStr, OsString};
use std::fmt::{self, Display};
use std::ops::ControlFlow;
use std::path::Path;

/// The kinds of operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OpKind {
    GetAttr,
    Access,
    ReadLink,
    ReadDir,
    MkNod,
    MkDir,
    Unlink,
    RmDir,
    SymLink,
    Rename,
    Link,
    Chmod,
    Chown,
    Truncate,
    Utimens,
    Open,
    Read,
    Write,
    StatFs,
    Fallocate,
    SetXAttr,
    GetXAttr,
    ListXAttr,
    RemoveXAttr,
}

impl OpKind {
    /// The number of operation kinds
    pub const COUNT: usize = 24;

    /// All operation kinds, in table order
    pub const ALL: [Self; Self::COUNT] = [
        Self::GetAttr,
        Self::Access,
        Self::ReadLink,
        Self::ReadDir,
        Self::MkNod,
        Self::MkDir,
        Self::Unlink,
        Self::RmDir,
        Self::SymLink,
        Self::Rename,
        Self::Link,
        Self::Chmod,
        Self::Chown,
        Self::Truncate,
        Self::Utimens,
        Self::Open,
        Self::Read,
        Self::Write,
        Self::StatFs,
        Self::Fallocate,
        Self::SetXAttr,
        Self::GetXAttr,
        Self::ListXAttr,
        Self::RemoveXAttr,
    ];

    /// The position of this kind in [`OpKind::ALL`]
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// The slot name of this kind
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::GetAttr => "getattr",
            Self::Access => "access",
            Self::ReadLink => "readlink",
            Self::ReadDir => "readdir",
            Self::MkNod => "mknod",
            Self::MkDir => "mkdir",
            Self::Unlink => "unlink",
            Self::RmDir => "rmdir",
            Self::SymLink => "symlink",
            Self::Rename => "rename",
            Self::Link => "link",
            Self::Chmod => "chmod",
            Self::Chown => "chown",
            Self::Truncate => "truncate",
            Self::Utimens => "utimens",
            Self::Open => "open",
            Self::Read => "read",
            Self::Write => "write",
            Self::StatFs => "statfs",
            Self::Fallocate => "fallocate",
            Self::SetXAttr => "setxattr",
            Self::GetXAttr => "getxattr",
            Self::ListXAttr => "listxattr",
            Self::RemoveXAttr => "removexattr",
        }
    }

    /// Whether the entry line of this kind names the requesting user
    #[must_use]
    pub const fn names_requester(self) -> bool {
        matches!(self, Self::Open | Self::Read | Self::Write)
    }

    /// The platform capability this kind depends on, if any
    #[must_use]
    pub const fn capability(self) -> Option<Capability> {
        match self {
            Self::Utimens => Some(Capability::Utimens),
            Self::Fallocate => Some(Capability::Fallocate),
            Self::SetXAttr | Self::GetXAttr | Self::ListXAttr | Self::RemoveXAttr => {
                Some(Capability::XAttr)
            }
            _ => None,
        }
    }
}

impl Display for OpKind {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A typed operation
pub trait Operation: Display {
    /// The kind of this operation
    const KIND: OpKind;
    /// The success value of this operation
    type Reply;
}

/// Receives directory entries
pub trait DirSink {
    /// Adds an entry. Returning [`ControlFlow::Break`] stops the enumeration.
    fn push(&mut self, name: &OsStr, attr: &FileAttr) -> ControlFlow<()>;
}

impl DirSink for Vec<(OsString, FileAttr)> {
    #[inline]
    fn push(&mut self, name: &OsStr, attr: &FileAttr) -> ControlFlow<()> {
        Vec::push(self, (name.to_owned(), *attr));
        ControlFlow::Continue(())
    }
}

#[derive(Debug)]
pub struct OpGetAttr<'b> {
    path: &'b Path,
}

impl<'b> OpGetAttr<'b> {
    #[inline]
    #[must_use]
    pub const fn new(path: &'b Path) -> Self {
        Self { path }
    }

    getters!(path: &'b Path,);
}

declare_operation!(OpGetAttr => GetAttr, FileAttr);

impl Display for OpGetAttr<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "getattr: {}", self.path.display())
    }
}

#[derive(Debug)]
pub struct OpAccess<'b> {
    path: &'b Path,
    mask: i32,
}

impl<'b> OpAccess<'b> {
    #[inline]
    #[must_use]
    pub const fn new(path: &'b Path, mask: i32) -> Self {
        Self { path, mask }
    }

    getters!(path: &'b Path, mask: i32,);
}

declare_operation!(OpAccess => Access, ());

impl Display for OpAccess<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "access: {}, mask: {:o}", self.path.display(), self.mask)
    }
}

/// Reads the target of a symbolic link into `buf`, terminated by a NUL byte
#[derive(Debug)]
pub struct OpReadLink<'b> {
    path: &'b Path,
    buf: &'b mut [u8],
}

impl<'b> OpReadLink<'b> {
    #[inline]
    #[must_use]
    pub fn new(path: &'b Path, buf: &'b mut [u8]) -> Self {
        Self { path, buf }
    }

    getters!(path: &'b Path,);

    #[inline]
    pub fn buf_mut(&mut self) -> &mut [u8] {
        &mut *self.buf
    }
}

declare_operation!(OpReadLink => ReadLink, ());

impl Display for OpReadLink<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "readlink: {}", self.path.display())
    }
}

pub struct OpReadDir<'b> {
    path: &'b Path,
    sink: &'b mut dyn DirSink,
}

impl<'b> OpReadDir<'b> {
    #[inline]
    #[must_use]
    pub fn new(path: &'b Path, sink: &'b mut dyn DirSink) -> Self {
        Self { path, sink }
    }

    getters!(path: &'b Path,);

    #[inline]
    pub fn sink_mut(&mut self) -> &mut (dyn DirSink + 'b) {
        &mut *self.sink
    }
}

declare_operation!(OpReadDir => ReadDir, ());

impl Display for OpReadDir<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "readdir: {}", self.path.display())
    }
}

impl fmt::Debug for OpReadDir<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpReadDir")
            .field("path", &self.path)
            .field("sink", &"<&mut dyn DirSink>")
            .finish()
    }
}

#[derive(Debug)]
pub struct OpMkNod<'b> {
    path: &'b Path,
    mode: u32,
    rdev: u64,
}

impl<'b> OpMkNod<'b> {
    #[inline]
    #[must_use]
    pub const fn new(path: &'b Path, mode: u32, rdev: u64) -> Self {
        Self { path, mode, rdev }
    }

    getters!(path: &'b Path, mode: u32, rdev: u64,);
}

declare_operation!(OpMkNod => MkNod, ());

impl Display for OpMkNod<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "mknod: {}, mode: {:o}, rdev: {}",
            self.path.display(),
            self.mode,
            self.rdev
        )
    }
}

#[derive(Debug)]
pub struct OpMkDir<'b> {
    path: &'b Path,
    mode: u32,
}

impl<'b> OpMkDir<'b> {
    #[inline]
    #[must_use]
    pub const fn new(path: &'b Path, mode: u32) -> Self {
        Self { path, mode }
    }

    getters!(path: &'b Path, mode: u32,);
}

declare_operation!(OpMkDir => MkDir, ());

impl Display for OpMkDir<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "mkdir: {}, mode: {:o}", self.path.display(), self.mode)
    }
}

#[derive(Debug)]
pub struct OpUnlink<'b> {
    path: &'b Path,
}

impl<'b> OpUnlink<'b> {
    #[inline]
    #[must_use]
    pub const fn new(path: &'b Path) -> Self {
        Self { path }
    }

    getters!(path: &'b Path,);
}

declare_operation!(OpUnlink => Unlink, ());

impl Display for OpUnlink<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unlink: {}", self.path.display())
    }
}

#[derive(Debug)]
pub struct OpRmDir<'b> {
    path: &'b Path,
}

impl<'b> OpRmDir<'b> {
    #[inline]
    #[must_use]
    pub const fn new(path: &'b Path) -> Self {
        Self { path }
    }

    getters!(path: &'b Path,);
}

declare_operation!(OpRmDir => RmDir, ());

impl Display for OpRmDir<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rmdir: {}", self.path.display())
    }
}

/// Creates a symbolic link at `path` which points to `target`
#[derive(Debug)]
pub struct OpSymLink<'b> {
    target: &'b Path,
    path: &'b Path,
}

impl<'b> OpSymLink<'b> {
    #[inline]
    #[must_use]
    pub const fn new(target: &'b Path, path: &'b Path) -> Self {
        Self { target, path }
    }

    getters!(target: &'b Path, path: &'b Path,);
}

declare_operation!(OpSymLink => SymLink, ());

impl Display for OpSymLink<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "symlink from: {}, to: {}",
            self.target.display(),
            self.path.display()
        )
    }
}

#[derive(Debug)]
pub struct OpRename<'b> {
    from: &'b Path,
    to: &'b Path,
}

impl<'b> OpRename<'b> {
    #[inline]
    #[must_use]
    pub const fn new(from: &'b Path, to: &'b Path) -> Self {
        Self { from, to }
    }

    getters!(from: &'b Path, to: &'b Path,);
}

declare_operation!(OpRename => Rename, ());

impl Display for OpRename<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "rename from: {}, to: {}",
            self.from.display(),
            self.to.display()
        )
    }
}

/// Creates a hard link `to` which refers to the file at `from`
#[derive(Debug)]
pub struct OpLink<'b> {
    from: &'b Path,
    to: &'b Path,
}

impl<'b> OpLink<'b> {
    #[inline]
    #[must_use]
    pub const fn new(from: &'b Path, to: &'b Path) -> Self {
        Self { from, to }
    }

    getters!(from: &'b Path, to: &'b Path,);
}

declare_operation!(OpLink => Link, ());

impl Display for OpLink<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "link from: {}, to: {}",
            self.from.display(),
            self.to.display()
        )
    }
}

#[derive(Debug)]
pub struct OpChmod<'b> {
    path: &'b Path,
    mode: u32,
}

impl<'b> OpChmod<'b> {
    #[inline]
    #[must_use]
    pub const fn new(path: &'b Path, mode: u32) -> Self {
        Self { path, mode }
    }

    getters!(path: &'b Path, mode: u32,);
}

declare_operation!(OpChmod => Chmod, ());

impl Display for OpChmod<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "chmod: {}, mode: {:o}", self.path.display(), self.mode)
    }
}

/// Changes ownership. `u32::MAX` leaves the id unchanged.
#[derive(Debug)]
pub struct OpChown<'b> {
    path: &'b Path,
    uid: u32,
    gid: u32,
}

impl<'b> OpChown<'b> {
    #[inline]
    #[must_use]
    pub const fn new(path: &'b Path, uid: u32, gid: u32) -> Self {
        Self { path, uid, gid }
    }

    getters!(path: &'b Path, uid: u32, gid: u32,);
}

declare_operation!(OpChown => Chown, ());

impl Display for OpChown<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "chown: {}, uid: {}, gid: {}",
            self.path.display(),
            self.uid,
            self.gid
        )
    }
}

#[derive(Debug)]
pub struct OpTruncate<'b> {
    path: &'b Path,
    size: i64,
}

impl<'b> OpTruncate<'b> {
    #[inline]
    #[must_use]
    pub const fn new(path: &'b Path, size: i64) -> Self {
        Self { path, size }
    }

    getters!(path: &'b Path, size: i64,);
}

declare_operation!(OpTruncate => Truncate, ());

impl Display for OpTruncate<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "truncate: {}, size: {}", self.path.display(), self.size)
    }
}

#[derive(Debug)]
pub struct OpUtimens<'b> {
    path: &'b Path,
    atime: Timestamp,
    mtime: Timestamp,
}

impl<'b> OpUtimens<'b> {
    #[inline]
    #[must_use]
    pub const fn new(path: &'b Path, atime: Timestamp, mtime: Timestamp) -> Self {
        Self { path, atime, mtime }
    }

    getters!(path: &'b Path, atime: Timestamp, mtime: Timestamp,);
}

declare_operation!(OpUtimens => Utimens, ());

impl Display for OpUtimens<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "utimens: {}", self.path.display())
    }
}

#[derive(Debug)]
pub struct OpOpen<'b> {
    path: &'b Path,
    flags: i32,
}

impl<'b> OpOpen<'b> {
    #[inline]
    #[must_use]
    pub const fn new(path: &'b Path, flags: i32) -> Self {
        Self { path, flags }
    }

    getters!(path: &'b Path, flags: i32,);
}

declare_operation!(OpOpen => Open, ());

impl Display for OpOpen<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "open: {}, flags: {:#o}", self.path.display(), self.flags)
    }
}

/// Reads at `offset` into `buf`. Replies the number of bytes read.
#[derive(Debug)]
pub struct OpRead<'b> {
    path: &'b Path,
    offset: i64,
    buf: &'b mut [u8],
}

impl<'b> OpRead<'b> {
    #[inline]
    #[must_use]
    pub fn new(path: &'b Path, offset: i64, buf: &'b mut [u8]) -> Self {
        Self { path, offset, buf }
    }

    getters!(path: &'b Path, offset: i64,);

    #[inline]
    pub fn buf_mut(&mut self) -> &mut [u8] {
        &mut *self.buf
    }
}

declare_operation!(OpRead => Read, usize);

impl Display for OpRead<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "read: {}, offset: {}, size: {}",
            self.path.display(),
            self.offset,
            self.buf.len()
        )
    }
}

/// Writes `data` at `offset`. Replies the number of bytes written.
#[derive(Debug)]
pub struct OpWrite<'b> {
    path: &'b Path,
    offset: i64,
    data: &'b [u8],
}

impl<'b> OpWrite<'b> {
    #[inline]
    #[must_use]
    pub const fn new(path: &'b Path, offset: i64, data: &'b [u8]) -> Self {
        Self { path, offset, data }
    }

    getters!(path: &'b Path, offset: i64, data: &'b [u8],);
}

declare_operation!(OpWrite => Write, usize);

impl Display for OpWrite<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "write: {}, offset: {}, size: {}",
            self.path.display(),
            self.offset,
            self.data.len()
        )
    }
}

#[derive(Debug)]
pub struct OpStatFs<'b> {
    path: &'b Path,
}

impl<'b> OpStatFs<'b> {
    #[inline]
    #[must_use]
    pub const fn new(path: &'b Path) -> Self {
        Self { path }
    }

    getters!(path: &'b Path,);
}

declare_operation!(OpStatFs => StatFs, StatFs);

impl Display for OpStatFs<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "statfs: {}", self.path.display())
    }
}

#[derive(Debug)]
pub struct OpFallocate<'b> {
    path: &'b Path,
    mode: i32,
    offset: i64,
    length: i64,
}

impl<'b> OpFallocate<'b> {
    #[inline]
    #[must_use]
    pub const fn new(path: &'b Path, mode: i32, offset: i64, length: i64) -> Self {
        Self {
            path,
            mode,
            offset,
            length,
        }
    }

    getters!(path: &'b Path, mode: i32, offset: i64, length: i64,);
}

declare_operation!(OpFallocate => Fallocate, ());

impl Display for OpFallocate<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "fallocate: {}, mode: {}, offset: {}, length: {}",
            self.path.display(),
            self.mode,
            self.offset,
            self.length
        )
    }
}

#[derive(Debug)]
pub struct OpSetXAttr<'b> {
    path: &'b Path,
    name: &'b OsStr,
    value: &'b [u8],
    flags: i32,
}

impl<'b> OpSetXAttr<'b> {
    #[inline]
    #[must_use]
    pub const fn new(path: &'b Path, name: &'b OsStr, value: &'b [u8], flags: i32) -> Self {
        Self {
            path,
            name,
            value,
            flags,
        }
    }

    getters!(path: &'b Path, name: &'b OsStr, value: &'b [u8], flags: i32,);
}

declare_operation!(OpSetXAttr => SetXAttr, ());

impl Display for OpSetXAttr<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "setxattr: {}, name: {}, size: {}, flags: {}",
            self.path.display(),
            self.name.to_string_lossy(),
            self.value.len(),
            self.flags
        )
    }
}

/// Reads an attribute value into `buf`. An empty `buf` queries the size of
/// the value. Replies the size of the value.
#[derive(Debug)]
pub struct OpGetXAttr<'b> {
    path: &'b Path,
    name: &'b OsStr,
    buf: &'b mut [u8],
}

impl<'b> OpGetXAttr<'b> {
    #[inline]
    #[must_use]
    pub fn new(path: &'b Path, name: &'b OsStr, buf: &'b mut [u8]) -> Self {
        Self { path, name, buf }
    }

    getters!(path: &'b Path, name: &'b OsStr,);

    #[inline]
    pub fn buf_mut(&mut self) -> &mut [u8] {
        &mut *self.buf
    }
}

declare_operation!(OpGetXAttr => GetXAttr, usize);

impl Display for OpGetXAttr<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "getxattr: {}, name: {}",
            self.path.display(),
            self.name.to_string_lossy()
        )
    }
}

/// Reads the NUL separated list of attribute names into `buf`. An empty
/// `buf` queries the size of the list. Replies the size of the list.
#[derive(Debug)]
pub struct OpListXAttr<'b> {
    path: &'b Path,
    buf: &'b mut [u8],
}

impl<'b> OpListXAttr<'b> {
    #[inline]
    #[must_use]
    pub fn new(path: &'b Path, buf: &'b mut [u8]) -> Self {
        Self { path, buf }
    }

    getters!(path: &'b Path,);

    #[inline]
    pub fn buf_mut(&mut self) -> &mut [u8] {
        &mut *self.buf
    }
}

declare_operation!(OpListXAttr => ListXAttr, usize);

impl Display for OpListXAttr<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "listxattr: {}", self.path.display())
    }
}

#[derive(Debug)]
pub struct OpRemoveXAttr<'b> {
    path: &'b Path,
    name: &'b OsStr,
}

impl<'b> OpRemoveXAttr<'b> {
    #[inline]
    #[must_use]
    pub const fn new(path: &'b Path, name: &'b OsStr) -> Self {
        Self { path, name }
    }

    getters!(path: &'b Path, name: &'b OsStr,);
}

declare_operation!(OpRemoveXAttr => RemoveXAttr, ());

impl Display for OpRemoveXAttr<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "removexattr: {}, name: {}",
            self.path.display(),
            self.name.to_string_lossy()
        )
    }
}
