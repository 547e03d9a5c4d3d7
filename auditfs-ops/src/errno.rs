//! Platform error codes

use std::fmt;
use std::io;

/// A platform error code returned by a failed operation
#[derive(Clone, Copy, PartialEq, Eq, Hash, thiserror::Error)]
#[error("os error {0}")]
pub struct Errno(i32);

impl Errno {
    /// Wraps a raw error code
    #[inline]
    #[must_use]
    pub const fn from_raw(raw: i32) -> Self {
        Self(raw)
    }

    /// Returns the raw error code
    #[inline]
    #[must_use]
    pub const fn as_raw(self) -> i32 {
        self.0
    }
}

impl Errno {
    pub const EEXIST: Self = Self(libc::EEXIST);
    pub const EINVAL: Self = Self(libc::EINVAL);
    pub const EIO: Self = Self(libc::EIO);
    pub const ENOENT: Self = Self(libc::ENOENT);
    pub const ENOSYS: Self = Self(libc::ENOSYS);
    pub const ENOTDIR: Self = Self(libc::ENOTDIR);
    pub const ENOTEMPTY: Self = Self(libc::ENOTEMPTY);
    pub const EOPNOTSUPP: Self = Self(libc::EOPNOTSUPP);
    pub const ERANGE: Self = Self(libc::ERANGE);
}

impl fmt::Debug for Errno {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Errno({})", self.0)
    }
}

impl From<io::Error> for Errno {
    /// Errors which carry no os error code become `EIO`
    #[inline]
    fn from(err: io::Error) -> Self {
        match err.raw_os_error() {
            Some(raw) => Self(raw),
            None if err.kind() == io::ErrorKind::InvalidInput => Self::EINVAL,
            None => Self::EIO,
        }
    }
}

impl From<Errno> for io::Error {
    #[inline]
    fn from(errno: Errno) -> Self {
        Self::from_raw_os_error(errno.0)
    }
}
