//! Scoped file descriptors

use crate::c_str;

use std::io;
use std::os::raw::c_int;
use std::os::unix::io::{AsRawFd, RawFd};
use std::path::Path;

/// A file descriptor which is closed when dropped
#[derive(Debug)]
pub struct FileDesc(RawFd);

impl FileDesc {
    /// Calls `open(2)`
    pub fn open(path: &Path, flags: c_int, mode: libc::mode_t) -> io::Result<Self> {
        c_str::with_path(path, |path| unsafe {
            let ret: c_int = libc::open(path.as_ptr(), flags, mode);
            if ret < 0 {
                return Err(io::Error::last_os_error());
            }
            Ok(Self(ret))
        })
    }
}

impl Drop for FileDesc {
    #[inline]
    fn drop(&mut self) {
        unsafe {
            let ret = libc::close(self.0);
            debug_assert_eq!(ret, 0);
        }
    }
}

impl AsRawFd for FileDesc {
    #[inline]
    fn as_raw_fd(&self) -> RawFd {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_missing() {
        let dir = tempfile::tempdir().unwrap();
        let err = FileDesc::open(&dir.path().join("missing"), libc::O_RDONLY, 0).unwrap_err();
        assert_eq!(err.raw_os_error(), Some(libc::ENOENT));
    }

    #[test]
    fn open_existing() -> io::Result<()> {
        let dir = tempfile::tempdir()?;
        let fd = FileDesc::open(dir.path(), libc::O_RDONLY | libc::O_DIRECTORY, 0)?;
        assert!(fd.as_raw_fd() >= 0);
        Ok(())
    }
}
