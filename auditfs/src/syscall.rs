//! Thin wrappers over the system calls forwarded by the passthrough handlers
//!
//! Every wrapper performs exactly one call and reports `errno` as an
//! [`io::Error`].

#![allow(
    clippy::as_conversions,
    clippy::cast_sign_loss,
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap
)]

use crate::c_str::{with_name, with_path};

use std::ffi::{CStr, OsStr};
use std::io;
use std::mem::MaybeUninit;
use std::os::raw::{c_int, c_void};
use std::os::unix::io::RawFd;
use std::path::Path;

/// Maps a `-1` return value to the last os error
fn check(ret: c_int) -> io::Result<()> {
    if ret < 0 {
        return Err(io::Error::last_os_error());
    }
    debug_assert_eq!(ret, 0);
    Ok(())
}

/// Maps a negative `ssize_t` return value to the last os error
fn check_size(ret: isize) -> io::Result<usize> {
    if ret < 0 {
        return Err(io::Error::last_os_error());
    }
    // a non-negative `ssize_t` value can not overflow `usize`
    Ok(ret as usize)
}

/// Calls `lstat(2)`
pub fn lstat(path: &Path) -> io::Result<libc::stat> {
    with_path(path, |path| unsafe {
        let mut stat: libc::stat = MaybeUninit::zeroed().assume_init();
        check(libc::lstat(path.as_ptr(), &mut stat))?;
        Ok(stat)
    })
}

/// Calls `access(2)`
pub fn access(path: &Path, mask: c_int) -> io::Result<()> {
    with_path(path, |path| unsafe { check(libc::access(path.as_ptr(), mask)) })
}

/// Calls `readlink(2)`, returns the number of bytes placed in `buf`
pub fn readlink(path: &Path, buf: &mut [u8]) -> io::Result<usize> {
    with_path(path, |path| unsafe {
        let ret = libc::readlink(path.as_ptr(), buf.as_mut_ptr().cast(), buf.len());
        check_size(ret)
    })
}

/// Calls `mkfifo(3)`
pub fn mkfifo(path: &Path, mode: libc::mode_t) -> io::Result<()> {
    with_path(path, |path| unsafe { check(libc::mkfifo(path.as_ptr(), mode)) })
}

/// Calls `mknod(2)`
pub fn mknod(path: &Path, mode: libc::mode_t, rdev: libc::dev_t) -> io::Result<()> {
    with_path(path, |path| unsafe {
        check(libc::mknod(path.as_ptr(), mode, rdev))
    })
}

/// Calls `mkdir(2)`
pub fn mkdir(path: &Path, mode: libc::mode_t) -> io::Result<()> {
    with_path(path, |path| unsafe { check(libc::mkdir(path.as_ptr(), mode)) })
}

/// Calls `unlink(2)`
pub fn unlink(path: &Path) -> io::Result<()> {
    with_path(path, |path| unsafe { check(libc::unlink(path.as_ptr())) })
}

/// Calls `rmdir(2)`
pub fn rmdir(path: &Path) -> io::Result<()> {
    with_path(path, |path| unsafe { check(libc::rmdir(path.as_ptr())) })
}

/// Calls `symlink(2)`, creating `path` which points to `target`
pub fn symlink(target: &Path, path: &Path) -> io::Result<()> {
    with_path(target, |target| {
        with_path(path, |path| unsafe {
            check(libc::symlink(target.as_ptr(), path.as_ptr()))
        })
    })
}

/// Calls `rename(2)`
pub fn rename(from: &Path, to: &Path) -> io::Result<()> {
    with_path(from, |from| {
        with_path(to, |to| unsafe { check(libc::rename(from.as_ptr(), to.as_ptr())) })
    })
}

/// Calls `link(2)`
pub fn link(from: &Path, to: &Path) -> io::Result<()> {
    with_path(from, |from| {
        with_path(to, |to| unsafe { check(libc::link(from.as_ptr(), to.as_ptr())) })
    })
}

/// Calls `chmod(2)`
pub fn chmod(path: &Path, mode: libc::mode_t) -> io::Result<()> {
    with_path(path, |path| unsafe { check(libc::chmod(path.as_ptr(), mode)) })
}

/// Calls `lchown(2)`
pub fn lchown(path: &Path, uid: libc::uid_t, gid: libc::gid_t) -> io::Result<()> {
    with_path(path, |path| unsafe { check(libc::lchown(path.as_ptr(), uid, gid)) })
}

/// Calls `truncate(2)`
pub fn truncate(path: &Path, size: libc::off_t) -> io::Result<()> {
    with_path(path, |path| unsafe { check(libc::truncate(path.as_ptr(), size)) })
}

/// Calls `utimensat(2)` with `AT_SYMLINK_NOFOLLOW`
pub fn lutimens(path: &Path, times: &[libc::timespec; 2]) -> io::Result<()> {
    with_path(path, |path| unsafe {
        check(libc::utimensat(
            libc::AT_FDCWD,
            path.as_ptr(),
            times.as_ptr(),
            libc::AT_SYMLINK_NOFOLLOW,
        ))
    })
}

/// Calls `pread(2)`
pub fn pread(fd: RawFd, buf: &mut [u8], offset: libc::off_t) -> io::Result<usize> {
    unsafe {
        let buf_ptr: *mut c_void = buf.as_mut_ptr().cast();
        check_size(libc::pread(fd, buf_ptr, buf.len(), offset))
    }
}

/// Calls `pwrite(2)`
pub fn pwrite(fd: RawFd, buf: &[u8], offset: libc::off_t) -> io::Result<usize> {
    unsafe {
        let buf_ptr: *const c_void = buf.as_ptr().cast();
        check_size(libc::pwrite(fd, buf_ptr, buf.len(), offset))
    }
}

/// Calls `statvfs(3)`
pub fn statvfs(path: &Path) -> io::Result<libc::statvfs> {
    with_path(path, |path| unsafe {
        let mut stat: libc::statvfs = MaybeUninit::zeroed().assume_init();
        check(libc::statvfs(path.as_ptr(), &mut stat))?;
        Ok(stat)
    })
}

/// Calls `posix_fallocate(3)`, which returns the error number instead of
/// setting `errno`
pub fn posix_fallocate(fd: RawFd, offset: libc::off_t, len: libc::off_t) -> io::Result<()> {
    let ret = unsafe { libc::posix_fallocate(fd, offset, len) };
    if ret != 0 {
        return Err(io::Error::from_raw_os_error(ret));
    }
    Ok(())
}

/// Calls `lsetxattr(2)`
pub fn lsetxattr(path: &Path, name: &OsStr, value: &[u8], flags: c_int) -> io::Result<()> {
    with_path(path, |path| {
        with_name(name, |name: &CStr| unsafe {
            let value_ptr: *const c_void = value.as_ptr().cast();
            check(libc::lsetxattr(
                path.as_ptr(),
                name.as_ptr(),
                value_ptr,
                value.len(),
                flags,
            ))
        })
    })
}

/// Calls `lgetxattr(2)`, returns the size of the value
pub fn lgetxattr(path: &Path, name: &OsStr, buf: &mut [u8]) -> io::Result<usize> {
    with_path(path, |path| {
        with_name(name, |name| unsafe {
            let buf_ptr: *mut c_void = buf.as_mut_ptr().cast();
            check_size(libc::lgetxattr(
                path.as_ptr(),
                name.as_ptr(),
                buf_ptr,
                buf.len(),
            ))
        })
    })
}

/// Calls `llistxattr(2)`, returns the size of the name list
pub fn llistxattr(path: &Path, buf: &mut [u8]) -> io::Result<usize> {
    with_path(path, |path| unsafe {
        check_size(libc::llistxattr(
            path.as_ptr(),
            buf.as_mut_ptr().cast(),
            buf.len(),
        ))
    })
}

/// Calls `lremovexattr(2)`
pub fn lremovexattr(path: &Path, name: &OsStr) -> io::Result<()> {
    with_path(path, |path| {
        with_name(name, |name| unsafe {
            check(libc::lremovexattr(path.as_ptr(), name.as_ptr()))
        })
    })
}

/// Calls `umask(2)`, returns the previous mask
pub fn umask(mask: libc::mode_t) -> libc::mode_t {
    unsafe { libc::umask(mask) }
}
