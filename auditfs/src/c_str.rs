//! Temporary C strings for system calls

use auditfs_ops::types::PATH_MAX;

use std::ffi::{CStr, CString, OsStr};
use std::mem::MaybeUninit;
use std::os::unix::ffi::OsStrExt;
use std::path::Path;
use std::{io, ptr, slice};

use memchr::memchr;

/// Calls `f` with a NUL terminated copy of `bytes`.
///
/// Short inputs are copied to the stack.
pub fn with_c_str<T>(bytes: &[u8], f: impl FnOnce(&CStr) -> io::Result<T>) -> io::Result<T> {
    const STACK_BUF_SIZE: usize = PATH_MAX;

    if memchr(0, bytes).is_some() {
        let err = io::Error::new(
            io::ErrorKind::InvalidInput,
            "input bytes contain an interior nul byte",
        );
        return Err(err);
    }

    if bytes.len() >= STACK_BUF_SIZE {
        let c_string = unsafe { CString::from_vec_unchecked(Vec::from(bytes)) };
        return f(&c_string);
    }

    let mut buf: MaybeUninit<[u8; STACK_BUF_SIZE]> = MaybeUninit::uninit();

    unsafe {
        let buf: *mut u8 = buf.as_mut_ptr().cast();
        ptr::copy_nonoverlapping(bytes.as_ptr(), buf, bytes.len());
        buf.add(bytes.len()).write(0);

        let bytes_with_nul = slice::from_raw_parts(buf, bytes.len().wrapping_add(1));
        let c_str = CStr::from_bytes_with_nul_unchecked(bytes_with_nul);

        f(c_str)
    }
}

#[inline]
pub fn with_path<T>(path: &Path, f: impl FnOnce(&CStr) -> io::Result<T>) -> io::Result<T> {
    with_c_str(path.as_os_str().as_bytes(), f)
}

#[inline]
pub fn with_name<T>(name: &OsStr, f: impl FnOnce(&CStr) -> io::Result<T>) -> io::Result<T> {
    with_c_str(name.as_bytes(), f)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_and_long() -> io::Result<()> {
        let short = b"/tmp/a";
        with_c_str(short, |c| {
            assert_eq!(c.to_bytes(), short);
            Ok(())
        })?;

        let long = vec![b'a'; PATH_MAX + 10];
        with_c_str(&long, |c| {
            assert_eq!(c.to_bytes(), &*long);
            Ok(())
        })?;
        Ok(())
    }

    #[test]
    fn interior_nul() {
        let err = with_c_str(b"a\0b", |_| Ok(())).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }
}
