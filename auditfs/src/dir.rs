//! Directory streams

use crate::c_str;

use std::ffi::{CStr, OsStr};
use std::io;
use std::os::unix::ffi::OsStrExt;
use std::path::Path;
use std::ptr::NonNull;

/// An open directory stream, closed when dropped
pub struct Dir(NonNull<libc::DIR>);

unsafe impl Send for Dir {}

impl Drop for Dir {
    fn drop(&mut self) {
        let dirp = self.0.as_ptr();
        unsafe {
            let _ = libc::closedir(dirp);
        }
    }
}

impl Dir {
    /// opendir(3)
    pub fn open(path: &Path) -> io::Result<Self> {
        c_str::with_path(path, |path| unsafe {
            let dirp = libc::opendir(path.as_ptr());
            match NonNull::new(dirp) {
                Some(dirp) => Ok(Self(dirp)),
                None => Err(io::Error::last_os_error()),
            }
        })
    }

    /// readdir
    pub fn entries(&mut self) -> Entries<'_> {
        Entries {
            dir: self,
            end_of_stream: false,
        }
    }
}

/// Iterator over the entries in a directory, including `.` and `..`
pub struct Entries<'a> {
    /// &'a mut Dir
    dir: &'a mut Dir,
    /// end flag
    end_of_stream: bool,
}

/// Entries returned by the [`Entries`] iterator.
pub struct DirEntry<'a> {
    /// entry
    entry: &'a libc::dirent,
}

impl DirEntry<'_> {
    /// i-number
    pub const fn ino(&self) -> u64 {
        self.entry.d_ino
    }

    /// `d_type`
    pub const fn d_type(&self) -> u8 {
        self.entry.d_type
    }

    /// get entry name
    pub fn name(&self) -> &OsStr {
        let name = unsafe { CStr::from_ptr(self.entry.d_name.as_ptr()) };
        OsStr::from_bytes(name.to_bytes())
    }
}

impl Entries<'_> {
    /// Returns the next entry.
    ///
    /// The entry borrows the stream buffer, so the next call invalidates it.
    pub fn next_entry(&mut self) -> Option<io::Result<DirEntry<'_>>> {
        if self.end_of_stream {
            return None;
        }
        unsafe {
            // readdir(3) leaves errno untouched at the end of the stream
            *libc::__errno_location() = 0;
            let entry_ptr = libc::readdir(self.dir.0.as_ptr());
            if entry_ptr.is_null() {
                self.end_of_stream = true;
                let err = io::Error::last_os_error();
                return match err.raw_os_error() {
                    Some(0) | None => None,
                    Some(_) => Some(Err(err)),
                };
            }
            Some(Ok(DirEntry { entry: &*entry_ptr }))
        }
    }
}
