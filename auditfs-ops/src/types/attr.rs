//! File and filesystem attributes

use super::file::{FileType, StMode};

use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// File attributes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileAttr {
    pub ino: u64,
    pub size: u64,
    pub blocks: u64,
    pub atime: SystemTime,
    pub mtime: SystemTime,
    pub ctime: SystemTime,
    pub mode: u32,
    pub nlink: u64,
    pub uid: u32,
    pub gid: u32,
    pub rdev: u64,
    pub blksize: u32,
}

impl Default for FileAttr {
    #[inline]
    fn default() -> Self {
        Self {
            ino: 0,
            size: 0,
            blocks: 0,
            atime: UNIX_EPOCH,
            mtime: UNIX_EPOCH,
            ctime: UNIX_EPOCH,
            mode: 0,
            nlink: 0,
            uid: 0,
            gid: 0,
            rdev: 0,
            blksize: 0,
        }
    }
}

impl FileAttr {
    #[inline]
    #[must_use]
    pub const fn st_mode(&self) -> StMode {
        StMode::from_raw(self.mode)
    }

    #[inline]
    #[must_use]
    pub const fn file_type(&self) -> FileType {
        self.st_mode().file_type()
    }
}

/// Converts a `(seconds, nanoseconds)` pair since the epoch
#[must_use]
pub fn system_time(sec: i64, nsec: i64) -> SystemTime {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let nsec = nsec.max(0).min(999_999_999) as u32;
    if sec >= 0 {
        #[allow(clippy::cast_sign_loss)]
        let sec = sec as u64;
        UNIX_EPOCH + Duration::new(sec, nsec)
    } else {
        UNIX_EPOCH - Duration::from_secs(sec.unsigned_abs()) + Duration::from_nanos(u64::from(nsec))
    }
}

/// Filesystem statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatFs {
    pub blocks: u64,
    pub bfree: u64,
    pub bavail: u64,
    pub files: u64,
    pub ffree: u64,
    pub bsize: u32,
    pub namelen: u32,
    pub frsize: u32,
}

/// One timestamp of a `utimens` call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timestamp {
    /// set to the current time
    Now,
    /// leave unchanged
    Omit,
    /// set to the given time
    At(SystemTime),
}
