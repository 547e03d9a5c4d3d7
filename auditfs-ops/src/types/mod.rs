//! Value types shared by operations and replies

mod attr;
mod file;

pub use self::attr::{system_time, FileAttr, StatFs, Timestamp};
pub use self::file::{FileType, StMode, PERMISSION_MASK};

#[allow(clippy::cast_sign_loss)]
pub const PATH_MAX: usize = libc::PATH_MAX as usize;

#[allow(clippy::assertions_on_constants)]
#[test]
fn path_max() {
    use std::convert::TryFrom;
    assert!(usize::try_from(libc::PATH_MAX).is_ok());
    assert!(libc::PATH_MAX >= 1024 && libc::PATH_MAX <= 8192);
}
