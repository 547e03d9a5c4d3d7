//! File types and mode bits

/// The type of a file, as reported by a directory entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    Unknown,
    NamedPipe,
    CharacterDevice,
    Directory,
    BlockDevice,
    Regular,
    SymbolicLink,
    Socket,
}

impl FileType {
    /// Converts a `d_type` value. Values the platform does not define map to
    /// [`FileType::Unknown`].
    #[inline]
    #[must_use]
    pub const fn from_raw(d_type: u8) -> Self {
        match d_type {
            libc::DT_FIFO => Self::NamedPipe,
            libc::DT_CHR => Self::CharacterDevice,
            libc::DT_DIR => Self::Directory,
            libc::DT_BLK => Self::BlockDevice,
            libc::DT_REG => Self::Regular,
            libc::DT_LNK => Self::SymbolicLink,
            libc::DT_SOCK => Self::Socket,
            _ => Self::Unknown,
        }
    }
}

/// The permission bits of a mode, including set-id and sticky bits
pub const PERMISSION_MASK: u32 = 0o7777;

/// An `st_mode` value: file type bits and permission bits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StMode(u32);

impl StMode {
    #[inline]
    #[must_use]
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    #[inline]
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn file_type(self) -> FileType {
        FileType::from_raw((self.0 >> 12) as u8 & 0o17)
    }

    #[inline]
    #[must_use]
    pub const fn permissions(self) -> u32 {
        self.0 & PERMISSION_MASK
    }

    /// Returns `true` for the `S_IFREG` type
    #[inline]
    #[must_use]
    pub const fn is_regular(self) -> bool {
        self.0 & libc::S_IFMT == libc::S_IFREG
    }

    /// Returns `true` for the `S_IFIFO` type
    #[inline]
    #[must_use]
    pub const fn is_fifo(self) -> bool {
        self.0 & libc::S_IFMT == libc::S_IFIFO
    }
}
