//! The context of a call

/// The identity of the process which issued a call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallContext {
    /// user id of the requester
    uid: u32,
    /// group id of the requester
    gid: u32,
    /// process id of the requester
    pid: u32,
}

impl CallContext {
    /// Creates a [`CallContext`]
    #[inline]
    #[must_use]
    pub const fn new(uid: u32, gid: u32, pid: u32) -> Self {
        Self { uid, gid, pid }
    }

    getters!(uid: u32, gid: u32, pid: u32,);
}
