//! The operation table
//!
//! Every [`OpKind`] owns one slot. The slots of optional operations are
//! filled according to the [`Capabilities`] detected at startup, so a host
//! can tell an operation the filesystem does not provide from one which
//! failed.

use crate::ops::OpKind;

use std::fmt;

/// A platform feature some operations depend on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// `utimensat(2)` with nanosecond timestamps
    Utimens,
    /// `posix_fallocate(3)`
    Fallocate,
    /// extended attributes
    XAttr,
}

/// The set of available capabilities
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    pub utimens: bool,
    pub fallocate: bool,
    pub xattr: bool,
}

impl Capabilities {
    /// Detects the capabilities of the target platform
    #[must_use]
    pub const fn detect() -> Self {
        Self {
            utimens: cfg!(any(target_os = "linux", target_os = "freebsd")),
            fallocate: cfg!(any(target_os = "linux", target_os = "freebsd")),
            xattr: cfg!(target_os = "linux"),
        }
    }

    #[must_use]
    pub const fn has(&self, cap: Capability) -> bool {
        match cap {
            Capability::Utimens => self.utimens,
            Capability::Fallocate => self.fallocate,
            Capability::XAttr => self.xattr,
        }
    }

    /// Removes a capability
    #[must_use]
    pub const fn without(mut self, cap: Capability) -> Self {
        match cap {
            Capability::Utimens => self.utimens = false,
            Capability::Fallocate => self.fallocate = false,
            Capability::XAttr => self.xattr = false,
        }
        self
    }
}

/// The state of one slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    /// a handler is bound to the slot
    Supported,
    /// the slot is empty, calls must be answered with `ENOSYS`
    Unsupported,
}

/// One slot per operation kind
#[derive(Clone, PartialEq, Eq)]
pub struct OperationTable {
    /// indexed by [`OpKind::index`]
    slots: [Slot; OpKind::COUNT],
}

impl OperationTable {
    /// Builds the table from the given capabilities
    #[must_use]
    pub fn new(caps: Capabilities) -> Self {
        let mut slots = [Slot::Unsupported; OpKind::COUNT];
        for &kind in OpKind::ALL.iter() {
            let available = match kind.capability() {
                None => true,
                Some(cap) => caps.has(cap),
            };
            if available {
                slots[kind.index()] = Slot::Supported;
            }
        }
        Self { slots }
    }

    #[inline]
    #[must_use]
    pub const fn slot(&self, kind: OpKind) -> Slot {
        self.slots[kind.index()]
    }

    #[inline]
    #[must_use]
    pub const fn supports(&self, kind: OpKind) -> bool {
        matches!(self.slot(kind), Slot::Supported)
    }

    /// Iterates over all slots in table order
    pub fn iter(&self) -> impl Iterator<Item = (OpKind, Slot)> + '_ {
        OpKind::ALL.iter().map(move |&kind| (kind, self.slot(kind)))
    }
}

impl Default for OperationTable {
    #[inline]
    fn default() -> Self {
        Self::new(Capabilities::detect())
    }
}

impl fmt::Debug for OperationTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}
