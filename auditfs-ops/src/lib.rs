//! The operation contract between a path-based filesystem and its host.
//!
//! A host decodes kernel requests into the typed operations of [`ops`],
//! checks the [`OperationTable`] slot of the operation kind and calls the
//! matching [`Handler`] of a [`FileSystem`].

#![deny(
    unstable_features,
    unused_extern_crates,
    unused_import_braces,
    clippy::all,
    clippy::pedantic
)]
#![allow(
    missing_copy_implementations,
    missing_debug_implementations,
    clippy::missing_errors_doc,
    clippy::module_name_repetitions
)]

#[macro_use]
mod internal_macros;

mod context;
mod errno;
mod fs;
mod table;

pub mod ops;
pub mod types;

pub use self::context::CallContext;
pub use self::errno::Errno;
pub use self::fs::{FileSystem, Handler};
pub use self::ops::{OpKind, Operation};
pub use self::table::{Capabilities, Capability, OperationTable, Slot};
