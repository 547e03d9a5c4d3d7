//! A passthrough FUSE filesystem which records every call it forwards.

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
    missing_docs,
    clippy::missing_docs_in_private_items,
    clippy::missing_errors_doc,
    clippy::module_name_repetitions
)]

mod c_str;
mod dir;
mod fd;
mod host;
mod log;
mod passthrough;
mod server;
mod syscall;

pub use self::host::{Host, InodeTable};
pub use self::log::{CallLog, FileLog, MemoryLog, Outcome, Record};
pub use self::passthrough::PassthroughFs;
pub use self::server::{Server, ServerBuilder};
pub use self::syscall::umask;
