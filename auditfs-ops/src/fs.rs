//! Path based filesystem

use crate::context::CallContext;
use crate::errno::Errno;
#[allow(clippy::wildcard_imports)]
use crate::ops::*;
use crate::table::OperationTable;

/// Handles one kind of operation
pub trait Handler<O: Operation> {
    /// Performs the operation
    fn handle(&self, cx: &CallContext, op: O) -> Result<O::Reply, Errno>;
}

/// A filesystem which binds a handler to every slot of its operation table
///
/// A host must check [`FileSystem::operations`] before calling a handler and
/// answer `ENOSYS` for an unsupported slot.
pub trait FileSystem:
    Send
    + Sync
    + for<'b> Handler<OpGetAttr<'b>>
    + for<'b> Handler<OpAccess<'b>>
    + for<'b> Handler<OpReadLink<'b>>
    + for<'b> Handler<OpReadDir<'b>>
    + for<'b> Handler<OpMkNod<'b>>
    + for<'b> Handler<OpMkDir<'b>>
    + for<'b> Handler<OpUnlink<'b>>
    + for<'b> Handler<OpRmDir<'b>>
    + for<'b> Handler<OpSymLink<'b>>
    + for<'b> Handler<OpRename<'b>>
    + for<'b> Handler<OpLink<'b>>
    + for<'b> Handler<OpChmod<'b>>
    + for<'b> Handler<OpChown<'b>>
    + for<'b> Handler<OpTruncate<'b>>
    + for<'b> Handler<OpUtimens<'b>>
    + for<'b> Handler<OpOpen<'b>>
    + for<'b> Handler<OpRead<'b>>
    + for<'b> Handler<OpWrite<'b>>
    + for<'b> Handler<OpStatFs<'b>>
    + for<'b> Handler<OpFallocate<'b>>
    + for<'b> Handler<OpSetXAttr<'b>>
    + for<'b> Handler<OpGetXAttr<'b>>
    + for<'b> Handler<OpListXAttr<'b>>
    + for<'b> Handler<OpRemoveXAttr<'b>>
{
    /// The operation table of this filesystem
    fn operations(&self) -> &OperationTable;
}
