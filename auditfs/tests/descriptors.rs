//! No call may leave a descriptor open behind it.

use auditfs::{CallLog, MemoryLog, PassthroughFs};
use auditfs_ops::ops::{
    OpFallocate, OpGetAttr, OpMkNod, OpOpen, OpRead, OpReadDir, OpReadLink, OpWrite,
};
use auditfs_ops::types::FileAttr;
use auditfs_ops::{CallContext, Handler, OperationTable};

use std::ffi::OsString;
use std::fs;
use std::io;
use std::sync::Arc;

fn open_descriptors() -> io::Result<usize> {
    Ok(fs::read_dir("/proc/self/fd")?.count())
}

#[test]
fn calls_close_their_descriptors() -> io::Result<()> {
    let tmp = tempfile::tempdir()?;
    let file = tmp.path().join("file");
    let missing = tmp.path().join("missing");
    let link = tmp.path().join("link");
    std::os::unix::fs::symlink(&file, &link)?;

    let log = Arc::new(MemoryLog::new());
    let pt = PassthroughFs::new(Arc::clone(&log) as Arc<dyn CallLog>, OperationTable::default());
    let cx = CallContext::default();

    let before = open_descriptors()?;

    for _ in 0..100 {
        let _ = fs::remove_file(&file);
        pt.handle(&cx, OpMkNod::new(&file, libc::S_IFREG | 0o644, 0))
            .unwrap();
        pt.handle(&cx, OpOpen::new(&file, libc::O_RDWR)).unwrap();
        assert_eq!(pt.handle(&cx, OpWrite::new(&file, 0, b"abc")).unwrap(), 3);

        let mut buf = [0_u8; 8];
        assert_eq!(pt.handle(&cx, OpRead::new(&file, 0, &mut buf)).unwrap(), 3);
        pt.handle(&cx, OpFallocate::new(&file, 0, 0, 4096)).unwrap();

        let mut entries: Vec<(OsString, FileAttr)> = Vec::new();
        pt.handle(&cx, OpReadDir::new(tmp.path(), &mut entries))
            .unwrap();

        let mut target = [0_u8; 256];
        pt.handle(&cx, OpReadLink::new(&link, &mut target)).unwrap();
        let _ = pt.handle(&cx, OpGetAttr::new(&file)).unwrap();

        // failing calls close what they opened as well
        assert!(pt.handle(&cx, OpOpen::new(&missing, libc::O_RDONLY)).is_err());
        assert!(pt.handle(&cx, OpRead::new(&missing, 0, &mut buf)).is_err());
        assert!(pt.handle(&cx, OpWrite::new(&missing, 0, b"x")).is_err());
        assert!(pt
            .handle(&cx, OpFallocate::new(&missing, 0, 0, 4096))
            .is_err());
        assert!(pt
            .handle(&cx, OpReadDir::new(&missing, &mut entries))
            .is_err());
        assert!(pt
            .handle(&cx, OpMkNod::new(&file, libc::S_IFREG | 0o644, 0))
            .is_err());
    }

    let after = open_descriptors()?;
    assert_eq!(before, after);
    assert_eq!(log.records().len(), 100 * 14 * 2);
    Ok(())
}
