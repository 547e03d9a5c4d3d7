//! Inode numbers handed to the kernel

use std::collections::HashMap;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use fuser::FUSE_ROOT_ID;

#[derive(Debug)]
struct Node {
    path: PathBuf,
    /// references held by the kernel
    lookups: u64,
}

/// Maps inode numbers to the paths they were looked up at
#[derive(Debug)]
pub struct InodeTable {
    nodes: HashMap<u64, Node>,
    by_path: HashMap<PathBuf, u64>,
    next_ino: u64,
}

impl Default for InodeTable {
    fn default() -> Self {
        Self::new()
    }
}

impl InodeTable {
    /// Creates a table holding only the root node at `/`
    #[must_use]
    pub fn new() -> Self {
        let root = PathBuf::from("/");
        let mut nodes = HashMap::new();
        let mut by_path = HashMap::new();
        let _ = by_path.insert(root.clone(), FUSE_ROOT_ID);
        let _ = nodes.insert(
            FUSE_ROOT_ID,
            Node {
                path: root,
                lookups: 1,
            },
        );
        Self {
            nodes,
            by_path,
            next_ino: FUSE_ROOT_ID.wrapping_add(1),
        }
    }

    /// The path of `ino`
    #[must_use]
    pub fn path(&self, ino: u64) -> Option<&Path> {
        self.nodes.get(&ino).map(|node| node.path.as_path())
    }

    /// The path of the entry `name` in the directory `parent`
    #[must_use]
    pub fn child(&self, parent: u64, name: &OsStr) -> Option<PathBuf> {
        self.path(parent).map(|dir| dir.join(name))
    }

    /// Records one kernel reference to `path` and returns its inode number
    pub fn remember(&mut self, path: PathBuf) -> u64 {
        if let Some(&ino) = self.by_path.get(&path) {
            if let Some(node) = self.nodes.get_mut(&ino) {
                node.lookups = node.lookups.wrapping_add(1);
                return ino;
            }
        }

        let ino = self.next_ino;
        self.next_ino = self.next_ino.wrapping_add(1);
        let _ = self.by_path.insert(path.clone(), ino);
        let _ = self.nodes.insert(ino, Node { path, lookups: 1 });
        ino
    }

    /// Drops `nlookup` kernel references to `ino`
    pub fn forget(&mut self, ino: u64, nlookup: u64) {
        if ino == FUSE_ROOT_ID {
            return;
        }
        let node = match self.nodes.get_mut(&ino) {
            Some(node) => node,
            None => return,
        };
        node.lookups = node.lookups.saturating_sub(nlookup);
        if node.lookups > 0 {
            return;
        }
        if let Some(node) = self.nodes.remove(&ino) {
            if self.by_path.get(&node.path) == Some(&ino) {
                let _ = self.by_path.remove(&node.path);
            }
        }
    }

    /// Drops the mapping of a removed path
    pub fn remove(&mut self, path: &Path) {
        let _ = self.by_path.remove(path);
    }

    /// Moves `from` and every path below it to `to`
    pub fn rename(&mut self, from: &Path, to: &Path) {
        // an overwritten destination is no longer reachable by path
        self.remove(to);

        let moved: Vec<(PathBuf, u64)> = self
            .by_path
            .iter()
            .filter(|(path, _)| path.starts_with(from))
            .map(|(path, &ino)| (path.clone(), ino))
            .collect();

        for (old, ino) in moved {
            let _ = self.by_path.remove(&old);
            let new = match old.strip_prefix(from) {
                Ok(rest) if rest.as_os_str().is_empty() => to.to_owned(),
                Ok(rest) => to.join(rest),
                Err(_) => continue,
            };
            if let Some(node) = self.nodes.get_mut(&ino) {
                node.path = new.clone();
            }
            let _ = self.by_path.insert(new, ino);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_is_always_known() {
        let mut table = InodeTable::new();
        assert_eq!(table.path(FUSE_ROOT_ID), Some(Path::new("/")));
        table.forget(FUSE_ROOT_ID, 100);
        assert_eq!(table.path(FUSE_ROOT_ID), Some(Path::new("/")));
        assert_eq!(
            table.child(FUSE_ROOT_ID, OsStr::new("etc")),
            Some(PathBuf::from("/etc"))
        );
        assert_eq!(table.child(42, OsStr::new("etc")), None);
    }

    #[test]
    fn lookups_are_counted() {
        let mut table = InodeTable::new();
        let a = table.remember(PathBuf::from("/a"));
        assert_ne!(a, FUSE_ROOT_ID);
        assert_eq!(table.remember(PathBuf::from("/a")), a);

        table.forget(a, 1);
        assert_eq!(table.path(a), Some(Path::new("/a")));
        table.forget(a, 1);
        assert_eq!(table.path(a), None);

        let b = table.remember(PathBuf::from("/a"));
        assert_ne!(a, b);
    }

    #[test]
    fn removed_path_gets_a_new_inode() {
        let mut table = InodeTable::new();
        let a = table.remember(PathBuf::from("/a"));
        table.remove(Path::new("/a"));
        // the kernel may still hold the old inode
        assert_eq!(table.path(a), Some(Path::new("/a")));

        let b = table.remember(PathBuf::from("/a"));
        assert_ne!(a, b);
        table.forget(a, 1);
        assert_eq!(table.path(b), Some(Path::new("/a")));
    }

    #[test]
    fn rename_moves_subtree() {
        let mut table = InodeTable::new();
        let dir = table.remember(PathBuf::from("/d"));
        let file = table.remember(PathBuf::from("/d/f"));
        let deep = table.remember(PathBuf::from("/d/s/g"));
        let sibling = table.remember(PathBuf::from("/dd"));

        table.rename(Path::new("/d"), Path::new("/e"));
        assert_eq!(table.path(dir), Some(Path::new("/e")));
        assert_eq!(table.path(file), Some(Path::new("/e/f")));
        assert_eq!(table.path(deep), Some(Path::new("/e/s/g")));
        assert_eq!(table.path(sibling), Some(Path::new("/dd")));
        assert_eq!(table.remember(PathBuf::from("/e/f")), file);
    }

    #[test]
    fn rename_over_existing() {
        let mut table = InodeTable::new();
        let a = table.remember(PathBuf::from("/a"));
        let b = table.remember(PathBuf::from("/b"));

        table.rename(Path::new("/a"), Path::new("/b"));
        assert_eq!(table.remember(PathBuf::from("/b")), a);
        assert_ne!(table.remember(PathBuf::from("/a")), a);

        // the overwritten node keeps its stale path until forgotten
        assert_eq!(table.path(b), Some(Path::new("/b")));
        table.forget(b, 1);
        assert_eq!(table.remember(PathBuf::from("/b")), a);
    }
}
