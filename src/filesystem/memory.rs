// In-memory filesystem capability for tests and dry runs
// Paths are absolute keys; directories and files live in one ordered map

use parking_lot::RwLock;
use std::collections::{BTreeMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};

use super::{DirEntry, FileSystem};
use crate::paths::FOLDER_MARKER;

#[derive(Debug, Clone)]
enum Node {
    Dir,
    File(Vec<u8>),
}

#[derive(Debug, Default)]
pub struct MemoryFs {
    nodes: RwLock<BTreeMap<PathBuf, Node>>,
    failing: RwLock<HashSet<PathBuf>>,
}

fn notFound(path: &Path) -> io::Error {
    io::Error::new(io::ErrorKind::NotFound, format!("{} does not exist", path.display()))
}

fn alreadyExists(path: &Path) -> io::Error {
    io::Error::new(io::ErrorKind::AlreadyExists, format!("{} already exists", path.display()))
}

impl MemoryFs {
    /// Filesystem containing `root` (and its ancestors) as empty directories
    pub fn withRoot(root: &Path) -> Self {
        let fs = Self::default();
        {
            let mut nodes = fs.nodes.write();
            for ancestor in root.ancestors() {
                nodes.insert(ancestor.to_path_buf(), Node::Dir);
            }
        }
        fs
    }

    /// Make every mutating call that touches `path` fail with an I/O error
    pub fn injectFailure(&self, path: &Path) {
        self.failing.write().insert(path.to_path_buf());
    }

    /// Number of directories and files at or below `path`
    pub fn countUnder(&self, path: &Path) -> usize {
        self.nodes.read().keys().filter(|k| k.starts_with(path) && k.as_path() != path).count()
    }

    /// All paths at or below `path`, relative to it, in order
    pub fn pathsUnder(&self, path: &Path) -> Vec<String> {
        self.nodes
            .read()
            .keys()
            .filter_map(|k| k.strip_prefix(path).ok())
            .filter(|rel| !rel.as_os_str().is_empty())
            .map(|rel| rel.to_string_lossy().replace('\\', "/"))
            .collect()
    }

    pub fn readFile(&self, path: &Path) -> Option<Vec<u8>> {
        match self.nodes.read().get(path) {
            Some(Node::File(bytes)) => Some(bytes.clone()),
            _ => None,
        }
    }

    fn checkFailure(&self, path: &Path) -> io::Result<()> {
        if self.failing.read().contains(path) {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!("injected failure at {}", path.display()),
            ));
        }
        Ok(())
    }

    fn requireParentDir(nodes: &BTreeMap<PathBuf, Node>, path: &Path) -> io::Result<()> {
        let parent = path.parent().ok_or_else(|| notFound(path))?;
        match nodes.get(parent) {
            Some(Node::Dir) => Ok(()),
            _ => Err(notFound(parent)),
        }
    }
}

impl FileSystem for MemoryFs {
    async fn exists(&self, path: &Path) -> io::Result<bool> {
        Ok(self.nodes.read().contains_key(path))
    }

    async fn createDirectory(&self, path: &Path) -> io::Result<()> {
        self.checkFailure(path)?;
        let mut nodes = self.nodes.write();
        Self::requireParentDir(&nodes, path)?;
        if nodes.contains_key(path) {
            return Err(alreadyExists(path));
        }
        nodes.insert(path.to_path_buf(), Node::Dir);
        Ok(())
    }

    async fn writeMarkerFile(&self, path: &Path) -> io::Result<()> {
        self.writeFile(&path.join(FOLDER_MARKER), b"").await
    }

    async fn writeFile(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
        self.checkFailure(path)?;
        let mut nodes = self.nodes.write();
        Self::requireParentDir(&nodes, path)?;
        if let Some(Node::Dir) = nodes.get(path) {
            return Err(io::Error::new(
                io::ErrorKind::Other,
                format!("{} is a directory", path.display()),
            ));
        }
        nodes.insert(path.to_path_buf(), Node::File(contents.to_vec()));
        Ok(())
    }

    async fn listEntries(&self, path: &Path) -> io::Result<Vec<DirEntry>> {
        let nodes = self.nodes.read();
        match nodes.get(path) {
            Some(Node::Dir) => {}
            _ => return Err(notFound(path)),
        }
        // BTreeMap keys sort by components, so direct children come out name-ordered
        Ok(nodes
            .iter()
            .filter(|(k, _)| k.parent() == Some(path))
            .filter_map(|(k, node)| {
                let name = k.file_name()?.to_string_lossy().to_string();
                Some(DirEntry {
                    name,
                    isDirectory: matches!(node, Node::Dir),
                })
            })
            .collect())
    }

    async fn renameSubtree(&self, oldPath: &Path, newPath: &Path) -> io::Result<()> {
        self.checkFailure(oldPath)?;
        let mut nodes = self.nodes.write();
        if !nodes.contains_key(oldPath) {
            return Err(notFound(oldPath));
        }
        if nodes.contains_key(newPath) {
            return Err(alreadyExists(newPath));
        }
        // Same rule as rename(2): a directory cannot be moved beneath itself
        if newPath.starts_with(oldPath) {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("cannot move {} beneath itself", oldPath.display()),
            ));
        }
        Self::requireParentDir(&nodes, newPath)?;

        let moved: Vec<PathBuf> = nodes.keys().filter(|k| k.starts_with(oldPath)).cloned().collect();
        for key in moved {
            if let Some(node) = nodes.remove(&key) {
                let rest = key.strip_prefix(oldPath).map(Path::to_path_buf).unwrap_or_default();
                let target = if rest.as_os_str().is_empty() { newPath.to_path_buf() } else { newPath.join(rest) };
                nodes.insert(target, node);
            }
        }
        Ok(())
    }

    async fn removeSubtree(&self, path: &Path) -> io::Result<()> {
        self.checkFailure(path)?;
        let mut nodes = self.nodes.write();
        if !nodes.contains_key(path) {
            return Err(notFound(path));
        }
        nodes.retain(|k, _| !k.starts_with(path));
        Ok(())
    }
}
