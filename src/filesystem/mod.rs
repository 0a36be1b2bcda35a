// Filesystem capability consumed by the folder tree operations
// Every call is a single independently-awaitable step; nothing here rolls back

mod disk;
mod memory;

pub use disk::TokioFs;
pub use memory::MemoryFs;

use std::future::Future;
use std::io;
use std::path::Path;

/// One direct entry of a directory listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub name: String,
    pub isDirectory: bool,
}

pub trait FileSystem: Send + Sync {
    fn exists(&self, path: &Path) -> impl Future<Output = io::Result<bool>> + Send;

    /// Fails if the parent directory is absent or `path` is already taken
    fn createDirectory(&self, path: &Path) -> impl Future<Output = io::Result<()>> + Send;

    /// Creates the zero-byte `.folder` marker inside `path`
    fn writeMarkerFile(&self, path: &Path) -> impl Future<Output = io::Result<()>> + Send;

    fn writeFile(&self, path: &Path, contents: &[u8]) -> impl Future<Output = io::Result<()>> + Send;

    /// Direct entries of `path`, ordered by name
    fn listEntries(&self, path: &Path) -> impl Future<Output = io::Result<Vec<DirEntry>>> + Send;

    /// Moves `oldPath` and everything under it to `newPath` in one step.
    /// Fails with NotFound when `oldPath` is absent and AlreadyExists when `newPath` is occupied.
    fn renameSubtree(&self, oldPath: &Path, newPath: &Path) -> impl Future<Output = io::Result<()>> + Send;

    /// Recursive delete
    fn removeSubtree(&self, path: &Path) -> impl Future<Output = io::Result<()>> + Send;
}
