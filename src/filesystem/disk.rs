// Disk-backed filesystem capability using tokio::fs

use std::io;
use std::path::Path;
use tokio::fs;

use super::{DirEntry, FileSystem};
use crate::paths::FOLDER_MARKER;

#[derive(Debug, Clone, Copy, Default)]
pub struct TokioFs;

impl FileSystem for TokioFs {
    async fn exists(&self, path: &Path) -> io::Result<bool> {
        fs::try_exists(path).await
    }

    async fn createDirectory(&self, path: &Path) -> io::Result<()> {
        fs::create_dir(path).await
    }

    async fn writeMarkerFile(&self, path: &Path) -> io::Result<()> {
        fs::write(path.join(FOLDER_MARKER), b"").await
    }

    async fn writeFile(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
        fs::write(path, contents).await
    }

    async fn listEntries(&self, path: &Path) -> io::Result<Vec<DirEntry>> {
        let mut entries = Vec::new();
        let mut dir = fs::read_dir(path).await?;
        while let Some(entry) = dir.next_entry().await? {
            let isDirectory = entry.file_type().await?.is_dir();
            entries.push(DirEntry {
                name: entry.file_name().to_string_lossy().to_string(),
                isDirectory,
            });
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    async fn renameSubtree(&self, oldPath: &Path, newPath: &Path) -> io::Result<()> {
        // rename(2) silently replaces an empty target directory, so occupancy is checked first
        if !fs::try_exists(oldPath).await? {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("{} does not exist", oldPath.display()),
            ));
        }
        if fs::try_exists(newPath).await? {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("{} already exists", newPath.display()),
            ));
        }
        fs::rename(oldPath, newPath).await
    }

    async fn removeSubtree(&self, path: &Path) -> io::Result<()> {
        if fs::metadata(path).await?.is_dir() {
            fs::remove_dir_all(path).await
        } else {
            fs::remove_file(path).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_create_directory_requires_parent() {
        let tmp = TempDir::new().unwrap();
        let fs = TokioFs;

        let err = fs.createDirectory(&tmp.path().join("a/b")).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);

        fs.createDirectory(&tmp.path().join("a")).await.unwrap();
        fs.writeMarkerFile(&tmp.path().join("a")).await.unwrap();
        assert!(fs.exists(&tmp.path().join("a/.folder")).await.unwrap());
    }

    #[tokio::test]
    async fn test_list_entries_sorted_with_kinds() {
        let tmp = TempDir::new().unwrap();
        let fs = TokioFs;
        fs.createDirectory(&tmp.path().join("zeta")).await.unwrap();
        fs.createDirectory(&tmp.path().join("alpha")).await.unwrap();
        fs.writeFile(&tmp.path().join("notes.txt"), b"hi").await.unwrap();

        let entries = fs.listEntries(tmp.path()).await.unwrap();
        let names: Vec<_> = entries.iter().map(|e| (e.name.as_str(), e.isDirectory)).collect();
        assert_eq!(names, vec![("alpha", true), ("notes.txt", false), ("zeta", true)]);
    }

    #[tokio::test]
    async fn test_rename_refuses_occupied_target() {
        let tmp = TempDir::new().unwrap();
        let fs = TokioFs;
        fs.createDirectory(&tmp.path().join("a")).await.unwrap();
        fs.createDirectory(&tmp.path().join("b")).await.unwrap();

        let err = fs.renameSubtree(&tmp.path().join("a"), &tmp.path().join("b")).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::AlreadyExists);

        let err = fs.renameSubtree(&tmp.path().join("nope"), &tmp.path().join("c")).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_rename_and_remove_subtree() {
        let tmp = TempDir::new().unwrap();
        let fs = TokioFs;
        fs.createDirectory(&tmp.path().join("a")).await.unwrap();
        fs.createDirectory(&tmp.path().join("a/c")).await.unwrap();

        fs.renameSubtree(&tmp.path().join("a"), &tmp.path().join("b")).await.unwrap();
        assert!(fs.exists(&tmp.path().join("b/c")).await.unwrap());
        assert!(!fs.exists(&tmp.path().join("a")).await.unwrap());

        fs.removeSubtree(&tmp.path().join("b")).await.unwrap();
        assert!(!fs.exists(&tmp.path().join("b")).await.unwrap());
    }
}
