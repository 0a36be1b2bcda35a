// Folder commands - folder tree operations over the filesystem capability
// Each operation is a sequence of filesystem calls; the in-memory tree is patched by the caller

use std::io;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::error::{FolderError, Result};
use crate::filesystem::{DirEntry, FileSystem};
use crate::models::{Folder, FolderItem, ItemType};
use crate::paths::{self, FOLDER_MARKER, PROJECT_MARKER};
use super::common::{compareNames, newId};

fn displayPath(path: Option<&str>) -> &str {
    path.unwrap_or("<root>")
}

/// Reject empty paths and any segment that could escape the root or address a hidden entry
pub(crate) fn requirePath(path: &str) -> Result<()> {
    if paths::isValidPath(path) {
        Ok(())
    } else {
        Err(FolderError::InvalidName(path.to_string()))
    }
}

pub(crate) async fn isProjectDir<F: FileSystem>(fs: &F, rootDir: &Path, path: &str) -> Result<bool> {
    fs.exists(&paths::resolve(rootDir, Some(path)).join(PROJECT_MARKER))
        .await
        .map_err(|e| FolderError::fromIo(path, e))
}

pub(crate) async fn pathExists<F: FileSystem>(fs: &F, rootDir: &Path, path: &str) -> Result<bool> {
    fs.exists(&paths::resolve(rootDir, Some(path)))
        .await
        .map_err(|e| FolderError::fromIo(path, e))
}

/// Single recursive rename of `from` (and everything under it) to `to`
pub(crate) async fn moveSubtree<F: FileSystem>(fs: &F, rootDir: &Path, from: &str, to: &str) -> Result<()> {
    debug!("[moveSubtree] {} -> {}", from, to);
    match fs
        .renameSubtree(&paths::resolve(rootDir, Some(from)), &paths::resolve(rootDir, Some(to)))
        .await
    {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            // Either the source is gone or the destination's parent is
            if pathExists(fs, rootDir, from).await? {
                Err(FolderError::NotFound(paths::parentOf(to).unwrap_or("<root>").to_string()))
            } else {
                Err(FolderError::NotFound(from.to_string()))
            }
        }
        Err(e) => Err(FolderError::fromIo(to, e)),
    }
}

/// Move `sourcePath` under `targetPath` keeping its name; a no-op when already there
pub(crate) async fn relocate<F: FileSystem>(
    fs: &F,
    sourcePath: &str,
    targetPath: Option<&str>,
    rootDir: &Path,
) -> Result<String> {
    if targetPath == paths::parentOf(sourcePath) {
        debug!("[relocate] {} already under {}, nothing to do", sourcePath, displayPath(targetPath));
        return Ok(sourcePath.to_string());
    }
    let newPath = paths::join(targetPath, paths::nameOf(sourcePath));
    moveSubtree(fs, rootDir, sourcePath, &newPath).await?;
    Ok(newPath)
}

/// Direct children in filesystem order, hidden entries and plain files skipped
pub(crate) async fn readEntries<F: FileSystem>(
    fs: &F,
    folderPath: Option<&str>,
    rootDir: &Path,
) -> Result<Vec<FolderItem>> {
    let dir = paths::resolve(rootDir, folderPath);
    let entries = fs
        .listEntries(&dir)
        .await
        .map_err(|e| FolderError::fromIo(displayPath(folderPath), e))?;

    let mut items = Vec::new();
    for entry in entries {
        if !isListed(&entry) {
            continue;
        }
        items.push(classify(fs, rootDir, folderPath, entry.name).await?);
    }
    Ok(items)
}

/// Visible directories are folders or projects; files and dot-entries are not part of the hierarchy
fn isListed(entry: &DirEntry) -> bool {
    entry.isDirectory && !entry.name.starts_with('.')
}

async fn classify<F: FileSystem>(
    fs: &F,
    rootDir: &Path,
    folderPath: Option<&str>,
    name: String,
) -> Result<FolderItem> {
    let path = paths::join(folderPath, &name);
    let itemType = if isProjectDir(fs, rootDir, &path).await? {
        ItemType::Project
    } else {
        ItemType::Folder
    };
    Ok(FolderItem {
        itemType,
        id: path.clone(),
        name,
        path,
    })
}

/// Probe `baseName`, `baseName-1`, `baseName-2`, ... until a free name is found
pub async fn generateUniqueName<F: FileSystem>(
    fs: &F,
    parentPath: Option<&str>,
    baseName: &str,
    rootDir: &Path,
) -> Result<String> {
    if !pathExists(fs, rootDir, &paths::join(parentPath, baseName)).await? {
        return Ok(baseName.to_string());
    }

    let mut suffix: u64 = 1;
    loop {
        let candidate = format!("{}-{}", baseName, suffix);
        if !pathExists(fs, rootDir, &paths::join(parentPath, &candidate)).await? {
            debug!("[generateUniqueName] '{}' taken, using '{}'", baseName, candidate);
            return Ok(candidate);
        }
        suffix += 1;
    }
}

pub async fn createFolder<F: FileSystem>(
    fs: &F,
    parentPath: Option<&str>,
    requestedName: &str,
    rootDir: &Path,
) -> Result<Folder> {
    let parentPath = parentPath.filter(|p| !p.is_empty());
    info!("[createFolder] name: {}, parentPath: {}", requestedName, displayPath(parentPath));

    if !paths::isValidName(requestedName) {
        return Err(FolderError::InvalidName(requestedName.to_string()));
    }
    if let Some(parent) = parentPath {
        requirePath(parent)?;
    }

    let finalName = generateUniqueName(fs, parentPath, requestedName, rootDir).await?;
    let path = paths::join(parentPath, &finalName);
    let dir = paths::resolve(rootDir, Some(&path));

    fs.createDirectory(&dir).await.map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => FolderError::NotFound(displayPath(parentPath).to_string()),
        _ => FolderError::fromIo(&path, e),
    })?;
    fs.writeMarkerFile(&dir)
        .await
        .map_err(|e| FolderError::fromIo(&path, e).afterSteps(1))?;

    info!("[createFolder] SUCCESS - created {}", path);
    Ok(Folder {
        id: newId(),
        name: finalName,
        path,
        parentPath: parentPath.map(str::to_string),
        children: Vec::new(),
        isExpanded: false,
    })
}

/// Rename in place; collisions are reported, never disambiguated
pub async fn renameFolder<F: FileSystem>(
    fs: &F,
    oldPath: &str,
    newName: &str,
    rootDir: &Path,
) -> Result<Folder> {
    info!("[renameFolder] {} -> '{}'", oldPath, newName);

    requirePath(oldPath)?;
    if !paths::isValidName(newName) {
        return Err(FolderError::InvalidName(newName.to_string()));
    }

    let parentPath = paths::parentOf(oldPath);
    let newPath = paths::join(parentPath, newName);

    if newPath == oldPath {
        if !pathExists(fs, rootDir, oldPath).await? {
            return Err(FolderError::NotFound(oldPath.to_string()));
        }
        debug!("[renameFolder] name unchanged");
    } else {
        moveSubtree(fs, rootDir, oldPath, &newPath).await?;
    }

    Ok(Folder {
        id: newId(),
        name: newName.to_string(),
        path: newPath,
        parentPath: parentPath.map(str::to_string),
        children: Vec::new(),
        isExpanded: false,
    })
}

/// Root (None) is always valid; self and descendants never are
pub fn isValidMoveTarget(sourcePath: &str, targetPath: Option<&str>) -> bool {
    match targetPath {
        None => true,
        Some(target) => !paths::isAncestorOrSelf(sourcePath, target),
    }
}

pub async fn moveFolder<F: FileSystem>(
    fs: &F,
    sourcePath: &str,
    targetPath: Option<&str>,
    rootDir: &Path,
) -> Result<String> {
    let targetPath = targetPath.filter(|p| !p.is_empty());
    info!("[moveFolder] {} -> {}", sourcePath, displayPath(targetPath));

    requirePath(sourcePath)?;
    if let Some(target) = targetPath {
        requirePath(target)?;
    }
    if !isValidMoveTarget(sourcePath, targetPath) {
        warn!("[moveFolder] rejected cyclic move of {} into {}", sourcePath, displayPath(targetPath));
        return Err(FolderError::CyclicMove {
            from: sourcePath.to_string(),
            to: displayPath(targetPath).to_string(),
        });
    }

    relocate(fs, sourcePath, targetPath, rootDir).await
}

/// Promote every direct entry to the parent, then remove the emptied folder
/// Only the folder marker is discarded; plain files and hidden entries move up too,
/// but the returned list holds just the folders and projects, in listing order
pub async fn deleteFolder<F: FileSystem>(fs: &F, folderPath: &str, rootDir: &Path) -> Result<Vec<FolderItem>> {
    info!("[deleteFolder] {}", folderPath);

    requirePath(folderPath)?;
    if isProjectDir(fs, rootDir, folderPath).await? {
        warn!("[deleteFolder] refusing to delete project {}", folderPath);
        return Err(FolderError::NotAFolder(folderPath.to_string()));
    }

    let dir = paths::resolve(rootDir, Some(folderPath));
    let entries = fs
        .listEntries(&dir)
        .await
        .map_err(|e| FolderError::fromIo(folderPath, e))?;
    let parentPath = paths::parentOf(folderPath);

    let mut movedItems = Vec::new();
    let mut completed = 0;
    for entry in entries {
        if entry.name == FOLDER_MARKER {
            continue;
        }
        let item = if isListed(&entry) {
            Some(classify(fs, rootDir, Some(folderPath), entry.name.clone()).await?)
        } else {
            None
        };

        let oldPath = paths::join(Some(folderPath), &entry.name);
        let newPath = paths::join(parentPath, &entry.name);
        moveSubtree(fs, rootDir, &oldPath, &newPath)
            .await
            .map_err(|e| e.afterSteps(completed))?;
        completed += 1;
        debug!("[deleteFolder] promoted {} -> {}", oldPath, newPath);

        if let Some(item) = item {
            movedItems.push(FolderItem {
                id: newPath.clone(),
                path: newPath,
                ..item
            });
        }
    }

    fs.removeSubtree(&dir)
        .await
        .map_err(|e| FolderError::fromIo(folderPath, e).afterSteps(completed))?;

    info!("[deleteFolder] SUCCESS - promoted {} item(s)", movedItems.len());
    Ok(movedItems)
}

/// Listing order shared with reload: folders first, then projects, each group in name collation order
pub(crate) async fn sortedEntries<F: FileSystem>(
    fs: &F,
    folderPath: Option<&str>,
    rootDir: &Path,
) -> Result<Vec<FolderItem>> {
    let mut items = readEntries(fs, folderPath, rootDir).await?;
    items.sort_by(|a, b| {
        b.isFolder()
            .cmp(&a.isFolder())
            .then_with(|| compareNames(&a.name, &b.name))
    });
    Ok(items)
}

pub async fn listFolderContents<F: FileSystem>(
    fs: &F,
    folderPath: Option<&str>,
    rootDir: &Path,
) -> Result<Vec<FolderItem>> {
    let folderPath = folderPath.filter(|p| !p.is_empty());
    if let Some(path) = folderPath {
        requirePath(path)?;
    }
    let items = sortedEntries(fs, folderPath, rootDir).await?;
    debug!("[listFolderContents] {}: {} item(s)", displayPath(folderPath), items.len());
    Ok(items)
}
