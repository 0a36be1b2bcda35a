// Project commands - projects are leaf directories marked by project.json

use std::io;
use std::path::Path;
use tracing::{info, warn};

use crate::error::{FolderError, Result};
use crate::filesystem::FileSystem;
use crate::models::{FolderItem, ItemType};
use crate::paths::{self, PROJECT_MARKER};
use super::common::{newId, now};
use super::folder::{generateUniqueName, isProjectDir, isValidMoveTarget, pathExists, relocate, requirePath};

/// Stub written into a new project's marker; the core only checks its presence
#[derive(serde::Serialize)]
struct ProjectStub<'a> {
    id: &'a str,
    name: &'a str,
    created: i64,
}

pub async fn createProject<F: FileSystem>(
    fs: &F,
    parentPath: Option<&str>,
    requestedName: &str,
    rootDir: &Path,
) -> Result<FolderItem> {
    let parentPath = parentPath.filter(|p| !p.is_empty());
    info!("[createProject] name: {}, parentPath: {:?}", requestedName, parentPath);

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
        io::ErrorKind::NotFound => FolderError::NotFound(parentPath.unwrap_or("<root>").to_string()),
        _ => FolderError::fromIo(&path, e),
    })?;

    let id = newId();
    let stub = serde_json::to_vec_pretty(&ProjectStub { id: &id, name: &finalName, created: now() })?;
    fs.writeFile(&dir.join(PROJECT_MARKER), &stub)
        .await
        .map_err(|e| FolderError::fromIo(&path, e).afterSteps(1))?;

    info!("[createProject] SUCCESS - created {}", path);
    Ok(FolderItem {
        itemType: ItemType::Project,
        id,
        name: finalName,
        path,
    })
}

/// Relocate a project; the source must carry a project marker, so folders cannot
/// slip past moveFolder's checks through here
pub async fn moveProject<F: FileSystem>(
    fs: &F,
    sourcePath: &str,
    targetPath: Option<&str>,
    rootDir: &Path,
) -> Result<String> {
    let targetPath = targetPath.filter(|p| !p.is_empty());
    info!("[moveProject] {} -> {:?}", sourcePath, targetPath);

    requirePath(sourcePath)?;
    if let Some(target) = targetPath {
        requirePath(target)?;
    }
    if !isProjectDir(fs, rootDir, sourcePath).await? {
        if !pathExists(fs, rootDir, sourcePath).await? {
            return Err(FolderError::NotFound(sourcePath.to_string()));
        }
        warn!("[moveProject] {} is not a project", sourcePath);
        return Err(FolderError::NotAProject(sourcePath.to_string()));
    }
    // A project's own subdirectories are not valid destinations either
    if !isValidMoveTarget(sourcePath, targetPath) {
        return Err(FolderError::CyclicMove {
            from: sourcePath.to_string(),
            to: targetPath.unwrap_or("<root>").to_string(),
        });
    }

    relocate(fs, sourcePath, targetPath, rootDir).await
}
