use tracing::warn;

use crate::commands::{folder, project, search};
use crate::error::{FolderError, Result};
use crate::filesystem::FileSystem;
use crate::models::{Folder, FolderItem, FolderTree, FolderTreeDocument, ProjectMatch};
use crate::storage::Storage;
use crate::tree::{self, serializeFolderTree};

// ============================================
// Helpers
// ============================================

/// A partial failure leaves disk and tree out of step; re-derive the tree before reporting it
async fn resyncOnPartial<F: FileSystem, T>(storage: &Storage<F>, result: Result<T>) -> Result<T> {
    if let Err(FolderError::PartialFailure { completed, .. }) = &result {
        warn!("[resync] partial failure after {} step(s), reloading tree", completed);
        if let Err(e) = storage.refresh().await {
            warn!("[resync] reload failed: {}", e);
        }
    }
    result
}

/// Replace filesystem-derived ids with the tree's stable ones where known
fn withTreeIds(tree: &FolderTree, items: Vec<FolderItem>) -> Vec<FolderItem> {
    items
        .into_iter()
        .map(|mut item| {
            if let Some(f) = tree.folders.get(&item.path) {
                item.id = f.id.clone();
            } else if let Some(known) = tree
                .rootItems
                .iter()
                .chain(tree.folders.values().flat_map(|f| f.children.iter()))
                .find(|c| c.path == item.path)
            {
                item.id = known.id.clone();
            }
            item
        })
        .collect()
}

// ============================================
// Tree API
// ============================================

pub fn get_tree<F: FileSystem>(storage: &Storage<F>) -> FolderTreeDocument {
    serializeFolderTree(&storage.tree.read())
}

pub async fn refresh_tree<F: FileSystem>(storage: &Storage<F>) -> Result<FolderTreeDocument> {
    let _guard = storage.lockOps().await;
    let tree = storage.refresh().await?;
    Ok(serializeFolderTree(&tree))
}

pub async fn set_expanded<F: FileSystem>(storage: &Storage<F>, path: &str, expanded: bool) -> Result<()> {
    let _guard = storage.lockOps().await;
    let found = tree::setExpanded(&mut storage.tree.write(), path, expanded);
    if !found {
        return Err(FolderError::NotFound(path.to_string()));
    }
    storage.persist().await
}

// ============================================
// Folders API
// ============================================

pub async fn list_folder_contents<F: FileSystem>(storage: &Storage<F>, folder_path: Option<&str>) -> Result<Vec<FolderItem>> {
    let items = folder::listFolderContents(&storage.fs, folder_path, &storage.rootDir()).await?;
    Ok(withTreeIds(&storage.tree.read(), items))
}

pub async fn create_folder<F: FileSystem>(storage: &Storage<F>, name: &str, parent_path: Option<&str>) -> Result<Folder> {
    let _guard = storage.lockOps().await;
    let created = folder::createFolder(&storage.fs, parent_path, name, &storage.rootDir()).await;
    let created = resyncOnPartial(storage, created).await?;

    storage.updateTree(|t| tree::applyCreateFolder(t, created.clone()));
    storage.persist().await?;
    Ok(created)
}

pub async fn rename_folder<F: FileSystem>(storage: &Storage<F>, path: &str, new_name: &str) -> Result<Folder> {
    let _guard = storage.lockOps().await;
    let renamed = folder::renameFolder(&storage.fs, path, new_name, &storage.rootDir()).await?;

    storage.updateTree(|t| tree::applyRename(t, path, &renamed.path));
    storage.persist().await?;

    // The arena record keeps the folder's id, children and expansion state
    Ok(storage.tree.read().folders.get(&renamed.path).cloned().unwrap_or(renamed))
}

pub async fn move_folder<F: FileSystem>(storage: &Storage<F>, path: &str, target_path: Option<&str>) -> Result<String> {
    let _guard = storage.lockOps().await;
    let newPath = folder::moveFolder(&storage.fs, path, target_path, &storage.rootDir()).await?;

    storage.updateTree(|t| tree::applyMove(t, path, &newPath));
    storage.persist().await?;
    Ok(newPath)
}

pub async fn delete_folder<F: FileSystem>(storage: &Storage<F>, path: &str) -> Result<Vec<FolderItem>> {
    let _guard = storage.lockOps().await;
    let moved = folder::deleteFolder(&storage.fs, path, &storage.rootDir()).await;
    let moved = resyncOnPartial(storage, moved).await?;

    storage.updateTree(|t| tree::applyDelete(t, path, &moved));
    storage.persist().await?;
    Ok(withTreeIds(&storage.tree.read(), moved))
}

// ============================================
// Projects API
// ============================================

pub async fn create_project<F: FileSystem>(storage: &Storage<F>, name: &str, parent_path: Option<&str>) -> Result<FolderItem> {
    let _guard = storage.lockOps().await;
    let created = project::createProject(&storage.fs, parent_path, name, &storage.rootDir()).await;
    let created = resyncOnPartial(storage, created).await?;

    storage.updateTree(|t| tree::applyCreateProject(t, created.clone()));
    storage.persist().await?;
    Ok(created)
}

pub async fn move_project<F: FileSystem>(storage: &Storage<F>, path: &str, target_path: Option<&str>) -> Result<String> {
    let _guard = storage.lockOps().await;
    let newPath = project::moveProject(&storage.fs, path, target_path, &storage.rootDir()).await?;

    storage.updateTree(|t| tree::applyMove(t, path, &newPath));
    storage.persist().await?;
    Ok(newPath)
}

pub async fn search_projects<F: FileSystem>(storage: &Storage<F>, query: &str) -> Result<Vec<ProjectMatch>> {
    let matches = search::searchProjects(&storage.fs, query, &storage.rootDir()).await?;
    let tree = storage.tree.read();
    Ok(matches
        .into_iter()
        .map(|mut m| {
            m.project = withTreeIds(&tree, vec![m.project]).remove(0);
            m
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::folder::tests::mkProject;
    use crate::filesystem::MemoryFs;
    use crate::models::Settings;
    use crate::tree::checkConsistency;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn storageIn(tmp: &TempDir) -> Storage<MemoryFs> {
        let root = PathBuf::from("/projects");
        let mut settings = Settings::defaultsFor(tmp.path(), tmp.path());
        settings.rootDir = root.clone();
        Storage::new(MemoryFs::withRoot(&root), settings, FolderTree::default())
    }

    #[tokio::test]
    async fn test_operations_keep_tree_consistent_and_persisted() {
        let tmp = TempDir::new().unwrap();
        let storage = storageIn(&tmp);

        let work = create_folder(&storage, "work", None).await.unwrap();
        create_folder(&storage, "archive", None).await.unwrap();
        create_folder(&storage, "clients", Some("work")).await.unwrap();
        create_project(&storage, "acme", Some("work/clients")).await.unwrap();

        let renamed = rename_folder(&storage, "work", "job").await.unwrap();
        assert_eq!(renamed.id, work.id);
        assert_eq!(renamed.children[0].path, "job/clients");

        assert_eq!(move_folder(&storage, "job/clients", Some("archive")).await.unwrap(), "archive/clients");
        assert_eq!(move_project(&storage, "archive/clients/acme", None).await.unwrap(), "acme");

        let moved = delete_folder(&storage, "archive").await.unwrap();
        assert_eq!(moved.len(), 1);
        assert_eq!(moved[0].path, "clients");

        let tree = storage.snapshot();
        assert!(checkConsistency(&tree).is_empty());

        let treePath = storage.settings.read().treePath.clone();
        let doc = crate::storage::loadTreeDocument(&treePath).await.unwrap();
        assert_eq!(doc, serializeFolderTree(&tree));

        let reloaded = refresh_tree(&storage).await.unwrap();
        assert_eq!(reloaded.folders.keys().cloned().collect::<Vec<_>>(), vec!["clients", "job"]);
    }

    #[tokio::test]
    async fn test_cyclic_move_leaves_everything_untouched() {
        let tmp = TempDir::new().unwrap();
        let storage = storageIn(&tmp);
        create_folder(&storage, "a", None).await.unwrap();
        create_folder(&storage, "b", Some("a")).await.unwrap();
        let before = storage.snapshot();

        let err = move_folder(&storage, "a", Some("a/b")).await.unwrap_err();
        assert!(matches!(err, FolderError::CyclicMove { .. }));
        assert_eq!(storage.snapshot(), before);
    }

    #[tokio::test]
    async fn test_refused_operations_leave_disk_and_tree_alone() {
        let tmp = TempDir::new().unwrap();
        let storage = storageIn(&tmp);
        create_folder(&storage, "a", None).await.unwrap();
        create_folder(&storage, "b", Some("a")).await.unwrap();
        create_project(&storage, "site", None).await.unwrap();
        let before = storage.snapshot();

        assert!(matches!(delete_folder(&storage, "site").await, Err(FolderError::NotAFolder(_))));
        assert!(matches!(delete_folder(&storage, "").await, Err(FolderError::InvalidName(_))));
        assert!(matches!(move_project(&storage, "a", Some("a/b")).await, Err(FolderError::NotAProject(_))));
        assert!(matches!(move_folder(&storage, "a", Some("../x")).await, Err(FolderError::InvalidName(_))));

        assert_eq!(storage.snapshot(), before);
        assert!(storage.fs.exists(&storage.rootDir().join("site/project.json")).await.unwrap());
    }

    #[tokio::test]
    async fn test_partial_failure_resyncs_tree() {
        let tmp = TempDir::new().unwrap();
        let storage = storageIn(&tmp);
        create_folder(&storage, "d", None).await.unwrap();
        mkProject(&storage.fs, &storage.rootDir(), "d/one").await;
        mkProject(&storage.fs, &storage.rootDir(), "d/two").await;
        storage.fs.injectFailure(&storage.rootDir().join("d/two"));

        let err = delete_folder(&storage, "d").await.unwrap_err();
        assert!(matches!(err, FolderError::PartialFailure { completed: 1, .. }));

        let tree = storage.snapshot();
        let rootPaths: Vec<_> = tree.rootItems.iter().map(|i| i.path.as_str()).collect();
        assert_eq!(rootPaths, vec!["d", "one"]);
        assert_eq!(tree.folders["d"].children[0].path, "d/two");
    }

    #[tokio::test]
    async fn test_listing_and_search_use_tree_ids() {
        let tmp = TempDir::new().unwrap();
        let storage = storageIn(&tmp);
        let folder = create_folder(&storage, "Sites", None).await.unwrap();
        let project = create_project(&storage, "Homepage", Some("Sites")).await.unwrap();

        let root = list_folder_contents(&storage, None).await.unwrap();
        assert_eq!(root[0].id, folder.id);

        let hits = search_projects(&storage, "PAGE").await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].project.id, project.id);
        assert_eq!(hits[0].folderPath, "Sites");
        assert_eq!(hits[0].matchedText, "page");
    }

    #[tokio::test]
    async fn test_set_expanded_persists() {
        let tmp = TempDir::new().unwrap();
        let storage = storageIn(&tmp);
        create_folder(&storage, "a", None).await.unwrap();

        set_expanded(&storage, "a", true).await.unwrap();
        assert!(get_tree(&storage).folders["a"].isExpanded);
        assert!(matches!(set_expanded(&storage, "zzz", true).await, Err(FolderError::NotFound(_))));
    }
}
