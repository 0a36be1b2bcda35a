// In-memory folder tree: arena patch steps, reload from disk, and document conversion
// The filesystem is the source of truth; these functions keep the projection in step with it

use std::collections::{HashMap, HashSet};
use std::path::Path;
use tracing::debug;

use crate::commands::common::newId;
use crate::commands::folder::sortedEntries;
use crate::error::Result;
use crate::filesystem::FileSystem;
use crate::models::{Folder, FolderItem, FolderTree, FolderTreeDocument};
use crate::paths;

// ============================================
// SERIALIZATION
// ============================================

pub fn serializeFolderTree(tree: &FolderTree) -> FolderTreeDocument {
    FolderTreeDocument {
        rootItems: tree.rootItems.clone(),
        folders: tree.folders.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
    }
}

pub fn deserializeFolderTree(doc: FolderTreeDocument) -> FolderTree {
    FolderTree {
        rootItems: doc.rootItems,
        folders: doc.folders.into_iter().collect(),
    }
}

// ============================================
// PATCH STEPS
// ============================================

fn childList<'a>(tree: &'a mut FolderTree, parentPath: Option<&str>) -> Option<&'a mut Vec<FolderItem>> {
    match parentPath {
        None => Some(&mut tree.rootItems),
        Some(p) => tree.folders.get_mut(p).map(|f| &mut f.children),
    }
}

fn rebaseItem(item: &mut FolderItem, oldPrefix: &str, newPrefix: &str) {
    if let Some(path) = paths::rebase(&item.path, oldPrefix, newPrefix) {
        item.name = paths::nameOf(&path).to_string();
        item.path = path;
    }
}

/// Substitute `oldPrefix` with `newPrefix` in every key, path, parentPath and child reference
pub fn rewritePrefix(tree: FolderTree, oldPrefix: &str, newPrefix: &str) -> FolderTree {
    let FolderTree { mut rootItems, folders } = tree;
    for item in &mut rootItems {
        rebaseItem(item, oldPrefix, newPrefix);
    }

    let folders = folders
        .into_iter()
        .map(|(key, mut folder)| {
            let key = match paths::rebase(&key, oldPrefix, newPrefix) {
                Some(newKey) => {
                    folder.name = paths::nameOf(&newKey).to_string();
                    folder.parentPath = paths::parentOf(&newKey).map(str::to_string);
                    newKey
                }
                None => key,
            };
            folder.path = key.clone();
            for child in &mut folder.children {
                rebaseItem(child, oldPrefix, newPrefix);
            }
            (key, folder)
        })
        .collect();

    FolderTree { rootItems, folders }
}

pub fn applyCreateFolder(mut tree: FolderTree, folder: Folder) -> FolderTree {
    let item = folder.asItem();
    if let Some(children) = childList(&mut tree, folder.parentPath.as_deref()) {
        children.push(item);
    }
    tree.folders.insert(folder.path.clone(), folder);
    tree
}

pub fn applyCreateProject(mut tree: FolderTree, item: FolderItem) -> FolderTree {
    if let Some(children) = childList(&mut tree, paths::parentOf(&item.path)) {
        children.push(item);
    }
    tree
}

/// Rename keeps the item's position among its siblings
pub fn applyRename(tree: FolderTree, oldPath: &str, newPath: &str) -> FolderTree {
    if oldPath == newPath {
        return tree;
    }
    rewritePrefix(tree, oldPath, newPath)
}

/// Detach from the old parent, rewrite the subtree, append under the new parent
pub fn applyMove(mut tree: FolderTree, oldPath: &str, newPath: &str) -> FolderTree {
    if oldPath == newPath {
        return tree;
    }

    let detached = childList(&mut tree, paths::parentOf(oldPath)).and_then(|children| {
        let index = children.iter().position(|c| c.path == oldPath)?;
        Some(children.remove(index))
    });

    let mut tree = rewritePrefix(tree, oldPath, newPath);

    if let Some(mut item) = detached {
        item.path = newPath.to_string();
        item.name = paths::nameOf(newPath).to_string();
        if let Some(children) = childList(&mut tree, paths::parentOf(newPath)) {
            children.push(item);
        }
    }
    tree
}

/// Drop the folder record and splice its promoted children in where it used to be
pub fn applyDelete(mut tree: FolderTree, folderPath: &str, movedItems: &[FolderItem]) -> FolderTree {
    let removed = tree.folders.remove(folderPath);
    let previousIds: HashMap<String, String> = removed
        .map(|f| f.children.into_iter().map(|c| (c.name, c.id)).collect())
        .unwrap_or_default();

    let parentPath = paths::parentOf(folderPath);
    let position = childList(&mut tree, parentPath).and_then(|children| {
        let index = children.iter().position(|c| c.path == folderPath)?;
        children.remove(index);
        Some(index)
    });

    for item in movedItems {
        let oldPath = paths::join(Some(folderPath), &item.name);
        tree = rewritePrefix(tree, &oldPath, &item.path);
    }

    let promoted: Vec<FolderItem> = movedItems
        .iter()
        .map(|item| {
            let id = tree
                .folders
                .get(&item.path)
                .map(|f| f.id.clone())
                .or_else(|| previousIds.get(&item.name).cloned())
                .unwrap_or_else(|| item.id.clone());
            FolderItem { id, ..item.clone() }
        })
        .collect();

    if let Some(children) = childList(&mut tree, parentPath) {
        let at = position.unwrap_or(children.len()).min(children.len());
        for (offset, item) in promoted.into_iter().enumerate() {
            children.insert(at + offset, item);
        }
    }
    tree
}

pub fn setExpanded(tree: &mut FolderTree, path: &str, expanded: bool) -> bool {
    match tree.folders.get_mut(path) {
        Some(folder) => {
            folder.isExpanded = expanded;
            true
        }
        None => false,
    }
}

// ============================================
// RELOAD
// ============================================

fn knownIds(previous: &FolderTree) -> HashMap<String, String> {
    let mut ids: HashMap<String, String> = previous
        .rootItems
        .iter()
        .chain(previous.folders.values().flat_map(|f| f.children.iter()))
        .map(|item| (item.path.clone(), item.id.clone()))
        .collect();
    for (path, folder) in &previous.folders {
        ids.insert(path.clone(), folder.id.clone());
    }
    ids
}

/// Rebuild the whole tree from the filesystem, keeping ids and expansion state for surviving paths
pub async fn reloadTree<F: FileSystem>(fs: &F, rootDir: &Path, previous: &FolderTree) -> Result<FolderTree> {
    let ids = knownIds(previous);
    let withId = |mut item: FolderItem| {
        item.id = ids.get(&item.path).cloned().unwrap_or_else(newId);
        item
    };

    let rootItems: Vec<FolderItem> = sortedEntries(fs, None, rootDir)
        .await?
        .into_iter()
        .map(withId)
        .collect();

    let mut folders = HashMap::new();
    let mut pending: Vec<FolderItem> = rootItems.iter().filter(|i| i.isFolder()).cloned().collect();

    while let Some(item) = pending.pop() {
        let children: Vec<FolderItem> = sortedEntries(fs, Some(&item.path), rootDir)
            .await?
            .into_iter()
            .map(withId)
            .collect();
        pending.extend(children.iter().filter(|c| c.isFolder()).cloned());

        let isExpanded = previous.folders.get(&item.path).map(|f| f.isExpanded).unwrap_or(false);
        folders.insert(
            item.path.clone(),
            Folder {
                id: item.id,
                parentPath: paths::parentOf(&item.path).map(str::to_string),
                name: item.name,
                path: item.path,
                children,
                isExpanded,
            },
        );
    }

    debug!("[reloadTree] {} root item(s), {} folder(s)", rootItems.len(), folders.len());
    Ok(FolderTree { rootItems, folders })
}

// ============================================
// CONSISTENCY
// ============================================

/// Every violation of path/key/structure agreement reachable from the root items
pub fn checkConsistency(tree: &FolderTree) -> Vec<String> {
    let mut problems = Vec::new();
    let mut visited = HashSet::new();
    let mut pending: Vec<(Option<String>, &FolderItem)> = tree.rootItems.iter().map(|i| (None, i)).collect();

    while let Some((parent, item)) = pending.pop() {
        if paths::parentOf(&item.path) != parent.as_deref() {
            problems.push(format!("{} is listed under {:?}", item.path, parent));
        }
        if paths::nameOf(&item.path) != item.name {
            problems.push(format!("{} has name '{}'", item.path, item.name));
        }
        if !item.isFolder() {
            if tree.folders.contains_key(&item.path) {
                problems.push(format!("project {} has a folder record", item.path));
            }
            continue;
        }
        if !visited.insert(item.path.clone()) {
            problems.push(format!("{} is reachable more than once", item.path));
            continue;
        }
        let Some(folder) = tree.folders.get(&item.path) else {
            problems.push(format!("{} has no folder record", item.path));
            continue;
        };
        if folder.path != item.path || folder.name != item.name {
            problems.push(format!("record for {} disagrees: {} / {}", item.path, folder.path, folder.name));
        }
        if folder.parentPath.as_deref() != paths::parentOf(&item.path) {
            problems.push(format!("{} has parentPath {:?}", item.path, folder.parentPath));
        }
        pending.extend(folder.children.iter().map(|c| (Some(item.path.clone()), c)));
    }
    problems
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::folder::tests::{mkFolder, mkProject, setup};
    use crate::commands::folder::{createFolder, deleteFolder, moveFolder, renameFolder};
    use crate::models::ItemType;

    fn folder(path: &str, children: Vec<FolderItem>) -> Folder {
        Folder {
            id: format!("id-{}", path),
            name: paths::nameOf(path).to_string(),
            path: path.to_string(),
            parentPath: paths::parentOf(path).map(str::to_string),
            children,
            isExpanded: false,
        }
    }

    fn item(path: &str, itemType: ItemType) -> FolderItem {
        FolderItem {
            itemType,
            id: format!("id-{}", path),
            name: paths::nameOf(path).to_string(),
            path: path.to_string(),
        }
    }

    /// a/{b/{deep}, site}, solo, top-project
    fn sample() -> FolderTree {
        let mut tree = FolderTree::default();
        tree.rootItems = vec![
            item("a", ItemType::Folder),
            item("solo", ItemType::Folder),
            item("top-project", ItemType::Project),
        ];
        tree.folders.insert(
            "a".into(),
            folder("a", vec![item("a/b", ItemType::Folder), item("a/site", ItemType::Project)]),
        );
        tree.folders.insert("a/b".into(), folder("a/b", vec![item("a/b/deep", ItemType::Project)]));
        tree.folders.insert("solo".into(), folder("solo", vec![]));
        tree
    }

    #[test]
    fn test_sample_is_consistent() {
        assert!(checkConsistency(&sample()).is_empty());
    }

    #[test]
    fn test_round_trip_through_json() {
        let mut tree = sample();
        tree.folders.get_mut("a/b").unwrap().isExpanded = true;

        let doc = serializeFolderTree(&tree);
        let json = serde_json::to_string_pretty(&doc).unwrap();
        let decoded: FolderTreeDocument = serde_json::from_str(&json).unwrap();
        let back = deserializeFolderTree(decoded);

        assert_eq!(back, tree);
        assert_eq!(back.rootItems, tree.rootItems);
    }

    #[test]
    fn test_document_wire_shape() {
        let json = serde_json::to_value(serializeFolderTree(&sample())).unwrap();
        assert_eq!(json["rootItems"][0]["type"], "Folder");
        assert_eq!(json["rootItems"][2]["type"], "Project");
        assert_eq!(json["folders"]["a/b"]["parentPath"], "a");
        assert!(json["folders"]["a"]["parentPath"].is_null());
        assert_eq!(json["folders"]["a"]["isExpanded"], false);
    }

    #[test]
    fn test_rewrite_prefix_cascades() {
        let tree = rewritePrefix(sample(), "a", "z");

        assert!(tree.folders.contains_key("z"));
        assert!(tree.folders.contains_key("z/b"));
        assert!(!tree.folders.contains_key("a"));
        let inner = &tree.folders["z/b"];
        assert_eq!(inner.parentPath.as_deref(), Some("z"));
        assert_eq!(inner.children[0].path, "z/b/deep");
        assert_eq!(tree.rootItems[0].name, "z");
        assert_eq!(tree.folders["z"].id, "id-a");
        assert!(checkConsistency(&tree).is_empty());
    }

    #[test]
    fn test_rewrite_prefix_respects_segment_boundary() {
        let mut tree = sample();
        tree = applyCreateFolder(tree, folder("ab", vec![]));
        let tree = rewritePrefix(tree, "a", "q");
        assert!(tree.folders.contains_key("ab"));
        assert!(tree.folders.contains_key("q"));
    }

    #[test]
    fn test_apply_rename_keeps_position() {
        let tree = applyRename(sample(), "a/b", "a/renamed");
        assert_eq!(tree.folders["a"].children[0].path, "a/renamed");
        assert_eq!(tree.folders["a/renamed"].children[0].path, "a/renamed/deep");
        assert!(checkConsistency(&tree).is_empty());
    }

    #[test]
    fn test_apply_move_between_parents() {
        let tree = applyMove(sample(), "a/b", "solo/b");
        assert_eq!(tree.folders["a"].children.len(), 1);
        assert_eq!(tree.folders["solo"].children[0].path, "solo/b");
        assert_eq!(tree.folders["solo/b"].id, "id-a/b");
        assert!(checkConsistency(&tree).is_empty());

        let tree = applyMove(tree, "solo/b", "b");
        assert_eq!(tree.rootItems.last().unwrap().path, "b");
        assert!(tree.folders["solo"].children.is_empty());
        assert!(checkConsistency(&tree).is_empty());
    }

    #[test]
    fn test_apply_move_project() {
        let tree = applyMove(sample(), "top-project", "a/b/top-project");
        assert_eq!(tree.rootItems.len(), 2);
        assert_eq!(tree.folders["a/b"].children[1].path, "a/b/top-project");
        assert!(checkConsistency(&tree).is_empty());
    }

    #[test]
    fn test_apply_delete_splices_children_into_place() {
        let moved = vec![item("b", ItemType::Folder), item("site", ItemType::Project)];
        let tree = applyDelete(sample(), "a", &moved);

        let rootPaths: Vec<_> = tree.rootItems.iter().map(|i| i.path.as_str()).collect();
        assert_eq!(rootPaths, vec!["b", "site", "solo", "top-project"]);
        assert!(!tree.folders.contains_key("a"));
        assert_eq!(tree.folders["b"].children[0].path, "b/deep");
        // ids survive promotion
        assert_eq!(tree.rootItems[0].id, "id-a/b");
        assert_eq!(tree.rootItems[1].id, "id-a/site");
        assert!(checkConsistency(&tree).is_empty());
    }

    #[test]
    fn test_check_consistency_reports_drift() {
        let mut tree = sample();
        tree.folders.remove("a/b");
        tree.folders.get_mut("solo").unwrap().parentPath = Some("x".into());
        let problems = checkConsistency(&tree);
        assert_eq!(problems.len(), 2);
    }

    #[test]
    fn test_set_expanded() {
        let mut tree = sample();
        assert!(setExpanded(&mut tree, "a/b", true));
        assert!(tree.folders["a/b"].isExpanded);
        assert!(!setExpanded(&mut tree, "top-project", true));
    }

    #[tokio::test]
    async fn test_reload_matches_filesystem_and_keeps_ids() {
        let (fs, root) = setup();
        mkFolder(&fs, &root, "a").await;
        mkFolder(&fs, &root, "a/b").await;
        mkProject(&fs, &root, "a/b/deep").await;
        mkProject(&fs, &root, "a/site").await;
        mkFolder(&fs, &root, "solo").await;
        mkProject(&fs, &root, "top-project").await;

        let mut previous = sample();
        previous.folders.get_mut("a").unwrap().isExpanded = true;

        let tree = reloadTree(&fs, &root, &previous).await.unwrap();
        assert_eq!(tree, previous);
    }

    #[tokio::test]
    async fn test_reload_keeps_folders_with_unusual_names() {
        let (fs, root) = setup();
        mkFolder(&fs, &root, "back\\slash").await;
        mkProject(&fs, &root, "back\\slash/site").await;

        let tree = reloadTree(&fs, &root, &FolderTree::default()).await.unwrap();
        assert_eq!(tree.folders["back\\slash"].children[0].path, "back\\slash/site");
    }

    #[tokio::test]
    async fn test_patched_tree_matches_reload_after_operations() {
        let (fs, root) = setup();
        let mut tree = FolderTree::default();

        for (parent, name) in [(None, "work"), (None, "home"), (Some("work"), "clients")] {
            let created = createFolder(&fs, parent, name, &root).await.unwrap();
            tree = applyCreateFolder(tree, created);
        }
        mkProject(&fs, &root, "work/clients/acme").await;
        tree = reloadTree(&fs, &root, &tree).await.unwrap();

        let renamed = renameFolder(&fs, "work", "job", &root).await.unwrap();
        tree = applyRename(tree, "work", &renamed.path);

        let newPath = moveFolder(&fs, "job/clients", Some("home"), &root).await.unwrap();
        tree = applyMove(tree, "job/clients", &newPath);

        let moved = deleteFolder(&fs, "home", &root).await.unwrap();
        tree = applyDelete(tree, "home", &moved);
        assert!(checkConsistency(&tree).is_empty());

        let reloaded = reloadTree(&fs, &root, &tree).await.unwrap();
        let keys = |t: &FolderTree| {
            let mut k: Vec<String> = t.folders.keys().cloned().collect();
            k.sort();
            k
        };
        assert_eq!(keys(&tree), keys(&reloaded));
        assert_eq!(keys(&reloaded), vec!["clients", "job"]);
        assert_eq!(reloaded.folders["clients"].id, tree.folders["clients"].id);
        assert_eq!(reloaded.folders["clients"].children[0].path, "clients/acme");
    }
}
