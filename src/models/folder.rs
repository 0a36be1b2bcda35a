// Folder tree model
// Folders live in a path-keyed arena; children are path references resolved through it

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemType {
    Folder,
    Project,
}

/// A reference to something placed under a folder (or at the root)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderItem {
    #[serde(rename = "type")]
    pub itemType: ItemType,
    pub id: String,
    pub name: String,
    pub path: String,  // Full hierarchical path, last segment == name
}

impl FolderItem {
    pub fn isFolder(&self) -> bool {
        self.itemType == ItemType::Folder
    }
}

/// Directory-backed hierarchy node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Folder {
    pub id: String,
    pub name: String,
    pub path: String,
    pub parentPath: Option<String>, // None for root-level folders
    #[serde(default)]
    pub children: Vec<FolderItem>,  // Cache; listings are re-derived from disk
    #[serde(default)]
    pub isExpanded: bool,           // UI-only
}

impl Folder {
    pub fn asItem(&self) -> FolderItem {
        FolderItem {
            itemType: ItemType::Folder,
            id: self.id.clone(),
            name: self.name.clone(),
            path: self.path.clone(),
        }
    }
}

/// Full hierarchy: ordered root items plus the folder arena keyed by path
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FolderTree {
    pub rootItems: Vec<FolderItem>,
    pub folders: HashMap<String, Folder>,
}

/// Plain persisted form of a FolderTree
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderTreeDocument {
    #[serde(default)]
    pub rootItems: Vec<FolderItem>,
    #[serde(default)]
    pub folders: BTreeMap<String, Folder>,
}

/// One search hit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectMatch {
    pub project: FolderItem,
    pub folderPath: String, // Containing folder (empty string for root)
    pub matchedText: String,
}
