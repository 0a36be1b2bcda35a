// Storage layer: global config, persisted tree document, and shared state
// The tree document is a projection of the root directory; the directory stays authoritative

use parking_lot::RwLock;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};
use tracing::{info, warn};

use crate::error::{FolderError, Result};
use crate::filesystem::{FileSystem, TokioFs};
use crate::models::{FolderTree, FolderTreeDocument, Settings};
use crate::tree::{deserializeFolderTree, reloadTree, serializeFolderTree};

// ============================================
// PATH HELPERS
// ============================================

/// Global config directory (~/.project-folders/)
pub fn globalConfigDir() -> Result<PathBuf> {
    let home = dirs::home_dir().ok_or_else(|| FolderError::Config("Failed to get home directory".into()))?;
    Ok(home.join(".project-folders"))
}

/// Global config file path
pub fn globalConfigPath() -> Result<PathBuf> {
    Ok(globalConfigDir()?.join("config.md"))
}

// ============================================
// FRONTMATTER PARSING
// ============================================

/// Parse YAML frontmatter from markdown content
pub fn parseFrontmatter<T: serde::de::DeserializeOwned>(content: &str) -> Option<(T, String)> {
    let content = content.trim();
    let rest = content.strip_prefix("---")?;
    let end = rest.find("\n---")?;
    let yaml = rest[..end].trim();
    let body = rest[end + 4..].trim().to_string();

    let frontmatter: T = serde_yaml::from_str(yaml).ok()?;
    Some((frontmatter, body))
}

/// Serialize frontmatter + body to markdown
pub fn toMarkdown<T: serde::Serialize>(frontmatter: &T, body: &str) -> Result<String> {
    let yaml = serde_yaml::to_string(frontmatter)
        .map_err(|e| FolderError::Config(format!("YAML error: {}", e)))?;
    Ok(format!("---\n{}---\n\n{}", yaml, body))
}

// ============================================
// GLOBAL CONFIG
// ============================================

fn defaultSettings() -> Result<Settings> {
    let home = dirs::home_dir().ok_or_else(|| FolderError::Config("Failed to get home directory".into()))?;
    Ok(Settings::defaultsFor(&home, &globalConfigDir()?))
}

pub fn loadSettings() -> Result<Settings> {
    loadSettingsFrom(&globalConfigPath()?, defaultSettings()?)
}

/// Settings from a config.md, or `defaults` when it is missing or unreadable
pub fn loadSettingsFrom(path: &Path, defaults: Settings) -> Result<Settings> {
    if !path.exists() {
        info!("[loadSettings] {:?} does not exist, using defaults", path);
        return Ok(defaults);
    }

    let content = fs::read_to_string(path).map_err(|e| FolderError::Io {
        path: path.to_string_lossy().to_string(),
        source: e,
    })?;

    match parseFrontmatter::<Settings>(&content) {
        Some((settings, _)) => {
            info!("[loadSettings] rootDir: {:?}", settings.rootDir);
            Ok(settings)
        }
        None => {
            warn!("[loadSettings] Failed to parse frontmatter in {:?}, using defaults", path);
            Ok(defaults)
        }
    }
}

pub fn saveSettings(path: &Path, settings: &Settings) -> Result<()> {
    let ioErr = |e: io::Error| FolderError::Io {
        path: path.to_string_lossy().to_string(),
        source: e,
    };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(ioErr)?;
    }
    let content = toMarkdown(settings, "# Project folders\n\nFolder tree manager configuration.\n")?;
    fs::write(path, content).map_err(ioErr)
}

// ============================================
// TREE DOCUMENT
// ============================================

pub async fn loadTreeDocument(path: &Path) -> Result<FolderTreeDocument> {
    match tokio::fs::read_to_string(path).await {
        Ok(content) => Ok(serde_json::from_str(&content)?),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(FolderTreeDocument::default()),
        Err(e) => Err(FolderError::Io {
            path: path.to_string_lossy().to_string(),
            source: e,
        }),
    }
}

pub async fn saveTreeDocument(path: &Path, doc: &FolderTreeDocument) -> Result<()> {
    let ioErr = |e: io::Error| FolderError::Io {
        path: path.to_string_lossy().to_string(),
        source: e,
    };
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await.map_err(ioErr)?;
    }
    let json = serde_json::to_string_pretty(doc)?;
    tokio::fs::write(path, json).await.map_err(ioErr)
}

// ============================================
// STORAGE STATE
// ============================================

/// Shared state: settings, the in-memory tree, and the filesystem it mirrors
pub struct Storage<F: FileSystem = TokioFs> {
    pub settings: RwLock<Settings>,
    pub tree: RwLock<FolderTree>,
    pub fs: F,
    // Serializes mutating operations; resolver and move sequences are check-then-act
    opLock: Mutex<()>,
}

impl<F: FileSystem> Storage<F> {
    pub fn new(fs: F, settings: Settings, tree: FolderTree) -> Self {
        Self {
            settings: RwLock::new(settings),
            tree: RwLock::new(tree),
            fs,
            opLock: Mutex::new(()),
        }
    }

    pub fn rootDir(&self) -> PathBuf {
        self.settings.read().rootDir.clone()
    }

    pub async fn lockOps(&self) -> MutexGuard<'_, ()> {
        self.opLock.lock().await
    }

    pub fn snapshot(&self) -> FolderTree {
        self.tree.read().clone()
    }

    /// Apply a pure patch step to the tree
    pub fn updateTree(&self, patch: impl FnOnce(FolderTree) -> FolderTree) {
        let mut tree = self.tree.write();
        let current = std::mem::take(&mut *tree);
        *tree = patch(current);
    }

    pub fn replaceTree(&self, tree: FolderTree) {
        *self.tree.write() = tree;
    }

    /// Write the current tree document to disk
    pub async fn persist(&self) -> Result<()> {
        let doc = serializeFolderTree(&self.tree.read());
        let path = self.settings.read().treePath.clone();
        saveTreeDocument(&path, &doc).await
    }

    /// Re-derive the tree from the filesystem and persist it
    pub async fn refresh(&self) -> Result<FolderTree> {
        let previous = self.snapshot();
        let tree = reloadTree(&self.fs, &self.rootDir(), &previous).await?;
        self.replaceTree(tree.clone());
        self.persist().await?;
        Ok(tree)
    }
}

pub type StorageState = Arc<Storage>;

/// Initialize storage: ensure the root exists, load the saved tree, reconcile it with disk
pub async fn initStorage(settings: Settings) -> Result<StorageState> {
    info!("[initStorage] rootDir: {:?}, treePath: {:?}", settings.rootDir, settings.treePath);

    tokio::fs::create_dir_all(&settings.rootDir).await.map_err(|e| FolderError::Io {
        path: settings.rootDir.to_string_lossy().to_string(),
        source: e,
    })?;

    let saved = deserializeFolderTree(loadTreeDocument(&settings.treePath).await?);
    let storage = Arc::new(Storage::new(TokioFs, settings, saved));
    let tree = storage.refresh().await?;

    info!("[initStorage] Storage initialized with {} folder(s)", tree.folders.len());
    Ok(storage)
}
