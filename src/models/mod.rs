// Models for the folder tree manager
// All fields use camelCase for consistency with the JSON consumers

pub mod config;
pub mod folder;

pub use config::Settings;
pub use folder::{Folder, FolderItem, FolderTree, FolderTreeDocument, ItemType, ProjectMatch};
