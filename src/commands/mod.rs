// Commands module - folder tree operations over the filesystem capability

pub mod common;
pub mod folder;
pub mod project;
pub mod search;

pub use folder::{
    createFolder, deleteFolder, generateUniqueName, isValidMoveTarget, listFolderContents,
    moveFolder, renameFolder,
};
pub use project::{createProject, moveProject};
pub use search::searchProjects;
