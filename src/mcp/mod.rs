// MCP server exposing the folder tree operations as tools

pub mod api;
pub mod tools;

pub use tools::FolderTreeServer;
