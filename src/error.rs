// Error types for folder tree operations
// Filesystem failures are classified by io::ErrorKind so callers can tell collisions from missing paths

use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FolderError {
    /// Operating on a path absent from the filesystem
    #[error("Path not found: {0}")]
    NotFound(String),

    /// Rename/move target already occupied
    #[error("Target already exists: {0}")]
    Collision(String),

    /// Move into self or a descendant, rejected before any mutation
    #[error("Cannot move a folder into itself or one of its subfolders")]
    CyclicMove { from: String, to: String },

    /// A later step failed after `completed` filesystem mutations were committed
    #[error("Operation failed after {completed} completed step(s): {cause}")]
    PartialFailure {
        completed: usize,
        cause: Box<FolderError>,
    },

    #[error("Invalid name: '{0}'")]
    InvalidName(String),

    /// Folder operation aimed at a project directory
    #[error("Not a folder: {0}")]
    NotAFolder(String),

    #[error("Not a project: {0}")]
    NotAProject(String),

    #[error("I/O error on '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, FolderError>;

impl FolderError {
    /// Classify an error returned by the filesystem capability for `path`
    pub fn fromIo(path: &str, err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => Self::NotFound(path.to_string()),
            io::ErrorKind::AlreadyExists => Self::Collision(path.to_string()),
            _ => Self::Io {
                path: path.to_string(),
                source: err,
            },
        }
    }

    /// Wrap into PartialFailure when earlier steps already mutated the filesystem
    pub fn afterSteps(self, completed: usize) -> Self {
        if completed == 0 {
            self
        } else {
            Self::PartialFailure {
                completed,
                cause: Box::new(self),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_io_classifies_kinds() {
        let missing = FolderError::fromIo("a", io::Error::from(io::ErrorKind::NotFound));
        assert!(matches!(missing, FolderError::NotFound(p) if p == "a"));

        let taken = FolderError::fromIo("b", io::Error::from(io::ErrorKind::AlreadyExists));
        assert!(matches!(taken, FolderError::Collision(p) if p == "b"));

        let other = FolderError::fromIo("c", io::Error::from(io::ErrorKind::PermissionDenied));
        assert!(matches!(other, FolderError::Io { .. }));
    }

    #[test]
    fn test_after_steps_wraps_only_committed_work() {
        let raw = FolderError::NotFound("x".into()).afterSteps(0);
        assert!(matches!(raw, FolderError::NotFound(_)));

        let partial = FolderError::Collision("y".into()).afterSteps(2);
        match partial {
            FolderError::PartialFailure { completed, cause } => {
                assert_eq!(completed, 2);
                assert!(matches!(*cause, FolderError::Collision(_)));
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_cyclic_move_message() {
        let err = FolderError::CyclicMove { from: "a".into(), to: "a/b".into() };
        assert_eq!(err.to_string(), "Cannot move a folder into itself or one of its subfolders");
    }
}
