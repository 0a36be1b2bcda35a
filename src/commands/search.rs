// Search commands - walks the persisted hierarchy for project names

use std::path::Path;
use tracing::{debug, info};

use crate::error::Result;
use crate::filesystem::FileSystem;
use crate::models::{ItemType, ProjectMatch};
use super::folder::readEntries;

/// Slice of `name` that matches `query` case-insensitively, in the name's own casing
/// A character whose lowercase form is several chars (`İ` -> `i̇`) matches when the
/// query ends inside that expansion; the whole character is returned
pub fn findMatch<'a>(name: &'a str, query: &str) -> Option<&'a str> {
    if query.is_empty() {
        return None;
    }
    let wanted: Vec<char> = query.chars().flat_map(char::to_lowercase).collect();

    'starts: for (start, _) in name.char_indices() {
        let mut pending = wanted.iter();
        for (offset, c) in name[start..].char_indices() {
            for lower in c.to_lowercase() {
                match pending.next() {
                    Some(w) if *w == lower => {}
                    None => break,
                    Some(_) => continue 'starts,
                }
            }
            if pending.len() == 0 {
                return Some(&name[start..start + offset + c.len_utf8()]);
            }
        }
    }
    None
}

pub async fn searchProjects<F: FileSystem>(fs: &F, query: &str, rootDir: &Path) -> Result<Vec<ProjectMatch>> {
    if query.is_empty() {
        return Ok(Vec::new());
    }
    info!("[searchProjects] query: {}", query);

    let mut results = Vec::new();
    // Explicit stack instead of recursion; depth is bounded only by the hierarchy
    let mut pending: Vec<Option<String>> = vec![None];

    while let Some(folderPath) = pending.pop() {
        let items = readEntries(fs, folderPath.as_deref(), rootDir).await?;
        for item in items {
            match item.itemType {
                ItemType::Folder => pending.push(Some(item.path.clone())),
                ItemType::Project => {
                    if let Some(matchedText) = findMatch(&item.name, query) {
                        debug!("[searchProjects] hit: {}", item.path);
                        results.push(ProjectMatch {
                            matchedText: matchedText.to_string(),
                            folderPath: folderPath.clone().unwrap_or_default(),
                            project: item,
                        });
                    }
                }
            }
        }
    }

    info!("[searchProjects] {} match(es)", results.len());
    Ok(results)
}
