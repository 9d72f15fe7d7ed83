// All core functionality is in dmark-core.
// This CLI acts as a thin wrapper around the core library: file discovery,
// reading/writing documents, and report display.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

// Re-export core types for convenience
pub use dmark_core::*;

/// Extensions treated as documents.
const DOCUMENT_EXTENSIONS: &[&str] = &["md", "dmd"];

/// Recursively collect every `.md`/`.dmd` file under `dir`, sorted so that
/// collection order (and therefore first-definition sites) is deterministic.
pub fn discover_documents(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut documents = Vec::new();
    walk(dir, &mut documents)
        .with_context(|| format!("failed to scan project directory {}", dir.display()))?;
    documents.sort();
    log::debug!("discovered {} document(s) under {}", documents.len(), dir.display());
    Ok(documents)
}

fn walk(dir: &Path, documents: &mut Vec<PathBuf>) -> Result<()> {
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            walk(&path, documents)?;
        } else if path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| DOCUMENT_EXTENSIONS.contains(&ext))
        {
            documents.push(path);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discovery_finds_nested_documents_in_sorted_order() {
        let root = std::env::temp_dir().join("dmark_discovery_test");
        let nested = root.join("chapters");
        fs::create_dir_all(&nested).unwrap();
        fs::write(root.join("b.md"), "# b").unwrap();
        fs::write(root.join("a.dmd"), "# a").unwrap();
        fs::write(nested.join("c.md"), "# c").unwrap();
        fs::write(root.join("notes.txt"), "ignored").unwrap();

        let documents = discover_documents(&root).unwrap();
        let names: Vec<_> = documents
            .iter()
            .map(|p| p.strip_prefix(&root).unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.dmd", "b.md", "chapters/c.md"]);

        fs::remove_dir_all(&root).ok();
    }
}
