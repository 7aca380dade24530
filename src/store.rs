//! `mdseo store`: Manage the persisted workspace file tree.

use anyhow::{Context, Result};
use colored::Colorize;
use mdseo::storage::{
    FileKind, FileNode, FileTreeStore, LegacyStore, MigrationOutcome, count_nodes,
    migrate_from_legacy,
};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::config::StorageSection;

const MARKDOWN_EXTENSIONS: [&str; 3] = ["md", "markdown", "mdx"];

fn open_store(storage: &StorageSection) -> Result<FileTreeStore> {
    FileTreeStore::open_named(&storage.data_dir, &storage.db_name, &storage.store_name)
        .with_context(|| format!("Failed to open store in {}", storage.data_dir.display()))
}

/// Walk `dir` for markdown files and save them as the file tree.
pub fn import(dir: &Path, storage: &StorageSection, quiet: bool) -> Result<()> {
    let nodes = scan_tree(dir)?;
    let store = open_store(storage)?;
    store
        .save(&nodes)
        .with_context(|| format!("Failed to save file tree to {}", store.dir().display()))?;

    if !quiet {
        println!(
            "{} {} nodes from {} into {}",
            "Imported".green().bold(),
            count_nodes(&nodes),
            dir.display(),
            store.dir().display()
        );
    }
    Ok(())
}

/// Print the stored tree.
pub fn show(storage: &StorageSection) -> Result<()> {
    let store = open_store(storage)?;
    match store.load()? {
        Some(nodes) => {
            for node in &nodes {
                print_node(node, 0);
            }
            println!("{}", format!("{} nodes", count_nodes(&nodes)).dimmed());
        }
        None => println!("{}", "No file tree stored".yellow()),
    }
    Ok(())
}

/// One-time move of the tree out of the legacy key-value file.
pub fn migrate(storage: &StorageSection, quiet: bool) -> Result<()> {
    let store = open_store(storage)?;
    let legacy = LegacyStore::new(storage.legacy_path());
    let outcome = migrate_from_legacy(&store, &legacy)
        .with_context(|| format!("Failed to migrate from {}", legacy.path().display()))?;

    if !quiet {
        match outcome {
            MigrationOutcome::Migrated { nodes } => println!(
                "{} {} nodes from {}",
                "Migrated".green().bold(),
                nodes,
                legacy.path().display()
            ),
            MigrationOutcome::AlreadyMigrated => println!(
                "{} store already has a file tree; cleared legacy copy",
                "Skipped".yellow().bold()
            ),
            MigrationOutcome::NothingToMigrate => {
                println!("{}", "Nothing to migrate".dimmed())
            }
        }
    }
    Ok(())
}

fn print_node(node: &FileNode, depth: usize) {
    let indent = "  ".repeat(depth);
    match &node.kind {
        FileKind::File { content } => println!(
            "{indent}{} {}",
            node.name,
            format!("({} bytes)", content.len()).dimmed()
        ),
        FileKind::Folder { children } => {
            println!("{indent}{}/", node.name.blue().bold());
            for child in children {
                print_node(child, depth + 1);
            }
        }
    }
}

/// Build a file tree from every markdown file under `dir`. Folders without
/// markdown files are left out.
pub fn scan_tree(dir: &Path) -> Result<Vec<FileNode>> {
    if !dir.is_dir() {
        anyhow::bail!("'{}' is not a directory", dir.display());
    }

    let mut nodes = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() || !is_markdown(entry.path()) {
            continue;
        }
        let rel = entry
            .path()
            .strip_prefix(dir)
            .unwrap_or(entry.path())
            .to_path_buf();
        let content = std::fs::read_to_string(entry.path())
            .with_context(|| format!("Failed to read {}", entry.path().display()))?;
        insert(&mut nodes, &components(&rel), PathBuf::new(), content);
    }
    Ok(nodes)
}

fn is_markdown(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| MARKDOWN_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
}

fn components(rel: &Path) -> Vec<String> {
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy().to_string())
        .collect()
}

fn insert(nodes: &mut Vec<FileNode>, parts: &[String], prefix: PathBuf, content: String) {
    let Some((name, rest)) = parts.split_first() else {
        return;
    };
    let path = prefix.join(name);

    if rest.is_empty() {
        nodes.push(FileNode::file(node_id(&path), name.clone(), content));
        return;
    }

    let pos = match nodes
        .iter()
        .position(|n| n.name == *name && matches!(n.kind, FileKind::Folder { .. }))
    {
        Some(pos) => pos,
        None => {
            nodes.push(FileNode::folder(node_id(&path), name.clone(), Vec::new()));
            nodes.len() - 1
        }
    };
    if let FileKind::Folder { children } = &mut nodes[pos].kind {
        insert(children, rest, path, content);
    }
}

/// Stable id: first 12 hex chars of the SHA-256 of the `/`-joined relative path.
fn node_id(rel: &Path) -> String {
    let key = components(rel).join("/");
    let mut hasher = Sha256::new();
    hasher.update(key.as_bytes());
    format!("{:x}", hasher.finalize())[..12].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture_docs() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/docs")
    }

    #[test]
    fn test_scan_tree_nests_folders() {
        let nodes = scan_tree(&fixture_docs()).unwrap();
        let names: Vec<_> = nodes.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, vec!["guides", "index.md"]);

        let FileKind::Folder { children } = &nodes[0].kind else {
            panic!("guides should be a folder");
        };
        assert_eq!(children.len(), 1, "non-markdown files are skipped");
        assert_eq!(children[0].name, "setup.md");
        assert!(matches!(
            &children[0].kind,
            FileKind::File { content } if content.starts_with("# Setup")
        ));
    }

    #[test]
    fn test_node_ids_are_stable_and_distinct() {
        let a = node_id(Path::new("guides/setup.md"));
        assert_eq!(a.len(), 12);
        assert_eq!(a, node_id(Path::new("guides/setup.md")));
        assert_ne!(a, node_id(Path::new("guides")));
    }

    #[test]
    fn test_is_markdown() {
        assert!(is_markdown(Path::new("a.md")));
        assert!(is_markdown(Path::new("b.MDX")));
        assert!(!is_markdown(Path::new("c.txt")));
        assert!(!is_markdown(Path::new("README")));
    }

    #[test]
    fn test_scan_rejects_files() {
        assert!(scan_tree(&fixture_docs().join("index.md")).is_err());
    }
}
