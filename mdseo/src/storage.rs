//! Persistent storage for the workspace file tree.
//!
//! [`FileTreeStore`] is a key-value collection laid out on disk as
//! `<root>/<db>/<store>/<key>.json`. [`LegacyStore`] is the older flat
//! key-value file the tree used to live in; [`migrate_from_legacy`] moves it
//! across once.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

pub const DEFAULT_DB_NAME: &str = "mdseo_db";
pub const DEFAULT_STORE_NAME: &str = "files";
/// Key the file tree is stored under.
pub const FILE_TREE_KEY: &str = "file_tree";
/// Key the file tree used to have in the legacy store.
pub const LEGACY_FILE_TREE_KEY: &str = "mdxport_fs_tree";

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// A file or folder in the workspace tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileNode {
    pub id: String,
    pub name: String,
    #[serde(flatten)]
    pub kind: FileKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum FileKind {
    File {
        #[serde(default)]
        content: String,
    },
    Folder {
        #[serde(default)]
        children: Vec<FileNode>,
    },
}

impl FileNode {
    pub fn file(id: impl Into<String>, name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind: FileKind::File {
                content: content.into(),
            },
        }
    }

    pub fn folder(id: impl Into<String>, name: impl Into<String>, children: Vec<FileNode>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind: FileKind::Folder { children },
        }
    }

    /// Number of nodes in this subtree, including itself.
    pub fn count(&self) -> usize {
        match &self.kind {
            FileKind::File { .. } => 1,
            FileKind::Folder { children } => 1 + children.iter().map(FileNode::count).sum::<usize>(),
        }
    }
}

/// Total nodes across a forest of trees.
pub fn count_nodes(nodes: &[FileNode]) -> usize {
    nodes.iter().map(FileNode::count).sum()
}

/// A single named collection of JSON values.
#[derive(Debug, Clone)]
pub struct FileTreeStore {
    dir: PathBuf,
}

impl FileTreeStore {
    /// Open the default collection under `root`, creating it if absent.
    pub fn open(root: impl AsRef<Path>) -> Result<Self, StorageError> {
        Self::open_named(root, DEFAULT_DB_NAME, DEFAULT_STORE_NAME)
    }

    /// Open `<root>/<db_name>/<store_name>`. Safe to call repeatedly.
    pub fn open_named(
        root: impl AsRef<Path>,
        db_name: &str,
        store_name: &str,
    ) -> Result<Self, StorageError> {
        let dir = root.as_ref().join(db_name).join(store_name);
        if !dir.is_dir() {
            log::debug!("creating store at {}", dir.display());
            std::fs::create_dir_all(&dir).map_err(|source| StorageError::Io {
                path: dir.clone(),
                source,
            })?;
        }
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn save(&self, nodes: &[FileNode]) -> Result<(), StorageError> {
        self.put(FILE_TREE_KEY, nodes)
    }

    /// The stored tree, or `None` if nothing has been saved.
    pub fn load(&self) -> Result<Option<Vec<FileNode>>, StorageError> {
        self.get(FILE_TREE_KEY)
    }

    pub fn put<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), StorageError> {
        let path = self.key_path(key);
        let json = serde_json::to_string(value).map_err(|source| StorageError::Json {
            path: path.clone(),
            source,
        })?;

        // Write into a temp file in the same directory, then persist over the key.
        let mut tmp = NamedTempFile::new_in(&self.dir).map_err(|source| StorageError::Io {
            path: self.dir.clone(),
            source,
        })?;
        tmp.write_all(json.as_bytes())
            .map_err(|source| StorageError::Io {
                path: tmp.path().to_path_buf(),
                source,
            })?;
        tmp.persist(&path).map_err(|e| StorageError::Io {
            path: path.clone(),
            source: e.error,
        })?;
        Ok(())
    }

    pub fn get<T: for<'de> Deserialize<'de>>(&self, key: &str) -> Result<Option<T>, StorageError> {
        let path = self.key_path(key);
        let raw = match std::fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(StorageError::Io { path, source }),
        };
        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|source| StorageError::Json { path, source })
    }

    fn key_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

/// The old flat key-value file: one JSON object mapping keys to strings.
#[derive(Debug, Clone)]
pub struct LegacyStore {
    path: PathBuf,
}

impl LegacyStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The tree saved under the legacy key, or `None` if the file, the key,
    /// or valid JSON is missing.
    pub fn get_file_tree(&self) -> Option<Vec<FileNode>> {
        let entries = self.read_entries().ok()?;
        let saved = entries.get(LEGACY_FILE_TREE_KEY)?;
        match serde_json::from_str(saved) {
            Ok(nodes) => Some(nodes),
            Err(e) => {
                log::debug!("ignoring unreadable legacy file tree: {e}");
                None
            }
        }
    }

    /// Remove the legacy key. Other keys are left in place.
    pub fn clear_file_tree(&self) -> Result<(), StorageError> {
        let mut entries = match self.read_entries() {
            Ok(entries) => entries,
            Err(StorageError::Io { source, .. })
                if source.kind() == std::io::ErrorKind::NotFound =>
            {
                return Ok(());
            }
            Err(e) => return Err(e),
        };
        if entries.remove(LEGACY_FILE_TREE_KEY).is_none() {
            return Ok(());
        }
        let json = serde_json::to_string_pretty(&entries).map_err(|source| StorageError::Json {
            path: self.path.clone(),
            source,
        })?;
        std::fs::write(&self.path, json).map_err(|source| StorageError::Io {
            path: self.path.clone(),
            source,
        })
    }

    fn read_entries(&self) -> Result<BTreeMap<String, String>, StorageError> {
        let raw = std::fs::read_to_string(&self.path).map_err(|source| StorageError::Io {
            path: self.path.clone(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| StorageError::Json {
            path: self.path.clone(),
            source,
        })
    }
}

/// What [`migrate_from_legacy`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationOutcome {
    /// The legacy tree was copied into the store.
    Migrated { nodes: usize },
    /// The store already held a tree; the legacy copy was discarded.
    AlreadyMigrated,
    NothingToMigrate,
}

/// Move the file tree out of the legacy store, then clear it there.
pub fn migrate_from_legacy(
    store: &FileTreeStore,
    legacy: &LegacyStore,
) -> Result<MigrationOutcome, StorageError> {
    let Some(nodes) = legacy.get_file_tree() else {
        return Ok(MigrationOutcome::NothingToMigrate);
    };

    if store.load()?.is_some() {
        legacy.clear_file_tree()?;
        return Ok(MigrationOutcome::AlreadyMigrated);
    }

    store.save(&nodes)?;
    legacy.clear_file_tree()?;
    let count = count_nodes(&nodes);
    log::debug!("migrated {count} file tree nodes from {}", legacy.path().display());
    Ok(MigrationOutcome::Migrated { nodes: count })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample_tree() -> Vec<FileNode> {
        vec![
            FileNode::file("1", "readme.md", "# Hi"),
            FileNode::folder(
                "2",
                "docs",
                vec![FileNode::file("3", "guide.md", "Some guide")],
            ),
        ]
    }

    fn write_legacy(path: &Path, tree: &[FileNode]) {
        let mut entries = BTreeMap::new();
        entries.insert(
            LEGACY_FILE_TREE_KEY.to_string(),
            serde_json::to_string(tree).unwrap(),
        );
        entries.insert("theme".to_string(), "dark".to_string());
        std::fs::write(path, serde_json::to_string(&entries).unwrap()).unwrap();
    }

    #[test]
    fn open_is_idempotent() {
        let tmp = TempDir::new().unwrap();
        let first = FileTreeStore::open(tmp.path()).unwrap();
        first.save(&sample_tree()).unwrap();
        let second = FileTreeStore::open(tmp.path()).unwrap();
        assert_eq!(second.load().unwrap(), Some(sample_tree()));
        assert!(tmp.path().join("mdseo_db/files").is_dir());
    }

    #[test]
    fn load_missing_is_none() {
        let tmp = TempDir::new().unwrap();
        let store = FileTreeStore::open(tmp.path()).unwrap();
        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    fn save_overwrites() {
        let tmp = TempDir::new().unwrap();
        let store = FileTreeStore::open(tmp.path()).unwrap();
        store.save(&sample_tree()).unwrap();
        store.save(&[FileNode::file("9", "only.md", "")]).unwrap();
        assert_eq!(store.load().unwrap().unwrap().len(), 1);
    }

    #[test]
    fn save_leaves_no_temp_files() {
        let tmp = TempDir::new().unwrap();
        let store = FileTreeStore::open(tmp.path()).unwrap();
        store.save(&sample_tree()).unwrap();
        store.save(&sample_tree()).unwrap();

        let names: Vec<_> = std::fs::read_dir(store.dir())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["file_tree.json"]);
    }

    #[test]
    fn save_into_removed_store_is_an_io_error() {
        let tmp = TempDir::new().unwrap();
        let store = FileTreeStore::open(tmp.path()).unwrap();
        std::fs::remove_dir_all(store.dir()).unwrap();
        assert!(matches!(
            store.save(&sample_tree()),
            Err(StorageError::Io { .. })
        ));
    }

    #[test]
    fn corrupt_value_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let store = FileTreeStore::open(tmp.path()).unwrap();
        std::fs::write(store.dir().join("file_tree.json"), "{not json").unwrap();
        assert!(matches!(store.load(), Err(StorageError::Json { .. })));
    }

    #[test]
    fn file_node_json_shape() {
        let json = serde_json::to_value(&sample_tree()[1]).unwrap();
        assert_eq!(json["kind"], "folder");
        assert_eq!(json["children"][0]["kind"], "file");
        assert_eq!(json["children"][0]["content"], "Some guide");
    }

    #[test]
    fn count_includes_folders() {
        assert_eq!(count_nodes(&sample_tree()), 3);
    }

    #[test]
    fn migrate_moves_tree_and_clears_legacy_key() {
        let tmp = TempDir::new().unwrap();
        let store = FileTreeStore::open(tmp.path()).unwrap();
        let legacy = LegacyStore::new(tmp.path().join("legacy.json"));
        write_legacy(legacy.path(), &sample_tree());

        let outcome = migrate_from_legacy(&store, &legacy).unwrap();
        assert_eq!(outcome, MigrationOutcome::Migrated { nodes: 3 });
        assert_eq!(store.load().unwrap(), Some(sample_tree()));
        assert_eq!(legacy.get_file_tree(), None);

        // Unrelated legacy keys survive.
        let raw = std::fs::read_to_string(legacy.path()).unwrap();
        assert!(raw.contains("theme"));

        // Running again is a no-op.
        assert_eq!(
            migrate_from_legacy(&store, &legacy).unwrap(),
            MigrationOutcome::NothingToMigrate
        );
    }

    #[test]
    fn migrate_keeps_existing_store() {
        let tmp = TempDir::new().unwrap();
        let store = FileTreeStore::open(tmp.path()).unwrap();
        let existing = vec![FileNode::file("x", "kept.md", "")];
        store.save(&existing).unwrap();
        let legacy = LegacyStore::new(tmp.path().join("legacy.json"));
        write_legacy(legacy.path(), &sample_tree());

        let outcome = migrate_from_legacy(&store, &legacy).unwrap();
        assert_eq!(outcome, MigrationOutcome::AlreadyMigrated);
        assert_eq!(store.load().unwrap(), Some(existing));
        assert_eq!(legacy.get_file_tree(), None);
    }

    #[test]
    fn missing_or_garbled_legacy_is_nothing() {
        let tmp = TempDir::new().unwrap();
        let store = FileTreeStore::open(tmp.path()).unwrap();
        let legacy = LegacyStore::new(tmp.path().join("absent.json"));
        assert_eq!(
            migrate_from_legacy(&store, &legacy).unwrap(),
            MigrationOutcome::NothingToMigrate
        );
        assert!(legacy.clear_file_tree().is_ok());

        let garbled = LegacyStore::new(tmp.path().join("garbled.json"));
        std::fs::write(
            garbled.path(),
            format!("{{\"{LEGACY_FILE_TREE_KEY}\": \"[oops\"}}"),
        )
        .unwrap();
        assert_eq!(garbled.get_file_tree(), None);
    }
}
