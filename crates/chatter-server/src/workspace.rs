//! Workspace browsing: a single-level tree of named workspaces and files.
//!
//! The workspace root holds one directory per workspace; each workspace
//! holds plain files. Chat rooms are keyed by workspace name, but the two
//! are otherwise independent.

use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;

/// Workspace errors.
#[derive(Debug, Error)]
pub enum WorkspaceError {
    /// Name contains path separators or other rejected characters.
    #[error("invalid name: {0}")]
    InvalidName(String),

    /// The workspace or file does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Underlying filesystem error.
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// A single-level root for a collection of workspaces.
#[derive(Debug, Clone)]
pub struct WorkspaceRoot {
    root: PathBuf,
}

impl WorkspaceRoot {
    /// Create a root over the given directory.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The root directory path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.root
    }

    /// List workspace names (subdirectories of the root), sorted.
    ///
    /// A missing root directory is treated as an empty tree.
    ///
    /// # Errors
    ///
    /// Returns an error on filesystem failure other than a missing root.
    pub async fn workspaces(&self) -> Result<Vec<String>, WorkspaceError> {
        list_dir(&self.root, EntryKind::Directories).await
    }

    /// List file names in one workspace, sorted.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is invalid, the workspace is missing,
    /// or listing fails.
    pub async fn files(&self, workspace: &str) -> Result<Vec<String>, WorkspaceError> {
        let dir = self.resolve(&[workspace])?;
        let metadata = match fs::metadata(&dir).await {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(WorkspaceError::NotFound(workspace.to_string()));
            }
            Err(e) => return Err(WorkspaceError::Io(e)),
        };
        if !metadata.is_dir() {
            return Err(WorkspaceError::NotFound(workspace.to_string()));
        }
        list_dir(&dir, EntryKind::Files).await
    }

    /// Read one file's contents.
    ///
    /// # Errors
    ///
    /// Returns an error if a name is invalid, the file is missing, or the
    /// read fails.
    pub async fn read_file(&self, workspace: &str, file: &str) -> Result<Vec<u8>, WorkspaceError> {
        let path = self.resolve(&[workspace, file])?;
        match fs::read(&path).await {
            Ok(contents) => Ok(contents),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(WorkspaceError::NotFound(format!("{workspace}/{file}")))
            }
            Err(e) => Err(WorkspaceError::Io(e)),
        }
    }

    /// Join validated name segments onto the root. Segments must not be
    /// able to escape the tree.
    fn resolve(&self, segments: &[&str]) -> Result<PathBuf, WorkspaceError> {
        let mut path = self.root.clone();
        for segment in segments {
            if !valid_name(segment) {
                return Err(WorkspaceError::InvalidName((*segment).to_string()));
            }
            path.push(segment);
        }
        Ok(path)
    }
}

fn valid_name(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('.')
        && !name.contains(['/', '\\'])
        && !name.contains('\0')
}

enum EntryKind {
    Directories,
    Files,
}

async fn list_dir(dir: &Path, kind: EntryKind) -> Result<Vec<String>, WorkspaceError> {
    let mut reader = match fs::read_dir(dir).await {
        Ok(reader) => reader,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(WorkspaceError::Io(e)),
    };

    let mut names = Vec::new();
    while let Some(entry) = reader.next_entry().await? {
        let file_type = entry.file_type().await?;
        let keep = match kind {
            EntryKind::Directories => file_type.is_dir(),
            EntryKind::Files => file_type.is_file(),
        };
        if !keep {
            continue;
        }
        if let Ok(name) = entry.file_name().into_string() {
            if valid_name(&name) {
                names.push(name);
            }
        }
    }
    names.sort();
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    static TEST_SEQ: AtomicU32 = AtomicU32::new(0);

    /// Temporary workspace tree, removed on drop.
    struct TempTree {
        root: PathBuf,
    }

    impl TempTree {
        fn new() -> Self {
            let seq = TEST_SEQ.fetch_add(1, Ordering::Relaxed);
            let root = std::env::temp_dir().join(format!(
                "chatter-workspace-test-{}-{seq}",
                std::process::id()
            ));
            std::fs::create_dir_all(&root).unwrap();
            Self { root }
        }

        fn write(&self, workspace: &str, file: &str, contents: &str) {
            let dir = self.root.join(workspace);
            std::fs::create_dir_all(&dir).unwrap();
            std::fs::write(dir.join(file), contents).unwrap();
        }
    }

    impl Drop for TempTree {
        fn drop(&mut self) {
            let _ = std::fs::remove_dir_all(&self.root);
        }
    }

    #[tokio::test]
    async fn test_list_workspaces_and_files() {
        let tree = TempTree::new();
        tree.write("alpha", "main.rs", "fn main() {}");
        tree.write("alpha", "lib.rs", "");
        tree.write("beta", "notes.txt", "hi");

        let root = WorkspaceRoot::new(&tree.root);
        assert_eq!(root.workspaces().await.unwrap(), ["alpha", "beta"]);
        assert_eq!(root.files("alpha").await.unwrap(), ["lib.rs", "main.rs"]);
    }

    #[tokio::test]
    async fn test_read_file() {
        let tree = TempTree::new();
        tree.write("alpha", "main.rs", "fn main() {}");

        let root = WorkspaceRoot::new(&tree.root);
        let contents = root.read_file("alpha", "main.rs").await.unwrap();
        assert_eq!(contents, b"fn main() {}");
    }

    #[tokio::test]
    async fn test_missing_entries() {
        let tree = TempTree::new();
        let root = WorkspaceRoot::new(&tree.root);

        assert!(root.workspaces().await.unwrap().is_empty());
        assert!(matches!(
            root.files("nope").await,
            Err(WorkspaceError::NotFound(_))
        ));
        assert!(matches!(
            root.read_file("nope", "file").await,
            Err(WorkspaceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_missing_root_lists_empty() {
        let root = WorkspaceRoot::new("/definitely/not/a/real/root");
        assert!(root.workspaces().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_traversal_names_rejected() {
        let tree = TempTree::new();
        tree.write("alpha", "main.rs", "secret");
        let root = WorkspaceRoot::new(&tree.root);

        for bad in ["..", "../alpha", "a/b", ".hidden", ""] {
            assert!(
                matches!(
                    root.read_file(bad, "main.rs").await,
                    Err(WorkspaceError::InvalidName(_))
                ),
                "accepted {bad:?}"
            );
        }
    }
}
