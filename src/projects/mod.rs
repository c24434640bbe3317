//! Project bookmark persistence and workspace provisioning.
//!
//! The engine consumes this collaborator only at agent-creation boundaries:
//! bookmarks load once at startup and save on mutation. Closing an agent
//! never removes its bookmark.

use std::io::Write;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default content seeded into a fresh workspace folder.
const DEFAULT_WORKSPACE_CLAUDE_MD: &str = "# Workspace\n\nThis is the default workspace.\n";

/// A saved project as stored in `projects.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectEntry {
    pub id: String,
    pub name: String,
    pub path: PathBuf,
    pub added_at: DateTime<Utc>,
}

/// A project shown in the picker: the workspace plus saved projects.
/// Bookmarks persist independently of open agents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectBookmark {
    pub id: String,
    pub name: String,
    pub path: PathBuf,
}

/// Errors from bookmark persistence.
#[derive(Debug, Error)]
pub enum ProjectStoreError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse projects file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("background task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Durable bookmark list plus first-run workspace provisioning.
#[async_trait]
pub trait ProjectStore: Send + Sync {
    /// Load saved projects. A missing file is an empty list.
    async fn load_projects(&self) -> Result<Vec<ProjectEntry>, ProjectStoreError>;

    /// Replace the saved project list.
    async fn save_projects(&self, projects: Vec<ProjectEntry>) -> Result<(), ProjectStoreError>;

    /// Create the default workspace folder if needed; returns its path.
    async fn ensure_default_workspace(&self) -> Result<PathBuf, ProjectStoreError>;
}

/// `projects.json` on disk under the data directory, written atomically
/// (temp file + rename) off the async runtime.
pub struct JsonProjectStore {
    data_dir: PathBuf,
}

impl JsonProjectStore {
    /// Store rooted at the default data directory.
    pub fn new() -> Self {
        Self::with_data_dir(crate::util::paths::data_dir())
    }

    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    fn projects_path(&self) -> PathBuf {
        self.data_dir.join("projects.json")
    }

    fn workspace_dir(&self) -> PathBuf {
        self.data_dir.join("workspace")
    }
}

impl Default for JsonProjectStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProjectStore for JsonProjectStore {
    async fn load_projects(&self) -> Result<Vec<ProjectEntry>, ProjectStoreError> {
        let path = self.projects_path();
        tokio::task::spawn_blocking(move || {
            if !path.exists() {
                return Ok(Vec::new());
            }
            let data = std::fs::read_to_string(&path)?;
            let projects: Vec<ProjectEntry> = serde_json::from_str(&data)?;
            Ok(projects)
        })
        .await?
    }

    async fn save_projects(&self, projects: Vec<ProjectEntry>) -> Result<(), ProjectStoreError> {
        let path = self.projects_path();
        tokio::task::spawn_blocking(move || write_projects_atomic(&path, &projects)).await?
    }

    async fn ensure_default_workspace(&self) -> Result<PathBuf, ProjectStoreError> {
        let workspace_dir = self.workspace_dir();
        tokio::task::spawn_blocking(move || {
            std::fs::create_dir_all(&workspace_dir)?;
            let claude_md = workspace_dir.join("CLAUDE.md");
            if !claude_md.exists() {
                std::fs::write(&claude_md, DEFAULT_WORKSPACE_CLAUDE_MD)?;
            }
            Ok(workspace_dir)
        })
        .await?
    }
}

fn write_projects_atomic(path: &Path, projects: &[ProjectEntry]) -> Result<(), ProjectStoreError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let data = serde_json::to_string_pretty(projects)?;

    // Atomic write: temp file + rename.
    let tmp = path.with_extension("json.tmp");
    let mut file = std::fs::File::create(&tmp)?;
    file.write_all(data.as_bytes())?;
    file.sync_all()?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}

/// In-memory store for tests and headless embedding.
#[derive(Default)]
pub struct MemoryProjectStore {
    workspace: PathBuf,
    projects: Mutex<Vec<ProjectEntry>>,
    saves: Mutex<usize>,
}

impl MemoryProjectStore {
    pub fn new(workspace: impl Into<PathBuf>) -> Self {
        Self {
            workspace: workspace.into(),
            projects: Mutex::new(Vec::new()),
            saves: Mutex::new(0),
        }
    }

    pub fn with_projects(self, projects: Vec<ProjectEntry>) -> Self {
        *self.projects.lock() = projects;
        self
    }

    /// Number of completed `save_projects` calls.
    pub fn save_count(&self) -> usize {
        *self.saves.lock()
    }

    pub fn saved_projects(&self) -> Vec<ProjectEntry> {
        self.projects.lock().clone()
    }
}

#[async_trait]
impl ProjectStore for MemoryProjectStore {
    async fn load_projects(&self) -> Result<Vec<ProjectEntry>, ProjectStoreError> {
        Ok(self.projects.lock().clone())
    }

    async fn save_projects(&self, projects: Vec<ProjectEntry>) -> Result<(), ProjectStoreError> {
        *self.projects.lock() = projects;
        *self.saves.lock() += 1;
        Ok(())
    }

    async fn ensure_default_workspace(&self) -> Result<PathBuf, ProjectStoreError> {
        Ok(self.workspace.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn load_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonProjectStore::with_data_dir(dir.path());
        assert!(store.load_projects().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn save_and_reload_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonProjectStore::with_data_dir(dir.path());

        let entries = vec![ProjectEntry {
            id: "p1".to_string(),
            name: "demo".to_string(),
            path: PathBuf::from("/projects/demo"),
            added_at: Utc::now(),
        }];
        store.save_projects(entries.clone()).await.unwrap();

        let loaded = store.load_projects().await.unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].id, "p1");
        assert_eq!(loaded[0].path, PathBuf::from("/projects/demo"));

        // No leftover temp file from the atomic write.
        assert!(!dir.path().join("projects.json.tmp").exists());
    }

    #[tokio::test]
    async fn save_overwrites_previous_list() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonProjectStore::with_data_dir(dir.path());

        let entry = |id: &str| ProjectEntry {
            id: id.to_string(),
            name: id.to_string(),
            path: PathBuf::from("/p").join(id),
            added_at: Utc::now(),
        };
        store.save_projects(vec![entry("a"), entry("b")]).await.unwrap();
        store.save_projects(vec![entry("c")]).await.unwrap();

        let loaded = store.load_projects().await.unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].id, "c");
    }

    #[tokio::test]
    async fn ensure_workspace_creates_dir_and_seed_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonProjectStore::with_data_dir(dir.path());

        let workspace = store.ensure_default_workspace().await.unwrap();
        assert!(workspace.is_dir());
        assert!(workspace.join("CLAUDE.md").exists());

        // Second call leaves the seed file alone.
        std::fs::write(workspace.join("CLAUDE.md"), "customized").unwrap();
        store.ensure_default_workspace().await.unwrap();
        let content = std::fs::read_to_string(workspace.join("CLAUDE.md")).unwrap();
        assert_eq!(content, "customized");
    }

    #[tokio::test]
    async fn memory_store_counts_saves() {
        let store = MemoryProjectStore::new("/ws");
        assert_eq!(store.save_count(), 0);
        store.save_projects(Vec::new()).await.unwrap();
        assert_eq!(store.save_count(), 1);
    }
}
