//! JSON file persistence for the task list.
//!
//! The list is stored as one versioned JSON document. Writes go to a hidden
//! sibling file first and are renamed over the target, so a crash mid-write
//! never leaves a truncated document behind.

use async_trait::async_trait;
use camino::Utf8Path;
use cap_std::{ambient_authority, fs_utf8::Dir};
use serde::{Deserialize, Serialize};
use std::io;
use std::sync::Arc;
use tracing::debug;

use crate::task::{
    domain::Task,
    ports::{TaskPersistence, TaskPersistenceError, TaskPersistenceResult},
};

/// Schema version written into every document.
const TASK_LIST_VERSION: u8 = 1;

#[derive(Debug, Deserialize)]
struct TaskListDocument {
    version: u8,
    #[serde(default)]
    tasks: Vec<Task>,
}

#[derive(Debug, Serialize)]
struct TaskListDocumentRef<'a> {
    version: u8,
    tasks: &'a [Task],
}

/// Task persistence backed by a JSON file inside a capability directory.
#[derive(Debug, Clone)]
pub struct JsonFileTaskPersistence {
    dir: Arc<Dir>,
    file_name: String,
}

impl JsonFileTaskPersistence {
    /// Opens persistence for the file at `path`. The parent directory must
    /// exist; the file itself is created on first save.
    ///
    /// # Errors
    ///
    /// Returns [`TaskPersistenceError::Persistence`] when `path` has no file
    /// name or its parent directory cannot be opened.
    pub fn open(path: &Utf8Path) -> TaskPersistenceResult<Self> {
        let file_name = path.file_name().ok_or_else(|| {
            TaskPersistenceError::persistence(io::Error::other("path must include a file name"))
        })?;
        let parent = path
            .parent()
            .filter(|parent| !parent.as_str().is_empty())
            .unwrap_or_else(|| Utf8Path::new("."));
        let dir = Dir::open_ambient_dir(parent, ambient_authority())
            .map_err(TaskPersistenceError::persistence)?;
        Ok(Self::in_dir(dir, file_name))
    }

    /// Creates persistence for `file_name` inside an already-opened directory.
    #[must_use]
    pub fn in_dir(dir: Dir, file_name: impl Into<String>) -> Self {
        Self {
            dir: Arc::new(dir),
            file_name: file_name.into(),
        }
    }

    fn staging_name(&self) -> String {
        format!(".{}.tmp", self.file_name)
    }
}

#[async_trait]
impl TaskPersistence for JsonFileTaskPersistence {
    async fn load_tasks(&self) -> TaskPersistenceResult<Vec<Task>> {
        let dir = Arc::clone(&self.dir);
        let file_name = self.file_name.clone();
        let read = tokio::task::spawn_blocking(move || dir.read_to_string(&file_name))
            .await
            .map_err(TaskPersistenceError::persistence)?;

        let contents = match read {
            Ok(contents) => contents,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                debug!(file = %self.file_name, "no saved task list, starting empty");
                return Ok(Vec::new());
            }
            Err(err) => return Err(TaskPersistenceError::persistence(err)),
        };

        let document: TaskListDocument =
            serde_json::from_str(&contents).map_err(TaskPersistenceError::persistence)?;
        if document.version != TASK_LIST_VERSION {
            return Err(TaskPersistenceError::UnsupportedVersion(document.version));
        }
        debug!(file = %self.file_name, count = document.tasks.len(), "loaded task list");
        Ok(document.tasks)
    }

    async fn save_tasks(&self, tasks: &[Task]) -> TaskPersistenceResult<()> {
        let bytes = serde_json::to_vec_pretty(&TaskListDocumentRef {
            version: TASK_LIST_VERSION,
            tasks,
        })
        .map_err(TaskPersistenceError::persistence)?;

        let dir = Arc::clone(&self.dir);
        let file_name = self.file_name.clone();
        let staging = self.staging_name();
        tokio::task::spawn_blocking(move || {
            dir.write(&staging, bytes)?;
            dir.rename(&staging, &dir, &file_name)
        })
        .await
        .map_err(TaskPersistenceError::persistence)?
        .map_err(TaskPersistenceError::persistence)?;

        debug!(file = %self.file_name, count = tasks.len(), "saved task list");
        Ok(())
    }
}
