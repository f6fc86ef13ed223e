//! In-memory registry of download tasks.
//!
//! Every accepted download request registers a task here; the background
//! pipeline updates it and the status endpoint reads it. Tasks live in a
//! `Mutex`-guarded map keyed by uuid. Nothing is persisted: a restart
//! forgets all tasks, and a janitor drops finished tasks that were never
//! fetched so the map and the disk cannot grow without bound.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

use crate::core::config;

/// Lifecycle states of a download task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TaskStatus {
    #[serde(rename = "pending")]
    Pending,
    #[serde(rename = "starting")]
    Starting,
    #[serde(rename = "downloading")]
    Downloading,
    #[serde(rename = "merging")]
    Merging,
    #[serde(rename = "re-encoding")]
    Reencoding,
    #[serde(rename = "complete")]
    Complete,
    #[serde(rename = "error")]
    Error,
}

impl TaskStatus {
    /// Returns the wire representation used by the status API.
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Starting => "starting",
            TaskStatus::Downloading => "downloading",
            TaskStatus::Merging => "merging",
            TaskStatus::Reencoding => "re-encoding",
            TaskStatus::Complete => "complete",
            TaskStatus::Error => "error",
        }
    }

    /// Parses a wire string back into a status.
    pub fn parse(s: &str) -> Option<TaskStatus> {
        match s {
            "pending" => Some(TaskStatus::Pending),
            "starting" => Some(TaskStatus::Starting),
            "downloading" => Some(TaskStatus::Downloading),
            "merging" => Some(TaskStatus::Merging),
            "re-encoding" => Some(TaskStatus::Reencoding),
            "complete" => Some(TaskStatus::Complete),
            "error" => Some(TaskStatus::Error),
            _ => None,
        }
    }

    /// Terminal tasks are never updated by the pipeline again.
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Complete | TaskStatus::Error)
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot of one download task.
#[derive(Debug, Clone)]
pub struct TaskState {
    pub status: TaskStatus,
    pub progress: u8,
    pub message: String,
    /// Set once the task completes
    pub file_path: Option<PathBuf>,
    /// Download filename offered to the browser, set on completion
    pub filename: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Thread-safe map of task id to task state.
///
/// Shared between the web handlers and the download pipeline behind an
/// `Arc`; all methods take `&self` and lock internally.
pub struct TaskRegistry {
    tasks: Mutex<HashMap<String, TaskState>>,
}

impl Default for TaskRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            tasks: Mutex::new(HashMap::new()),
        }
    }

    /// Registers a new task and returns its id.
    ///
    /// The task starts out as `pending` / 0% / "Initializing...".
    pub async fn create(&self) -> String {
        let id = uuid::Uuid::new_v4().to_string();
        let now = Utc::now();
        let state = TaskState {
            status: TaskStatus::Pending,
            progress: 0,
            message: "Initializing...".to_string(),
            file_path: None,
            filename: None,
            created_at: now,
            updated_at: now,
        };
        self.tasks.lock().await.insert(id.clone(), state);
        log::debug!("Registered task {}", id);
        id
    }

    /// Moves a task to a new status, keeping its progress.
    pub async fn set_status(&self, id: &str, status: TaskStatus, message: &str) {
        let mut tasks = self.tasks.lock().await;
        if let Some(task) = tasks.get_mut(id) {
            if task.status.is_terminal() {
                log::warn!("Ignoring status update for finished task {}: {}", id, status);
                return;
            }
            task.status = status;
            task.message = message.to_string();
            task.updated_at = Utc::now();
        }
    }

    /// Moves a task to a new status and sets its progress outright.
    ///
    /// Used for trusted transitions (merge done at 100%, re-encode
    /// restarting at 0%) that must bypass the progress clamp.
    pub async fn set_status_with_progress(&self, id: &str, status: TaskStatus, message: &str, progress: u8) {
        let mut tasks = self.tasks.lock().await;
        if let Some(task) = tasks.get_mut(id) {
            if task.status.is_terminal() {
                log::warn!("Ignoring status update for finished task {}: {}", id, status);
                return;
            }
            task.status = status;
            task.progress = progress.min(100);
            task.message = message.to_string();
            task.updated_at = Utc::now();
        }
    }

    /// Applies a parsed download progress report.
    ///
    /// Moves the task to `downloading`. Progress never moves backwards,
    /// and a stray 100% while the previous value is still below 90 is
    /// dropped (yt-dlp emits a spurious 100% line when it re-checks an
    /// already-complete fragment).
    pub async fn set_progress(&self, id: &str, percent: u8, message: &str) {
        let mut tasks = self.tasks.lock().await;
        if let Some(task) = tasks.get_mut(id) {
            if task.status.is_terminal() {
                return;
            }
            let percent = percent.min(100);
            if percent == 100 && task.progress < 90 {
                log::debug!("Suppressing 100% jump for task {} (was at {}%)", id, task.progress);
                return;
            }
            if percent < task.progress {
                return;
            }
            task.status = TaskStatus::Downloading;
            task.progress = percent;
            task.message = message.to_string();
            task.updated_at = Utc::now();
        }
    }

    /// Marks a task complete and records the file the browser can fetch.
    pub async fn complete(&self, id: &str, file_path: PathBuf, filename: String) {
        let mut tasks = self.tasks.lock().await;
        if let Some(task) = tasks.get_mut(id) {
            if task.status.is_terminal() {
                log::warn!("Ignoring completion for finished task {}", id);
                return;
            }
            task.status = TaskStatus::Complete;
            task.progress = 100;
            task.message = "Download complete!".to_string();
            task.file_path = Some(file_path);
            task.filename = Some(filename);
            task.updated_at = Utc::now();
        }
        log::info!("✅ Task {} complete", id);
    }

    /// Marks a task failed with a user-facing message.
    pub async fn fail(&self, id: &str, message: &str) {
        let mut tasks = self.tasks.lock().await;
        if let Some(task) = tasks.get_mut(id) {
            if task.status.is_terminal() {
                return;
            }
            task.status = TaskStatus::Error;
            task.message = message.to_string();
            task.updated_at = Utc::now();
        }
        log::error!("❌ Task {} failed: {}", id, message);
    }

    /// Returns a copy of the task state, or `None` for unknown ids.
    pub async fn snapshot(&self, id: &str) -> Option<TaskState> {
        self.tasks.lock().await.get(id).cloned()
    }

    /// Removes a task and returns its final state.
    pub async fn remove(&self, id: &str) -> Option<TaskState> {
        self.tasks.lock().await.remove(id)
    }

    /// Puts a removed task back under its id.
    pub async fn restore(&self, id: &str, state: TaskState) {
        self.tasks.lock().await.insert(id.to_string(), state);
    }

    /// Drops terminal tasks not updated within `ttl` and returns their ids
    /// so the caller can delete their work directories.
    pub async fn purge_stale(&self, ttl: Duration) -> Vec<String> {
        let now = Utc::now();
        let mut tasks = self.tasks.lock().await;
        let stale: Vec<String> = tasks
            .iter()
            .filter(|(_, task)| {
                task.status.is_terminal() && (now - task.updated_at).to_std().map_or(false, |age| age > ttl)
            })
            .map(|(id, _)| id.clone())
            .collect();
        for id in &stale {
            tasks.remove(id);
        }
        stale
    }

    /// Number of registered tasks.
    pub async fn len(&self) -> usize {
        self.tasks.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.tasks.lock().await.is_empty()
    }
}

/// Periodically purges finished tasks that were never fetched and removes
/// their work directories.
///
/// Runs forever; spawn it once at startup.
pub async fn run_registry_janitor(registry: Arc<TaskRegistry>) {
    let mut interval = tokio::time::interval(config::cleanup::check_interval());
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        interval.tick().await;

        let stale = registry.purge_stale(config::cleanup::task_ttl()).await;
        if stale.is_empty() {
            continue;
        }

        log::info!("🧹 Purging {} stale task(s)", stale.len());
        for task_id in stale {
            let dir = config::work_dir().join(&task_id);
            if dir.exists() {
                if let Err(e) = tokio::fs::remove_dir_all(&dir).await {
                    log::warn!("Failed to remove stale work dir {}: {}", dir.display(), e);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    // ==================== TaskStatus Tests ====================

    #[test]
    fn test_task_status_wire_strings() {
        assert_eq!(TaskStatus::Pending.as_str(), "pending");
        assert_eq!(TaskStatus::Reencoding.as_str(), "re-encoding");
        assert_eq!(TaskStatus::Complete.as_str(), "complete");
        assert_eq!(TaskStatus::parse("merging"), Some(TaskStatus::Merging));
        assert_eq!(TaskStatus::parse("re-encoding"), Some(TaskStatus::Reencoding));
        assert_eq!(TaskStatus::parse("nope"), None);
        assert_eq!(TaskStatus::Downloading.to_string(), "downloading");
    }

    #[test]
    fn test_task_status_serializes_to_wire_string() {
        let json = serde_json::to_string(&TaskStatus::Reencoding).expect("serialize");
        assert_eq!(json, "\"re-encoding\"");
    }

    #[test]
    fn test_task_status_is_terminal() {
        assert!(TaskStatus::Complete.is_terminal());
        assert!(TaskStatus::Error.is_terminal());
        assert!(!TaskStatus::Pending.is_terminal());
        assert!(!TaskStatus::Downloading.is_terminal());
        assert!(!TaskStatus::Merging.is_terminal());
    }

    // ==================== TaskRegistry Tests ====================

    #[tokio::test]
    async fn test_create_registers_pending_task() {
        let registry = TaskRegistry::new();
        let id = registry.create().await;

        let state = registry.snapshot(&id).await.expect("task should exist");
        assert_eq!(state.status, TaskStatus::Pending);
        assert_eq!(state.progress, 0);
        assert_eq!(state.message, "Initializing...");
        assert_eq!(state.file_path, None);
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test]
    async fn test_snapshot_unknown_id_is_none() {
        let registry = TaskRegistry::new();
        assert!(registry.snapshot("missing").await.is_none());
    }

    #[tokio::test]
    async fn test_progress_never_moves_backwards() {
        let registry = TaskRegistry::new();
        let id = registry.create().await;

        registry.set_progress(&id, 50, "Downloading... (2.0 MiB/s)").await;
        registry.set_progress(&id, 30, "Downloading... (1.0 MiB/s)").await;

        let state = registry.snapshot(&id).await.expect("task should exist");
        assert_eq!(state.progress, 50);
        assert_eq!(state.status, TaskStatus::Downloading);
        assert_eq!(state.message, "Downloading... (2.0 MiB/s)");
    }

    #[tokio::test]
    async fn test_progress_suppresses_early_100() {
        let registry = TaskRegistry::new();
        let id = registry.create().await;

        registry.set_progress(&id, 10, "Downloading...").await;
        registry.set_progress(&id, 100, "Downloading...").await;
        let state = registry.snapshot(&id).await.expect("task should exist");
        assert_eq!(state.progress, 10);

        registry.set_progress(&id, 95, "Downloading...").await;
        registry.set_progress(&id, 100, "Downloading...").await;
        let state = registry.snapshot(&id).await.expect("task should exist");
        assert_eq!(state.progress, 100);
    }

    #[tokio::test]
    async fn test_set_status_with_progress_bypasses_clamp() {
        let registry = TaskRegistry::new();
        let id = registry.create().await;

        registry.set_progress(&id, 42, "Downloading...").await;
        registry
            .set_status_with_progress(&id, TaskStatus::Reencoding, "Re-encoding to 480p...", 0)
            .await;

        let state = registry.snapshot(&id).await.expect("task should exist");
        assert_eq!(state.status, TaskStatus::Reencoding);
        assert_eq!(state.progress, 0);
    }

    #[tokio::test]
    async fn test_complete_sets_payload() {
        let registry = TaskRegistry::new();
        let id = registry.create().await;

        registry
            .complete(&id, PathBuf::from("/tmp/vydra/x/final_video.mp4"), "clip.mp4".to_string())
            .await;

        let state = registry.snapshot(&id).await.expect("task should exist");
        assert_eq!(state.status, TaskStatus::Complete);
        assert_eq!(state.progress, 100);
        assert_eq!(state.message, "Download complete!");
        assert_eq!(state.filename.as_deref(), Some("clip.mp4"));
    }

    #[tokio::test]
    async fn test_terminal_task_ignores_further_updates() {
        let registry = TaskRegistry::new();
        let id = registry.create().await;

        registry.fail(&id, "boom").await;
        registry.set_status(&id, TaskStatus::Downloading, "Downloading...").await;
        registry.set_progress(&id, 99, "Downloading...").await;
        registry.fail(&id, "boom again").await;

        let state = registry.snapshot(&id).await.expect("task should exist");
        assert_eq!(state.status, TaskStatus::Error);
        assert_eq!(state.message, "boom");
    }

    #[tokio::test]
    async fn test_complete_cannot_overwrite_failed_task() {
        let registry = TaskRegistry::new();
        let id = registry.create().await;

        registry.fail(&id, "boom").await;
        registry
            .complete(&id, PathBuf::from("/tmp/vydra/x/final_video.mp4"), "clip.mp4".to_string())
            .await;

        let state = registry.snapshot(&id).await.expect("task should exist");
        assert_eq!(state.status, TaskStatus::Error);
        assert_eq!(state.message, "boom");
        assert_eq!(state.file_path, None);
        assert_eq!(state.filename, None);
    }

    #[tokio::test]
    async fn test_remove_returns_final_state() {
        let registry = TaskRegistry::new();
        let id = registry.create().await;
        registry.fail(&id, "nope").await;

        let removed = registry.remove(&id).await.expect("task should exist");
        assert_eq!(removed.status, TaskStatus::Error);
        assert!(registry.is_empty().await);
        assert!(registry.remove(&id).await.is_none());
    }

    #[tokio::test]
    async fn test_restore_puts_removed_task_back() {
        let registry = TaskRegistry::new();
        let id = registry.create().await;
        registry.set_progress(&id, 30, "Downloading...").await;

        let taken = registry.remove(&id).await.expect("task should exist");
        assert!(registry.is_empty().await);

        registry.restore(&id, taken).await;
        let state = registry.snapshot(&id).await.expect("task should exist");
        assert_eq!(state.status, TaskStatus::Downloading);
        assert_eq!(state.progress, 30);
    }

    #[tokio::test]
    async fn test_purge_stale_only_drops_old_terminal_tasks() {
        let registry = TaskRegistry::new();
        let done = registry.create().await;
        let active = registry.create().await;
        registry.complete(&done, PathBuf::from("/tmp/x.mp4"), "x.mp4".to_string()).await;
        registry.set_progress(&active, 10, "Downloading...").await;

        // Zero TTL makes any terminal task stale immediately
        tokio::time::sleep(Duration::from_millis(5)).await;
        let purged = registry.purge_stale(Duration::ZERO).await;
        assert_eq!(purged, vec![done.clone()]);
        assert!(registry.snapshot(&done).await.is_none());
        assert!(registry.snapshot(&active).await.is_some());

        // A generous TTL purges nothing
        let purged = registry.purge_stale(Duration::from_secs(3600)).await;
        assert!(purged.is_empty());
    }
}
