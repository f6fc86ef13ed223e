//! Download management and processing

pub mod metadata;
pub mod progress;
pub mod task;
pub mod video;
pub mod ytdlp;
pub mod ytdlp_errors;

// Re-exports for convenience
pub use metadata::VideoInfo;
pub use task::{TaskRegistry, TaskState, TaskStatus};
pub use video::run_download_task;
