//! vydra - self-hosted web service for downloading videos at a chosen quality
//!
//! This library provides all the core functionality for the vydra service:
//! metadata extraction and download orchestration around yt-dlp, quality
//! re-encoding with ffmpeg, in-memory task tracking, and the HTTP API with
//! its embedded frontend.
//!
//! # Module Structure
//!
//! - `core`: Core utilities, configuration, errors, and logging
//! - `download`: yt-dlp orchestration, progress parsing, task registry
//! - `conversion`: ffmpeg/ffprobe helpers and quality re-encoding
//! - `web`: HTTP API, CORS, embedded frontend

pub mod conversion;
pub mod core;
pub mod download;
pub mod web;

// Re-export commonly used types for convenience
pub use crate::core::{config, AppError, AppResult};
pub use crate::download::{TaskRegistry, TaskState, TaskStatus, VideoInfo};
pub use crate::web::{build_router, start_web_server, WebState};
