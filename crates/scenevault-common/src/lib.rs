//! Scenevault-Common: Shared types, constants, and utilities.
//!
//! This crate provides common functionality used across scenevault:
//!
//! - **Typed IDs**: Type-safe UUID wrappers for scenes, images, and markers
//! - **Core Types**: Enums for containers, video codecs, and stream kinds
//! - **Path Utilities**: Functions to detect file types by extension
//! - **Error Handling**: Common error types and result aliases
//!
//! # Examples
//!
//! ```
//! use scenevault_common::{SceneId, Container, Error, Result};
//! use scenevault_common::paths::is_video_file;
//! use std::path::Path;
//!
//! // Create typed IDs
//! let scene_id = SceneId::new();
//!
//! // Work with container formats
//! let container = Container::Mkv;
//!
//! // Check file types
//! assert!(is_video_file(Path::new("movie.mkv")));
//!
//! // Use common error types
//! fn example() -> Result<()> {
//!     Err(Error::not_found("scene"))
//! }
//! ```

pub mod error;
pub mod ids;
pub mod paths;
pub mod types;

pub use error::{Error, Result};
pub use ids::*;
pub use types::*;
