//! Internal Rust models matching the database schema.
//!
//! This module provides strongly-typed structures that map to database tables.
//! All models use types from scenevault-common where appropriate.

use chrono::{DateTime, Utc};
use scenevault_common::{Container, ImageId, ImageKind, MarkerId, SceneId, VideoCodec};
use serde::{Deserialize, Serialize};

/// Scene model: one video file in the library plus its probed metadata and
/// derived asset references.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Scene {
    pub id: SceneId,
    /// Absolute filesystem location. Cleared if the backing file disappears.
    pub path: Option<String>,
    pub container: Option<Container>,
    pub video_codec: Option<VideoCodec>,
    pub audio_codec: Option<String>,
    pub duration_secs: Option<f64>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub thumbnail: Option<ImageId>,
    pub preview: Option<ImageId>,
    pub added_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Scene {
    /// Create a new scene for a freshly discovered file, with empty metadata.
    pub fn new(path: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: SceneId::new(),
            path: Some(path.into()),
            container: None,
            video_codec: None,
            audio_codec: None,
            duration_secs: None,
            width: None,
            height: None,
            thumbnail: None,
            preview: None,
            added_at: now,
            updated_at: now,
        }
    }

    /// A scene with a path but no probed container/codec is unprobed and
    /// eligible for (re-)enqueue.
    pub fn is_unprobed(&self) -> bool {
        self.path.is_some() && (self.container.is_none() || self.video_codec.is_none())
    }

    /// Whether any derivative (thumbnail, preview) is still missing.
    pub fn missing_derivatives(&self) -> bool {
        self.thumbnail.is_none() || self.preview.is_none()
    }
}

/// Derived image model (thumbnail or preview frame).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Image {
    pub id: ImageId,
    pub scene_id: SceneId,
    pub kind: ImageKind,
    pub path: String,
    pub created_at: DateTime<Utc>,
}

impl Image {
    /// Create a new image record for a scene.
    pub fn new(scene_id: SceneId, kind: ImageKind, path: impl Into<String>) -> Self {
        Self {
            id: ImageId::new(),
            scene_id,
            kind,
            path: path.into(),
            created_at: Utc::now(),
        }
    }
}

/// Scene marker model: a timestamp within a scene.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Marker {
    pub id: MarkerId,
    pub scene_id: SceneId,
    pub time_secs: f64,
    pub created_at: DateTime<Utc>,
}

impl Marker {
    /// Create a new marker at the given timestamp.
    pub fn new(scene_id: SceneId, time_secs: f64) -> Self {
        Self {
            id: MarkerId::new(),
            scene_id,
            time_secs,
            created_at: Utc::now(),
        }
    }
}

/// One pending unit of work in the processing queue.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QueueItem {
    /// FIFO ordering key; assigned on insert, reassigned on requeue.
    pub position: i64,
    pub scene_id: SceneId,
    /// Count of prior failed attempts.
    pub attempts: u32,
    pub enqueued_at: DateTime<Utc>,
}
