//! Typed ID wrappers for type safety across scenevault.
//!
//! This module provides newtype wrappers around UUIDs to prevent mixing
//! different kinds of identifiers (e.g., using an ImageId where a SceneId is
//! expected).

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a scene (one video file in the library).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SceneId(Uuid);

impl SceneId {
    /// Generate a new random scene ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse a scene ID from its string form.
    pub fn parse(s: &str) -> Result<Self, uuid::Error> {
        Uuid::parse_str(s).map(Self)
    }
}

impl Default for SceneId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for SceneId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl From<SceneId> for Uuid {
    fn from(id: SceneId) -> Self {
        id.0
    }
}

impl std::fmt::Display for SceneId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a derived image (thumbnail or preview).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageId(Uuid);

impl ImageId {
    /// Generate a new random image ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse an image ID from its string form.
    pub fn parse(s: &str) -> Result<Self, uuid::Error> {
        Uuid::parse_str(s).map(Self)
    }
}

impl Default for ImageId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for ImageId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl From<ImageId> for Uuid {
    fn from(id: ImageId) -> Self {
        id.0
    }
}

impl std::fmt::Display for ImageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a scene marker (a timestamp within a scene).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MarkerId(Uuid);

impl MarkerId {
    /// Generate a new random marker ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse a marker ID from its string form.
    pub fn parse(s: &str) -> Result<Self, uuid::Error> {
        Uuid::parse_str(s).map(Self)
    }
}

impl Default for MarkerId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for MarkerId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl From<MarkerId> for Uuid {
    fn from(id: MarkerId) -> Self {
        id.0
    }
}

impl std::fmt::Display for MarkerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
