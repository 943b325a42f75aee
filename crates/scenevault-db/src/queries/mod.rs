//! Typed query functions over the scenevault schema.

pub mod images;
pub mod markers;
pub mod queue_items;
pub mod scenes;

use rusqlite::types::Type;
use scenevault_common::{ImageId, MarkerId, SceneId};

/// Convert a stored UUID string into a SceneId, surfacing corruption as a
/// conversion failure instead of panicking.
pub(crate) fn scene_id_from_column(idx: usize, s: String) -> rusqlite::Result<SceneId> {
    SceneId::parse(&s)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

pub(crate) fn image_id_from_column(idx: usize, s: String) -> rusqlite::Result<ImageId> {
    ImageId::parse(&s)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

pub(crate) fn marker_id_from_column(idx: usize, s: String) -> rusqlite::Result<MarkerId> {
    MarkerId::parse(&s)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}
