//! Derived image query operations.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use scenevault_common::{Error, ImageId, Result};

use super::{image_id_from_column, scene_id_from_column};
use crate::models::Image;

fn image_from_row(row: &Row<'_>) -> rusqlite::Result<Image> {
    Ok(Image {
        id: image_id_from_column(0, row.get::<_, String>(0)?)?,
        scene_id: scene_id_from_column(1, row.get::<_, String>(1)?)?,
        kind: row
            .get::<_, String>(2)?
            .parse()
            .map_err(|_| rusqlite::Error::InvalidQuery)?,
        path: row.get(3)?,
        created_at: DateTime::parse_from_rfc3339(&row.get::<_, String>(4)?)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now()),
    })
}

/// Insert a derived image row.
pub fn insert_image(conn: &Connection, image: &Image) -> Result<()> {
    conn.execute(
        "INSERT INTO images (id, scene_id, kind, path, created_at) VALUES (?, ?, ?, ?, ?)",
        params![
            image.id.to_string(),
            image.scene_id.to_string(),
            image.kind.to_string(),
            image.path,
            image.created_at.to_rfc3339(),
        ],
    )
    .map_err(|e| Error::database(e.to_string()))?;

    Ok(())
}

/// Get an image by ID.
pub fn get_image(conn: &Connection, id: ImageId) -> Result<Option<Image>> {
    conn.query_row(
        "SELECT id, scene_id, kind, path, created_at FROM images WHERE id = ?",
        [id.to_string()],
        image_from_row,
    )
    .optional()
    .map_err(|e| Error::database(e.to_string()))
}
