//! Scene query operations.
//!
//! CRUD for scene rows plus the "unprobed scenes" lookup the processing queue
//! uses on rescan.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use scenevault_common::{Error, Result, SceneId};

use super::{image_id_from_column, scene_id_from_column};
use crate::models::Scene;

const SCENE_COLUMNS: &str = "id, path, container, video_codec, audio_codec, duration_secs, \
     width, height, thumbnail_id, preview_id, added_at, updated_at";

fn scene_from_row(row: &Row<'_>) -> rusqlite::Result<Scene> {
    Ok(Scene {
        id: scene_id_from_column(0, row.get::<_, String>(0)?)?,
        path: row.get(1)?,
        container: row
            .get::<_, Option<String>>(2)?
            .and_then(|s| s.parse().ok()),
        video_codec: row
            .get::<_, Option<String>>(3)?
            .and_then(|s| s.parse().ok()),
        audio_codec: row.get(4)?,
        duration_secs: row.get(5)?,
        width: row.get(6)?,
        height: row.get(7)?,
        thumbnail: row
            .get::<_, Option<String>>(8)?
            .map(|s| image_id_from_column(8, s))
            .transpose()?,
        preview: row
            .get::<_, Option<String>>(9)?
            .map(|s| image_id_from_column(9, s))
            .transpose()?,
        added_at: parse_timestamp(row.get::<_, String>(10)?),
        updated_at: parse_timestamp(row.get::<_, String>(11)?),
    })
}

fn parse_timestamp(s: String) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(&s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

/// Insert or update a scene row.
pub fn upsert_scene(conn: &Connection, scene: &Scene) -> Result<()> {
    conn.execute(
        "INSERT INTO scenes (id, path, container, video_codec, audio_codec, duration_secs,
                             width, height, thumbnail_id, preview_id, added_at, updated_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
         ON CONFLICT(id) DO UPDATE SET
             path = excluded.path,
             container = excluded.container,
             video_codec = excluded.video_codec,
             audio_codec = excluded.audio_codec,
             duration_secs = excluded.duration_secs,
             width = excluded.width,
             height = excluded.height,
             thumbnail_id = excluded.thumbnail_id,
             preview_id = excluded.preview_id,
             updated_at = excluded.updated_at",
        params![
            scene.id.to_string(),
            scene.path,
            scene.container.map(|c| c.to_string()),
            scene.video_codec.map(|c| c.to_string()),
            scene.audio_codec,
            scene.duration_secs,
            scene.width,
            scene.height,
            scene.thumbnail.map(|id| id.to_string()),
            scene.preview.map(|id| id.to_string()),
            scene.added_at.to_rfc3339(),
            scene.updated_at.to_rfc3339(),
        ],
    )
    .map_err(|e| Error::database(e.to_string()))?;

    Ok(())
}

/// Get a scene by ID.
pub fn get_scene(conn: &Connection, id: SceneId) -> Result<Option<Scene>> {
    conn.query_row(
        &format!("SELECT {} FROM scenes WHERE id = ?", SCENE_COLUMNS),
        [id.to_string()],
        scene_from_row,
    )
    .optional()
    .map_err(|e| Error::database(e.to_string()))
}

/// Get a scene by its filesystem path.
pub fn get_scene_by_path(conn: &Connection, path: &str) -> Result<Option<Scene>> {
    conn.query_row(
        &format!("SELECT {} FROM scenes WHERE path = ?", SCENE_COLUMNS),
        [path],
        scene_from_row,
    )
    .optional()
    .map_err(|e| Error::database(e.to_string()))
}

/// List IDs of scenes that have a path but no probed container or codec.
pub fn list_unprobed(conn: &Connection) -> Result<Vec<SceneId>> {
    let mut stmt = conn
        .prepare(
            "SELECT id FROM scenes
             WHERE path IS NOT NULL AND (container IS NULL OR video_codec IS NULL)
             ORDER BY added_at",
        )
        .map_err(|e| Error::database(e.to_string()))?;

    let ids = stmt
        .query_map([], |row| scene_id_from_column(0, row.get::<_, String>(0)?))
        .map_err(|e| Error::database(e.to_string()))?
        .collect::<rusqlite::Result<Vec<_>>>()
        .map_err(|e| Error::database(e.to_string()))?;

    Ok(ids)
}

/// Clear the path of a scene whose backing file has disappeared.
pub fn clear_scene_path(conn: &Connection, id: SceneId) -> Result<()> {
    conn.execute(
        "UPDATE scenes SET path = NULL, updated_at = ? WHERE id = ?",
        params![Utc::now().to_rfc3339(), id.to_string()],
    )
    .map_err(|e| Error::database(e.to_string()))?;

    Ok(())
}
