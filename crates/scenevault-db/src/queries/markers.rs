//! Scene marker query operations.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};
use scenevault_common::{Error, Result, SceneId};

use super::{marker_id_from_column, scene_id_from_column};
use crate::models::Marker;

fn marker_from_row(row: &Row<'_>) -> rusqlite::Result<Marker> {
    Ok(Marker {
        id: marker_id_from_column(0, row.get::<_, String>(0)?)?,
        scene_id: scene_id_from_column(1, row.get::<_, String>(1)?)?,
        time_secs: row.get(2)?,
        created_at: DateTime::parse_from_rfc3339(&row.get::<_, String>(3)?)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now()),
    })
}

/// Replace all markers for a scene in one transaction.
pub fn replace_markers(conn: &Connection, scene_id: SceneId, markers: &[Marker]) -> Result<()> {
    let tx = conn
        .unchecked_transaction()
        .map_err(|e| Error::database(e.to_string()))?;

    tx.execute(
        "DELETE FROM markers WHERE scene_id = ?",
        [scene_id.to_string()],
    )
    .map_err(|e| Error::database(e.to_string()))?;

    for marker in markers {
        tx.execute(
            "INSERT INTO markers (id, scene_id, time_secs, created_at) VALUES (?, ?, ?, ?)",
            params![
                marker.id.to_string(),
                marker.scene_id.to_string(),
                marker.time_secs,
                marker.created_at.to_rfc3339(),
            ],
        )
        .map_err(|e| Error::database(e.to_string()))?;
    }

    tx.commit().map_err(|e| Error::database(e.to_string()))?;

    Ok(())
}

/// List a scene's markers ordered by timestamp.
pub fn list_markers(conn: &Connection, scene_id: SceneId) -> Result<Vec<Marker>> {
    let mut stmt = conn
        .prepare(
            "SELECT id, scene_id, time_secs, created_at
             FROM markers WHERE scene_id = ? ORDER BY time_secs",
        )
        .map_err(|e| Error::database(e.to_string()))?;

    let markers = stmt
        .query_map([scene_id.to_string()], marker_from_row)
        .map_err(|e| Error::database(e.to_string()))?
        .collect::<rusqlite::Result<Vec<_>>>()
        .map_err(|e| Error::database(e.to_string()))?;

    Ok(markers)
}
