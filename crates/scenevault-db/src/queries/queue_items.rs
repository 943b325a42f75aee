//! Processing queue backlog operations.
//!
//! The queue is a durable FIFO keyed by a monotonically increasing position.
//! Enqueue is idempotent per scene; a requeued item is moved to the tail by
//! reassigning its position in a single statement.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use scenevault_common::{Error, Result, SceneId};

use super::scene_id_from_column;
use crate::models::QueueItem;

fn item_from_row(row: &Row<'_>) -> rusqlite::Result<QueueItem> {
    Ok(QueueItem {
        position: row.get(0)?,
        scene_id: scene_id_from_column(1, row.get::<_, String>(1)?)?,
        attempts: row.get(2)?,
        enqueued_at: DateTime::parse_from_rfc3339(&row.get::<_, String>(3)?)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now()),
    })
}

/// Append a scene to the queue tail with zero attempts.
///
/// Idempotent: if the scene is already queued, nothing changes. Returns
/// whether a new item was inserted.
pub fn enqueue(conn: &Connection, scene_id: SceneId) -> Result<bool> {
    let changed = conn
        .execute(
            "INSERT OR IGNORE INTO queue_items (position, scene_id, attempts, enqueued_at)
             VALUES ((SELECT IFNULL(MAX(position), 0) + 1 FROM queue_items), ?, 0, ?)",
            params![scene_id.to_string(), Utc::now().to_rfc3339()],
        )
        .map_err(|e| Error::database(e.to_string()))?;

    Ok(changed > 0)
}

/// Current backlog size.
pub fn queue_len(conn: &Connection) -> Result<usize> {
    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM queue_items", [], |row| row.get(0))
        .map_err(|e| Error::database(e.to_string()))?;

    Ok(count as usize)
}

/// The item at the head of the queue, if any.
pub fn peek_front(conn: &Connection) -> Result<Option<QueueItem>> {
    conn.query_row(
        "SELECT position, scene_id, attempts, enqueued_at
         FROM queue_items ORDER BY position LIMIT 1",
        [],
        item_from_row,
    )
    .optional()
    .map_err(|e| Error::database(e.to_string()))
}

/// Remove a scene's queue item (on success or permanent failure).
pub fn remove(conn: &Connection, scene_id: SceneId) -> Result<()> {
    conn.execute(
        "DELETE FROM queue_items WHERE scene_id = ?",
        [scene_id.to_string()],
    )
    .map_err(|e| Error::database(e.to_string()))?;

    Ok(())
}

/// Move an item to the queue tail with an updated attempt count.
///
/// The position reassignment and counter update happen in one statement so a
/// crash can never leave the item half-requeued.
pub fn requeue_back(conn: &Connection, scene_id: SceneId, attempts: u32) -> Result<()> {
    conn.execute(
        "UPDATE queue_items
         SET position = (SELECT IFNULL(MAX(position), 0) + 1 FROM queue_items),
             attempts = ?,
             enqueued_at = ?
         WHERE scene_id = ?",
        params![attempts, Utc::now().to_rfc3339(), scene_id.to_string()],
    )
    .map_err(|e| Error::database(e.to_string()))?;

    Ok(())
}

/// Whether a scene is currently queued.
pub fn contains(conn: &Connection, scene_id: SceneId) -> Result<bool> {
    let exists: bool = conn
        .query_row(
            "SELECT EXISTS(SELECT 1 FROM queue_items WHERE scene_id = ?)",
            [scene_id.to_string()],
            |row| row.get(0),
        )
        .map_err(|e| Error::database(e.to_string()))?;

    Ok(exists)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::init_memory_pool;

    #[test]
    fn test_enqueue_is_idempotent() {
        let pool = init_memory_pool().unwrap();
        let conn = pool.get().unwrap();

        let id = SceneId::new();
        assert!(enqueue(&conn, id).unwrap());
        assert!(!enqueue(&conn, id).unwrap());
        assert_eq!(queue_len(&conn).unwrap(), 1);
    }

    #[test]
    fn test_fifo_order() {
        let pool = init_memory_pool().unwrap();
        let conn = pool.get().unwrap();

        let first = SceneId::new();
        let second = SceneId::new();
        enqueue(&conn, first).unwrap();
        enqueue(&conn, second).unwrap();

        let head = peek_front(&conn).unwrap().unwrap();
        assert_eq!(head.scene_id, first);
        assert_eq!(head.attempts, 0);

        remove(&conn, first).unwrap();
        let head = peek_front(&conn).unwrap().unwrap();
        assert_eq!(head.scene_id, second);
    }

    #[test]
    fn test_requeue_moves_to_tail() {
        let pool = init_memory_pool().unwrap();
        let conn = pool.get().unwrap();

        let first = SceneId::new();
        let second = SceneId::new();
        enqueue(&conn, first).unwrap();
        enqueue(&conn, second).unwrap();

        requeue_back(&conn, first, 1).unwrap();

        let head = peek_front(&conn).unwrap().unwrap();
        assert_eq!(head.scene_id, second);

        remove(&conn, second).unwrap();
        let head = peek_front(&conn).unwrap().unwrap();
        assert_eq!(head.scene_id, first);
        assert_eq!(head.attempts, 1);
    }

    #[test]
    fn test_contains_and_remove() {
        let pool = init_memory_pool().unwrap();
        let conn = pool.get().unwrap();

        let id = SceneId::new();
        assert!(!contains(&conn, id).unwrap());
        enqueue(&conn, id).unwrap();
        assert!(contains(&conn, id).unwrap());
        remove(&conn, id).unwrap();
        assert!(!contains(&conn, id).unwrap());
        assert!(peek_front(&conn).unwrap().is_none());
    }
}
