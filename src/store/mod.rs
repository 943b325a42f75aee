//! Scene storage.
//!
//! [`SceneStore`] is the durable keyed storage the queue and the stream
//! negotiator persist through. The production implementation wraps the SQLite
//! pool; tests may use it with an in-memory pool or substitute their own.

use scenevault_common::{Error, Result, SceneId};
use scenevault_db::models::{Image, Marker, Scene};
use scenevault_db::pool::DbPool;
use scenevault_db::queries::{images, markers, scenes};

/// Durable keyed storage for scene records and their derivatives.
pub trait SceneStore: Send + Sync {
    /// Look up a scene by ID.
    fn get_by_id(&self, id: SceneId) -> Result<Option<Scene>>;

    /// Look up a scene by its filesystem path.
    fn get_by_path(&self, path: &str) -> Result<Option<Scene>>;

    /// Insert or update a scene record.
    fn upsert(&self, scene: &Scene) -> Result<()>;

    /// IDs of scenes with a path but missing probe metadata.
    fn find_unprobed(&self) -> Result<Vec<SceneId>>;

    /// Clear the path of a scene whose backing file disappeared.
    fn clear_path(&self, id: SceneId) -> Result<()>;

    /// Persist a derived image.
    fn add_image(&self, image: &Image) -> Result<()>;

    /// Replace a scene's markers.
    fn replace_markers(&self, scene_id: SceneId, markers: &[Marker]) -> Result<()>;

    /// A scene's markers, ordered by timestamp.
    fn markers(&self, scene_id: SceneId) -> Result<Vec<Marker>>;
}

/// SQLite-backed scene store.
pub struct SqliteSceneStore {
    pool: DbPool,
}

impl SqliteSceneStore {
    /// Create a store over an initialized pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn conn(&self) -> Result<scenevault_db::pool::PooledConnection> {
        self.pool.get().map_err(|e| Error::database(e.to_string()))
    }
}

impl SceneStore for SqliteSceneStore {
    fn get_by_id(&self, id: SceneId) -> Result<Option<Scene>> {
        scenes::get_scene(&*self.conn()?, id)
    }

    fn get_by_path(&self, path: &str) -> Result<Option<Scene>> {
        scenes::get_scene_by_path(&*self.conn()?, path)
    }

    fn upsert(&self, scene: &Scene) -> Result<()> {
        scenes::upsert_scene(&*self.conn()?, scene)
    }

    fn find_unprobed(&self) -> Result<Vec<SceneId>> {
        scenes::list_unprobed(&*self.conn()?)
    }

    fn clear_path(&self, id: SceneId) -> Result<()> {
        scenes::clear_scene_path(&*self.conn()?, id)
    }

    fn add_image(&self, image: &Image) -> Result<()> {
        images::insert_image(&*self.conn()?, image)
    }

    fn replace_markers(&self, scene_id: SceneId, marker_rows: &[Marker]) -> Result<()> {
        markers::replace_markers(&*self.conn()?, scene_id, marker_rows)
    }

    fn markers(&self, scene_id: SceneId) -> Result<Vec<Marker>> {
        markers::list_markers(&*self.conn()?, scene_id)
    }
}
