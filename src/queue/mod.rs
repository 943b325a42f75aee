//! Durable processing queue.
//!
//! Scenes discovered by the scanner wait here for probing and derivative
//! generation. The backlog lives in SQLite so it survives restarts; the loop
//! itself is a singleton that drains the backlog strictly in FIFO order, one
//! item at a time.
//!
//! Probing and generation are independent steps: a scene can come out of the
//! queue with metadata but no derivatives, or the other way around. Transient
//! failures requeue the item at the tail with a bumped attempt counter until
//! the attempt ceiling drops it; permanent failures drop it immediately.

use crate::generate::DerivativeGenerator;
use crate::probe::{self, ProbeError, SceneProber};
use crate::store::SceneStore;
use chrono::Utc;
use scenevault_common::{Error, ImageKind, Result, SceneId};
use scenevault_db::models::{Image, Marker, QueueItem, Scene};
use scenevault_db::pool::DbPool;
use scenevault_db::queries::queue_items;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Default ceiling on processing attempts per item.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// What happened to a single queue item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ItemOutcome {
    /// Fully processed (including permanent failures, which are not retried).
    Completed,
    /// Transient failure, moved back to the tail.
    Requeued,
    /// Transient failures exhausted the attempt ceiling.
    Dropped,
    /// Scene vanished or lost its path; nothing to do.
    Skipped,
}

/// Accounting for one drain of the backlog.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProcessSummary {
    pub completed: usize,
    pub requeued: usize,
    pub dropped: usize,
    pub skipped: usize,
}

impl ProcessSummary {
    fn record(&mut self, outcome: ItemOutcome) {
        match outcome {
            ItemOutcome::Completed => self.completed += 1,
            ItemOutcome::Requeued => self.requeued += 1,
            ItemOutcome::Dropped => self.dropped += 1,
            ItemOutcome::Skipped => self.skipped += 1,
        }
    }
}

/// The sequential processing queue.
///
/// Enqueueing is cheap and idempotent; [`process_loop`](Self::process_loop)
/// does the actual work and only one invocation may run at a time.
pub struct ProcessingQueue {
    pool: DbPool,
    store: Arc<dyn SceneStore>,
    prober: Arc<dyn SceneProber>,
    generator: Arc<dyn DerivativeGenerator>,
    max_attempts: u32,
    running: AtomicBool,
    stop_requested: AtomicBool,
}

impl ProcessingQueue {
    pub fn new(
        pool: DbPool,
        store: Arc<dyn SceneStore>,
        prober: Arc<dyn SceneProber>,
        generator: Arc<dyn DerivativeGenerator>,
        max_attempts: u32,
    ) -> Self {
        Self {
            pool,
            store,
            prober,
            generator,
            max_attempts,
            running: AtomicBool::new(false),
            stop_requested: AtomicBool::new(false),
        }
    }

    /// Append a scene to the backlog tail. Returns whether the scene was newly
    /// queued; a scene already in the backlog is left where it is.
    pub fn enqueue(&self, scene_id: SceneId) -> Result<bool> {
        let conn = self.conn()?;
        let inserted = queue_items::enqueue(&conn, scene_id)?;
        if inserted {
            debug!(scene_id = %scene_id, "Enqueued scene for processing");
        }
        Ok(inserted)
    }

    /// Current backlog size.
    pub fn len(&self) -> Result<usize> {
        queue_items::queue_len(&*self.conn()?)
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Whether the processing loop is currently running.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Ask a running loop to stop. Takes effect between items; the item being
    /// processed finishes normally.
    pub fn request_stop(&self) {
        self.stop_requested.store(true, Ordering::SeqCst);
    }

    /// Drain the backlog until it is empty or a stop is requested.
    ///
    /// Only one loop may run at a time; a second concurrent call is a no-op
    /// returning immediately with an empty summary and the backlog untouched.
    /// Storage errors abort the loop and surface to the caller.
    pub async fn process_loop(&self) -> Result<ProcessSummary> {
        if self
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            info!("Processing loop already running, ignoring start request");
            return Ok(ProcessSummary::default());
        }
        self.stop_requested.store(false, Ordering::SeqCst);

        let result = self.drain().await;
        self.running.store(false, Ordering::SeqCst);
        result
    }

    async fn drain(&self) -> Result<ProcessSummary> {
        let mut summary = ProcessSummary::default();
        info!(backlog = self.len()?, "Processing queue started");

        loop {
            if self.stop_requested.load(Ordering::SeqCst) {
                info!("Stop requested, leaving remaining items in the backlog");
                break;
            }

            let Some(item) = queue_items::peek_front(&*self.conn()?)? else {
                break;
            };

            let outcome = self.process_item(&item).await?;
            summary.record(outcome);
        }

        info!(
            completed = summary.completed,
            requeued = summary.requeued,
            dropped = summary.dropped,
            skipped = summary.skipped,
            "Processing queue finished"
        );
        Ok(summary)
    }

    async fn process_item(&self, item: &QueueItem) -> Result<ItemOutcome> {
        let Some(mut scene) = self.store.get_by_id(item.scene_id)? else {
            warn!(scene_id = %item.scene_id, "Queued scene no longer exists, skipping");
            queue_items::remove(&*self.conn()?, item.scene_id)?;
            return Ok(ItemOutcome::Skipped);
        };
        let Some(path) = scene.path.clone() else {
            debug!(scene_id = %scene.id, "Queued scene has no path, skipping");
            queue_items::remove(&*self.conn()?, scene.id)?;
            return Ok(ItemOutcome::Skipped);
        };

        debug!(
            scene_id = %scene.id,
            attempts = item.attempts,
            "Processing {}", path
        );

        let mut transient_failure = false;

        if scene.is_unprobed() {
            match self.prober.probe(Path::new(&path)).await {
                Ok(meta) => {
                    probe::apply_to_scene(&mut scene, &meta);
                    scene.updated_at = Utc::now();
                    self.store.upsert(&scene)?;
                    debug!(scene_id = %scene.id, "Probed {}", path);
                }
                // The file vanished out from under us. Not a failure of this
                // component: clear the stale path and discard the item.
                Err(ProbeError::NotFound(_)) => {
                    warn!(scene_id = %scene.id, "File vanished, discarding: {}", path);
                    self.store.clear_path(scene.id)?;
                    queue_items::remove(&*self.conn()?, scene.id)?;
                    return Ok(ItemOutcome::Skipped);
                }
                Err(e @ ProbeError::Unreadable(_)) => {
                    warn!(scene_id = %scene.id, "Discarding unreadable file: {}", e);
                    queue_items::remove(&*self.conn()?, scene.id)?;
                    return Ok(ItemOutcome::Skipped);
                }
                Err(e) if e.is_retryable() => {
                    warn!(scene_id = %scene.id, "Probe failed (will retry): {}", e);
                    transient_failure = true;
                }
                Err(e) => {
                    warn!(scene_id = %scene.id, "Probe failed permanently: {}", e);
                }
            }
        }

        if scene.missing_derivatives() {
            match self.generator.generate(&scene).await {
                Ok(derivatives) => {
                    self.persist_derivatives(&mut scene, derivatives)?;
                    debug!(scene_id = %scene.id, "Generated derivatives for {}", path);
                }
                Err(e) => {
                    warn!(scene_id = %scene.id, "Derivative generation failed (will retry): {}", e);
                    transient_failure = true;
                }
            }
        }

        if transient_failure {
            let attempts = item.attempts + 1;
            if attempts < self.max_attempts {
                queue_items::requeue_back(&*self.conn()?, scene.id, attempts)?;
                return Ok(ItemOutcome::Requeued);
            }
            warn!(
                scene_id = %scene.id,
                attempts, "Attempt ceiling reached, dropping scene from the queue"
            );
            queue_items::remove(&*self.conn()?, scene.id)?;
            return Ok(ItemOutcome::Dropped);
        }

        queue_items::remove(&*self.conn()?, scene.id)?;
        Ok(ItemOutcome::Completed)
    }

    fn persist_derivatives(
        &self,
        scene: &mut Scene,
        derivatives: crate::generate::Derivatives,
    ) -> Result<()> {
        let mut scene_changed = false;

        if let (None, Some(path)) = (scene.thumbnail, derivatives.thumbnail) {
            let image = Image::new(scene.id, ImageKind::Thumbnail, path.to_string_lossy());
            self.store.add_image(&image)?;
            scene.thumbnail = Some(image.id);
            scene_changed = true;
        }
        if let (None, Some(path)) = (scene.preview, derivatives.preview) {
            let image = Image::new(scene.id, ImageKind::Preview, path.to_string_lossy());
            self.store.add_image(&image)?;
            scene.preview = Some(image.id);
            scene_changed = true;
        }
        if !derivatives.markers.is_empty() {
            let markers: Vec<Marker> = derivatives
                .markers
                .iter()
                .map(|&t| Marker::new(scene.id, t))
                .collect();
            self.store.replace_markers(scene.id, &markers)?;
        }

        if scene_changed {
            scene.updated_at = Utc::now();
            self.store.upsert(scene)?;
        }
        Ok(())
    }

    fn conn(&self) -> Result<scenevault_db::pool::PooledConnection> {
        self.pool.get().map_err(|e| Error::database(e.to_string()))
    }
}
