//! Library folder scanning.
//!
//! Walks the configured library roots, creates scene records for newly
//! discovered video files, and feeds every unprobed scene into the processing
//! queue. Exclude patterns are matched case-insensitively against the full
//! path; pattern validity is enforced at config load, not here.

use crate::queue::ProcessingQueue;
use crate::store::SceneStore;
use regex::Regex;
use scenevault_common::paths::is_video_file;
use scenevault_common::Result;
use scenevault_db::models::Scene;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Accounting for one library scan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanSummary {
    /// New scene records created.
    pub discovered: usize,
    /// Video files already tracked.
    pub known: usize,
    /// Video files skipped by an exclude pattern.
    pub excluded: usize,
    /// Scenes enqueued for processing (new or previously unprobed).
    pub enqueued: usize,
}

/// Walks library folders and registers video files as scenes.
pub struct Scanner {
    store: Arc<dyn SceneStore>,
    excludes: Vec<Regex>,
}

impl Scanner {
    pub fn new(store: Arc<dyn SceneStore>, excludes: Vec<Regex>) -> Self {
        Self { store, excludes }
    }

    /// Scan the given roots, then enqueue every unprobed scene.
    ///
    /// Unreadable entries and missing roots are logged and skipped; only
    /// storage failures abort the scan.
    pub fn scan(&self, roots: &[impl AsRef<Path>], queue: &ProcessingQueue) -> Result<ScanSummary> {
        let mut summary = ScanSummary::default();

        for root in roots {
            let root = root.as_ref();
            if !root.is_dir() {
                warn!("Library path is not a directory, skipping: {}", root.display());
                continue;
            }
            info!("Scanning {}", root.display());

            for entry in WalkDir::new(root).follow_links(false) {
                let entry = match entry {
                    Ok(entry) => entry,
                    Err(e) => {
                        warn!("Skipping unreadable entry: {}", e);
                        continue;
                    }
                };
                if !entry.file_type().is_file() || !is_video_file(entry.path()) {
                    continue;
                }
                self.register(entry.path(), &mut summary)?;
            }
        }

        for scene_id in self.store.find_unprobed()? {
            if queue.enqueue(scene_id)? {
                summary.enqueued += 1;
            }
        }

        info!(
            discovered = summary.discovered,
            known = summary.known,
            excluded = summary.excluded,
            enqueued = summary.enqueued,
            "Scan finished"
        );
        Ok(summary)
    }

    fn register(&self, path: &Path, summary: &mut ScanSummary) -> Result<()> {
        let path_str = path.to_string_lossy();

        if self.is_excluded(&path_str) {
            debug!("Excluded by pattern: {}", path_str);
            summary.excluded += 1;
            return Ok(());
        }

        if self.store.get_by_path(&path_str)?.is_some() {
            summary.known += 1;
            return Ok(());
        }

        let scene = Scene::new(path_str.as_ref());
        self.store.upsert(&scene)?;
        info!(scene_id = %scene.id, "Discovered {}", path_str);
        summary.discovered += 1;
        Ok(())
    }

    fn is_excluded(&self, path: &str) -> bool {
        let lowered = path.to_lowercase();
        self.excludes.iter().any(|re| re.is_match(&lowered))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generate::{DerivativeError, DerivativeGenerator, Derivatives};
    use crate::probe::{ProbeError, ProbedMeta, SceneProber};
    use crate::queue::{ProcessingQueue, DEFAULT_MAX_ATTEMPTS};
    use crate::store::SqliteSceneStore;
    use async_trait::async_trait;
    use scenevault_db::pool::init_memory_pool;
    use std::fs;

    struct NoopProber;

    #[async_trait]
    impl SceneProber for NoopProber {
        async fn probe(&self, path: &Path) -> std::result::Result<ProbedMeta, ProbeError> {
            Err(ProbeError::Unreadable(path.to_path_buf()))
        }
    }

    struct NoopGenerator;

    #[async_trait]
    impl DerivativeGenerator for NoopGenerator {
        async fn generate(
            &self,
            _scene: &Scene,
        ) -> std::result::Result<Derivatives, DerivativeError> {
            Ok(Derivatives::default())
        }
    }

    fn fixtures() -> (Arc<SqliteSceneStore>, ProcessingQueue) {
        let pool = init_memory_pool().unwrap();
        let store = Arc::new(SqliteSceneStore::new(pool.clone()));
        let queue = ProcessingQueue::new(
            pool,
            store.clone(),
            Arc::new(NoopProber),
            Arc::new(NoopGenerator),
            DEFAULT_MAX_ATTEMPTS,
        );
        (store, queue)
    }

    #[test]
    fn test_scan_discovers_and_enqueues_videos() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("movie.mkv"), b"").unwrap();
        fs::write(dir.path().join("clip.mp4"), b"").unwrap();
        fs::write(dir.path().join("notes.txt"), b"").unwrap();

        let (store, queue) = fixtures();
        let scanner = Scanner::new(store.clone(), Vec::new());

        let summary = scanner.scan(&[dir.path()], &queue).unwrap();
        assert_eq!(summary.discovered, 2);
        assert_eq!(summary.known, 0);
        assert_eq!(summary.enqueued, 2);
        assert_eq!(queue.len().unwrap(), 2);
    }

    #[test]
    fn test_rescan_is_stable() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("movie.mkv"), b"").unwrap();

        let (store, queue) = fixtures();
        let scanner = Scanner::new(store.clone(), Vec::new());

        let first = scanner.scan(&[dir.path()], &queue).unwrap();
        assert_eq!(first.discovered, 1);

        let second = scanner.scan(&[dir.path()], &queue).unwrap();
        assert_eq!(second.discovered, 0);
        assert_eq!(second.known, 1);
        // still unprobed but already queued, so nothing new is enqueued
        assert_eq!(second.enqueued, 0);
        assert_eq!(queue.len().unwrap(), 1);
    }

    #[test]
    fn test_exclude_patterns_apply() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("Samples")).unwrap();
        fs::write(dir.path().join("Samples/sample.mkv"), b"").unwrap();
        fs::write(dir.path().join("movie.mkv"), b"").unwrap();

        let (store, queue) = fixtures();
        let scanner = Scanner::new(store.clone(), vec![Regex::new("samples").unwrap()]);

        let summary = scanner.scan(&[dir.path()], &queue).unwrap();
        assert_eq!(summary.discovered, 1);
        assert_eq!(summary.excluded, 1);
        assert!(store
            .get_by_path(&dir.path().join("movie.mkv").to_string_lossy())
            .unwrap()
            .is_some());
    }

    #[test]
    fn test_missing_root_is_skipped() {
        let (store, queue) = fixtures();
        let scanner = Scanner::new(store, Vec::new());

        let summary = scanner.scan(&["/nonexistent/library"], &queue).unwrap();
        assert_eq!(summary, ScanSummary::default());
    }
}
