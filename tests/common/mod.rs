//! Shared fixtures for integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use scenevault::generate::{DerivativeError, DerivativeGenerator, Derivatives};
use scenevault::probe::{ProbeError, ProbedMeta, SceneProber};
use scenevault::queue::ProcessingQueue;
use scenevault::store::{SceneStore, SqliteSceneStore};
use scenevault_common::{Container, VideoCodec};
use scenevault_db::models::Scene;
use scenevault_db::pool::init_memory_pool;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

pub fn mkv_h264_meta() -> ProbedMeta {
    ProbedMeta {
        container: Container::Mkv,
        video_codec: VideoCodec::H264,
        audio_codec: Some("aac".to_string()),
        duration_secs: Some(4210.5),
        width: Some(1920),
        height: Some(1080),
    }
}

/// Prober stub that records probe order and can be told to fail per path.
pub struct FakeProber {
    /// path -> remaining transient failures before success
    failures: Mutex<HashMap<String, u32>>,
    /// paths that always fail with NotFound
    missing: Mutex<Vec<String>>,
    pub probed: Mutex<Vec<String>>,
    delay: Option<std::time::Duration>,
    meta: ProbedMeta,
}

impl FakeProber {
    pub fn new() -> Self {
        Self {
            failures: Mutex::new(HashMap::new()),
            missing: Mutex::new(Vec::new()),
            probed: Mutex::new(Vec::new()),
            delay: None,
            meta: mkv_h264_meta(),
        }
    }

    /// Make every probe take this long, for overlap tests.
    pub fn slow(mut self, delay: std::time::Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn fail_times(self, path: &str, times: u32) -> Self {
        self.failures.lock().unwrap().insert(path.to_string(), times);
        self
    }

    pub fn missing_file(self, path: &str) -> Self {
        self.missing.lock().unwrap().push(path.to_string());
        self
    }

    pub fn probe_count(&self) -> usize {
        self.probed.lock().unwrap().len()
    }

    pub fn probe_order(&self) -> Vec<String> {
        self.probed.lock().unwrap().clone()
    }
}

#[async_trait]
impl SceneProber for FakeProber {
    async fn probe(&self, path: &Path) -> Result<ProbedMeta, ProbeError> {
        let path_str = path.to_string_lossy().to_string();
        self.probed.lock().unwrap().push(path_str.clone());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if self.missing.lock().unwrap().contains(&path_str) {
            return Err(ProbeError::NotFound(path.to_path_buf()));
        }
        if let Some(remaining) = self.failures.lock().unwrap().get_mut(&path_str) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(ProbeError::ToolFailure("injected failure".to_string()));
            }
        }
        Ok(self.meta.clone())
    }
}

/// Generator stub producing fixed derivative paths.
pub struct FakeGenerator;

#[async_trait]
impl DerivativeGenerator for FakeGenerator {
    async fn generate(&self, scene: &Scene) -> Result<Derivatives, DerivativeError> {
        Ok(Derivatives {
            thumbnail: Some(PathBuf::from(format!("/gen/{}_thumb.jpg", scene.id))),
            preview: Some(PathBuf::from(format!("/gen/{}_preview.jpg", scene.id))),
            markers: vec![60.0, 120.0, 180.0],
        })
    }
}

pub struct TestHarness {
    pub store: Arc<SqliteSceneStore>,
    pub queue: ProcessingQueue,
    pub prober: Arc<FakeProber>,
}

impl TestHarness {
    pub fn new(prober: FakeProber, max_attempts: u32) -> Self {
        let pool = init_memory_pool().unwrap();
        let store = Arc::new(SqliteSceneStore::new(pool.clone()));
        let prober = Arc::new(prober);
        let queue = ProcessingQueue::new(
            pool,
            store.clone(),
            prober.clone(),
            Arc::new(FakeGenerator),
            max_attempts,
        );
        Self {
            store,
            queue,
            prober,
        }
    }

    /// Insert a fresh unprobed scene and enqueue it.
    pub fn add_scene(&self, path: &str) -> Scene {
        let scene = Scene::new(path);
        self.store.upsert(&scene).unwrap();
        self.queue.enqueue(scene.id).unwrap();
        scene
    }
}
