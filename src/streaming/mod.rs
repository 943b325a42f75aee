//! Stream negotiation.
//!
//! Computes the ordered menu of playback strategies for a scene. Ordering
//! encodes a cost gradient: direct play first, then a remux when the container
//! allows it, then the WEBM transcode as the universal fallback. The list is
//! never empty for a scene with a path and always empty without one.
//!
//! [`known_streams`] is the pure variant working only from stored metadata.
//! [`StreamNegotiator::available_streams`] additionally runs an on-demand
//! probe for scenes that were never probed, deduplicating concurrent probes
//! per scene.

pub mod compat;

pub use compat::video_codec_fits_container;

use crate::probe::{self, SceneProber};
use crate::store::SceneStore;
use chrono::Utc;
use dashmap::DashMap;
use scenevault_common::paths::file_extension;
use scenevault_common::{Container, SceneId, StreamKind};
use scenevault_db::models::Scene;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};

/// MIME type advertised for MP4-compatible streams.
pub const MIME_MP4: &str = "video/mp4";

/// MIME type advertised for the WEBM fallback transcode.
pub const MIME_WEBM: &str = "video/webm";

/// One playback strategy offered for a scene. Ephemeral, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StreamOption {
    /// Human-readable description.
    pub label: String,
    /// Advertised MIME type; absent when the client should sniff.
    pub mime_type: Option<String>,
    pub kind: StreamKind,
    /// Whether serving this option goes through the transcode pipeline rather
    /// than raw byte serving. A remux repackages without re-encoding but still
    /// counts.
    pub requires_transcode: bool,
}

/// Compute stream options from stored metadata only, never probing.
///
/// Missing metadata is treated as unknown: the scene still gets direct play
/// and the WEBM fallback, just no remux.
pub fn known_streams(scene: &Scene) -> Vec<StreamOption> {
    let Some(path) = scene.path.as_deref() else {
        return Vec::new();
    };

    let mut streams = Vec::new();

    // Direct play always leads. Many clients refuse an unrecognized container
    // MIME type but play MKV fine when told it is MP4, so both extensions get
    // the mp4 hint; anything else is left for the client to sniff.
    let extension = file_extension(Path::new(path));
    streams.push(StreamOption {
        label: "direct play".to_string(),
        mime_type: matches!(extension.as_deref(), Some("mp4") | Some("mkv"))
            .then(|| MIME_MP4.to_string()),
        kind: StreamKind::Direct,
        requires_transcode: false,
    });

    // MKV may hold MP4-compatible streams: offer a remux.
    if scene.container == Some(Container::Mkv) {
        if let Some(codec) = scene.video_codec {
            if video_codec_fits_container(Container::Mp4, codec) {
                streams.push(StreamOption {
                    label: "mkv remux".to_string(),
                    mime_type: Some(MIME_MP4.to_string()),
                    kind: StreamKind::Remux,
                    requires_transcode: true,
                });
            }
        }
    }

    // Universal fallback so the list never shrinks to zero playable options.
    streams.push(StreamOption {
        label: "webm transcode".to_string(),
        mime_type: Some(MIME_WEBM.to_string()),
        kind: StreamKind::TranscodeWebm,
        requires_transcode: true,
    });

    streams
}

/// Negotiator that lazily probes never-probed scenes before computing their
/// stream options.
pub struct StreamNegotiator {
    store: Arc<dyn SceneStore>,
    prober: Arc<dyn SceneProber>,
    /// Per-scene locks so concurrent negotiations for the same scene share one
    /// probe instead of racing to upsert.
    inflight: DashMap<SceneId, Arc<tokio::sync::Mutex<()>>>,
}

impl StreamNegotiator {
    /// Create a negotiator over the given store and prober.
    pub fn new(store: Arc<dyn SceneStore>, prober: Arc<dyn SceneProber>) -> Self {
        Self {
            store,
            prober,
            inflight: DashMap::new(),
        }
    }

    /// Ordered playback options for a scene.
    ///
    /// When container or codec metadata is missing, a synchronous probe runs
    /// first and its result is best-effort persisted; persistence or probe
    /// failure degrades to the fallback list instead of failing the request.
    pub async fn available_streams(&self, scene: &Scene) -> Vec<StreamOption> {
        let Some(path) = scene.path.clone() else {
            return Vec::new();
        };

        let mut scene = scene.clone();
        if scene.is_unprobed() {
            scene = self.probe_on_demand(scene, &path).await;
        }

        known_streams(&scene)
    }

    async fn probe_on_demand(&self, mut scene: Scene, path: &str) -> Scene {
        let lock = self
            .inflight
            .entry(scene.id)
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
            .clone();
        let _guard = lock.lock().await;

        // A concurrent negotiation may have finished the probe while we
        // waited on the lock.
        match self.store.get_by_id(scene.id) {
            Ok(Some(fresh)) => scene = fresh,
            Ok(None) => {}
            Err(e) => warn!(scene_id = %scene.id, "Failed to re-read scene before probe: {}", e),
        }

        if scene.is_unprobed() {
            debug!(
                scene_id = %scene.id,
                "Scene has no codec information to determine available streams, probing"
            );
            match self.prober.probe(Path::new(path)).await {
                Ok(meta) => {
                    probe::apply_to_scene(&mut scene, &meta);
                    scene.updated_at = Utc::now();
                    if let Err(e) = self.store.upsert(&scene) {
                        warn!(
                            scene_id = %scene.id,
                            "Failed to persist scene after on-demand probe: {}", e
                        );
                    }
                }
                Err(e) => {
                    warn!(
                        scene_id = %scene.id,
                        "On-demand probe failed, offering fallback streams: {}", e
                    );
                }
            }
        }

        self.inflight.remove(&scene.id);
        scene
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scenevault_common::VideoCodec;

    fn probed_scene(path: &str, container: Container, codec: VideoCodec) -> Scene {
        let mut scene = Scene::new(path);
        scene.container = Some(container);
        scene.video_codec = Some(codec);
        scene
    }

    #[test]
    fn test_pathless_scene_has_no_streams() {
        let mut scene = Scene::new("/library/movie.mkv");
        scene.path = None;
        assert!(known_streams(&scene).is_empty());
    }

    #[test]
    fn test_mkv_h264_full_menu() {
        let scene = probed_scene("/library/movie.mkv", Container::Mkv, VideoCodec::H264);
        let streams = known_streams(&scene);

        assert_eq!(streams.len(), 3);

        assert_eq!(streams[0].kind, StreamKind::Direct);
        assert_eq!(streams[0].mime_type.as_deref(), Some(MIME_MP4));
        assert!(!streams[0].requires_transcode);

        assert_eq!(streams[1].kind, StreamKind::Remux);
        assert_eq!(streams[1].mime_type.as_deref(), Some(MIME_MP4));
        assert!(streams[1].requires_transcode);

        assert_eq!(streams[2].kind, StreamKind::TranscodeWebm);
        assert_eq!(streams[2].mime_type.as_deref(), Some(MIME_WEBM));
        assert!(streams[2].requires_transcode);
    }

    #[test]
    fn test_avi_mpeg4_no_remux_no_mime_hint() {
        let scene = probed_scene("/library/clip.avi", Container::Avi, VideoCodec::Mpeg4);
        let streams = known_streams(&scene);

        assert_eq!(streams.len(), 2);
        assert_eq!(streams[0].kind, StreamKind::Direct);
        assert!(streams[0].mime_type.is_none());
        assert_eq!(streams[1].kind, StreamKind::TranscodeWebm);
    }

    #[test]
    fn test_mkv_exotic_codec_no_remux() {
        let scene = probed_scene("/library/old.mkv", Container::Mkv, VideoCodec::Mpeg2);
        let streams = known_streams(&scene);

        assert_eq!(streams.len(), 2);
        assert_eq!(streams[0].kind, StreamKind::Direct);
        // .mkv extension still gets the mp4 hint
        assert_eq!(streams[0].mime_type.as_deref(), Some(MIME_MP4));
        assert_eq!(streams[1].kind, StreamKind::TranscodeWebm);
    }

    #[test]
    fn test_unprobed_scene_gets_fallback_menu() {
        let scene = Scene::new("/library/mystery.wmv");
        let streams = known_streams(&scene);

        assert_eq!(streams.len(), 2);
        assert_eq!(streams[0].kind, StreamKind::Direct);
        assert!(streams[0].mime_type.is_none());
        assert_eq!(streams.last().unwrap().kind, StreamKind::TranscodeWebm);
    }

    #[test]
    fn test_webm_last_invariant() {
        for (container, codec) in [
            (Container::Mkv, VideoCodec::H264),
            (Container::Mp4, VideoCodec::Hevc),
            (Container::Avi, VideoCodec::Mpeg4),
            (Container::Unknown, VideoCodec::Other),
        ] {
            let scene = probed_scene("/library/file.bin", container, codec);
            let streams = known_streams(&scene);
            assert!(!streams.is_empty());
            assert_eq!(streams.last().unwrap().kind, StreamKind::TranscodeWebm);
        }
    }
}
