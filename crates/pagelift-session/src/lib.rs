//! Stateful editing session
//!
//! Owns one editable scene at a time and orchestrates the blocking ends of
//! the pipeline (decode, flatten) as awaited background tasks. The session
//! is the single writer of the scene; the editing surface mutates through
//! it and exports from it.
//!
//! Uploads race deliberately: starting a new upload supersedes an in-flight
//! one. Each upload takes a ticket from an atomic sequence counter and may
//! install its scene only while its ticket is still the latest, so a stale
//! decode completing late is a no-op instead of clobbering newer state.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use thiserror::Error;
use tokio::task;
use tracing::{debug, info};

use pagelift_core::{build_scene, ElementId, OverlayConfig, SceneModel, ScenePatch};
use pagelift_decode::{DecodeError, PageDecoder};
use pagelift_raster::{wrap_page, ExportError, ExportedPage, Flattener};

#[derive(Error, Debug)]
pub enum SessionError {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Export(#[from] ExportError),

    #[error("no document loaded")]
    NoDocument,

    #[error("unknown element {0}")]
    UnknownElement(ElementId),

    #[error("element {0} has no editable text")]
    NotText(ElementId),

    #[error("position must be finite")]
    InvalidPosition,

    #[error("background task failed: {0}")]
    TaskFailed(String),
}

/// How an upload resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadOutcome {
    /// The decoded scene was installed and is ready for editing.
    Ready,
    /// A newer upload started before this one finished; its result was
    /// discarded.
    Superseded,
}

/// One editing session: a replaceable scene plus the collaborators that
/// produce and consume it.
pub struct EditSession {
    decoder: Arc<dyn PageDecoder>,
    flattener: Arc<Flattener>,
    config: OverlayConfig,
    scene: Mutex<Option<SceneModel>>,
    upload_seq: AtomicU64,
}

impl EditSession {
    pub fn new(decoder: Arc<dyn PageDecoder>) -> Self {
        Self::with_config(decoder, OverlayConfig::default())
    }

    pub fn with_config(decoder: Arc<dyn PageDecoder>, config: OverlayConfig) -> Self {
        Self {
            decoder,
            flattener: Arc::new(Flattener::new()),
            config,
            scene: Mutex::new(None),
            upload_seq: AtomicU64::new(0),
        }
    }

    pub fn with_flattener(mut self, flattener: Flattener) -> Self {
        self.flattener = Arc::new(flattener);
        self
    }

    /// Decode a document and install its editable scene.
    ///
    /// Decode and overlay construction run on a blocking task. If another
    /// upload starts while this one is in flight, the newer one wins and
    /// this call resolves to `Superseded` without touching the scene.
    pub async fn upload(&self, bytes: Vec<u8>) -> Result<UploadOutcome, SessionError> {
        let ticket = self.upload_seq.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(ticket, size = bytes.len(), "upload started");

        let decoder = Arc::clone(&self.decoder);
        let config = self.config.clone();
        let scene = task::spawn_blocking(move || -> Result<SceneModel, DecodeError> {
            let page = decoder.decode_page(&bytes)?;
            Ok(build_scene(
                page.background,
                &page.runs,
                page.viewport,
                &config,
            ))
        })
        .await
        .map_err(|e| SessionError::TaskFailed(e.to_string()))??;

        // The ticket check happens under the scene lock so a newer upload
        // cannot install between the check and the store.
        let mut guard = self.lock_scene();
        if self.upload_seq.load(Ordering::SeqCst) != ticket {
            debug!(ticket, "upload superseded; discarding decoded scene");
            return Ok(UploadOutcome::Superseded);
        }
        // Replacing the option drops the previous scene here.
        *guard = Some(scene);
        info!(ticket, "scene installed");
        Ok(UploadOutcome::Ready)
    }

    /// Apply one user edit transactionally: on any validation failure the
    /// scene is left exactly as it was.
    pub fn mutate(&self, id: ElementId, patch: &ScenePatch) -> Result<(), SessionError> {
        let mut guard = self.lock_scene();
        let scene = guard.as_mut().ok_or(SessionError::NoDocument)?;

        // Validate the whole patch before applying any of it.
        let element = scene.get(id).ok_or(SessionError::UnknownElement(id))?;
        if patch.text.is_some() && !element.is_interactive() {
            return Err(SessionError::NotText(id));
        }
        if let Some((x, y)) = patch.position {
            if !x.is_finite() || !y.is_finite() {
                return Err(SessionError::InvalidPosition);
            }
        }

        if let Some((x, y)) = patch.position {
            scene.set_position(id, x, y);
        }
        if let Some(text) = &patch.text {
            scene.set_text(id, text);
        }
        Ok(())
    }

    /// Read access for the editing surface.
    pub fn with_scene<R>(&self, f: impl FnOnce(&SceneModel) -> R) -> Option<R> {
        self.lock_scene().as_ref().map(f)
    }

    pub fn has_document(&self) -> bool {
        self.lock_scene().is_some()
    }

    /// Flatten the current scene and wrap it as an exportable document.
    ///
    /// Works on a snapshot: a failure surfaces the error and leaves the
    /// editing state untouched for retry.
    pub async fn export(&self) -> Result<ExportedPage, SessionError> {
        let snapshot = self
            .lock_scene()
            .as_ref()
            .cloned()
            .ok_or(SessionError::NoDocument)?;

        let flattener = Arc::clone(&self.flattener);
        task::spawn_blocking(move || -> Result<ExportedPage, SessionError> {
            let raster = flattener.flatten(&snapshot)?;
            Ok(wrap_page(&raster)?)
        })
        .await
        .map_err(|e| SessionError::TaskFailed(e.to_string()))?
    }

    fn lock_scene(&self) -> MutexGuard<'_, Option<SceneModel>> {
        self.scene.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
