//! Asynchronous tile texture generation with a cancellable job queue.
//!
//! Decouples "what imagery does this extent need" from "render it now": many
//! requests can be outstanding while the camera keeps moving, and results are
//! delivered back to the owning thread through a completion channel drained
//! by [`TileTextureGenerator::poll_completed`]. Identical or overlapping
//! requests are not deduplicated; that policy belongs to the caller (the LOD
//! manager issues at most one outstanding job per chunk).

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use image::RgbaImage;
use log::trace;
use tokio::runtime::{Handle, Runtime};
use tokio::sync::mpsc;

use crate::core::error::contract_violation;
use crate::core::types::Result;
use crate::tiling::Extent;

use super::annotate;
use super::renderer::MapRenderer;
use super::settings::TextureSettings;

/// Texture job identifier, unique and monotonically increasing for the
/// lifetime of one generator instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JobId(pub u64);

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A finished tile texture, annotated if the job carried a debug label.
pub struct TileTexture {
    pub job_id: JobId,
    pub image: RgbaImage,
}

struct JobRecord {
    debug_label: Option<String>,
    cancel: Arc<AtomicBool>,
}

/// Renders map imagery for extents into raster tiles on background tasks.
pub struct TileTextureGenerator {
    renderer: Arc<dyn MapRenderer>,
    settings: TextureSettings,
    jobs: HashMap<JobId, JobRecord>,
    last_job_id: u64,
    result_tx: mpsc::UnboundedSender<(JobId, RgbaImage)>,
    result_rx: mpsc::UnboundedReceiver<(JobId, RgbaImage)>,
    handle: Handle,
    // kept alive for generators that own their runtime
    _runtime: Option<Runtime>,
}

impl TileTextureGenerator {
    /// Create a generator with its own tokio runtime for worker tasks.
    pub fn new(renderer: Arc<dyn MapRenderer>, settings: TextureSettings) -> Self {
        let runtime = Runtime::new().expect("failed to create tokio runtime");
        let handle = runtime.handle().clone();
        Self::build(renderer, settings, handle, Some(runtime))
    }

    /// Create a generator spawning workers on the current tokio runtime.
    /// Panics outside a runtime context.
    pub fn with_current_runtime(renderer: Arc<dyn MapRenderer>, settings: TextureSettings) -> Self {
        Self::build(renderer, settings, Handle::current(), None)
    }

    fn build(
        renderer: Arc<dyn MapRenderer>,
        settings: TextureSettings,
        handle: Handle,
        runtime: Option<Runtime>,
    ) -> Self {
        let (result_tx, result_rx) = mpsc::unbounded_channel();
        Self {
            renderer,
            settings,
            jobs: HashMap::new(),
            last_job_id: 0,
            result_tx,
            result_rx,
            handle,
            _runtime: runtime,
        }
    }

    /// Start asynchronous rendering of the given extent and return the job id
    /// without blocking. The extent must be square in map units.
    pub fn render(&mut self, extent: Extent, debug_label: Option<String>) -> Result<JobId> {
        if !extent.is_valid() || !extent.is_square() {
            return Err(contract_violation(format!(
                "render extent must be square, got {:.1} x {:.1}",
                extent.width(),
                extent.height()
            )));
        }

        self.last_job_id += 1;
        let job_id = JobId(self.last_job_id);
        let cancel = Arc::new(AtomicBool::new(false));

        let renderer = Arc::clone(&self.renderer);
        let settings = self.settings.clone();
        let tx = self.result_tx.clone();
        let cancel_flag = Arc::clone(&cancel);
        self.handle.spawn_blocking(move || {
            if cancel_flag.load(Ordering::Relaxed) {
                return;
            }
            let image = renderer.render(&extent, &settings);
            // best effort: a cancel racing with the render is caught either
            // here or at poll time
            if !cancel_flag.load(Ordering::Relaxed) {
                let _ = tx.send((job_id, image));
            }
        });

        self.jobs.insert(job_id, JobRecord { debug_label, cancel });
        trace!("texture job {} queued ({} active)", job_id, self.jobs.len());
        Ok(job_id)
    }

    /// Cancel a job issued earlier and not yet seen complete. Cancelling an
    /// unknown id is a caller bug. Cancellation is non-blocking: the render
    /// may still finish, but its result will not be delivered.
    pub fn cancel_job(&mut self, job_id: JobId) -> Result<()> {
        match self.jobs.remove(&job_id) {
            Some(record) => {
                record.cancel.store(true, Ordering::Relaxed);
                trace!("texture job {} cancelled ({} active)", job_id, self.jobs.len());
                Ok(())
            }
            None => Err(contract_violation(format!(
                "cancel of unknown texture job {}",
                job_id
            ))),
        }
    }

    /// Drain finished jobs on the owning thread. Results of cancelled jobs
    /// are silently dropped; debug labels are composed onto the image here.
    pub fn poll_completed(&mut self) -> Vec<TileTexture> {
        let mut completed = Vec::new();
        while let Ok((job_id, mut image)) = self.result_rx.try_recv() {
            let Some(record) = self.jobs.remove(&job_id) else {
                trace!("late result for cancelled texture job {} dropped", job_id);
                continue;
            };
            if let Some(label) = &record.debug_label {
                annotate::draw_border(&mut image, [255, 255, 255, 255]);
                annotate::draw_centered_label(&mut image, label, [255, 255, 255, 255]);
            }
            trace!("texture job {} finished ({} active)", job_id, self.jobs.len());
            completed.push(TileTexture { job_id, image });
        }
        completed
    }

    /// Ids of jobs issued and neither completed nor cancelled, ascending.
    pub fn active_jobs(&self) -> Vec<JobId> {
        let mut ids: Vec<JobId> = self.jobs.keys().copied().collect();
        ids.sort();
        ids
    }

    pub fn active_job_count(&self) -> usize {
        self.jobs.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::texture::renderer::SolidRenderer;
    use std::time::Duration;

    fn generator() -> TileTextureGenerator {
        TileTextureGenerator::with_current_runtime(
            Arc::new(SolidRenderer::default()),
            TextureSettings {
                tile_texture_size: 32,
                ..Default::default()
            },
        )
    }

    fn square(side: f64) -> Extent {
        Extent::new(0.0, 0.0, side, side)
    }

    async fn wait_for_results(generator: &mut TileTextureGenerator, count: usize) -> Vec<TileTexture> {
        let mut results = Vec::new();
        for _ in 0..100 {
            results.extend(generator.poll_completed());
            if results.len() >= count {
                return results;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        results
    }

    #[tokio::test]
    async fn test_job_ids_are_monotonic() {
        let mut generator = generator();
        let a = generator.render(square(256.0), None).unwrap();
        let b = generator.render(square(256.0), None).unwrap();
        assert_eq!(a, JobId(1));
        assert_eq!(b, JobId(2));
    }

    #[tokio::test]
    async fn test_cancel_leaves_other_jobs_active() {
        let mut generator = generator();
        let first = generator.render(square(256.0), None).unwrap();
        let second = generator.render(square(256.0), None).unwrap();
        generator.cancel_job(first).unwrap();
        assert_eq!(generator.active_jobs(), vec![second]);
    }

    #[tokio::test]
    async fn test_completion_delivers_image() {
        let mut generator = generator();
        let id = generator.render(square(512.0), None).unwrap();
        let results = wait_for_results(&mut generator, 1).await;
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].job_id, id);
        assert_eq!(results[0].image.dimensions(), (32, 32));
        assert_eq!(generator.active_job_count(), 0);
    }

    #[tokio::test]
    async fn test_cancelled_job_never_surfaces() {
        let mut generator = generator();
        let id = generator.render(square(256.0), None).unwrap();
        generator.cancel_job(id).unwrap();

        // give the racing worker plenty of time to finish
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(generator.poll_completed().is_empty());
        assert_eq!(generator.active_job_count(), 0);
    }

    #[tokio::test]
    async fn test_debug_label_overlays_border() {
        let mut generator = generator();
        generator.render(square(256.0), Some("0/0/0".to_string())).unwrap();
        let results = wait_for_results(&mut generator, 1).await;
        assert_eq!(results.len(), 1);
        // border pixel is white
        assert_eq!(results[0].image.get_pixel(0, 0).0, [255, 255, 255, 255]);
    }

    #[tokio::test]
    #[cfg(not(debug_assertions))]
    async fn test_non_square_extent_rejected() {
        let mut generator = generator();
        let result = generator.render(Extent::new(0.0, 0.0, 256.0, 128.0), None);
        assert!(result.is_err());
    }

    #[tokio::test]
    #[cfg(not(debug_assertions))]
    async fn test_cancel_unknown_job_rejected() {
        let mut generator = generator();
        assert!(generator.cancel_job(JobId(42)).is_err());
    }

    #[test]
    fn test_owned_runtime_construction() {
        let mut generator = TileTextureGenerator::new(
            Arc::new(SolidRenderer::default()),
            TextureSettings::default(),
        );
        let id = generator.render(square(128.0), None).unwrap();
        assert_eq!(id, JobId(1));

        // poll from the owning (non-async) thread
        let mut results = Vec::new();
        for _ in 0..100 {
            results.extend(generator.poll_completed());
            if !results.is_empty() {
                break;
            }
            std::thread::sleep(Duration::from_millis(10));
        }
        assert_eq!(results.len(), 1);
    }
}
