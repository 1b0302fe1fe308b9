//! Async terrain geometry loading with bounded concurrency.
//!
//! Generation runs on background worker tasks; the owning thread polls
//! completed results, so LOD decisions never block on a generator. Requests
//! carry a monotonically increasing ticket: a cancelled or superseded
//! request's late result is recognized by its ticket and dropped.

use std::collections::{HashSet, VecDeque};
use std::fmt;
use std::sync::Arc;

use log::{error, trace};
use tokio::runtime::Runtime;
use tokio::sync::mpsc;
use tokio::task::JoinSet;

use crate::terrain::{TerrainGenerator, TileGeometry};
use crate::tiling::TileXYZ;

/// Geometry load ticket, unique for the lifetime of one loader.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Ticket(pub u64);

impl fmt::Display for Ticket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Request to generate geometry for a tile
#[derive(Debug, Clone, Copy)]
struct LoadRequest {
    ticket: Ticket,
    tile: TileXYZ,
}

/// Result of a geometry load
pub enum GeometryResult {
    /// Generation succeeded
    Ready {
        ticket: Ticket,
        tile: TileXYZ,
        geometry: TileGeometry,
    },
    /// Transient generation failure (tile outside raster, fetch failure);
    /// the manager substitutes fallback geometry
    Failed {
        ticket: Ticket,
        tile: TileXYZ,
        message: String,
    },
}

impl GeometryResult {
    pub fn ticket(&self) -> Ticket {
        match self {
            GeometryResult::Ready { ticket, .. } => *ticket,
            GeometryResult::Failed { ticket, .. } => *ticket,
        }
    }
}

/// Concurrent geometry loader over a terrain generator
pub struct GeometryLoader {
    request_tx: mpsc::UnboundedSender<LoadRequest>,
    result_rx: mpsc::UnboundedReceiver<GeometryResult>,
    pending: HashSet<Ticket>,
    next_ticket: u64,
    // kept alive for loaders that own their runtime
    _runtime: Option<Runtime>,
}

impl GeometryLoader {
    /// Create a loader with its own tokio runtime.
    ///
    /// # Arguments
    /// * `generator` - terrain generator queried on worker tasks
    /// * `max_concurrent` - maximum number of tiles generated at once
    pub fn new(generator: Arc<dyn TerrainGenerator>, max_concurrent: usize) -> Self {
        let (request_tx, mut request_rx) = mpsc::unbounded_channel::<LoadRequest>();
        let (result_tx, result_rx) = mpsc::unbounded_channel::<GeometryResult>();

        let runtime = Runtime::new().expect("failed to create tokio runtime");
        runtime.spawn(async move {
            Self::worker_loop(generator, max_concurrent, &mut request_rx, result_tx).await;
        });

        Self {
            request_tx,
            result_rx,
            pending: HashSet::new(),
            next_ticket: 0,
            _runtime: Some(runtime),
        }
    }

    /// Create a loader spawning workers on the current tokio runtime.
    /// Panics if called outside a runtime context.
    pub fn with_current_runtime(generator: Arc<dyn TerrainGenerator>, max_concurrent: usize) -> Self {
        let (request_tx, mut request_rx) = mpsc::unbounded_channel::<LoadRequest>();
        let (result_tx, result_rx) = mpsc::unbounded_channel::<GeometryResult>();

        tokio::spawn(async move {
            Self::worker_loop(generator, max_concurrent, &mut request_rx, result_tx).await;
        });

        Self {
            request_tx,
            result_rx,
            pending: HashSet::new(),
            next_ticket: 0,
            _runtime: None,
        }
    }

    /// Worker loop processing requests FIFO with a concurrency cap
    async fn worker_loop(
        generator: Arc<dyn TerrainGenerator>,
        max_concurrent: usize,
        request_rx: &mut mpsc::UnboundedReceiver<LoadRequest>,
        result_tx: mpsc::UnboundedSender<GeometryResult>,
    ) {
        let mut active_tasks: JoinSet<GeometryResult> = JoinSet::new();
        let mut queued: VecDeque<LoadRequest> = VecDeque::new();

        loop {
            tokio::select! {
                Some(request) = request_rx.recv() => {
                    queued.push_back(request);
                }

                Some(result) = active_tasks.join_next(), if !active_tasks.is_empty() => {
                    match result {
                        Ok(load_result) => {
                            let _ = result_tx.send(load_result);
                        }
                        Err(e) => {
                            error!("geometry worker task panicked: {}", e);
                        }
                    }
                }

                else => {
                    if queued.is_empty() && active_tasks.is_empty() {
                        break;
                    }
                }
            }

            while active_tasks.len() < max_concurrent {
                let Some(request) = queued.pop_front() else { break };
                let generator = Arc::clone(&generator);
                active_tasks.spawn_blocking(move || {
                    match generator.generate(request.tile) {
                        Ok(geometry) => GeometryResult::Ready {
                            ticket: request.ticket,
                            tile: request.tile,
                            geometry,
                        },
                        Err(e) => GeometryResult::Failed {
                            ticket: request.ticket,
                            tile: request.tile,
                            message: e.to_string(),
                        },
                    }
                });
            }
        }
    }

    /// Queue a tile for generation and return its ticket.
    pub fn request(&mut self, tile: TileXYZ) -> Ticket {
        self.next_ticket += 1;
        let ticket = Ticket(self.next_ticket);
        self.pending.insert(ticket);

        self.request_tx
            .send(LoadRequest { ticket, tile })
            .expect("geometry worker died");
        trace!("geometry load {} queued for tile {}", ticket, tile);
        ticket
    }

    /// Cancel a pending load (best effort). Generation may already be
    /// running; its late result is dropped at poll time.
    pub fn cancel(&mut self, ticket: Ticket) {
        if self.pending.remove(&ticket) {
            trace!("geometry load {} cancelled", ticket);
        }
    }

    /// Poll completed loads (non-blocking). Results whose ticket was
    /// cancelled are discarded here.
    pub fn poll_results(&mut self) -> Vec<GeometryResult> {
        let mut results = Vec::new();
        while let Ok(result) = self.result_rx.try_recv() {
            if self.pending.remove(&result.ticket()) {
                results.push(result);
            } else {
                trace!("stale geometry result {} dropped", result.ticket());
            }
        }
        results
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn is_pending(&self, ticket: Ticket) -> bool {
        self.pending.contains(&ticket)
    }
}
