use tour::TourGraph;

use crate::backend::PanoramaBackend;
use crate::events::ViewerEvent;

/// What the session is currently showing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewPhase {
    /// Backend is initializing; a loading indicator should be visible.
    Loading,
    /// Tour is interactive at the named node.
    Active { current_node: String },
    /// Backend failed. The loading indicator must be cleared and the failure
    /// shown instead of an indefinite spinner.
    Failed { detail: String },
}

/// Owned handle for one tour viewing session.
///
/// The session owns the backend for its whole lifetime and releases it
/// exactly once, on `close` or drop, whichever comes first. Closing before
/// the backend reported ready is safe.
#[derive(Debug)]
pub struct ViewerSession<B: PanoramaBackend> {
    graph: TourGraph,
    backend: Option<B>,
    phase: ViewPhase,
}

impl<B: PanoramaBackend> ViewerSession<B> {
    pub fn open(mut backend: B, graph: TourGraph) -> Self {
        backend.load(&graph);
        Self {
            graph,
            backend: Some(backend),
            phase: ViewPhase::Loading,
        }
    }

    pub fn phase(&self) -> &ViewPhase {
        &self.phase
    }

    pub fn graph(&self) -> &TourGraph {
        &self.graph
    }

    pub fn is_closed(&self) -> bool {
        self.backend.is_none()
    }

    /// Drain backend events and fold them into the view phase.
    ///
    /// The drained events are returned so hosts can react to them directly
    /// (navigation chrome, logging). After `close` this is a no-op.
    pub fn pump(&mut self) -> Vec<ViewerEvent> {
        let Some(backend) = self.backend.as_mut() else {
            return Vec::new();
        };
        let events = backend.poll_events();
        for event in &events {
            self.apply(event);
        }
        events
    }

    fn apply(&mut self, event: &ViewerEvent) {
        match event {
            ViewerEvent::Ready => {
                // Ready only resolves a pending load; a session that already
                // failed stays failed.
                if self.phase == ViewPhase::Loading {
                    self.phase = ViewPhase::Active {
                        current_node: self.graph.start_node().to_string(),
                    };
                }
            }
            ViewerEvent::Error { detail } => {
                self.phase = ViewPhase::Failed {
                    detail: detail.clone(),
                };
            }
            ViewerEvent::NodeChanged { node_id } => {
                // The graph is the read-only source of truth for valid ids.
                if matches!(self.phase, ViewPhase::Failed { .. }) || !self.graph.contains(node_id) {
                    return;
                }
                self.phase = ViewPhase::Active {
                    current_node: node_id.clone(),
                };
            }
        }
    }

    /// Release the backend. Safe to call any number of times, in any phase.
    pub fn close(&mut self) {
        if let Some(mut backend) = self.backend.take() {
            backend.release();
        }
    }
}

impl<B: PanoramaBackend> Drop for ViewerSession<B> {
    fn drop(&mut self) {
        self.close();
    }
}
