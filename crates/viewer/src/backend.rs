use tour::TourGraph;

use crate::events::ViewerEvent;

/// The external panorama rendering engine, seen through the narrow surface
/// the host needs. Projection, gestures, and hotspot placement all live
/// behind this trait.
pub trait PanoramaBackend {
    /// Begin loading the tour. Initialization is asynchronous from the
    /// host's perspective: completion surfaces later through `poll_events`
    /// as either `Ready` or `Error`, never both.
    fn load(&mut self, graph: &TourGraph);

    /// Drain lifecycle events that occurred since the last poll.
    fn poll_events(&mut self) -> Vec<ViewerEvent>;

    /// Release engine resources. The session guarantees exactly one call.
    fn release(&mut self);
}
