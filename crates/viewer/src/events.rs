/// Lifecycle notifications emitted by a panorama rendering backend.
///
/// The set is closed and consumed by pattern matching; there is no
/// string-keyed listener registration. `Ready` and `Error` are the two
/// mutually exclusive terminal outcomes of initialization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewerEvent {
    Ready,
    Error { detail: String },
    NodeChanged { node_id: String },
}
