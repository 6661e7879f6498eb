use waypoint_sourcemap::{ContextId, SourceFile};

/// Notifications raised by the binding for workspace collaborators.
#[derive(Clone, Eq, PartialEq, Debug)]
pub enum Event {
    /// The override mapping of `file` in `context` was installed, replaced or removed.
    /// `is_identity` is `false` when the override was removed.
    SourceMappingChanged {
        file: SourceFile,
        context: ContextId,
        is_identity: bool,
    },
}

/// Callback receiving binding events.
pub type Listener = Box<dyn FnMut(&Event)>;

/// Whether a pause reported by the runtime should reach the user.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum PauseDecision {
    Pause,
    /// The top frame has no meaningful source location. The pause should be cancelled.
    Suppress,
}
