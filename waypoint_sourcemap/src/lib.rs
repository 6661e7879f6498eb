//! Location vocabulary for `waypoint`.
//!
//! This crate is mostly intended to be an internal dependency of the `waypoint` project, a
//! live location-binding engine for debuggers. End users are expected to use `waypoint`, the
//! user-facing API, instead of depending on this crate directly.
//!
//! A runtime reports positions in the coordinate space of the script it actually executes
//! (*raw* locations), while users read and edit *source* files. `waypoint_sourcemap`
//! contains the identities and coordinates on both sides, plus the descriptors the runtime
//! announces for loaded units and paused call frames.

mod location;
mod unit;

#[doc(inline)]
pub use location::{ContextId, RawLocation, SourceFile, SourceLocation, UnitId};
#[doc(inline)]
pub use unit::{CallFrame, CompiledUnit};
