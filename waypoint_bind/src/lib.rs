//! Location-binding engine for `waypoint`.
//!
//! This crate is mostly intended to be an internal dependency of the `waypoint` project, a
//! live location-binding engine for debuggers. End users are expected to use `waypoint`, the
//! user-facing API, instead of depending on this crate directly.
//!
//! Every compiled unit known to the engine carries a stack of mappings. The bottom of the
//! stack is always the identity mapping onto the unit's generated file, and more specific
//! mappings (resources, compiler source maps) are pushed on top of it. Raw locations are
//! resolved by trying the stack from the top down. Live locations registered against a
//! unit are re-delivered to their owners whenever the stack changes.
//!
//! All state is owned by a single `Binding` and mutated through `&mut` methods. The engine
//! is single-threaded.

mod binding;
mod context;
mod live;
mod unit;

pub mod event;
pub mod mapping;

#[cfg(test)]
mod testing;

#[doc(inline)]
pub use binding::Binding;
#[doc(inline)]
pub use event::{Event, Listener, PauseDecision};
#[doc(inline)]
pub use live::{LiveLocation, Tracking, UpdateDelegate};
#[doc(inline)]
pub use mapping::{IdentityMapping, MappingKind, MappingSource, SourceMapping, UnitMapping};
