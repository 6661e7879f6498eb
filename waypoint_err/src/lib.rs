//! Error taxonomy for `waypoint`.
//!
//! This crate is mostly intended to be an internal dependency of the `waypoint` project, a
//! live location-binding engine for debuggers. End users are expected to use `waypoint`, the
//! user-facing API, instead of depending on this crate directly.
//!
//! This crate defines the error types returned across the `waypoint` crates. Expected
//! outcomes such as a mapping layer that cannot resolve a location are not errors and are
//! expressed with `Option` instead.

use std::fmt::{self, Display};

mod error;

#[doc(inline)]
pub use error::{Error, ErrorKind};

/// Shorthand for results carrying a `waypoint` error.
pub type Result<T> = std::result::Result<T, Error>;

/// Error levels.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub enum Level {
    /// Warnings are diagnostic messages about recoverable situations.
    Warning,
    /// Errors are issues caused by events that arrive for state that no longer exists.
    Error,
    /// Bugs indicate that a caller broke the event-ordering contract of the engine, e.g.
    /// asking for a location in a unit that was never parsed.
    Bug,
}

impl Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Level::Warning => f.write_str("warning"),
            Level::Error => f.write_str("error"),
            Level::Bug => f.write_str("bug"),
        }
    }
}
