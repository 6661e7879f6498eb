//! Live, layered mapping between runtime script locations and source-file locations.
//!
//! `waypoint` is the user-facing API of the project. A debugger front end creates one
//! [`Binding`], feeds it the runtime's context, unit and pause events, and asks it to
//! translate locations in both directions. Positions the UI keeps on screen are held as
//! [`LiveLocation`]s, which are re-resolved automatically whenever a better mapping for
//! their unit arrives or goes away.
//!
//! ```
//! use waypoint::{Binding, CompiledUnit, ContextId, Tracking};
//!
//! let mut binding = Binding::default();
//! binding.context_added(ContextId(1));
//!
//! let unit = CompiledUnit::new(ContextId(1), "42", "http://localhost/app.js");
//! binding.unit_parsed(&unit).unwrap();
//!
//! let location = binding
//!     .create_live_location(unit.location(10, 0), |source| {
//!         println!("now at {}", source);
//!         Tracking::Continue
//!     })
//!     .unwrap();
//! assert_eq!(
//!     unit.generated_file().location(10, 0),
//!     location.source_location(&binding).unwrap()
//! );
//!
//! location.dispose(&mut binding);
//! ```

#[doc(inline)]
pub use waypoint_bind::{
    event, mapping, Binding, Event, IdentityMapping, Listener, LiveLocation, MappingKind,
    MappingSource, PauseDecision, SourceMapping, Tracking, UnitMapping, UpdateDelegate,
};
#[doc(inline)]
pub use waypoint_err::{Error, ErrorKind, Level, Result};
#[doc(inline)]
pub use waypoint_features::Features;
#[doc(inline)]
pub use waypoint_sourcemap::{
    CallFrame, CompiledUnit, ContextId, RawLocation, SourceFile, SourceLocation, UnitId,
};
