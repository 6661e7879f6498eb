//! Self-updating location handles.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use waypoint_err::Result;
use waypoint_sourcemap::{RawLocation, SourceLocation};

use crate::binding::Binding;
use crate::unit::UnitInfo;

/// Answer of an update delegate.
#[must_use]
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Tracking {
    /// Keep delivering updates.
    Continue,
    /// Dispose the live location after this update.
    Stop,
}

/// Callback receiving the current resolution of a live location.
///
/// Delegates run synchronously inside binding operations and must not call back into the
/// binding. Return `Tracking::Stop` to dispose the location instead.
pub type UpdateDelegate = Box<dyn FnMut(&SourceLocation) -> Tracking>;

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub(crate) struct LocationId(u64);

impl LocationId {
    pub(crate) fn new(id: u64) -> Self {
        LocationId(id)
    }
}

pub(crate) struct LiveLocationState {
    id: LocationId,
    raw: RawLocation,
    delegate: RefCell<UpdateDelegate>,
    disposed: Cell<bool>,
}

impl LiveLocationState {
    pub(crate) fn new(id: LocationId, raw: RawLocation, delegate: UpdateDelegate) -> Self {
        LiveLocationState {
            id,
            raw,
            delegate: RefCell::new(delegate),
            disposed: Cell::new(false),
        }
    }

    pub(crate) fn id(&self) -> LocationId {
        self.id
    }

    pub(crate) fn raw(&self) -> &RawLocation {
        &self.raw
    }

    pub(crate) fn is_disposed(&self) -> bool {
        self.disposed.get()
    }

    pub(crate) fn mark_disposed(&self) {
        self.disposed.set(true);
    }

    /// Resolves the location through `unit` and hands the result to the delegate. Does
    /// nothing once disposed.
    pub(crate) fn update(&self, unit: &UnitInfo) -> Result<Tracking> {
        if self.is_disposed() {
            return Ok(Tracking::Continue);
        }

        let location = unit.resolve(&self.raw)?;
        let mut delegate = self.delegate.borrow_mut();
        Ok((&mut **delegate)(&location))
    }
}

impl fmt::Debug for LiveLocationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LiveLocationState")
            .field("id", &self.id)
            .field("raw", &self.raw)
            .field("disposed", &self.disposed.get())
            .finish()
    }
}

/// A long-lived handle bound to a raw location.
///
/// The delegate it was created with receives the location's resolution once on creation,
/// and again every time the mapping stack of the location's unit changes. Handles compare
/// by identity: two handles for the same raw location are never equal.
#[derive(Debug)]
pub struct LiveLocation {
    state: Rc<LiveLocationState>,
}

impl LiveLocation {
    pub(crate) fn new(state: Rc<LiveLocationState>) -> Self {
        LiveLocation { state }
    }

    pub(crate) fn state(&self) -> &Rc<LiveLocationState> {
        &self.state
    }

    pub fn raw_location(&self) -> &RawLocation {
        self.state.raw()
    }

    pub fn is_disposed(&self) -> bool {
        self.state.is_disposed()
    }

    /// Returns the current resolution without involving the delegate.
    pub fn source_location(&self, binding: &Binding) -> Result<SourceLocation> {
        binding.raw_location_to_source_location(self.raw_location())
    }

    /// Stops all further delegate invocations and unregisters the handle. Idempotent.
    pub fn dispose(&self, binding: &mut Binding) {
        binding.dispose_live_location(self);
    }
}

impl PartialEq for LiveLocation {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.state, &other.state)
    }
}

impl Eq for LiveLocation {}

#[cfg(test)]
mod tests {
    use super::*;

    use waypoint_sourcemap::{CompiledUnit, ContextId};

    use crate::mapping::IdentityMapping;
    use crate::testing::Recorder;
    use crate::unit::Stopped;

    #[test]
    fn disposed_state_never_calls_delegate() {
        let compiled = CompiledUnit::new(ContextId(1), "1", "a.js");
        let mut unit = UnitInfo::new(compiled.clone());
        unit.push_mapping(Rc::new(IdentityMapping::new(&compiled)), &mut Stopped::new())
            .unwrap();

        let recorder = Recorder::new();
        let state = LiveLocationState::new(
            LocationId::new(0),
            compiled.location(2, 0),
            recorder.delegate(),
        );

        assert_eq!(Tracking::Continue, state.update(&unit).unwrap());
        assert_eq!(1, recorder.count());

        state.mark_disposed();
        assert_eq!(Tracking::Continue, state.update(&unit).unwrap());
        assert_eq!(1, recorder.count());
    }

    #[test]
    fn handles_compare_by_identity() {
        let raw = CompiledUnit::new(ContextId(1), "1", "a.js").location(0, 0);
        let a = LiveLocation::new(Rc::new(LiveLocationState::new(
            LocationId::new(0),
            raw.clone(),
            Recorder::new().delegate(),
        )));
        let b = LiveLocation::new(Rc::new(LiveLocationState::new(
            LocationId::new(1),
            raw,
            Recorder::new().delegate(),
        )));

        assert_eq!(a, a);
        assert_ne!(a, b);
        assert_eq!(a.raw_location(), b.raw_location());
    }
}
