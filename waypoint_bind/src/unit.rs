use std::collections::BTreeMap;
use std::rc::Rc;

use tracing::trace;

use waypoint_err::{Error, ErrorKind, Result};
use waypoint_sourcemap::{CompiledUnit, RawLocation, SourceLocation};

use crate::live::{LiveLocationState, LocationId, Tracking};
use crate::mapping::SourceMapping;

/// Live locations that asked to stop tracking during an update pass. They are already
/// unregistered from the unit and marked disposed.
pub(crate) type Stopped = Vec<LocationId>;

/// Mapping stack and live locations of one compiled unit.
#[derive(Debug)]
pub(crate) struct UnitInfo {
    unit: CompiledUnit,
    /// Most specific mapping last.
    mappings: Vec<Rc<dyn SourceMapping>>,
    /// Keyed by creation order, which is also the update order.
    locations: BTreeMap<LocationId, Rc<LiveLocationState>>,
}

impl UnitInfo {
    pub(crate) fn new(unit: CompiledUnit) -> Self {
        UnitInfo {
            unit,
            mappings: Vec::new(),
            locations: BTreeMap::new(),
        }
    }

    pub(crate) fn unit(&self) -> &CompiledUnit {
        &self.unit
    }

    pub(crate) fn depth(&self) -> usize {
        self.mappings.len()
    }

    pub(crate) fn top_mapping(&self) -> Option<&Rc<dyn SourceMapping>> {
        self.mappings.last()
    }

    pub(crate) fn location_count(&self) -> usize {
        self.locations.len()
    }

    /// Pushes `mapping` and re-delivers every location. Locations that stop tracking are
    /// appended to `stopped` even if the pass fails.
    pub(crate) fn push_mapping(
        &mut self,
        mapping: Rc<dyn SourceMapping>,
        stopped: &mut Stopped,
    ) -> Result<()> {
        self.mappings.push(mapping);
        trace!(
            context = %self.unit.context,
            unit = %self.unit.id,
            depth = self.mappings.len(),
            "pushed mapping"
        );
        self.update_locations(stopped)
    }

    /// Removes the most specific mapping. The bottom mapping can never be popped, and the
    /// stack is left alone if a registered location would no longer resolve without it.
    pub(crate) fn pop_mapping(&mut self, stopped: &mut Stopped) -> Result<Rc<dyn SourceMapping>> {
        if self.mappings.len() <= 1 {
            return Err(self.empty_stack());
        }

        let remaining = &self.mappings[..self.mappings.len() - 1];
        if let Some(location) = self
            .locations
            .values()
            .find(|location| resolve_in(remaining, location.raw()).is_none())
        {
            return Err(Error::from(ErrorKind::UnmappedRawLocation(
                location.raw().clone(),
            )));
        }

        let mapping = match self.mappings.pop() {
            Some(mapping) => mapping,
            None => return Err(self.empty_stack()),
        };
        trace!(
            context = %self.unit.context,
            unit = %self.unit.id,
            depth = self.mappings.len(),
            "popped mapping"
        );

        if let Err(err) = self.update_locations(stopped) {
            // Only mappings that answer differently between calls get here. Deliveries
            // made during the pass stand.
            self.mappings.push(mapping);
            return Err(err);
        }
        Ok(mapping)
    }

    /// Registers `location` and delivers its first resolution.
    pub(crate) fn add_location(&mut self, location: Rc<LiveLocationState>) -> Result<Tracking> {
        if self.mappings.is_empty() {
            return Err(self.empty_stack());
        }

        let tracking = location.update(self)?;
        match tracking {
            Tracking::Continue => {
                self.locations.insert(location.id(), location);
            }
            Tracking::Stop => location.mark_disposed(),
        }
        Ok(tracking)
    }

    pub(crate) fn remove_location(&mut self, id: LocationId) -> Option<Rc<LiveLocationState>> {
        self.locations.remove(&id)
    }

    /// Tries mappings from the most specific one down, returning the first resolution.
    pub(crate) fn resolve(&self, raw: &RawLocation) -> Result<SourceLocation> {
        resolve_in(&self.mappings, raw)
            .ok_or_else(|| Error::from(ErrorKind::UnmappedRawLocation(raw.clone())))
    }

    /// Re-delivers every registered location once, in creation order. Locations that stop
    /// tracking are unregistered and appended to `stopped`.
    ///
    /// Every location is visited even if an earlier one fails to resolve; the first error
    /// is returned after the pass.
    pub(crate) fn update_locations(&mut self, stopped: &mut Stopped) -> Result<()> {
        trace!(
            context = %self.unit.context,
            unit = %self.unit.id,
            locations = self.locations.len(),
            "updating live locations"
        );

        let first_stopped = stopped.len();
        let mut first_error = None;

        for (&id, location) in &self.locations {
            match location.update(self) {
                Ok(Tracking::Continue) => {}
                Ok(Tracking::Stop) => stopped.push(id),
                Err(err) => {
                    first_error.get_or_insert(err);
                }
            }
        }

        for id in &stopped[first_stopped..] {
            if let Some(location) = self.locations.remove(id) {
                location.mark_disposed();
            }
        }

        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Disposes every registered location and hands back the mapping stack.
    pub(crate) fn dispose(&mut self) -> Vec<Rc<dyn SourceMapping>> {
        for location in self.locations.values() {
            location.mark_disposed();
        }
        self.locations.clear();
        std::mem::take(&mut self.mappings)
    }

    fn empty_stack(&self) -> Error {
        Error::from(ErrorKind::EmptyMappingStack {
            context: self.unit.context,
            unit: self.unit.id.clone(),
        })
    }
}

/// Tries `mappings` from the most specific one down.
fn resolve_in(mappings: &[Rc<dyn SourceMapping>], raw: &RawLocation) -> Option<SourceLocation> {
    mappings
        .iter()
        .rev()
        .find_map(|mapping| mapping.raw_to_source(raw))
}
