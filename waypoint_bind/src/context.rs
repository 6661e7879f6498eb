use std::rc::Rc;

use hashbrown::{HashMap, HashSet};
use tracing::{debug, trace};

use waypoint_err::{Error, ErrorKind, Result};
use waypoint_sourcemap::{CompiledUnit, ContextId, RawLocation, SourceFile, UnitId};

use crate::live::{LiveLocationState, LocationId, Tracking};
use crate::mapping::{mapping_addr, same_mapping, SourceMapping};
use crate::unit::{Stopped, UnitInfo};

/// Binding state of one execution context.
#[derive(Debug)]
pub(crate) struct ContextData {
    context: ContextId,
    units: HashMap<UnitId, UnitInfo>,
    /// Live locations of paused call frames, dropped in bulk on resume.
    call_frame_locations: HashMap<LocationId, UnitId>,
    /// Mappings installed directly on source files, checked for source to raw translation.
    overrides: HashMap<SourceFile, Rc<dyn SourceMapping>>,
}

impl ContextData {
    pub(crate) fn new(context: ContextId) -> Self {
        ContextData {
            context,
            units: HashMap::new(),
            call_frame_locations: HashMap::new(),
            overrides: HashMap::new(),
        }
    }

    pub(crate) fn id(&self) -> ContextId {
        self.context
    }

    pub(crate) fn unit_info(&self, unit: &UnitId) -> Option<&UnitInfo> {
        self.units.get(unit)
    }

    /// Returns the info for `unit`, creating an empty one on first access.
    pub(crate) fn ensure_unit_info(&mut self, unit: &CompiledUnit) -> &mut UnitInfo {
        debug_assert_eq!(self.context, unit.context);
        self.units
            .entry(unit.id.clone())
            .or_insert_with(|| UnitInfo::new(unit.clone()))
    }

    fn unit_info_mut(&mut self, unit: &UnitId) -> Result<&mut UnitInfo> {
        let context = self.context;
        self.units.get_mut(unit).ok_or_else(|| {
            Error::from(ErrorKind::UnknownUnit {
                context,
                unit: unit.clone(),
            })
        })
    }

    pub(crate) fn call_frame_location_count(&self) -> usize {
        self.call_frame_locations.len()
    }

    pub(crate) fn push_mapping(
        &mut self,
        unit: &CompiledUnit,
        mapping: Rc<dyn SourceMapping>,
    ) -> Result<()> {
        let mut stopped = Stopped::new();
        let result = self
            .ensure_unit_info(unit)
            .push_mapping(mapping, &mut stopped);
        self.forget_stopped(stopped);
        result
    }

    pub(crate) fn pop_mapping(&mut self, unit: &UnitId) -> Result<Rc<dyn SourceMapping>> {
        let mut stopped = Stopped::new();
        let result = self.unit_info_mut(unit)?.pop_mapping(&mut stopped);
        self.forget_stopped(stopped);
        result
    }

    pub(crate) fn update_locations(&mut self, unit: &UnitId) -> Result<()> {
        let mut stopped = Stopped::new();
        let result = match self.units.get_mut(unit) {
            Some(info) => info.update_locations(&mut stopped),
            None => Ok(()),
        };
        self.forget_stopped(stopped);
        result
    }

    /// Registers a live location on its unit, and in the call frame set if `call_frame`.
    pub(crate) fn add_location(
        &mut self,
        location: Rc<LiveLocationState>,
        call_frame: bool,
    ) -> Result<()> {
        let unit = location.raw().unit.clone();
        let id = location.id();
        let tracking = self.unit_info_mut(&unit)?.add_location(location)?;

        if call_frame && tracking == Tracking::Continue {
            self.call_frame_locations.insert(id, unit);
        }
        Ok(())
    }

    pub(crate) fn remove_location(&mut self, location: &LiveLocationState) {
        let unit = &location.raw().unit;
        if let Some(info) = self.units.get_mut(unit) {
            info.remove_location(location.id());
        }
        self.call_frame_locations.remove(&location.id());
    }

    fn forget_stopped(&mut self, stopped: Stopped) {
        for id in stopped {
            self.call_frame_locations.remove(&id);
        }
    }

    /// Installs or removes the override of `file`. Returns `true` if it changed.
    pub(crate) fn set_override(
        &mut self,
        file: &SourceFile,
        mapping: Option<Rc<dyn SourceMapping>>,
    ) -> bool {
        match (self.overrides.get(file), &mapping) {
            (Some(current), Some(mapping)) if same_mapping(current, mapping) => return false,
            (None, None) => return false,
            _ => {}
        }

        match mapping {
            Some(mapping) => {
                self.overrides.insert(file.clone(), mapping);
            }
            None => {
                self.overrides.remove(file);
            }
        }
        true
    }

    pub(crate) fn source_to_raw(
        &self,
        file: &SourceFile,
        line: u32,
        column: u32,
    ) -> Option<RawLocation> {
        self.overrides
            .get(file)
            .and_then(|mapping| mapping.source_to_raw(file, line, column))
    }

    /// Files without an override count as mapped.
    pub(crate) fn line_has_mapping(&self, file: &SourceFile, line: u32) -> bool {
        self.overrides
            .get(file)
            .map_or(true, |mapping| mapping.line_has_mapping(file, line))
    }

    pub(crate) fn source_file_removed(&mut self, file: &SourceFile) {
        self.overrides.remove(file);
    }

    /// Disposes every call frame live location.
    pub(crate) fn reset(&mut self) {
        debug!(
            context = %self.context,
            locations = self.call_frame_locations.len(),
            "dropping call frame locations"
        );

        for (id, unit) in self.call_frame_locations.drain() {
            if let Some(location) = self
                .units
                .get_mut(&unit)
                .and_then(|info| info.remove_location(id))
            {
                location.mark_disposed();
            }
        }
    }

    /// Disposes every live location and every mapping of the context. Mappings shared
    /// between several stacks or overrides are disposed once.
    pub(crate) fn dispose(&mut self) {
        self.reset();

        let mut disposed = HashSet::new();
        let mut dispose_once = |mapping: Rc<dyn SourceMapping>| {
            if disposed.insert(mapping_addr(&mapping)) {
                mapping.dispose();
            }
        };

        for (_, mut info) in self.units.drain() {
            trace!(context = %self.context, unit = %info.unit().id, "disposing unit");
            for mapping in info.dispose().into_iter().rev() {
                dispose_once(mapping);
            }
        }
        for (_, mapping) in self.overrides.drain() {
            dispose_once(mapping);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::mapping::IdentityMapping;
    use crate::testing::{FakeCompilerMapping, Recorder};

    fn unit() -> CompiledUnit {
        CompiledUnit::new(ContextId(1), "u1", "gen.js")
    }

    fn location(id: u64, raw: RawLocation, recorder: &Recorder) -> Rc<LiveLocationState> {
        Rc::new(LiveLocationState::new(
            LocationId::new(id),
            raw,
            recorder.delegate(),
        ))
    }

    #[test]
    fn unit_info_is_created_on_first_access() {
        let mut data = ContextData::new(ContextId(1));
        let unit = unit();
        assert!(data.unit_info(&unit.id).is_none());

        data.ensure_unit_info(&unit);
        assert_eq!(0, data.unit_info(&unit.id).unwrap().depth());
        assert_eq!(&unit, data.unit_info(&unit.id).unwrap().unit());
    }

    #[test]
    fn reset_disposes_only_call_frame_locations() {
        let mut data = ContextData::new(ContextId(1));
        let unit = unit();
        data.push_mapping(&unit, Rc::new(IdentityMapping::new(&unit)))
            .unwrap();

        let recorder = Recorder::new();
        let plain = location(0, unit.location(1, 0), &recorder);
        let frame = location(1, unit.location(2, 0), &recorder);
        data.add_location(plain.clone(), false).unwrap();
        data.add_location(frame.clone(), true).unwrap();
        assert_eq!(1, data.call_frame_location_count());

        data.reset();
        assert_eq!(0, data.call_frame_location_count());
        assert!(frame.is_disposed());
        assert!(!plain.is_disposed());
        assert_eq!(1, data.unit_info(&unit.id).unwrap().location_count());
    }

    #[test]
    fn failed_passes_still_forget_stopped_call_frame_locations() {
        let mut data = ContextData::new(ContextId(1));
        let unit = unit();
        let mapping = Rc::new(
            FakeCompilerMapping::new(&unit, SourceFile::new("a.ts"))
                .map((1, 0), (0, 0))
                .map((2, 0), (1, 0)),
        );
        data.push_mapping(&unit, mapping.clone()).unwrap();

        let frame = location(0, unit.location(1, 0), &Recorder::stopping_after(2));
        let plain = location(1, unit.location(2, 0), &Recorder::new());
        data.add_location(frame.clone(), true).unwrap();
        data.add_location(plain.clone(), false).unwrap();
        assert_eq!(1, data.call_frame_location_count());

        mapping.forget((2, 0));
        assert!(data.update_locations(&unit.id).is_err());
        assert!(frame.is_disposed());
        assert_eq!(0, data.call_frame_location_count());

        let frame = location(2, unit.location(1, 0), &Recorder::stopping_after(2));
        data.add_location(frame.clone(), true).unwrap();
        let empty = FakeCompilerMapping::new(&unit, SourceFile::new("b.ts"));
        let err = data.push_mapping(&unit, Rc::new(empty)).unwrap_err();
        assert_eq!(
            &ErrorKind::UnmappedRawLocation(unit.location(2, 0)),
            err.kind()
        );
        assert!(frame.is_disposed());
        assert_eq!(0, data.call_frame_location_count());
    }

    #[test]
    fn override_changes_are_detected() {
        let mut data = ContextData::new(ContextId(1));
        let unit = unit();
        let file = unit.generated_file();
        let mapping: Rc<dyn SourceMapping> = Rc::new(IdentityMapping::new(&unit));

        assert!(!data.set_override(&file, None));
        assert!(data.set_override(&file, Some(mapping.clone())));
        assert!(!data.set_override(&file, Some(mapping.clone())));
        assert_eq!(Some(unit.location(4, 1)), data.source_to_raw(&file, 4, 1));

        assert!(data.set_override(&file, None));
        assert_eq!(None, data.source_to_raw(&file, 4, 1));
    }

    #[test]
    fn dispose_disposes_shared_mappings_once() {
        let mut data = ContextData::new(ContextId(1));
        let unit = unit();
        let file = SourceFile::new("a.ts");
        let compiler = Rc::new(FakeCompilerMapping::new(&unit, file.clone()).map((0, 0), (1, 1)));

        data.push_mapping(&unit, Rc::new(IdentityMapping::new(&unit)))
            .unwrap();
        data.push_mapping(&unit, compiler.clone()).unwrap();
        data.set_override(&file, Some(compiler.clone()));

        let recorder = Recorder::new();
        let live = location(0, unit.location(0, 0), &recorder);
        data.add_location(live.clone(), false).unwrap();

        data.dispose();
        assert_eq!(1, compiler.disposals());
        assert!(live.is_disposed());
        assert!(data.unit_info(&unit.id).is_none());
        assert_eq!(None, data.source_to_raw(&file, 1, 1));
    }
}
