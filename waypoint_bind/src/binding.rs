use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use tracing::{debug, trace, warn};

use waypoint_err::{Error, ErrorKind, Result};
use waypoint_features::Features;
use waypoint_sourcemap::{
    CallFrame, CompiledUnit, ContextId, RawLocation, SourceFile, SourceLocation,
};

use crate::context::ContextData;
use crate::event::{Event, Listener, PauseDecision};
use crate::live::{LiveLocation, LiveLocationState, LocationId, Tracking, UpdateDelegate};
use crate::mapping::{IdentityMapping, MappingKind, MappingSource, SourceMapping};

/// The location-binding engine.
///
/// A `Binding` keeps, for every attached execution context, a stack of mappings per
/// compiled unit and the live locations registered against each unit. It is constructed
/// once and handed to every collaborator that translates locations. All runtime and
/// workspace events are delivered to it through the `&mut self` methods below.
pub struct Binding {
    features: Features,
    /// Ordered so that cross-context queries answer in a stable order.
    contexts: BTreeMap<ContextId, ContextData>,
    sources: Vec<Box<dyn MappingSource>>,
    listeners: Vec<Listener>,
    next_location: u64,
}

impl fmt::Debug for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binding")
            .field("features", &self.features)
            .field("contexts", &self.contexts)
            .field("sources", &self.sources.len())
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl Default for Binding {
    fn default() -> Self {
        Binding::new(Features::default())
    }
}

impl Binding {
    pub fn new(features: Features) -> Self {
        Binding {
            features,
            contexts: BTreeMap::new(),
            sources: Vec::new(),
            listeners: Vec::new(),
            next_location: 0,
        }
    }

    pub fn features(&self) -> &Features {
        &self.features
    }

    /// Replaces the flag set. Only affects events delivered afterwards.
    pub fn set_features(&mut self, features: Features) {
        self.features = features;
    }

    pub fn subscribe<F>(&mut self, listener: F)
    where
        F: FnMut(&Event) + 'static,
    {
        self.listeners.push(Box::new(listener));
    }

    /// Registers a collaborator that offers resource or compiler mappings for parsed units.
    /// Sources are consulted in registration order.
    pub fn add_mapping_source<S>(&mut self, source: S)
    where
        S: MappingSource + 'static,
    {
        self.sources.push(Box::new(source));
    }

    pub fn has_context(&self, context: ContextId) -> bool {
        self.contexts.contains_key(&context)
    }

    pub fn context_added(&mut self, context: ContextId) {
        if self.contexts.contains_key(&context) {
            warn!(context = %context, "context is already attached");
            return;
        }

        debug!(context = %context, "context added");
        self.contexts.insert(context, ContextData::new(context));
    }

    /// Tears down the context, disposing all of its mappings and live locations.
    pub fn context_removed(&mut self, context: ContextId) {
        match self.contexts.remove(&context) {
            Some(mut data) => {
                debug!(context = %context, "context removed");
                data.dispose();
            }
            None => warn!(context = %context, "removing a context that is not attached"),
        }
    }

    /// Installs the identity mapping of a freshly parsed unit, followed by whatever the
    /// registered mapping sources offer for it.
    pub fn unit_parsed(&mut self, unit: &CompiledUnit) -> Result<()> {
        let Binding {
            features,
            contexts,
            sources,
            listeners,
            ..
        } = self;
        let data = contexts
            .get_mut(&unit.context)
            .ok_or_else(|| Error::from(ErrorKind::UnknownContext(unit.context)))?;

        debug!(
            context = %unit.context,
            unit = %unit.id,
            url = %unit.source_url,
            "unit parsed"
        );

        let identity = IdentityMapping::new(unit);
        let generated = identity.file().clone();
        let identity: Rc<dyn SourceMapping> = Rc::new(identity);
        install_override(data, listeners, &generated, Some(identity.clone()));
        data.push_mapping(unit, identity)?;

        for source in sources.iter_mut() {
            let offered = match source.mapping_for(unit) {
                Some(offered) => offered,
                None => continue,
            };

            if offered.mapping.kind() == MappingKind::Compiler && !features.source_maps {
                trace!(
                    context = %unit.context,
                    unit = %unit.id,
                    "source maps are disabled, skipping compiler mapping"
                );
                continue;
            }

            for file in &offered.bound_files {
                install_override(data, listeners, file, Some(offered.mapping.clone()));
            }
            data.push_mapping(unit, offered.mapping)?;
        }

        Ok(())
    }

    pub fn unit_failed_to_parse(&mut self, unit: &CompiledUnit) -> Result<()> {
        self.unit_parsed(unit)
    }

    /// Makes `mapping` the most specific mapping of `unit` and re-delivers every live
    /// location of the unit.
    pub fn push_mapping(&mut self, unit: &CompiledUnit, mapping: Rc<dyn SourceMapping>) -> Result<()> {
        self.context_mut(unit.context)?.push_mapping(unit, mapping)
    }

    /// Removes and returns the most specific mapping of `unit`, re-delivering every live
    /// location of the unit. Fails without touching the stack if only the bottom mapping is
    /// left, or if a live location of the unit would no longer resolve.
    pub fn pop_mapping(&mut self, unit: &CompiledUnit) -> Result<Rc<dyn SourceMapping>> {
        self.context_mut(unit.context)?.pop_mapping(&unit.id)
    }

    /// Installs (`Some`) or removes (`None`) the mapping `file` translates back to raw
    /// locations through. Raises `Event::SourceMappingChanged` if the override changed.
    pub fn set_source_file_override(
        &mut self,
        context: ContextId,
        file: &SourceFile,
        mapping: Option<Rc<dyn SourceMapping>>,
    ) {
        let Binding {
            contexts,
            listeners,
            ..
        } = self;
        match contexts.get_mut(&context) {
            Some(data) => install_override(data, listeners, file, mapping),
            None => warn!(context = %context, file = %file, "ignoring override for a context that is not attached"),
        }
    }

    /// Re-delivers every live location of `unit` without changing its stack, e.g. after a
    /// mapping finished loading its data. Does nothing for unknown units.
    pub fn update_locations(&mut self, unit: &CompiledUnit) -> Result<()> {
        match self.contexts.get_mut(&unit.context) {
            Some(data) => data.update_locations(&unit.id),
            None => Ok(()),
        }
    }

    /// Creates a live location for a raw location in an already parsed unit. `delegate` is
    /// called once before this returns.
    pub fn create_live_location<F>(&mut self, raw: RawLocation, delegate: F) -> Result<LiveLocation>
    where
        F: FnMut(&SourceLocation) -> Tracking + 'static,
    {
        self.create_location(raw, Box::new(delegate), false)
    }

    /// Creates a live location for the position of a paused call frame. The frame's unit
    /// must already be parsed. The location is disposed automatically when the debugger
    /// resumes or the context's global object is cleared.
    pub fn create_call_frame_live_location<F>(
        &mut self,
        frame: &CallFrame,
        delegate: F,
    ) -> Result<LiveLocation>
    where
        F: FnMut(&SourceLocation) -> Tracking + 'static,
    {
        self.create_location(frame.location.clone(), Box::new(delegate), true)
    }

    fn create_location(
        &mut self,
        raw: RawLocation,
        delegate: UpdateDelegate,
        call_frame: bool,
    ) -> Result<LiveLocation> {
        let id = LocationId::new(self.next_location);
        self.next_location += 1;

        let data = self.context_mut(raw.context)?;
        let state = Rc::new(LiveLocationState::new(id, raw, delegate));
        data.add_location(state.clone(), call_frame)?;
        Ok(LiveLocation::new(state))
    }

    /// Disposes `location`. Same as `LiveLocation::dispose`.
    pub fn dispose_live_location(&mut self, location: &LiveLocation) {
        let state = location.state();
        if state.is_disposed() {
            return;
        }

        state.mark_disposed();
        if let Some(data) = self.contexts.get_mut(&state.raw().context) {
            data.remove_location(state);
        }
    }

    /// Resolves `raw` through its unit's mapping stack, most specific mapping first.
    pub fn raw_location_to_source_location(&self, raw: &RawLocation) -> Result<SourceLocation> {
        let info = self
            .context(raw.context)?
            .unit_info(&raw.unit)
            .ok_or_else(|| {
                Error::from(ErrorKind::UnknownUnit {
                    context: raw.context,
                    unit: raw.unit.clone(),
                })
            })?;
        info.resolve(raw)
    }

    /// Translates a source location back through the override of `file` in `context`.
    /// Without an override there is no reverse mapping and the result is `None`.
    pub fn source_location_to_raw_location(
        &self,
        context: ContextId,
        file: &SourceFile,
        line: u32,
        column: u32,
    ) -> Option<RawLocation> {
        self.contexts
            .get(&context)
            .and_then(|data| data.source_to_raw(file, line, column))
    }

    /// Translates a source location back in every attached context.
    pub fn source_location_to_raw_locations(
        &self,
        file: &SourceFile,
        line: u32,
        column: u32,
    ) -> Vec<RawLocation> {
        self.contexts
            .values()
            .filter_map(|data| data.source_to_raw(file, line, column))
            .collect()
    }

    /// Returns `true` only if every attached context agrees that `line` of `file` is
    /// mapped. Contexts without an override for `file` agree. Use
    /// `context_line_has_mapping` to ask a single context.
    pub fn line_has_mapping(&self, file: &SourceFile, line: u32) -> bool {
        self.contexts
            .values()
            .all(|data| data.line_has_mapping(file, line))
    }

    /// The single-context counterpart of `line_has_mapping`.
    pub fn context_line_has_mapping(&self, context: ContextId, file: &SourceFile, line: u32) -> bool {
        self.contexts
            .get(&context)
            .map_or(true, |data| data.line_has_mapping(file, line))
    }

    /// Maps `location` to raw and back, landing on the location the user would see for
    /// the same raw position. Locations without a reverse mapping are returned unchanged.
    pub fn normalize_source_location(
        &self,
        context: ContextId,
        location: &SourceLocation,
    ) -> Result<SourceLocation> {
        match self.source_location_to_raw_location(
            context,
            &location.file,
            location.line,
            location.column,
        ) {
            Some(raw) => self.raw_location_to_source_location(&raw),
            None => Ok(location.clone()),
        }
    }

    pub fn debugger_resumed(&mut self, context: ContextId) {
        self.reset(context);
    }

    pub fn global_object_cleared(&mut self, context: ContextId) {
        self.reset(context);
    }

    fn reset(&mut self, context: ContextId) {
        match self.contexts.get_mut(&context) {
            Some(data) => data.reset(),
            None => warn!(context = %context, "resetting a context that is not attached"),
        }
    }

    /// Decides whether a pause should reach the user, given the paused call stack with the
    /// top frame first.
    ///
    /// With `Features::suppress_unmapped_pauses`, a pause is suppressed when the top
    /// frame's most specific mapping is not an identity and cannot resolve the frame.
    pub fn before_debugger_paused(&self, frames: &[CallFrame]) -> PauseDecision {
        if !self.features.suppress_unmapped_pauses {
            return PauseDecision::Pause;
        }

        let top = match frames.first() {
            Some(top) => top,
            None => return PauseDecision::Pause,
        };
        let mapping = match self
            .contexts
            .get(&top.context())
            .and_then(|data| data.unit_info(&top.unit.id))
            .and_then(|info| info.top_mapping())
        {
            Some(mapping) => mapping,
            None => return PauseDecision::Pause,
        };

        if mapping.is_identity() || mapping.raw_to_source(&top.location).is_some() {
            PauseDecision::Pause
        } else {
            debug!(location = %top.location, "suppressing pause at unmapped location");
            PauseDecision::Suppress
        }
    }

    pub fn source_file_removed(&mut self, file: &SourceFile) {
        for data in self.contexts.values_mut() {
            data.source_file_removed(file);
        }
    }

    pub fn project_removed(&mut self, files: &[SourceFile]) {
        for file in files {
            self.source_file_removed(file);
        }
    }

    /// Number of mappings stacked for `unit`, zero if the unit is unknown.
    pub fn mapping_depth(&self, unit: &CompiledUnit) -> usize {
        self.contexts
            .get(&unit.context)
            .and_then(|data| data.unit_info(&unit.id))
            .map_or(0, |info| info.depth())
    }

    /// Number of live locations registered against `unit`.
    pub fn live_location_count(&self, unit: &CompiledUnit) -> usize {
        self.contexts
            .get(&unit.context)
            .and_then(|data| data.unit_info(&unit.id))
            .map_or(0, |info| info.location_count())
    }

    /// Number of call frame live locations alive in `context`.
    pub fn call_frame_location_count(&self, context: ContextId) -> usize {
        self.contexts
            .get(&context)
            .map_or(0, |data| data.call_frame_location_count())
    }

    fn context(&self, context: ContextId) -> Result<&ContextData> {
        self.contexts
            .get(&context)
            .ok_or_else(|| Error::from(ErrorKind::UnknownContext(context)))
    }

    fn context_mut(&mut self, context: ContextId) -> Result<&mut ContextData> {
        self.contexts
            .get_mut(&context)
            .ok_or_else(|| Error::from(ErrorKind::UnknownContext(context)))
    }
}

fn install_override(
    data: &mut ContextData,
    listeners: &mut [Listener],
    file: &SourceFile,
    mapping: Option<Rc<dyn SourceMapping>>,
) {
    let is_identity = mapping.as_ref().map_or(false, |mapping| mapping.is_identity());
    if !data.set_override(file, mapping) {
        return;
    }

    let context = data.id();
    debug!(context = %context, file = %file, is_identity, "source mapping changed");

    let event = Event::SourceMappingChanged {
        file: file.clone(),
        context,
        is_identity,
    };
    for listener in listeners.iter_mut() {
        listener(&event);
    }
}
