//! Test helpers.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use hashbrown::HashMap;

use waypoint_sourcemap::{CompiledUnit, ContextId, RawLocation, SourceFile, SourceLocation, UnitId};

use crate::live::{Tracking, UpdateDelegate};
use crate::mapping::{MappingKind, SourceMapping};

/// A compiler mapping with a fixed table of `(line, column)` pairs.
#[derive(Debug)]
pub(crate) struct FakeCompilerMapping {
    context: ContextId,
    unit: UnitId,
    file: SourceFile,
    entries: RefCell<HashMap<(u32, u32), (u32, u32)>>,
    disposals: Cell<u32>,
}

impl FakeCompilerMapping {
    pub(crate) fn new(unit: &CompiledUnit, file: SourceFile) -> Self {
        FakeCompilerMapping {
            context: unit.context,
            unit: unit.id.clone(),
            file,
            entries: RefCell::new(HashMap::new()),
            disposals: Cell::new(0),
        }
    }

    pub(crate) fn map(mut self, raw: (u32, u32), source: (u32, u32)) -> Self {
        self.entries.get_mut().insert(raw, source);
        self
    }

    /// Drops the entry for `raw`, as a mapping whose data changed after it was installed.
    pub(crate) fn forget(&self, raw: (u32, u32)) {
        self.entries.borrow_mut().remove(&raw);
    }

    pub(crate) fn disposals(&self) -> u32 {
        self.disposals.get()
    }
}

impl SourceMapping for FakeCompilerMapping {
    fn raw_to_source(&self, raw: &RawLocation) -> Option<SourceLocation> {
        if raw.context != self.context || raw.unit != self.unit {
            return None;
        }
        self.entries
            .borrow()
            .get(&(raw.line, raw.column))
            .map(|&(line, column)| self.file.location(line, column))
    }

    fn source_to_raw(&self, file: &SourceFile, line: u32, column: u32) -> Option<RawLocation> {
        if file != &self.file {
            return None;
        }
        self.entries
            .borrow()
            .iter()
            .filter(|&(_, &source)| source == (line, column))
            .map(|(&raw, _)| raw)
            .min()
            .map(|(raw_line, raw_column)| {
                RawLocation::new(self.context, self.unit.clone(), raw_line, raw_column)
            })
    }

    fn line_has_mapping(&self, file: &SourceFile, line: u32) -> bool {
        file == &self.file && self.entries.borrow().values().any(|&(source_line, _)| source_line == line)
    }

    fn kind(&self) -> MappingKind {
        MappingKind::Compiler
    }

    fn dispose(&self) {
        self.disposals.set(self.disposals.get() + 1);
    }
}

/// Records every location delivered to its delegates.
#[derive(Clone, Debug, Default)]
pub(crate) struct Recorder {
    seen: Rc<RefCell<Vec<SourceLocation>>>,
    stop_after: Option<usize>,
}

impl Recorder {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// A recorder whose delegate answers `Tracking::Stop` on its `n`th invocation.
    pub(crate) fn stopping_after(n: usize) -> Self {
        Recorder {
            seen: Rc::default(),
            stop_after: Some(n),
        }
    }

    pub(crate) fn delegate(&self) -> UpdateDelegate {
        let seen = self.seen.clone();
        let stop_after = self.stop_after;
        Box::new(move |location: &SourceLocation| {
            let mut seen = seen.borrow_mut();
            seen.push(location.clone());
            match stop_after {
                Some(n) if seen.len() >= n => Tracking::Stop,
                _ => Tracking::Continue,
            }
        })
    }

    pub(crate) fn count(&self) -> usize {
        self.seen.borrow().len()
    }

    pub(crate) fn last(&self) -> Option<SourceLocation> {
        self.seen.borrow().last().cloned()
    }

    pub(crate) fn all(&self) -> Vec<SourceLocation> {
        self.seen.borrow().clone()
    }
}
