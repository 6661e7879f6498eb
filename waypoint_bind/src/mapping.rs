//! The mapping contract and the reference identity mapping.

use std::fmt::Debug;
use std::rc::Rc;

use waypoint_sourcemap::{CompiledUnit, ContextId, RawLocation, SourceFile, SourceLocation, UnitId};

/// The closed set of mapping strategies the engine knows how to rank.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum MappingKind {
    /// Presents a unit as its own generated file, 1:1.
    Identity,
    /// Maps a unit onto an already-loaded resource with the same text.
    Resource,
    /// Maps a unit through a compiler-produced transformation map.
    Compiler,
}

/// A strategy translating between raw and source locations for compiled units.
///
/// Mappings are stacked per unit. A mapping returning `None` is not an error: resolution
/// falls through to the layer below.
pub trait SourceMapping: Debug {
    fn raw_to_source(&self, raw: &RawLocation) -> Option<SourceLocation>;

    fn source_to_raw(&self, file: &SourceFile, line: u32, column: u32) -> Option<RawLocation>;

    /// Returns `true` if `line` of `file` has at least one raw counterpart.
    fn line_has_mapping(&self, file: &SourceFile, line: u32) -> bool;

    fn kind(&self) -> MappingKind;

    /// Returns `true` if the mapping shows raw text unchanged.
    fn is_identity(&self) -> bool {
        match self.kind() {
            MappingKind::Identity | MappingKind::Resource => true,
            MappingKind::Compiler => false,
        }
    }

    /// Called once when the context owning the mapping is torn down.
    fn dispose(&self) {}
}

/// Address of the mapping object, ignoring the vtable.
pub(crate) fn mapping_addr(mapping: &Rc<dyn SourceMapping>) -> *const () {
    Rc::as_ptr(mapping) as *const ()
}

pub(crate) fn same_mapping(a: &Rc<dyn SourceMapping>, b: &Rc<dyn SourceMapping>) -> bool {
    mapping_addr(a) == mapping_addr(b)
}

/// A mapping offered for a freshly parsed unit by a `MappingSource`.
#[derive(Clone, Debug)]
pub struct UnitMapping {
    pub mapping: Rc<dyn SourceMapping>,
    /// Files that should translate back to raw locations through `mapping`.
    pub bound_files: Vec<SourceFile>,
}

impl UnitMapping {
    pub fn new(mapping: Rc<dyn SourceMapping>) -> Self {
        UnitMapping {
            mapping,
            bound_files: Vec::new(),
        }
    }

    pub fn bind(mut self, file: SourceFile) -> Self {
        self.bound_files.push(file);
        self
    }
}

/// A collaborator owning resource or compiler mappings, asked for a mapping every time a
/// unit is parsed.
pub trait MappingSource {
    fn mapping_for(&mut self, unit: &CompiledUnit) -> Option<UnitMapping>;
}

impl<F> MappingSource for F
where
    F: FnMut(&CompiledUnit) -> Option<UnitMapping>,
{
    fn mapping_for(&mut self, unit: &CompiledUnit) -> Option<UnitMapping> {
        self(unit)
    }
}

/// Maps one unit onto its generated file.
///
/// This is the bottom layer of every unit's stack. It never fails for locations inside its
/// own unit.
#[derive(Clone, Debug)]
pub struct IdentityMapping {
    context: ContextId,
    unit: UnitId,
    file: SourceFile,
    /// `(line, column)` the unit starts at, if its generated file starts at the unit
    /// instead of at the enclosing document.
    offset: Option<(u32, u32)>,
}

impl IdentityMapping {
    pub fn new(unit: &CompiledUnit) -> Self {
        let offset = if unit.is_inline_with_source_url() {
            Some((unit.line_offset, unit.column_offset))
        } else {
            None
        };

        IdentityMapping {
            context: unit.context,
            unit: unit.id.clone(),
            file: unit.generated_file(),
            offset,
        }
    }

    pub fn file(&self) -> &SourceFile {
        &self.file
    }
}

impl SourceMapping for IdentityMapping {
    fn raw_to_source(&self, raw: &RawLocation) -> Option<SourceLocation> {
        if raw.context != self.context || raw.unit != self.unit {
            return None;
        }

        let (line, column) = match self.offset {
            None => (raw.line, raw.column),
            Some((line_offset, column_offset)) => {
                let line = raw.line.saturating_sub(line_offset);
                if line == 0 && raw.column != 0 {
                    (line, raw.column.saturating_sub(column_offset))
                } else {
                    (line, raw.column)
                }
            }
        };

        Some(self.file.location(line, column))
    }

    fn source_to_raw(&self, file: &SourceFile, line: u32, column: u32) -> Option<RawLocation> {
        if file != &self.file {
            return None;
        }

        let (line, column) = match self.offset {
            None => (line, column),
            Some((line_offset, column_offset)) if line == 0 => {
                (line_offset, column + column_offset)
            }
            Some((line_offset, _)) => (line + line_offset, column),
        };

        Some(RawLocation::new(self.context, self.unit.clone(), line, column))
    }

    fn line_has_mapping(&self, _file: &SourceFile, _line: u32) -> bool {
        true
    }

    fn kind(&self) -> MappingKind {
        MappingKind::Identity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Use pretty_assertions for `assert_eq` diffs.
    use pretty_assertions::assert_eq;

    #[test]
    fn identity_round_trips_plain_units() {
        let unit = CompiledUnit::new(ContextId(1), "5", "app.js");
        let mapping = IdentityMapping::new(&unit);

        for &(line, column) in &[(0, 0), (10, 0), (3, 17)] {
            let raw = unit.location(line, column);
            let source = mapping.raw_to_source(&raw).expect("identity never misses");
            assert_eq!(unit.generated_file().location(line, column), source);
            assert_eq!(
                Some(raw),
                mapping.source_to_raw(&source.file, source.line, source.column)
            );
        }
    }

    #[test]
    fn identity_ignores_other_units_and_files() {
        let unit = CompiledUnit::new(ContextId(1), "5", "app.js");
        let other = CompiledUnit::new(ContextId(1), "6", "lib.js");
        let mapping = IdentityMapping::new(&unit);

        assert_eq!(None, mapping.raw_to_source(&other.location(1, 1)));
        assert_eq!(None, mapping.source_to_raw(&other.generated_file(), 1, 1));
    }

    #[test]
    fn inline_units_with_source_url_are_shifted() {
        let unit = CompiledUnit::new(ContextId(1), "8", "page.html")
            .inline_at(20, 6)
            .with_source_url();
        let mapping = IdentityMapping::new(&unit);
        let file = unit.generated_file();

        assert_eq!(
            Some(file.location(0, 4)),
            mapping.raw_to_source(&unit.location(20, 10))
        );
        assert_eq!(
            Some(file.location(2, 3)),
            mapping.raw_to_source(&unit.location(22, 3))
        );

        assert_eq!(Some(unit.location(20, 10)), mapping.source_to_raw(&file, 0, 4));
        assert_eq!(Some(unit.location(22, 3)), mapping.source_to_raw(&file, 2, 3));
    }

    #[test]
    fn identity_and_resource_kinds_are_identities() {
        let unit = CompiledUnit::new(ContextId(1), "5", "app.js");
        let mapping = IdentityMapping::new(&unit);

        assert_eq!(MappingKind::Identity, mapping.kind());
        assert!(mapping.is_identity());
        assert!(mapping.line_has_mapping(mapping.file(), 400));
    }
}
