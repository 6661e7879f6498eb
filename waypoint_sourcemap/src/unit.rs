use crate::location::{ContextId, RawLocation, SourceFile, UnitId};

/// Descriptor of one loaded script or module, as announced by the runtime.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct CompiledUnit {
    pub context: ContextId,
    pub id: UnitId,
    pub source_url: String,
    /// Line of the enclosing document the unit starts at. Only meaningful for inline units.
    pub line_offset: u32,
    /// Column of the enclosing document the unit starts at. Only meaningful for inline units.
    pub column_offset: u32,
    /// Whether the unit is embedded in a larger document.
    pub is_inline: bool,
    /// Whether the unit named itself with a `sourceURL` comment.
    pub has_source_url: bool,
}

impl CompiledUnit {
    pub fn new<I, S>(context: ContextId, id: I, source_url: S) -> Self
    where
        I: Into<UnitId>,
        S: Into<String>,
    {
        CompiledUnit {
            context,
            id: id.into(),
            source_url: source_url.into(),
            line_offset: 0,
            column_offset: 0,
            is_inline: false,
            has_source_url: false,
        }
    }

    /// Marks the unit as embedded in a larger document, starting at the given position.
    pub fn inline_at(mut self, line_offset: u32, column_offset: u32) -> Self {
        self.is_inline = true;
        self.line_offset = line_offset;
        self.column_offset = column_offset;
        self
    }

    /// Marks the unit as having named itself with a `sourceURL` comment.
    pub fn with_source_url(mut self) -> Self {
        self.has_source_url = true;
        self
    }

    /// Returns `true` for inline units that declared their own `sourceURL`. Their
    /// generated file starts at the unit itself instead of the enclosing document, so
    /// raw coordinates have to be shifted by the unit offsets.
    pub fn is_inline_with_source_url(&self) -> bool {
        self.is_inline && self.has_source_url
    }

    /// Returns a raw location inside this unit.
    pub fn location(&self, line: u32, column: u32) -> RawLocation {
        RawLocation::new(self.context, self.id.clone(), line, column)
    }

    /// Returns the file the unit's own text is presented under when nothing better is
    /// known, e.g. `debugger:1/VM42 app.js`.
    pub fn generated_file(&self) -> SourceFile {
        let name = self.source_url.rsplit('/').next().unwrap_or("");
        let path = if name.is_empty() {
            format!("debugger:{}/VM{}", self.context, self.id)
        } else {
            format!("debugger:{}/VM{} {}", self.context, self.id, name)
        };
        SourceFile::new(path)
    }
}

/// One frame of a paused call stack.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct CallFrame {
    pub unit: CompiledUnit,
    pub location: RawLocation,
    pub function_name: String,
}

impl CallFrame {
    pub fn new<S: Into<String>>(unit: CompiledUnit, line: u32, column: u32, function_name: S) -> Self {
        let location = unit.location(line, column);
        CallFrame {
            unit,
            location,
            function_name: function_name.into(),
        }
    }

    pub fn context(&self) -> ContextId {
        self.unit.context
    }
}
