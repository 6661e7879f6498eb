use std::fmt::{self, Display};
use std::rc::Rc;

/// Opaque identity of one attached runtime instance.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub struct ContextId(pub u32);

impl Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a compiled unit as reported by the runtime. Only unique within one
/// context.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub struct UnitId(Rc<str>);

impl UnitId {
    pub fn new<S: Into<Rc<str>>>(id: S) -> Self {
        UnitId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UnitId {
    fn from(id: &str) -> Self {
        UnitId::new(id)
    }
}

impl From<String> for UnitId {
    fn from(id: String) -> Self {
        UnitId::new(id)
    }
}

/// An editable unit of source text in the workspace, identified by its path.
///
/// Cloning is cheap. Two `SourceFile`s with the same path are the same file.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub struct SourceFile {
    path: Rc<str>,
}

impl SourceFile {
    pub fn new<S: Into<Rc<str>>>(path: S) -> Self {
        SourceFile { path: path.into() }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns a location inside this file.
    pub fn location(&self, line: u32, column: u32) -> SourceLocation {
        SourceLocation::new(self.clone(), line, column)
    }
}

impl Display for SourceFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path)
    }
}

/// A position in the coordinate space of a compiled unit. Lines and columns are
/// zero-based.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct RawLocation {
    pub context: ContextId,
    pub unit: UnitId,
    pub line: u32,
    pub column: u32,
}

impl RawLocation {
    pub fn new(context: ContextId, unit: UnitId, line: u32, column: u32) -> Self {
        RawLocation {
            context,
            unit,
            line,
            column,
        }
    }
}

impl Display for RawLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}:{}",
            self.context, self.unit, self.line, self.column
        )
    }
}

/// A position in a source file as seen by the user. Lines and columns are zero-based.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct SourceLocation {
    pub file: SourceFile,
    pub line: u32,
    pub column: u32,
}

impl SourceLocation {
    pub fn new(file: SourceFile, line: u32, column: u32) -> Self {
        SourceLocation { file, line, column }
    }
}

impl Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_files_compare_by_path() {
        let a = SourceFile::new("src/app.ts");
        let b = SourceFile::new(String::from("src/app.ts"));
        let c = SourceFile::new("src/lib.ts");

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!("src/app.ts", a.path());
    }

    #[test]
    fn locations_display_their_coordinates() {
        let raw = RawLocation::new(ContextId(2), UnitId::from("17"), 10, 4);
        assert_eq!("2:17:10:4", raw.to_string());

        let source = SourceFile::new("app.js").location(3, 0);
        assert_eq!("app.js:3:0", source.to_string());
    }
}
