use std::fmt::{self, Debug, Display};

use backtrace::Backtrace;
use thiserror::Error as ThisError;

use waypoint_sourcemap::{ContextId, RawLocation, UnitId};

use super::Level;

/// What went wrong.
#[derive(Clone, Eq, PartialEq, Debug, ThisError)]
pub enum ErrorKind {
    #[error("execution context {0} is not attached")]
    UnknownContext(ContextId),
    #[error("unit {unit} is not known in context {context}")]
    UnknownUnit { context: ContextId, unit: UnitId },
    #[error("unit {unit} in context {context} would be left without any mapping")]
    EmptyMappingStack { context: ContextId, unit: UnitId },
    #[error("raw location {0} cannot be mapped by any mapping layer")]
    UnmappedRawLocation(RawLocation),
}

impl ErrorKind {
    pub fn level(&self) -> Level {
        match self {
            ErrorKind::UnknownContext(_) => Level::Error,
            ErrorKind::UnknownUnit { .. }
            | ErrorKind::EmptyMappingStack { .. }
            | ErrorKind::UnmappedRawLocation(_) => Level::Bug,
        }
    }
}

#[derive(Clone)]
pub struct Error {
    level: Level,
    kind: ErrorKind,
    backtrace: Option<Backtrace>,
}

impl Error {
    pub fn new(kind: ErrorKind) -> Self {
        let level = kind.level();
        let backtrace = if should_backtrace(level) {
            Some(Backtrace::new_unresolved())
        } else {
            None
        };

        Error {
            level,
            kind,
            backtrace,
        }
    }

    pub fn level(&self) -> Level {
        self.level
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    /// Returns `true` if the error indicates a broken caller contract.
    pub fn is_bug(&self) -> bool {
        self.level == Level::Bug
    }

    /// Returns the backtrace of this error if available.
    ///
    /// In debug builds (`#[cfg(debug_assertions)]`), backtraces are always captured. Otherwise,
    /// backtraces are only captured if `level` is `Bug`.
    pub fn backtrace(&self) -> Option<&Backtrace> {
        self.backtrace.as_ref()
    }
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Error::new(kind)
    }
}

impl PartialEq<ErrorKind> for Error {
    fn eq(&self, other: &ErrorKind) -> bool {
        &self.kind == other
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.level, self.kind)
    }
}

impl Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Error {{\n    [{level}] {kind}",
            level = self.level,
            kind = &self.kind
        )?;
        if let Some(backtrace) = self.backtrace() {
            let mut backtrace = backtrace.clone();
            backtrace.resolve();
            writeln!(f, "        source backtrace:\n{:#?}", backtrace)?;
        }
        write!(f, "}}")?;

        Ok(())
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.kind)
    }
}

#[cfg(debug_assertions)]
fn should_backtrace(_level: Level) -> bool {
    true
}

#[cfg(not(debug_assertions))]
fn should_backtrace(level: Level) -> bool {
    match level {
        Level::Warning | Level::Error => false,
        Level::Bug => true,
    }
}
