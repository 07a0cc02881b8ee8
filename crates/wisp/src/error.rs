//! Error taxonomy (spec §7) and source-position annotation on unwind.

use std::fmt;
use std::rc::Rc;

use strum::Display;

use crate::value::Value;

/// File/line/column captured from a `SourceInfo` wrapper at the point an
/// error passed through it (spec §4.1.1, §7 "propagation").
#[derive(Debug, Clone)]
pub struct SourceLoc {
    pub file: Rc<str>,
    pub line: u32,
    pub col: u32,
}

impl fmt::Display for SourceLoc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.col)
    }
}

/// The error tag (spec §7). `strum::Display` gives each variant a stable
/// lowercase name for host-visible error reporting without hand-writing
/// `Display`, the way the teacher's `ExcType`/`Builtins` enums do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum ErrorKind {
    ParseError,
    UnboundSymbol,
    TypeError,
    ArityError,
    NotCallable,
    PatternError,
    UserError,
    CancellationError,
}

/// A single evaluator/reader/optimizer error, with a stack of `SourceInfo`
/// annotations collected as it unwound (innermost first).
#[derive(Debug, Clone)]
pub struct WispError {
    pub kind: ErrorKind,
    pub message: String,
    /// Payload for `UserError` raised via the `error` native; `Nil` otherwise.
    pub payload: Value,
    pub trace: Vec<SourceLoc>,
}

impl WispError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        WispError {
            kind,
            message: message.into(),
            payload: Value::Nil,
            trace: Vec::new(),
        }
    }

    pub fn user(payload: Value, message: impl Into<String>) -> Self {
        WispError {
            kind: ErrorKind::UserError,
            message: message.into(),
            payload,
            trace: Vec::new(),
        }
    }

    pub fn unbound_symbol(name: &str) -> Self {
        Self::new(ErrorKind::UnboundSymbol, format!("unbound symbol: {name}"))
    }

    pub fn type_error(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::TypeError, message)
    }

    pub fn arity(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ArityError, message)
    }

    pub fn not_callable(type_name: &str) -> Self {
        Self::new(ErrorKind::NotCallable, format!("value of type '{type_name}' is not callable"))
    }

    pub fn pattern(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::PatternError, message)
    }

    pub fn cancelled() -> Self {
        Self::new(ErrorKind::CancellationError, "evaluation cancelled by host")
    }

    /// Prepends a `SourceInfo` frame to this error's trace (spec §4.1.1,
    /// §7: "any SourceInfo frame on the unwind path prepends `in
    /// <file>:<line>:<col>`").
    pub fn annotate(mut self, file: &Rc<str>, line: u32, col: u32) -> Self {
        self.trace.push(SourceLoc { file: Rc::clone(file), line, col });
        self
    }

    /// Converts this error into a Value payload, for use by `try`'s handler.
    pub fn to_value(&self) -> Value {
        if matches!(self.kind, ErrorKind::UserError) && !matches!(self.payload, Value::Nil) {
            self.payload.clone()
        } else {
            Value::string(self.message.clone())
        }
    }
}

impl fmt::Display for WispError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)?;
        for loc in &self.trace {
            write!(f, "\n  in {loc}")?;
        }
        Ok(())
    }
}

impl std::error::Error for WispError {}

pub type WispResult<T> = Result<T, WispError>;
