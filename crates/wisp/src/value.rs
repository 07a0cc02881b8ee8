//! Tagged runtime value representation.
//!
//! `Value` is a single discriminated union covering every base type the
//! evaluator manipulates plus the handful of "compound" variants (closures,
//! dictionaries, parsers, host callables) that carry heap data behind an
//! `Rc`. Every variant is cheap to clone: base variants are `Copy`-ish scalars
//! or small `Rc<str>` handles, compound variants are a single `Rc` bump.

use std::fmt;
use std::rc::Rc;

use crate::declarations::Arity;
use crate::dict::FingerprintDict;
use crate::env::Env;
use crate::error::WispError;
use crate::parser_value::ParserData;

/// A user-defined function: captured environment, parameter shape, body.
#[derive(Debug)]
pub struct ProcData {
    pub name: Option<Rc<str>>,
    pub params: ParamSpec,
    pub body: Value,
    pub env: Env,
    /// Number of numbered local slots the Optimizer allocated for this body.
    /// Zero means the body still addresses locals by `Symbol`.
    pub num_vars: usize,
}

/// Shape of a lambda's parameter list (spec §4.3).
#[derive(Debug, Clone)]
pub enum ParamSpec {
    /// `(lambda (a b _ c) ...)` — positional names; `_` is a bind-less hole.
    List(Rc<[Rc<str>]>),
    /// `(lambda args ...)` — bind the whole evaluated argument list.
    Rest(Rc<str>),
    /// `(lambda () ...)` / `(lambda nil ...)` — no parameters.
    None,
}

impl ParamSpec {
    pub fn len(&self) -> usize {
        match self {
            ParamSpec::List(names) => names.len(),
            ParamSpec::Rest(_) | ParamSpec::None => 0,
        }
    }
}

/// Wrapper carrying a file/line/column for error annotation (spec §3.1, §4.1).
#[derive(Debug)]
pub struct SourceInfoData {
    pub file: Rc<str>,
    pub line: u32,
    pub col: u32,
    pub inner: Value,
}

/// A host function registered via [`crate::declarations::Declarations`].
///
/// Two call shapes exist because some natives need read access to the calling
/// environment (e.g. `eval`-adjacent helpers); most don't.
#[derive(Clone)]
pub enum NativeFn {
    Plain(Rc<dyn Fn(&[Value]) -> Result<Value, WispError>>),
    EnvAware(Rc<dyn Fn(&[Value], &Env) -> Result<Value, WispError>>),
}

impl fmt::Debug for NativeFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NativeFn(..)")
    }
}

impl NativeFn {
    pub fn call(&self, args: &[Value], env: &Env) -> Result<Value, WispError> {
        match self {
            NativeFn::Plain(f) => f(args),
            NativeFn::EnvAware(f) => f(args, env),
        }
    }

    fn ptr(&self) -> *const () {
        match self {
            NativeFn::Plain(f) => Rc::as_ptr(f).cast::<()>(),
            NativeFn::EnvAware(f) => Rc::as_ptr(f).cast::<()>(),
        }
    }
}

/// Opaque host-registered payload, tag space starting at 100 (spec §3.1).
#[derive(Clone)]
pub struct CustomValue {
    pub tag: u32,
    pub payload: Rc<dyn std::any::Any>,
}

impl fmt::Debug for CustomValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Custom(tag={})", self.tag)
    }
}

/// The tagged sum of every runtime value (spec §3.1).
#[derive(Debug, Clone)]
pub enum Value {
    Nil,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(Rc<str>),
    Symbol(Rc<str>),
    List(Rc<Vec<Value>>),
    Vector(Rc<Vec<f64>>),
    NativeFn(NativeFn, Arity),
    Proc(Rc<ProcData>),
    ParserValue(Rc<ParserData>),
    FastDict(Rc<std::cell::RefCell<FingerprintDict>>),
    SourceInfo(Rc<SourceInfoData>),
    /// Numbered-local reference produced by the Optimizer (spec §4.1.2). Never
    /// produced by the Reader and never observed by user code.
    LocalSlotIndex(u32),
    Custom(CustomValue),
}

impl Value {
    pub fn symbol(s: impl Into<Rc<str>>) -> Value {
        Value::Symbol(s.into())
    }

    pub fn string(s: impl Into<Rc<str>>) -> Value {
        Value::Str(s.into())
    }

    pub fn list(items: Vec<Value>) -> Value {
        Value::List(Rc::new(items))
    }

    pub fn as_symbol(&self) -> Option<&str> {
        match self {
            Value::Symbol(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Unwraps any number of nested `SourceInfo` wrappers.
    pub fn strip_source(&self) -> &Value {
        let mut v = self;
        while let Value::SourceInfo(s) = v {
            v = &s.inner;
        }
        v
    }

    /// Truthiness per spec §4.2 `if`: everything is true except `Nil`, `false`,
    /// zero numbers, and the empty string.
    pub fn is_truthy(&self) -> bool {
        match self.strip_source() {
            Value::Nil => false,
            Value::Bool(b) => *b,
            Value::Int(i) => *i != 0,
            Value::Float(f) => *f != 0.0,
            Value::Str(s) => !s.is_empty(),
            _ => true,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Nil => "nil",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "string",
            Value::Symbol(_) => "symbol",
            Value::List(_) => "list",
            Value::Vector(_) => "vector",
            Value::NativeFn(..) => "func",
            Value::Proc(_) => "func",
            Value::ParserValue(_) => "parser",
            Value::FastDict(_) => "dict",
            Value::SourceInfo(s) => s.inner.type_name(),
            Value::LocalSlotIndex(_) => "local-slot",
            Value::Custom(_) => "custom",
        }
    }
}

/// Structural equality for base variants, nominal (identity) equality for
/// `NativeFn`/`Proc`/`ParserValue`/`FastDict`/`Custom` (spec §3.1, resolving
/// the Open Question in spec §9 in favor of nominal equality everywhere a
/// deep-equality would require comparing opaque host state).
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self.strip_source(), other.strip_source()) {
            (Value::Nil, Value::Nil) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a.to_bits() == b.to_bits(),
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Symbol(a), Value::Symbol(b)) => a == b,
            (Value::List(a), Value::List(b)) => Rc::ptr_eq(a, b) || a == b,
            (Value::Vector(a), Value::Vector(b)) => Rc::ptr_eq(a, b) || a == b,
            (Value::NativeFn(a, _), Value::NativeFn(b, _)) => a.ptr() == b.ptr(),
            (Value::Proc(a), Value::Proc(b)) => Rc::ptr_eq(a, b),
            (Value::ParserValue(a), Value::ParserValue(b)) => Rc::ptr_eq(a, b),
            (Value::FastDict(a), Value::FastDict(b)) => Rc::ptr_eq(a, b),
            (Value::Custom(a), Value::Custom(b)) => {
                a.tag == b.tag && Rc::ptr_eq(&rc_any_erase(&a.payload), &rc_any_erase(&b.payload))
            }
            (Value::LocalSlotIndex(a), Value::LocalSlotIndex(b)) => a == b,
            _ => false,
        }
    }
}

fn rc_any_erase(rc: &Rc<dyn std::any::Any>) -> Rc<dyn std::any::Any> {
    Rc::clone(rc)
}

/// Host-side extraction of a native Rust value from a returned [`Value`]
/// (the embedding boundary's counterpart to the Reader's parse-in direction).
macro_rules! try_from_value {
    ($ty:ty, $variant:pat => $out:expr, $expected:literal) => {
        impl TryFrom<&Value> for $ty {
            type Error = WispError;

            fn try_from(value: &Value) -> Result<Self, Self::Error> {
                match value.strip_source() {
                    $variant => Ok($out),
                    other => Err(WispError::type_error(format!("expected {}, got {}", $expected, other.type_name()))),
                }
            }
        }
    };
}

try_from_value!(i64, Value::Int(i) => *i, "int");
try_from_value!(f64, Value::Float(f) => *f, "float");
try_from_value!(bool, Value::Bool(b) => *b, "bool");
try_from_value!(String, Value::Str(s) => s.to_string(), "string");


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn int_and_float_never_compare_equal() {
        assert_ne!(Value::Int(1), Value::Float(1.0));
    }

    #[test]
    fn nil_is_not_false_or_empty_list() {
        assert_ne!(Value::Nil, Value::Bool(false));
        assert_ne!(Value::Nil, Value::list(vec![]));
    }

    #[test]
    fn truthiness_matches_spec_table() {
        assert!(!Value::Nil.is_truthy());
        assert!(!Value::Bool(false).is_truthy());
        assert!(Value::Bool(true).is_truthy());
        assert!(!Value::Int(0).is_truthy());
        assert!(Value::Int(1).is_truthy());
        assert!(!Value::string("").is_truthy());
        assert!(Value::string("x").is_truthy());
        assert!(Value::list(vec![]).is_truthy());
    }

    #[test]
    fn lists_compare_structurally() {
        let a = Value::list(vec![Value::Int(1), Value::Int(2)]);
        let b = Value::list(vec![Value::Int(1), Value::Int(2)]);
        assert_eq!(a, b);
    }
}
