//! Process-wide native-function registry (spec §4.8).
//!
//! A `Declarations` table is built once via [`DeclarationsBuilder`] and is
//! read-only afterward — the design note in spec §9 ("Global mutable
//! state... initialize via an explicit builder rather than scattered init
//! hooks") is implemented literally: there is no API to register a native
//! after `build()` returns.

use std::rc::Rc;

use crate::env::Env;
use crate::value::{NativeFn, Value};

/// Minimum/maximum accepted argument count. `max = None` means unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Arity {
    pub min: usize,
    pub max: Option<usize>,
}

impl Arity {
    pub const fn exact(n: usize) -> Self {
        Arity { min: n, max: Some(n) }
    }

    pub const fn at_least(n: usize) -> Self {
        Arity { min: n, max: None }
    }

    pub const fn range(min: usize, max: usize) -> Self {
        Arity { min, max: Some(max) }
    }

    pub fn accepts(&self, n: usize) -> bool {
        n >= self.min && self.max.map(|max| n <= max).unwrap_or(true)
    }

    pub fn describe(&self) -> String {
        match self.max {
            Some(max) if max == self.min => format!("{}", self.min),
            Some(max) => format!("{}..{}", self.min, max),
            None => format!("{}+", self.min),
        }
    }
}

/// Declared type for one parameter or a return value. `ReturnType` is the
/// special "returntype" sentinel from spec §4.8, meaning "whatever type the
/// argument tagged `returntype` turned out to be" (used by `if`, `match`,
/// lambda bodies, `coalesce`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclType {
    Any,
    String,
    Number,
    Int,
    Bool,
    Func,
    List,
    Symbol,
    Nil,
    ReturnType,
}

#[derive(Debug, Clone)]
pub struct ParamDecl {
    pub name: &'static str,
    pub ty: DeclType,
    pub description: &'static str,
}

/// One entry in the Declarations registry.
#[derive(Clone)]
pub struct Declaration {
    pub name: &'static str,
    pub description: &'static str,
    pub arity: Arity,
    pub params: Vec<ParamDecl>,
    pub return_type: DeclType,
    pub foldable: bool,
    pub chapter: &'static str,
    pub func: NativeFn,
}

/// The read-only, process-wide table produced by [`DeclarationsBuilder`].
pub struct Declarations {
    entries: Vec<Declaration>,
}

impl Declarations {
    pub fn get(&self, name: &str) -> Option<&Declaration> {
        self.entries.iter().find(|d| d.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Declaration> {
        self.entries.iter()
    }

    pub fn chapters(&self) -> Vec<&'static str> {
        let mut seen = Vec::new();
        for d in &self.entries {
            if !seen.contains(&d.chapter) {
                seen.push(d.chapter);
            }
        }
        seen
    }
}

/// Accumulates declarations and, on `build`, both freezes the table and
/// defines every native into `global` under its name (spec §4.8 "Registration
/// inserts the function into the global Environment").
#[derive(Default)]
pub struct DeclarationsBuilder {
    entries: Vec<Declaration>,
}

impl DeclarationsBuilder {
    pub fn new() -> Self {
        DeclarationsBuilder::default()
    }

    #[allow(clippy::too_many_arguments)]
    pub fn register(
        &mut self,
        name: &'static str,
        chapter: &'static str,
        description: &'static str,
        arity: Arity,
        params: Vec<ParamDecl>,
        return_type: DeclType,
        foldable: bool,
        func: impl Fn(&[Value]) -> Result<Value, crate::error::WispError> + 'static,
    ) -> &mut Self {
        self.entries.push(Declaration {
            name,
            description,
            arity,
            params,
            return_type,
            foldable,
            chapter,
            func: NativeFn::Plain(Rc::new(func)),
        });
        self
    }

    pub fn register_env_aware(
        &mut self,
        name: &'static str,
        chapter: &'static str,
        description: &'static str,
        arity: Arity,
        params: Vec<ParamDecl>,
        return_type: DeclType,
        func: impl Fn(&[Value], &Env) -> Result<Value, crate::error::WispError> + 'static,
    ) -> &mut Self {
        self.entries.push(Declaration {
            name,
            description,
            arity,
            params,
            return_type,
            foldable: false,
            chapter,
            func: NativeFn::EnvAware(Rc::new(func)),
        });
        self
    }

    /// Freezes the table and defines every entry into `global`.
    pub fn build(self, global: &Env) -> Declarations {
        for decl in &self.entries {
            global.define(
                Rc::from(decl.name),
                Value::NativeFn(decl.func.clone(), decl.arity),
            );
        }
        Declarations { entries: self.entries }
    }
}
