//! Chained lexical environments (spec §3.2).
//!
//! Each frame holds a named-slot map (`Symbol -> Value`) and, when the
//! enclosing `Proc` was numbered by the Optimizer, a parallel numbered-slot
//! vector. `define`/`set` walk outward from the innermost frame and write
//! into the first frame whose `transparent` flag is *not* set — this is the
//! semantics spec §9's Open Question #1 fixes (the "newer" path, not the
//! legacy innermost-frame-always write).

use std::cell::RefCell;
use std::rc::Rc;

use ahash::AHashMap;

use crate::error::WispError;
use crate::value::Value;

struct EnvData {
    vars: AHashMap<Rc<str>, Value>,
    slots: Vec<Value>,
    outer: Option<Env>,
    /// Frames created by `begin`, `match`, and module imports set this so
    /// `define`/`set` write through to an enclosing scope instead of
    /// shadowing locally (spec §4.5, §4.6).
    transparent: bool,
}

/// A handle to one environment frame. Cheap to clone (single `Rc` bump);
/// cloning does not copy bindings, it shares the frame.
#[derive(Clone)]
pub struct Env(Rc<RefCell<EnvData>>);

impl Env {
    /// Creates the root (global) environment. Its identity is stable for the
    /// lifetime of the host process; natives are registered into it once at
    /// startup and it is never treated as transparent.
    pub fn root() -> Env {
        Env(Rc::new(RefCell::new(EnvData {
            vars: AHashMap::new(),
            slots: Vec::new(),
            outer: None,
            transparent: false,
        })))
    }

    /// Creates a child frame with no numbered slots.
    pub fn child(&self, transparent: bool) -> Env {
        Env(Rc::new(RefCell::new(EnvData {
            vars: AHashMap::new(),
            slots: Vec::new(),
            outer: Some(self.clone()),
            transparent,
        })))
    }

    /// Creates a child frame pre-sized for `num_vars` numbered locals, as
    /// produced for a Proc whose body the Optimizer numbered (spec §4.1.2,
    /// §4.3).
    pub fn child_with_slots(&self, num_vars: usize) -> Env {
        Env(Rc::new(RefCell::new(EnvData {
            vars: AHashMap::new(),
            slots: vec![Value::Nil; num_vars],
            outer: Some(self.clone()),
            transparent: false,
        })))
    }

    /// Looks up `name`, searching this frame and then each outer frame in
    /// turn. Returns `None` if unbound anywhere in the chain.
    pub fn get(&self, name: &str) -> Option<Value> {
        let data = self.0.borrow();
        if let Some(v) = data.vars.get(name) {
            return Some(v.clone());
        }
        match &data.outer {
            Some(outer) => outer.get(name),
            None => None,
        }
    }

    /// Writes `name = value` into the innermost frame whose `transparent`
    /// flag is false, walking outward from `self` (spec §3.2, §4.5).
    pub fn define(&self, name: Rc<str>, value: Value) {
        let mut frame = self.clone();
        loop {
            let is_transparent = frame.0.borrow().transparent;
            if !is_transparent {
                frame.0.borrow_mut().vars.insert(name, value);
                return;
            }
            let next = frame.0.borrow().outer.clone();
            match next {
                Some(outer) => frame = outer,
                // Global frame (index 0) is never transparent, so this is
                // unreachable in practice, but fall back to writing here.
                None => {
                    frame.0.borrow_mut().vars.insert(name, value);
                    return;
                }
            }
        }
    }

    /// Writes directly into *this* frame's named-slot map, ignoring the
    /// `transparent` flag. Used to install lambda parameters and
    /// match-pattern bindings — both need to land in the frame just created
    /// for them even when that frame is itself transparent to `define`
    /// (spec §4.5 "match creates a transparent frame for pattern variables").
    pub fn bind_local(&self, name: Rc<str>, value: Value) {
        self.0.borrow_mut().vars.insert(name, value);
    }

    /// Reads numbered slot `n` of *this* frame (no outward search — numbered
    /// slots are local to a single Proc invocation, spec §4.1.2).
    pub fn get_slot(&self, n: u32) -> Result<Value, WispError> {
        self.0
            .borrow()
            .slots
            .get(n as usize)
            .cloned()
            .ok_or_else(|| WispError::type_error(format!("local slot {n} out of range")))
    }

    pub fn set_slot(&self, n: u32, value: Value) -> Result<(), WispError> {
        let mut data = self.0.borrow_mut();
        match data.slots.get_mut(n as usize) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(WispError::type_error(format!("local slot {n} out of range"))),
        }
    }

    /// Initializes slots `0..values.len()` in this frame, used to bind a
    /// numbered Proc's arguments (spec §4.3).
    pub fn init_slots(&self, values: Vec<Value>) {
        self.0.borrow_mut().slots = values;
    }

    /// The lexically enclosing frame, used by the `outer` special form.
    pub fn outer(&self) -> Option<Env> {
        self.0.borrow().outer.clone()
    }

    /// Identity comparison, used by tests and by hosts wanting to recognize
    /// the stable global frame.
    pub fn is_same(&self, other: &Env) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}
