//! `FastDict` constructor natives (spec §3.3, §4.11, SPEC_FULL §C.5).

use std::cell::RefCell;
use std::rc::Rc;

use crate::declarations::{Arity, DeclType, DeclarationsBuilder};
use crate::dict::FingerprintDict;
use crate::error::WispError;
use crate::value::Value;

pub fn register(b: &mut DeclarationsBuilder) {
    // Not foldable: constructs a fresh FastDict handle each call, and
    // FastDict equality is nominal (spec §3.1) so folding would gain nothing.
    b.register("set_assoc", "dicts", "returns a new dict/list with key bound to value", Arity::exact(3), vec![], DeclType::Any, false, set_assoc);
    b.register("dict-size", "dicts", "returns the number of entries in a dict", Arity::exact(1), vec![], DeclType::Int, false, dict_size);
}

/// Accepts a `FastDict`, a flat assoc `List` (`k1 v1 k2 v2 ...`), or `Nil`
/// (empty), and returns a new `FastDict` with `key` bound to `value` (spec
/// §8 scenario 5: `set_assoc` chains starting from `(list)`).
fn set_assoc(args: &[Value]) -> Result<Value, WispError> {
    let (container, key, value) = (&args[0], &args[1], &args[2]);
    let mut dict = match container.strip_source() {
        Value::FastDict(d) => {
            let existing = d.borrow();
            let mut copy = FingerprintDict::new(existing.len() + 1);
            for (k, v) in existing.iter() {
                copy.set(k.clone(), v.clone(), None);
            }
            copy
        }
        Value::List(items) => {
            let mut copy = FingerprintDict::new(items.len() / 2 + 1);
            let mut i = 0;
            while i + 1 < items.len() {
                copy.set(items[i].clone(), items[i + 1].clone(), None);
                i += 2;
            }
            copy
        }
        Value::Nil => FingerprintDict::new(1),
        other => return Err(WispError::type_error(format!("set_assoc expects a list or dict, got {}", other.type_name()))),
    };
    dict.set(key.clone(), value.clone(), None);
    Ok(Value::FastDict(Rc::new(RefCell::new(dict))))
}

fn dict_size(args: &[Value]) -> Result<Value, WispError> {
    match args[0].strip_source() {
        Value::FastDict(d) => Ok(Value::Int(d.borrow().len() as i64)),
        other => Err(WispError::type_error(format!("dict-size expects a dict, got {}", other.type_name()))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_assoc_chains_from_an_empty_list() {
        let empty = Value::list(vec![]);
        let one = set_assoc(&[empty, Value::string("a"), Value::Int(1)]).unwrap();
        let two = set_assoc(&[one, Value::string("b"), Value::Int(2)]).unwrap();
        if let Value::FastDict(d) = &two {
            assert_eq!(d.borrow().get(&Value::string("a")), Some(Value::Int(1)));
            assert_eq!(d.borrow().get(&Value::string("b")), Some(Value::Int(2)));
            assert_eq!(d.borrow().get(&Value::string("c")), None);
        } else {
            panic!("expected a FastDict");
        }
    }

    #[test]
    fn set_assoc_does_not_mutate_the_source_dict() {
        let empty = Value::list(vec![]);
        let one = set_assoc(&[empty, Value::string("a"), Value::Int(1)]).unwrap();
        let _two = set_assoc(&[one.clone(), Value::string("a"), Value::Int(99)]).unwrap();
        if let Value::FastDict(d) = &one {
            assert_eq!(d.borrow().get(&Value::string("a")), Some(Value::Int(1)));
        } else {
            panic!("expected a FastDict");
        }
    }
}
