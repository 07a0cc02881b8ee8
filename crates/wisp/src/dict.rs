//! Fingerprinted associative dictionary (spec §3.3, §4.11).
//!
//! Storage is a flat `Vec<(Value, Value)>` in insertion order plus a side
//! index from a recursive structural fingerprint to the slot positions that
//! hash to it. Lookup fingerprints the key, walks the bucket, and verifies
//! structural equality on every candidate — correctness never depends on the
//! fingerprint being collision-free (spec §4.11).

use ahash::AHashMap;
use std::rc::Rc;

use crate::value::Value;

/// Recursive, process-stable structural hash of a `Value`. Only ever used as
/// a bucket index; `FingerprintDict::get` always verifies equality on the
/// candidates it finds, so a bad hash only costs performance, never
/// correctness (spec §4.11 "Correctness is independent of hash collisions").
pub fn fingerprint(v: &Value, seed: u64) -> u64 {
    let mut h = seed;
    fingerprint_into(v, &mut h);
    h
}

fn mix(h: &mut u64, byte_tag: u8) {
    *h ^= u64::from(byte_tag);
    *h = h.wrapping_mul(0x100000001b3);
}

fn feed_bytes(h: &mut u64, bytes: &[u8]) {
    for b in bytes {
        *h ^= u64::from(*b);
        *h = h.wrapping_mul(0x100000001b3);
    }
}

fn fingerprint_into(v: &Value, h: &mut u64) {
    match v.strip_source() {
        Value::Nil => mix(h, 0),
        Value::Bool(b) => {
            mix(h, 1);
            feed_bytes(h, &[u8::from(*b)]);
        }
        Value::Int(i) => {
            mix(h, 2);
            feed_bytes(h, &i.to_le_bytes());
        }
        Value::Float(f) => {
            mix(h, 3);
            feed_bytes(h, &f.to_bits().to_le_bytes());
        }
        Value::Str(s) => {
            mix(h, 4);
            feed_bytes(h, &(s.len() as u64).to_le_bytes());
            feed_bytes(h, s.as_bytes());
        }
        Value::Symbol(s) => {
            mix(h, 5);
            feed_bytes(h, &(s.len() as u64).to_le_bytes());
            feed_bytes(h, s.as_bytes());
        }
        Value::List(items) => {
            mix(h, 6);
            feed_bytes(h, &(items.len() as u64).to_le_bytes());
            for item in items.iter() {
                fingerprint_into(item, h);
            }
        }
        Value::Vector(items) => {
            mix(h, 7);
            feed_bytes(h, &(items.len() as u64).to_le_bytes());
            for item in items.iter() {
                feed_bytes(h, &item.to_bits().to_le_bytes());
            }
        }
        Value::FastDict(d) => {
            // A dict fingerprints as if it were the list of its pairs, so a
            // list-of-pairs and an equal-content dict collide deliberately
            // (spec §3.3).
            mix(h, 6);
            let d = d.borrow();
            feed_bytes(h, &(d.entries.len() as u64).to_le_bytes());
            for (k, val) in d.iter() {
                fingerprint_into(&Value::list(vec![k.clone(), val.clone()]), h);
            }
        }
        other => {
            mix(h, 99);
            feed_bytes(h, other.type_name().as_bytes());
        }
    }
}

pub type Merge = Rc<dyn Fn(&Value, &Value) -> Value>;

pub struct FingerprintDict {
    entries: Vec<(Value, Value)>,
    index: AHashMap<u64, Vec<usize>>,
    seed: u64,
}

impl FingerprintDict {
    pub fn new(cap_hint_pairs: usize) -> Self {
        FingerprintDict {
            entries: Vec::with_capacity(cap_hint_pairs),
            index: AHashMap::with_capacity(cap_hint_pairs),
            // "seed fixed at start": derived once from ahash's per-process
            // random state rather than hardcoded, so fingerprints differ
            // across runs but are stable within one (spec §3.3).
            seed: {
                use std::hash::{BuildHasher, Hasher};
                ahash::RandomState::new().build_hasher().finish()
            },
        }
    }

    fn find_slot(&self, key: &Value) -> Option<usize> {
        let fp = fingerprint(key, self.seed);
        self.index.get(&fp).and_then(|slots| slots.iter().copied().find(|&idx| &self.entries[idx].0 == key))
    }

    pub fn get(&self, key: &Value) -> Option<Value> {
        self.find_slot(key).map(|idx| self.entries[idx].1.clone())
    }

    /// Inserts or updates `key`. With `merge`, an existing binding becomes
    /// `merge(old, new)`; otherwise the new value replaces it outright. New
    /// keys are appended, preserving insertion order (spec §4.11).
    pub fn set(&mut self, key: Value, value: Value, merge: Option<&Merge>) {
        if let Some(idx) = self.find_slot(&key) {
            let merged = match merge {
                Some(f) => f(&self.entries[idx].1, &value),
                None => value,
            };
            self.entries[idx].1 = merged;
            return;
        }
        let idx = self.entries.len();
        let fp = fingerprint(&key, self.seed);
        self.index.entry(fp).or_default().push(idx);
        self.entries.push((key, value));
    }

    /// Calls `f(k, v)` in insertion order until it returns `false`.
    pub fn for_each(&self, mut f: impl FnMut(&Value, &Value) -> bool) {
        for (k, v) in &self.entries {
            if !f(k, v) {
                break;
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Value, &Value)> {
        self.entries.iter().map(|(k, v)| (k, v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The underlying flat `(k v k v ...)` vector (spec §4.11 `toList`).
    pub fn to_flat_list(&self) -> Vec<Value> {
        let mut out = Vec::with_capacity(self.entries.len() * 2);
        for (k, v) in &self.entries {
            out.push(k.clone());
            out.push(v.clone());
        }
        out
    }

    /// Structural comparison used only by tests: true when both dicts hold
    /// the same (k, v) pairs in the same order, independent of fingerprint
    /// seed (spec §8 "fingerprint insensitivity"). `Value`'s own `PartialEq`
    /// treats `FastDict` nominally (spec §3.1); this is a deliberately
    /// separate, stronger comparison.
    pub fn eq_contents(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_returns_last_value_set() {
        let mut d = FingerprintDict::new(4);
        d.set(Value::string("a"), Value::Int(1), None);
        d.set(Value::string("a"), Value::Int(2), None);
        assert_eq!(d.get(&Value::string("a")), Some(Value::Int(2)));
    }

    #[test]
    fn iteration_order_is_insertion_order() {
        let mut d = FingerprintDict::new(4);
        d.set(Value::string("b"), Value::Int(2), None);
        d.set(Value::string("a"), Value::Int(1), None);
        let keys: Vec<_> = d.iter().map(|(k, _)| k.as_str().unwrap().to_owned()).collect();
        assert_eq!(keys, vec!["b".to_owned(), "a".to_owned()]);
    }

    #[test]
    fn fingerprint_insensitivity_to_seed() {
        let mut a = FingerprintDict::new(4);
        a.seed = 1;
        a.set(Value::string("x"), Value::Int(1), None);
        let mut b = FingerprintDict::new(4);
        b.seed = 2;
        b.set(Value::string("x"), Value::Int(1), None);
        assert!(a.eq_contents(&b));
    }

    #[test]
    fn merge_combiner_replaces_with_combined_value() {
        let mut d = FingerprintDict::new(4);
        d.set(Value::string("a"), Value::Int(1), None);
        let merge: Merge = Rc::new(|old: &Value, new: &Value| {
            Value::Int(old.as_int().unwrap() + new.as_int().unwrap())
        });
        d.set(Value::string("a"), Value::Int(41), Some(&merge));
        assert_eq!(d.get(&Value::string("a")), Some(Value::Int(42)));
    }

    #[test]
    fn absent_key_returns_none() {
        let d = FingerprintDict::new(4);
        assert_eq!(d.get(&Value::string("missing")), None);
    }
}
