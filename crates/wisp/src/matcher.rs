//! `match` pattern compiler/runner (spec §4.6).
//!
//! Patterns are ordinary data, matched structurally against a value. A
//! successful match produces a list of `(name, value)` bindings that the
//! evaluator installs into a transparent child frame before evaluating the
//! corresponding result (spec §4.5 "match creates a transparent frame for
//! pattern variables").

use std::rc::Rc;

use regex::Regex;

use crate::error::WispError;
use crate::value::Value;

pub type Bindings = Vec<(Rc<str>, Value)>;

/// Tries `pattern` against `value`. `Ok(Some(bindings))` on success,
/// `Ok(None)` if the pattern simply didn't match, `Err` for a malformed
/// pattern (spec §7 `PatternError`).
pub fn try_match(pattern: &Value, value: &Value) -> Result<Option<Bindings>, WispError> {
    let mut binds = Bindings::new();
    if match_into(pattern, value, &mut binds)? {
        Ok(Some(binds))
    } else {
        Ok(None)
    }
}

fn match_into(pattern: &Value, value: &Value, binds: &mut Bindings) -> Result<bool, WispError> {
    let pattern = pattern.strip_source();
    match pattern {
        Value::Symbol(s) if s.as_ref() == "_" => Ok(true),
        Value::Symbol(s) => {
            binds.push((Rc::clone(s), value.clone()));
            Ok(true)
        }
        Value::Nil | Value::Bool(_) | Value::Int(_) | Value::Float(_) | Value::Str(_) => {
            Ok(pattern == value.strip_source())
        }
        Value::List(items) => match_list_pattern(items, value, binds),
        other => Err(WispError::pattern(format!("'{}' is not a valid match pattern", other.type_name()))),
    }
}

fn match_list_pattern(items: &[Value], value: &Value, binds: &mut Bindings) -> Result<bool, WispError> {
    let head = items.first().and_then(Value::as_symbol);
    match head {
        Some("symbol") => {
            let name = items.get(1).and_then(Value::as_str).ok_or_else(|| WispError::pattern("(symbol \"name\") expects a string literal"))?;
            Ok(matches!(value.strip_source(), Value::Symbol(s) if s.as_ref() == name))
        }
        Some("quote") => {
            let target = items.get(1).ok_or_else(|| WispError::pattern("(quote v) expects one argument"))?;
            Ok(target.strip_source() == value.strip_source())
        }
        Some("list") => {
            let value_items = match value.strip_source() {
                Value::List(v) => v,
                _ => return Ok(false),
            };
            let sub_patterns = &items[1..];
            if sub_patterns.len() != value_items.len() {
                return Ok(false);
            }
            for (p, v) in sub_patterns.iter().zip(value_items.iter()) {
                if !match_into(p, v, binds)? {
                    return Ok(false);
                }
            }
            Ok(true)
        }
        Some("cons") => {
            let head_pat = items.get(1).ok_or_else(|| WispError::pattern("(cons head tail) expects two sub-patterns"))?;
            let tail_pat = items.get(2).ok_or_else(|| WispError::pattern("(cons head tail) expects two sub-patterns"))?;
            let value_items = match value.strip_source() {
                Value::List(v) if !v.is_empty() => v,
                _ => return Ok(false),
            };
            if !match_into(head_pat, &value_items[0], binds)? {
                return Ok(false);
            }
            let tail = Value::list(value_items[1..].to_vec());
            match_into(tail_pat, &tail, binds)
        }
        Some("concat") => match_concat(&items[1..], value, binds),
        Some("regex") => match_regex(&items[1..], value, binds),
        _ => Err(WispError::pattern("unrecognized compound pattern form")),
    }
}

fn match_concat(parts: &[Value], value: &Value, binds: &mut Bindings) -> Result<bool, WispError> {
    let s = match value.strip_source().as_str() {
        Some(s) => s,
        None => return Ok(false),
    };
    match parts.len() {
        2 => {
            let (a, b) = (&parts[0], &parts[1]);
            if let Some(lit) = a.strip_source().as_str() {
                // literal + var
                if let Some(rest) = s.strip_prefix(lit) {
                    return match_into(b, &Value::string(rest), binds);
                }
                return Ok(false);
            }
            if let Some(lit) = b.strip_source().as_str() {
                // var + literal
                if let Some(rest) = s.strip_suffix(lit) {
                    return match_into(a, &Value::string(rest), binds);
                }
                return Ok(false);
            }
            Err(WispError::pattern("(concat p1 p2) needs a literal string in one position"))
        }
        3 => {
            let prefix = parts[0].strip_source().as_str().ok_or_else(|| WispError::pattern("(concat p1 p2 p3) expects literal strings in the outer positions"))?;
            let suffix = parts[2].strip_source().as_str().ok_or_else(|| WispError::pattern("(concat p1 p2 p3) expects literal strings in the outer positions"))?;
            if let Some(rest) = s.strip_prefix(prefix) {
                if let Some(mid) = rest.strip_suffix(suffix) {
                    if rest.len() >= suffix.len() {
                        return match_into(&parts[1], &Value::string(mid), binds);
                    }
                }
            }
            Ok(false)
        }
        _ => Err(WispError::pattern("(concat ...) expects 2 or 3 sub-patterns")),
    }
}

fn match_regex(parts: &[Value], value: &Value, binds: &mut Bindings) -> Result<bool, WispError> {
    let s = match value.strip_source().as_str() {
        Some(s) => s,
        None => return Ok(false),
    };
    let pattern_str = parts.first().and_then(|v| v.strip_source().as_str()).ok_or_else(|| WispError::pattern("(regex \"re\" whole ...) expects a string pattern"))?;
    let whole_name = parts.get(1).and_then(Value::as_symbol).ok_or_else(|| WispError::pattern("(regex \"re\" whole ...) expects a symbol for the whole match"))?;
    let group_names: Vec<&str> = parts[2..].iter().filter_map(Value::as_symbol).collect();
    let anchored = format!("^(?:{pattern_str})$");
    let re = Regex::new(&anchored).map_err(|e| WispError::pattern(format!("bad regex in pattern: {e}")))?;
    let caps = match re.captures(s) {
        Some(c) => c,
        None => return Ok(false),
    };
    binds.push((Rc::from(whole_name), Value::string(s)));
    for (i, name) in group_names.iter().enumerate() {
        let text = caps.get(i + 1).map(|m| m.as_str()).unwrap_or("");
        binds.push((Rc::from(*name), Value::string(text)));
    }
    Ok(true)
}
