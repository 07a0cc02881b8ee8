//! First-class parser values (spec §4.10).
//!
//! A `ParserValue` compiles a grammar *described as ordinary Scheme data* —
//! the same data the Reader would hand back for any other list — into a
//! small combinator tree. Construction is deterministic (no evaluation of
//! arbitrary code happens while compiling the grammar) and running a parser
//! against a string is pure: it never mutates the Environment or performs
//! I/O. Exactly which grammar shapes exist is left to this module by design
//! (spec §4.10 scopes only the construction/execution contract, not the
//! grammar), grounded on `parser`-as-callable being dispatched the same way
//! `match`'s pattern language is (spec §4.6) — both compile data into a
//! runnable tree once, ahead of use.

use std::rc::Rc;

use regex::Regex;

use crate::error::WispError;
use crate::value::Value;

#[derive(Debug)]
pub enum Grammar {
    /// `(lit "text")` — matches a literal prefix.
    Lit(Rc<str>),
    /// `(regex "re")` — matches at the current position.
    Regex(Regex),
    /// `(seq p1 p2 ...)` — matches in order, result is a list of sub-results.
    Seq(Vec<Grammar>),
    /// `(alt p1 p2 ...)` — first success wins.
    Alt(Vec<Grammar>),
    /// `(many p)` — zero or more, result is a list.
    Many(Box<Grammar>),
    /// `(opt p)` — zero or one.
    Opt(Box<Grammar>),
    /// `(bind name p)` — records `p`'s match under `name` in the output
    /// dict alongside the whole match.
    Bind(Rc<str>, Box<Grammar>),
}

pub struct ParserData {
    pub grammar: Grammar,
}

struct MatchOut {
    consumed: usize,
    value: Value,
    bindings: Vec<(Rc<str>, Value)>,
}

/// Compiles a grammar description (spec §4.2 `parser`) into a `ParserData`.
/// Unrecognized shapes are a construction-time `TypeError`, matching the
/// evaluator's convention of failing fast on malformed data (spec §4.6 does
/// the same for malformed `match` patterns).
pub fn compile(desc: &Value) -> Result<ParserData, WispError> {
    Ok(ParserData { grammar: compile_grammar(desc)? })
}

fn compile_grammar(desc: &Value) -> Result<Grammar, WispError> {
    let desc = desc.strip_source();
    let items = desc
        .as_list()
        .ok_or_else(|| WispError::type_error("parser grammar node must be a list"))?;
    let head = items
        .first()
        .and_then(Value::as_symbol)
        .ok_or_else(|| WispError::type_error("parser grammar node must start with a symbol"))?;
    match head {
        "lit" => {
            let text = items.get(1).and_then(Value::as_str).ok_or_else(|| WispError::type_error("(lit \"text\") expects a string"))?;
            Ok(Grammar::Lit(Rc::from(text)))
        }
        "regex" => {
            let pattern = items.get(1).and_then(Value::as_str).ok_or_else(|| WispError::type_error("(regex \"re\") expects a string"))?;
            let anchored = format!("^(?:{pattern})");
            let re = Regex::new(&anchored).map_err(|e| WispError::type_error(format!("bad regex in parser: {e}")))?;
            Ok(Grammar::Regex(re))
        }
        "seq" => Ok(Grammar::Seq(items[1..].iter().map(compile_grammar).collect::<Result<_, _>>()?)),
        "alt" => Ok(Grammar::Alt(items[1..].iter().map(compile_grammar).collect::<Result<_, _>>()?)),
        "many" => Ok(Grammar::Many(Box::new(compile_grammar(items.get(1).ok_or_else(|| WispError::type_error("(many p) expects a sub-parser"))?)?))),
        "opt" => Ok(Grammar::Opt(Box::new(compile_grammar(items.get(1).ok_or_else(|| WispError::type_error("(opt p) expects a sub-parser"))?)?))),
        "bind" => {
            let name = items.get(1).and_then(Value::as_symbol).ok_or_else(|| WispError::type_error("(bind name p) expects a symbol name"))?;
            let inner = compile_grammar(items.get(2).ok_or_else(|| WispError::type_error("(bind name p) expects a sub-parser"))?)?;
            Ok(Grammar::Bind(Rc::from(name), Box::new(inner)))
        }
        other => Err(WispError::type_error(format!("unknown parser grammar form '{other}'"))),
    }
}

/// Runs `parser` against `input`, starting at byte offset 0. Returns a
/// `FastDict`-free result: `Nil` on failure, otherwise a list
/// `(whole-match binding-dict rest)` where `binding-dict` is built from any
/// `bind` nodes encountered.
pub fn run(parser: &ParserData, input: &str) -> Result<Value, WispError> {
    match match_grammar(&parser.grammar, input, 0) {
        Some(out) => {
            let whole = Value::string(&input[0..out.consumed]);
            let mut dict = crate::dict::FingerprintDict::new(out.bindings.len());
            for (name, v) in out.bindings {
                dict.set(Value::symbol(name), v, None);
            }
            let rest = Value::string(&input[out.consumed..]);
            Ok(Value::list(vec![
                whole,
                Value::FastDict(Rc::new(std::cell::RefCell::new(dict))),
                rest,
            ]))
        }
        None => Ok(Value::Nil),
    }
}

fn match_grammar(g: &Grammar, input: &str, pos: usize) -> Option<MatchOut> {
    match g {
        Grammar::Lit(text) => {
            if input[pos..].starts_with(text.as_ref()) {
                Some(MatchOut { consumed: pos + text.len(), value: Value::string(text.as_ref()), bindings: vec![] })
            } else {
                None
            }
        }
        Grammar::Regex(re) => {
            let m = re.find(&input[pos..])?;
            if m.start() != 0 {
                return None;
            }
            let text = &input[pos..pos + m.end()];
            Some(MatchOut { consumed: pos + m.end(), value: Value::string(text), bindings: vec![] })
        }
        Grammar::Seq(parts) => {
            let mut cur = pos;
            let mut values = Vec::with_capacity(parts.len());
            let mut bindings = Vec::new();
            for part in parts {
                let out = match_grammar(part, input, cur)?;
                cur = out.consumed;
                values.push(out.value);
                bindings.extend(out.bindings);
            }
            Some(MatchOut { consumed: cur, value: Value::list(values), bindings })
        }
        Grammar::Alt(options) => {
            for opt in options {
                if let Some(out) = match_grammar(opt, input, pos) {
                    return Some(out);
                }
            }
            None
        }
        Grammar::Many(inner) => {
            let mut cur = pos;
            let mut values = Vec::new();
            let mut bindings = Vec::new();
            while let Some(out) = match_grammar(inner, input, cur) {
                if out.consumed == cur {
                    break; // never loop forever on a zero-width match
                }
                cur = out.consumed;
                values.push(out.value);
                bindings.extend(out.bindings);
            }
            Some(MatchOut { consumed: cur, value: Value::list(values), bindings })
        }
        Grammar::Opt(inner) => match match_grammar(inner, input, pos) {
            Some(out) => Some(out),
            None => Some(MatchOut { consumed: pos, value: Value::Nil, bindings: vec![] }),
        },
        Grammar::Bind(name, inner) => {
            let mut out = match_grammar(inner, input, pos)?;
            out.bindings.push((Rc::clone(name), out.value.clone()));
            Some(out)
        }
    }
}
