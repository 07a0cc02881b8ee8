//! Text → AST reader (spec §4.9, §6 `Parse`).
//!
//! Every node the reader produces is wrapped in a `SourceInfo` carrying the
//! filename/line/column it started at (spec §3.1, §9 "stored as a wrapper
//! value rather than a side table to keep AST handling uniform"). The
//! evaluator unwraps these transparently (spec §4.1.1); nothing else needs
//! to know they exist.

use std::rc::Rc;

use crate::error::{ErrorKind, WispError};
use crate::value::{SourceInfoData, Value};

struct Reader<'a> {
    chars: std::iter::Peekable<std::str::CharIndices<'a>>,
    src: &'a str,
    file: Rc<str>,
    line: u32,
    col: u32,
}

impl<'a> Reader<'a> {
    fn new(src: &'a str, file: Rc<str>) -> Self {
        Reader { chars: src.char_indices().peekable(), src, file, line: 1, col: 1 }
    }

    fn peek_char(&mut self) -> Option<char> {
        self.chars.peek().map(|(_, c)| *c)
    }

    fn bump(&mut self) -> Option<char> {
        let (_, c) = self.chars.next()?;
        if c == '\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        Some(c)
    }

    fn skip_atmosphere(&mut self) {
        loop {
            match self.peek_char() {
                Some(c) if c.is_whitespace() => {
                    self.bump();
                }
                Some(';') => {
                    while let Some(c) = self.peek_char() {
                        if c == '\n' {
                            break;
                        }
                        self.bump();
                    }
                }
                _ => break,
            }
        }
    }

    fn wrap(&self, line: u32, col: u32, inner: Value) -> Value {
        Value::SourceInfo(Rc::new(SourceInfoData { file: Rc::clone(&self.file), line, col, inner }))
    }

    fn err(&self, msg: impl Into<String>) -> WispError {
        WispError::new(ErrorKind::ParseError, msg).annotate(&self.file, self.line, self.col)
    }

    /// Reads one datum, or `None` at end of input.
    fn read_datum(&mut self) -> Result<Option<Value>, WispError> {
        self.skip_atmosphere();
        let (line, col) = (self.line, self.col);
        match self.peek_char() {
            None => Ok(None),
            Some('(') => {
                self.bump();
                Ok(Some(self.wrap(line, col, self.read_list()?)))
            }
            Some(')') => Err(self.err("unexpected ')'")),
            Some('\'') => {
                self.bump();
                let inner = self
                    .read_datum()?
                    .ok_or_else(|| self.err("expecting a datum after '\''"))?;
                let quoted = Value::list(vec![Value::symbol("quote"), inner]);
                Ok(Some(self.wrap(line, col, quoted)))
            }
            Some('"') => Ok(Some(self.wrap(line, col, self.read_string()?))),
            Some('#') => {
                let mut ahead = self.chars.clone();
                ahead.next();
                if matches!(ahead.peek(), Some((_, '('))) {
                    self.bump();
                    self.bump();
                    Ok(Some(self.wrap(line, col, self.read_vector()?)))
                } else {
                    Ok(Some(self.wrap(line, col, self.read_atom()?)))
                }
            }
            Some(_) => Ok(Some(self.wrap(line, col, self.read_atom()?))),
        }
    }

    /// `#(1 2 3)` vector literal (spec §3.1, §4.9 — the reader's counterpart
    /// to the serializer's `#(...)` output for `Value::Vector`).
    fn read_vector(&mut self) -> Result<Value, WispError> {
        let mut items = Vec::new();
        loop {
            self.skip_atmosphere();
            match self.peek_char() {
                None => return Err(self.err("expecting matching ')'")),
                Some(')') => {
                    self.bump();
                    return Ok(Value::Vector(Rc::new(items)));
                }
                _ => {
                    let start = self.chars.peek().map(|(i, _)| *i).unwrap_or(self.src.len());
                    while let Some(c) = self.peek_char() {
                        if c.is_whitespace() || c == '(' || c == ')' || c == ';' {
                            break;
                        }
                        self.bump();
                    }
                    let end = self.chars.peek().map(|(i, _)| *i).unwrap_or(self.src.len());
                    let text = &self.src[start..end];
                    let n = text
                        .parse::<f64>()
                        .map_err(|_| self.err(format!("expecting a number in vector literal, got '{text}'")))?;
                    items.push(n);
                }
            }
        }
    }

    fn read_list(&mut self) -> Result<Value, WispError> {
        let mut items = Vec::new();
        loop {
            self.skip_atmosphere();
            match self.peek_char() {
                None => return Err(self.err("expecting matching ')'")),
                Some(')') => {
                    self.bump();
                    return Ok(Value::list(items));
                }
                _ => {
                    let item = self
                        .read_datum()?
                        .ok_or_else(|| self.err("expecting matching ')'"))?;
                    items.push(item);
                }
            }
        }
    }

    fn read_string(&mut self) -> Result<Value, WispError> {
        self.bump(); // opening quote
        let mut s = String::new();
        loop {
            match self.bump() {
                None => return Err(self.err("unterminated string literal")),
                Some('"') => return Ok(Value::string(s)),
                Some('\\') => match self.bump() {
                    Some('n') => s.push('\n'),
                    Some('t') => s.push('\t'),
                    Some('r') => s.push('\r'),
                    Some('"') => s.push('"'),
                    Some('\\') => s.push('\\'),
                    Some(c) => s.push(c),
                    None => return Err(self.err("unterminated string literal")),
                },
                Some(c) => s.push(c),
            }
        }
    }

    fn read_atom(&mut self) -> Result<Value, WispError> {
        let start = self.chars.peek().map(|(i, _)| *i).unwrap_or(self.src.len());
        while let Some(c) = self.peek_char() {
            if c.is_whitespace() || c == '(' || c == ')' || c == ';' || c == '"' {
                break;
            }
            self.bump();
        }
        let end = self.chars.peek().map(|(i, _)| *i).unwrap_or(self.src.len());
        let text = &self.src[start..end];
        match text {
            "#t" => return Ok(Value::Bool(true)),
            "#f" => return Ok(Value::Bool(false)),
            "nil" => return Ok(Value::Nil),
            _ => {}
        }
        if let Ok(i) = text.parse::<i64>() {
            return Ok(Value::Int(i));
        }
        if let Ok(f) = text.parse::<f64>() {
            if text.chars().any(|c| c == '.' || c == 'e' || c == 'E') {
                return Ok(Value::Float(f));
            }
        }
        Ok(Value::symbol(text))
    }
}

/// Reads exactly one datum; an error if the source holds none.
pub fn read_one(src: &str, filename: &str) -> Result<Value, WispError> {
    let mut r = Reader::new(src, Rc::from(filename));
    r.read_datum()?.ok_or_else(|| r.err("expecting a datum, found end of input"))
}

/// Reads every top-level datum in `src`. A single top-level form is returned
/// as-is; multiple are wrapped in an implicit `(begin ...)` (spec §6 `Parse`
/// returns "an AST Value", singular, for a whole program).
pub fn read_program(src: &str, filename: &str) -> Result<Value, WispError> {
    let mut r = Reader::new(src, Rc::from(filename));
    let mut forms = Vec::new();
    while let Some(v) = r.read_datum()? {
        forms.push(v);
    }
    match forms.len() {
        0 => Ok(Value::Nil),
        1 => Ok(forms.into_iter().next().unwrap()),
        _ => {
            let mut items = vec![Value::symbol("begin")];
            items.extend(forms);
            Ok(Value::list(items))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_integers_and_floats() {
        assert_eq!(read_one("42", "t").unwrap().strip_source().clone(), Value::Int(42));
        assert_eq!(read_one("-3.5", "t").unwrap().strip_source().clone(), Value::Float(-3.5));
    }

    #[test]
    fn reads_strings_with_escapes() {
        let v = read_one(r#""a\nb""#, "t").unwrap();
        assert_eq!(v.strip_source().clone(), Value::string("a\nb"));
    }

    #[test]
    fn quote_shorthand_desugars() {
        let v = read_one("'(1 2)", "t").unwrap();
        let items = v.strip_source().as_list().unwrap();
        assert_eq!(items[0].strip_source().as_symbol(), Some("quote"));
    }

    #[test]
    fn unterminated_list_is_parse_error() {
        let err = read_one("(1 2", "t").unwrap_err();
        assert_eq!(err.kind, ErrorKind::ParseError);
        assert!(err.message.contains("expecting matching ')'"));
    }

    #[test]
    fn line_comments_are_skipped() {
        let v = read_one("; comment\n42", "t").unwrap();
        assert_eq!(v.strip_source().clone(), Value::Int(42));
    }
}
