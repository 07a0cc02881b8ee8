//! Interactive line-editor loop (spec §6 "CLI/REPL (collaborator)").
//!
//! Each accepted line runs the full Parse → Optimize → Eval → Serialize
//! pipeline against a persistent global Environment, so `define`d names
//! from one line are visible to the next. Paren-balanced continuation is
//! detected the way spec §6 specifies: on the Reader's specific parse
//! error message, accumulate more input instead of reporting the error.

use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use wisp::{Declarations, Env, ErrorKind, ResourceTracker};

const CONTINUATION_MARKER: &str = "expecting matching ')'";

pub fn run(env: &Env, decls: &Declarations, res: &ResourceTracker) -> rustyline::Result<()> {
    let mut editor = DefaultEditor::new()?;
    let mut pending = String::new();

    loop {
        let prompt = if pending.is_empty() { "wisp> " } else { "....> " };
        match editor.readline(prompt) {
            Ok(line) => {
                if !pending.is_empty() {
                    pending.push('\n');
                }
                pending.push_str(&line);
                let _ = editor.add_history_entry(&line);

                match wisp::parse(&pending, "<repl>") {
                    Ok(ast) => {
                        pending.clear();
                        eval_and_print(&ast, env, decls, res);
                    }
                    Err(err) if err.kind == ErrorKind::ParseError && err.message.contains(CONTINUATION_MARKER) => {
                        // Keep accumulating; the user hasn't closed their parens yet.
                    }
                    Err(err) => {
                        pending.clear();
                        println!("{err}");
                    }
                }
            }
            Err(ReadlineError::Interrupted) => {
                pending.clear();
                continue;
            }
            Err(ReadlineError::Eof) => return Ok(()),
            Err(err) => return Err(err),
        }
    }
}

fn eval_and_print(ast: &wisp::Value, env: &Env, decls: &Declarations, res: &ResourceTracker) {
    let optimized = match wisp::optimize(ast, env, decls) {
        Ok(v) => v,
        Err(err) => {
            println!("{err}");
            return;
        }
    };
    match wisp::eval_with(&optimized, env, res) {
        Ok(value) => println!("{}", wisp::serialize(&value)),
        Err(err) => println!("{err}"),
    }
}
