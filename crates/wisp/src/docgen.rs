//! `Help`/`WriteDocumentation` (spec §6, §4.8; SPEC_FULL §C.3) — renders the
//! Declarations registry as Markdown, one file per chapter, the way
//! `TrevorS-lisp-llm-sandbox`'s `help` module turns its builtin table into a
//! browsable reference instead of a single wall of text.

use std::path::Path;

use serde::Serialize;

use crate::declarations::{Declaration, Declarations};

/// Renders a single declaration's help text (spec §6 `Help(name)`).
pub fn help(decls: &Declarations, name: &str) -> Option<String> {
    decls.get(name).map(render_entry)
}

/// A `Declaration` projected into a JSON-friendly shape (`NativeFn` itself
/// isn't serializable). Used by `render_json` for hosts that want structured
/// docs rather than Markdown — e.g. feeding an external docs site.
#[derive(Serialize)]
struct NativeSummary {
    name: &'static str,
    chapter: &'static str,
    description: &'static str,
    arity: String,
    params: Vec<ParamSummary>,
    return_type: String,
    foldable: bool,
}

#[derive(Serialize)]
struct ParamSummary {
    name: &'static str,
    ty: String,
    description: &'static str,
}

impl From<&Declaration> for NativeSummary {
    fn from(d: &Declaration) -> Self {
        NativeSummary {
            name: d.name,
            chapter: d.chapter,
            description: d.description,
            arity: d.arity.describe(),
            params: d.params.iter().map(|p| ParamSummary { name: p.name, ty: format!("{:?}", p.ty), description: p.description }).collect(),
            return_type: format!("{:?}", d.return_type),
            foldable: d.foldable,
        }
    }
}

/// The whole registry as a JSON array, sorted by name for stable output.
pub fn render_json(decls: &Declarations) -> serde_json::Result<String> {
    let mut entries: Vec<&Declaration> = decls.iter().collect();
    entries.sort_by_key(|d| d.name);
    let summaries: Vec<NativeSummary> = entries.into_iter().map(NativeSummary::from).collect();
    serde_json::to_string_pretty(&summaries)
}

fn render_entry(d: &Declaration) -> String {
    let params = if d.params.is_empty() {
        String::new()
    } else {
        d.params.iter().map(|p| format!("{} :: {:?}", p.name, p.ty)).collect::<Vec<_>>().join(", ")
    };
    format!(
        "### `{}`\n\n{}\n\n- arity: {}\n- params: {}\n- returns: {:?}\n- foldable: {}\n",
        d.name,
        d.description,
        d.arity.describe(),
        if params.is_empty() { "(none)".to_string() } else { params },
        d.return_type,
        d.foldable,
    )
}

/// One Markdown document per chapter, keyed by chapter name (spec §6
/// `WriteDocumentation`). Entries within a chapter are sorted by name so
/// output is stable across runs.
pub fn render_all(decls: &Declarations) -> Vec<(String, String)> {
    let mut out = Vec::new();
    for chapter in decls.chapters() {
        let mut entries: Vec<&Declaration> = decls.iter().filter(|d| d.chapter == chapter).collect();
        entries.sort_by_key(|d| d.name);
        let mut body = format!("# {chapter}\n\n");
        for d in entries {
            body.push_str(&render_entry(d));
            body.push('\n');
        }
        out.push((chapter.to_string(), body));
    }
    out
}

/// Writes `render_all`'s output as `<dir>/<chapter>.md` files (spec §6
/// `WriteDocumentation(dir)`).
pub fn write_documentation(decls: &Declarations, dir: &Path) -> std::io::Result<()> {
    std::fs::create_dir_all(dir)?;
    for (chapter, body) in render_all(decls) {
        std::fs::write(dir.join(format!("{chapter}.md")), body)?;
    }
    Ok(())
}
