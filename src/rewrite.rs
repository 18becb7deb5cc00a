//! Replaces the target file's `main` function and organizes imports.
//!
//! Replacement is line-granular: every line outside the original `main`'s
//! span (including its doc comment) passes through untouched, except as a
//! consequence of import organization. The rewritten file must re-parse
//! before anything is written, and the write itself is atomic.

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use crate::ast::{base_name, ImportKind};
use crate::error::Error;
use crate::generate::GENERATED_IMPORTS;
use crate::parser::parse_file;
use crate::source::SourceFile;
use crate::token::{lex, Tok};

/// Splices the generated `main` over the original's line span, or appends it
/// after a blank separator when the file has no `main`.
pub fn splice_main(original: &str, main_span: Option<(u32, u32)>, generated: &str) -> String {
    let mut generated = generated.to_owned();
    if !generated.ends_with('\n') {
        generated.push('\n');
    }

    match main_span {
        None => {
            let mut out = original.trim_end_matches('\n').to_owned();
            out.push_str("\n\n");
            out.push_str(&generated);
            out
        }
        Some((start, end)) => {
            let lines: Vec<&str> = original.lines().collect();
            let start = start as usize;
            let end = (end as usize).min(lines.len());

            let mut out = String::new();
            for line in &lines[..start.saturating_sub(1)] {
                out.push_str(line);
                out.push('\n');
            }
            out.push_str(&generated);
            for line in &lines[end..] {
                out.push_str(line);
                out.push('\n');
            }
            out
        }
    }
}

/// Organizes the file's imports: drops imports no longer referenced, adds
/// the generated set's imports that are referenced but missing, and re-emits
/// the block in gofmt's shape. Returns `generation` errors when the text
/// does not parse.
pub fn organize_imports(text: &str, file_name: &str) -> Result<String, Error> {
    let source = SourceFile::new(file_name, text);
    let file = parse_file(0, &source).map_err(|e| Error::generation(e.to_string()))?;

    let used = used_qualifiers(text)?;

    // Which imports survive.
    let mut kept: Vec<(Option<String>, String)> = Vec::new();
    for spec in &file.imports {
        match &spec.kind {
            ImportKind::Dot => kept.push((Some(".".to_owned()), spec.path.clone())),
            ImportKind::Blank => kept.push((Some("_".to_owned()), spec.path.clone())),
            ImportKind::Alias(alias) => {
                if used.contains(alias.as_str()) {
                    kept.push((Some(alias.clone()), spec.path.clone()));
                }
            }
            ImportKind::Normal => {
                if used.contains(base_name(&spec.path)) {
                    kept.push((None, spec.path.clone()));
                }
            }
        }
    }

    // Additions from the generated set.
    for path in GENERATED_IMPORTS {
        let qualifier = base_name(path);
        let present = kept.iter().any(|(alias, p)| {
            alias.as_deref() == Some(qualifier) || base_name(p) == qualifier
        });
        if used.contains(qualifier) && !present {
            kept.push((None, path.to_string()));
        }
    }

    let rebuilt = rebuild_with_imports(text, &file.import_spans, &kept);

    // The organized result must still parse.
    let check = SourceFile::new(file_name, rebuilt.clone());
    parse_file(0, &check).map_err(|e| Error::generation(e.to_string()))?;

    Ok(rebuilt)
}

/// Identifiers used as package qualifiers (`name.` outside a selector tail).
fn used_qualifiers(text: &str) -> Result<BTreeSet<String>, Error> {
    let tokens = lex(text).map_err(|p| Error::generation(p.message))?;

    let mut used = BTreeSet::new();
    for i in 0..tokens.len().saturating_sub(1) {
        let Tok::Ident(name) = &tokens[i].kind else {
            continue;
        };
        if !matches!(tokens[i + 1].kind, Tok::Dot) {
            continue;
        }
        if i > 0 && matches!(tokens[i - 1].kind, Tok::Dot) {
            continue;
        }
        used.insert(name.clone());
    }
    Ok(used)
}

/// Splices a canonical import block over the old import declarations.
fn rebuild_with_imports(
    text: &str,
    old_spans: &[(u32, u32)],
    imports: &[(Option<String>, String)],
) -> String {
    let block = render_import_block(imports);
    let lines: Vec<&str> = text.lines().collect();

    let in_old_span = |line_no: u32| {
        old_spans
            .iter()
            .any(|&(start, end)| line_no >= start && line_no <= end)
    };

    let insert_at = old_spans.first().map(|&(start, _)| start);

    let mut out = String::new();
    let mut inserted = false;
    let mut swallow_blank = false;
    for (idx, line) in lines.iter().enumerate() {
        let line_no = idx as u32 + 1;

        if Some(line_no) == insert_at {
            out.push_str(&block);
            inserted = true;
        }
        if in_old_span(line_no) {
            // When every import is dropped, the separator blank line after
            // the old block goes with it.
            swallow_blank = block.is_empty();
            continue;
        }
        if swallow_blank {
            swallow_blank = false;
            if line.is_empty() {
                continue;
            }
        }

        // No prior imports: the block goes right after the package clause.
        if !inserted && insert_at.is_none() && line.starts_with("package ") && !block.is_empty() {
            out.push_str(line);
            out.push('\n');
            out.push('\n');
            out.push_str(&block);
            inserted = true;
            continue;
        }

        out.push_str(line);
        out.push('\n');
    }

    out
}

fn render_import_block(imports: &[(Option<String>, String)]) -> String {
    if imports.is_empty() {
        return String::new();
    }

    let mut std_group: Vec<(Option<String>, String)> = Vec::new();
    let mut other_group: Vec<(Option<String>, String)> = Vec::new();
    for entry in imports {
        let first_segment = entry.1.split('/').next().unwrap_or("");
        if first_segment.contains('.') {
            other_group.push(entry.clone());
        } else {
            std_group.push(entry.clone());
        }
    }
    std_group.sort_by(|a, b| a.1.cmp(&b.1));
    std_group.dedup();
    other_group.sort_by(|a, b| a.1.cmp(&b.1));
    other_group.dedup();

    let mut out = String::from("import (\n");
    for (i, group) in [std_group, other_group].iter().enumerate() {
        if group.is_empty() {
            continue;
        }
        if i == 1 && out != "import (\n" {
            out.push('\n');
        }
        for (alias, path) in group {
            out.push('\t');
            if let Some(alias) = alias {
                out.push_str(alias);
                out.push(' ');
            }
            out.push('"');
            out.push_str(path);
            out.push('"');
            out.push('\n');
        }
    }
    out.push_str(")\n");
    out
}

/// Splices, organizes, validates and atomically writes the rewritten file.
pub fn rewrite_file(
    path: &Path,
    original: &str,
    main_span: Option<(u32, u32)>,
    generated_main: &str,
) -> Result<(), Error> {
    let spliced = splice_main(original, main_span, generated_main);
    let organized = organize_imports(&spliced, &path.to_string_lossy())?;
    write_atomic(path, &organized)
}

fn write_atomic(path: &Path, text: &str) -> Result<(), Error> {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".goat-tmp");
    let tmp = Path::new(&tmp).to_owned();

    fs::write(&tmp, text).map_err(|e| Error::write(path, e))?;
    fs::rename(&tmp, path).map_err(|e| Error::write(path, e))
}
