//! Renders the textual help message baked into the generated CLI.

use std::iter::repeat;

use crate::metadata::{CommandMetadata, DefaultValue, OptionSpec};

const HELP_ROW: &str = "-h, --help";
const HELP_TEXT: &str = "show this help message and exit";

/// Renders the full help message. The generated `main` prints this verbatim
/// from `flag.Usage`.
pub fn help_message(meta: &CommandMetadata) -> String {
    let mut res = String::new();

    // Name and description, continuation lines aligned under the text
    // following ` - `.
    let mut desc_lines = meta.description.lines();
    match desc_lines.next() {
        Some(first) if !first.is_empty() => {
            res.push_str(&meta.name);
            res.push_str(" - ");
            res.push_str(first);
            res.push('\n');

            let indent = meta.name.len() + 3;
            for line in desc_lines {
                res.extend(repeat(' ').take(indent));
                res.push_str(line);
                res.push('\n');
            }
        }
        _ => {
            res.push_str(&meta.name);
            res.push('\n');
        }
    }

    res.push('\n');
    res.push_str("Usage: ");
    res.push_str(&meta.name);
    res.push_str(" [flags]\n\n");

    let flag_width = meta
        .options
        .iter()
        .map(|opt| flag_cell(opt).len())
        .chain(Some(HELP_ROW.len()))
        .max()
        .unwrap_or(HELP_ROW.len());
    let type_width = meta
        .options
        .iter()
        .map(|opt| type_indicator(opt).len())
        .max()
        .unwrap_or(0);

    for opt in &meta.options {
        push_row(
            &mut res,
            flag_width,
            type_width,
            &flag_cell(opt),
            &type_indicator(opt),
            &help_with_annotations(opt),
        );
    }

    push_row(&mut res, flag_width, type_width, HELP_ROW, "", HELP_TEXT);

    res
}

/// One aligned row; help continuation lines indent past the type column.
fn push_row(res: &mut String, flag_width: usize, type_width: usize, flag: &str, ty: &str, help: &str) {
    let mut lines = help.lines();

    let mut line = String::from("  ");
    line.push_str(flag);
    line.extend(repeat(' ').take(flag_width - flag.len() + 2));
    line.push_str(ty);
    if let Some(first) = lines.next() {
        line.extend(repeat(' ').take(type_width - ty.len() + 2));
        line.push_str(first);
    }
    res.push_str(line.trim_end());
    res.push('\n');

    let indent = 2 + flag_width + 2 + type_width + 2;
    for cont in lines {
        let mut line = String::new();
        line.extend(repeat(' ').take(indent));
        line.push_str(cont);
        res.push_str(line.trim_end());
        res.push('\n');
    }
}

/// The flag column: `--<cli-name>`, or `--no-<cli-name>` for a required
/// boolean defaulting to true.
fn flag_cell(opt: &OptionSpec) -> String {
    if is_negated_bool(opt) {
        format!("--no-{}", opt.cli_name)
    } else {
        format!("--{}", opt.cli_name)
    }
}

fn is_negated_bool(opt: &OptionSpec) -> bool {
    opt.base_type == "bool" && opt.is_required && opt.default == Some(DefaultValue::Bool(true))
}

/// The type column: base type lowercased, pluralized for slices.
fn type_indicator(opt: &OptionSpec) -> String {
    if let Some(elem) = opt.base_type.strip_prefix("[]") {
        return format!("{}s", last_segment(elem).to_lowercase());
    }
    last_segment(&opt.base_type).to_lowercase()
}

fn last_segment(name: &str) -> &str {
    name.rsplit('.').next().unwrap_or(name)
}

/// Help text plus the trailing annotations, in their fixed order.
fn help_with_annotations(opt: &OptionSpec) -> String {
    let mut text = opt.help_text.trim_end().to_owned();

    for annotation in annotations(opt) {
        if text.is_empty() {
            text = annotation;
        } else {
            text.push(' ');
            text.push_str(&annotation);
        }
    }

    text
}

/// Annotation order: required, default, env, allowed, file constraints.
pub fn annotations(opt: &OptionSpec) -> Vec<String> {
    let mut out = Vec::new();

    if opt.is_required {
        out.push("(required)".to_owned());
    }

    if let Some(default) = &opt.default {
        let suppressed = is_negated_bool(opt)
            || matches!(default, DefaultValue::Nil)
            || default == &DefaultValue::Bool(false);
        if !suppressed {
            out.push(format!("(default: {})", default.string_form()));
        }
    }

    if !opt.env_var.is_empty() {
        out.push(format!("(env: {})", opt.env_var));
    }

    if let Some(values) = &opt.enum_values {
        out.push(format!("(allowed: {})", values.join(", ")));
    }

    if opt.file_must_exist || opt.file_glob_pattern {
        let mut parts = vec!["file"];
        if opt.file_must_exist {
            parts.push("must exist");
        }
        if opt.file_glob_pattern {
            parts.push("glob pattern");
        }
        out.push(format!("({})", parts.join(", ")));
    }

    out
}
