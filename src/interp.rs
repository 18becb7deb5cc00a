//! Symbolic evaluation of the options-initializer function.
//!
//! This is deliberately not a Go evaluator. The recognizers form a closed
//! grammar: composite-literal returns, basic literals, the marker calls
//! `Default`/`Enum`/`File`, identifiers bound to string constants, slice
//! literals of the above, and string type conversions. Anything else leaves
//! the affected field untouched and records an open-question note; siblings
//! keep interpreting.

use crate::analyzer::Analysis;
use crate::ast::{self, CompositeElem, Expr, ImportKind, TypeExpr};
use crate::loader::Package;
use crate::metadata::{DefaultValue, OptionSpec};

/// Attaches default values, enum constraints and file constraints onto the
/// option descriptors. A missing or empty initializer name makes this a
/// no-op.
pub fn interpret(pkg: &Package, analysis: &mut Analysis) {
    let Some(init_name) = analysis.metadata.run_func.initializer_name.clone() else {
        return;
    };

    let target = pkg.target_file();
    let Some(func) = target.find_func(&init_name) else {
        return;
    };

    let Some(ret) = &func.ret_expr else {
        analysis.metadata.notes.push(format!(
            "initializer `{}` has no recognizable composite-literal return",
            init_name
        ));
        return;
    };

    let composite = match ret {
        Expr::Unary { op: '&', x } => x.as_ref(),
        other => other,
    };

    let Expr::Composite { typ, elems } = composite else {
        analysis.metadata.notes.push(format!(
            "initializer `{}` does not return an options composite literal",
            init_name
        ));
        return;
    };

    if let (Some(t), Some(want)) = (typ.as_ref(), analysis.options_struct_name.as_deref()) {
        if t.simple_name() != Some(want) {
            analysis.metadata.notes.push(format!(
                "initializer `{}` builds `{}`, not `{}`",
                init_name,
                t.text(),
                want
            ));
        }
    }

    let markers = MarkerScope::resolve(target);

    for elem in elems {
        let Some(key) = &elem.key else {
            analysis
                .metadata
                .notes
                .push("initializer uses positional composite-literal fields; they are ignored".into());
            continue;
        };

        let Some(opt) = analysis.metadata.option_mut(key) else {
            analysis
                .metadata
                .notes
                .push(format!("initializer sets unknown field `{}`", key));
            continue;
        };

        apply_field_expr(pkg, &markers, opt, &elem.value);
    }

    // Enum lists are supposed to contain the default; a mismatch is detected
    // but not enforced.
    for opt in &mut analysis.metadata.options {
        if let (Some(values), Some(default)) = (&opt.enum_values, &opt.default) {
            if opt.has_value_default() && !values.iter().any(|v| v == &default.string_form()) {
                opt.notes.push(format!(
                    "default `{}` is not among the allowed values",
                    default.string_form()
                ));
            }
        }
    }
}

/// How the marker package is reachable from the target file.
struct MarkerScope {
    alias: Option<String>,
    dot: bool,
}

impl MarkerScope {
    fn resolve(file: &ast::File) -> MarkerScope {
        match file.marker_import() {
            Some(spec) => match &spec.kind {
                ImportKind::Dot => MarkerScope {
                    alias: None,
                    dot: true,
                },
                _ => MarkerScope {
                    alias: spec.qualifier().map(str::to_owned),
                    dot: false,
                },
            },
            None => MarkerScope {
                alias: None,
                dot: false,
            },
        }
    }

    /// The marker's name when the expression is a reference into the marker
    /// package (`goat.Default`, or `Default` under a dot-import).
    fn marker_of<'e>(&self, expr: &'e Expr) -> Option<&'e str> {
        match expr {
            Expr::Selector(x, sel) => match x.as_ref() {
                Expr::Ident(qualifier) if Some(qualifier) == self.alias.as_ref() => Some(sel),
                _ => None,
            },
            Expr::Ident(name) if self.dot => Some(name),
            _ => None,
        }
    }
}

fn apply_field_expr(pkg: &Package, markers: &MarkerScope, opt: &mut OptionSpec, expr: &Expr) {
    if let Expr::Call { fun, args } = expr {
        if let Some(marker) = markers.marker_of(fun) {
            match marker {
                "Default" => {
                    apply_default_marker(pkg, markers, opt, args);
                    return;
                }
                "Enum" => {
                    apply_enum_marker(pkg, markers, opt, args);
                    return;
                }
                "File" => {
                    apply_file_marker(pkg, markers, opt, args);
                    return;
                }
                other => {
                    opt.note(format!("unrecognized marker `{}`", other));
                    return;
                }
            }
        }
    }

    match eval_value(pkg, expr) {
        Some(value) => opt.default = Some(value),
        None => opt.note(format!(
            "initializer expression for `{}` is outside the recognized grammar",
            opt.field_name
        )),
    }
}

fn apply_default_marker(pkg: &Package, markers: &MarkerScope, opt: &mut OptionSpec, args: &[Expr]) {
    let Some(first) = args.first() else {
        opt.note("`Default` called without a value");
        return;
    };

    match eval_value(pkg, first) {
        Some(value) => opt.default = Some(value),
        None => opt.note(format!(
            "`Default` value for `{}` is outside the recognized grammar",
            opt.field_name
        )),
    }

    if let Some(second) = args.get(1) {
        match second {
            Expr::Call { fun, args } if markers.marker_of(fun) == Some("Enum") => {
                apply_enum_marker(pkg, markers, opt, args);
            }
            Expr::Composite { .. } => {
                if let Some(values) = eval_enum_list(pkg, second, opt) {
                    opt.enum_values = Some(values);
                }
            }
            _ => opt.note("second `Default` argument is not an enum constraint"),
        }
    }
}

fn apply_enum_marker(pkg: &Package, _markers: &MarkerScope, opt: &mut OptionSpec, args: &[Expr]) {
    // Pointer-typed options use `Enum(nil, choices)`; value-typed use
    // `Enum(choices)`.
    let choices = match args {
        [Expr::Ident(nil), choices] if nil == "nil" => choices,
        [choices] => choices,
        _ => {
            opt.note("`Enum` expects the choices as its final argument");
            return;
        }
    };

    if let Some(values) = eval_enum_list(pkg, choices, opt) {
        opt.enum_values = Some(values);
    }
}

fn apply_file_marker(pkg: &Package, markers: &MarkerScope, opt: &mut OptionSpec, args: &[Expr]) {
    let Some(first) = args.first() else {
        opt.note("`File` called without a path");
        return;
    };

    match eval_value(pkg, first) {
        Some(value @ DefaultValue::Str(_)) => opt.default = Some(value),
        Some(other) => {
            opt.note(format!("`File` path evaluates to non-string `{}`", other));
        }
        None => opt.note("`File` path is outside the recognized grammar"),
    }

    for arg in &args[1..] {
        let name = match arg {
            Expr::Call { fun, .. } => markers.marker_of(fun),
            other => markers.marker_of(other),
        };
        match name {
            Some("MustExist") => opt.file_must_exist = true,
            Some("GlobPattern") => opt.file_glob_pattern = true,
            _ => opt.note("unrecognized `File` option"),
        }
    }
}

/// Evaluates one restricted expression to a default value.
fn eval_value(pkg: &Package, expr: &Expr) -> Option<DefaultValue> {
    match expr {
        Expr::Str(s) => Some(DefaultValue::Str(s.clone())),
        Expr::Int(n) => Some(DefaultValue::Int(*n)),
        Expr::Ident(name) => match name.as_str() {
            "true" => Some(DefaultValue::Bool(true)),
            "false" => Some(DefaultValue::Bool(false)),
            "nil" => Some(DefaultValue::Nil),
            _ => lookup_string_const(pkg, name),
        },
        // A type conversion such as `Mode("auto")` reduces to its operand.
        Expr::Call { fun, args } if args.len() == 1 && is_type_like(fun) => {
            eval_value(pkg, &args[0])
        }
        _ => None,
    }
}

fn is_type_like(fun: &Expr) -> bool {
    match fun {
        Expr::Ident(_) => true,
        Expr::Selector(x, _) => matches!(x.as_ref(), Expr::Ident(_)),
        _ => false,
    }
}

/// Resolves an identifier bound to a string constant in the package.
fn lookup_string_const(pkg: &Package, name: &str) -> Option<DefaultValue> {
    for file in &pkg.files {
        if let Some(spec) = file.find_const(name) {
            if let Some(Expr::Str(s)) = &spec.value {
                return Some(DefaultValue::Str(s.clone()));
            }
            return None;
        }
    }
    None
}

/// Materializes a slice literal as the enum's string-form values.
fn eval_enum_list(pkg: &Package, expr: &Expr, opt: &mut OptionSpec) -> Option<Vec<String>> {
    let Expr::Composite { typ, elems } = expr else {
        opt.note("enum choices are not a slice literal");
        return None;
    };

    if let Some(t) = typ {
        if !matches!(t, TypeExpr::Slice(_)) {
            opt.note(format!("enum choices have non-slice type `{}`", t.text()));
            return None;
        }
    }

    let mut values = Vec::new();
    for CompositeElem { value, .. } in elems {
        match eval_value(pkg, value) {
            Some(v) => values.push(v.string_form()),
            None => opt.note("enum choice outside the recognized grammar; skipped"),
        }
    }

    Some(values)
}
