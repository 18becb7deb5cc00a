//! Extracts `CommandMetadata` from a loaded package.

use std::path::Path;

use crate::ast::{self, Field, TypeDeclKind, TypeExpr};
use crate::error::Error;
use crate::loader::Package;
use crate::metadata::{
    CommandMetadata, ContextArg, MainPosition, OptionSpec, OptionsArg, RunFunc,
};

/// The analyzer's output: the metadata plus the raw options-struct name the
/// initializer interpreter needs to locate the composite literal.
#[derive(Debug)]
pub struct Analysis {
    pub metadata: CommandMetadata,
    pub options_struct_name: Option<String>,
}

/// Extracts the command metadata from a loaded package.
///
/// Structural failures (missing run function, unresolvable options struct,
/// duplicate CLI names) are errors; per-field anomalies degrade to notes.
pub fn analyze(
    pkg: &Package,
    run_name: &str,
    initializer_name: Option<&str>,
) -> Result<Analysis, Error> {
    let target = pkg.target_file();
    let source = pkg.target_source();

    let run = target
        .find_func(run_name)
        .ok_or_else(|| Error::run_function_not_found(run_name))?;

    let mut notes = Vec::new();

    let returns_error = run.results.len() == 1 && run.results[0] == TypeExpr::Name("error".into());
    if !returns_error {
        let note = format!(
            "run function `{}` does not return exactly `error`; the generated main will not check its result",
            run_name
        );
        tracing::warn!("{}", note);
        notes.push(note);
    }

    let mut context_arg = None;
    let mut options_arg = None;
    for param in &run.params {
        if context_arg.is_none() && is_context_type(&param.typ, target) {
            context_arg = Some(ContextArg {
                name: param.name.clone().unwrap_or_else(|| "ctx".to_owned()),
                written_type: param.typ.text(),
            });
        } else if options_arg.is_none() {
            let (base, is_pointer) = param.typ.strip_pointer();
            options_arg = Some(OptionsArg {
                name: param.name.clone().unwrap_or_else(|| "options".to_owned()),
                written_type: param.typ.text(),
                base_type: base.text(),
                is_pointer,
            });
        }
    }

    let initializer_name = initializer_name.filter(|s| !s.is_empty());
    let mut initializer_returns_pointer = false;
    if let Some(init) = initializer_name {
        match target.find_func(init) {
            Some(f) => {
                initializer_returns_pointer =
                    matches!(f.results.first(), Some(TypeExpr::Pointer(_)));
            }
            None => {
                let note = format!("initializer `{}` not found in target file", init);
                tracing::warn!("{}", note);
                notes.push(note);
            }
        }
    }

    let run_func = RunFunc {
        name: run_name.to_owned(),
        package_name: target.package_name.clone(),
        context_arg,
        options_arg: options_arg.clone(),
        initializer_name: initializer_name.map(str::to_owned),
        initializer_returns_pointer,
        returns_error,
    };

    let mut options = Vec::new();
    let mut options_struct_name = None;

    if let Some(arg) = &options_arg {
        let struct_name = match type_lookup_name(&arg.base_type) {
            Some(name) => name,
            None => return Err(Error::options_type_not_found(&arg.base_type)),
        };

        let fields = collect_fields(pkg, &struct_name)
            .ok_or_else(|| Error::options_type_not_found(&struct_name))?;

        let mut cli_names: Vec<String> = Vec::new();
        for field in &fields {
            for name in &field.names {
                if !is_exported(name) {
                    continue;
                }

                let opt = build_option(pkg, name, field)?;
                if cli_names.iter().any(|n| n == &opt.cli_name) {
                    return Err(Error::duplicate_cli_name(&opt.cli_name, name));
                }
                cli_names.push(opt.cli_name.clone());
                options.push(opt);
            }
        }

        options_struct_name = Some(struct_name);
    }

    let main_func_position = target.find_func("main").map(|f| MainPosition {
        filename: source.name().to_owned(),
        offset: f.offset,
        line: f.func_line,
        column: source.column_of(f.offset),
    });

    let metadata = CommandMetadata {
        name: command_name(source.name()),
        description: run.doc.clone().unwrap_or_default(),
        run_func,
        options,
        main_func_position,
        notes,
    };

    Ok(Analysis {
        metadata,
        options_struct_name,
    })
}

/// Derives the command display name from the target path: the file stem, or
/// the directory name when the stem is `main`.
fn command_name(path: &str) -> String {
    let p = Path::new(path);
    let stem = p
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "main".to_owned());

    if stem == "main" {
        if let Some(dir) = p.parent().and_then(|d| d.file_name()) {
            let dir = dir.to_string_lossy();
            if !dir.is_empty() && dir != "." {
                return dir.into_owned();
            }
        }
    }
    stem
}

/// Whether the type is `context.Context` under any import alias.
fn is_context_type(typ: &TypeExpr, file: &ast::File) -> bool {
    let TypeExpr::Selector(qualifier, name) = typ else {
        return false;
    };
    if name != "Context" {
        return false;
    }

    let bound = file
        .imports
        .iter()
        .any(|im| im.path == "context" && im.qualifier() == Some(qualifier.as_str()));
    bound || qualifier == "context"
}

/// The name to look up for the options struct; a qualified type resolves by
/// its last segment (the package's own files share one namespace).
fn type_lookup_name(base_type: &str) -> Option<String> {
    let name = base_type.rsplit('.').next()?;
    if name.is_empty() || !name.chars().next().map_or(false, |c| c.is_alphabetic() || c == '_') {
        return None;
    }
    Some(name.to_owned())
}

fn is_exported(name: &str) -> bool {
    name.chars().next().map_or(false, |c| c.is_uppercase())
}

/// Collects the struct's fields in source order, following embedded fields
/// transitively. Outer declarations shadow embedded fields of the same name.
fn collect_fields(pkg: &Package, struct_name: &str) -> Option<Vec<Field>> {
    let mut visited = Vec::new();
    collect_fields_into(pkg, struct_name, &mut visited)
}

fn collect_fields_into(
    pkg: &Package,
    struct_name: &str,
    visited: &mut Vec<String>,
) -> Option<Vec<Field>> {
    if visited.iter().any(|n| n == struct_name) {
        return Some(Vec::new());
    }
    visited.push(struct_name.to_owned());

    let decl = pkg
        .files
        .iter()
        .find_map(|f| f.find_type(struct_name))?;
    let TypeDeclKind::Struct(fields) = &decl.kind else {
        return None;
    };

    let mut collected: Vec<(usize, Field)> = Vec::new();
    for field in fields {
        if field.names.is_empty() {
            // Embedded field: splice in the embedded struct's fields at depth
            // + 1 so outer declarations win on name clashes.
            let (base, _) = field.typ.strip_pointer();
            let Some(name) = base.simple_name() else {
                continue;
            };
            let Some(inner) = collect_fields_into(pkg, name, visited) else {
                continue;
            };
            for f in inner {
                merge_field(&mut collected, 1, f);
            }
        } else {
            merge_field(&mut collected, 0, field.clone());
        }
    }

    Some(collected.into_iter().map(|(_, f)| f).collect())
}

fn merge_field(collected: &mut Vec<(usize, Field)>, depth: usize, field: Field) {
    for name in &field.names {
        if let Some(slot) = collected
            .iter_mut()
            .find(|(_, f)| f.names.iter().any(|n| n == name))
        {
            if depth < slot.0 {
                *slot = (depth, field.clone());
            }
            return;
        }
    }
    collected.push((depth, field));
}

fn build_option(pkg: &Package, name: &str, field: &Field) -> Result<OptionSpec, Error> {
    let (base_expr, is_pointer) = field.typ.strip_pointer();

    let mut opt = OptionSpec {
        field_name: name.to_owned(),
        written_type: field.typ.text(),
        base_type: base_expr.text(),
        is_pointer,
        help_text: field.doc.clone().unwrap_or_default(),
        ..OptionSpec::default()
    };

    let tags = parse_struct_tag(field.tag.as_deref().unwrap_or(""));
    let mut cli_override = None;
    for (key, value) in &tags {
        match key.as_str() {
            "env" => opt.env_var = value.clone(),
            "goat" => {
                for token in value.split(',') {
                    let token = token.trim();
                    if token == "required" {
                        opt.is_required = true;
                    } else if let Some(name) = token.strip_prefix("name=") {
                        cli_override = Some(name.to_owned());
                    }
                }
            }
            _ => {}
        }
    }
    opt.cli_name = cli_override.unwrap_or_else(|| kebab_case(name));

    match base_expr {
        TypeExpr::Name(type_name) => {
            let (unmarshal, marshal) = scan_marshaling(pkg, type_name);
            opt.is_text_unmarshaler = unmarshal;
            opt.is_text_marshaler = marshal;
            opt.underlying_kind = underlying_kind(pkg, base_expr, 8);
        }
        TypeExpr::Selector(..) => {
            opt.note(format!(
                "type `{}` is declared in another package; text-marshaling capability is unknown",
                opt.base_type
            ));
        }
        _ => {
            opt.underlying_kind = underlying_kind(pkg, base_expr, 8);
        }
    }

    Ok(opt)
}

/// Scans the package's method declarations for `UnmarshalText`/`MarshalText`
/// on the named type (value or pointer receiver).
fn scan_marshaling(pkg: &Package, type_name: &str) -> (bool, bool) {
    let mut unmarshal = false;
    let mut marshal = false;

    for file in &pkg.files {
        for func in &file.funcs {
            let Some(recv) = &func.recv else { continue };
            let (recv_base, _) = recv.typ.strip_pointer();
            if recv_base.simple_name() != Some(type_name) {
                continue;
            }

            match func.name.as_str() {
                "UnmarshalText" => {
                    let ok = func.params.len() == 1
                        && func.params[0].typ.is_slice_of("byte")
                        && func.results.len() == 1
                        && func.results[0] == TypeExpr::Name("error".into());
                    if ok {
                        unmarshal = true;
                    }
                }
                "MarshalText" => {
                    let ok = func.params.is_empty()
                        && func.results.len() == 2
                        && func.results[0].is_slice_of("byte")
                        && func.results[1] == TypeExpr::Name("error".into());
                    if ok {
                        marshal = true;
                    }
                }
                _ => {}
            }
        }
    }

    (unmarshal, marshal)
}

/// Resolves the built-in kind underlying a type, chasing same-package named
/// declarations. Cross-package types resolve to `""`.
fn underlying_kind(pkg: &Package, typ: &TypeExpr, fuel: usize) -> String {
    if fuel == 0 {
        return String::new();
    }

    match typ {
        TypeExpr::Name(name) => match name.as_str() {
            "string" => "string".to_owned(),
            "int" => "int".to_owned(),
            "bool" => "bool".to_owned(),
            _ => {
                for file in &pkg.files {
                    if let Some(decl) = file.find_type(name) {
                        if let TypeDeclKind::Named(inner) = &decl.kind {
                            return underlying_kind(pkg, inner, fuel - 1);
                        }
                        return String::new();
                    }
                }
                String::new()
            }
        },
        _ => String::new(),
    }
}

/// Converts a Go field name to its kebab-case CLI name.
///
/// Word boundaries fall before an uppercase letter that follows a lowercase
/// letter or digit, before the last uppercase letter of an acronym run that
/// is followed by lowercase, and before a digit that follows an uppercase
/// letter. The conversion is idempotent on already-kebab input.
pub fn kebab_case(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut words: Vec<String> = Vec::new();
    let mut cur = String::new();

    for (i, &c) in chars.iter().enumerate() {
        if c == '_' || c == '-' {
            if !cur.is_empty() {
                words.push(std::mem::take(&mut cur));
            }
            continue;
        }

        let prev = if i > 0 { Some(chars[i - 1]) } else { None };
        let next = chars.get(i + 1).copied();

        let boundary = match prev {
            None | Some('_') | Some('-') => false,
            Some(p) => {
                if c.is_uppercase() {
                    p.is_lowercase()
                        || p.is_ascii_digit()
                        || (p.is_uppercase() && next.map_or(false, |n| n.is_lowercase()))
                } else if c.is_ascii_digit() {
                    p.is_uppercase()
                } else {
                    false
                }
            }
        };

        if boundary && !cur.is_empty() {
            words.push(std::mem::take(&mut cur));
        }
        cur.extend(c.to_lowercase());
    }

    if !cur.is_empty() {
        words.push(cur);
    }

    words.join("-")
}

/// Parses a Go struct tag into its `key:"value"` pairs.
pub fn parse_struct_tag(tag: &str) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    let chars: Vec<char> = tag.chars().collect();
    let mut i = 0;

    while i < chars.len() {
        while i < chars.len() && chars[i] == ' ' {
            i += 1;
        }

        let key_start = i;
        while i < chars.len() && chars[i] != ':' && chars[i] != ' ' {
            i += 1;
        }
        if i >= chars.len() || chars[i] != ':' {
            break;
        }
        let key: String = chars[key_start..i].iter().collect();
        i += 1;

        if i >= chars.len() || chars[i] != '"' {
            break;
        }
        i += 1;

        let mut value = String::new();
        while i < chars.len() && chars[i] != '"' {
            if chars[i] == '\\' && i + 1 < chars.len() {
                i += 1;
            }
            value.push(chars[i]);
            i += 1;
        }
        if i >= chars.len() {
            break;
        }
        i += 1;

        if !key.is_empty() {
            pairs.push((key, value));
        }
    }

    pairs
}

#[cfg(test)]
mod test {
    use super::{analyze, kebab_case, parse_struct_tag};
    use crate::loader::load_sources;
    use crate::metadata::DefaultValue;
    use assert_matches::assert_matches;

    #[test]
    fn test_kebab_case() {
        assert_eq!(kebab_case("Name"), "name");
        assert_eq!(kebab_case("ConfigFile"), "config-file");
        assert_eq!(kebab_case("APIKey"), "api-key");
        assert_eq!(kebab_case("UserID2"), "user-id-2");
        assert_eq!(kebab_case("IPv4Addr"), "i-pv4-addr");
        assert_eq!(kebab_case("HTTPServer"), "http-server");
        assert_eq!(kebab_case("EnableSync"), "enable-sync");
        assert_eq!(kebab_case("snake_case"), "snake-case");
    }

    #[test]
    fn test_kebab_case_idempotent() {
        for name in ["name", "config-file", "api-key", "user-id-2", "i-pv4-addr"] {
            assert_eq!(kebab_case(name), name);
        }
    }

    #[test]
    fn test_parse_struct_tag() {
        let pairs = parse_struct_tag("env:\"PORT\" goat:\"required\" json:\"port,omitempty\"");

        assert_eq!(
            pairs,
            vec![
                ("env".to_owned(), "PORT".to_owned()),
                ("goat".to_owned(), "required".to_owned()),
                ("json".to_owned(), "port,omitempty".to_owned()),
            ]
        );
    }

    const BASIC: &str = "package main\n\nimport \"context\"\n\ntype Options struct {\n\t// Name is who to greet.\n\tName string\n\t// Port is the listen port.\n\tPort int `env:\"PORT\"`\n\tConfigFile string `goat:\"required\"`\n\ttoken string\n}\n\n// run greets and serves.\n// It never returns normally.\nfunc run(ctx context.Context, options *Options) error {\n\treturn nil\n}\n\nfunc main() {\n}\n";

    #[test]
    fn test_analyze_basic() {
        let pkg = load_sources(&[("demo/greet.go".to_owned(), BASIC.to_owned())]).unwrap();
        let analysis = analyze(&pkg, "run", None).unwrap();
        let meta = &analysis.metadata;

        assert_eq!(meta.name, "greet");
        assert_eq!(
            meta.description,
            "run greets and serves.\nIt never returns normally."
        );
        assert_eq!(analysis.options_struct_name.as_deref(), Some("Options"));

        let run = &meta.run_func;
        assert!(run.returns_error);
        assert_eq!(run.package_name, "main");
        assert_eq!(run.context_arg.as_ref().unwrap().name, "ctx");
        let arg = run.options_arg.as_ref().unwrap();
        assert_eq!(arg.written_type, "*Options");
        assert_eq!(arg.base_type, "Options");
        assert!(arg.is_pointer);

        // The unexported `token` field is skipped.
        assert_eq!(meta.options.len(), 3);
        assert_eq!(meta.options[0].cli_name, "name");
        assert_eq!(meta.options[0].help_text, "Name is who to greet.");
        assert_eq!(meta.options[0].underlying_kind, "string");
        assert_eq!(meta.options[1].cli_name, "port");
        assert_eq!(meta.options[1].env_var, "PORT");
        assert_eq!(meta.options[1].underlying_kind, "int");
        assert_eq!(meta.options[2].cli_name, "config-file");
        assert!(meta.options[2].is_required);
        assert_eq!(meta.options[2].default, None::<DefaultValue>);

        let pos = meta.main_func_position.as_ref().unwrap();
        assert_eq!(pos.filename, "demo/greet.go");
        assert_eq!(pos.column, 1);
    }

    #[test]
    fn test_run_function_not_found() {
        let pkg = load_sources(&[("demo/greet.go".to_owned(), BASIC.to_owned())]).unwrap();
        let err = analyze(&pkg, "missing", None).unwrap_err();

        assert!(err.to_string().contains("run function `missing`"));
    }

    #[test]
    fn test_options_type_in_sibling_file() {
        let target = "package main\n\nfunc run(options Options) error {\n\treturn nil\n}\n";
        let sibling =
            "package main\n\ntype Options struct {\n\tVerbose bool\n}\n";
        let pkg = load_sources(&[
            ("demo/main.go".to_owned(), target.to_owned()),
            ("demo/options.go".to_owned(), sibling.to_owned()),
        ])
        .unwrap();

        let analysis = analyze(&pkg, "run", None).unwrap();
        assert_eq!(analysis.metadata.options.len(), 1);
        assert_eq!(analysis.metadata.options[0].cli_name, "verbose");
        assert_eq!(analysis.metadata.name, "demo");
    }

    #[test]
    fn test_options_type_not_found() {
        let src = "package main\n\nfunc run(options Options) error {\n\treturn nil\n}\n";
        let pkg = load_sources(&[("x.go".to_owned(), src.to_owned())]).unwrap();

        let err = analyze(&pkg, "run", None).unwrap_err();
        assert!(err.to_string().contains("options struct type `Options`"));
    }

    #[test]
    fn test_duplicate_cli_names() {
        let src = "package main\n\ntype Options struct {\n\tAPIKey string\n\tApiKey string\n}\n\nfunc run(options Options) error {\n\treturn nil\n}\n";
        let pkg = load_sources(&[("x.go".to_owned(), src.to_owned())]).unwrap();

        let err = analyze(&pkg, "run", None).unwrap_err();
        assert!(err.to_string().contains("api-key"));
    }

    #[test]
    fn test_embedded_fields_are_followed() {
        let src = "package main\n\ntype Common struct {\n\t// Verbose enables chatty output.\n\tVerbose bool\n}\n\ntype Options struct {\n\tCommon\n\tName string\n}\n\nfunc run(options *Options) error {\n\treturn nil\n}\n";
        let pkg = load_sources(&[("x.go".to_owned(), src.to_owned())]).unwrap();

        let meta = analyze(&pkg, "run", None).unwrap().metadata;
        assert_eq!(meta.options.len(), 2);
        assert_eq!(meta.options[0].cli_name, "verbose");
        assert_eq!(meta.options[1].cli_name, "name");
    }

    #[test]
    fn test_text_marshaling_detection() {
        let src = "package main\n\ntype Level string\n\nfunc (l *Level) UnmarshalText(data []byte) error {\n\treturn nil\n}\n\nfunc (l Level) MarshalText() ([]byte, error) {\n\treturn nil, nil\n}\n\ntype Options struct {\n\tLevel Level\n}\n\nfunc run(options Options) error {\n\treturn nil\n}\n";
        let pkg = load_sources(&[("x.go".to_owned(), src.to_owned())]).unwrap();

        let meta = analyze(&pkg, "run", None).unwrap().metadata;
        let level = &meta.options[0];
        assert!(level.is_text_unmarshaler);
        assert!(level.is_text_marshaler);
        assert_eq!(level.underlying_kind, "string");
    }

    #[test]
    fn test_cross_package_type_gets_note() {
        let src = "package main\n\nimport \"example.com/other\"\n\ntype Options struct {\n\tMode other.Mode\n}\n\nfunc run(options Options) error {\n\treturn nil\n}\n";
        let pkg = load_sources(&[("x.go".to_owned(), src.to_owned())]).unwrap();

        let meta = analyze(&pkg, "run", None).unwrap().metadata;
        let mode = &meta.options[0];
        assert!(!mode.is_text_unmarshaler);
        assert_matches!(mode.notes.first(), Some(note) if note.contains("another package"));
    }

    #[test]
    fn test_cli_name_override_tag() {
        let src = "package main\n\ntype Options struct {\n\tConfigFile string `goat:\"required,name=config\"`\n}\n\nfunc run(options Options) error {\n\treturn nil\n}\n";
        let pkg = load_sources(&[("x.go".to_owned(), src.to_owned())]).unwrap();

        let meta = analyze(&pkg, "run", None).unwrap().metadata;
        assert_eq!(meta.options[0].cli_name, "config");
        assert!(meta.options[0].is_required);
    }
}
