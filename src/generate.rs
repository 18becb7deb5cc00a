//! Emits the Go source of the generated `main` function.
//!
//! Emission is organized as a fixed sequence of phases; a per-type handler
//! contributes one fragment per phase for each option, possibly empty. The
//! phase order is global and never varies per option:
//!
//!  1. explicit-set map
//!  2. `flag.Usage` override
//!  3. options construction and literal defaults
//!  4. environment-variable binding
//!  5. flag registration
//!  6. `flag.Parse` + `flag.Visit`
//!  7. pointer re-pointing and temp write-backs
//!  8. `--no-<name>` boolean handling
//!  9. required checks
//! 10. enum validation
//! 11. dispatch to the run function

use crate::metadata::{CommandMetadata, DefaultValue, OptionSpec};

/// The fixed import set of a generated full file; the rewriter's
/// import-organization pass removes the unused ones.
pub const GENERATED_IMPORTS: &[&str] = &[
    "context",
    "errors",
    "flag",
    "fmt",
    "log/slog",
    "os",
    "slices",
    "strconv",
    "strings",
];

/// Generates a complete Go file: package clause, imports and `main`.
pub fn generate_file(meta: &CommandMetadata, help: &str) -> String {
    let mut res = String::from("package main\n\nimport (\n");

    let mut paths: Vec<String> = GENERATED_IMPORTS.iter().map(|s| s.to_string()).collect();
    if meta.run_func.package_name != "main" {
        paths.push(meta.run_func.package_name.clone());
    }
    paths.sort();
    for path in paths {
        res.push('\t');
        res.push_str(&go_quote(&path));
        res.push('\n');
    }
    res.push_str(")\n\n");

    res.push_str(&generate_main(meta, help));
    res
}

/// Generates the bare `func main() { ... }`, the form the rewriter splices
/// into an existing file.
pub fn generate_main(meta: &CommandMetadata, help: &str) -> String {
    let mut sections: Vec<String> = Vec::new();

    sections.push("\tisFlagExplicitlySet := map[string]bool{}\n".to_owned());

    sections.push(format!(
        "\tflag.Usage = func() {{\n\t\tfmt.Fprint(os.Stderr, {})\n\t}}\n",
        go_string_lit(help)
    ));

    if let Some(section) = construct_section(meta) {
        sections.push(section);
    }

    push_option_section(&mut sections, meta, |opt| Handler::select(opt).env_bind(opt));
    push_option_section(&mut sections, meta, |opt| {
        Handler::select(opt).flag_register(opt)
    });

    sections.push(
        "\tflag.Parse()\n\tflag.Visit(func(f *flag.Flag) {\n\t\tisFlagExplicitlySet[f.Name] = true\n\t})\n"
            .to_owned(),
    );

    push_option_section(&mut sections, meta, |opt| {
        Handler::select(opt).post_parse(opt)
    });
    push_option_section(&mut sections, meta, |opt| {
        Handler::select(opt).negated_bool_fixup(opt)
    });
    push_option_section(&mut sections, meta, |opt| {
        Handler::select(opt).required_check(opt)
    });
    push_option_section(&mut sections, meta, |opt| {
        Handler::select(opt).enum_check(opt)
    });

    sections.push(dispatch_section(meta));

    let mut res = String::from("func main() {\n");
    res.push_str(&sections.join("\n"));
    res.push_str("}\n");
    res
}

fn push_option_section<F>(sections: &mut Vec<String>, meta: &CommandMetadata, f: F)
where
    F: Fn(&OptionSpec) -> String,
{
    let section: String = meta.options.iter().map(|opt| f(opt)).collect();
    if !section.is_empty() {
        sections.push(section);
    }
}

/// Phase 3: construct the options value, either through the user's
/// initializer or from literal defaults.
fn construct_section(meta: &CommandMetadata) -> Option<String> {
    let arg = meta.run_func.options_arg.as_ref()?;

    let mut out = String::new();
    match &meta.run_func.initializer_name {
        Some(init) => {
            if meta.run_func.initializer_returns_pointer {
                out.push_str(&format!("\toptions := {}()\n", init));
            } else {
                out.push_str(&format!("\toptionsValue := {}()\n", init));
                out.push_str("\toptions := &optionsValue\n");
            }
        }
        None => {
            out.push_str(&format!("\toptions := new({})\n", arg.base_type));
        }
    }

    // With an initializer the defaults are already applied by the user's own
    // code; without one, replay the extracted literals.
    if meta.run_func.initializer_name.is_none() {
        for opt in &meta.options {
            out.push_str(&Handler::select(opt).default_assign(opt));
        }
    }

    // Required text-unmarshaler values have no literal to compare against
    // later; snapshot them before env vars and flags mutate the field.
    for opt in &meta.options {
        if opt.is_required && !opt.is_pointer && Handler::select(opt) == Handler::Text {
            out.push_str(&format!(
                "\t{} := {}\n",
                initial_temp(&opt.field_name),
                field_ref(opt)
            ));
        }
    }

    Some(out)
}

/// Phase 11: build the call argument list and dispatch.
fn dispatch_section(meta: &CommandMetadata) -> String {
    let run = &meta.run_func;
    let mut out = String::new();

    let callee = if run.package_name == "main" {
        run.name.clone()
    } else {
        format!("{}.{}", run.package_name, run.name)
    };

    let mut args: Vec<String> = Vec::new();
    if run.context_arg.is_some() {
        out.push_str("\tctx := context.Background()\n");
        args.push("ctx".to_owned());
    }
    if let Some(arg) = &run.options_arg {
        if arg.is_pointer {
            args.push("options".to_owned());
        } else {
            args.push("*options".to_owned());
        }
    }

    let call = format!("{}({})", callee, args.join(", "));
    if run.returns_error {
        out.push_str(&format!(
            "\tif err := {}; err != nil {{\n\t\tslog.Error(\"command failed\", \"error\", err)\n\t\tos.Exit(1)\n\t}}\n",
            call
        ));
    } else {
        out.push_str(&format!("\t{}\n", call));
    }

    out
}

/// Per-type emission strategy, selected once per option.
#[derive(Copy, Clone, Debug, PartialEq)]
enum Handler {
    /// `string` fields.
    Str,
    /// `int` fields.
    Int,
    /// `bool` fields.
    Bool,
    /// `[]string` fields.
    StrSlice,
    /// Types implementing `encoding.TextUnmarshaler`.
    Text,
    /// Named types whose underlying kind is `string`.
    NamedStr,
    /// Unrecognized types: metadata only, no runtime surface.
    Opaque,
}

impl Handler {
    fn select(opt: &OptionSpec) -> Handler {
        if opt.is_string_slice() {
            Handler::StrSlice
        } else {
            match opt.base_type.as_str() {
                "string" => Handler::Str,
                "int" => Handler::Int,
                "bool" => Handler::Bool,
                _ if opt.is_text_unmarshaler => Handler::Text,
                _ if opt.underlying_kind == "string" => Handler::NamedStr,
                _ => Handler::Opaque,
            }
        }
    }

    /// Phase 3 fragment: assign the extracted literal default.
    fn default_assign(self, opt: &OptionSpec) -> String {
        let Some(default) = &opt.default else {
            return String::new();
        };
        if matches!(default, DefaultValue::Nil) {
            return String::new();
        }
        let field = field_ref(opt);

        let value = match (self, default) {
            (Handler::Str, DefaultValue::Str(s)) => go_quote(s),
            (Handler::Int, DefaultValue::Int(n)) => n.to_string(),
            (Handler::Bool, DefaultValue::Bool(b)) => b.to_string(),
            (Handler::NamedStr, DefaultValue::Str(s)) => {
                format!("{}({})", opt.base_type, go_quote(s))
            }
            (Handler::Text, DefaultValue::Str(s)) => {
                // Defaults for text-unmarshaler types go through the type's
                // own parser.
                let target = format!("options.{}", opt.field_name);
                let (alloc, recv) = if opt.is_pointer {
                    (
                        format!("\t{} = new({})\n", target, opt.base_type),
                        target.clone(),
                    )
                } else {
                    (String::new(), target)
                };
                return format!(
                    "{}\tif err := {}.UnmarshalText([]byte({})); err != nil {{\n\t\tslog.Warn(\"ignoring invalid default value\", \"option\", {}, \"value\", {}, \"error\", err)\n\t}}\n",
                    alloc,
                    recv,
                    go_quote(s),
                    go_quote(&opt.field_name),
                    go_quote(s),
                );
            }
            _ => return String::new(),
        };

        if opt.is_pointer {
            format!(
                "\t{field} = new({base})\n\t*{field} = {value}\n",
                field = field,
                base = opt.base_type,
                value = value
            )
        } else {
            format!("\t{} = {}\n", field, value)
        }
    }

    /// Phase 4 fragment: bind the environment variable, coercing to the
    /// field's type. Coercion failures warn and keep the prior value.
    fn env_bind(self, opt: &OptionSpec) -> String {
        if opt.env_var.is_empty() {
            return String::new();
        }
        let env = go_quote(&opt.env_var);
        let field = field_ref(opt);

        let assign = match self {
            Handler::Str => {
                if opt.is_pointer {
                    format!("\t\t{} = &v\n", field)
                } else {
                    format!("\t\t{} = v\n", field)
                }
            }
            Handler::Int => {
                let set = if opt.is_pointer {
                    format!("{} = &n", field)
                } else {
                    format!("{} = n", field)
                };
                format!(
                    "\t\tif n, err := strconv.Atoi(v); err == nil {{\n\t\t\t{}\n\t\t}} else {{\n\t\t\tslog.Warn(\"ignoring invalid integer in environment variable\", \"envVar\", {}, \"value\", v, \"error\", err)\n\t\t}}\n",
                    set, env
                )
            }
            Handler::Bool => {
                let set = if opt.is_pointer {
                    format!("{} = &b", field)
                } else {
                    format!("{} = b", field)
                };
                format!(
                    "\t\tif b, err := strconv.ParseBool(v); err == nil {{\n\t\t\t{}\n\t\t}} else {{\n\t\t\tslog.Warn(\"ignoring invalid boolean in environment variable\", \"envVar\", {}, \"value\", v, \"error\", err)\n\t\t}}\n",
                    set, env
                )
            }
            Handler::NamedStr => {
                if opt.is_pointer {
                    let tmp = temp_name(&opt.field_name, "EnvValue");
                    format!(
                        "\t\t{tmp} := {base}(v)\n\t\t{field} = &{tmp}\n",
                        tmp = tmp,
                        base = opt.base_type,
                        field = field
                    )
                } else {
                    format!("\t\t{} = {}(v)\n", field, opt.base_type)
                }
            }
            Handler::Text => {
                let alloc = if opt.is_pointer {
                    format!(
                        "\t\tif {field} == nil {{\n\t\t\t{field} = new({base})\n\t\t}}\n",
                        field = field,
                        base = opt.base_type
                    )
                } else {
                    String::new()
                };
                format!(
                    "{}\t\tif err := {}.UnmarshalText([]byte(v)); err != nil {{\n\t\t\tslog.Warn(\"ignoring invalid value in environment variable\", \"envVar\", {}, \"value\", v, \"error\", err)\n\t\t}}\n",
                    alloc, field, env
                )
            }
            Handler::StrSlice => format!("\t\t{} = strings.Split(v, \",\")\n", field),
            Handler::Opaque => return String::new(),
        };

        format!(
            "\tif v, ok := os.LookupEnv({}); ok {{\n{}\t}}\n",
            env, assign
        )
    }

    /// Phase 5 fragment: register the flag.
    fn flag_register(self, opt: &OptionSpec) -> String {
        let cli = go_quote(&opt.cli_name);
        let help = go_string_lit(&flag_help(opt));
        let field = field_ref(opt);

        match self {
            Handler::Str | Handler::Int if opt.is_pointer => {
                let tmp = temp_name(&opt.field_name, "FlagValue");
                let was_nil = temp_name(&opt.field_name, "WasNil");
                let (zero, register) = match self {
                    Handler::Str => ("\"\"", "StringVar"),
                    _ => ("0", "IntVar"),
                };
                format!(
                    "\t{tmp} := {zero}\n\tif {field} != nil {{\n\t\t{tmp} = *{field}\n\t}}\n\t{was_nil} := {field} == nil\n\tflag.{register}(&{tmp}, {cli}, {tmp}, {help})\n",
                    tmp = tmp,
                    zero = zero,
                    field = field,
                    was_nil = was_nil,
                    register = register,
                    cli = cli,
                    help = help
                )
            }
            Handler::Bool if opt.is_pointer => {
                let tmp = temp_name(&opt.field_name, "FlagValue");
                let was_nil = temp_name(&opt.field_name, "WasNil");
                let mut out = format!(
                    "\t{tmp} := false\n\tif {field} != nil {{\n\t\t{tmp} = *{field}\n\t}}\n\t{was_nil} := {field} == nil\n\tflag.BoolVar(&{tmp}, {cli}, {tmp}, {help})\n",
                    tmp = tmp,
                    field = field,
                    was_nil = was_nil,
                    cli = cli,
                    help = help
                );
                if is_negated_pointer_bool(opt) {
                    let no_tmp = negation_temp(&opt.field_name);
                    let no_cli = go_quote(&format!("no-{}", opt.cli_name));
                    let no_help = go_string_lit(&format!("disable {}", opt.cli_name));
                    out.push_str(&format!(
                        "\t{tmp} := false\n\tflag.BoolVar(&{tmp}, {cli}, false, {help})\n",
                        tmp = no_tmp,
                        cli = no_cli,
                        help = no_help
                    ));
                }
                out
            }
            Handler::Str => format!(
                "\tflag.StringVar(&{field}, {cli}, {field}, {help})\n",
                field = field,
                cli = cli,
                help = help
            ),
            Handler::Int => format!(
                "\tflag.IntVar(&{field}, {cli}, {field}, {help})\n",
                field = field,
                cli = cli,
                help = help
            ),
            Handler::Bool => {
                let mut out = format!(
                    "\tflag.BoolVar(&{field}, {cli}, {field}, {help})\n",
                    field = field,
                    cli = cli,
                    help = help
                );
                if is_negated_bool(opt) {
                    let no_tmp = negation_temp(&opt.field_name);
                    let no_cli = go_quote(&format!("no-{}", opt.cli_name));
                    let no_help = go_string_lit(&format!("disable {}", opt.cli_name));
                    out.push_str(&format!(
                        "\t{tmp} := false\n\tflag.BoolVar(&{tmp}, {cli}, false, {help})\n",
                        tmp = no_tmp,
                        cli = no_cli,
                        help = no_help
                    ));
                }
                out
            }
            Handler::NamedStr => {
                let tmp = temp_name(&opt.field_name, "FlagValue");
                if opt.is_pointer {
                    let was_nil = temp_name(&opt.field_name, "WasNil");
                    format!(
                        "\t{tmp} := \"\"\n\tif {field} != nil {{\n\t\t{tmp} = string(*{field})\n\t}}\n\t{was_nil} := {field} == nil\n\tflag.StringVar(&{tmp}, {cli}, {tmp}, {help})\n",
                        tmp = tmp,
                        field = field,
                        was_nil = was_nil,
                        cli = cli,
                        help = help
                    )
                } else {
                    format!(
                        "\t{tmp} := string({field})\n\tflag.StringVar(&{tmp}, {cli}, {tmp}, {help})\n",
                        tmp = tmp,
                        field = field,
                        cli = cli,
                        help = help
                    )
                }
            }
            Handler::Text => {
                if !opt.is_pointer && opt.is_text_marshaler {
                    format!(
                        "\tflag.TextVar(&{field}, {cli}, {field}, {help})\n",
                        field = field,
                        cli = cli,
                        help = help
                    )
                } else {
                    let alloc = if opt.is_pointer {
                        format!(
                            "\t\tif {field} == nil {{\n\t\t\t{field} = new({base})\n\t\t}}\n",
                            field = field,
                            base = opt.base_type
                        )
                    } else {
                        String::new()
                    };
                    format!(
                        "\tflag.Func({cli}, {help}, func(s string) error {{\n{alloc}\t\treturn {field}.UnmarshalText([]byte(s))\n\t}})\n",
                        cli = cli,
                        help = help,
                        alloc = alloc,
                        field = field
                    )
                }
            }
            Handler::StrSlice => {
                let seen = temp_name(&opt.field_name, "FlagSeen");
                format!(
                    "\t{seen} := false\n\tflag.Func({cli}, {help}, func(s string) error {{\n\t\tif !{seen} {{\n\t\t\t{field} = nil\n\t\t\t{seen} = true\n\t\t}}\n\t\t{field} = append({field}, strings.Split(s, \",\")...)\n\t\treturn nil\n\t}})\n",
                    seen = seen,
                    cli = cli,
                    help = help,
                    field = field
                )
            }
            Handler::Opaque => String::new(),
        }
    }

    /// Phase 7 fragment: re-point pointers and write temps back.
    fn post_parse(self, opt: &OptionSpec) -> String {
        let field = field_ref(opt);
        let cli = go_quote(&opt.cli_name);

        match self {
            Handler::Str | Handler::Int | Handler::Bool if opt.is_pointer => {
                let tmp = temp_name(&opt.field_name, "FlagValue");
                let was_nil = temp_name(&opt.field_name, "WasNil");
                format!(
                    "\tif !{was_nil} || isFlagExplicitlySet[{cli}] {{\n\t\t{field} = &{tmp}\n\t}}\n",
                    was_nil = was_nil,
                    cli = cli,
                    field = field,
                    tmp = tmp
                )
            }
            Handler::NamedStr => {
                let tmp = temp_name(&opt.field_name, "FlagValue");
                if opt.is_pointer {
                    let was_nil = temp_name(&opt.field_name, "WasNil");
                    let value = temp_name(&opt.field_name, "Value");
                    format!(
                        "\tif !{was_nil} || isFlagExplicitlySet[{cli}] {{\n\t\t{value} := {base}({tmp})\n\t\t{field} = &{value}\n\t}}\n",
                        was_nil = was_nil,
                        cli = cli,
                        value = value,
                        base = opt.base_type,
                        tmp = tmp,
                        field = field
                    )
                } else {
                    format!(
                        "\t{field} = {base}({tmp})\n",
                        field = field,
                        base = opt.base_type,
                        tmp = tmp
                    )
                }
            }
            _ => String::new(),
        }
    }

    /// Phase 8 fragment: apply the `--no-<name>` companion flag.
    fn negated_bool_fixup(self, opt: &OptionSpec) -> String {
        if self != Handler::Bool {
            return String::new();
        }
        let tmp = negation_temp(&opt.field_name);

        if is_negated_bool(opt) {
            format!(
                "\tif {tmp} {{\n\t\t{} = false\n\t}}\n",
                field_ref(opt),
                tmp = tmp
            )
        } else if is_negated_pointer_bool(opt) {
            let false_tmp = temp_name(&opt.field_name, "FalseValue");
            format!(
                "\tif {tmp} {{\n\t\t{false_tmp} := false\n\t\t{field} = &{false_tmp}\n\t}}\n",
                tmp = tmp,
                false_tmp = false_tmp,
                field = field_ref(opt)
            )
        } else {
            String::new()
        }
    }

    /// Phase 9 fragment: enforce required options. Booleans are exempt; their
    /// required form is the `--no-` negation.
    fn required_check(self, opt: &OptionSpec) -> String {
        if !opt.is_required || self == Handler::Bool || self == Handler::Opaque {
            return String::new();
        }
        let field = field_ref(opt);
        let cli = go_quote(&opt.cli_name);

        let mut log_keys = format!("\"flag\", {}", cli);
        if !opt.env_var.is_empty() {
            log_keys.push_str(&format!(", \"envVar\", {}", go_quote(&opt.env_var)));
        }
        let fail = format!(
            "\t\tslog.Error(\"required flag is missing\", {})\n\t\tos.Exit(1)\n",
            log_keys
        );

        if opt.is_pointer {
            return format!(
                "\tif {field} == nil && !isFlagExplicitlySet[{cli}] {{\n{fail}\t}}\n",
                field = field,
                cli = cli,
                fail = fail
            );
        }

        let mut cond = match self {
            Handler::Str => format!("{} == {}", field, default_or_zero(opt, "\"\"")),
            Handler::Int => format!("{} == {}", field, default_or_zero(opt, "0")),
            Handler::NamedStr => {
                let zero = match &opt.default {
                    Some(DefaultValue::Str(s)) => {
                        format!("{}({})", opt.base_type, go_quote(s))
                    }
                    _ => "\"\"".to_owned(),
                };
                format!("{} == {}", field, zero)
            }
            Handler::StrSlice => {
                return format!(
                    "\tif len({field}) == 0 {{\n{fail}\t}}\n",
                    field = field,
                    fail = fail
                );
            }
            Handler::Text => {
                format!("{} == {}", field, initial_temp(&opt.field_name))
            }
            _ => String::new(),
        };

        if !cond.is_empty() {
            cond.push_str(" && ");
        }
        cond.push_str(&format!("!isFlagExplicitlySet[{}]", cli));
        if !opt.env_var.is_empty() {
            cond.push_str(&format!(" && os.Getenv({}) == \"\"", go_quote(&opt.env_var)));
        }

        format!("\tif {} {{\n{}\t}}\n", cond, fail)
    }

    /// Phase 10 fragment: enum validation against the `%v` rendering.
    fn enum_check(self, opt: &OptionSpec) -> String {
        let Some(values) = &opt.enum_values else {
            return String::new();
        };
        if self == Handler::Opaque {
            return String::new();
        }
        let field = field_ref(opt);
        let cli = go_quote(&opt.cli_name);

        let list = values
            .iter()
            .map(|v| go_quote(v))
            .collect::<Vec<_>>()
            .join(", ");
        let allowed = go_quote(&values.join(", "));

        if opt.is_pointer {
            format!(
                "\tif {field} != nil && !slices.Contains([]string{{{list}}}, fmt.Sprintf(\"%v\", *{field})) {{\n\t\tslog.Error(\"invalid value for flag\", \"flag\", {cli}, \"value\", *{field}, \"allowedChoices\", {allowed})\n\t\tos.Exit(1)\n\t}}\n",
                field = field,
                list = list,
                cli = cli,
                allowed = allowed
            )
        } else {
            format!(
                "\tif !slices.Contains([]string{{{list}}}, fmt.Sprintf(\"%v\", {field})) {{\n\t\tslog.Error(\"invalid value for flag\", \"flag\", {cli}, \"value\", {field}, \"allowedChoices\", {allowed})\n\t\tos.Exit(1)\n\t}}\n",
                list = list,
                field = field,
                cli = cli,
                allowed = allowed
            )
        }
    }
}

fn field_ref(opt: &OptionSpec) -> String {
    format!("options.{}", opt.field_name)
}

fn is_negated_bool(opt: &OptionSpec) -> bool {
    opt.base_type == "bool"
        && !opt.is_pointer
        && opt.is_required
        && opt.default == Some(DefaultValue::Bool(true))
}

fn is_negated_pointer_bool(opt: &OptionSpec) -> bool {
    opt.base_type == "bool"
        && opt.is_pointer
        && opt.is_required
        && opt.default == Some(DefaultValue::Bool(true))
}

fn default_or_zero(opt: &OptionSpec, zero: &str) -> String {
    match &opt.default {
        Some(DefaultValue::Str(s)) => go_quote(s),
        Some(DefaultValue::Int(n)) => n.to_string(),
        Some(DefaultValue::Bool(b)) => b.to_string(),
        _ => zero.to_owned(),
    }
}

fn temp_name(field: &str, suffix: &str) -> String {
    format!("{}{}", lower_first(field), suffix)
}

fn negation_temp(field: &str) -> String {
    format!("no{}FlagValue", field)
}

fn initial_temp(field: &str) -> String {
    format!("initial{}", field)
}

fn lower_first(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) => c.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// The per-flag help string: base help plus default/env/allowed suffixes.
fn flag_help(opt: &OptionSpec) -> String {
    let mut text = opt.help_text.trim_end().to_owned();

    let mut push = |s: String| {
        if !text.is_empty() {
            text.push(' ');
        }
        text.push_str(&s);
    };

    if let Some(default) = &opt.default {
        let suppressed = is_negated_bool(opt)
            || is_negated_pointer_bool(opt)
            || matches!(default, DefaultValue::Nil)
            || default == &DefaultValue::Bool(false);
        if !suppressed {
            push(format!("(default: {})", default.string_form()));
        }
    }
    if !opt.env_var.is_empty() {
        push(format!("(env: {})", opt.env_var));
    }
    if let Some(values) = &opt.enum_values {
        push(format!("(allowed: {})", values.join(", ")));
    }

    text
}

/// Renders a Go interpreted string literal.
pub fn go_quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            c if (c as u32) < 0x20 => out.push_str(&format!("\\x{:02x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Picks the best Go literal for a string: quoted when single-line, raw when
/// multi-line, and a raw-plus-quoted concatenation when the string contains
/// both newlines and backquotes.
pub fn go_string_lit(s: &str) -> String {
    if !s.contains('\n') {
        return go_quote(s);
    }
    if !s.contains('`') {
        return format!("`{}`", s);
    }

    let mut parts = Vec::new();
    for (i, segment) in s.split('`').enumerate() {
        if i > 0 {
            parts.push("\"`\"".to_owned());
        }
        if !segment.is_empty() {
            if segment.contains('\n') {
                parts.push(format!("`{}`", segment));
            } else {
                parts.push(go_quote(segment));
            }
        }
    }
    parts.join(" + ")
}

#[cfg(test)]
mod test {
    use super::{generate_file, generate_main, go_quote, go_string_lit};
    use crate::metadata::{
        CommandMetadata, DefaultValue, OptionSpec, OptionsArg, RunFunc,
    };

    fn option(field: &str, cli: &str, base: &str) -> OptionSpec {
        OptionSpec {
            field_name: field.into(),
            cli_name: cli.into(),
            base_type: base.into(),
            written_type: base.into(),
            underlying_kind: match base {
                "string" | "int" | "bool" => base.into(),
                _ => String::new(),
            },
            ..OptionSpec::default()
        }
    }

    fn meta(options: Vec<OptionSpec>) -> CommandMetadata {
        CommandMetadata {
            name: "demo".into(),
            description: String::new(),
            run_func: RunFunc {
                name: "run".into(),
                package_name: "main".into(),
                context_arg: None,
                options_arg: Some(OptionsArg {
                    name: "options".into(),
                    written_type: "*Options".into(),
                    base_type: "Options".into(),
                    is_pointer: true,
                }),
                initializer_name: None,
                initializer_returns_pointer: false,
                returns_error: true,
            },
            options,
            main_func_position: None,
            notes: Vec::new(),
        }
    }

    #[test]
    fn test_phase_order_is_global() {
        let mut port = option("Port", "port", "int");
        port.default = Some(DefaultValue::Int(8080));
        port.env_var = "PORT".into();
        let mut mode = option("Mode", "mode", "string");
        mode.enum_values = Some(vec!["auto".into(), "manual".into()]);
        mode.is_required = true;

        let src = generate_main(&meta(vec![port, mode]), "demo\n");

        let positions: Vec<usize> = [
            "isFlagExplicitlySet := map[string]bool{}",
            "flag.Usage = func()",
            "options := new(Options)",
            "options.Port = 8080",
            "os.LookupEnv(\"PORT\")",
            "flag.IntVar(&options.Port",
            "flag.Parse()",
            "required flag is missing",
            "slices.Contains",
            "if err := run(options); err != nil {",
        ]
        .iter()
        .map(|needle| src.find(needle).unwrap_or_else(|| panic!("missing {:?}", needle)))
        .collect();

        let mut sorted = positions.clone();
        sorted.sort();
        assert_eq!(positions, sorted, "phases out of order:\n{}", src);
    }

    #[test]
    fn test_pointer_string_repoints_after_parse() {
        let mut token = option("Token", "token", "string");
        token.is_pointer = true;
        token.written_type = "*string".into();
        token.env_var = "APP_TOKEN".into();

        let src = generate_main(&meta(vec![token]), "demo\n");

        assert!(src.contains("tokenFlagValue := \"\""));
        assert!(src.contains("tokenWasNil := options.Token == nil"));
        assert!(src.contains("if v, ok := os.LookupEnv(\"APP_TOKEN\"); ok {"));
        assert!(src.contains("options.Token = &v"));
        assert!(src.contains(
            "if !tokenWasNil || isFlagExplicitlySet[\"token\"] {\n\t\toptions.Token = &tokenFlagValue\n\t}"
        ));
    }

    #[test]
    fn test_negated_bool_flag() {
        let mut sync = option("EnableSync", "enable-sync", "bool");
        sync.is_required = true;
        sync.default = Some(DefaultValue::Bool(true));

        let src = generate_main(&meta(vec![sync]), "demo\n");

        assert!(src.contains("options.EnableSync = true"));
        assert!(src.contains("flag.BoolVar(&noEnableSyncFlagValue, \"no-enable-sync\", false"));
        assert!(src.contains("if noEnableSyncFlagValue {\n\t\toptions.EnableSync = false\n\t}"));
        // No required check for booleans.
        assert!(!src.contains("required flag is missing"));
    }

    #[test]
    fn test_negated_pointer_bool_flag() {
        let mut sync = option("EnableSync", "enable-sync", "bool");
        sync.is_pointer = true;
        sync.written_type = "*bool".into();
        sync.is_required = true;
        sync.default = Some(DefaultValue::Bool(true));

        let src = generate_main(&meta(vec![sync]), "demo\n");

        // Default allocation, pointer registration, and the companion flag.
        assert!(src.contains("options.EnableSync = new(bool)"));
        assert!(src.contains("*options.EnableSync = true"));
        assert!(src.contains("enableSyncWasNil := options.EnableSync == nil"));
        assert!(src.contains("flag.BoolVar(&noEnableSyncFlagValue, \"no-enable-sync\", false,"));
        assert!(src.contains(
            "if noEnableSyncFlagValue {\n\t\tenableSyncFalseValue := false\n\t\toptions.EnableSync = &enableSyncFalseValue\n\t}"
        ));
        // Booleans stay exempt from the missing-value check.
        assert!(!src.contains("required flag is missing"));
    }

    #[test]
    fn test_required_text_compares_against_snapshot() {
        let mut level = option("Level", "level", "Level");
        level.is_text_unmarshaler = true;
        level.is_required = true;
        level.default = Some(DefaultValue::Str("info".into()));

        let src = generate_main(&meta(vec![level]), "demo\n");

        let snapshot = src.find("initialLevel := options.Level").unwrap();
        let check = src
            .find("if options.Level == initialLevel && !isFlagExplicitlySet[\"level\"] {")
            .unwrap();
        let parse = src.find("flag.Parse()").unwrap();
        assert!(snapshot < parse && parse < check);
    }

    #[test]
    fn test_string_slice_flag() {
        let tags = option("Tags", "tags", "[]string");

        let src = generate_main(&meta(vec![tags]), "demo\n");

        assert!(src.contains("tagsFlagSeen := false"));
        assert!(src.contains("flag.Func(\"tags\""));
        assert!(src.contains("append(options.Tags, strings.Split(s, \",\")...)"));
    }

    #[test]
    fn test_text_var_registration() {
        let mut level = option("Level", "level", "Level");
        level.is_text_unmarshaler = true;
        level.is_text_marshaler = true;

        let src = generate_main(&meta(vec![level]), "demo\n");
        assert!(src.contains("flag.TextVar(&options.Level, \"level\", options.Level"));

        let mut unmarshal_only = option("Level", "level", "Level");
        unmarshal_only.is_text_unmarshaler = true;

        let src = generate_main(&meta(vec![unmarshal_only]), "demo\n");
        assert!(src.contains("flag.Func(\"level\""));
        assert!(src.contains("return options.Level.UnmarshalText([]byte(s))"));
    }

    #[test]
    fn test_initializer_construction() {
        let mut m = meta(vec![option("Name", "name", "string")]);
        m.run_func.initializer_name = Some("NewOptions".into());
        m.run_func.initializer_returns_pointer = true;
        m.options[0].default = Some(DefaultValue::Str("x".into()));

        let src = generate_main(&m, "demo\n");
        assert!(src.contains("options := NewOptions()"));
        // Literal defaults are not replayed over the initializer.
        assert!(!src.contains("options.Name = \"x\""));

        m.run_func.initializer_returns_pointer = false;
        let src = generate_main(&m, "demo\n");
        assert!(src.contains("optionsValue := NewOptions()"));
        assert!(src.contains("options := &optionsValue"));
    }

    #[test]
    fn test_dispatch_shapes() {
        let mut m = meta(Vec::new());
        m.run_func.context_arg = Some(crate::metadata::ContextArg {
            name: "ctx".into(),
            written_type: "context.Context".into(),
        });
        let src = generate_main(&m, "demo\n");
        assert!(src.contains("ctx := context.Background()"));
        assert!(src.contains("if err := run(ctx, options); err != nil {"));

        m.run_func.options_arg.as_mut().unwrap().is_pointer = false;
        let src = generate_main(&m, "demo\n");
        assert!(src.contains("run(ctx, *options)"));

        m.run_func.options_arg = None;
        m.run_func.context_arg = None;
        let src = generate_main(&m, "demo\n");
        assert!(src.contains("if err := run(); err != nil {"));
    }

    #[test]
    fn test_full_file_imports() {
        let src = generate_file(&meta(Vec::new()), "demo\n");

        assert!(src.starts_with("package main\n\nimport (\n"));
        for path in super::GENERATED_IMPORTS {
            assert!(src.contains(&format!("\t\"{}\"\n", path)), "missing {}", path);
        }
    }

    #[test]
    fn test_help_literal_forms() {
        assert_eq!(go_quote("a\"b"), "\"a\\\"b\"");
        assert_eq!(go_string_lit("one line"), "\"one line\"");
        assert_eq!(go_string_lit("two\nlines\n"), "`two\nlines\n`");

        let mixed = go_string_lit("has `tick`\nand lines\n");
        assert!(mixed.contains("\"`\""));
        assert!(mixed.contains(" + "));
    }

    #[test]
    fn test_usage_prints_help_verbatim() {
        let src = generate_main(&meta(Vec::new()), "demo - a demo\n\nUsage: demo [flags]\n");

        assert!(src.contains("flag.Usage = func() {"));
        assert!(src.contains("fmt.Fprint(os.Stderr, `demo - a demo\n\nUsage: demo [flags]\n`)"));
    }
}
