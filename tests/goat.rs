//! End-to-end tests over the whole pipeline, seeded from realistic target
//! files: metadata extraction, help rendering, generated-source structure,
//! and in-place rewriting.

use std::fs;

use assert_matches::assert_matches;

use goat::analyzer::analyze;
use goat::generate::generate_main;
use goat::help::help_message;
use goat::interp::interpret;
use goat::loader::load_sources;
use goat::{CommandMetadata, DefaultValue};

const BASIC: &str = r#"package main

import (
	"context"
	"fmt"

	"example.com/cli/goat"
)

// Options configures the greet command.
type Options struct {
	// Name is who to greet.
	Name string
	// Port is the port to listen on.
	Port int
}

func NewOptions() *Options {
	return &Options{
		Name: goat.Default("anonymous"),
		Port: goat.Default(8080),
	}
}

// run greets over HTTP.
func run(ctx context.Context, options *Options) error {
	fmt.Printf("hello %s:%d\n", options.Name, options.Port)
	return nil
}

func main() {
	// placeholder
}
"#;

fn pipeline(name: &str, src: &str, run: &str, initializer: &str) -> CommandMetadata {
    let pkg = load_sources(&[(name.to_owned(), src.to_owned())]).unwrap();
    let init = if initializer.is_empty() {
        None
    } else {
        Some(initializer)
    };
    let mut analysis = analyze(&pkg, run, init).unwrap();
    interpret(&pkg, &mut analysis);
    analysis.metadata
}

fn generated(src: &str, initializer: &str) -> String {
    let meta = pipeline("demo/app.go", src, "run", initializer);
    let help = help_message(&meta);
    generate_main(&meta, &help)
}

#[test]
fn basic_string_and_int() {
    let meta = pipeline("demo/greet.go", BASIC, "run", "NewOptions");

    assert_eq!(meta.name, "greet");
    assert_eq!(meta.description, "run greets over HTTP.");
    assert_eq!(meta.options.len(), 2);

    let name = meta.option("Name").unwrap();
    assert_eq!(name.cli_name, "name");
    assert_eq!(name.default, Some(DefaultValue::Str("anonymous".into())));

    let port = meta.option("Port").unwrap();
    assert_eq!(port.cli_name, "port");
    assert_eq!(port.default, Some(DefaultValue::Int(8080)));

    let src = generated(BASIC, "NewOptions");
    assert!(src.contains("options := NewOptions()"));
    assert!(src.contains("flag.StringVar(&options.Name, \"name\", options.Name,"));
    assert!(src.contains("flag.IntVar(&options.Port, \"port\", options.Port,"));
    assert!(src.contains("if err := run(ctx, options); err != nil {"));
}

#[test]
fn required_missing_check() {
    let src = r#"package main

type Options struct {
	// ConfigFile points at the configuration.
	ConfigFile string `goat:"required"`
}

func run(options *Options) error {
	return nil
}
"#;

    let meta = pipeline("demo/app.go", src, "run", "");
    let config = meta.option("ConfigFile").unwrap();
    assert!(config.is_required);
    assert_eq!(config.default, None);

    let out = generated(src, "");
    assert!(out.contains(
        "if options.ConfigFile == \"\" && !isFlagExplicitlySet[\"config-file\"] {"
    ));
    assert!(out.contains("slog.Error(\"required flag is missing\", \"flag\", \"config-file\")"));
    assert!(out.contains("os.Exit(1)"));
}

#[test]
fn enum_validation() {
    let src = r#"package main

import "example.com/cli/goat"

type Options struct {
	// Mode selects the drive mode.
	Mode string
}

func NewOptions() *Options {
	return &Options{
		Mode: goat.Default("auto", goat.Enum([]string{"auto", "manual", "standby"})),
	}
}

func run(options *Options) error {
	return nil
}
"#;

    let meta = pipeline("demo/app.go", src, "run", "NewOptions");
    let mode = meta.option("Mode").unwrap();
    assert_eq!(
        mode.enum_values.as_deref(),
        Some(&["auto".to_owned(), "manual".to_owned(), "standby".to_owned()][..])
    );

    let out = generated(src, "NewOptions");
    assert!(out.contains(
        "if !slices.Contains([]string{\"auto\", \"manual\", \"standby\"}, fmt.Sprintf(\"%v\", options.Mode)) {"
    ));
    assert!(out.contains("\"allowedChoices\", \"auto, manual, standby\""));
}

#[test]
fn pointer_string_from_env() {
    let src = r#"package main

type Options struct {
	// Token authenticates API calls.
	Token *string `env:"APP_TOKEN"`
}

func run(options *Options) error {
	return nil
}
"#;

    let meta = pipeline("demo/app.go", src, "run", "");
    let token = meta.option("Token").unwrap();
    assert!(token.is_pointer);
    assert_eq!(token.base_type, "string");
    assert_eq!(token.env_var, "APP_TOKEN");

    let out = generated(src, "");
    assert!(out.contains("if v, ok := os.LookupEnv(\"APP_TOKEN\"); ok {"));
    assert!(out.contains("options.Token = &v"));
    assert!(out.contains("tokenWasNil := options.Token == nil"));
    assert!(out.contains("options.Token = &tokenFlagValue"));
}

#[test]
fn required_bool_default_true() {
    let src = r#"package main

import "example.com/cli/goat"

type Options struct {
	// EnableSync keeps the mirror up to date.
	EnableSync bool `goat:"required"`
}

func NewOptions() *Options {
	return &Options{
		EnableSync: goat.Default(true),
	}
}

func run(options *Options) error {
	return nil
}
"#;

    let meta = pipeline("demo/app.go", src, "run", "NewOptions");
    let sync = meta.option("EnableSync").unwrap();
    assert!(sync.is_required);
    assert_eq!(sync.default, Some(DefaultValue::Bool(true)));

    let help = help_message(&meta);
    assert!(help.contains("--no-enable-sync"));
    assert!(!help.contains("(default: true)"));

    let out = generated(src, "NewOptions");
    assert!(out.contains("flag.BoolVar(&noEnableSyncFlagValue, \"no-enable-sync\", false,"));
    assert!(out.contains("if noEnableSyncFlagValue {\n\t\toptions.EnableSync = false\n\t}"));
}

#[test]
fn required_pointer_bool_default_true() {
    let src = r#"package main

import "example.com/cli/goat"

type Options struct {
	// KeepColor keeps ANSI colors enabled.
	KeepColor *bool `goat:"required"`
}

func NewOptions() *Options {
	return &Options{
		KeepColor: goat.Default(true),
	}
}

func run(options *Options) error {
	return nil
}
"#;

    let meta = pipeline("demo/app.go", src, "run", "NewOptions");
    let keep = meta.option("KeepColor").unwrap();
    assert!(keep.is_pointer);
    assert!(keep.is_required);
    assert_eq!(keep.default, Some(DefaultValue::Bool(true)));

    let help = help_message(&meta);
    assert!(help.contains("--no-keep-color"));
    assert!(!help.contains("(default: true)"));

    let out = generated(src, "NewOptions");
    assert!(out.contains("keepColorWasNil := options.KeepColor == nil"));
    assert!(out.contains("flag.BoolVar(&noKeepColorFlagValue, \"no-keep-color\", false,"));
    assert!(out.contains(
        "if noKeepColorFlagValue {\n\t\tkeepColorFalseValue := false\n\t\toptions.KeepColor = &keepColorFalseValue\n\t}"
    ));
    assert!(!out.contains("required flag is missing"));
}

#[test]
fn precedence_order_in_generated_code() {
    let src = r#"package main

import "example.com/cli/goat"

type Options struct {
	Name string `env:"NAME"`
}

func NewOptions() *Options {
	return &Options{
		Name: goat.Default("anonymous"),
	}
}

func run(options *Options) error {
	return nil
}
"#;

    let out = generated(src, "NewOptions");

    // Defaults are applied at construction, the env var may override them,
    // and the flag default is the then-current value, so an explicit flag
    // wins last.
    let construct = out.find("options := NewOptions()").unwrap();
    let env = out.find("os.LookupEnv(\"NAME\")").unwrap();
    let register = out.find("flag.StringVar(&options.Name").unwrap();
    let parse = out.find("flag.Parse()").unwrap();
    assert!(construct < env && env < register && register < parse);
}

#[test]
fn scan_json_schema_and_round_trip() {
    let meta = pipeline("demo/greet.go", BASIC, "run", "NewOptions");

    let value = serde_json::to_value(&meta).unwrap();
    assert_eq!(value["Name"], serde_json::json!("greet"));
    assert_eq!(value["RunFunc"]["Name"], serde_json::json!("run"));
    assert_eq!(value["RunFunc"]["PackageName"], serde_json::json!("main"));
    assert_eq!(
        value["RunFunc"]["OptionsArg"]["Type"],
        serde_json::json!("*Options")
    );
    assert_eq!(value["Options"][0]["CliName"], serde_json::json!("name"));
    assert_eq!(value["Options"][0]["TypeName"], serde_json::json!("string"));
    assert_eq!(
        value["Options"][1]["DefaultValue"],
        serde_json::json!(8080)
    );
    assert!(value["MainFuncPosition"]["Line"].is_u64());

    let text = serde_json::to_string(&meta).unwrap();
    let mut back: CommandMetadata = serde_json::from_str(&text).unwrap();
    back.hydrate();
    assert_eq!(serde_json::to_string(&back).unwrap(), text);
    assert_eq!(back.option("Name").unwrap().written_type, "string");
}

#[test]
fn help_message_for_basic() {
    let meta = pipeline("demo/greet.go", BASIC, "run", "NewOptions");
    let help = help_message(&meta);

    assert!(help.starts_with("greet - run greets over HTTP.\n"));
    assert!(help.contains("Usage: greet [flags]\n"));
    assert!(help.contains("--name"));
    assert!(help.contains("(default: anonymous)"));
    assert!(help.contains("(default: 8080)"));
    assert!(help.contains("-h, --help"));
}

#[test]
fn emit_rewrites_in_place() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("greet.go");
    fs::write(&path, BASIC).unwrap();

    goat::emit(&path, "run", "NewOptions").unwrap();
    let rewritten = fs::read_to_string(&path).unwrap();

    // The generated main is in place, with its imports organized in.
    assert!(rewritten.contains("isFlagExplicitlySet := map[string]bool{}"));
    assert!(rewritten.contains("\t\"flag\"\n"));
    assert!(rewritten.contains("\t\"log/slog\"\n"));
    assert!(rewritten.contains("\t\"example.com/cli/goat\"\n"));
    assert!(!rewritten.contains("// placeholder"));

    // Sibling declarations and their docs are untouched.
    assert!(rewritten.contains("// Options configures the greet command.\ntype Options struct {"));
    assert!(rewritten.contains("// Name is who to greet.\n\tName string"));
    assert!(rewritten.contains("func NewOptions() *Options {"));
    assert!(rewritten.contains("// run greets over HTTP.\nfunc run(ctx context.Context, options *Options) error {"));
}

#[test]
fn emit_twice_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("greet.go");
    fs::write(&path, BASIC).unwrap();

    goat::emit(&path, "run", "NewOptions").unwrap();
    let first = fs::read_to_string(&path).unwrap();

    goat::emit(&path, "run", "NewOptions").unwrap();
    let second = fs::read_to_string(&path).unwrap();

    assert_eq!(first, second);
}

#[test]
fn emit_preserves_sibling_declarations() {
    let src = r#"package main

// answer is the canonical constant.
const answer = 42

// state is mutable for testing.
var state = "idle"

// Mode is a named state.
type Mode string

type Options struct {
	Name string
}

// helperFunc stays exactly as written.
func helperFunc() string {
	return "kept"
}

func run(options *Options) error {
	return nil
}

// main will be replaced.
func main() {
	helperFunc()
}
"#;

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("app.go");
    fs::write(&path, src).unwrap();

    goat::emit(&path, "run", "").unwrap();
    let rewritten = fs::read_to_string(&path).unwrap();

    for kept in [
        "// answer is the canonical constant.\nconst answer = 42",
        "// state is mutable for testing.\nvar state = \"idle\"",
        "// Mode is a named state.\ntype Mode string",
        "// helperFunc stays exactly as written.\nfunc helperFunc() string {\n\treturn \"kept\"\n}",
        "func run(options *Options) error {",
    ] {
        assert!(rewritten.contains(kept), "lost:\n{}\nin:\n{}", kept, rewritten);
    }

    // The old main body and its doc comment are gone.
    assert!(!rewritten.contains("// main will be replaced."));
    assert!(!rewritten.contains("\thelperFunc()\n}"));
}

#[test]
fn emit_appends_when_main_is_absent() {
    let src = r#"package main

type Options struct {
	Name string
}

func run(options *Options) error {
	return nil
}
"#;

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("app.go");
    fs::write(&path, src).unwrap();

    let meta = pipeline("app.go", src, "run", "");
    assert_matches!(meta.main_func_position, None);

    goat::emit(&path, "run", "").unwrap();
    let rewritten = fs::read_to_string(&path).unwrap();

    assert!(rewritten.contains("func run(options *Options) error {"));
    assert!(rewritten.contains("func main() {"));
    assert!(rewritten.ends_with("}\n"));
}

#[test]
fn scan_error_for_missing_run_function() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("app.go");
    fs::write(&path, "package main\n\nfunc helper() {}\n").unwrap();

    let err = goat::scan(&path, "run", "").unwrap_err();
    assert!(err.to_string().contains("run function `run` not found"));
}

#[test]
fn scan_error_for_missing_file() {
    let err = goat::scan(std::path::Path::new("does/not/exist.go"), "run", "").unwrap_err();
    assert!(err.to_string().contains("cannot read"));
}

#[test]
fn init_scaffold_round_trips_through_scan() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("newcmd.go");

    goat::scaffold::init_file(&path).unwrap();
    let meta = goat::scan(&path, "run", "NewOptions").unwrap();

    assert_eq!(meta.name, "newcmd");
    assert_eq!(meta.options.len(), 2);
    assert_eq!(
        meta.option("Name").unwrap().default,
        Some(DefaultValue::Str("world".into()))
    );

    // Refuses to overwrite.
    assert!(goat::scaffold::init_file(&path).is_err());

    // And the scaffold itself can be emitted over.
    goat::emit(&path, "run", "NewOptions").unwrap();
    let rewritten = fs::read_to_string(&path).unwrap();
    assert!(rewritten.contains("flag.Parse()"));
}

#[test]
fn options_and_initializer_in_sibling_files_degrade_gracefully() {
    // The options struct may live in a sibling; the interpreter only walks
    // the target file, so defaults stay unset but analysis succeeds.
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("main.go");
    let sibling = dir.path().join("options.go");

    fs::write(
        &target,
        "package main\n\nfunc run(options *Options) error {\n\treturn nil\n}\n",
    )
    .unwrap();
    fs::write(
        &sibling,
        "package main\n\ntype Options struct {\n\t// Verbose turns on chatty logs.\n\tVerbose bool\n}\n",
    )
    .unwrap();

    let meta = goat::scan(&target, "run", "").unwrap();
    assert_eq!(meta.options.len(), 1);
    assert_eq!(meta.options[0].cli_name, "verbose");
    assert_eq!(meta.name, dir.path().file_name().unwrap().to_string_lossy());
}
