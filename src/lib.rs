//! Turn a plain Go command-line program into a full CLI by static analysis
//! and code generation.
//!
//! `goat` reads one Go source file, extracts an intent specification from a
//! user-written `Options` struct and its initializer, and synthesizes (or
//! overwrites) the file's `main()` with flag parsing, environment-variable
//! binding, required/enum validation and a baked help message.
//!
//! # Example
//!
//! Given a target file like:
//!
//! ```go
//! package main
//!
//! import (
//!     "context"
//!
//!     "example.com/cli/goat"
//! )
//!
//! type Options struct {
//!     // Name is who to greet.
//!     Name string
//!     // Port is the port to listen on.
//!     Port int `env:"PORT"`
//! }
//!
//! func NewOptions() *Options {
//!     return &Options{
//!         Name: goat.Default("world"),
//!         Port: goat.Default(8080),
//!     }
//! }
//!
//! func run(ctx context.Context, options *Options) error { ... }
//!
//! func main() {} // replaced by `goat emit`
//! ```
//!
//! `goat emit --initializer NewOptions greet.go` replaces `main` with a
//! generated function that constructs the options, binds `PORT`, registers
//! `--name` and `--port`, parses, validates, and dispatches to `run`. Flags
//! win over environment variables, which win over initializer defaults.
//!
//! The pipeline is a straight-line chain, each stage usable on its own:
//!
//! * [`loader`] parses the target and its package siblings,
//! * [`analyzer`] derives [`CommandMetadata`] from the run function and the
//!   `Options` struct,
//! * [`interp`] evaluates the initializer's composite literal for defaults,
//!   enum constraints and file constraints,
//! * [`help`] renders the help message,
//! * [`generate`] emits the new `main`,
//! * [`rewrite`] splices it into the file and organizes imports.
//!
//! The marker functions (`Default`, `Enum`, `File`) are runtime no-ops in
//! the analyzed program; only their syntactic occurrence carries meaning
//! here, and only a closed expression grammar is recognized. This crate
//! never compiles or evaluates user code.

pub mod analyzer;
pub mod ast;
mod error;
pub mod generate;
pub mod help;
pub mod interp;
pub mod loader;
pub mod metadata;
pub mod parser;
pub mod rewrite;
pub mod scaffold;
pub mod source;
pub mod token;

use std::path::Path;

pub use crate::error::Error;
pub use crate::metadata::{CommandMetadata, DefaultValue, OptionSpec};

use crate::analyzer::Analysis;
use crate::loader::Package;

/// Runs stages S1–S3 and returns the command metadata (`goat scan`).
pub fn scan(path: &Path, run_name: &str, initializer: &str) -> Result<CommandMetadata, Error> {
    let (_, analysis) = analyze_path(path, run_name, initializer)?;
    Ok(analysis.metadata)
}

/// Runs stages S1–S4 and returns the help message (`goat help-message`).
pub fn help_message(path: &Path, run_name: &str, initializer: &str) -> Result<String, Error> {
    let (_, analysis) = analyze_path(path, run_name, initializer)?;
    Ok(help::help_message(&analysis.metadata))
}

/// Runs the whole pipeline and rewrites the target file (`goat emit`).
pub fn emit(path: &Path, run_name: &str, initializer: &str) -> Result<(), Error> {
    let (pkg, analysis) = analyze_path(path, run_name, initializer)?;

    let help_text = help::help_message(&analysis.metadata);
    let generated = generate::generate_main(&analysis.metadata, &help_text);

    let span = main_span(&pkg, &analysis);
    rewrite::rewrite_file(path, pkg.target_source().text(), span, &generated)
}

fn analyze_path(
    path: &Path,
    run_name: &str,
    initializer: &str,
) -> Result<(Package, Analysis), Error> {
    let pkg = loader::load(path)?;

    let init = if initializer.is_empty() {
        None
    } else {
        Some(initializer)
    };
    let mut analysis = analyzer::analyze(&pkg, run_name, init)?;
    interp::interpret(&pkg, &mut analysis);

    Ok((pkg, analysis))
}

/// The line span of the original `main`, doc comment included. The recorded
/// offset picks the declaration; any top-level `main` is accepted as a
/// fallback.
fn main_span(pkg: &Package, analysis: &Analysis) -> Option<(u32, u32)> {
    let pos = analysis.metadata.main_func_position.as_ref()?;
    let target = pkg.target_file();

    let decl = target
        .funcs
        .iter()
        .filter(|f| f.recv.is_none() && f.name == "main")
        .find(|f| f.offset == pos.offset)
        .or_else(|| target.find_func("main"))?;

    Some((decl.start_line(), decl.end_line))
}
