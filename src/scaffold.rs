//! Starter-file scaffolding for `goat init`.

use std::fs;
use std::io;
use std::path::Path;

use crate::error::Error;

/// Writes a starter Go file to grow a CLI from, refusing to overwrite.
pub fn init_file(path: &Path) -> Result<(), Error> {
    if path.exists() {
        let err = io::Error::new(io::ErrorKind::AlreadyExists, "file already exists");
        return Err(Error::write(path, err));
    }

    let name = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "app".to_owned());

    fs::write(path, starter_source(&name)).map_err(|e| Error::write(path, e))
}

/// The starter file: an `Options` struct with tags, an initializer using the
/// marker functions, a run function, and a placeholder `main` for `emit` to
/// replace.
pub fn starter_source(name: &str) -> String {
    format!(
        r#"package main

import (
	"context"
	"fmt"

	"example.com/cli/goat"
)

// Options holds the command-line configuration.
type Options struct {{
	// Name is who to greet.
	Name string
	// Port is the port to listen on.
	Port int `env:"PORT"`
}}

func NewOptions() *Options {{
	return &Options{{
		Name: goat.Default("world"),
		Port: goat.Default(8080),
	}}
}}

// run is the real entry point of {name}.
func run(ctx context.Context, options *Options) error {{
	fmt.Printf("hello %s on :%d\n", options.Name, options.Port)
	return nil
}}

func main() {{
	// Placeholder; `goat emit` rewrites this function.
	if err := run(context.Background(), NewOptions()); err != nil {{
		panic(err)
	}}
}}
"#,
        name = name
    )
}
