//! Pipeline error type.

use std::error::Error as StdError;
use std::fmt;
use std::path::{Path, PathBuf};

/// Represents an error encountered while analyzing or rewriting a target file.
#[derive(Debug)]
pub struct Error {
    kind: ErrorKind,
}

#[derive(Debug)]
enum ErrorKind {
    Input {
        path: PathBuf,
        err: String,
    },
    Parse {
        file: String,
        line: u32,
        message: String,
    },
    RunFunctionNotFound(String),
    OptionsTypeNotFound(String),
    DuplicateCliName {
        cli_name: String,
        field: String,
    },
    Generation(String),
    Write {
        path: PathBuf,
        err: String,
    },
}

impl Error {
    /// Returns an error for a target or sibling file that could not be read.
    pub fn input(path: &Path, err: std::io::Error) -> Error {
        Error {
            kind: ErrorKind::Input {
                path: path.to_owned(),
                err: err.to_string(),
            },
        }
    }

    /// Returns an error for a file that could not be parsed.
    pub fn parse(file: &str, line: u32, message: String) -> Error {
        Error {
            kind: ErrorKind::Parse {
                file: file.to_owned(),
                line,
                message,
            },
        }
    }

    /// Returns an error for a run function that does not exist in the target file.
    pub fn run_function_not_found(name: &str) -> Error {
        Error {
            kind: ErrorKind::RunFunctionNotFound(name.to_owned()),
        }
    }

    /// Returns an error for an options struct type that could not be resolved.
    pub fn options_type_not_found(name: &str) -> Error {
        Error {
            kind: ErrorKind::OptionsTypeNotFound(name.to_owned()),
        }
    }

    /// Returns an error for two struct fields mapping to the same CLI name.
    pub fn duplicate_cli_name(cli_name: &str, field: &str) -> Error {
        Error {
            kind: ErrorKind::DuplicateCliName {
                cli_name: cli_name.to_owned(),
                field: field.to_owned(),
            },
        }
    }

    /// Returns an error for generated source that does not parse back.
    pub fn generation(message: String) -> Error {
        Error {
            kind: ErrorKind::Generation(message),
        }
    }

    /// Returns an error for a failed write of the rewritten file.
    pub fn write(path: &Path, err: std::io::Error) -> Error {
        Error {
            kind: ErrorKind::Write {
                path: path.to_owned(),
                err: err.to_string(),
            },
        }
    }

}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use self::ErrorKind::*;

        match &self.kind {
            Input { path, err } => write!(f, "cannot read `{}`: {}", path.display(), err),
            Parse {
                file,
                line,
                message,
            } => write!(f, "{}:{}: {}", file, line, message),
            RunFunctionNotFound(name) => {
                write!(f, "run function `{}` not found in target file", name)
            }
            OptionsTypeNotFound(name) => {
                write!(f, "options struct type `{}` not found in package", name)
            }
            DuplicateCliName { cli_name, field } => write!(
                f,
                "field `{}` maps to flag name `--{}`, which is already taken",
                field, cli_name
            ),
            Generation(message) => write!(f, "generated source is invalid: {}", message),
            Write { path, err } => write!(f, "cannot write `{}`: {}", path.display(), err),
        }
    }
}

impl StdError for Error {}
