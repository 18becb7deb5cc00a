//! The `goat` command-line front-end.

use std::path::PathBuf;
use std::process::exit;

use clap::error::ErrorKind;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "goat",
    version,
    about = "Turn a plain Go command-line program into a full CLI",
    disable_help_subcommand = true
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Rewrite the target file's main() with generated CLI code
    Emit(Target),
    /// Print the extracted command metadata as JSON
    Scan(Target),
    /// Print the help message the generated CLI will carry
    HelpMessage(Target),
    /// Write a starter file to grow a CLI from
    Init {
        /// Path of the file to create
        file: PathBuf,
    },
}

#[derive(Args)]
struct Target {
    /// Name of the run function
    #[arg(long, default_value = "run")]
    run: String,

    /// Name of the options-initializer function; empty skips interpretation
    #[arg(long, default_value = "")]
    initializer: String,

    /// Target Go source file
    file: PathBuf,
}

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let code = match err.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
                _ => 1,
            };
            let _ = err.print();
            exit(code);
        }
    };

    if let Err(err) = run(cli) {
        eprintln!("goat: {}", err);
        exit(1);
    }
}

fn run(cli: Cli) -> Result<(), goat::Error> {
    match cli.command {
        Command::Emit(t) => goat::emit(&t.file, &t.run, &t.initializer),
        Command::Scan(t) => {
            let metadata = goat::scan(&t.file, &t.run, &t.initializer)?;
            let json = serde_json::to_string_pretty(&metadata)
                .map_err(|e| goat::Error::generation(e.to_string()))?;
            println!("{}", json);
            Ok(())
        }
        Command::HelpMessage(t) => {
            let message = goat::help_message(&t.file, &t.run, &t.initializer)?;
            print!("{}", message);
            Ok(())
        }
        Command::Init { file } => goat::scaffold::init_file(&file),
    }
}
