use std::io::{self, Read};

use catalog_core::{
    PatchOutcome,
    cli::{
        self, CheckOptions, CheckResult, CliError, CompileQueryOptions, FlattenOptions,
        PatchOptions,
    },
};
use clap::{Parser as ClapParser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(ClapParser)]
#[command(name = "catalog")]
#[command(about = "Catalog - FIQL filters, store queries and document patches")]
#[command(version)]
struct Cli {
    /// Log compilation and patch steps to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate a FIQL filter against a JSON document (prints true or false)
    Check {
        /// The FIQL filter
        filter: String,

        /// JSON document (reads from stdin if not provided)
        #[arg(short, long)]
        input: Option<String>,

        /// Scope every selector under this path, e.g. Doc
        #[arg(long)]
        prefix: Option<String>,

        /// Only validate syntax, don't evaluate
        #[arg(long)]
        syntax_only: bool,
    },

    /// Compile a FIQL filter to a store query
    Compile {
        /// The FIQL filter
        filter: String,

        /// Scope every selector under this path, e.g. Doc
        #[arg(long)]
        prefix: Option<String>,

        /// Pretty-print the output
        #[arg(short, long)]
        pretty: bool,
    },

    /// Apply a JSON patch (array of operations) to a document
    Patch {
        /// JSON array of operations
        patch: String,

        /// JSON document (reads from stdin if not provided)
        #[arg(short, long)]
        input: Option<String>,

        /// Pretty-print the output
        #[arg(short, long)]
        pretty: bool,
    },

    /// Flatten a document into a dot-path map
    Flatten {
        /// JSON document (reads from stdin if not provided)
        #[arg(short, long)]
        input: Option<String>,

        /// Re-nest a flat map instead
        #[arg(long)]
        unflatten: bool,

        /// Pretty-print the output
        #[arg(short, long)]
        pretty: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose { "catalog_core=debug" } else { "catalog_core=warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(level.parse().expect("static directive")),
        )
        .with_writer(io::stderr)
        .init();

    let result = match cli.command {
        Commands::Check {
            filter,
            input,
            prefix,
            syntax_only,
        } => run_check(filter, input, prefix, syntax_only),
        Commands::Compile {
            filter,
            prefix,
            pretty,
        } => run_compile(filter, prefix, pretty),
        Commands::Patch {
            patch,
            input,
            pretty,
        } => run_patch(patch, input, pretty),
        Commands::Flatten {
            input,
            unflatten,
            pretty,
        } => run_flatten(input, unflatten, pretty),
    };

    if let Err(e) = result {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}

/// Use `--input` when given, otherwise piped stdin.
fn resolve_input(input: Option<String>) -> Result<Option<String>, CliError> {
    match input {
        Some(s) => Ok(Some(s)),
        None if !atty::is(atty::Stream::Stdin) => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            Ok(Some(buffer))
        }
        None => Ok(None),
    }
}

fn print_json(value: &serde_json::Value, pretty: bool) -> Result<(), CliError> {
    let json = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }?;
    println!("{}", json);
    Ok(())
}

fn run_check(
    filter: String,
    input: Option<String>,
    prefix: Option<String>,
    syntax_only: bool,
) -> Result<(), CliError> {
    let input = if syntax_only { None } else { resolve_input(input)? };

    let options = CheckOptions {
        filter,
        prefix,
        input,
        syntax_only,
    };

    match cli::execute_check(&options)? {
        CheckResult::SyntaxValid(normalized) => println!("Syntax is valid: {}", normalized),
        CheckResult::Evaluated(matched) => println!("{}", matched),
    }
    Ok(())
}

fn run_compile(filter: String, prefix: Option<String>, pretty: bool) -> Result<(), CliError> {
    let options = CompileQueryOptions { filter, prefix };
    print_json(&cli::execute_compile(&options)?, pretty)
}

fn run_patch(patch: String, input: Option<String>, pretty: bool) -> Result<(), CliError> {
    let options = PatchOptions {
        patch,
        input: resolve_input(input)?,
    };

    match cli::execute_patch(&options)? {
        PatchOutcome::Applied(document) => print_json(&document.into(), pretty),
        PatchOutcome::TestFailed { index } => {
            eprintln!("test operation {} failed, patch not applied", index);
            std::process::exit(2);
        }
    }
}

fn run_flatten(input: Option<String>, unflatten: bool, pretty: bool) -> Result<(), CliError> {
    let options = FlattenOptions {
        input: resolve_input(input)?,
        unflatten,
    };
    print_json(&cli::execute_flatten(&options)?, pretty)
}
