// src/main.rs
//
// docx-tidy — collapse fragmented runs and text elements in Word XML
//
// - Input is either one XML part (e.g. an extracted word/document.xml) or an
//   unpacked document directory; for a directory every word/*.xml part is
//   tidied, all-or-nothing.
// - Cosmetic markup (proofing flags, language tags, font hints, empty run
//   properties) is removed first unless --no-remove is given; --remove
//   replaces the built-in set with custom patterns.
//
// CLI flags:
//   --no-remove          : keep cosmetic markup
//   --remove <PATTERN>   : remove matches of PATTERN instead (repeatable)
// Default: overwrite input. Log level via RUST_LOG (default: warn).

use clap::{ArgAction, Parser};
use docx_tidy::{tidy_document, tidy_part_file, RemovalConfig};
use miette::{IntoDiagnostic, Result};
use std::path::PathBuf;

/// CLI flags
#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    /// Keep proofing flags, language tags and other cosmetic markup
    #[arg(long = "no-remove", action = ArgAction::SetTrue, conflicts_with = "remove")]
    no_remove: bool,

    /// Remove markup matching this regular expression instead of the built-in set
    #[arg(long, value_name = "PATTERN")]
    remove: Vec<String>,

    /// Input XML part or unpacked document directory
    input: PathBuf,

    /// Output path (default: overwrite input)
    output: Option<PathBuf>,
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    // --no-remove wins; explicit patterns replace the defaults.
    let removal = if cli.no_remove {
        RemovalConfig::Disabled
    } else if !cli.remove.is_empty() {
        RemovalConfig::Patterns(cli.remove)
    } else {
        RemovalConfig::Default
    };

    let output = cli.output.as_deref();
    if cli.input.is_dir() {
        tidy_document(&cli.input, output, &removal).into_diagnostic()?;
    } else {
        tidy_part_file(&cli.input, output, &removal).into_diagnostic()?;
    }
    Ok(())
}
