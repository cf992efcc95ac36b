//! Print the OpenAPI document, or write it to a file, as JSON or YAML.
#![cfg_attr(not(any(test, doctest)), deny(clippy::unwrap_used))]
#![cfg_attr(not(any(test, doctest)), deny(clippy::expect_used))]

use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use color_eyre::eyre::{Context, Result};
use rewear_backend::ApiDoc;
use utoipa::OpenApi;

/// Output encodings supported by the dump.
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
enum Format {
    #[default]
    Json,
    Yaml,
}

/// `openapi-dump` command arguments.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "openapi-dump",
    about = "Render the ReWear REST API as an OpenAPI document",
    version
)]
struct CliArgs {
    /// Document encoding.
    #[arg(long, value_enum, default_value_t = Format::Json)]
    format: Format,
    /// Destination file. Writes to stdout when omitted.
    #[arg(long, value_name = "path")]
    output: Option<PathBuf>,
}

fn render(format: Format) -> Result<String> {
    let document = ApiDoc::openapi();
    match format {
        Format::Json => document
            .to_pretty_json()
            .wrap_err("serialise OpenAPI document as JSON"),
        Format::Yaml => document
            .to_yaml()
            .wrap_err("serialise OpenAPI document as YAML"),
    }
}

fn main() -> Result<()> {
    color_eyre::install()?;
    let args = CliArgs::parse();
    let document = render(args.format)?;
    match args.output {
        Some(path) => fs::write(&path, format!("{document}\n"))
            .wrap_err_with(|| format!("write {}", path.display())),
        None => {
            let mut stdout = io::stdout().lock();
            writeln!(stdout, "{document}").wrap_err("write to stdout")
        }
    }
}
