//! schema-openapi CLI
//!
//! Command-line access to the OpenAPI normalizer and the component pruning
//! pass, for JSON Schema files and generated OpenAPI documents.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use serde_json::Value;
use tracing_subscriber::EnvFilter;

use schema_openapi::{
    load_json, load_json_auto, normalize, openapi_version, prune, used_schema_names,
    OpenApiVersion,
};

#[derive(Parser)]
#[command(name = "schema-openapi")]
#[command(about = "Normalize JSON Schemas for OpenAPI and prune unused components")]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rewrite a JSON Schema for an OpenAPI dialect
    Normalize {
        /// Schema file
        schema: PathBuf,

        /// Target OpenAPI version (3.0 or 3.1)
        #[arg(long, value_parser = parse_version)]
        openapi: OpenApiVersion,

        /// Output file (stdout if not specified)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// Remove unreferenced entries from components.schemas
    Prune {
        /// OpenAPI document: file path or URL (http:// or https://)
        document: String,

        /// Output file (stdout if not specified)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// List the component schemas a document uses
    Refs {
        /// OpenAPI document: file path or URL (http:// or https://)
        document: String,

        /// Output results as JSON (for automation)
        #[arg(long)]
        json: bool,

        /// Exit with status 1 if any component schema is unused
        #[arg(long)]
        check: bool,
    },
}

fn parse_version(s: &str) -> Result<OpenApiVersion, String> {
    OpenApiVersion::from_version_str(s)
        .ok_or_else(|| format!("unsupported OpenAPI version '{}' (expected 3.0 or 3.1)", s))
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Normalize {
            schema,
            openapi,
            output,
            pretty,
        } => run_normalize(&schema, openapi, output, pretty),

        Commands::Prune {
            document,
            output,
            pretty,
        } => run_prune(&document, output, pretty),

        Commands::Refs {
            document,
            json,
            check,
        } => run_refs(&document, json, check),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(code) => ExitCode::from(code),
    }
}

fn run_normalize(
    schema_path: &std::path::Path,
    version: OpenApiVersion,
    output: Option<PathBuf>,
    pretty: bool,
) -> Result<(), u8> {
    let schema = load_json(schema_path).map_err(|e| {
        eprintln!("Error: {}", e);
        e.exit_code() as u8
    })?;

    let normalized = normalize(&schema, version);
    write_output(&normalized, output, pretty)
}

fn run_prune(source: &str, output: Option<PathBuf>, pretty: bool) -> Result<(), u8> {
    let document = load_document(source)?;
    let pruned = prune(&document);
    write_output(&pruned, output, pretty)
}

fn run_refs(source: &str, json_output: bool, check: bool) -> Result<(), u8> {
    let document = load_document(source)?;

    let used = used_schema_names(&document);
    let unused: Vec<&String> = document
        .pointer("/components/schemas")
        .and_then(Value::as_object)
        .map(|schemas| schemas.keys().filter(|name| !used.contains(*name)).collect())
        .unwrap_or_default();

    if json_output {
        let report = serde_json::json!({
            "used": used,
            "unused": unused,
        });
        println!("{}", report);
    } else {
        for name in &used {
            println!("{}", name);
        }
        for name in &unused {
            eprintln!("unused: {}", name);
        }
    }

    if check && !unused.is_empty() {
        Err(1)
    } else {
        Ok(())
    }
}

/// Load an OpenAPI 3.x document, rejecting other dialects.
fn load_document(source: &str) -> Result<Value, u8> {
    let document = load_json_auto(source).map_err(|e| {
        eprintln!("Error: {}", e);
        e.exit_code() as u8
    })?;

    openapi_version(&document).map_err(|e| {
        eprintln!("Error: {}", e);
        2u8
    })?;

    Ok(document)
}

fn write_output(value: &Value, output: Option<PathBuf>, pretty: bool) -> Result<(), u8> {
    let json_output = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }
    .map_err(|e| {
        eprintln!("Error serializing output: {}", e);
        2u8
    })?;

    match output {
        Some(path) => {
            std::fs::write(&path, &json_output).map_err(|e| {
                eprintln!("Error writing to {}: {}", path.display(), e);
                3u8
            })?;
        }
        None => {
            println!("{}", json_output);
        }
    }

    Ok(())
}
