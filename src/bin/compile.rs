//! Schema Compile CLI
//!
//! Compiles module schemas into their structured-output form, checks whole
//! directories of schemas, and prints generation request bodies.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use narrative_schemas::config::OutputFormat;
use narrative_schemas::{compile_value, Compiled, ModuleRef, Schema, SchemaConfig, StructuredOutputRequest};
use serde_json::Value;
use tracing_subscriber::EnvFilter;
use walkdir::WalkDir;

#[derive(Parser)]
#[command(name = "schema-compile")]
#[command(about = "Prepare module schemas for structured-output generation")]
struct Cli {
    /// Configuration file
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile one schema and print the result
    Compile {
        /// Schema file (JSON)
        file: PathBuf,
        /// Output file (stdout if omitted)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Report which schemas can be used for generation
    Check {
        /// Schema files or directories
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },

    /// Print the generation request body for a module schema
    Request {
        /// Module reference (namespace:name@vX.Y.Z)
        #[arg(short, long)]
        module: String,
        /// Module description
        #[arg(short, long)]
        description: Option<String>,
        /// User prompt
        #[arg(short, long, default_value = "Generate the module content.")]
        prompt: String,
        /// Schema file (JSON)
        file: PathBuf,
    },

    /// Decode a module reference
    Module {
        /// Module reference (namespace:name@vX.Y.Z)
        reference: String,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Returns whether every schema involved is usable
fn run(cli: Cli) -> Result<bool> {
    let config = SchemaConfig::load_from(cli.config.as_deref()).context("loading configuration")?;
    let format = config.output.format;

    match cli.command {
        Commands::Compile { file, out } => match compile_value(read_json(&file)?)? {
            Compiled::Supported(schema) => {
                write_output(out.as_deref(), &format.render(&schema)?)?;
                Ok(true)
            }
            Compiled::Unsupported => {
                eprintln!("❌ {} cannot be used for AI generation", file.display());
                Ok(false)
            }
        },

        Commands::Check { paths } => {
            let mut supported = 0usize;
            let mut unsupported = 0usize;

            for path in &paths {
                for entry in WalkDir::new(path).sort_by_file_name() {
                    let entry = entry?;
                    if !entry.file_type().is_file() || !config.check.matches(entry.path()) {
                        continue;
                    }

                    if compile_value(read_json(entry.path())?)?.is_supported() {
                        supported += 1;
                        println!("  ✅ {}", entry.path().display());
                    } else {
                        unsupported += 1;
                        println!("  ❌ {} - cannot be used for AI generation", entry.path().display());
                        if config.check.fail_fast {
                            return Ok(false);
                        }
                    }
                }
            }

            println!();
            println!("{} supported, {} unsupported", supported, unsupported);
            Ok(unsupported == 0)
        }

        Commands::Request {
            module,
            description,
            prompt,
            file,
        } => {
            let module = ModuleRef::parse(&module)?;
            let schema = Schema::from_value(read_json(&file)?)?;
            let request = StructuredOutputRequest::for_module(
                &module,
                description,
                schema,
                prompt,
                &config.generation,
            )?;
            println!("{}", format.render(&request)?);
            Ok(true)
        }

        Commands::Module { reference } => {
            let module = ModuleRef::parse(&reference)?;
            let decoded = serde_json::json!({
                "namespace": module.namespace,
                "module": module.module,
                "version": module.version,
                "preversion": module.preversion,
                "semver": module.semver()?.to_string(),
            });
            println!("{}", OutputFormat::Pretty.render(&decoded)?);
            Ok(true)
        }
    }
}

fn read_json(path: &Path) -> Result<Value> {
    let source = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&source).with_context(|| format!("parsing {}", path.display()))
}

fn write_output(out: Option<&Path>, content: &str) -> Result<()> {
    match out {
        Some(path) => {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(path, content)?;
            println!("✅ Compiled schema written to {:?}", path);
        }
        None => println!("{}", content),
    }
    Ok(())
}
