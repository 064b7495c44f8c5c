mod loader;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use json_sample_gen_core::{GenerateOptions, SampleGenerator, Scenario, ScenarioConfig};
use serde_json::Value;
use std::fs;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::level_filters::LevelFilter;

#[derive(Parser)]
#[command(name = "json-sample-gen")]
#[command(about = "Generate sample JSON documents from a JSON Schema")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate one or more sample documents
    Generate {
        /// Input JSON Schema file
        schema: PathBuf,

        /// JSON Pointer selecting the root schema inside the file
        #[arg(long)]
        pointer: Option<String>,

        /// Scenario file (name, overrides, oneof-selectors, default-data)
        #[arg(long)]
        scenario: Option<PathBuf>,

        /// Number of documents; more than one prints a JSON array
        #[arg(short, long, default_value_t = 1)]
        count: usize,

        /// Seed for reproducible output
        #[arg(long)]
        seed: Option<u64>,

        /// Extra expansions of a self-referential ref before it becomes null
        #[arg(long, default_value_t = 1)]
        recursion_depth: usize,

        /// Element count for arrays without minItems
        #[arg(long, default_value_t = 1)]
        array_len: usize,

        /// Output file (defaults to stdout if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Pretty)]
        format: OutputFormat,
    },

    /// List every output path with the schema node that defines it
    Inspect {
        /// Input JSON Schema file
        schema: PathBuf,

        /// JSON Pointer selecting the root schema inside the file
        #[arg(long)]
        pointer: Option<String>,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Pretty)]
        format: OutputFormat,
    },
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
enum OutputFormat {
    Pretty,
    Compact,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so stdout stays clean for JSON
    let log_level = if cli.verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::WARN
    };
    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Generate {
            schema,
            pointer,
            scenario,
            count,
            seed,
            recursion_depth,
            array_len,
            output,
            format,
        } => {
            let schema = loader::load_schema(&schema, pointer.as_deref())?;
            let scenario = match scenario {
                Some(path) => load_scenario(&path)?,
                None => Scenario::default(),
            };

            let options = GenerateOptions {
                recursion_depth,
                default_array_len: array_len,
                seed,
                ..Default::default()
            };
            let generator = SampleGenerator::new(schema).with_options(options);

            let result = if count == 1 {
                generator.generate(Some(&scenario))
            } else {
                generator
                    .generate_many(count, Some(&scenario))
                    .map(Value::Array)
            }
            .map_err(|e| anyhow::Error::from(e).context("Generation failed"))?;

            write_json(&result, output.as_ref(), format)?;
        }
        Commands::Inspect {
            schema,
            pointer,
            format,
        } => {
            let schema = loader::load_schema(&schema, pointer.as_deref())?;
            let root = SampleGenerator::new(schema)
                .resolve()
                .map_err(|e| anyhow::Error::from(e).context("Resolution failed"))?;

            write_json(&root.describe(), None, format)?;
        }
    }

    Ok(())
}

fn load_scenario(path: &Path) -> Result<Scenario> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to open scenario file: {}", path.display()))?;
    let config = ScenarioConfig::from_json(&text)
        .with_context(|| format!("Failed to parse scenario from: {}", path.display()))?;
    config
        .into_scenario()
        .with_context(|| format!("Invalid scenario in: {}", path.display()))
}

fn write_json<T: serde::Serialize>(
    val: &T,
    path: Option<&PathBuf>,
    format: OutputFormat,
) -> Result<()> {
    let mut writer: Box<dyn Write> = if let Some(p) = path {
        let file = File::create(p)
            .with_context(|| format!("Failed to create output file: {}", p.display()))?;
        Box::new(BufWriter::new(file))
    } else {
        Box::new(BufWriter::new(io::stdout()))
    };

    match format {
        OutputFormat::Pretty => {
            serde_json::to_writer_pretty(&mut writer, val).context("Failed to write JSON")?;
        }
        OutputFormat::Compact => {
            serde_json::to_writer(&mut writer, val).context("Failed to write JSON")?;
        }
    }

    writeln!(writer).context("Failed to write trailing newline")?;
    writer.flush().context("Failed to flush output")?;

    Ok(())
}
