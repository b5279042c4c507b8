use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use kastle_foundry::{
    MappingSchema, NamespaceTable, ProcessingOutcome, Processor, BASIC_MAPPING, DEFAULT_PREFIX,
    FULL_MAPPING,
};
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{info, warn, Level};

/// Kastle Foundry
/// Converts CSV, XML and Excel records to Turtle based on a mapping schema
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output for detailed processing information
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Write logs to this file instead of stderr
    #[arg(long, global = true, value_name = "LOG FILE PATH")]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Map a data file to Turtle fragments
    Process {
        /// Path to the mapping schema (YAML or JSON)
        #[arg(short, long, value_name = "PATH TO MAPPING")]
        mapping: PathBuf,

        /// Path to the CSV, XML or Excel data file
        #[arg(short, long, value_name = "PATH TO DATA")]
        data: PathBuf,

        /// Output directory for generated Turtle files
        #[arg(
            short,
            long,
            default_value = "output",
            value_name = "OUTPUT DIRECTORY PATH"
        )]
        output: PathBuf,

        /// Base namespace for minted resources, e.g. http://stko-kwg.geog.ucsb.edu/
        #[arg(long, value_name = "URI")]
        namespace: String,

        /// Prefix for the resource and ontology namespaces
        #[arg(long, default_value = DEFAULT_PREFIX)]
        prefix: String,
    },
    /// Check that every name in a mapping resolves
    Validate {
        /// Path to the mapping schema to validate
        #[arg(short, long, value_name = "PATH TO MAPPING")]
        mapping: PathBuf,

        /// Base namespace for minted resources
        #[arg(long, value_name = "URI")]
        namespace: String,

        /// Prefix for the resource and ontology namespaces
        #[arg(long, default_value = DEFAULT_PREFIX)]
        prefix: String,
    },
    /// Generate a mapping template
    GenerateMapping {
        /// Type of mapping template to generate (basic/full)
        #[arg(short = 't', long = "type", default_value = "basic")]
        template_type: String,

        /// Output path for the generated mapping
        #[arg(short, long, default_value = "mapping.yaml", value_name = "OUTPUT PATH")]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::WARN };
    init_logging(level, cli.log_file.as_deref())?;

    info!("Kastle Foundry starting up...");

    match &cli.command {
        Commands::Process {
            mapping,
            data,
            output,
            namespace,
            prefix,
        } => process_command(mapping, data, output, namespace, prefix).await,
        Commands::Validate {
            mapping,
            namespace,
            prefix,
        } => validate_command(mapping, namespace, prefix),
        Commands::GenerateMapping {
            template_type,
            output,
        } => generate_mapping_command(template_type, output),
    }
}

fn init_logging(level: Level, log_file: Option<&Path>) -> Result<()> {
    let builder = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false);

    match log_file {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create log file: {}", path.display()))?;
            builder
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
        }
        None => builder.with_writer(std::io::stderr).init(),
    }
    Ok(())
}

fn load_mapping(mapping_path: &Path, namespace: &str, prefix: &str) -> Result<(MappingSchema, NamespaceTable)> {
    if !mapping_path.exists() {
        anyhow::bail!(
            "Mapping file not found: {}. Try using --mapping <PATH TO MAPPING>",
            mapping_path.display()
        );
    }

    let namespaces = NamespaceTable::new(namespace, prefix)
        .context("Failed to build namespace table")?;

    info!("Loading mapping from {}", mapping_path.display());
    let schema = MappingSchema::from_file(mapping_path)
        .context("Failed to load mapping. See errors for additional details:")?;

    schema
        .validate(&namespaces)
        .context("Failed to validate mapping")?;

    Ok((schema, namespaces))
}

async fn process_command(
    mapping_path: &Path,
    data_path: &Path,
    output: &Path,
    namespace: &str,
    prefix: &str,
) -> Result<()> {
    if !data_path.exists() {
        anyhow::bail!("Data file not found: {}", data_path.display());
    }

    let (schema, namespaces) = load_mapping(mapping_path, namespace, prefix)?;

    info!("Initializing processor...");
    let mut processor = Processor::new(schema, namespaces, output);

    let outcome = processor
        .process(data_path)
        .await
        .with_context(|| format!("Failed to process {}", data_path.display()))?;

    match outcome {
        ProcessingOutcome::Success => info!("Processing completed successfully"),
        ProcessingOutcome::SuccessWithWarnings(warnings) => {
            warn!("Processing completed with {} warnings", warnings.len());
        }
    }
    Ok(())
}

fn validate_command(mapping_path: &Path, namespace: &str, prefix: &str) -> Result<()> {
    info!("Validating mapping...");
    let (schema, _) = load_mapping(mapping_path, namespace, prefix)?;
    info!(
        "Mapping validation successful ({} vocabulary blocks)",
        schema.cvs.len()
    );
    Ok(())
}

fn generate_mapping_command(template_type: &str, output: &Path) -> Result<()> {
    let template_content = match template_type.to_lowercase().as_str() {
        "basic" => BASIC_MAPPING,
        "full" => FULL_MAPPING,
        _ => anyhow::bail!("Invalid template type. Must be either 'basic' or 'full'"),
    };

    info!("Generating {} mapping template...", template_type);

    // if output is a directory, append the default file name
    let full_file_output_path = if output.is_dir() {
        output.join("mapping.yaml")
    } else {
        output.to_path_buf()
    };

    fs::write(&full_file_output_path, template_content).with_context(|| {
        format!("Failed to write mapping to: {}", full_file_output_path.display())
    })?;

    info!(
        "Successfully generated mapping template at: {}",
        full_file_output_path.display()
    );
    Ok(())
}
