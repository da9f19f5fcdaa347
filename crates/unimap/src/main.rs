use std::path::{Path, PathBuf};
use std::process;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use unimap_core::config::{Config, CONFIG_FILE};
use unimap_core::pipeline::AnalysisPipeline;
use unimap_core::types::ProjectModel;

use unimap_csharp::CSharpAnalyzer;
use unimap_report::{dot, json, text};

#[derive(Parser)]
#[command(name = "unimap")]
#[command(about = "Map the structure and directory dependencies of a Unity C# project")]
#[command(version)]
struct Cli {
    /// Print debug logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a project and emit its structural model
    Analyze {
        /// Path to the Unity project root or its Assets directory
        path: PathBuf,
        /// Write the report to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Report format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,
        /// Emit single-line JSON
        #[arg(long)]
        compact: bool,
        /// Config file path (defaults to .unimap.toml in the project or an ancestor)
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Reuse cached results for unchanged files
        #[arg(long)]
        incremental: bool,
    },
    /// Create a default .unimap.toml configuration file
    Init {
        /// Overwrite existing config
        #[arg(long)]
        force: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Json,
    Text,
    Dot,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Analyze {
            path,
            output,
            format,
            compact,
            config,
            incremental,
        } => cmd_analyze(
            &path,
            output.as_deref(),
            format,
            compact,
            config.as_deref(),
            incremental,
        ),
        Commands::Init { force } => cmd_init(force),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(2);
    }
}

/// Log to stderr; `RUST_LOG` takes precedence over `--verbose`.
fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn cmd_analyze(
    path: &Path,
    output: Option<&Path>,
    format: OutputFormat,
    compact: bool,
    config_path: Option<&Path>,
    incremental: bool,
) -> Result<()> {
    let config = load_config(path, config_path)?;
    let project = run_analysis(path, config, incremental)?;

    let report = match format {
        OutputFormat::Json => json::format_report(&project, compact),
        OutputFormat::Text => text::format_report(&project),
        OutputFormat::Dot => dot::generate_directory_diagram(&project),
    };

    match output {
        Some(out_path) => {
            if let Some(parent) = out_path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create {}", parent.display()))?;
            }
            std::fs::write(out_path, report)
                .with_context(|| format!("failed to write {}", out_path.display()))?;
            tracing::info!("Output written to: {}", out_path.display());
        }
        None => print!("{report}"),
    }
    Ok(())
}

fn cmd_init(force: bool) -> Result<()> {
    let target = PathBuf::from(CONFIG_FILE);
    if target.exists() && !force {
        anyhow::bail!("{CONFIG_FILE} already exists. Use --force to overwrite.");
    }
    std::fs::write(&target, Config::default_toml())?;
    println!("Created {CONFIG_FILE} with default configuration.");
    Ok(())
}

fn load_config(project_path: &Path, config_path: Option<&Path>) -> Result<Config> {
    match config_path {
        Some(p) => Config::load(p),
        None => Ok(Config::load_or_default(project_path)),
    }
}

fn run_analysis(project_path: &Path, config: Config, incremental: bool) -> Result<ProjectModel> {
    let analyzer = CSharpAnalyzer::new().context("failed to initialize C# analyzer")?;
    let pipeline = AnalysisPipeline::new(Box::new(analyzer), config);

    tracing::info!("Analyzing: {}", project_path.display());
    let project = if incremental {
        pipeline.analyze_incremental(project_path)?
    } else {
        pipeline.analyze(project_path)?
    };

    tracing::info!(
        "Found {} C# files, {} types in {} directories.",
        project.total_files,
        project.total_types,
        project.directories.len()
    );
    Ok(project)
}
