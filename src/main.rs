use std::io::Write;
use std::path::PathBuf;

use suitetrim::analysis::AnalysisPipeline;
use suitetrim::cli::{Cli, Commands, ConfigAction};
use suitetrim::config::{Config, ConfigValidator};
use suitetrim::error::{Result, SuiteTrimError};
use suitetrim::export::{self, ReportFormat};

fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse_args();

    // Initialize logging
    init_logging(cli.verbose);

    // Handle commands
    match cli.command {
        Commands::Analyze {
            input,
            output,
            format,
            clusters,
            threshold,
            no_pairs,
        } => {
            let overrides = AnalyzeOverrides {
                format,
                clusters,
                threshold,
                no_pairs,
            };
            cmd_analyze(cli.config, &input, output, overrides)?;
        }
        Commands::Config { action } => {
            cmd_config(cli.config, action)?;
        }
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default = if verbose {
        "suitetrim=debug"
    } else {
        "suitetrim=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    // Logs go to stderr so stdout stays a clean report
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Command-line values that take precedence over the config file
struct AnalyzeOverrides {
    format: Option<String>,
    clusters: Option<usize>,
    threshold: Option<f32>,
    no_pairs: bool,
}

fn cmd_analyze(
    config_path: Option<PathBuf>,
    input: &std::path::Path,
    output: Option<PathBuf>,
    overrides: AnalyzeOverrides,
) -> Result<()> {
    let mut config = load_config(config_path)?;

    if let Some(format) = overrides.format {
        config.output.format = format;
    }
    if let Some(k) = overrides.clusters {
        config.clustering.cluster_count = Some(k);
    }
    if let Some(threshold) = overrides.threshold {
        config.redundancy.similarity_threshold = threshold;
    }
    if overrides.no_pairs {
        config.output.include_pairs = false;
    }
    ConfigValidator::validate(&config)?;

    let format: ReportFormat = config.output.format.parse()?;
    let entries = export::load_test_cases(input)?;
    tracing::info!("Analyzing {} test cases from {}", entries.len(), input.display());

    let pipeline = AnalysisPipeline::new(&config)?;
    let report = pipeline.run_parsed(&entries);

    for error in &report.rejected {
        tracing::warn!("{}", error);
    }

    match output {
        Some(path) => {
            let file = std::fs::File::create(&path).map_err(|e| SuiteTrimError::Io {
                source: e,
                context: format!("Failed to create report file: {:?}", path),
            })?;
            let mut writer = std::io::BufWriter::new(file);
            export::write_report(&report, format, config.output.include_pairs, &mut writer)?;
            writer.flush().map_err(|e| SuiteTrimError::Io {
                source: e,
                context: format!("Failed to write report file: {:?}", path),
            })?;
            eprintln!("✓ Report written to {}", path.display());
        }
        None => {
            let stdout = std::io::stdout();
            let mut handle = stdout.lock();
            export::write_report(&report, format, config.output.include_pairs, &mut handle)?;
        }
    }

    Ok(())
}

fn cmd_config(config_path: Option<PathBuf>, action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let config = load_config(config_path)?;
            let rendered = toml::to_string_pretty(&config)?;
            println!("{}", rendered);
        }
        ConfigAction::Validate { file } => {
            let path = match file.or(config_path) {
                Some(path) => path,
                None => Config::default_path()?,
            };
            let config = Config::load(&path)?;
            println!("✓ Configuration is valid");
            println!("  Schema version: {}", config.meta.schema_version);
        }
        ConfigAction::Init { force } => {
            let path = match config_path {
                Some(path) => path,
                None => Config::default_path()?,
            };

            if path.exists() && !force {
                println!("Configuration file already exists at: {}", path.display());
                println!("Use --force to overwrite");
                return Ok(());
            }

            // Create parent directory
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).map_err(|e| SuiteTrimError::Io {
                    source: e,
                    context: format!("Failed to create config directory: {:?}", parent),
                })?;
            }

            Config::default().save(&path)?;

            println!("✓ Configuration initialized at: {}", path.display());
        }
    }

    Ok(())
}

fn load_config(config_path: Option<PathBuf>) -> Result<Config> {
    let path = match config_path {
        Some(path) => path,
        None => Config::default_path()?,
    };

    if !path.exists() {
        tracing::warn!(
            "Config file not found, using defaults. Run 'suitetrim config init' to create one."
        );
        let mut config = Config::default();
        config.apply_env_overrides();
        ConfigValidator::validate(&config)?;
        return Ok(config);
    }

    Config::load(&path)
}
