use clap::{CommandFactory, Parser};
use deadexport::{Config, GoLoader, ReportFormat, Reporter, UnusedExportFinder};
use miette::Result;
use std::io::IsTerminal;
use std::path::PathBuf;
use tracing::info;

/// deadexport - find exported Go declarations no caller references
#[derive(Parser, Debug)]
#[command(name = "deadexport")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Packages where unused exported declarations are looked for
    /// (can be specified multiple times)
    #[arg(short, long, value_name = "PATTERN")]
    input: Vec<String>,

    /// Packages that call the input packages (can be specified multiple times)
    #[arg(short, long, value_name = "PATTERN")]
    external: Vec<String>,

    /// Module root, the directory holding go.mod
    #[arg(short = 'C', long, default_value = ".")]
    root: PathBuf,

    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "terminal")]
    format: OutputFormat,

    /// Output file
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Print the declaration kind next to each name
    #[arg(long)]
    show_kind: bool,

    /// Run independent packages in parallel
    #[arg(long)]
    parallel: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Quiet mode - only output results
    #[arg(short, long)]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Debug, Default)]
enum OutputFormat {
    #[default]
    Terminal,
    Json,
}

impl From<OutputFormat> for ReportFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Terminal => ReportFormat::Terminal,
            OutputFormat::Json => ReportFormat::Json,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose, cli.quiet);

    info!("deadexport v{}", env!("CARGO_PKG_VERSION"));

    let config = load_config(&cli)?;

    if config.input.is_empty() {
        Cli::command()
            .error(
                clap::error::ErrorKind::MissingRequiredArgument,
                "at least one --input <PATTERN> is required",
            )
            .exit();
    }

    run(&config, &cli)
}

fn init_logging(verbose: bool, quiet: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = if quiet {
        EnvFilter::new("error")
    } else if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = if let Some(config_path) = &cli.config {
        Config::from_file(config_path)?
    } else {
        Config::from_default_locations(&cli.root)?
    };

    // CLI patterns extend the configured ones
    config.input.extend(cli.input.iter().cloned());
    config.external.extend(cli.external.iter().cloned());
    config.parallel |= cli.parallel;

    Ok(config)
}

fn run(config: &Config, cli: &Cli) -> Result<()> {
    if !std::io::stdout().is_terminal() {
        colored::control::set_override(false);
    }

    let loader = GoLoader::new(&cli.root, config.loader.clone())?;
    let finder = UnusedExportFinder::new(config.clone());
    let unused = finder.run(&loader, &config.input, &config.external)?;

    let reporter = Reporter::new(cli.format.clone().into(), cli.output.clone()).with_kind(cli.show_kind);
    reporter.report(&unused)?;

    Ok(())
}
