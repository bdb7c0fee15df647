//! pylite CLI: tokenize, parse, check and run off-side-rule programs.

use clap::{Parser as ClapParser, Subcommand};
use pylite_cli::colors::{green, red};
use pylite_cli::commands::{self, Settings, Status};
use pylite_cli::config::{PyliteConfig, CONFIG_FILE};
use pylite_cli::CliError;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(ClapParser)]
#[command(name = "pylite", version, about = "Off-side rule front end and interpreter")]
struct Cli {
    /// Log compiler and interpreter activity at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Indentation width of a tab (overrides pylite.toml)
    #[arg(long, global = true, value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..))]
    tab_width: Option<usize>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the token stream of a source file
    Tokens {
        /// Source file, or `-` for stdin
        file: PathBuf,
        /// Keep comments and whitespace
        #[arg(long)]
        lossless: bool,
        /// Print tokens as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the syntax tree as JSON
    Parse {
        /// Source file, or `-` for stdin
        file: PathBuf,
        /// Single-line JSON
        #[arg(long)]
        compact: bool,
    },
    /// Report syntax errors without running
    Check {
        /// Source file, or `-` for stdin
        file: PathBuf,
    },
    /// Parse and run a program
    Run {
        /// Source file, or `-` for stdin
        file: PathBuf,
    },
    /// Create a pylite.toml config file in the current directory
    Init,
}

fn init_logging(verbose: bool) {
    let default = if verbose { "pylite=debug" } else { "pylite=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match dispatch(cli) {
        Ok(status) => std::process::exit(status.exit_code()),
        Err(e) => {
            eprintln!("{} {}", red("error:"), e);
            std::process::exit(1);
        }
    }
}

fn load_settings(tab_width: Option<usize>) -> Result<Settings, CliError> {
    let config = match PyliteConfig::load()? {
        Some((path, config)) => {
            tracing::debug!(path = %path.display(), "loaded config");
            config
        }
        None => PyliteConfig::default(),
    };
    Ok(Settings::resolve(&config, tab_width))
}

fn dispatch(cli: Cli) -> Result<Status, CliError> {
    let stdout = std::io::stdout();
    let stderr = std::io::stderr();
    let mut out = stdout.lock();
    let mut err = stderr.lock();

    match cli.command {
        Commands::Tokens { file, lossless, json } => {
            let settings = load_settings(cli.tab_width)?;
            let source = commands::read_source(&file, &settings)?;
            commands::tokens(&source, &settings, lossless, json, &mut out)
        }
        Commands::Parse { file, compact } => {
            let settings = load_settings(cli.tab_width)?;
            let source = commands::read_source(&file, &settings)?;
            commands::parse(&source, &settings, compact, &mut out, &mut err)
        }
        Commands::Check { file } => {
            let settings = load_settings(cli.tab_width)?;
            let source = commands::read_source(&file, &settings)?;
            commands::check(&source, &settings, &mut out, &mut err)
        }
        Commands::Run { file } => {
            let settings = load_settings(cli.tab_width)?;
            let source = commands::read_source(&file, &settings)?;
            commands::run(&source, &settings, &mut out, &mut err)
        }
        Commands::Init => cmd_init(),
    }
}

fn cmd_init() -> Result<Status, CliError> {
    let path = PathBuf::from(CONFIG_FILE);
    if path.exists() {
        eprintln!("{} {} already exists, not overwriting", red("error:"), CONFIG_FILE);
        return Ok(Status::Failed);
    }
    std::fs::write(&path, PyliteConfig::default_template())?;
    println!("{} {}", green("Created"), CONFIG_FILE);
    Ok(Status::Success)
}
