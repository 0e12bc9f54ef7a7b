mod cmd;
pub mod error;

use std::{
    fmt,
    io::{self, Write as _},
    process::ExitCode,
};

use camino::{Utf8Path, Utf8PathBuf};
use clap::{ArgAction, Parser};
use cmd::{Commands, Success};
use error::Result;
use parley_config::Config;
use tracing::{debug, trace};

/// A small web chat relay for generative-language models.
#[derive(Parser)]
#[command(name = "parley", author, version, about, long_about = None)]
pub struct Cli {
    #[command(flatten, next_help_heading = "Global Options")]
    globals: Globals,

    #[command(subcommand, next_help_heading = "Options")]
    command: Commands,
}

#[derive(Debug, clap::Args)]
pub struct Globals {
    /// Override a configuration value for the duration of the command.
    #[arg(short, long, value_name = "KEY=VALUE", global = true, action = ArgAction::Append)]
    config: Vec<String>,

    /// Configuration file to load instead of `parley.toml`.
    #[arg(long, value_name = "PATH", global = true)]
    config_file: Option<Utf8PathBuf>,

    /// Increase verbosity of logging.
    ///
    /// Can be specified multiple times to increase verbosity.
    ///
    /// Defaults to printing "error" messages. For each increase in verbosity,
    /// the log level is set to "warn", "info", "debug", and "trace"
    /// respectively.
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    /// Suppress all output, including errors.
    #[arg(short, long, global = true)]
    quiet: bool,
}

impl fmt::Display for Cli {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entry(&"config", &self.globals.config)
            .entry(&"config_file", &self.globals.config_file)
            .entry(&"verbose", &self.globals.verbose)
            .entry(&"quiet", &self.globals.quiet)
            .finish()
    }
}

pub async fn run() -> ExitCode {
    let cli = Cli::parse();
    let quiet = cli.globals.quiet;

    configure_logging(cli.globals.verbose, quiet);
    trace!(command = cli.command.name(), arguments = %cli, "Starting CLI run.");

    match run_inner(cli).await {
        Ok(Success::Ok) => ExitCode::SUCCESS,
        Ok(Success::Message(message)) => {
            // Nothing sensible is left to do if stdout is gone.
            writeln!(io::stdout(), "{message}").ok();
            ExitCode::SUCCESS
        }
        Err(error) => {
            if !quiet {
                writeln!(io::stderr(), "{error}").ok();
            }
            ExitCode::FAILURE
        }
    }
}

async fn run_inner(cli: Cli) -> Result<Success> {
    match cli.command {
        Commands::Format(args) => args.run(),
        cmd => {
            let config = load_config(&cli.globals)?;
            cmd.run(&config).await
        }
    }
}

/// Load the configuration from all layers.
fn load_config(globals: &Globals) -> Result<Config> {
    let file = match &globals.config_file {
        Some(path) => Some(path.clone()),
        None => {
            let cwd = Utf8PathBuf::try_from(std::env::current_dir()?)?;
            parley_config::find_file(&cwd)
        }
    };

    if let Some(path) = &file {
        debug!(%path, "Using configuration file.");
    }

    let overrides = globals
        .config
        .iter()
        .map(|field| parley_config::parse_override(field))
        .collect::<std::result::Result<Vec<_>, _>>()?;
    trace!(overrides = ?overrides, "Applying CLI config overrides.");

    let envs = std::env::vars_os().filter_map(|(key, value)| {
        Some((key.into_string().ok()?, value.into_string().ok()?))
    });

    parley_config::build(file.as_deref(), envs, &overrides).map_err(Into::into)
}

/// Read `path`, or stdin when absent.
fn read_input(path: Option<&Utf8Path>) -> Result<String> {
    match path {
        Some(path) => std::fs::read_to_string(path).map_err(Into::into),
        None => io::read_to_string(io::stdin()).map_err(Into::into),
    }
}

fn configure_logging(verbose: u8, quiet: bool) {
    use tracing::level_filters::LevelFilter;
    use tracing_subscriber::fmt;

    let mut level = match verbose {
        0 => LevelFilter::ERROR,
        1 => LevelFilter::WARN,
        2 => LevelFilter::INFO,
        3 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };

    if quiet {
        level = LevelFilter::OFF;
    }

    let mut filter = vec!["off".to_owned()];
    for krate in [
        "cli",
        "client",
        "config",
        "conversation",
        "format",
        "gemini",
        "relay",
    ] {
        filter.push(format!("parley_{krate}={level}"));
    }
    filter.push(format!("tower_http={level}"));

    let format = fmt::format().with_target(false).compact();

    if level < LevelFilter::DEBUG {
        tracing_subscriber::fmt()
            .event_format(format)
            .without_time()
            .with_ansi(true)
            .with_target(false)
            .with_writer(io::stderr)
            .with_env_filter(filter.join(","))
            .init();
    } else {
        tracing_subscriber::fmt()
            .event_format(format)
            .with_ansi(true)
            .with_target(false)
            .with_writer(io::stderr)
            .with_env_filter(filter.join(","))
            .init();
    }
}
