use std::{
    io::{self, Write},
    path::PathBuf,
    process::ExitCode,
};

use anyhow::{Context, Result};
use clap::Parser;
use log::{debug, error};
use packlet::{
    config::{Config, ConfigLayer},
    orchestrator::BundleOrchestrator,
    transform::Dialect,
};

/// Bundle a JavaScript module tree into a single self-loading script
#[derive(Debug, Parser)]
#[command(name = "packlet", version, about, long_about = None)]
struct Cli {
    /// Entry module, relative to the base directory
    #[arg(short, long)]
    entry: Option<String>,

    /// Write the bundle here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Additional configuration file, applied after packlet.toml
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory the entry is resolved against
    #[arg(long)]
    base_dir: Option<PathBuf>,

    /// Module syntax of the sources
    #[arg(long, value_enum)]
    dialect: Option<Dialect>,

    /// Precede each bundled module with a comment naming its file
    #[arg(long, overrides_with = "no_annotate")]
    annotate: bool,

    #[arg(long, overrides_with = "annotate", hide = true)]
    no_annotate: bool,

    /// Also write the module graph as JSON
    #[arg(long, value_name = "FILE")]
    emit_graph: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    /// Flags form the last configuration layer
    fn as_layer(&self) -> ConfigLayer {
        ConfigLayer {
            base_dir: self.base_dir.clone(),
            entry: self.entry.clone(),
            output: self.output.clone(),
            dialect: self.dialect,
            annotate: if self.annotate {
                Some(true)
            } else if self.no_annotate {
                Some(false)
            } else {
                None
            },
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

fn run(cli: &Cli) -> Result<()> {
    let cwd = std::env::current_dir().context("failed to determine the working directory")?;
    let mut config = Config::load(&cwd, cli.config.as_deref())?;
    config.apply(cli.as_layer());
    debug!("Effective configuration: {config:?}");

    let orchestrator = BundleOrchestrator::new(config, &cwd);
    let output = orchestrator.bundle()?;

    if let Some(path) = &cli.emit_graph {
        orchestrator.write_graph(&output, &cwd.join(path))?;
    }

    if orchestrator.write_output(&output)?.is_none() {
        let mut stdout = io::stdout().lock();
        stdout
            .write_all(output.code.as_bytes())
            .and_then(|()| stdout.flush())
            .context("failed to write bundle to stdout")?;
    }
    Ok(())
}
