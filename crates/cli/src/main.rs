use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use tally_cli::config::Config;
use tally_cli::{Output, run_demo, run_script};
use tally_ledger::{RulePolicy, TransferRules};
use tally_observability::LogFormat;

#[derive(Parser)]
#[command(name = "tally")]
#[command(about = "Record quantity transfers between containers and verify conservation")]
struct Cli {
    /// Transfer rules (overrides TALLY_POLICY)
    #[arg(long, global = true)]
    policy: Option<RulePolicy>,
    /// Unit printed after quantities (overrides TALLY_UNIT)
    #[arg(long, global = true)]
    unit: Option<String>,
    /// Log output format (overrides TALLY_LOG_FORMAT)
    #[arg(long, global = true)]
    log_format: Option<LogFormat>,
    /// Print the verification report as JSON
    #[arg(long, global = true)]
    json: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the built-in water tank walkthrough
    Demo,
    /// Record transfers from a script (`description | from | to | amount` per line)
    Run {
        /// Script file, or `-` for stdin
        script: PathBuf,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut config = Config::from_env();
    if let Some(policy) = cli.policy {
        config.policy = policy;
    }
    if let Some(unit) = cli.unit.clone() {
        config.unit = Some(unit);
    }
    if let Some(format) = cli.log_format {
        config.log_format = format;
    }

    tally_observability::init(config.log_format);
    for issue in &config.issues {
        tracing::warn!("ignoring invalid configuration: {issue}");
    }

    match run(&cli, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %format!("{e:#}"), "tally failed");
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli, config: &Config) -> Result<()> {
    let output = Output::from_config(config, cli.json);
    let rules = TransferRules::from_policy(config.policy);
    tracing::info!(policy = %config.policy, "starting");

    let mut stdout = io::stdout().lock();
    match &cli.command {
        Commands::Demo => run_demo(&mut stdout, rules, &output),
        Commands::Run { script } => {
            let source = read_script(script)?;
            run_script(&mut stdout, &source, rules, &output)
        }
    }
}

fn read_script(path: &Path) -> Result<String> {
    if path.as_os_str() == "-" {
        let mut source = String::new();
        io::stdin()
            .read_to_string(&mut source)
            .context("failed to read script from stdin")?;
        return Ok(source);
    }
    std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}
