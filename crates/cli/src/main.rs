//! uitour CLI - Main Entry Point
//!
//! Runs walkthrough scenarios against a live CMS through Playwright and
//! reports one test case per scenario.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use tracing::{debug, info};
use uitour_e2e::config::BrowserKind;
use uitour_e2e::{HarnessConfig, PlaywrightLauncher, Scenario, SuiteRunner};

mod output;

use output::OutputFormat;

/// uitour - scripted UI walkthroughs with pass/fail reporting
#[derive(Parser)]
#[command(name = "uitour")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Configuration file
    #[arg(long, env = "UITOUR_CONFIG", default_value = "uitour.toml", global = true)]
    config: PathBuf,

    /// Output format
    #[arg(long, default_value = "table", global = true)]
    format: OutputFormat,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run scenarios and report the results
    Run(RunArgs),

    /// List the scenarios that would run
    List(SelectArgs),

    /// Parse and validate scenario files
    Validate {
        /// Scenario files to check
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Write a configuration file with the defaults
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[derive(Args)]
struct SelectArgs {
    /// Directory of scenario files (defaults to the configured one)
    #[arg(long)]
    scenarios: Option<PathBuf>,

    /// Only the scenario with this name
    #[arg(long)]
    name: Option<String>,

    /// Only scenarios carrying this tag
    #[arg(long)]
    tag: Option<String>,

    /// Use the built-in scenarios instead of a directory
    #[arg(long)]
    builtin: bool,
}

#[derive(Args)]
struct RunArgs {
    #[command(flatten)]
    select: SelectArgs,

    /// URL opened when a scenario starts
    #[arg(long, env = "UITOUR_BASE_URL")]
    base_url: Option<String>,

    /// Browser engine (chromium, firefox, webkit)
    #[arg(long)]
    browser: Option<BrowserKind>,

    /// Show the browser window
    #[arg(long)]
    headed: bool,

    /// Don't record frames
    #[arg(long)]
    no_record: bool,

    /// Skip the HTTP probe of the base URL
    #[arg(long)]
    no_probe: bool,

    /// Directory for reports and walkthrough pages
    #[arg(long)]
    output: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_target(false)
        .init();

    match execute(cli).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            output::print_error(&format!("{:#}", e));
            ExitCode::from(2)
        }
    }
}

/// Returns whether everything that ran passed
async fn execute(cli: Cli) -> anyhow::Result<bool> {
    let mut config = HarnessConfig::load(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;
    debug!("Configuration: {:?}", config);

    match cli.command {
        Commands::Run(args) => {
            apply_overrides(&mut config, &args)?;
            let scenarios = select(&config, &args.select)?;
            if scenarios.is_empty() {
                bail!("no scenarios selected");
            }

            let launcher = PlaywrightLauncher::new(config.browser.clone());
            let suite = SuiteRunner::new(launcher, config);
            let result = suite.run_all(&scenarios).await;
            result
                .write_json(&suite.output_dir())
                .context("writing test results")?;

            output::print_suite(&result, cli.format);
            Ok(result.success())
        }
        Commands::List(args) => {
            let scenarios = select(&config, &args)?;
            output::print_scenarios(&scenarios, cli.format);
            Ok(true)
        }
        Commands::Validate { files } => Ok(validate(&files)),
        Commands::Init { force } => {
            if cli.config.exists() && !force {
                bail!("{} already exists (use --force to overwrite)", cli.config.display());
            }
            config.save(&cli.config)?;
            output::print_success(&format!("Wrote {}", cli.config.display()));
            Ok(true)
        }
    }
}

/// Apply command-line overrides and re-validate the result
fn apply_overrides(config: &mut HarnessConfig, args: &RunArgs) -> anyhow::Result<()> {
    if let Some(url) = &args.base_url {
        config.base_url = url.clone();
    }
    if let Some(kind) = args.browser {
        config.browser.kind = kind;
    }
    if args.headed {
        config.browser.headless = false;
    }
    if args.no_record {
        config.recording.enabled = false;
    }
    if args.no_probe {
        config.probe_target = false;
    }
    if let Some(dir) = &args.output {
        config.output_dir = dir.clone();
    }
    config.validate().context("invalid configuration")?;
    Ok(())
}

/// Load scenarios from the directory (or the built-ins) and apply filters
fn select(config: &HarnessConfig, args: &SelectArgs) -> anyhow::Result<Vec<Scenario>> {
    let dir = args.scenarios.as_deref().unwrap_or(&config.scenarios_dir);
    let mut scenarios = if args.builtin || (args.scenarios.is_none() && !dir.exists()) {
        info!("Using built-in scenarios");
        Scenario::builtin()?
    } else {
        load_dir(dir)?
    };

    if let Some(tag) = &args.tag {
        scenarios = Scenario::filter_by_tag(&scenarios, tag)
            .into_iter()
            .cloned()
            .collect();
    }
    if let Some(name) = &args.name {
        scenarios.retain(|s| &s.name == name);
        if scenarios.is_empty() {
            bail!("no scenario named '{}'", name);
        }
    }
    Ok(scenarios)
}

fn load_dir(dir: &Path) -> anyhow::Result<Vec<Scenario>> {
    Scenario::load_all(dir).with_context(|| format!("loading scenarios from {}", dir.display()))
}

fn validate(files: &[PathBuf]) -> bool {
    let mut ok = true;
    for file in files {
        match Scenario::from_file(file) {
            Ok(scenario) => output::print_success(&format!(
                "{}: {} ({} steps, {} assertions)",
                file.display(),
                scenario.name,
                scenario.steps.len(),
                scenario.planned_assertions
            )),
            Err(e) => {
                output::print_error(&format!("{}: {}", file.display(), e));
                ok = false;
            }
        }
    }
    ok
}
