//! `driver` command line
use crate::report::{JsonReportSink, ReportSink};
use crate::{score, DriverError, Runner, ScenarioRegistry};
use clap::{Parser, Subcommand};
use std::future::Future;
use std::io::{self, Write};
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
#[allow(unused)]
use tracing::{debug, error, info, trace, warn};

const DEFAULT_REPORTS_DIR: &str = "reports";

/// Drive a failure-pattern scenario against its target and score the result.
#[derive(Parser, Debug)]
#[command(name = "driver", version)]
pub struct Cli {
    /// JSON file with an alternate scenario set (defaults to the built-in cases)
    #[arg(short, long, global = true)]
    pub scenarios: Option<PathBuf>,

    /// Directory reports are written to
    #[arg(short, long, global = true, default_value = DEFAULT_REPORTS_DIR)]
    pub reports_dir: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Command {
    /// Run a scenario and generate report
    Run {
        /// Name of the scenario, see `driver list`
        scenario: Option<String>,
    },
    /// List available scenarios
    List,
}

impl Cli {
    pub fn registry(&self) -> Result<ScenarioRegistry, DriverError> {
        match &self.scenarios {
            Some(path) => ScenarioRegistry::from_json_file(path),
            None => Ok(ScenarioRegistry::builtin()),
        }
    }
}

/// Execute the parsed command. Any error is meant to end the process with exit code 1.
pub async fn execute(cli: Cli, out: &mut (impl Write + Send)) -> Result<(), DriverError> {
    let registry = cli.registry()?;

    match cli.command {
        Command::List => list(&registry, out),
        Command::Run { scenario: None } => Err(DriverError::MissingScenario {
            available: registry.names().into_iter().map(String::from).collect(),
        }),
        Command::Run {
            scenario: Some(name),
        } => {
            let token = CancellationToken::new();
            cancel_on_ctrl_c(token.clone());

            let sink = JsonReportSink::new(cli.reports_dir);
            run_scenario(&registry, &name, &sink, token, out).await
        }
    }
}

pub fn list(registry: &ScenarioRegistry, out: &mut impl Write) -> Result<(), DriverError> {
    for scenario in registry.iter() {
        writeln!(out, "  {:<12} {}", scenario.name, scenario.description)?;
    }
    Ok(())
}

/// Run one scenario end to end: load, score, report.
pub async fn run_scenario(
    registry: &ScenarioRegistry,
    name: &str,
    sink: &impl ReportSink,
    token: CancellationToken,
    out: &mut (impl Write + Send),
) -> Result<(), DriverError> {
    let scenario = registry.get(name)?;
    let mut runner = Runner::new(scenario.run_config())?;

    writeln!(out, "==> Running scenario: {}", scenario.name)?;
    writeln!(out, "    {}", scenario.description)?;
    writeln!(
        out,
        "    Target: {} | RPS: {} | Duration: {}",
        scenario.target_url,
        scenario.rps,
        humantime::format_duration(scenario.duration)
    )?;
    for (label, url) in scenario.observation_urls() {
        writeln!(out, "    Observe {label}: {url}")?;
    }
    writeln!(out)?;
    out.flush()?;

    let mut data = runner.run(token).await;

    let (points, line) = score(&data, scenario);
    data.set_score(points, line.clone());
    writeln!(out, "{line}")?;
    writeln!(out)?;

    let path = sink.write(&data)?;
    writeln!(out, "==> Report: {}", path.display())?;

    Ok(())
}

/// Exit status after a forced quit (128 + SIGINT).
const INTERRUPTED_EXIT_CODE: i32 = 130;

fn cancel_on_ctrl_c(token: CancellationToken) {
    tokio::spawn(async move {
        if watch_interrupts(token, tokio::signal::ctrl_c).await {
            std::process::exit(INTERRUPTED_EXIT_CODE);
        }
    });
}

/// The first interrupt cancels `token`; returns `true` once a second one arrives.
///
/// Returns `false` without acting if listening for interrupts fails.
async fn watch_interrupts<F, Fut>(token: CancellationToken, mut interrupted: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = io::Result<()>>,
{
    if let Err(err) = interrupted().await {
        warn!("Cannot listen for Ctrl-C: {err}");
        return false;
    }
    warn!("Interrupted; draining in-flight requests (press Ctrl-C again to quit)");
    token.cancel();

    if let Err(err) = interrupted().await {
        warn!("Cannot listen for Ctrl-C: {err}");
        return false;
    }
    warn!("Interrupted again; quitting without a report");
    true
}
