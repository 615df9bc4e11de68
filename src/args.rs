//! These structs provide the CLI interface for the costguard CLI.

use crate::model::Window;
use clap::{Parser, Subcommand};
use std::convert::Infallible;
use std::fmt::{Display, Formatter};
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::error;
use tracing_subscriber::filter::LevelFilter;

/// costguard: cloud cost observability from the command line.
///
/// The program answers three questions about your cloud bill: where is the
/// money going, what changed recently, and what can be turned off. It can run
/// as an HTTP API server backing a dashboard, or produce the same numbers
/// directly in your terminal.
///
/// Without a configured upstream cost API it serves a deterministic built-in
/// demo dataset, so every command works out of the box after `costguard init`.
#[derive(Debug, Parser, Clone)]
pub struct Args {
    #[clap(flatten)]
    common: Common,

    #[command(subcommand)]
    command: Command,
}

impl Args {
    pub fn new(common: Common, command: Command) -> Self {
        Self { common, command }
    }

    pub fn common(&self) -> &Common {
        &self.common
    }

    pub fn command(&self) -> &Command {
        &self.command
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Create the data directory and initialize the configuration file.
    ///
    /// This is the first command you should run. Decide what directory you
    /// want configuration stored in and pass it as --costguard-home (by
    /// default it will be $HOME/costguard). If you have an upstream cost API,
    /// pass its base URL as --upstream-url; otherwise the built-in demo
    /// dataset is served.
    Init(InitArgs),
    /// Run the HTTP API server.
    Serve,
    /// Show the services whose spend moved the most.
    Movers(MoversArgs),
    /// Show total spend, trend KPIs and the per-product breakdown.
    Summary(SummaryArgs),
    /// Run the findings analysis: underutilized compute, orphaned resources,
    /// idle load balancers and cost anomalies.
    Analyze(AnalyzeArgs),
    /// Show everything known about one resource.
    Resource(ResourceArgs),
}

/// Arguments common to all subcommands.
#[derive(Debug, Parser, Clone)]
pub struct Common {
    /// The logging verbosity. One of, from least to most verbose:
    /// off, error, warn, info, debug, trace
    ///
    /// This can be overridden by RUST_LOG.
    #[arg(long, default_value_t = LevelFilter::INFO)]
    log_level: LevelFilter,

    /// The directory where costguard configuration is held. Defaults to
    /// ~/costguard
    #[arg(long, env = "COSTGUARD_HOME", default_value_t = default_costguard_home())]
    costguard_home: DisplayPath,
}

impl Common {
    pub fn new(log_level: LevelFilter, costguard_home: PathBuf) -> Self {
        Self {
            log_level,
            costguard_home: costguard_home.into(),
        }
    }

    pub fn log_level(&self) -> LevelFilter {
        self.log_level
    }

    pub fn costguard_home(&self) -> &DisplayPath {
        &self.costguard_home
    }
}

#[derive(Debug, Parser, Clone)]
pub struct InitArgs {
    /// Base URL of the upstream cost API, e.g.
    /// https://cost-api.internal.example.com
    #[arg(long)]
    upstream_url: Option<String>,
}

impl InitArgs {
    pub fn new(upstream_url: Option<String>) -> Self {
        Self { upstream_url }
    }

    pub fn upstream_url(&self) -> Option<&str> {
        self.upstream_url.as_deref()
    }
}

#[derive(Debug, Parser, Clone)]
pub struct MoversArgs {
    /// The trailing window to analyze, e.g. 7d, 30d, 90d. Defaults to the
    /// configured default window.
    #[arg(long)]
    window: Option<Window>,

    /// Maximum number of movers to show.
    #[arg(long)]
    limit: Option<usize>,
}

impl MoversArgs {
    pub fn window(&self) -> Option<Window> {
        self.window
    }

    pub fn limit(&self) -> Option<usize> {
        self.limit
    }
}

#[derive(Debug, Parser, Clone)]
pub struct SummaryArgs {
    /// The trailing window to summarize, e.g. 7d, 30d, 90d.
    #[arg(long)]
    window: Option<Window>,
}

impl SummaryArgs {
    pub fn window(&self) -> Option<Window> {
        self.window
    }
}

#[derive(Debug, Parser, Clone)]
pub struct AnalyzeArgs {
    /// Write a Markdown report to this path instead of printing findings.
    #[arg(long)]
    out: Option<PathBuf>,

    /// Also write the findings as CSV to this path.
    #[arg(long)]
    csv: Option<PathBuf>,
}

impl AnalyzeArgs {
    pub fn out(&self) -> Option<&Path> {
        self.out.as_deref()
    }

    pub fn csv(&self) -> Option<&Path> {
        self.csv.as_deref()
    }
}

#[derive(Debug, Parser, Clone)]
pub struct ResourceArgs {
    /// The resource id, e.g. i-0123456789abcdef0
    id: String,
}

impl ResourceArgs {
    pub fn id(&self) -> &str {
        &self.id
    }
}

fn default_costguard_home() -> DisplayPath {
    DisplayPath(match dirs::home_dir() {
        Some(home) => home.join("costguard"),
        None => {
            error!(
                "There was an error when trying to get your home directory. You can get around \
                this by providing --costguard-home or COSTGUARD_HOME instead of relying on the \
                default costguard home directory. If you continue using the program right now, \
                you may have problems!",
            );
            PathBuf::from("costguard")
        }
    })
}

#[derive(Debug, Default, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct DisplayPath(PathBuf);

impl From<PathBuf> for DisplayPath {
    fn from(value: PathBuf) -> Self {
        DisplayPath(value)
    }
}

impl Deref for DisplayPath {
    type Target = Path;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<Path> for DisplayPath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl Display for DisplayPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_string_lossy())
    }
}

impl FromStr for DisplayPath {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(PathBuf::from(s)))
    }
}

impl DisplayPath {
    pub fn new(path: PathBuf) -> Self {
        Self(path)
    }

    pub fn path(&self) -> &Path {
        &self.0
    }
}
