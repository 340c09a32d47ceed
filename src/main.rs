mod build;
mod commands;
mod core;
mod discovery;
mod graph;
mod report;
mod ui;
mod utils;

use clap::{Args, Parser, Subcommand};
use commands::ChangeSource;
use core::config::{ConfigOverrides, KbcConfig};
use core::context::RunContext;
use core::error::{KbcError, KbcResult, print_error};
use std::path::PathBuf;

/// Build only the kustomizations a change affects
#[derive(Parser)]
#[command(name = "kbc")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
#[command(styles = get_styles())]
struct Cli {
  #[command(flatten)]
  global: GlobalArgs,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Args)]
struct GlobalArgs {
  /// Directory scanned for kustomizations (default: config root_dir, then ".")
  #[arg(long, global = true)]
  root_dir: Option<PathBuf>,

  /// Log level: trace, debug, info, warn, error (default: LOG_LEVEL, RUST_LOG, info)
  #[arg(long, global = true)]
  log_level: Option<String>,
}

/// Which changes to analyze
#[derive(Args)]
struct RangeArgs {
  /// Git ref to compare against (default: HEAD~1)
  #[arg(long)]
  base: Option<String>,
  /// Git ref with the changes (default: HEAD)
  #[arg(long)]
  head: Option<String>,
  /// Changed files, instead of asking git
  #[arg(long, num_args = 1.., conflicts_with_all = ["base", "head"])]
  files: Vec<PathBuf>,
}

impl RangeArgs {
  fn source(&mut self) -> ChangeSource {
    if self.files.is_empty() {
      ChangeSource::Git
    } else {
      ChangeSource::Files(std::mem::take(&mut self.files))
    }
  }
}

/// How kustomize is run
#[derive(Args)]
struct BuildArgs {
  /// Pass --enable-helm to kustomize
  #[arg(long, value_name = "BOOL")]
  enable_helm: Option<bool>,
  /// Exit non-zero when any build fails
  #[arg(long, value_name = "BOOL")]
  fail_on_error: Option<bool>,
  /// Per-build timeout in seconds
  #[arg(long, value_name = "SECS")]
  timeout: Option<u64>,
  /// kustomize executable
  #[arg(long, value_name = "PATH")]
  kustomize: Option<String>,
}

impl BuildArgs {
  fn apply_to(&self, overrides: &mut ConfigOverrides) {
    overrides.enable_helm = self.enable_helm;
    overrides.fail_on_error = self.fail_on_error;
    overrides.timeout_secs = self.timeout;
    overrides.kustomize_bin = self.kustomize.clone();
  }
}

#[derive(Subcommand)]
enum Commands {
  /// Show which kustomizations are affected by changes
  Affected {
    #[command(flatten)]
    range: RangeArgs,
    /// Output format: text (default), json, names-only
    #[arg(long, default_value = "text")]
    format: String,
  },

  /// Run kustomize build for affected kustomizations
  Build {
    #[command(flatten)]
    range: RangeArgs,
    #[command(flatten)]
    build: BuildArgs,
    /// Build every discovered kustomization
    #[arg(long, conflicts_with_all = ["base", "head", "files"])]
    all: bool,
    /// Show the kustomize commands without running them
    #[arg(long)]
    dry_run: bool,
    /// Output format: text (default), json
    #[arg(long, default_value = "text")]
    format: String,
  },

  /// Show the kustomization dependency graph
  Graph {
    /// Output format: text (default), dot, json
    #[arg(long, default_value = "text")]
    format: String,
  },

  /// GitHub Action mode: detect, build and report (reads INPUT_* variables)
  Run {
    /// Git ref to compare against (overrides INPUT_BASE-REF)
    #[arg(long)]
    base: Option<String>,
    #[command(flatten)]
    build: BuildArgs,
  },
}

impl Commands {
  fn overrides(&self, global: &GlobalArgs) -> ConfigOverrides {
    let mut overrides = ConfigOverrides {
      root_dir: global.root_dir.clone(),
      ..Default::default()
    };

    match self {
      Commands::Affected { range, .. } => {
        overrides.base_ref = range.base.clone();
        overrides.head_ref = range.head.clone();
      }
      Commands::Build { range, build, .. } => {
        overrides.base_ref = range.base.clone();
        overrides.head_ref = range.head.clone();
        build.apply_to(&mut overrides);
      }
      Commands::Run { base, build } => {
        overrides.base_ref = base.clone();
        build.apply_to(&mut overrides);
      }
      Commands::Graph { .. } => {}
    }
    overrides
  }
}

fn get_styles() -> clap::builder::Styles {
  clap::builder::Styles::styled()
    .usage(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Yellow))),
    )
    .header(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Yellow))),
    )
    .literal(anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Green))))
    .invalid(
      anstyle::Style::new()
        .bold()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Red))),
    )
    .error(
      anstyle::Style::new()
        .bold()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Red))),
    )
    .valid(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Green))),
    )
    .placeholder(anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::White))))
}

/// Map a LOG_LEVEL style name to a filter directive; unknown names mean info
fn level_directive(level: &str) -> &'static str {
  match level.trim().to_ascii_uppercase().as_str() {
    "TRACE" => "trace",
    "DEBUG" => "debug",
    "WARN" | "WARNING" => "warn",
    "ERROR" => "error",
    _ => "info",
  }
}

/// Logs go to stderr; stdout is reserved for command output
fn init_logging(cli_level: Option<&str>) {
  use tracing_subscriber::EnvFilter;

  let env_level = std::env::var("LOG_LEVEL").ok().filter(|v| !v.trim().is_empty());
  let filter = match cli_level.map(str::to_string).or(env_level) {
    Some(level) => EnvFilter::new(level_directive(&level)),
    None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
  };

  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .with_target(false)
    .init();
}

/// Defaults, then kbc.toml, then INPUT_* variables, then flags
fn resolve_config(work_dir: &std::path::Path, overrides: ConfigOverrides) -> KbcResult<KbcConfig> {
  let mut config = KbcConfig::load(work_dir)?;
  config.apply_env()?;
  config.apply_overrides(overrides);
  tracing::debug!(?config, "Resolved configuration");
  Ok(config)
}

fn run(cli: Cli) -> KbcResult<()> {
  let work_dir =
    std::env::current_dir().map_err(|e| KbcError::message(format!("Failed to get current directory: {}", e)))?;

  let Cli { global, mut command } = cli;
  let config = resolve_config(&work_dir, command.overrides(&global))?;

  // Discovery and graph are built once and shared by every command
  let ctx = RunContext::build(&work_dir, config)?;

  match &mut command {
    Commands::Affected { range, format } => commands::run_affected(&ctx, range.source(), format.clone()),
    Commands::Build {
      range,
      all,
      dry_run,
      format,
      ..
    } => commands::run_build(&ctx, range.source(), *all, *dry_run, format.clone()),
    Commands::Graph { format } => commands::run_graph(&ctx, format.clone()),
    Commands::Run { .. } => commands::run_action(&ctx),
  }
}

fn main() {
  let cli = Cli::parse();
  init_logging(cli.global.log_level.as_deref());

  if let Err(err) = run(cli) {
    handle_error(err);
  }
}

fn handle_error(err: KbcError) -> ! {
  print_error(&err);
  std::process::exit(err.exit_code().as_i32());
}
