use clap::{Parser, Subcommand};
use stagehand::commands::{self, PlanOptions};
use stagehand::core::error::{StagehandError, print_error};
use std::path::PathBuf;

/// Deployment planner: resolve versioned service graphs and gate staged
/// rollouts across environments
#[derive(Parser)]
#[command(name = "stagehand")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
#[command(styles = get_styles())]
struct Cli {
  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Resolve the deployment graph and render deployment artifacts
  Plan {
    /// Location of the service definitions
    #[arg(short = 's', long)]
    service_defs: PathBuf,
    /// Application definition file
    #[arg(short = 'A', long, conflicts_with = "application_defs")]
    application: Option<PathBuf>,
    /// Location of the application definitions
    #[arg(short = 'a', long)]
    application_defs: Option<PathBuf>,
    /// Environment definition file
    #[arg(short = 'E', long, conflicts_with = "environment_defs")]
    environment: Option<PathBuf>,
    /// Location of the environment definitions
    #[arg(short = 'e', long)]
    environment_defs: Option<PathBuf>,
    /// Location of the release plan documents (enables rollout gating)
    #[arg(short = 'r', long)]
    release_plans: Option<PathBuf>,
    /// Output directory, defaults to the current dir
    #[arg(short = 'o', long, default_value = ".")]
    output: PathBuf,
    /// Output format
    #[arg(short = 'f', long, default_value = "kustomize")]
    output_format: String,
  },

  /// Inspect release plans and apply rollout transitions
  #[command(subcommand)]
  Release(ReleaseCommands),
}

#[derive(Subcommand)]
enum ReleaseCommands {
  /// Show the state of all persisted release plans
  Status {
    /// Location of the release plan documents
    #[arg(short = 'r', long)]
    release_plans: PathBuf,
    /// Only show plans for this service
    #[arg(long)]
    service: Option<String>,
    /// Output results in JSON format
    #[arg(long)]
    json: bool,
  },

  /// Apply one status change to an (environment, service, version)
  Transition {
    /// Location of the release plan documents
    #[arg(short = 'r', long)]
    release_plans: PathBuf,
    /// Environment the change applies to
    #[arg(long)]
    environment: String,
    /// Service name
    #[arg(long)]
    service: String,
    /// Version tag
    #[arg(long)]
    version: String,
    /// Target status: started, finished, failed, aborted, skipped
    #[arg(long)]
    status: String,
  },
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

fn main() {
  env_logger::init();
  let cli = Cli::parse();

  let result = match cli.command {
    Commands::Plan {
      service_defs,
      application,
      application_defs,
      environment,
      environment_defs,
      release_plans,
      output,
      output_format,
    } => commands::run_plan(&PlanOptions {
      service_defs,
      application,
      application_defs,
      environment,
      environment_defs,
      release_plans,
      output,
      output_format,
    }),

    Commands::Release(release_cmd) => match release_cmd {
      ReleaseCommands::Status {
        release_plans,
        service,
        json,
      } => commands::run_release_status(&release_plans, service.as_deref(), json),
      ReleaseCommands::Transition {
        release_plans,
        environment,
        service,
        version,
        status,
      } => commands::run_release_transition(&release_plans, &environment, &service, &version, &status),
    },
  };

  if let Err(err) = result {
    handle_error(err);
  }
}

fn handle_error(err: StagehandError) -> ! {
  print_error(&err);
  std::process::exit(err.exit_code().as_i32());
}
