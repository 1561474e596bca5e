//! Error types for stagehand with contextual messages and exit codes
//!
//! One unified error type categorizes everything that can go wrong in a
//! planning pass: input loading, dependency resolution, artifact export and
//! plain I/O. Resolution failures carry the offending service, range and
//! version sets so diagnostics can distinguish "nothing satisfies the
//! constraint" from "satisfying versions exist but are release-blocked".

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Exit codes for stagehand
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
  /// User error (bad manifests, invalid args, missing files)
  User = 1,
  /// System error (I/O)
  System = 2,
  /// Resolution failure (no usable version set exists)
  Resolution = 3,
}

impl ExitCode {
  /// Convert to i32 for process exit
  pub fn as_i32(self) -> i32 {
    self as i32
  }
}

/// Main error type for stagehand
#[derive(Debug)]
pub enum StagehandError {
  /// Input loading errors (catalogs, manifests)
  Input(InputError),

  /// Dependency resolution errors
  Resolve(ResolveError),

  /// Artifact export errors
  Export(ExportError),

  /// I/O errors
  Io(io::Error),

  /// Generic error with message and optional context
  Message {
    message: String,
    context: Option<String>,
    help: Option<String>,
  },
}

impl StagehandError {
  /// Create a simple error message
  pub fn message(msg: impl Into<String>) -> Self {
    StagehandError::Message {
      message: msg.into(),
      context: None,
      help: None,
    }
  }

  /// Create an error with help text
  pub fn with_help(msg: impl Into<String>, help: impl Into<String>) -> Self {
    StagehandError::Message {
      message: msg.into(),
      context: None,
      help: Some(help.into()),
    }
  }

  /// Add context to an existing error
  pub fn context(self, ctx: impl Into<String>) -> Self {
    let ctx_str = ctx.into();
    match self {
      StagehandError::Message { message, context, help } => StagehandError::Message {
        message,
        context: Some(context.map(|c| format!("{}\n{}", ctx_str, c)).unwrap_or(ctx_str)),
        help,
      },
      _ => self,
    }
  }

  /// Get the appropriate exit code for this error
  pub fn exit_code(&self) -> ExitCode {
    match self {
      StagehandError::Input(_) => ExitCode::User,
      StagehandError::Resolve(_) => ExitCode::Resolution,
      StagehandError::Export(_) => ExitCode::User,
      StagehandError::Io(_) => ExitCode::System,
      StagehandError::Message { .. } => ExitCode::User,
    }
  }

  /// Get contextual help message for this error
  pub fn help_message(&self) -> Option<String> {
    match self {
      StagehandError::Input(e) => e.help_message(),
      StagehandError::Resolve(e) => e.help_message(),
      StagehandError::Export(e) => e.help_message(),
      StagehandError::Message { help, .. } => help.clone(),
      _ => None,
    }
  }
}

impl fmt::Display for StagehandError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      StagehandError::Input(e) => write!(f, "{}", e),
      StagehandError::Resolve(e) => write!(f, "{}", e),
      StagehandError::Export(e) => write!(f, "{}", e),
      StagehandError::Io(e) => write!(f, "I/O error: {}", e),
      StagehandError::Message { message, context, .. } => {
        write!(f, "{}", message)?;
        if let Some(ctx) = context {
          write!(f, "\n{}", ctx)?;
        }
        Ok(())
      }
    }
  }
}

impl std::error::Error for StagehandError {
  fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
    match self {
      StagehandError::Io(e) => Some(e),
      _ => None,
    }
  }
}

impl From<io::Error> for StagehandError {
  fn from(err: io::Error) -> Self {
    StagehandError::Io(err)
  }
}

impl From<String> for StagehandError {
  fn from(msg: String) -> Self {
    StagehandError::message(msg)
  }
}

impl From<&str> for StagehandError {
  fn from(msg: &str) -> Self {
    StagehandError::message(msg)
  }
}

impl From<serde_json::Error> for StagehandError {
  fn from(err: serde_json::Error) -> Self {
    StagehandError::message(format!("JSON error: {}", err))
  }
}

impl From<serde_yaml::Error> for StagehandError {
  fn from(err: serde_yaml::Error) -> Self {
    StagehandError::message(format!("YAML error: {}", err))
  }
}

impl From<glob::PatternError> for StagehandError {
  fn from(err: glob::PatternError) -> Self {
    StagehandError::message(format!("Glob pattern error: {}", err))
  }
}

impl From<glob::GlobError> for StagehandError {
  fn from(err: glob::GlobError) -> Self {
    StagehandError::message(format!("Glob error: {}", err))
  }
}

impl From<anyhow::Error> for StagehandError {
  fn from(err: anyhow::Error) -> Self {
    StagehandError::message(err.to_string())
  }
}

impl From<InputError> for StagehandError {
  fn from(err: InputError) -> Self {
    StagehandError::Input(err)
  }
}

impl From<ResolveError> for StagehandError {
  fn from(err: ResolveError) -> Self {
    StagehandError::Resolve(err)
  }
}

impl From<ExportError> for StagehandError {
  fn from(err: ExportError) -> Self {
    StagehandError::Export(err)
  }
}

/// Input-loading errors (catalogs and manifests)
#[derive(Debug)]
pub enum InputError {
  /// Service-definition directory yielded no data files
  NoServiceDefinitions { dir: PathBuf },

  /// No environment definition matched the requested environment name
  NoEnvironmentDefinition { environment: String, dir: PathBuf },

  /// Application and environment manifests declare different environments
  EnvironmentMismatch { application: String, environment: String },

  /// A data file did not match the expected schema
  Malformed { path: PathBuf, detail: String },
}

impl InputError {
  fn help_message(&self) -> Option<String> {
    match self {
      InputError::NoServiceDefinitions { .. } => {
        Some("Service definitions are JSON or YAML files, one service per file, searched recursively.".to_string())
      }
      InputError::NoEnvironmentDefinition { environment, .. } => Some(format!(
        "Expected a data file named after the environment, either directly in the directory or under `{}/`.",
        environment
      )),
      InputError::EnvironmentMismatch { .. } => {
        Some("The `environment.name` fields of the application and environment manifests must agree.".to_string())
      }
      InputError::Malformed { .. } => None,
    }
  }
}

impl fmt::Display for InputError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      InputError::NoServiceDefinitions { dir } => {
        write!(f, "No service definitions found reading: {}", dir.display())
      }
      InputError::NoEnvironmentDefinition { environment, dir } => {
        write!(
          f,
          "No environment definition found for `{}` in `{}`",
          environment,
          dir.display()
        )
      }
      InputError::EnvironmentMismatch { application, environment } => {
        write!(
          f,
          "Environment mismatch between application definition `{}` and environment definition `{}`",
          application, environment
        )
      }
      InputError::Malformed { path, detail } => {
        write!(f, "Malformed data file {}: {}", path.display(), detail)
      }
    }
  }
}

/// Dependency-resolution errors
///
/// Any of these discards the entire resolved graph; there is no partial
/// deployment of a subset of services.
#[derive(Debug)]
pub enum ResolveError {
  /// A dependency references a service absent from the catalog
  ServiceNotFound { name: String },

  /// No catalog version satisfies the requested range
  NoMatchingVersion {
    name: String,
    range: String,
    available: Vec<String>,
  },

  /// Satisfying versions exist but every candidate is release-blocked
  /// for the target environment
  ReleasePlanBlocked {
    name: String,
    range: String,
    environment: String,
    available: Vec<String>,
    usable: Vec<String>,
  },

  /// Mutually incompatible constraints formed a dependency cycle
  CyclicDependency { name: String, chain: Vec<String> },
}

impl ResolveError {
  fn help_message(&self) -> Option<String> {
    match self {
      ResolveError::NoMatchingVersion { available, .. } => {
        Some(format!("Available versions: {}", available.join(", ")))
      }
      ResolveError::ReleasePlanBlocked { available, usable, .. } => Some(format!(
        "Available versions: [{}], usable after release-plan gating: [{}]. Inspect plans with `stagehand release status`.",
        available.join(", "),
        usable.join(", ")
      )),
      _ => None,
    }
  }
}

impl fmt::Display for ResolveError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ResolveError::ServiceNotFound { name } => {
        write!(f, "No matching service definition found for {}", name)
      }
      ResolveError::NoMatchingVersion { name, range, .. } => {
        write!(f, "No matching version found for {} {}", name, range)
      }
      ResolveError::ReleasePlanBlocked {
        name,
        range,
        environment,
        ..
      } => {
        write!(
          f,
          "All versions matching {} {} are release-blocked in environment `{}`",
          name, range, environment
        )
      }
      ResolveError::CyclicDependency { name, chain } => {
        write!(f, "Cyclic dependency on {} via {}", name, chain.join(" -> "))
      }
    }
  }
}

/// Artifact-export errors
#[derive(Debug)]
pub enum ExportError {
  /// A resolved service retains an unset required environment variable
  MissingVariableValue { service: String, variable: String },

  /// Requested rendering format is not implemented
  UnsupportedOutputFormat { format: String },
}

impl ExportError {
  fn help_message(&self) -> Option<String> {
    match self {
      ExportError::MissingVariableValue { variable, .. } => Some(format!(
        "Set `{}` in the application or environment manifest's environment_variables.",
        variable
      )),
      ExportError::UnsupportedOutputFormat { .. } => Some("Supported output formats: kustomize".to_string()),
    }
  }
}

impl fmt::Display for ExportError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ExportError::MissingVariableValue { service, variable } => {
        write!(f, "{}. {} has no value", service, variable)
      }
      ExportError::UnsupportedOutputFormat { format } => {
        write!(f, "Unsupported output format: {}", format)
      }
    }
  }
}

/// Result type alias for stagehand
pub type StagehandResult<T> = Result<T, StagehandError>;

/// Helper trait to add context to Results
pub trait ResultExt<T> {
  /// Add context to an error result
  fn context(self, ctx: impl Into<String>) -> StagehandResult<T>;

  /// Add context using a closure (lazy evaluation)
  fn with_context<F>(self, f: F) -> StagehandResult<T>
  where
    F: FnOnce() -> String;
}

impl<T, E> ResultExt<T> for Result<T, E>
where
  E: Into<StagehandError>,
{
  fn context(self, ctx: impl Into<String>) -> StagehandResult<T> {
    self.map_err(|e| e.into().context(ctx))
  }

  fn with_context<F>(self, f: F) -> StagehandResult<T>
  where
    F: FnOnce() -> String,
  {
    self.map_err(|e| e.into().context(f()))
  }
}

/// Pretty-print an error to stderr with help text
pub fn print_error(error: &StagehandError) {
  eprintln!("\n❌ {}\n", error);

  if let Some(help) = error.help_message() {
    eprintln!("💡 Help: {}\n", help);
  }
}
