use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

use crate::selector::SelectionCriterion;

/// Environment variable that points at the directory holding instance directories.
pub const REGISTRY_DIR_ENV: &str = "PASSENGER_INSTANCE_REGISTRY_DIR";

/// Directory scanned for running instances.
///
/// `$PASSENGER_INSTANCE_REGISTRY_DIR` wins, then `$TMPDIR`, then `/tmp`.
pub fn registry_dir() -> PathBuf {
  if let Ok(dir) = std::env::var(REGISTRY_DIR_ENV) {
    if !dir.is_empty() {
      return PathBuf::from(dir);
    }
  }
  match std::env::var("TMPDIR") {
    Ok(dir) if !dir.is_empty() => PathBuf::from(dir),
    _ => PathBuf::from("/tmp"),
  }
}

/// How the server should replace the processes of a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RestartMethod {
  /// May briefly stall in-flight requests while processes are replaced.
  #[default]
  Blocking,
  /// Replaces processes gradually. Requires the enterprise entitlement.
  Rolling,
}

impl RestartMethod {
  pub fn as_str(&self) -> &'static str {
    match self {
      RestartMethod::Blocking => "blocking",
      RestartMethod::Rolling => "rolling",
    }
  }
}

impl fmt::Display for RestartMethod {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// What to do when the selection matches no running application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NotFoundPolicy {
  #[default]
  Fail,
  Ignore,
}

/// Raw restart-app input, as given by the operator.
#[derive(Debug, Clone, Default)]
pub struct RestartOptions {
  /// Exact app group name (`--name`).
  pub name: Option<String>,
  /// Positional app path prefixes. Exactly one is accepted.
  pub prefixes: Vec<String>,
  /// Request a rolling restart instead of a blocking one.
  pub rolling_restart: bool,
  /// Exit successfully when nothing matches.
  pub ignore_app_not_running: bool,
  /// Instance to target. `None` auto-selects the only running instance.
  pub instance: Option<String>,
}

/// Validated restart-app input. Building one performs no I/O.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestartPlan {
  pub criterion: SelectionCriterion,
  pub method: RestartMethod,
  pub not_found: NotFoundPolicy,
}
