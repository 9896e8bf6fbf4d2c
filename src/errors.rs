use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RestartAppError {
  /// Both, neither, or too many application selectors were given.
  #[error("{0}")]
  SelectionInput(String),
  #[error("--rolling-restart is only available in the Enterprise edition")]
  Entitlement,
  /// The selection matched no group in the current pool snapshot.
  #[error("{0}")]
  NotFound(String),
  /// The control-plane answered with a non-2xx status. `body` is kept verbatim.
  #[error("*** An error occurred while {action} the server (HTTP {status}):\n{body}")]
  Transport {
    action: &'static str,
    status: u16,
    body: String,
  },
  #[error("cannot reach the server at {url}: {source}")]
  Http {
    url: String,
    #[source]
    source: reqwest::Error,
  },
  #[error("malformed pool inventory: {0}")]
  MalformedInventory(String),
  #[error("there are no running instances in {}", .0.display())]
  NoInstance(PathBuf),
  #[error(
    "there are multiple running instances ({}); please select one with --instance",
    .0.join(", ")
  )]
  AmbiguousInstance(Vec<String>),
  #[error("there is no running instance named '{0}'")]
  UnknownInstance(String),
  #[error(
    "permission denied reading {}; please run this command with root privileges",
    .0.display()
  )]
  CredentialsPermission(PathBuf),
  #[error("cannot read admin password from {}: {source}", path.display())]
  Credentials {
    path: PathBuf,
    #[source]
    source: io::Error,
  },
  #[error("io error: {0}")]
  Io(#[from] io::Error),
}

impl RestartAppError {
  pub fn is_not_found(&self) -> bool {
    matches!(self, RestartAppError::NotFound(_))
  }
}
