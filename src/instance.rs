use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::errors::RestartAppError;
use crate::log::debug;

/// Principal allowed to read the pool inventory.
pub const READ_ONLY_ADMIN: &str = "ro_admin";
/// Principal allowed to issue commands such as restarts.
pub const FULL_ADMIN: &str = "admin";

const INSTANCE_DIR_PREFIX: &str = "passenger.";
const PROPERTIES_FILE: &str = "properties.json";
const READ_ONLY_PASSWORD_FILE: &str = "read_only_admin_password.txt";
const FULL_PASSWORD_FILE: &str = "full_admin_password.txt";

#[derive(Debug, Deserialize)]
struct InstanceProperties {
  name: Option<String>,
  server_admin_url: String,
}

/// A running server instance found in the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instance {
  pub name: String,
  pub dir: PathBuf,
  pub server_admin_url: String,
}

impl Instance {
  pub fn read_only_password_file(&self) -> PathBuf {
    self.dir.join(READ_ONLY_PASSWORD_FILE)
  }

  pub fn full_admin_password_file(&self) -> PathBuf {
    self.dir.join(FULL_PASSWORD_FILE)
  }
}

/// Scans `registry` for instance directories, sorted by name.
///
/// Directories without a readable `properties.json` belong to instances that
/// are starting up or were not cleaned up, and are skipped.
pub async fn list_instances(registry: &Path) -> Result<Vec<Instance>, RestartAppError> {
  debug(&format!("scanning instance registry: {}", registry.display()));

  let mut instances = Vec::new();
  let mut entries = match fs::read_dir(registry).await {
    Ok(entries) => entries,
    Err(e) if e.kind() == ErrorKind::NotFound => return Ok(instances),
    Err(e) => return Err(e.into()),
  };

  while let Some(entry) = entries.next_entry().await? {
    let dir_name = entry.file_name().to_string_lossy().into_owned();
    if !dir_name.starts_with(INSTANCE_DIR_PREFIX) || !entry.file_type().await?.is_dir() {
      continue;
    }

    let path = entry.path();
    let props = match read_properties(&path).await {
      Some(props) => props,
      None => {
        debug(&format!("skipping stale instance dir: {}", path.display()));
        continue;
      }
    };

    instances.push(Instance {
      name: props.name.unwrap_or(dir_name),
      dir: path,
      server_admin_url: props.server_admin_url,
    });
  }

  instances.sort_by(|a, b| a.name.cmp(&b.name));
  Ok(instances)
}

async fn read_properties(dir: &Path) -> Option<InstanceProperties> {
  let content = fs::read_to_string(dir.join(PROPERTIES_FILE)).await.ok()?;
  serde_json::from_str(&content).ok()
}

/// Picks the instance to talk to.
///
/// With `wanted` set, the instance name or its directory name must match.
/// Otherwise exactly one instance must be running.
pub async fn select_instance(
  registry: &Path,
  wanted: Option<&str>,
) -> Result<Instance, RestartAppError> {
  let mut instances = list_instances(registry).await?;

  if let Some(wanted) = wanted {
    return instances
      .into_iter()
      .find(|i| i.name == wanted || i.dir.file_name().is_some_and(|d| d == wanted))
      .ok_or_else(|| RestartAppError::UnknownInstance(wanted.to_string()));
  }

  match instances.len() {
    0 => Err(RestartAppError::NoInstance(registry.to_path_buf())),
    1 => Ok(instances.remove(0)),
    _ => Err(RestartAppError::AmbiguousInstance(
      instances.into_iter().map(|i| i.name).collect(),
    )),
  }
}

/// Where a password comes from. File secrets are read on every use so that a
/// missing full admin password only matters once a restart is attempted.
#[derive(Clone)]
pub enum Secret {
  Value(String),
  File(PathBuf),
}

impl Secret {
  pub async fn resolve(&self) -> Result<String, RestartAppError> {
    match self {
      Secret::Value(value) => Ok(value.clone()),
      Secret::File(path) => match fs::read_to_string(path).await {
        Ok(content) => Ok(content.trim_end().to_string()),
        Err(e) if e.kind() == ErrorKind::PermissionDenied => {
          Err(RestartAppError::CredentialsPermission(path.clone()))
        }
        Err(source) => Err(RestartAppError::Credentials {
          path: path.clone(),
          source,
        }),
      },
    }
  }
}

impl fmt::Debug for Secret {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Secret::Value(_) => f.write_str("Secret(****)"),
      Secret::File(path) => write!(f, "Secret({})", path.display()),
    }
  }
}

#[derive(Debug, Clone)]
pub struct Credentials {
  pub username: String,
  pub secret: Secret,
}

/// The two credential tiers of an instance. They are never interchanged:
/// `read_only` is only used by [`ControlPlane::read`], `full` only by
/// [`ControlPlane::command`].
#[derive(Debug, Clone)]
pub struct AdminCredentials {
  pub read_only: Credentials,
  pub full: Credentials,
}

impl AdminCredentials {
  pub fn for_instance(instance: &Instance) -> Self {
    Self {
      read_only: Credentials {
        username: READ_ONLY_ADMIN.to_string(),
        secret: Secret::File(instance.read_only_password_file()),
      },
      full: Credentials {
        username: FULL_ADMIN.to_string(),
        secret: Secret::File(instance.full_admin_password_file()),
      },
    }
  }
}

#[derive(Debug)]
pub struct ControlResponse {
  pub status: reqwest::StatusCode,
  pub body: String,
}

impl ControlResponse {
  pub fn is_success(&self) -> bool {
    self.status.is_success()
  }
}

/// Authenticated HTTP access to an instance's admin interface.
///
/// One client is reused for every call of an invocation. No timeout is set
/// here; the client defaults apply.
#[derive(Debug)]
pub struct ControlPlane {
  base_url: String,
  client: reqwest::Client,
  credentials: AdminCredentials,
}

impl ControlPlane {
  pub fn new(
    base_url: impl Into<String>,
    credentials: AdminCredentials,
  ) -> Result<Self, RestartAppError> {
    let base_url = base_url.into().trim_end_matches('/').to_string();
    let client = reqwest::Client::builder()
      .build()
      .map_err(|source| RestartAppError::Http {
        url: base_url.clone(),
        source,
      })?;
    Ok(Self {
      base_url,
      client,
      credentials,
    })
  }

  pub fn for_instance(instance: &Instance) -> Result<Self, RestartAppError> {
    Self::new(
      instance.server_admin_url.clone(),
      AdminCredentials::for_instance(instance),
    )
  }

  pub fn base_url(&self) -> &str {
    &self.base_url
  }

  /// GET `path` as the read-only principal.
  pub async fn read(&self, path: &str) -> Result<ControlResponse, RestartAppError> {
    let url = self.url(path);
    let creds = &self.credentials.read_only;
    let password = creds.secret.resolve().await?;
    debug(&format!("GET {} as {}", url, creds.username));

    let request = self
      .client
      .get(&url)
      .basic_auth(&creds.username, Some(password));
    self.send(url, request).await
  }

  /// POST `body` as JSON to `path` as the full admin principal.
  pub async fn command<T: Serialize + ?Sized>(
    &self,
    path: &str,
    body: &T,
  ) -> Result<ControlResponse, RestartAppError> {
    let url = self.url(path);
    let creds = &self.credentials.full;
    let password = creds.secret.resolve().await?;
    debug(&format!("POST {} as {}", url, creds.username));

    let request = self
      .client
      .post(&url)
      .basic_auth(&creds.username, Some(password))
      .json(body);
    self.send(url, request).await
  }

  async fn send(
    &self,
    url: String,
    request: reqwest::RequestBuilder,
  ) -> Result<ControlResponse, RestartAppError> {
    let response = match request.send().await {
      Ok(response) => response,
      Err(source) => return Err(RestartAppError::Http { url, source }),
    };
    let status = response.status();
    let body = match response.text().await {
      Ok(body) => body,
      Err(source) => return Err(RestartAppError::Http { url, source }),
    };
    debug(&format!("{} -> {}", url, status));
    Ok(ControlResponse { status, body })
  }

  fn url(&self, path: &str) -> String {
    format!("{}{}", self.base_url, path)
  }
}
