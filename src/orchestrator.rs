use std::path::Path;

use crate::config::{NotFoundPolicy, RestartMethod, RestartOptions, RestartPlan};
use crate::errors::RestartAppError;
use crate::instance::{select_instance, ControlPlane};
use crate::log::{debug, err, ok, warn};
use crate::pool::query_pool;
use crate::restart::dispatch_restarts;
use crate::selector::{select_targets, SelectionCriterion};

/// How a restart-app invocation ended. Turned into an exit code once, in `main`.
#[derive(Debug)]
pub enum Outcome {
  /// Every selected group was restarted.
  Completed { restarted: usize },
  /// Nothing matched and the operator asked to ignore that.
  IgnoredNotFound(String),
  Fatal(RestartAppError),
}

impl Outcome {
  pub fn exit_code(&self) -> u8 {
    match self {
      Outcome::Completed { .. } | Outcome::IgnoredNotFound(_) => 0,
      Outcome::Fatal(_) => 1,
    }
  }

  pub fn report(&self) {
    match self {
      Outcome::Completed { restarted } => {
        ok(&format!("restarted {} application group(s)", restarted))
      }
      Outcome::IgnoredNotFound(message) => warn(message),
      Outcome::Fatal(e) => err(&e.to_string()),
    }
  }
}

impl From<Result<usize, RestartAppError>> for Outcome {
  fn from(result: Result<usize, RestartAppError>) -> Self {
    match result {
      Ok(restarted) => Outcome::Completed { restarted },
      Err(e) => Outcome::Fatal(e),
    }
  }
}

/// Validates the operator input. Performs no I/O.
///
/// `entitled` tells whether rolling restarts are available in this build.
pub fn plan(opts: &RestartOptions, entitled: bool) -> Result<RestartPlan, RestartAppError> {
  let criterion = SelectionCriterion::from_input(opts.name.as_deref(), &opts.prefixes)?;

  let method = if opts.rolling_restart {
    if !entitled {
      return Err(RestartAppError::Entitlement);
    }
    RestartMethod::Rolling
  } else {
    RestartMethod::Blocking
  };

  let not_found = if opts.ignore_app_not_running {
    NotFoundPolicy::Ignore
  } else {
    NotFoundPolicy::Fail
  };

  Ok(RestartPlan {
    criterion,
    method,
    not_found,
  })
}

/// Fetches the pool once, selects the targets and restarts them in order.
pub async fn execute(plan: &RestartPlan, cp: &ControlPlane) -> Outcome {
  let groups = match query_pool(cp).await {
    Ok(groups) => groups,
    Err(e) => return Outcome::Fatal(e),
  };

  let targets = match select_targets(groups, &plan.criterion) {
    Ok(targets) => targets,
    Err(RestartAppError::NotFound(message)) if plan.not_found == NotFoundPolicy::Ignore => {
      return Outcome::IgnoredNotFound(message)
    }
    Err(e) => return Outcome::Fatal(e),
  };
  debug(&format!(
    "selected {} group(s), {} restart",
    targets.len(),
    plan.method
  ));

  dispatch_restarts(cp, &targets, plan.method).await.into()
}

/// Full restart-app run against the instances found in `registry`.
///
/// Input is validated before the registry is read or any request is sent.
pub async fn run(opts: &RestartOptions, entitled: bool, registry: &Path) -> Outcome {
  let plan = match plan(opts, entitled) {
    Ok(plan) => plan,
    Err(e) => return Outcome::Fatal(e),
  };

  let cp = match select_instance(registry, opts.instance.as_deref())
    .await
    .and_then(|instance| {
      debug(&format!(
        "using instance {} at {}",
        instance.name, instance.server_admin_url
      ));
      ControlPlane::for_instance(&instance)
    }) {
    Ok(cp) => cp,
    Err(e) => return Outcome::Fatal(e),
  };

  execute(&plan, &cp).await
}
