use serde::Serialize;

use crate::config::RestartMethod;
use crate::errors::RestartAppError;
use crate::instance::ControlPlane;
use crate::log::{debug, log};
use crate::pool::GroupRecord;

pub const RESTART_PATH: &str = "/pool/restart_app_group.json";

/// Request body of the restart endpoint.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct RestartDirective<'a> {
    pub name: &'a str,
    pub method: RestartMethod,
}

/// Result of one restart request, reported as soon as it is known.
#[derive(Debug, Clone)]
pub struct RestartOutcome {
    pub group_name: String,
    pub succeeded: bool,
    pub status: u16,
    pub response_body: Option<String>,
}

/// Sends one restart directive for `group` with full admin credentials.
///
/// A non-2xx answer is not an error here; it comes back as an outcome with
/// `succeeded == false`.
pub async fn restart_group(
    cp: &ControlPlane,
    group: &GroupRecord,
    method: RestartMethod,
) -> Result<RestartOutcome, RestartAppError> {
    let directive = RestartDirective {
        name: &group.name,
        method,
    };
    let response = cp.command(RESTART_PATH, &directive).await?;

    Ok(RestartOutcome {
        group_name: group.name.clone(),
        succeeded: response.is_success(),
        status: response.status.as_u16(),
        response_body: Some(response.body).filter(|b| !b.is_empty()),
    })
}

/// Restarts `targets` one at a time, in order.
///
/// Stops at the first failed restart. Groups restarted before the failure
/// stay restarted and the remaining ones are never contacted.
pub async fn dispatch_restarts(
    cp: &ControlPlane,
    targets: &[GroupRecord],
    method: RestartMethod,
) -> Result<usize, RestartAppError> {
    let mut restarted = 0;

    for group in targets {
        log(&format!("Restarting {}", group.name));

        let outcome = restart_group(cp, group, method).await?;
        if !outcome.succeeded {
            return Err(RestartAppError::Transport {
                action: "communicating with",
                status: outcome.status,
                body: outcome.response_body.unwrap_or_default(),
            });
        }

        describe_response(&outcome);
        restarted += 1;
    }

    Ok(restarted)
}

// The server is expected to answer with JSON, but any successful body is accepted.
fn describe_response(outcome: &RestartOutcome) {
    match outcome.response_body.as_deref() {
        None => debug(&format!("{}: empty response", outcome.group_name)),
        Some(body) => match serde_json::from_str::<serde_json::Value>(body) {
            Ok(value) => debug(&format!("{}: {}", outcome.group_name, value)),
            Err(_) => debug(&format!("{}: non-JSON response: {}", outcome.group_name, body.trim())),
        },
    }
}
