use crate::errors::RestartAppError;
use crate::pool::GroupRecord;

/// How the groups to restart are picked from the pool snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionCriterion {
  /// Groups whose name equals this string exactly.
  ExactName(String),
  /// Groups whose app root starts with this string. This is a plain string
  /// prefix: `/webapps` selects `/webapps/foo` and also `/webapps123`.
  PathPrefix(String),
}

impl SelectionCriterion {
  /// Resolves `--name` and the positional arguments into one criterion.
  pub fn from_input(name: Option<&str>, prefixes: &[String]) -> Result<Self, RestartAppError> {
    match (name, prefixes) {
      (Some(name), []) => Ok(SelectionCriterion::ExactName(name.to_string())),
      (None, [prefix]) => Ok(SelectionCriterion::PathPrefix(prefix.clone())),
      (None, []) => Err(RestartAppError::SelectionInput(
        "Please pass either an app path prefix or an app group name. \
         See --help for more information."
          .to_string(),
      )),
      (Some(_), [_]) => Err(RestartAppError::SelectionInput(
        "You've passed an app path prefix, but you cannot also pass an \
         app group name. Please use only either one of them. See --help \
         for more information."
          .to_string(),
      )),
      (_, extra) => Err(RestartAppError::SelectionInput(format!(
        "Too many arguments: {}. Please pass at most one app path prefix. \
         See --help for more information.",
        extra.join(" ")
      ))),
    }
  }

  pub fn matches(&self, group: &GroupRecord) -> bool {
    match self {
      SelectionCriterion::ExactName(name) => group.name == *name,
      SelectionCriterion::PathPrefix(prefix) => group.app_root.starts_with(prefix.as_str()),
    }
  }

  pub fn not_found_message(&self) -> String {
    match self {
      SelectionCriterion::ExactName(name) => format!(
        "There is no served application running with the app group name '{}'.",
        name
      ),
      SelectionCriterion::PathPrefix(prefix) => format!(
        "There are no served applications running whose paths begin with '{}'.",
        prefix
      ),
    }
  }
}

/// Keeps the groups matching `criterion`, in snapshot order.
///
/// Never returns an empty list: no match is [`RestartAppError::NotFound`].
pub fn select_targets(
  groups: Vec<GroupRecord>,
  criterion: &SelectionCriterion,
) -> Result<Vec<GroupRecord>, RestartAppError> {
  let targets: Vec<_> = groups
    .into_iter()
    .filter(|group| criterion.matches(group))
    .collect();

  if targets.is_empty() {
    return Err(RestartAppError::NotFound(criterion.not_found_message()));
  }
  Ok(targets)
}
