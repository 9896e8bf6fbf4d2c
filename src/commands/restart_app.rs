use appctl::{
    config::{registry_dir, RestartOptions},
    orchestrator::{run, Outcome},
};
use clap::Args;

#[derive(Args)]
#[command(after_help = "\
Selecting by path prefix restarts all apps whose paths begin with the prefix.
  Example: appctl restart-app /webapps
  Restarts /webapps/foo, /webapps/bar and also /webapps123.

Selecting by name restarts only the app group with exactly that name.
  Example: appctl restart-app --name /webapps/foo
  Restarts /webapps/foo, but not /webapps/foo/bar or /webapps/foo123.")]
pub struct RestartAppArgs {
    /// Select all apps whose paths begin with this prefix
    #[arg(value_name = "APP_PATH_PREFIX")]
    pub prefixes: Vec<String>,

    /// The app group name to select
    #[arg(long, value_name = "APP_GROUP_NAME")]
    pub name: Option<String>,

    /// Perform a rolling restart instead of a regular (blocking) one (Enterprise only)
    #[arg(long)]
    pub rolling_restart: bool,

    /// Exit successfully if the selected application is not currently running
    #[arg(long)]
    pub ignore_app_not_running: bool,

    /// The instance to select
    #[arg(long, value_name = "NAME")]
    pub instance: Option<String>,
}

impl From<RestartAppArgs> for RestartOptions {
    fn from(args: RestartAppArgs) -> Self {
        RestartOptions {
            name: args.name,
            prefixes: args.prefixes,
            rolling_restart: args.rolling_restart,
            ignore_app_not_running: args.ignore_app_not_running,
            instance: args.instance,
        }
    }
}

pub async fn execute(args: RestartAppArgs) -> Outcome {
    let opts = RestartOptions::from(args);
    run(&opts, cfg!(feature = "enterprise"), &registry_dir()).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        args: RestartAppArgs,
    }

    #[test]
    fn test_args_to_options() {
        let cli = TestCli::parse_from([
            "restart-app",
            "--name",
            "/webapps/foo",
            "--ignore-app-not-running",
            "--instance",
            "main",
        ]);
        let opts = RestartOptions::from(cli.args);
        assert_eq!(opts.name.as_deref(), Some("/webapps/foo"));
        assert!(opts.prefixes.is_empty());
        assert!(opts.ignore_app_not_running);
        assert!(!opts.rolling_restart);
        assert_eq!(opts.instance.as_deref(), Some("main"));
    }

    #[test]
    fn test_extra_positionals_reach_the_core() {
        let cli = TestCli::parse_from(["restart-app", "/webapps", "/srv", "--rolling-restart"]);
        let opts = RestartOptions::from(cli.args);
        assert_eq!(opts.prefixes, vec!["/webapps", "/srv"]);
        assert!(opts.rolling_restart);
    }

    #[tokio::test]
    async fn test_extra_positionals_fail_before_any_lookup() {
        let cli = TestCli::parse_from(["restart-app", "/webapps", "/srv"]);
        let outcome = execute(cli.args).await;
        assert_eq!(outcome.exit_code(), 1);
    }
}
