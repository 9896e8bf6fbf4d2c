use anyhow::{Context, Result};
use appctl::{config::registry_dir, instance::list_instances, log::*};
use clap::Args;
use std::path::PathBuf;

#[derive(Args)]
pub struct ListInstancesArgs {
    /// Directory to scan instead of the default instance registry
    #[arg(long, value_name = "DIR")]
    pub registry_dir: Option<PathBuf>,
}

pub async fn execute(args: ListInstancesArgs) -> Result<()> {
    let registry = args.registry_dir.unwrap_or_else(registry_dir);
    let instances = list_instances(&registry)
        .await
        .with_context(|| format!("Failed to scan {}", registry.display()))?;

    if instances.is_empty() {
        warn(&format!("no running instances in {}", registry.display()));
        return Ok(());
    }

    for instance in instances {
        log(&format!(
            "{}  {}  ({})",
            instance.name,
            instance.server_admin_url,
            instance.dir.display()
        ));
    }
    Ok(())
}
