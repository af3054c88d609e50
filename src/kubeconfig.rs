use crate::command::{run_checked, CommandRunner, CommandSpec};
use crate::config::Config;
use crate::error::DeployError;

/// Merges the cluster's connection details into the local kubeconfig.
pub async fn update_kubeconfig(
    runner: &dyn CommandRunner,
    config: &Config,
    cluster_name: &str,
) -> Result<(), DeployError> {
    log::info!("Updating kubeconfig for cluster {}", cluster_name);

    let spec = CommandSpec::new("aws").args([
        "eks",
        "update-kubeconfig",
        "--name",
        cluster_name,
        "--region",
        &config.region,
    ]);
    run_checked(runner, &spec).await?;

    Ok(())
}
