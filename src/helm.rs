use std::path::Path;

use crate::command::{run_streamed_checked, CommandRunner, CommandSpec};
use crate::config::Config;
use crate::error::DeployError;

/// Installs the helm CLI unless it is already on the PATH.
pub async fn ensure_helm(runner: &dyn CommandRunner, config: &Config) -> Result<(), DeployError> {
    if runner.is_available("helm").await {
        log::info!("helm already installed");
        return Ok(());
    }

    log::info!("helm not found, installing it");
    run_streamed_checked(runner, &config.helm_bootstrap_command)
        .await
        .map_err(|e| DeployError::BootstrapFailed(e.to_string()))?;

    if !runner.is_available("helm").await {
        return Err(DeployError::BootstrapFailed(
            "helm is still not on the PATH after installing".to_string(),
        ));
    }

    Ok(())
}

/// Adds the chart repository and upgrades (or installs) the release.
pub async fn install_chart(
    runner: &dyn CommandRunner,
    config: &Config,
    values_file: &Path,
) -> Result<(), DeployError> {
    let chart = format!("{}/{}", config.repo_name, config.chart_name);
    log::info!("Installing {} as release {}", chart, config.release_name);

    let commands = [
        CommandSpec::new("helm").args([
            "repo",
            "add",
            &config.repo_name,
            &config.repo_url,
            "--force-update",
        ]),
        CommandSpec::new("helm").args(["repo", "update", &config.repo_name]),
        CommandSpec::new("helm")
            .args(["upgrade", "--install", &config.release_name, &chart])
            .args(["--namespace", &config.namespace, "--create-namespace"])
            .arg("--values")
            .arg(values_file.to_string_lossy())
            .arg("--wait"),
    ];

    for spec in &commands {
        run_streamed_checked(runner, spec)
            .await
            .map_err(|e| DeployError::ChartInstallFailed(e.to_string()))?;
    }

    Ok(())
}
