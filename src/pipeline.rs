//! Deployment pipeline.
//!
//! Stages run strictly in order and the first failure ends the run:
//!
//! 1. Install dependencies
//! 2. Run the unit tests
//! 3. Deploy the stack
//! 4. Read the function and cluster outputs
//! 5. Update the local kubeconfig
//! 6. Invoke the function
//! 7. Extract the replica count from its response
//! 8. Write the values file
//! 9. Install helm if it is missing
//! 10. Upgrade or install the chart

use std::fmt;

use crate::command::{run_streamed_checked, CommandRunner};
use crate::config::Config;
use crate::error::DeployError;
use crate::helm::{ensure_helm, install_chart};
use crate::invoke::invoke_function;
use crate::kubeconfig::update_kubeconfig;
use crate::outputs::{fetch_outputs, StackOutputs};
use crate::values::{extract_replica_count, write_values_file};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    Dependencies,
    Tests,
    Deploy,
    Outputs,
    Kubeconfig,
    Invoke,
    Extract,
    ValuesFile,
    HelmBootstrap,
    ChartInstall,
}

impl Stage {
    const COUNT: usize = 10;

    fn number(self) -> usize {
        self as usize + 1
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Dependencies => "Installing dependencies",
            Stage::Tests => "Running unit tests",
            Stage::Deploy => "Deploying stack",
            Stage::Outputs => "Reading stack outputs",
            Stage::Kubeconfig => "Updating kubeconfig",
            Stage::Invoke => "Invoking function",
            Stage::Extract => "Extracting helm values",
            Stage::ValuesFile => "Writing values file",
            Stage::HelmBootstrap => "Checking for helm",
            Stage::ChartInstall => "Installing chart",
        };
        f.write_str(name)
    }
}

/// What a successful run deployed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Deployment {
    pub outputs: StackOutputs,
    pub replica_count: u64,
}

pub struct Pipeline<R> {
    config: Config,
    runner: R,
}

impl<R: CommandRunner> Pipeline<R> {
    pub fn new(config: Config, runner: R) -> Self {
        Pipeline { config, runner }
    }

    pub async fn run(&self) -> Result<Deployment, DeployError> {
        let runner: &dyn CommandRunner = &self.runner;
        let config = &self.config;

        self.enter(Stage::Dependencies);
        run_streamed_checked(runner, &config.dependency_command)
            .await
            .map_err(|e| DeployError::DependenciesFailed(e.to_string()))?;

        self.enter(Stage::Tests);
        run_streamed_checked(runner, &config.test_command)
            .await
            .map_err(|e| DeployError::TestsFailed(e.to_string()))?;

        self.enter(Stage::Deploy);
        run_streamed_checked(runner, &config.deploy_command)
            .await
            .map_err(|e| DeployError::DeployFailed(e.to_string()))?;

        self.enter(Stage::Outputs);
        let outputs = fetch_outputs(runner, config).await?;

        self.enter(Stage::Kubeconfig);
        update_kubeconfig(runner, config, &outputs.cluster_name).await?;

        self.enter(Stage::Invoke);
        let response = invoke_function(runner, config, &outputs.function_id).await?;

        self.enter(Stage::Extract);
        let replica_count = extract_replica_count(&response)?;

        self.enter(Stage::ValuesFile);
        write_values_file(&config.values_file, replica_count)?;

        self.enter(Stage::HelmBootstrap);
        ensure_helm(runner, config).await?;

        self.enter(Stage::ChartInstall);
        install_chart(runner, config, &config.values_file).await?;

        log::info!(
            "Release {} deployed with {} controller replica(s)",
            config.release_name,
            replica_count
        );

        Ok(Deployment {
            outputs,
            replica_count,
        })
    }

    fn enter(&self, stage: Stage) {
        log::info!("[{}/{}] {}", stage.number(), Stage::COUNT, stage);
    }
}
