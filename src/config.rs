use std::path::PathBuf;

use crate::command::CommandSpec;
use crate::error::DeployError;

const HELM_BOOTSTRAP: &str =
    "curl -fsSL https://raw.githubusercontent.com/helm/helm/main/scripts/get-helm-3 | bash";

#[derive(Clone, Debug)]
pub struct Config {
    pub stack_name: String,
    pub region: String,
    pub function_output_key: String,
    pub cluster_output_key: String,
    pub repo_name: String,
    pub repo_url: String,
    pub chart_name: String,
    pub release_name: String,
    pub namespace: String,
    pub values_file: PathBuf,
    pub dependency_command: CommandSpec,
    pub test_command: CommandSpec,
    pub deploy_command: CommandSpec,
    pub helm_bootstrap_command: CommandSpec,
}

impl Config {
    pub fn from_env() -> Result<Self, DeployError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from `lookup`, falling back to defaults for unset or
    /// empty keys.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, DeployError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str, default: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        let stack_name = get("STACK_NAME", "MyAssessmentProjectStack");
        let default_deploy = format!("cdk deploy {} --require-approval never", stack_name);

        Ok(Config {
            region: get("AWS_REGION", "us-east-1"),
            function_output_key: get("FUNCTION_OUTPUT_KEY", "CustomResourceFunctionArn"),
            cluster_output_key: get("CLUSTER_OUTPUT_KEY", "EksClusterName"),
            repo_name: get("CHART_REPO_NAME", "ingress-nginx"),
            repo_url: get("CHART_REPO_URL", "https://kubernetes.github.io/ingress-nginx"),
            chart_name: get("CHART_NAME", "ingress-nginx"),
            release_name: get("RELEASE_NAME", "ingress-nginx"),
            namespace: get("NAMESPACE", "ingress-nginx"),
            values_file: PathBuf::from(get("VALUES_FILE", "helm-values.yaml")),
            dependency_command: parse_command(
                "DEPENDENCY_COMMAND",
                &get("DEPENDENCY_COMMAND", "cargo fetch"),
            )?,
            test_command: parse_command("TEST_COMMAND", &get("TEST_COMMAND", "cargo test"))?,
            deploy_command: parse_command("DEPLOY_COMMAND", &get("DEPLOY_COMMAND", &default_deploy))?,
            helm_bootstrap_command: CommandSpec::new("sh")
                .arg("-c")
                .arg(get("HELM_BOOTSTRAP_COMMAND", HELM_BOOTSTRAP)),
            stack_name,
        })
    }
}

fn parse_command(key: &str, line: &str) -> Result<CommandSpec, DeployError> {
    let mut parts = line.split_whitespace();
    let program = parts
        .next()
        .ok_or_else(|| DeployError::InvalidConfig(format!("{} is empty", key)))?;

    Ok(CommandSpec::new(program).args(parts))
}
