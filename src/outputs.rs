use serde::Deserialize;

use crate::command::{run_checked, CommandRunner, CommandSpec};
use crate::config::Config;
use crate::error::DeployError;

#[derive(Deserialize, Default, Debug)]
#[serde(rename_all = "PascalCase")]
pub struct StackDescription {
    #[serde(default)]
    pub stacks: Vec<Stack>,
}

#[derive(Deserialize, Default, Debug)]
#[serde(rename_all = "PascalCase")]
pub struct Stack {
    #[serde(default)]
    pub outputs: Vec<StackOutput>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "PascalCase")]
pub struct StackOutput {
    pub output_key: String,
    pub output_value: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StackOutputs {
    pub function_id: String,
    pub cluster_name: String,
}

pub async fn fetch_outputs(
    runner: &dyn CommandRunner,
    config: &Config,
) -> Result<StackOutputs, DeployError> {
    log::info!("Reading outputs of stack {}", config.stack_name);

    let spec = CommandSpec::new("aws").args([
        "cloudformation",
        "describe-stacks",
        "--stack-name",
        &config.stack_name,
        "--region",
        &config.region,
        "--output",
        "json",
    ]);
    let raw = run_checked(runner, &spec).await?;
    let description: StackDescription = serde_json::from_str(&raw)?;

    let function_id = find_output(&description, &config.function_output_key)?;
    let cluster_name = find_output(&description, &config.cluster_output_key)?;
    log::info!("Function: {}, cluster: {}", function_id, cluster_name);

    Ok(StackOutputs {
        function_id,
        cluster_name,
    })
}

/// Looks `key` up in the first stack. The aws CLI prints `None` for unset
/// values in text mode, so that is treated as missing too.
pub fn find_output(description: &StackDescription, key: &str) -> Result<String, DeployError> {
    description
        .stacks
        .first()
        .and_then(|stack| stack.outputs.iter().find(|o| o.output_key == key))
        .and_then(|o| o.output_value.as_deref())
        .map(str::trim)
        .filter(|value| !value.is_empty() && *value != "None")
        .map(str::to_string)
        .ok_or_else(|| DeployError::MissingOutput {
            key: key.to_string(),
        })
}
