//! Helm values function.
//!
//! This is the logic behind the deployed function: it reads the account
//! environment from the parameter store and answers with the chart values
//! for that environment. The pipeline's test stage runs these tests before
//! anything is deployed, and the `helm-values` binary runs it locally.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::command::{CommandRunner, CommandSpec};
use crate::error::DeployError;
use crate::values::HelmValues;

pub const ENV_PARAMETER: &str = "/platform/account/env";
pub const STATUS_SUCCESS: &str = "SUCCESS";
pub const STATUS_FAILED: &str = "FAILED";

#[derive(Serialize, Deserialize, Default, Debug, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct FunctionResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<ResponseData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Serialize, Deserialize, Default, Debug, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct ResponseData {
    /// JSON-encoded `HelmValues`.
    #[serde(default)]
    pub helm_values: Option<String>,
}

#[async_trait]
pub trait ParameterStore: Send + Sync {
    async fn get_parameter(&self, name: &str) -> Result<String, DeployError>;
}

#[async_trait]
impl ParameterStore for HashMap<String, String> {
    async fn get_parameter(&self, name: &str) -> Result<String, DeployError> {
        self.get(name)
            .cloned()
            .ok_or_else(|| DeployError::ParameterNotFound(name.to_string()))
    }
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "PascalCase")]
struct GetParameterOutput {
    parameter: Parameter,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "PascalCase")]
struct Parameter {
    #[serde(default)]
    value: Option<String>,
}

/// Reads SSM parameters through `aws ssm get-parameter`.
pub struct CliParameterStore<'a> {
    runner: &'a dyn CommandRunner,
    region: String,
}

impl<'a> CliParameterStore<'a> {
    pub fn new(runner: &'a dyn CommandRunner, region: impl Into<String>) -> Self {
        CliParameterStore {
            runner,
            region: region.into(),
        }
    }
}

#[async_trait]
impl<'a> ParameterStore for CliParameterStore<'a> {
    async fn get_parameter(&self, name: &str) -> Result<String, DeployError> {
        let spec = CommandSpec::new("aws").args([
            "ssm",
            "get-parameter",
            "--name",
            name,
            "--region",
            &self.region,
            "--output",
            "json",
        ]);
        let output = self.runner.run(&spec).await?;

        if !output.success {
            if output.stderr.contains("ParameterNotFound") {
                return Err(DeployError::ParameterNotFound(name.to_string()));
            }
            return Err(DeployError::CommandFailed {
                command: spec.to_string(),
                message: output.stderr.trim().to_string(),
            });
        }

        let parsed: GetParameterOutput = serde_json::from_str(&output.stdout)?;
        parsed
            .parameter
            .value
            .filter(|value| !value.is_empty())
            .ok_or_else(|| DeployError::ParameterNotFound(name.to_string()))
    }
}

pub fn helm_values_for(environment: &str) -> HelmValues {
    match environment {
        "development" => HelmValues::with_replicas(1),
        _ => HelmValues::with_replicas(2),
    }
}

pub async fn handle<S: ParameterStore + ?Sized>(store: &S) -> FunctionResponse {
    match try_handle(store).await {
        Ok(helm_values) => FunctionResponse {
            status: Some(STATUS_SUCCESS.to_string()),
            data: Some(ResponseData {
                helm_values: Some(helm_values),
            }),
            reason: None,
        },
        Err(e) => {
            log::error!("Error: {}", e);
            FunctionResponse {
                status: Some(STATUS_FAILED.to_string()),
                data: None,
                reason: Some(e.to_string()),
            }
        }
    }
}

async fn try_handle<S: ParameterStore + ?Sized>(store: &S) -> Result<String, DeployError> {
    let environment = store.get_parameter(ENV_PARAMETER).await?;
    log::info!("Account environment: {}", environment);

    Ok(serde_json::to_string(&helm_values_for(&environment))?)
}
