use thiserror::Error;

/// Failures that end a deployment run.
#[derive(Debug, Error)]
pub enum DeployError {
    #[error("installing dependencies failed: {0}")]
    DependenciesFailed(String),

    #[error("unit tests failed, refusing to deploy: {0}")]
    TestsFailed(String),

    #[error("stack deployment failed: {0}")]
    DeployFailed(String),

    #[error("stack output {key} is missing or empty")]
    MissingOutput { key: String },

    #[error("function invocation failed: {0}")]
    InvocationFailed(String),

    #[error("field {field} is missing or null in the function response")]
    MissingField { field: String },

    #[error("replica count is missing from the helm values: {0}")]
    MissingReplicaCount(String),

    #[error("parameter {0} not found")]
    ParameterNotFound(String),

    #[error("helm bootstrap failed: {0}")]
    BootstrapFailed(String),

    #[error("chart install failed: {0}")]
    ChartInstallFailed(String),

    #[error("command failed: {command} - {message}")]
    CommandFailed { command: String, message: String },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}
