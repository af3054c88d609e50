use serde::Deserialize;
use tempfile::NamedTempFile;

use crate::command::{CommandRunner, CommandSpec};
use crate::config::Config;
use crate::error::DeployError;

/// What `aws lambda invoke` prints on stdout. The CLI exits 0 even when the
/// function itself fails; that case sets `FunctionError`.
#[derive(Deserialize, Default, Debug)]
#[serde(rename_all = "PascalCase")]
struct InvokeMetadata {
    #[serde(default)]
    status_code: Option<u16>,
    #[serde(default)]
    function_error: Option<String>,
}

/// Error document the runtime writes in place of the response.
#[derive(Deserialize, Default, Debug)]
#[serde(rename_all = "camelCase")]
struct FunctionErrorBody {
    #[serde(default)]
    error_message: Option<String>,
    #[serde(default)]
    error_type: Option<String>,
}

/// Invokes the function synchronously with an empty payload and returns the
/// raw response document.
pub async fn invoke_function(
    runner: &dyn CommandRunner,
    config: &Config,
    function_id: &str,
) -> Result<String, DeployError> {
    log::info!("Invoking function {}", function_id);

    let response_file = NamedTempFile::with_prefix("helm-rollout-response")?;
    let spec = CommandSpec::new("aws").args([
        "lambda",
        "invoke",
        "--function-name",
        function_id,
        "--region",
        &config.region,
        "--payload",
        "{}",
        "--cli-binary-format",
        "raw-in-base64-out",
    ]);
    let spec = spec.arg(response_file.path().to_string_lossy());

    let output = runner.run(&spec).await?;
    if !output.success {
        return Err(DeployError::InvocationFailed(output.stderr.trim().to_string()));
    }
    log::debug!("Invocation metadata: {}", output.stdout.trim());

    let metadata: InvokeMetadata = serde_json::from_str(&output.stdout).unwrap_or_else(|e| {
        log::warn!("Couldn't parse invocation metadata: {}", e);
        InvokeMetadata::default()
    });
    let body = std::fs::read_to_string(response_file.path())?;

    if let Some(kind) = metadata.function_error {
        return Err(DeployError::InvocationFailed(function_error_message(&kind, &body)));
    }
    if let Some(code) = metadata.status_code.filter(|code| !(200..300).contains(code)) {
        return Err(DeployError::InvocationFailed(format!(
            "invoke returned status {}",
            code
        )));
    }

    if body.trim().is_empty() {
        return Err(DeployError::InvocationFailed(
            "function returned an empty response".to_string(),
        ));
    }

    Ok(body)
}

fn function_error_message(kind: &str, body: &str) -> String {
    let error: FunctionErrorBody = serde_json::from_str(body).unwrap_or_default();

    match (error.error_type, error.error_message) {
        (Some(error_type), Some(message)) => format!("{} ({}): {}", kind, error_type, message),
        (None, Some(message)) => format!("{}: {}", kind, message),
        _ if body.trim().is_empty() => kind.to_string(),
        _ => format!("{}: {}", kind, body.trim()),
    }
}
