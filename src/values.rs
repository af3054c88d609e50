use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::DeployError;
use crate::function::{FunctionResponse, STATUS_FAILED};

/// Chart values produced by the function and written for helm.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct HelmValues {
    pub controller: ControllerValues,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ControllerValues {
    pub replica_count: u64,
}

impl HelmValues {
    pub fn with_replicas(replica_count: u64) -> Self {
        HelmValues {
            controller: ControllerValues { replica_count },
        }
    }

    pub fn to_yaml(&self) -> Result<String, DeployError> {
        Ok(serde_yaml::to_string(self)?)
    }
}

/// Pulls `controller.replicaCount` out of the JSON string nested under
/// `Data.HelmValues` in a raw function response.
pub fn extract_replica_count(raw: &str) -> Result<u64, DeployError> {
    if raw.trim().is_empty() {
        return Err(DeployError::InvocationFailed(
            "function returned an empty response".to_string(),
        ));
    }

    let response: FunctionResponse = serde_json::from_str(raw)?;
    if response.status.as_deref() == Some(STATUS_FAILED) {
        return Err(DeployError::InvocationFailed(
            response
                .reason
                .unwrap_or_else(|| "function reported FAILED without a reason".to_string()),
        ));
    }

    let helm_values = response
        .data
        .and_then(|data| data.helm_values)
        .ok_or_else(|| DeployError::MissingField {
            field: "Data.HelmValues".to_string(),
        })?;

    let values: Value = serde_json::from_str(&helm_values)?;
    let Some(replicas) = values.pointer("/controller/replicaCount") else {
        return Err(DeployError::MissingReplicaCount(helm_values));
    };

    as_count(replicas).ok_or_else(|| {
        DeployError::MissingReplicaCount(format!("replicaCount is not a count: {}", replicas))
    })
}

/// Non-negative whole numbers, including ones written as `3.0`.
fn as_count(value: &Value) -> Option<u64> {
    if let Some(count) = value.as_u64() {
        return Some(count);
    }

    value
        .as_f64()
        .filter(|f| f.fract() == 0.0 && *f >= 0.0 && *f <= u64::MAX as f64)
        .map(|f| f as u64)
}

/// Overwrites `path` with the values fragment for `replica_count`.
pub fn write_values_file(path: &Path, replica_count: u64) -> Result<(), DeployError> {
    let yaml = HelmValues::with_replicas(replica_count).to_yaml()?;
    std::fs::write(path, yaml)?;
    log::info!("Wrote {} (replicaCount: {})", path.display(), replica_count);

    Ok(())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    use super::*;

    const RESPONSE: &str = r#"{"Data":{"HelmValues":"{\"controller\":{\"replicaCount\":3}}"}}"#;

    #[test]
    fn example_response_renders_exact_values_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("values.yaml");
        std::fs::write(&path, "stale: true\nmore: stuff\n").unwrap();

        let count = extract_replica_count(RESPONSE).unwrap();
        write_values_file(&path, count).unwrap();

        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "controller:\n  replicaCount: 3\n"
        );
    }

    #[test]
    fn absent_or_null_helm_values() {
        for raw in [
            r#"{"Status":"SUCCESS"}"#,
            r#"{"Status":"SUCCESS","Data":{}}"#,
            r#"{"Status":"SUCCESS","Data":null}"#,
            r#"{"Status":"SUCCESS","Data":{"HelmValues":null}}"#,
        ] {
            assert!(
                matches!(
                    extract_replica_count(raw),
                    Err(DeployError::MissingField { ref field }) if field == "Data.HelmValues"
                ),
                "{raw}"
            );
        }
    }

    #[test]
    fn missing_or_bad_replica_count() {
        for raw in [
            r#"{"Data":{"HelmValues":"{\"controller\":{}}"}}"#,
            r#"{"Data":{"HelmValues":"{\"controller\":{\"replicaCount\":null}}"}}"#,
            r#"{"Data":{"HelmValues":"{\"controller\":{\"replicaCount\":-1}}"}}"#,
            r#"{"Data":{"HelmValues":"{}"}}"#,
        ] {
            assert!(
                matches!(
                    extract_replica_count(raw),
                    Err(DeployError::MissingReplicaCount(_))
                ),
                "{raw}"
            );
        }
    }

    #[test]
    fn whole_floats_are_counts() {
        let raw = r#"{"Data":{"HelmValues":"{\"controller\":{\"replicaCount\":3.0}}"}}"#;
        assert_eq!(extract_replica_count(raw).unwrap(), 3);

        let raw = r#"{"Data":{"HelmValues":"{\"controller\":{\"replicaCount\":2.5}}"}}"#;
        assert!(matches!(
            extract_replica_count(raw),
            Err(DeployError::MissingReplicaCount(_))
        ));
    }

    #[test]
    fn failed_status_surfaces_reason() {
        let raw = r#"{"Status":"FAILED","Reason":"ParameterNotFound"}"#;
        let err = extract_replica_count(raw).unwrap_err();
        assert_eq!(
            err.to_string(),
            "function invocation failed: ParameterNotFound"
        );
    }

    #[test]
    fn unusable_payloads() {
        assert!(matches!(
            extract_replica_count("  "),
            Err(DeployError::InvocationFailed(_))
        ));
        assert!(matches!(
            extract_replica_count("not json"),
            Err(DeployError::Json(_))
        ));
        assert!(matches!(
            extract_replica_count(r#"{"Data":{"HelmValues":"{broken"}}"#),
            Err(DeployError::Json(_))
        ));
    }
}
