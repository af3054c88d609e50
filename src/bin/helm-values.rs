//! Runs the helm values function locally against the account's parameter
//! store and prints the response document it would return.

use anyhow::{bail, Context, Result};
use helm_rollout::command::SystemRunner;
use helm_rollout::config::Config;
use helm_rollout::function::{handle, CliParameterStore, STATUS_FAILED};

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info");
    }
    env_logger::init();

    let config = Config::from_env().context("loading configuration")?;
    let store = CliParameterStore::new(&SystemRunner, config.region);

    let response = handle(&store).await;
    println!("{}", serde_json::to_string(&response)?);

    if response.status.as_deref() == Some(STATUS_FAILED) {
        bail!(
            "function failed: {}",
            response.reason.unwrap_or_default()
        );
    }

    Ok(())
}
