use anyhow::{Context, Result};
use helm_rollout::command::SystemRunner;
use helm_rollout::config::Config;
use helm_rollout::pipeline::Pipeline;

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info");
    }
    env_logger::init();

    let config = Config::from_env().context("loading configuration")?;
    log::info!(
        "Deploying stack {} to {}",
        config.stack_name,
        config.region
    );

    let deployment = Pipeline::new(config, SystemRunner)
        .run()
        .await
        .context("deployment aborted")?;

    log::info!(
        "Done: cluster {}, {} replica(s)",
        deployment.outputs.cluster_name,
        deployment.replica_count
    );

    Ok(())
}
