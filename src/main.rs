use std::sync::Arc;

use ai_llm_service::telemetry;
use anyhow::Context;
use contextor::{Pipeline, PipelineConfig};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file when present.
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            return Err(e).context("reading .env");
        }
    }

    telemetry::init("info");

    let cfg = PipelineConfig::from_env().context("loading configuration")?;
    let pipeline = Arc::new(Pipeline::initialize(cfg).context("loading knowledge base")?);

    let address = api::api_address_from_env();
    info!(%address, entries = pipeline.stats().entries, "starting API");
    api::start(pipeline, &address).await?;

    Ok(())
}
