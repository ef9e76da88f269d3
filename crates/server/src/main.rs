use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tally_extract::BillPipeline;
use tally_genai::GeminiClient;
use tally_ocr::GoogleVisionRecognizer;
use tally_server::{start_server, AppState, ServerConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "tally_server=info,tally_extract=info,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServerConfig::from_env()?;

    let pipeline = BillPipeline::new(
        GoogleVisionRecognizer::new(config.vision_api_key),
        GeminiClient::new(config.gemini_api_key),
        config.policy,
    );
    let state = AppState::new(pipeline);

    tracing::info!(addr = %config.addr, "starting bill detection server");
    start_server(&config.addr, state).await?;
    Ok(())
}
