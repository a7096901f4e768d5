use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing::{info, warn};

use teller_agent::azure::AzureOpenAiProvider;
use teller_agent::prompt::load_persona;
use teller_agent::tools::knowledge::KnowledgeSearchTool;
use teller_agent::tools::Tool;
use teller_agent::{Assistant, AzureSearch, CompletionOrchestrator, KnowledgeRetriever};
use teller_core::{MediaCache, TellerConfig};
use teller_gateway::app::{build_router, spawn_media_sweeper, AppState};
use teller_voice::AzureSpeech;
use teller_whatsapp::WhatsAppChannel;

/// Teller: WhatsApp and web banking assistant gateway.
#[derive(Parser, Debug)]
#[command(name = "teller-gateway", version, about)]
struct Args {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config")]
    config: Option<String>,

    /// Listen port.
    #[arg(short = 'p', long = "port")]
    port: Option<u16>,

    /// Listen address.
    #[arg(long = "bind")]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env first so RUST_LOG and credentials from it are visible below
    let dotenv = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "teller_gateway=info,teller_agent=info,teller_whatsapp=info,tower_http=info".into()
            }),
        )
        .init();

    if let Ok(path) = dotenv {
        info!(path = %path.display(), "loaded environment file");
    }

    let args = Args::parse();

    // explicit path > TELLER_CONFIG env > ~/.teller/teller.toml
    let config_path = args
        .config
        .clone()
        .or_else(|| std::env::var("TELLER_CONFIG").ok());
    let mut config = TellerConfig::load(config_path.as_deref()).unwrap_or_else(|e| {
        warn!("Config load failed ({}), using defaults", e);
        TellerConfig::default()
    });
    if let Some(port) = args.port {
        config.gateway.port = port;
    }
    if let Some(bind) = args.bind {
        config.gateway.bind = bind;
    }

    let addr: SocketAddr = format!("{}:{}", config.gateway.bind, config.gateway.port).parse()?;
    let sweep_secs = config.gateway.media_sweep_secs;

    let state = Arc::new(build_state(config));
    if sweep_secs > 0 {
        spawn_media_sweeper(Arc::clone(&state.media), Duration::from_secs(sweep_secs));
    }
    let router = build_router(state);

    info!("Teller gateway listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;
    Ok(())
}

/// Wire the Azure and WhatsApp clients. Credentials are only checked when a
/// request first needs them, so this never fails.
fn build_state(config: TellerConfig) -> AppState {
    let provider = Arc::new(AzureOpenAiProvider::new(
        config.azure.clone(),
        config.completion.clone(),
    ));
    let retriever = Arc::new(KnowledgeRetriever::new(Arc::new(AzureSearch::new(
        config.search.clone(),
    ))));
    let persona = load_persona(
        Path::new(&config.assistant.voice_config_path),
        &config.assistant.persona,
    );

    let tools: Vec<Box<dyn Tool>> = vec![Box::new(KnowledgeSearchTool::new(Arc::clone(&retriever)))];
    let orchestrator = CompletionOrchestrator::new(
        provider,
        tools,
        persona,
        config.assistant.fallback.clone(),
    )
    .with_sampling(&config.completion);
    let assistant = Assistant::new(orchestrator, retriever, config.assistant.clone());

    let speech = Arc::new(AzureSpeech::new(config.azure.clone(), config.speech.clone()));
    let whatsapp = Arc::new(WhatsAppChannel::new(config.whatsapp.clone()));

    info!(
        tool_calling = config.assistant.tool_calling,
        voice = %config.speech.voice,
        "assistant ready"
    );

    AppState::new(config, assistant, speech, whatsapp, Arc::new(MediaCache::default()))
}
