use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};

use voicerelay_core::config::Config;
use voicerelay_gateway::AppState;
use voicerelay_providers::openai::OpenAiChatProvider;
use voicerelay_speech::VoiceProfile;
use voicerelay_speech::azure::{AzureSynthesizer, TokenIssuer};

#[derive(Parser)]
#[command(
    name = "voicerelay",
    about = "Streaming chat-to-speech relay — bridges an LLM token stream to speech synthesis",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the relay server
    Serve {
        /// Port to listen on (default: 5000)
        #[arg(long)]
        port: Option<u16>,
    },

    /// Validate configuration and credentials
    Check,

    /// Show the effective configuration
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .init();

    // Load config
    let config_path = cli.config.map(PathBuf::from).unwrap_or_else(Config::default_path);
    let config = Config::load(&config_path)?;

    match cli.command {
        Commands::Serve { port } => {
            let port = port.unwrap_or_else(|| config.port());
            let state = build_state(&config)?;
            tracing::info!("Starting voicerelay on port {port}");
            voicerelay_gateway::start_server(state, &config.bind_addr(), port).await?;
        }
        Commands::Check => {
            println!("Config: {}", config_path.display());
            match config.resolve_credentials() {
                Ok(creds) => {
                    println!("LLM API key: ok");
                    println!("Speech key: ok (region: {})", creds.speech_region);
                }
                Err(e) => {
                    println!("{e}");
                    std::process::exit(1);
                }
            }
        }
        Commands::Config => {
            let json = serde_json::to_string_pretty(&config)?;
            println!("{json}");
        }
    }

    Ok(())
}

/// Resolve credentials and build the shared relay state. A missing
/// credential fails here, before the server ever binds.
fn build_state(config: &Config) -> anyhow::Result<Arc<AppState>> {
    let creds = config.resolve_credentials()?;

    let chat = OpenAiChatProvider::new(
        creds.llm_api_key,
        config.model(),
        config.llm_base_url().as_deref(),
    );
    let speech = AzureSynthesizer::new(creds.speech_key.clone(), creds.speech_region.clone());
    let tokens = TokenIssuer::new(creds.speech_key, creds.speech_region);

    let voice = VoiceProfile {
        name: config.voice_name(),
        language: config.voice_language(),
        rate_percent: config.speaking_rate_percent(),
    };

    Ok(Arc::new(AppState::new(
        Arc::new(chat),
        Arc::new(speech),
        voice,
        Some(Arc::new(tokens)),
        config.max_tokens(),
    )))
}
