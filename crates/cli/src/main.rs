use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "pagebot")]
#[command(about = "Pagebot CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show version
    Version,

    /// Create the configuration directory and a default config file.
    Init {
        /// Config file path (default: PAGEBOT_CONFIG_PATH or ~/.pagebot/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<std::path::PathBuf>,
    },

    /// Run the webhook gateway (verification handshake + event callbacks).
    Gateway {
        /// Config file path (default: PAGEBOT_CONFIG_PATH or ~/.pagebot/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<std::path::PathBuf>,

        /// HTTP port (default from config or 5000)
        #[arg(long, short)]
        port: Option<u16>,

        /// Bind address (default from config or 127.0.0.1)
        #[arg(long)]
        bind: Option<String>,
    },

    /// Load the config and print the resolved settings (secrets shown only as set/unset).
    VerifyConfig {
        /// Config file path (default: PAGEBOT_CONFIG_PATH or ~/.pagebot/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<std::path::PathBuf>,
    },
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Version) => {
            println!("pagebot {}", env!("CARGO_PKG_VERSION"));
        }
        Some(Commands::Init { config }) => {
            if let Err(e) = run_init(config) {
                log::error!("init failed: {}", e);
                std::process::exit(1);
            }
        }
        Some(Commands::Gateway { config, port, bind }) => {
            if let Err(e) = run_gateway(config, port, bind).await {
                log::error!("gateway failed: {:#}", e);
                std::process::exit(1);
            }
        }
        Some(Commands::VerifyConfig { config }) => {
            if let Err(e) = run_verify_config(config) {
                log::error!("verify-config failed: {:#}", e);
                std::process::exit(1);
            }
        }
        None => {
            println!("Run with --help for usage");
        }
    }
}

fn run_init(config_path: Option<std::path::PathBuf>) -> anyhow::Result<()> {
    let path = config_path.unwrap_or_else(pagebot::config::default_config_path);
    let dir = pagebot::init::init_config_dir(&path)?;
    println!("initialized configuration at {}", dir.display());
    Ok(())
}

async fn run_gateway(
    config_path: Option<std::path::PathBuf>,
    port: Option<u16>,
    bind: Option<String>,
) -> anyhow::Result<()> {
    let (mut config, path) = pagebot::config::load_config(config_path)?;
    if let Some(p) = port {
        config.gateway.port = p;
    }
    if let Some(b) = bind {
        config.gateway.bind = b;
    }
    log::info!(
        "starting gateway on {}:{} (config {})",
        config.gateway.bind,
        config.gateway.port,
        path.display()
    );
    pagebot::gateway::run_gateway(config).await
}

fn run_verify_config(config_path: Option<std::path::PathBuf>) -> anyhow::Result<()> {
    use pagebot::config;

    let (cfg, path) = config::load_config(config_path)?;
    let summary = serde_json::json!({
        "configPath": path.display().to_string(),
        "gateway": { "bind": cfg.gateway.bind, "port": cfg.gateway.port },
        "messenger": {
            "pageAccessToken": config::resolve_page_access_token(&cfg).is_some(),
            "verifyToken": config::resolve_verify_token(&cfg).is_some(),
            "appSecret": config::resolve_app_secret(&cfg).is_some(),
            "sendApiUrl": cfg.messenger.send_api_url,
        },
        "delegates": {
            "textUrl": cfg.delegates.text_url,
            "imageUrl": cfg.delegates.image_url,
            "timeoutSecs": cfg.delegates.timeout_secs,
        },
        "conversation": {
            "imageTriggerPayload": cfg.conversation.image_trigger_payload,
            "modeTtlSecs": cfg.conversation.mode_ttl_secs,
        },
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);
    if config::resolve_page_access_token(&cfg).is_none() {
        log::warn!("no page access token: replies will not be delivered");
    }
    if cfg.delegates.image_url.is_none() {
        log::warn!("delegates.imageUrl is unset: image requests will get an apology");
    }
    Ok(())
}
