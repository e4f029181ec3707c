use clap::Parser;
use config::{Config, Environment};
use serde::Deserialize;
use std::path::Path;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file path
    #[arg(short, long, env = "CONFIG_FILE")]
    pub config: Option<String>,

    /// Port to listen on
    #[arg(long, env = "PORT")]
    pub port: Option<u16>,

    /// WebSocket URL of the game protocol gateway
    #[arg(long, env = "GATEWAY_URL")]
    pub gateway_url: Option<String>,

    /// Base URL of the quiz-content API
    #[arg(long, env = "CONTENT_API_BASE")]
    pub content_api_base: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub upstream: UpstreamConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct UpstreamConfig {
    /// Base URL of the quiz-content REST API.
    pub content_api_base: String,
    /// WebSocket URL of the game protocol gateway.
    pub gateway_url: String,
    /// Bound on the one-shot join endpoint, in seconds.
    pub join_timeout_secs: u64,
    /// Delay before the streaming fallback "joined" notice, in milliseconds.
    pub joined_fallback_ms: u64,
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_from_args(std::env::args())
    }

    /// Load configuration, layering defaults, an optional config file,
    /// `QV_`-prefixed environment variables, and CLI overrides (in that
    /// order of increasing priority).
    pub fn load_from_args<I, T>(args: I) -> Result<Self, config::ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let cli =
            Cli::try_parse_from(args).map_err(|e| config::ConfigError::Message(e.to_string()))?;

        let mut builder = Config::builder()
            .set_default("server.port", 3000)?
            .set_default("server.host", "0.0.0.0")?
            .set_default(
                "upstream.content_api_base",
                "https://create.kahoot.it/rest/kahoots",
            )?
            .set_default("upstream.gateway_url", "ws://127.0.0.1:9700/session")?
            .set_default("upstream.join_timeout_secs", 15)?
            .set_default("upstream.joined_fallback_ms", 2000)?;

        // Config file: explicit path wins, ./config.yaml is the fallback.
        if let Some(path) = &cli.config {
            builder = builder.add_source(config::File::from(Path::new(path)));
        } else if Path::new("config.yaml").exists() {
            builder = builder.add_source(config::File::from(Path::new("config.yaml")));
        }

        // Environment variables, e.g. QV_SERVER__PORT=8000.
        builder = builder.add_source(
            Environment::with_prefix("QV")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        // CLI flags override everything else.
        if let Some(port) = cli.port {
            builder = builder.set_override("server.port", i64::from(port))?;
        }
        if let Some(url) = cli.gateway_url {
            builder = builder.set_override("upstream.gateway_url", url)?;
        }
        if let Some(base) = cli.content_api_base {
            builder = builder.set_override("upstream.content_api_base", base)?;
        }

        let cfg = builder.build()?;
        cfg.try_deserialize()
    }
}
