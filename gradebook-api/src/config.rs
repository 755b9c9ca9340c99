//! Service configuration
//!
//! Command-line arguments (with environment fallbacks) override the TOML
//! file, which overrides compiled defaults.

use clap::Parser;
use gradebook_common::config::{resolve_root_folder, TomlConfig, ROOT_FOLDER_ENV};
use gradebook_common::{Error, Result};
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 5780;
pub const DEFAULT_AI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_AI_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_AI_TIMEOUT_SECS: u64 = 30;

/// Command-line arguments for gradebook-api
#[derive(Parser, Debug, Default)]
#[command(name = "gradebook-api")]
#[command(about = "Grade tracking API with AI analysis")]
#[command(version)]
pub struct Args {
    /// Port to listen on
    #[arg(short, long, env = "GRADEBOOK_PORT")]
    pub port: Option<u16>,

    /// Address to bind
    #[arg(long, env = "GRADEBOOK_BIND_ADDR")]
    pub bind_addr: Option<String>,

    /// Folder holding gradebook.db (falls back to GRADEBOOK_ROOT_FOLDER)
    #[arg(short, long)]
    pub root_folder: Option<PathBuf>,

    /// Explicit config file path
    #[arg(short, long, env = "GRADEBOOK_CONFIG")]
    pub config: Option<PathBuf>,

    /// HS256 secret for bearer tokens
    #[arg(long, env = "GRADEBOOK_JWT_SECRET", hide_env_values = true)]
    pub jwt_secret: Option<String>,

    /// Shared secret for payment-provider webhooks
    #[arg(long, env = "GRADEBOOK_WEBHOOK_SECRET", hide_env_values = true)]
    pub webhook_secret: Option<String>,

    /// API key for the language-model provider
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub openai_api_key: Option<String>,

    /// OpenAI-compatible API base URL
    #[arg(long, env = "GRADEBOOK_AI_BASE_URL")]
    pub ai_base_url: Option<String>,

    /// Model used for analyses
    #[arg(long, env = "GRADEBOOK_AI_MODEL")]
    pub ai_model: Option<String>,

    /// Upper bound on one analysis call, in seconds
    #[arg(long, env = "GRADEBOOK_AI_TIMEOUT_SECS")]
    pub ai_timeout_secs: Option<u64>,
}

/// Fully resolved settings
#[derive(Clone, PartialEq)]
pub struct Config {
    pub listen_addr: SocketAddr,
    pub root_folder: PathBuf,
    pub jwt_secret: String,
    pub webhook_secret: Option<String>,
    pub ai: AiSettings,
}

#[derive(Clone, PartialEq)]
pub struct AiSettings {
    pub base_url: String,
    pub api_key: Option<String>,
    pub model: String,
    pub timeout: Duration,
}

// Secrets stay out of logs
impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("listen_addr", &self.listen_addr)
            .field("root_folder", &self.root_folder)
            .field("webhook_enabled", &self.webhook_secret.is_some())
            .field("ai", &self.ai)
            .finish_non_exhaustive()
    }
}

impl std::fmt::Debug for AiSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AiSettings")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("timeout", &self.timeout)
            .field("api_key_set", &self.api_key.is_some())
            .finish()
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl Config {
    /// Merge arguments over the TOML file over defaults
    pub fn resolve(args: &Args, toml: &TomlConfig) -> Result<Self> {
        let bind_addr = args
            .bind_addr
            .clone()
            .or_else(|| toml.server.bind_addr.clone())
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let ip: IpAddr = bind_addr
            .parse()
            .map_err(|e| Error::Config(format!("Invalid bind address {}: {}", bind_addr, e)))?;
        let port = args.port.or(toml.server.port).unwrap_or(DEFAULT_PORT);

        let root_folder = resolve_root_folder(
            args.root_folder.as_deref(),
            ROOT_FOLDER_ENV,
            toml.root_folder.as_deref(),
        );

        let jwt_secret = non_empty(args.jwt_secret.clone())
            .or_else(|| non_empty(toml.auth.jwt_secret.clone()))
            .ok_or_else(|| {
                Error::Config(
                    "JWT secret not configured (set GRADEBOOK_JWT_SECRET or [auth] jwt_secret)"
                        .to_string(),
                )
            })?;

        let webhook_secret = non_empty(args.webhook_secret.clone())
            .or_else(|| non_empty(toml.auth.webhook_secret.clone()));

        let ai = AiSettings {
            base_url: non_empty(args.ai_base_url.clone())
                .or_else(|| non_empty(toml.ai.base_url.clone()))
                .unwrap_or_else(|| DEFAULT_AI_BASE_URL.to_string()),
            api_key: non_empty(args.openai_api_key.clone())
                .or_else(|| non_empty(toml.ai.api_key.clone())),
            model: non_empty(args.ai_model.clone())
                .or_else(|| non_empty(toml.ai.model.clone()))
                .unwrap_or_else(|| DEFAULT_AI_MODEL.to_string()),
            timeout: Duration::from_secs(
                args.ai_timeout_secs
                    .or(toml.ai.timeout_secs)
                    .unwrap_or(DEFAULT_AI_TIMEOUT_SECS),
            ),
        };

        Ok(Self {
            listen_addr: SocketAddr::new(ip, port),
            root_folder,
            jwt_secret,
            webhook_secret,
            ai,
        })
    }
}
