mod error;
mod generation;
mod mailer;
mod routes;
mod storage;

use axum::extract::FromRef;
use std::path::PathBuf;

use generation::Generator;
use mailer::Mailer;
use pgl_api::{crypto, deploy};
use pgl_core::matching::{MatchScoreRegistry, DEFAULT_MATCH_PLUGIN, DEFAULT_MATCH_THRESHOLD};
use storage::Db;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: Db,
    pub config: AppConfig,
    pub mailer: Mailer,
    pub generator: Generator,
}

/// Server configuration loaded from environment variables.
#[derive(Clone)]
pub struct AppConfig {
    pub base_url: String,
    pub jwt_secret: String,
    pub registration_open: bool,
    pub webhook_secret: Option<String>,
    pub secure_cookies: bool,
    pub match_plugin: String,
    pub match_threshold: i64,
}

impl FromRef<AppState> for Db {
    fn from_ref(state: &AppState) -> Self {
        state.db.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}

impl FromRef<AppState> for Mailer {
    fn from_ref(state: &AppState) -> Self {
        state.mailer.clone()
    }
}

impl FromRef<AppState> for Generator {
    fn from_ref(state: &AppState) -> Self {
        state.generator.clone()
    }
}

fn env_opt(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|s| !s.trim().is_empty())
}

fn load_match_plugin() -> String {
    let Some(requested) = env_opt(deploy::ENV_MATCH_PLUGIN) else {
        return DEFAULT_MATCH_PLUGIN.to_string();
    };
    let registry = MatchScoreRegistry::default();
    if registry.contains(requested.trim()) {
        return requested.trim().to_string();
    }
    tracing::warn!(
        "unknown {} '{requested}', using {DEFAULT_MATCH_PLUGIN}. available: {}",
        deploy::ENV_MATCH_PLUGIN,
        registry.available_plugins().join(", ")
    );
    DEFAULT_MATCH_PLUGIN.to_string()
}

fn load_match_threshold() -> i64 {
    match env_opt(deploy::ENV_MATCH_THRESHOLD).map(|raw| raw.trim().parse::<i64>()) {
        None => DEFAULT_MATCH_THRESHOLD,
        Some(Ok(value)) => value.clamp(0, 100),
        Some(Err(_)) => {
            tracing::warn!(
                "{} is not a number, using {DEFAULT_MATCH_THRESHOLD}",
                deploy::ENV_MATCH_THRESHOLD
            );
            DEFAULT_MATCH_THRESHOLD
        }
    }
}

impl AppConfig {
    fn from_env() -> anyhow::Result<Self> {
        let base_url = env_opt("BASE_URL").unwrap_or_else(|| "http://localhost:3000".into());

        let jwt_secret = match env_opt("JWT_SECRET") {
            Some(secret) => secret,
            None => {
                tracing::warn!("JWT_SECRET not set; sessions will not survive a restart");
                crypto::generate_token()?
            }
        };

        let webhook_secret = env_opt(deploy::ENV_WEBHOOK_SECRET);
        if webhook_secret.is_none() {
            tracing::warn!(
                "{} not set; the reply webhook will reject every request",
                deploy::ENV_WEBHOOK_SECRET
            );
        }

        Ok(Self {
            base_url,
            jwt_secret,
            registration_open: deploy::registration_open(
                std::env::var(deploy::ENV_REGISTRATION).ok().as_deref(),
            ),
            webhook_secret,
            secure_cookies: deploy::parse_bool_flag(
                std::env::var(deploy::ENV_SECURE_COOKIES).ok().as_deref(),
                false,
            ),
            match_plugin: load_match_plugin(),
            match_threshold: load_match_threshold(),
        })
    }

    #[cfg(test)]
    pub fn for_tests() -> Self {
        Self {
            base_url: "http://localhost:3000".into(),
            jwt_secret: "test-jwt-secret".into(),
            registration_open: true,
            webhook_secret: Some("test-webhook-secret".into()),
            secure_cookies: false,
            match_plugin: DEFAULT_MATCH_PLUGIN.into(),
            match_threshold: DEFAULT_MATCH_THRESHOLD,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pgl_server=info,tower_http=info".into()),
        )
        .init();

    let data_dir = env_opt(deploy::ENV_DATA_DIR)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("data"));
    let db = storage::init_db(&data_dir)?;
    tracing::info!("database initialized in {}", data_dir.display());

    let config = AppConfig::from_env()?;
    if !config.registration_open {
        tracing::info!("self-registration is closed");
    }
    let base_url = config.base_url.clone();

    let state = AppState {
        db,
        config,
        mailer: Mailer::from_env()?,
        generator: Generator::from_env()?,
    };

    let web_dir = env_opt(deploy::ENV_WEB_DIR)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("web/build"));
    let app = routes::app(state, Some(&web_dir));

    tracing::info!("starting server at {base_url}");

    let port = env_opt("PORT").unwrap_or_else(|| "3000".into());
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}")).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
