#![forbid(unsafe_code)]

mod api;
mod classifier;
mod commands;
mod models;
mod playlist_service;
mod rate_limiter;
mod repository;
mod twitch;
mod utils;

use std::{future::IntoFuture, process::exit, sync::Arc};

use api::AppState;
use commands::CommandPipeline;
use playlist_service::PlaylistService;
use rate_limiter::InMemoryRateLimiter;
use repository::{SubmissionRepository, SubmissionStore};
use serde::Deserialize;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use tokio::{net::TcpListener, select, signal};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use twitch::{TwitchClient, TwitchConfig, DEFAULT_IRC_ADDRESS};

#[derive(Deserialize)]
struct AppConfig {
    twitch_bot_username: String,
    twitch_oauth_token: String,
    twitch_channel: String,
    #[serde(default = "default_database_url")]
    database_url: String,
    #[serde(default = "default_port")]
    port: u16,
    #[serde(default = "default_static_dir")]
    static_dir: String,
    #[serde(default = "default_irc_address")]
    twitch_irc_address: String,
}

fn default_database_url() -> String {
    "sqlite://videos.sqlite?mode=rwc".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_static_dir() -> String {
    "public".to_string()
}

fn default_irc_address() -> String {
    DEFAULT_IRC_ADDRESS.to_string()
}

impl AppConfig {
    /// Names of required variables that are present but blank.
    fn blank_required_vars(&self) -> Vec<&'static str> {
        [
            ("TWITCH_BOT_USERNAME", &self.twitch_bot_username),
            ("TWITCH_OAUTH_TOKEN", &self.twitch_oauth_token),
            ("TWITCH_CHANNEL", &self.twitch_channel),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
        .collect()
    }
}

#[tokio::main]
async fn main() {
    if let Err(err) = dotenvy::dotenv() {
        warn!("Could not load config from .env file: {err}");
    }

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(
                    "video_queue_bot=info"
                        .parse()
                        .expect("Hard-coded default directive should be correct"),
                )
                .from_env_lossy(),
        )
        .init();

    let app_config = match envy::from_env::<AppConfig>() {
        Ok(config) => config,
        Err(err) => {
            error!("Could not load app config: {err}");
            exit(255);
        }
    };

    let blank_vars = app_config.blank_required_vars();
    if !blank_vars.is_empty() {
        error!("Environment variables must not be empty: {}", blank_vars.join(", "));
        exit(255);
    }

    let db_pool = match setup_database(&app_config.database_url).await {
        Ok(pool) => pool,
        Err(err) => {
            error!("Could not setup database: {err}");
            exit(255);
        }
    };

    let store: Arc<dyn SubmissionStore> = Arc::new(SubmissionRepository::new(db_pool.clone()));

    let app_state = Arc::new(AppState {
        playlist: Arc::new(PlaylistService::new(store.clone())),
    });
    let app = api::router(app_state, &app_config.static_dir);

    let listener = match TcpListener::bind(("0.0.0.0", app_config.port)).await {
        Ok(listener) => listener,
        Err(err) => {
            error!("Could not bind port {}: {err}", app_config.port);
            exit(255);
        }
    };
    info!("Serving the playlist at http://localhost:{}", app_config.port);

    let mut pipeline = CommandPipeline::new(store, InMemoryRateLimiter::default());
    let twitch = TwitchClient::new(TwitchConfig::new(
        &app_config.twitch_irc_address,
        &app_config.twitch_bot_username,
        &app_config.twitch_oauth_token,
        &app_config.twitch_channel,
    ));

    select! {
        _ = signal::ctrl_c() => {
            info!("Ctrl-C received, shutting down");
        },

        result = axum::serve(listener, app).into_future() => {
            if let Err(err) = result {
                error!("HTTP server failed: {err}");
            }
        },

        _ = twitch.run(&mut pipeline) => {},
    };

    db_pool.close().await;
}

#[tracing::instrument(skip(url))]
async fn setup_database(url: &str) -> anyhow::Result<SqlitePool> {
    info!("Connecting to SQLite database at {url}");
    let pool = SqlitePoolOptions::new().connect(url).await?;
    info!("Running migrations");
    sqlx::migrate!("./migrations").run(&pool).await?;
    info!("Done!");
    Ok(pool)
}
