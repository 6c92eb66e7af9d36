use crate::avatars;
use crate::config::Config;
use crate::fandub::{CatalogSource, FandubError, FandubResolver, JsonCatalog, ResolverOptions};
use crate::genres::{self, Genre};
use crate::tmdb::{TitleMetadata, TmdbApi, TmdbClient};
use anyhow::Result;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::Utc;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::{path::PathBuf, sync::Arc, time::Duration};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info, warn};

#[derive(Clone)]
pub struct AppState {
    pub resolver: Arc<FandubResolver>,
    pub tmdb: Arc<dyn TmdbApi>,
    pub avatars_path: PathBuf,
    pub daily_genre_count: usize,
    pub fetch_timeout: Duration,
}

impl AppState {
    pub fn new(
        catalog: Arc<dyn CatalogSource>,
        tmdb: Arc<dyn TmdbApi>,
        config: &Config,
    ) -> Self {
        let resolver = FandubResolver::new(catalog, tmdb.clone(), ResolverOptions::from(config));
        Self {
            resolver: Arc::new(resolver),
            tmdb,
            avatars_path: config.avatars_path(),
            daily_genre_count: config.daily_genre_count,
            fetch_timeout: config.fetch_timeout,
        }
    }
}

pub async fn run_server(config: Config) -> Result<()> {
    let tmdb: Arc<dyn TmdbApi> = Arc::new(TmdbClient::from_config(&config)?);
    let catalog: Arc<dyn CatalogSource> = Arc::new(JsonCatalog::new(config.fandubs_path()));
    info!(
        "Serving fandub catalog from {}",
        config.fandubs_path().display()
    );

    let state = AppState::new(catalog, tmdb, &config);
    let app = build_router(state);

    info!("Listening on {}", config.bind_addr);
    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/fandub", get(list_fandubs))
        .route("/api/fandub/:id", get(get_fandub))
        .route("/api/fandub/:id/episode", get(get_fandub_episode))
        .route("/api/content/daily-genres", get(daily_genres))
        .route("/api/avatars", get(list_avatars))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

async fn health() -> &'static str {
    "OK"
}

fn message(status: StatusCode, msg: impl Into<String>) -> Response {
    (status, Json(json!({ "message": msg.into() }))).into_response()
}

impl IntoResponse for FandubError {
    fn into_response(self) -> Response {
        match self {
            FandubError::EntryNotFound(_) => message(StatusCode::NOT_FOUND, "Fandub not found"),
            FandubError::EpisodeNotFound {
                season, episode, ..
            } => (
                StatusCode::NOT_FOUND,
                Json(json!({
                    "message": "Episode not found",
                    "season": season,
                    "episode": episode,
                })),
            )
                .into_response(),
            FandubError::Upstream(e) => {
                warn!("Upstream metadata failure: {:#}", e);
                message(StatusCode::BAD_GATEWAY, "Failed to fetch fandub metadata")
            }
            FandubError::Catalog(e) => {
                error!("Fandub catalog unreadable: {}", e);
                message(StatusCode::INTERNAL_SERVER_ERROR, "Failed to read fandub catalog")
            }
        }
    }
}

async fn list_fandubs(State(state): State<AppState>) -> Response {
    match state.resolver.list().await {
        Ok(titles) => Json(titles).into_response(),
        Err(e) => e.into_response(),
    }
}

async fn get_fandub(State(state): State<AppState>, Path(id): Path<i64>) -> Response {
    match state.resolver.get(id).await {
        Ok(title) => Json(title).into_response(),
        Err(e) => e.into_response(),
    }
}

#[derive(Debug, Deserialize)]
struct EpisodeQuery {
    season: u32,
    episode: u32,
}

async fn get_fandub_episode(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(q): Query<EpisodeQuery>,
) -> Response {
    match state.resolver.episode(id, q.season, q.episode).await {
        Ok(ep) => Json(ep).into_response(),
        Err(e) => e.into_response(),
    }
}

#[derive(Debug, Serialize)]
struct GenreShelf {
    #[serde(flatten)]
    genre: Genre,
    results: Vec<TitleMetadata>,
}

async fn daily_genres(State(state): State<AppState>) -> Json<Vec<GenreShelf>> {
    let picked = genres::daily_genres(Utc::now().date_naive(), state.daily_genre_count);
    let fetches = picked.into_iter().map(|genre| {
        let tmdb = state.tmdb.clone();
        let timeout = state.fetch_timeout;
        async move {
            match tokio::time::timeout(timeout, tmdb.discover_by_genre(genre.id)).await {
                Ok(Ok(results)) => Some(GenreShelf { genre, results }),
                Ok(Err(e)) => {
                    warn!("Dropping genre '{}' from daily shelf: {:#}", genre.name, e);
                    None
                }
                Err(_) => {
                    warn!("Dropping genre '{}' from daily shelf: timed out", genre.name);
                    None
                }
            }
        }
    });
    Json(join_all(fetches).await.into_iter().flatten().collect())
}

async fn list_avatars(State(state): State<AppState>) -> Response {
    match avatars::load_avatars(&state.avatars_path).await {
        Ok(list) => Json(list).into_response(),
        Err(e) => {
            error!("Failed to load avatars: {:#}", e);
            message(StatusCode::INTERNAL_SERVER_ERROR, "Failed to load avatars")
        }
    }
}

/// Resolves on Ctrl+C, or SIGTERM on unix. A handler that fails to install is logged
/// and never fires.
async fn shutdown_signal() {
    let interrupt = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Cannot listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Cannot listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    let source = tokio::select! {
        _ = interrupt => "Ctrl+C",
        _ = terminate => "SIGTERM",
    };
    info!("{} received, draining connections", source);
}
