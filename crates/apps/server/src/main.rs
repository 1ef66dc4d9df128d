use std::env;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use axum::body::Body;
use axum::extract::{Path as AxumPath, State};
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use offline::OfflineManifest;
use tour::TourConfig;

#[derive(Clone)]
struct AppState {
    tour_root: PathBuf,
    manifest: OfflineManifest,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let tour_root = PathBuf::from(env::var("TOUR_ROOT").unwrap_or_else(|_| "assets".to_string()));
    let cache_version = env::var("TOUR_CACHE_VERSION").unwrap_or_else(|_| "tour-v1".to_string());
    let addr: SocketAddr = match env::var("TOUR_ADDR")
        .unwrap_or_else(|_| "127.0.0.1:9200".to_string())
        .parse()
    {
        Ok(addr) => addr,
        Err(err) => {
            error!("invalid TOUR_ADDR: {err}");
            return ExitCode::FAILURE;
        }
    };

    // Configuration errors are fatal before anything is served.
    let config_path = tour_root.join("tour.json");
    let config = match load_config(&config_path).await {
        Ok(config) => config,
        Err(err) => {
            error!("tour config rejected: {config_path:?}: {err}");
            return ExitCode::FAILURE;
        }
    };
    let graph = match config.build() {
        Ok(graph) => graph,
        Err(err) => {
            error!("tour config rejected: {config_path:?}: {err}");
            return ExitCode::FAILURE;
        }
    };
    info!(
        "tour graph built: {} nodes, {} links, start node {}",
        graph.nodes().len(),
        graph.link_count(),
        graph.start_node()
    );

    let state = AppState {
        tour_root,
        manifest: offline_manifest(&config, &cache_version),
    };

    let app = Router::new()
        .route("/healthz", get(healthz))
        .route("/tour.json", get(get_tour_config))
        .route("/offline.json", get(get_offline_manifest))
        .route("/panoramas/:name", get(get_panorama))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    info!("tour server listening on http://{addr}");
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(err) => {
            error!("bind {addr} failed: {err}");
            return ExitCode::FAILURE;
        }
    };
    if let Err(err) = axum::serve(listener, app).await {
        error!("server error: {err}");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

async fn load_config(path: &Path) -> Result<TourConfig, String> {
    let json = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| e.to_string())?;
    TourConfig::from_json(&json).map_err(|e| e.to_string())
}

/// Allow-list the offline collaborator pre-caches: the root document, the
/// tour config, and every node's panorama, in declaration order.
fn offline_manifest(config: &TourConfig, version: &str) -> OfflineManifest {
    let mut precache = vec!["/".to_string(), "/tour.json".to_string()];
    precache.extend(config.nodes.iter().map(|n| n.panorama.clone()));
    OfflineManifest::new(version, precache)
}

async fn healthz() -> Response {
    (StatusCode::OK, "ok").into_response()
}

async fn get_tour_config(State(state): State<AppState>) -> Response {
    let path = state.tour_root.join("tour.json");
    serve_file(&path, "application/json").await
}

async fn get_offline_manifest(State(state): State<AppState>) -> Response {
    match serde_json::to_vec(&state.manifest) {
        Ok(body) => {
            let mut headers = HeaderMap::new();
            headers.insert(
                http::header::CONTENT_TYPE,
                HeaderValue::from_static("application/json"),
            );
            (StatusCode::OK, headers, Body::from(body)).into_response()
        }
        Err(err) => {
            error!("manifest serialization failed: {err}");
            (StatusCode::INTERNAL_SERVER_ERROR, "manifest unavailable").into_response()
        }
    }
}

async fn get_panorama(State(state): State<AppState>, AxumPath(name): AxumPath<String>) -> Response {
    // Path parameters never contain '/', so this cannot escape the root.
    let path = state.tour_root.join("panoramas").join(&name);
    serve_file(&path, content_type_for(&name)).await
}

fn content_type_for(name: &str) -> &'static str {
    match name.rsplit('.').next() {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        _ => "application/octet-stream",
    }
}

async fn serve_file(path: &Path, content_type: &str) -> Response {
    match tokio::fs::read(path).await {
        Ok(data) => {
            let mut headers = HeaderMap::new();
            headers.insert(
                http::header::CONTENT_TYPE,
                HeaderValue::from_str(content_type)
                    .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream")),
            );
            (StatusCode::OK, headers, Body::from(data)).into_response()
        }
        Err(err) => {
            error!("file read failed: {path:?} -> {err}");
            (StatusCode::NOT_FOUND, "not found").into_response()
        }
    }
}
