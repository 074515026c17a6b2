use crate::auth::AuthKeys;
use crate::cloudinary::CloudinaryClient;
use crate::config::AppConfig;
use crate::db::initialize_database;
use crate::gate;
use crate::handlers::{client_config_handler, image_upload_handler, list_videos_handler, video_upload_handler};
use crate::state::AppState;
use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderValue, Method};
use axum::routing::{get, get_service, post};
use axum::{middleware, Router};
use sqlx::sqlite::SqlitePoolOptions;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};

// uploads are fully buffered before the provider call
const MAX_UPLOAD_BYTES: usize = 200 * 1024 * 1024;

const ENV_PREFIX: &str = "MEDIA_SHARE";

pub fn load_config(cli_path: Option<PathBuf>) -> Result<AppConfig, Box<dyn std::error::Error>> {
    use ::config::{builder::DefaultState, ConfigBuilder, Environment, File};

    let mut builder = ConfigBuilder::<DefaultState>::default();
    let mut chosen: Option<PathBuf> = None;

    // If CLI path is provided, use it as-is; let deserialization fail if format is wrong.
    if let Some(p) = cli_path {
        chosen = Some(p);
    } else {
        // Strict search: only look for .json files in known locations
        let push_if_exists = |p: PathBuf| -> Option<PathBuf> {
            if p.exists() {
                Some(p)
            } else {
                None
            }
        };

        // Prefer ./config.json (monorepo server dir)
        if let Ok(cwd) = std::env::current_dir() {
            if let Some(found) = push_if_exists(cwd.join("config.json")) {
                chosen = Some(found);
            }
        }
        // server/config.json
        if chosen.is_none() {
            if let Some(found) = push_if_exists(PathBuf::from("server/config.json")) {
                chosen = Some(found);
            }
        }
        // XDG config.json
        if chosen.is_none() {
            if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
                let p = PathBuf::from(xdg).join("media-share/config.json");
                if let Some(found) = push_if_exists(p) {
                    chosen = Some(found);
                }
            }
            if chosen.is_none() {
                if let Some(home) = dirs::home_dir() {
                    let p = home.join(".config/media-share/config.json");
                    if let Some(found) = push_if_exists(p) {
                        chosen = Some(found);
                    }
                }
            }
        }
        // /etc/media-share/config.json
        if chosen.is_none() {
            if let Some(found) = push_if_exists(PathBuf::from("/etc/media-share/config.json")) {
                chosen = Some(found);
            }
        }
    }

    if let Some(cfg_path) = chosen {
        tracing::info!("Using configuration file: {}", cfg_path.display());
        builder = builder.add_source(File::from(cfg_path));
    } else {
        return Err("No config.json found. Provide --config <file.json> or place config.json in ./, server/, XDG (~/.config/media-share/), or /etc/media-share/".into());
    }

    // secrets may also arrive as MEDIA_SHARE_* env vars, layered over the file
    builder = builder.add_source(Environment::with_prefix(ENV_PREFIX));

    let settings = builder
        .build()
        .map_err(|e| Box::new(e) as Box<dyn std::error::Error>)?;
    let cfg: AppConfig = settings
        .try_deserialize()
        .map_err(|e| Box::new(e) as Box<dyn std::error::Error>)?;
    Ok(cfg)
}

pub async fn init_db(config: &AppConfig) -> sqlx::SqlitePool {
    let db_path = PathBuf::from(&config.db_path);
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)
            .expect("Failed to create parent directory for the database file");
    }
    tracing::info!("Resolved DB path: {}", db_path.display());
    if db_path.exists() {
        if db_path.is_dir() {
            panic!("Configured db_path is a directory: {}", db_path.display());
        }
    } else {
        std::fs::File::create(&db_path).expect("Failed to create database file");
        println!("Created empty database file at {}", db_path.display());
    }
    let db_url = format!("sqlite://{}", db_path.display());
    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(&db_url)
        .await
        .expect("Failed to create sqlx pool");
    initialize_database(pool.clone())
        .await
        .expect("db init failed");
    pool
}

pub fn build_state(config: &AppConfig, pool: sqlx::SqlitePool) -> Arc<AppState> {
    let provider = CloudinaryClient::from_config(config);
    if provider.is_none() {
        tracing::warn!("media provider credentials not configured; uploads will be rejected");
    }
    Arc::new(AppState {
        pool,
        provider,
        auth: AuthKeys::new(&config.auth_secret_key, config.auth_publishable_key.clone()),
    })
}

/// API routes only, no gate. Handlers authenticate on their own, so this
/// is also what the handler-level tests drive.
pub fn build_api_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/image-upload", post(image_upload_handler))
        .route("/api/video-upload", post(video_upload_handler))
        .route("/api/videos", get(list_videos_handler))
        .route("/api/client-config", get(client_config_handler))
        .with_state(state)
}

/// Assemble the full router: API routes, optional static client fallback,
/// the authorization gate over everything, CORS and the body limit on the
/// outside. Shared by `main` and the integration tests.
pub fn build_router(
    state: Arc<AppState>,
    client_dist_dir: Option<PathBuf>,
    cors: Option<CorsLayer>,
) -> Router {
    let mut app = build_api_router(state.clone());

    if let Some(dir) = client_dist_dir {
        app = app.merge(build_client_router(dir));
    }

    // the gate wraps routes and fallback alike
    app = app.layer(middleware::from_fn_with_state(state, gate::authorize));

    if let Some(cors_layer) = cors {
        app = app.layer(cors_layer);
    }

    app.layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
}

pub fn resolve_client_dist_dir(config: &AppConfig) -> Option<PathBuf> {
    if let Some(dir) = config.client_dist_dir.clone() {
        return Some(PathBuf::from(dir));
    }
    // default: ./client next to the server, if present
    let fallback = PathBuf::from("client");
    if fallback.is_dir() {
        Some(fallback)
    } else {
        None
    }
}

/// Page routes served from flat files, so directory redirects never get
/// in front of the gate; everything else (css etc.) falls back to ServeDir.
fn build_client_router(dist_dir: PathBuf) -> Router {
    let page = |file: &str| get_service(ServeFile::new(dist_dir.join(file)));

    Router::new()
        .route("/", page("index.html"))
        .route("/home", page("home.html"))
        .route("/sign-in", page("sign-in.html"))
        .route("/sign-up", page("sign-up.html"))
        .route("/social-share", page("social-share.html"))
        .route("/video-upload", page("video-upload.html"))
        .fallback_service(get_service(ServeDir::new(dist_dir.clone())))
}

pub fn build_cors(config: &AppConfig) -> CorsLayer {
    let mut cors_layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    if config.cors_allow_credentials.unwrap_or(false) {
        cors_layer = cors_layer.allow_credentials(true);
    }

    if let Some(origins) = config.cors_allowed_origins.clone() {
        if origins.is_empty() {
            cors_layer = cors_layer.allow_origin(Any);
        } else {
            let list: Vec<HeaderValue> = origins
                .into_iter()
                .filter_map(|s| HeaderValue::from_str(&s).ok())
                .collect();
            if !list.is_empty() {
                cors_layer = cors_layer.allow_origin(tower_http::cors::AllowOrigin::list(list));
            } else {
                cors_layer = cors_layer.allow_origin(Any);
            }
        }
    } else {
        let origin = HeaderValue::from_static("http://127.0.0.1:8081");
        cors_layer = cors_layer.allow_origin(tower_http::cors::AllowOrigin::exact(origin));
    }

    cors_layer
}

pub fn log_startup_info(config: &AppConfig) {
    tracing::info!(
        "media-share server starting on {}:{}",
        config.host.as_deref().unwrap_or("127.0.0.1"),
        config.port.unwrap_or(8080)
    );
    tracing::info!(
        "provider configured: {}",
        config.cloudinary_cloud_name.is_some()
            && config.cloudinary_api_key.is_some()
            && config.cloudinary_api_secret.is_some()
    );
}
