use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::http::{header, HeaderValue};
use axum::routing::{delete, get, post};
use axum::Router;
use axum_server::tls_rustls::RustlsConfig;
use clap::Parser;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

mod capture;
mod error;
mod handlers;
mod library;
mod logic;
mod state;
mod storage;
mod thumbs;

use crate::handlers::{
    capture_handler, delete_handler, drawing_handler, image_list_handler, move_handler,
    status_handler,
};
use crate::library::{expand_home, Library};
use crate::logic::refresh_thumbnails;
use crate::state::AppState;
use crate::storage::{JsonFileStorage, Storage, DATA_FILE};

const THUMB_DIR_NAME: &str = "inkgallery";

#[derive(Parser)]
#[command(author, version, about = "Serve a folder of images as a browsable, annotatable gallery")]
struct Args {
    /// Folder to serve; a leading `~` is expanded to the home directory
    folder: String,
    #[arg(short, long, default_value_t = 8000)]
    port: u16,
    /// Host address to listen on
    #[arg(short, long, default_value = "127.0.0.1")]
    address: String,
    /// HTTPS certificate (PEM)
    #[arg(short, long)]
    cert: Option<PathBuf>,
    /// HTTPS private key (PEM)
    #[arg(short, long)]
    key: Option<PathBuf>,
    /// Allow screenshots, drawings, creating folders, moving and deleting images
    #[arg(short, long = "write-access")]
    write_access: bool,
    #[arg(long)]
    public_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "inkgallery_server=info,tower_http=info".into()),
        )
        .init();

    let args = Args::parse();
    info!("inkgallery@{}", env!("CARGO_PKG_VERSION"));

    let folder = expand_home(&args.folder);
    let root = match std::fs::canonicalize(&folder) {
        Ok(root) if root.is_dir() => root,
        Ok(root) => {
            error!("Unable to load directory {}: not a directory", root.display());
            std::process::exit(1);
        }
        Err(err) => {
            error!("Unable to load directory {}: {err}", folder.display());
            std::process::exit(1);
        }
    };

    let thumb_dir = std::env::temp_dir().join(THUMB_DIR_NAME);
    if let Err(err) = tokio::fs::create_dir_all(&thumb_dir).await {
        error!("Failed to create thumbnail dir {}: {err}", thumb_dir.display());
    }

    let storage: Arc<dyn Storage> = Arc::new(JsonFileStorage::new(root.join(DATA_FILE)));
    let drawings = storage.load().await.unwrap_or_else(|err| {
        error!("Failed to load {DATA_FILE}, starting without drawings: {err}");
        Default::default()
    });

    let library = Library::new(root.clone(), thumb_dir.clone());
    let state = AppState::new(library, args.write_access, storage, drawings);

    let public_dir = args
        .public_dir
        .unwrap_or_else(|| PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../public"));

    let app = router(state.clone(), &root, &thumb_dir, public_dir);

    let addr = match tokio::net::lookup_host((args.address.as_str(), args.port))
        .await
        .ok()
        .and_then(|mut addrs| addrs.next())
    {
        Some(addr) => addr,
        None => {
            error!("Cannot resolve listen address {}", args.address);
            std::process::exit(1);
        }
    };

    info!("Serving images in {}", root.display());
    info!(
        "Write access is {}",
        if args.write_access { "enabled" } else { "disabled" }
    );

    let startup_state = state.clone();
    tokio::spawn(async move {
        refresh_thumbnails(&startup_state).await;
    });

    match tls_config(args.cert.as_deref(), args.key.as_deref()).await {
        Some(config) => {
            info!("Server listening at https://{addr}");
            if let Err(err) = axum_server::bind_rustls(addr, config)
                .serve(app.into_make_service())
                .await
            {
                error!("Server stopped: {err}");
            }
        }
        None => {
            let listener = match tokio::net::TcpListener::bind(addr).await {
                Ok(listener) => listener,
                Err(err) => {
                    error!("Failed to bind {addr}: {err}");
                    std::process::exit(1);
                }
            };
            info!("Server listening at http://{addr}");
            if let Err(err) = axum::serve(listener, app).await {
                error!("Server stopped: {err}");
            }
        }
    }
}

fn router(state: AppState, root: &Path, thumb_dir: &Path, public_dir: PathBuf) -> Router {
    let cached_files = Router::new()
        .nest_service("/images", ServeDir::new(root))
        .nest_service("/thumbs", ServeDir::new(thumb_dir))
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("max-age=3600"),
        ));

    let mut app = Router::new()
        .route("/imageList", get(image_list_handler))
        .route("/status", get(status_handler));
    if state.write {
        app = app
            .route("/image", delete(delete_handler))
            .route("/move", post(move_handler))
            .route("/capture", post(capture_handler))
            .route("/drawing", post(drawing_handler));
    }

    app.merge(cached_files)
        .fallback_service(ServeDir::new(public_dir).append_index_html_on_directories(true))
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn tls_config(cert: Option<&Path>, key: Option<&Path>) -> Option<RustlsConfig> {
    let (cert, key) = (cert?, key?);
    if !cert.exists() || !key.exists() {
        warn!(
            "Could not find cert + key {} {}, serving plain http",
            cert.display(),
            key.display()
        );
        return None;
    }
    match RustlsConfig::from_pem_file(cert, key).await {
        Ok(config) => Some(config),
        Err(err) => {
            warn!("Could not load cert + key, serving plain http: {err}");
            None
        }
    }
}
