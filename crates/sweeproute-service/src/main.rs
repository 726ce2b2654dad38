//! Service entry point.
//!
//! # Configuration
//!
//! - `SERVICE_PORT` - HTTP port (default: 8080)
//! - `SWEEPROUTE_ARTIFACT_DIR` - Directory for produced artifacts (default: ./artifacts)
//! - `SWEEPROUTE_GRAPH_FILE` - Optional graph fixture; replaces the Overpass source
//! - `SWEEPROUTE_GEOCODE` - Set to `1` to enable Nominatim enrichment
//! - `RUST_LOG` - Log level (default: info)
//! - `LOG_FORMAT` - Log format: json (default) or text

use std::env;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::info;

use sweeproute_lib::{
    FixtureSource, NominatimGeocoder, OverpassSource, ReverseGeocoder, StreetSource,
};
use sweeproute_service::{build_router, init_logging, AppState, LogFormat};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging(LogFormat::from_env());

    let port: u16 = env::var("SERVICE_PORT")
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(8080);
    let artifact_root = env::var("SWEEPROUTE_ARTIFACT_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("./artifacts"));

    let source: Arc<dyn StreetSource + Send + Sync> = match env::var("SWEEPROUTE_GRAPH_FILE") {
        Ok(path) => {
            info!(path = %path, "using graph fixture street source");
            Arc::new(FixtureSource::from_path(Path::new(&path))?)
        }
        Err(_) => Arc::new(OverpassSource::new()?),
    };

    let geocoder: Option<Arc<dyn ReverseGeocoder + Send + Sync>> =
        match env::var("SWEEPROUTE_GEOCODE").as_deref() {
            Ok("1") | Ok("true") => Some(Arc::new(NominatimGeocoder::new()?)),
            _ => None,
        };

    info!(
        port,
        artifact_dir = %artifact_root.display(),
        geocode = geocoder.is_some(),
        "starting sweeproute service"
    );

    std::fs::create_dir_all(&artifact_root)?;
    let state = AppState::new(source, geocoder, artifact_root);
    let app = build_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(addr = %addr, "listening on");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
