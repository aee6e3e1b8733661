mod access_log;
mod handlers;
mod openapi;
mod state;

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::routing::get;
use clap::Parser;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tracing::{error, info, warn};

use gcegraph_core::auth::{AuthError, ServiceAccountTokens, StaticToken, TokenSource};
use gcegraph_core::collector::{CollectError, GceClient};
use gcegraph_core::config::{CREDENTIALS_ENV, ConfigError, Credentials};
use gcegraph_core::fmt::format_ms;
use gcegraph_core::inventory::{Inventory, InventoryCollector, InventoryError};
use gcegraph_core::resolver::{OverrideError, OverrideTable};

use access_log::AccessLogLayer;
use openapi::ApiDoc;
use state::{SharedState, WebApp};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Override table read when `--custom-sizes` is not given. May be absent.
const DEFAULT_CUSTOM_SIZES: &str = "custom_sizes.dict";

// ============================================================
// CLI
// ============================================================

#[derive(Parser)]
#[command(
    name = "gcegraph-web",
    about = "Compute Engine resource usage by region",
    version = gcegraph_core::VERSION
)]
struct Args {
    /// Listen address.
    #[arg(long, default_value = "127.0.0.1:5000", env = "GCEGRAPH_LISTEN")]
    listen: String,

    /// Custom machine type sizes, one `{'name': (vcpus, memory_mb)}` entry per line.
    /// Defaults to ./custom_sizes.dict when that file exists.
    #[arg(long, env = "GCEGRAPH_CUSTOM_SIZES")]
    custom_sizes: Option<PathBuf>,

    /// OAuth2 access token. Skips the service account token exchange.
    #[arg(long, env = "GCEGRAPH_ACCESS_TOKEN", hide_env_values = true)]
    access_token: Option<String>,

    /// Compute API base URL.
    #[arg(
        long,
        default_value = "https://compute.googleapis.com/compute/v1",
        env = "GCEGRAPH_API_BASE"
    )]
    api_base: String,

    /// Maximum results per aggregated list page.
    #[arg(long, default_value = "500")]
    page_size: u32,

    /// HTTP timeout for provider requests, in seconds.
    #[arg(long, default_value = "30")]
    timeout: u64,
}

#[derive(Debug, thiserror::Error)]
enum StartupError {
    #[error("credentials: {0}")]
    Config(#[from] ConfigError),
    #[error("custom sizes: {0}")]
    Overrides(#[from] OverrideError),
    #[error(
        "{0} holds no service account key; pass --access-token or point {1} at a service account key file"
    )]
    NoTokenSource(PathBuf, &'static str),
    #[error("authentication: {0}")]
    Auth(#[from] AuthError),
    #[error("compute client: {0}")]
    Client(#[from] CollectError),
    #[error(transparent)]
    Inventory(#[from] InventoryError),
}

// ============================================================
// Main
// ============================================================

fn main() {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gcegraph_web=info,gcegraph_core=info".into()),
        )
        .init();

    info!(version = gcegraph_core::VERSION, "starting");

    // Provider calls are blocking; finish them before the runtime exists.
    let inventory = match collect_inventory(&args) {
        Ok(inventory) => inventory,
        Err(e) => {
            error!(error = %e, "inventory aggregation failed");
            process::exit(1);
        }
    };

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            error!(error = %e, "failed to build tokio runtime");
            process::exit(1);
        }
    };
    runtime.block_on(async_main(args, inventory));
}

fn collect_inventory(args: &Args) -> Result<Inventory, StartupError> {
    let creds = Credentials::from_env()?;
    let overrides = load_overrides(args.custom_sizes.as_deref())?;
    let timeout = Duration::from_secs(args.timeout);

    info!(
        project = %creds.project_id,
        overrides = overrides.len(),
        "collecting inventory"
    );

    check_token_source(&creds, args.access_token.as_deref())?;
    match &args.access_token {
        Some(token) => run_collection(StaticToken::new(token.clone()), &creds, overrides, args),
        None => {
            let tokens = ServiceAccountTokens::from_credentials(&creds, timeout)?;
            run_collection(tokens, &creds, overrides, args)
        }
    }
}

fn run_collection<T: TokenSource>(
    tokens: T,
    creds: &Credentials,
    overrides: OverrideTable,
    args: &Args,
) -> Result<Inventory, StartupError> {
    let client = GceClient::new(tokens, Duration::from_secs(args.timeout))?
        .with_base_url(args.api_base.as_str())
        .with_page_size(args.page_size);

    let mut collector =
        InventoryCollector::new(client, creds.project_id.as_str()).with_overrides(overrides);
    let inventory = collector.collect()?;
    if inventory.summary.is_empty() {
        warn!(project = %inventory.project, "project has no instances, charts will be empty");
    }

    if let Some(t) = collector.last_timing() {
        info!(
            total = %format_ms(t.total),
            machine_types = %format_ms(t.machine_types),
            instances = %format_ms(t.instances),
            disks = %format_ms(t.disks),
            pages = t.machine_type_pages + t.instance_pages + t.disk_pages,
            "collection timing"
        );
    }
    Ok(inventory)
}

/// Without `--access-token` the credentials file must carry a service account key.
fn check_token_source(creds: &Credentials, access_token: Option<&str>) -> Result<(), StartupError> {
    if access_token.is_none() && !creds.is_service_account() {
        return Err(StartupError::NoTokenSource(
            credentials_path(),
            CREDENTIALS_ENV,
        ));
    }
    Ok(())
}

fn credentials_path() -> PathBuf {
    std::env::var_os(CREDENTIALS_ENV)
        .map(PathBuf::from)
        .unwrap_or_default()
}

/// An explicit path must exist; the default path is optional.
fn load_overrides(path: Option<&Path>) -> Result<OverrideTable, OverrideError> {
    match path {
        Some(path) => OverrideTable::load(path),
        None => {
            let default = Path::new(DEFAULT_CUSTOM_SIZES);
            if default.exists() {
                OverrideTable::load(default)
            } else {
                info!(
                    path = DEFAULT_CUSTOM_SIZES,
                    "no custom sizes file, using provider catalog only"
                );
                Ok(OverrideTable::new())
            }
        }
    }
}

fn build_router(state: SharedState) -> Router {
    Router::new()
        .route("/", get(handlers::redirect_summary))
        .route("/favicon.ico", get(handlers::redirect_summary))
        .route("/api/v1/health", get(handlers::handle_health))
        .route("/api/v1/inventory", get(handlers::handle_inventory))
        .route("/api/v1/hosts", get(handlers::handle_hosts))
        .route("/api/v1/regions", get(handlers::handle_regions))
        .route("/api/v1/regions/{region}", get(handlers::handle_region))
        .route(
            "/api/v1/charts/summary",
            get(handlers::handle_summary_charts),
        )
        .route(
            "/api/v1/charts/regions/{region}",
            get(handlers::handle_region_charts),
        )
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .fallback(get(handlers::serve_frontend))
        .with_state(state)
        .layer(AccessLogLayer)
        .layer(CorsLayer::permissive())
        .layer(CompressionLayer::new())
}

async fn async_main(args: Args, inventory: Inventory) {
    info!(
        project = %inventory.project,
        regions = inventory.summary.regions.len(),
        hosts = inventory.hosts.len(),
        "inventory ready"
    );

    let state: SharedState = Arc::new(WebApp::new(&inventory));
    let app = build_router(state).into_make_service_with_connect_info::<SocketAddr>();

    let addr: SocketAddr = match args.listen.parse() {
        Ok(addr) => addr,
        Err(e) => {
            error!(listen = %args.listen, error = %e, "invalid listen address");
            process::exit(1);
        }
    };

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(e) => {
            error!(%addr, error = %e, "failed to bind");
            process::exit(1);
        }
    };
    info!(%addr, "listening");

    if let Err(e) = axum::serve(listener, app).await {
        error!(error = %e, "server error");
        process::exit(1);
    }
}
