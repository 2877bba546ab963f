use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use prixfixe_frontend::config::{self, FrontendConfig};
use prixfixe_frontend::datastore::{ApiBackend, DataStore};
use prixfixe_frontend::handlers::{router, Service};
use prixfixe_frontend::middleware::session_middleware;
use prixfixe_frontend::observability::init_logging;
use prixfixe_frontend::panicker::ProcessPanicker;
use prixfixe_frontend::services::{ApiAuthService, ApiPaymentManager};

#[derive(Parser)]
#[command(name = "prixfixe-frontend")]
#[command(about = "Server-rendered HTML frontend for prixfixe")]
#[command(version)]
struct Args {
    #[arg(long, help = "Port to listen on")]
    port: Option<u16>,

    #[arg(long, env = "FRONTEND_CONFIG", help = "YAML config file")]
    config: Option<String>,

    #[arg(long, help = "Serve generated data instead of reading the backend")]
    fake_data: bool,

    #[arg(long, help = "Log at debug level")]
    debug: bool,
}

impl Args {
    fn load_config(&self) -> anyhow::Result<FrontendConfig> {
        let mut config = match &self.config {
            Some(path) => FrontendConfig::from_yaml_file(path).context("loading config file")?,
            None => config::config().clone(),
        };

        if let Some(port) = self.port {
            config.server.port = port;
        }
        config.use_fake_data |= self.fake_data;
        config.debug |= self.debug;

        Ok(config)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so SESSION_SECRET, BACKEND_BASE_URL, etc. apply.
    let _ = dotenvy::dotenv();

    let args = Args::parse();
    let config = args.load_config()?;
    init_logging(config.debug);
    tracing::info!("Starting prixfixe frontend in {:?} mode", config.environment);

    let backend = ApiBackend::new(&config.backend).context("building backend client")?;
    let mut data_store = DataStore::build(&backend);
    if config.use_fake_data {
        tracing::info!("serving fake data for every read");
        data_store = data_store.with_fake_reads();
    }

    let port = config.server.port;
    let enable_cors = config.server.enable_cors;
    let session_config = Arc::new(config.session.clone());

    let service = Service::new(
        config,
        data_store,
        Arc::new(ApiAuthService::new(backend.clone())),
        Arc::new(ApiPaymentManager::new(backend)),
        Arc::new(ProcessPanicker),
    )
    .context("building frontend service")?;

    let mut app = router(Arc::new(service))
        .layer(axum::middleware::from_fn_with_state(session_config, session_middleware));
    if enable_cors {
        app = app.layer(CorsLayer::permissive());
    }
    let app = app.layer(TraceLayer::new_for_http());

    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("prixfixe frontend listening on http://{}", bind_addr);
    axum::serve(listener, app).await.context("serving")?;

    Ok(())
}
