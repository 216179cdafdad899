use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::api::{create_router, AppState};
use crate::cache::{DataSource, TtlCache};
use crate::config::Config;
use crate::fetcher::{SheetsFetcher, ValueRender};
use crate::importers::WorkbookImporter;
use crate::metrics::MetricTable;
use crate::operational::OperationalSnapshot;
use crate::services::DashboardService;

const MIN_RETRY_DELAY: Duration = Duration::from_millis(500);

/// Application with the spawned HTTP server
pub struct Application {
    pub server_handle: JoinHandle<Result<(), std::io::Error>>,
}

/// Both sheet sources, from a local workbook export or the Sheets API
pub struct DataSources {
    pub dashboard: Arc<dyn DataSource<MetricTable>>,
    pub operational: Arc<dyn DataSource<OperationalSnapshot>>,
}

impl DataSources {
    pub fn from_config(config: &Config) -> Self {
        if let Some(path) = &config.workbook_path {
            info!("Reading sheets from workbook export {}", path.display());
            return Self {
                dashboard: Arc::new(WorkbookImporter::new(path, &config.dashboard_sheet)),
                operational: Arc::new(WorkbookImporter::new(path, &config.operational_sheet)),
            };
        }

        info!("Reading sheets from spreadsheet {}", config.spreadsheet_id);
        let fetcher = |sheet: &str, render: ValueRender| {
            SheetsFetcher::new(&config.spreadsheet_id, sheet, render)
                .with_base_url(&config.sheets_base_url)
                .with_api_key(config.sheets_api_key.clone())
                .with_access_token(config.sheets_access_token.clone())
                .with_retries(config.fetch_max_retries, MIN_RETRY_DELAY)
                .with_timeout(config.fetch_timeout())
        };

        Self {
            dashboard: Arc::new(fetcher(&config.dashboard_sheet, ValueRender::Formatted)),
            operational: Arc::new(fetcher(&config.operational_sheet, ValueRender::Unformatted)),
        }
    }
}

impl Application {
    /// Build the caches and dashboard service, then spawn the HTTP server
    pub async fn build(config: Config) -> Result<Self, Box<dyn std::error::Error>> {
        info!("Initializing application components");

        let vocab = config.vocabulary()?;
        let sources = DataSources::from_config(&config);

        info!("Cache TTL: {:?}", config.cache_ttl());
        let table_cache = Arc::new(TtlCache::new(sources.dashboard, config.cache_ttl()));
        let operational_cache = Arc::new(TtlCache::new(sources.operational, config.cache_ttl()));

        let dashboard_service = DashboardService::new(table_cache, operational_cache, vocab);

        let app_state = AppState { dashboard_service };
        let app = create_router(app_state).layer(TraceLayer::new_for_http());

        let addr = config.server_addr();
        info!("Starting HTTP server on {}", addr);

        let listener = tokio::net::TcpListener::bind(&addr).await?;
        let server_handle = tokio::spawn(async move { axum::serve(listener, app).await });

        info!("Application initialized successfully");

        Ok(Self { server_handle })
    }

    /// Run until the server stops
    pub async fn run_until_stopped(self) -> Result<(), Box<dyn std::error::Error>> {
        self.server_handle.await??;
        Ok(())
    }
}
