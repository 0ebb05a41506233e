use anyhow::{Context, Result};
use chrono::Timelike;
use clap::{Parser, ValueEnum};

use weathernow_core::{AppError, ConfigError};
use weathernow_ui::view::{self, ChartMetric};
use weathernow_ui::{AppDashboard, AppServices, DashboardUpdate, SearchUpdate};

#[derive(Parser, Debug)]
#[command(name = "weathernow", about = "Weather forecasts at your fingertips")]
struct Cli {
    /// Search for a place and show its weather (first match wins)
    #[arg(long)]
    search: Option<String>,

    /// Use the device's IP location
    #[arg(long)]
    locate: bool,

    /// Series shown in the history chart
    #[arg(long, value_enum, default_value_t = Metric::Temp)]
    metric: Metric,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Metric {
    Temp,
    Humidity,
    Pressure,
}

impl From<Metric> for ChartMetric {
    fn from(m: Metric) -> Self {
        match m {
            Metric::Temp => ChartMetric::Temp,
            Metric::Humidity => ChartMetric::Humidity,
            Metric::Pressure => ChartMetric::Pressure,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize core
    weathernow_core::init()?;

    let mut app = weathernow_core::App::new().map_err(explain_startup_error)?;
    tracing::info!("WeatherNow started");

    let services = AppServices::new(app.shared_config())?;
    let page = services.runtime().block_on(run(&services, &cli))?;

    println!("{}", page);

    // Graceful shutdown
    services.shutdown();
    app.shutdown()?;

    Ok(())
}

/// Config failures get the settings hint before the full error
fn explain_startup_error(err: anyhow::Error) -> anyhow::Error {
    match err.downcast::<ConfigError>() {
        Ok(config_err) => {
            let err = AppError::from(config_err);
            eprintln!("{}", err.user_message());
            err.into()
        }
        Err(err) => err,
    }
}

async fn run(services: &AppServices, cli: &Cli) -> Result<String> {
    let mut dashboard = services.dashboard();

    if cli.locate {
        dashboard.use_current_location();
        if dashboard.process_next().await == Some(DashboardUpdate::LocateFailed) {
            if let Some(e) = &dashboard.state().geo_error {
                eprintln!("{}", e.user_message());
            }
        }
    }

    if let Some(query) = &cli.search {
        search_and_select(services, &mut dashboard, query).await?;
    }

    dashboard.load_default();
    settle(&mut dashboard).await;

    let view = view::dashboard_view(
        dashboard.state(),
        cli.metric.into(),
        chrono::Local::now().hour(),
    );
    serde_json::to_string_pretty(&view).context("Failed to render dashboard")
}

/// Type `query` into the search box and pick the first result
async fn search_and_select(
    services: &AppServices,
    dashboard: &mut AppDashboard,
    query: &str,
) -> Result<()> {
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    let mut search = services.search(move |selection| {
        let _ = tx.send(selection);
    });

    search.on_input(query);
    if query.chars().count() >= search.settings().min_query_len {
        // Debounce fires first, then the lookup completes
        while let Some(update) = search.process_next().await {
            if !matches!(update, SearchUpdate::LookupIssued { .. }) {
                break;
            }
        }
    }

    if !search.select_index(0) {
        eprintln!("No places match '{}'", query);
        return Ok(());
    }

    let selection = rx
        .recv()
        .await
        .context("Search closed without a selection")?;
    dashboard.select_location(&selection);
    Ok(())
}

/// Apply service messages until nothing is loading
async fn settle(dashboard: &mut AppDashboard) {
    loop {
        let state = dashboard.state();
        if !state.loading && !state.history_loading && !state.geo_loading {
            break;
        }
        if dashboard.process_next().await.is_none() {
            break;
        }
    }
}
