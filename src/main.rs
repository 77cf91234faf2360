use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use axum_prometheus::PrometheusMetricLayer;
use clap::{Args, Parser, Subcommand};
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Deserialize;
use serde_json::json;
use stargauge::config::AppConfig;
use stargauge::error::AppError;
use stargauge::telemetry;
use stargauge::workflows::portfolio::{build_portfolio_report, PortfolioReport};
use stargauge::workflows::quality::domain::MeasurementPeriod;
use stargauge::workflows::quality::{CodeSetRegistry, MeasureRegistry, SnapshotImporter};
use std::io::Cursor;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
struct AppState {
    readiness: Arc<AtomicBool>,
    metrics: PrometheusHandle,
}

#[derive(Parser, Debug)]
#[command(
    name = "stargauge",
    about = "Evaluate quality measure compliance and simulate star ratings for a member population",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Run the measure engine against CSV extracts
    Quality {
        #[command(subcommand)]
        command: QualityCommand,
    },
}

#[derive(Args, Debug, Default)]
struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    port: Option<u16>,
}

#[derive(Subcommand, Debug)]
enum QualityCommand {
    /// Evaluate a population snapshot and print the portfolio report
    Report(QualityReportArgs),
}

#[derive(Args, Debug)]
struct QualityReportArgs {
    /// Member demographic table (CSV)
    #[arg(long)]
    members: PathBuf,
    /// Claims table with diagnosis/procedure codes (CSV)
    #[arg(long)]
    claims: PathBuf,
    /// Pharmacy fill table (CSV)
    #[arg(long)]
    pharmacy: Option<PathBuf>,
    /// Lab result table (CSV)
    #[arg(long)]
    labs: Option<PathBuf>,
    /// Measurement year (defaults to the configured year)
    #[arg(long)]
    year: Option<i32>,
    /// Annual plan revenue in dollars for bonus calculations
    #[arg(long)]
    plan_revenue: Option<f64>,
    /// Intervention budget ceiling in dollars
    #[arg(long)]
    budget: Option<f64>,
    /// How many ranked members to list (0 hides the list)
    #[arg(long, default_value_t = 10)]
    top: usize,
}

#[derive(Debug, Deserialize)]
struct QualityReportRequest {
    members_csv: String,
    claims_csv: String,
    #[serde(default)]
    pharmacy_csv: Option<String>,
    #[serde(default)]
    labs_csv: Option<String>,
    #[serde(default)]
    measurement_year: Option<i32>,
    #[serde(default)]
    plan_revenue: Option<f64>,
    #[serde(default)]
    budget: Option<f64>,
}

#[tokio::main]
async fn main() {
    if let Err(err) = run_cli().await {
        eprintln!("application error: {err}");
        std::process::exit(1);
    }
}

async fn run_cli() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => run_server(args).await,
        Command::Quality {
            command: QualityCommand::Report(args),
        } => run_quality_report(args),
    }
}

async fn run_server(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let state = AppState {
        readiness: readiness_flag.clone(),
        metrics: prometheus_handle,
    };

    let app = Router::new()
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
        .route("/api/v1/quality/report", post(quality_report_endpoint))
        .layer(prometheus_layer)
        .with_state(state);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "quality measure engine ready");

    axum::serve(listener, app).await?;
    Ok(())
}

fn run_quality_report(args: QualityReportArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let QualityReportArgs {
        members,
        claims,
        pharmacy,
        labs,
        year,
        plan_revenue,
        budget,
        top,
    } = args;

    let registry = MeasureRegistry::standard()?;
    let codes = CodeSetRegistry::standard();
    let snapshot = SnapshotImporter::from_paths(&members, &claims, pharmacy.as_ref(), labs.as_ref())?;

    let period = MeasurementPeriod::new(year.unwrap_or(config.engine.measurement_year));
    let revenue = plan_revenue.unwrap_or(config.engine.plan_revenue);
    let report = build_portfolio_report(&registry, &codes, period, &snapshot, revenue, budget);

    render_portfolio_report(&report, top);
    Ok(())
}

async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

async fn readiness_endpoint(State(state): State<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

async fn metrics_endpoint(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

async fn quality_report_endpoint(
    Json(payload): Json<QualityReportRequest>,
) -> Result<Json<PortfolioReport>, AppError> {
    let config = AppConfig::load()?;
    let QualityReportRequest {
        members_csv,
        claims_csv,
        pharmacy_csv,
        labs_csv,
        measurement_year,
        plan_revenue,
        budget,
    } = payload;

    let registry = MeasureRegistry::standard()?;
    let codes = CodeSetRegistry::standard();
    let snapshot = SnapshotImporter::from_readers(
        Cursor::new(members_csv.into_bytes()),
        Cursor::new(claims_csv.into_bytes()),
        pharmacy_csv.map(|csv| Cursor::new(csv.into_bytes())),
        labs_csv.map(|csv| Cursor::new(csv.into_bytes())),
    )?;

    let period = MeasurementPeriod::new(measurement_year.unwrap_or(config.engine.measurement_year));
    let revenue = plan_revenue.unwrap_or(config.engine.plan_revenue);
    let report = build_portfolio_report(&registry, &codes, period, &snapshot, revenue, budget);

    Ok(Json(report))
}

fn render_portfolio_report(report: &PortfolioReport, top: usize) {
    println!("Quality portfolio report, measurement year {}", report.measurement_year);
    println!("Members evaluated: {}", report.members_evaluated);

    println!("\nMeasure performance");
    for summary in &report.measure_summaries {
        println!(
            "- {}: {}/{} compliant ({:.1}%), {} open gaps, {} excluded",
            summary.measure_id.code(),
            summary.numerator,
            summary.eligible,
            summary.compliance_rate,
            summary.gaps,
            summary.excluded
        );
    }

    println!(
        "\nOverall rating: {:.2} stars, bonus {:.2}% of revenue (${:.0})",
        report.current_rating.overall_stars,
        report.current_rating.bonus_rate * 100.0,
        report.current_rating.bonus_payment
    );

    println!(
        "\nEquity score: {:.1} ({} penalty band)",
        report.equity.portfolio_score,
        match report.equity.penalty {
            stargauge::workflows::portfolio::EquityPenalty::None => "no",
            stargauge::workflows::portfolio::EquityPenalty::Moderate => "moderate",
            stargauge::workflows::portfolio::EquityPenalty::Severe => "severe",
        }
    );
    for record in report
        .equity
        .disparities
        .iter()
        .filter(|record| record.has_disparity)
    {
        println!(
            "- {} by {}: {:.1}pp spread ({}), lowest group {}",
            record.measure_id.code(),
            record.variable.label(),
            record.magnitude_pp,
            record.band.label(),
            record.lowest_group.as_deref().unwrap_or("n/a")
        );
    }

    if top > 0 && !report.priorities.is_empty() {
        println!("\nTop intervention targets");
        for entry in report.priorities.iter().take(top) {
            println!(
                "- {}: priority {:.0}, {} gaps, cost ${:.0}, ROI {:.2}",
                entry.member_id.0,
                entry.priority_score,
                entry.gap_measures.len(),
                entry.total_cost,
                entry.expected_roi
            );
        }
    }

    if let Some(plan) = &report.budget_plan {
        println!(
            "\nBudget plan: {} members within ${:.0} (spent ${:.0})",
            plan.admitted.len(),
            plan.budget,
            plan.total_cost
        );
    }

    println!("\nClosure scenarios");
    for scenario in &report.scenarios {
        println!(
            "- {}: {:.2} stars ({:+.2}), bonus delta ${:+.0}",
            scenario.name,
            scenario.rating.overall_stars,
            scenario.star_delta,
            scenario.bonus_delta
        );
    }
}
