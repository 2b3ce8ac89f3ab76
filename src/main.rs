use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use axum_prometheus::PrometheusMetricLayer;
use clap::{Args, Parser, Subcommand};
use metrics_exporter_prometheus::PrometheusHandle;
use roomie_match::config::AppConfig;
use roomie_match::error::AppError;
use roomie_match::matching::{
    matching_router, profiles_from_path, rooms_from_path, CancelToken, CohortId,
    CompatibilityScorer, DealBreakerFilter, DealBreakerPolicy, InMemoryAssignmentRepository,
    InMemoryProfileStore, InMemoryRoomDirectory, MatchingRunOutcome, MatchingService,
    MatchingServiceError, PriorityWeights, Profile, Room, RoomAllocator, ScoringConfig,
};
use roomie_match::telemetry;
use serde_json::json;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;

type InMemoryService =
    MatchingService<InMemoryProfileStore, InMemoryRoomDirectory, InMemoryAssignmentRepository>;

#[derive(Clone)]
struct AppState {
    readiness: Arc<AtomicBool>,
    metrics: PrometheusHandle,
}

#[derive(Parser, Debug)]
#[command(
    name = "Roommate Matching Engine",
    about = "Run the roommate compatibility matching engine as a service or from the command line",
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
    /// Run the matching pipeline against CSV exports
    Match {
        #[command(subcommand)]
        command: MatchCommand,
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
    /// Survey CSV export used to seed the profile store
    #[arg(long)]
    profiles: Option<PathBuf>,
    /// Room inventory CSV used to seed the room directory
    #[arg(long)]
    rooms: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum MatchCommand {
    /// Execute graph -> match -> allocate for one cohort and print the result
    Run(MatchRunArgs),
}

#[derive(Args, Debug)]
struct MatchRunArgs {
    /// Survey CSV export for the cohort
    #[arg(long)]
    profiles: PathBuf,
    /// Room inventory CSV
    #[arg(long)]
    rooms: PathBuf,
    /// Cohort to match (defaults to the cohort of the first imported profile)
    #[arg(long)]
    cohort: Option<String>,
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
        Command::Match {
            command: MatchCommand::Run(args),
        } => run_match(args),
    }
}

fn build_service(profiles: Vec<Profile>, rooms: Vec<Room>) -> Result<InMemoryService, AppError> {
    let profile_store = Arc::new(
        InMemoryProfileStore::with_profiles(profiles).map_err(MatchingServiceError::from)?,
    );
    let room_directory = Arc::new(InMemoryRoomDirectory::with_rooms(rooms));
    let assignments = Arc::new(InMemoryAssignmentRepository::default());

    Ok(MatchingService::new(
        profile_store,
        room_directory,
        assignments,
        CompatibilityScorer::new(ScoringConfig::default()),
        DealBreakerFilter::new(DealBreakerPolicy::default()),
        RoomAllocator::new(PriorityWeights::default()),
    ))
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

    let profiles = match args.profiles {
        Some(path) => profiles_from_path(path)?,
        None => Vec::new(),
    };
    let rooms = match args.rooms {
        Some(path) => rooms_from_path(path)?,
        None => Vec::new(),
    };
    let service = Arc::new(build_service(profiles, rooms)?);

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
        .with_state(state)
        .merge(matching_router(service))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "roommate matching engine ready");

    axum::serve(listener, app).await?;
    Ok(())
}

fn run_match(args: MatchRunArgs) -> Result<(), AppError> {
    let profiles = profiles_from_path(&args.profiles)?;
    let rooms = rooms_from_path(&args.rooms)?;

    let cohort = match args.cohort {
        Some(id) => CohortId(id),
        None => match profiles.first() {
            Some(profile) => profile.cohort_id.clone(),
            None => {
                println!("No profiles in {}", args.profiles.display());
                return Ok(());
            }
        },
    };

    let service = build_service(profiles, rooms)?;
    let outcome = service.run_matching_for_cohort(&cohort, &CancelToken::new())?;
    render_match_report(&outcome);

    Ok(())
}

fn render_match_report(outcome: &MatchingRunOutcome) {
    println!("Matching run for cohort {}", outcome.cohort_id.0);

    if outcome.assignments.is_empty() {
        println!("\nAssignments: none");
    } else {
        println!("\nAssignments");
        for assignment in &outcome.assignments {
            let members: Vec<&str> = assignment
                .members
                .iter()
                .map(|member| member.0.as_str())
                .collect();
            println!(
                "- room {}: {} (score {}, status {})",
                assignment.room_id.0,
                members.join(" + "),
                assignment.score,
                assignment.status.label()
            );
        }
    }

    if outcome.unresolved.is_empty() {
        println!("\nUnresolved pairs: none");
    } else {
        println!("\nUnresolved pairs (no room with remaining capacity)");
        for unresolved in &outcome.unresolved {
            println!(
                "- {} + {} (score {}): {}",
                unresolved.pair.pair.first.0,
                unresolved.pair.pair.second.0,
                unresolved.pair.score,
                unresolved.reason
            );
        }
    }

    if outcome.unmatched.is_empty() {
        println!("\nUnmatched profiles: none");
    } else {
        println!("\nUnmatched profiles (need another pass or manual handling)");
        for profile in &outcome.unmatched {
            println!("- {}", profile.0);
        }
    }
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
