use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::json;

use super::domain::{CohortId, ProfileId};
use super::repository::{AssignmentRepository, ProfileStore, RoomDirectory};
use super::service::{CancelToken, MatchingService, MatchingServiceError};

const DEFAULT_MATCH_LIMIT: usize = 10;

/// Router builder exposing the matching engine's HTTP operations.
pub fn matching_router<P, R, A>(service: Arc<MatchingService<P, R, A>>) -> Router
where
    P: ProfileStore + 'static,
    R: RoomDirectory + 'static,
    A: AssignmentRepository + 'static,
{
    Router::new()
        .route(
            "/api/v1/cohorts/:cohort_id/match",
            post(run_matching_handler::<P, R, A>),
        )
        .route(
            "/api/v1/cohorts/:cohort_id/assignments",
            get(current_assignments_handler::<P, R, A>),
        )
        .route(
            "/api/v1/profiles/:profile_id/matches",
            get(top_matches_handler::<P, R, A>),
        )
        .route(
            "/api/v1/compatibility/:profile_a/:profile_b",
            get(explain_handler::<P, R, A>),
        )
        .with_state(service)
}

#[derive(Debug, Deserialize)]
struct TopMatchesQuery {
    limit: Option<usize>,
}

pub(crate) async fn run_matching_handler<P, R, A>(
    State(service): State<Arc<MatchingService<P, R, A>>>,
    Path(cohort_id): Path<String>,
) -> Response
where
    P: ProfileStore + 'static,
    R: RoomDirectory + 'static,
    A: AssignmentRepository + 'static,
{
    let cohort = CohortId(cohort_id);
    match service.run_matching_for_cohort(&cohort, &CancelToken::new()) {
        Ok(outcome) => (StatusCode::OK, axum::Json(outcome)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn current_assignments_handler<P, R, A>(
    State(service): State<Arc<MatchingService<P, R, A>>>,
    Path(cohort_id): Path<String>,
) -> Response
where
    P: ProfileStore + 'static,
    R: RoomDirectory + 'static,
    A: AssignmentRepository + 'static,
{
    let cohort = CohortId(cohort_id);
    match service.current_assignments(&cohort) {
        Ok(assignments) => (
            StatusCode::OK,
            axum::Json(json!({
                "cohort_id": cohort,
                "assignments": assignments,
            })),
        )
            .into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn top_matches_handler<P, R, A>(
    State(service): State<Arc<MatchingService<P, R, A>>>,
    Path(profile_id): Path<String>,
    Query(query): Query<TopMatchesQuery>,
) -> Response
where
    P: ProfileStore + 'static,
    R: RoomDirectory + 'static,
    A: AssignmentRepository + 'static,
{
    let profile = ProfileId(profile_id);
    let limit = query.limit.unwrap_or(DEFAULT_MATCH_LIMIT);
    match service.top_matches(&profile, limit) {
        Ok(edges) => (
            StatusCode::OK,
            axum::Json(json!({
                "profile_id": profile,
                "matches": edges,
            })),
        )
            .into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn explain_handler<P, R, A>(
    State(service): State<Arc<MatchingService<P, R, A>>>,
    Path((profile_a, profile_b)): Path<(String, String)>,
) -> Response
where
    P: ProfileStore + 'static,
    R: RoomDirectory + 'static,
    A: AssignmentRepository + 'static,
{
    match service.explain(&ProfileId(profile_a), &ProfileId(profile_b)) {
        Ok(explanation) => (StatusCode::OK, axum::Json(explanation)).into_response(),
        Err(error) => error_response(error),
    }
}

fn error_response(error: MatchingServiceError) -> Response {
    let status = match &error {
        MatchingServiceError::CohortNotFound(_) | MatchingServiceError::ProfileNotFound(_) => {
            StatusCode::NOT_FOUND
        }
        MatchingServiceError::CohortMismatch(_, _) => StatusCode::UNPROCESSABLE_ENTITY,
        MatchingServiceError::Cancelled => StatusCode::CONFLICT,
        MatchingServiceError::Store(_) | MatchingServiceError::Graph(_) => {
            StatusCode::SERVICE_UNAVAILABLE
        }
    };

    let payload = json!({ "error": error.to_string() });
    (status, axum::Json(payload)).into_response()
}
