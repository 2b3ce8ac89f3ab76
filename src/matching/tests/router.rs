use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use tower::ServiceExt;

use super::common::*;
use crate::matching::domain::{DealBreakerTag, SmokingHabit, ToleranceLevel};
use crate::matching::router::matching_router;

fn cohort_profiles(count: usize) -> Vec<crate::matching::domain::Profile> {
    (1..=count).map(|n| profile(&format!("p{n}"))).collect()
}

fn router_with(
    profiles: Vec<crate::matching::domain::Profile>,
    rooms: Vec<crate::matching::domain::Room>,
) -> axum::Router {
    let (service, _, _) = build_service(profiles, rooms);
    matching_router(Arc::new(service))
}

#[tokio::test]
async fn match_endpoint_runs_the_cohort_pipeline() {
    let app = router_with(cohort_profiles(4), vec![room("a-101", 1, 2), room("a-102", 1, 2)]);

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(format!("/api/v1/cohorts/{COHORT}/match"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    assert_eq!(body["cohort_id"], COHORT);
    assert_eq!(body["assignments"].as_array().unwrap().len(), 2);
    assert_eq!(body["unmatched"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn match_endpoint_maps_unknown_cohorts_to_not_found() {
    let app = router_with(cohort_profiles(2), vec![room("a-101", 1, 2)]);

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/cohorts/spring-2099/match")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = read_json_body(response).await;
    assert!(body["error"].as_str().unwrap().contains("spring-2099"));
}

#[tokio::test]
async fn assignments_endpoint_reads_the_committed_batch() {
    let app = router_with(cohort_profiles(2), vec![room("a-101", 1, 2)]);

    let run = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(format!("/api/v1/cohorts/{COHORT}/match"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(run.status(), StatusCode::OK);

    let response = app
        .oneshot(
            Request::builder()
                .uri(format!("/api/v1/cohorts/{COHORT}/assignments"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    let assignments = body["assignments"].as_array().unwrap();
    assert_eq!(assignments.len(), 1);
    assert_eq!(assignments[0]["room_id"], "a-101");
    assert_eq!(assignments[0]["status"], "pending_approval");
}

#[tokio::test]
async fn assignments_endpoint_is_empty_before_any_run() {
    let app = router_with(cohort_profiles(2), vec![room("a-101", 1, 2)]);

    let response = app
        .oneshot(
            Request::builder()
                .uri(format!("/api/v1/cohorts/{COHORT}/assignments"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    assert_eq!(body["assignments"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn top_matches_endpoint_honors_the_limit_query() {
    let app = router_with(cohort_profiles(5), Vec::new());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/profiles/p1/matches?limit=2")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    assert_eq!(body["profile_id"], "p1");
    assert_eq!(body["matches"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn top_matches_endpoint_rejects_unknown_profiles() {
    let app = router_with(cohort_profiles(2), Vec::new());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/profiles/ghost/matches")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn compatibility_endpoint_returns_a_scored_verdict() {
    let app = router_with(cohort_profiles(2), Vec::new());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/compatibility/p1/p2")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    assert_eq!(body["kind"], "scored");
    assert!(body["overall"].as_u64().unwrap() >= 90);
    assert!(!body["reasons"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn compatibility_endpoint_reports_excluded_pairs() {
    let mut a = profile("p1");
    a.deal_breakers.insert(DealBreakerTag::Smoking);
    let mut b = profile("p2");
    b.lifestyle.smoking = SmokingHabit::Regular;
    b.lifestyle.smoking_tolerance = ToleranceLevel::High;

    let app = router_with(vec![a, b], Vec::new());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/compatibility/p1/p2")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    assert_eq!(body["kind"], "inadmissible");
    assert!(!body["violations"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn compatibility_endpoint_rejects_cross_cohort_pairs() {
    let a = profile("p1");
    let mut b = profile("p2");
    b.cohort_id = crate::matching::domain::CohortId("spring-2027".to_string());

    let app = router_with(vec![a, b], Vec::new());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/compatibility/p1/p2")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}
