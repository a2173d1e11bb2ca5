use super::common::*;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use serde_json::json;
use tower::ServiceExt;

use crate::scheduling::domain::BookingStatus;
use crate::scheduling::memory::InMemoryGateway;
use crate::scheduling::{home_visit_router, HomeVisitService};

fn router(gateway: InMemoryGateway) -> axum::Router {
    home_visit_router(home_visit_service(gateway))
}

fn staffed_gateway() -> InMemoryGateway {
    let gateway = seeded_gateway(None);
    gateway.insert_staff(staff("s-1", "Ana")).expect("staff stored");
    gateway.insert_staff(staff("s-2", "Budi")).expect("staff stored");
    gateway
}

async fn get(router: axum::Router, uri: &str) -> axum::response::Response {
    router
        .oneshot(Request::get(uri).body(Body::empty()).expect("request builds"))
        .await
        .expect("route executes")
}

#[tokio::test]
async fn availability_route_returns_slots_by_slug() {
    let response = get(
        router(staffed_gateway()),
        "/api/v1/tenants/sparkle/home-visit/availability?serviceId=svc-cleaning&date=2024-06-10",
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    assert_eq!(body["serviceId"], "svc-cleaning");
    assert_eq!(body["requiresStaff"], true);
    assert_eq!(body["dailyQuota"], 3);
    assert_eq!(body["slots"][0]["time"], "09:00");
    assert_eq!(body["slots"][0]["staffAvailable"], 2);
    assert_eq!(body["slots"][0]["staffNames"], json!(["Ana", "Budi"]));
}

#[tokio::test]
async fn availability_route_accepts_tenant_uuid() {
    let uri = format!(
        "/api/v1/tenants/{}/home-visit/availability?serviceId=svc-massage&date=2024-06-10",
        tenant_id()
    );
    let response = get(router(seeded_gateway(None)), &uri).await;

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn availability_route_rejects_missing_and_malformed_input() {
    let missing_date = get(
        router(seeded_gateway(None)),
        "/api/v1/tenants/sparkle/home-visit/availability?serviceId=svc-massage",
    )
    .await;
    assert_eq!(missing_date.status(), StatusCode::BAD_REQUEST);
    let body = read_json_body(missing_date).await;
    assert_eq!(body["error"], "date is required");

    let malformed = get(
        router(seeded_gateway(None)),
        "/api/v1/tenants/sparkle/home-visit/availability?serviceId=svc-massage&date=10-06-2024",
    )
    .await;
    assert_eq!(malformed.status(), StatusCode::BAD_REQUEST);

    let missing_service = get(
        router(seeded_gateway(None)),
        "/api/v1/tenants/sparkle/home-visit/availability?date=2024-06-10",
    )
    .await;
    assert_eq!(missing_service.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn availability_route_returns_not_found_for_unknown_tenant_or_service() {
    let unknown_tenant = get(
        router(seeded_gateway(None)),
        "/api/v1/tenants/nobody/home-visit/availability?serviceId=svc-massage&date=2024-06-10",
    )
    .await;
    assert_eq!(unknown_tenant.status(), StatusCode::NOT_FOUND);

    let unknown_service = get(
        router(seeded_gateway(None)),
        "/api/v1/tenants/sparkle/home-visit/availability?serviceId=svc-nope&date=2024-06-10",
    )
    .await;
    assert_eq!(unknown_service.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn unsupported_service_returns_flagged_bad_request() {
    let response = get(
        router(seeded_gateway(None)),
        "/api/v1/tenants/sparkle/home-visit/availability?serviceId=svc-salon&date=2024-06-10",
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = read_json_body(response).await;
    assert_eq!(body["isHomeVisitSupported"], false);
    assert_eq!(body["slots"], json!([]));
}

#[tokio::test]
async fn calendar_route_lists_days() {
    let response = get(
        router(seeded_gateway(None)),
        "/api/v1/tenants/sparkle/home-visit/calendar?serviceId=svc-massage&from=2024-06-10&to=2024-06-16",
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    assert_eq!(body.as_array().map(Vec::len), Some(7));
    assert_eq!(body[0]["date"], "2024-06-10");
}

#[tokio::test]
async fn calendar_route_rejects_long_ranges() {
    let response = get(
        router(seeded_gateway(None)),
        "/api/v1/tenants/sparkle/home-visit/calendar?serviceId=svc-massage&from=2024-06-10&to=2024-09-10",
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn staff_match_route_assigns_least_loaded_staff() {
    let gateway = staffed_gateway();
    gateway
        .insert_booking(home_visit(
            CLEANING,
            at(monday(), 9, 0),
            BookingStatus::Confirmed,
            Some("s-1"),
        ))
        .expect("booking stored");

    let response = router(gateway)
        .oneshot(
            Request::post("/api/v1/tenants/sparkle/home-visit/staff-match")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    json!({ "serviceId": "svc-cleaning", "date": "2024-06-10", "time": "13:00" })
                        .to_string(),
                ))
                .expect("request builds"),
        )
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    assert_eq!(body["matched"], true);
    assert_eq!(body["staff"]["staff"]["id"], "s-2");
    assert_eq!(body["staff"]["bookingLoad"], 0);
}

#[tokio::test]
async fn staff_match_route_rejects_bad_time() {
    let response = router(staffed_gateway())
        .oneshot(
            Request::post("/api/v1/tenants/sparkle/home-visit/staff-match")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    json!({ "serviceId": "svc-cleaning", "date": "2024-06-10", "time": "noon" })
                        .to_string(),
                ))
                .expect("request builds"),
        )
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

async fn post_staff_match(router: axum::Router, body: serde_json::Value) -> axum::response::Response {
    router
        .oneshot(
            Request::post("/api/v1/tenants/sparkle/home-visit/staff-match")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .expect("request builds"),
        )
        .await
        .expect("route executes")
}

#[tokio::test]
async fn staff_match_route_requires_every_field() {
    let response = post_staff_match(
        router(staffed_gateway()),
        json!({ "serviceId": "svc-cleaning", "date": "2024-06-10" }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = read_json_body(response).await;
    assert_eq!(body["error"], "time is required");

    let response = post_staff_match(
        router(staffed_gateway()),
        json!({ "date": "2024-06-10", "time": "09:00" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn staff_match_route_reports_unknown_service() {
    let response = post_staff_match(
        router(staffed_gateway()),
        json!({ "serviceId": "svc-nope", "date": "2024-06-10", "time": "09:00" }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = read_json_body(response).await;
    assert!(body["error"]
        .as_str()
        .is_some_and(|message| message.contains("svc-nope")));
}

#[tokio::test]
async fn gateway_failures_surface_as_server_errors() {
    let flaky = FlakyGateway::new(seeded_gateway(None)).failing_quota();
    let service = Arc::new(HomeVisitService::new(Arc::new(flaky), config()));

    let response = get(
        home_visit_router(service),
        "/api/v1/tenants/sparkle/home-visit/availability?serviceId=svc-massage&date=2024-06-10",
    )
    .await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = read_json_body(response).await;
    assert!(body["error"]
        .as_str()
        .is_some_and(|message| message.contains("bookings table offline")));
}
