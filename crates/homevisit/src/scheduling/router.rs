use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::error;

use super::composer::AvailabilityError;
use super::domain::{ServiceId, SlotTime};
use crate::error::AppError;
use super::gateway::{ConstraintGateway, TenantDirectory};
use super::selector::StaffMatch;
use super::service::{HomeVisitService, HomeVisitServiceError};

/// Router builder exposing the availability, calendar, and staff-match endpoints.
pub fn home_visit_router<G>(service: Arc<HomeVisitService<G>>) -> Router
where
    G: ConstraintGateway + TenantDirectory + 'static,
{
    Router::new()
        .route(
            "/api/v1/tenants/:tenant/home-visit/availability",
            get(availability_handler::<G>),
        )
        .route(
            "/api/v1/tenants/:tenant/home-visit/calendar",
            get(calendar_handler::<G>),
        )
        .route(
            "/api/v1/tenants/:tenant/home-visit/staff-match",
            post(staff_match_handler::<G>),
        )
        .with_state(service)
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AvailabilityParams {
    pub(crate) service_id: Option<String>,
    pub(crate) date: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CalendarParams {
    pub(crate) service_id: Option<String>,
    pub(crate) from: Option<String>,
    pub(crate) to: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct StaffMatchRequest {
    pub(crate) service_id: Option<String>,
    pub(crate) date: Option<String>,
    pub(crate) time: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct StaffMatchResponse {
    pub(crate) matched: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) staff: Option<StaffMatch>,
}

/// Parses a `YYYY-MM-DD` date, reporting the raw input on failure.
pub fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

fn required<'a>(value: &'a Option<String>, name: &str) -> Result<&'a str, String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| format!("{name} is required"))
}

fn bad_request(message: impl Into<String>) -> Response {
    let payload = json!({ "error": message.into() });
    (StatusCode::BAD_REQUEST, Json(payload)).into_response()
}

fn error_response(err: HomeVisitServiceError) -> Response {
    if matches!(
        err,
        HomeVisitServiceError::Gateway(_)
            | HomeVisitServiceError::Availability(AvailabilityError::Gateway(_))
    ) {
        error!(error = %err, "home visit request failed");
    }
    AppError::from(err).into_response()
}

pub(crate) async fn availability_handler<G>(
    State(service): State<Arc<HomeVisitService<G>>>,
    Path(tenant): Path<String>,
    Query(params): Query<AvailabilityParams>,
) -> Response
where
    G: ConstraintGateway + TenantDirectory + 'static,
{
    let service_id = match required(&params.service_id, "serviceId") {
        Ok(value) => ServiceId(value.to_string()),
        Err(message) => return bad_request(message),
    };
    let date = match required(&params.date, "date").and_then(parse_date) {
        Ok(date) => date,
        Err(message) => return bad_request(message),
    };

    match service.availability(&tenant, &service_id, date).await {
        Ok(result) if result.is_home_visit_supported => {
            (StatusCode::OK, Json(result)).into_response()
        }
        Ok(result) => (StatusCode::BAD_REQUEST, Json(result)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn calendar_handler<G>(
    State(service): State<Arc<HomeVisitService<G>>>,
    Path(tenant): Path<String>,
    Query(params): Query<CalendarParams>,
) -> Response
where
    G: ConstraintGateway + TenantDirectory + 'static,
{
    let service_id = match required(&params.service_id, "serviceId") {
        Ok(value) => ServiceId(value.to_string()),
        Err(message) => return bad_request(message),
    };
    let from = match required(&params.from, "from").and_then(parse_date) {
        Ok(date) => date,
        Err(message) => return bad_request(message),
    };
    let to = match required(&params.to, "to").and_then(parse_date) {
        Ok(date) => date,
        Err(message) => return bad_request(message),
    };

    match service.calendar(&tenant, &service_id, from, to).await {
        Ok(days) => (StatusCode::OK, Json(days)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn staff_match_handler<G>(
    State(service): State<Arc<HomeVisitService<G>>>,
    Path(tenant): Path<String>,
    Json(request): Json<StaffMatchRequest>,
) -> Response
where
    G: ConstraintGateway + TenantDirectory + 'static,
{
    let service_id = match required(&request.service_id, "serviceId") {
        Ok(value) => ServiceId(value.to_string()),
        Err(message) => return bad_request(message),
    };
    let date = match required(&request.date, "date").and_then(parse_date) {
        Ok(date) => date,
        Err(message) => return bad_request(message),
    };
    let time = match required(&request.time, "time")
        .and_then(|raw| raw.parse::<SlotTime>().map_err(|err| err.to_string()))
    {
        Ok(time) => time,
        Err(message) => return bad_request(message),
    };

    match service.match_staff(&tenant, &service_id, date, time).await {
        Ok(staff) => {
            let payload = StaffMatchResponse {
                matched: staff.is_some(),
                staff,
            };
            (StatusCode::OK, Json(payload)).into_response()
        }
        Err(err) => error_response(err),
    }
}
