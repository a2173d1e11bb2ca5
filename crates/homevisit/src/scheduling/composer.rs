use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use super::domain::{QualifiedStaff, Service, ServiceId, SlotTime, TenantId};
use super::evaluator::{SlotWindow, StaffAvailabilityEvaluator};
use super::gateway::{ConstraintGateway, GatewayError};
use super::quota::{QuotaSnapshot, SlotQuotaTracker};

/// Longest inclusive range accepted by [`AvailabilityComposer::calendar`].
pub const MAX_CALENDAR_DAYS: i64 = 31;

pub const MESSAGE_BLOCKED: &str = "This date is blocked for home visits";
pub const MESSAGE_FULLY_BOOKED: &str = "This date is fully booked";
pub const MESSAGE_NO_STAFF: &str = "No staff available for this date";
pub const MESSAGE_UNSUPPORTED: &str = "Home visits are not offered for this service";
pub const MESSAGE_DISABLED: &str = "Home visits are currently disabled for this business";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotAvailability {
    pub time: SlotTime,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub available: bool,
    pub is_booked: bool,
    pub staff_available: u32,
    pub staff_names: Vec<String>,
    /// Staff checks that failed or timed out for this slot.
    pub staff_unverified: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityResult {
    pub date: NaiveDate,
    pub service_id: ServiceId,
    pub service_name: String,
    pub service_duration: u32,
    pub is_home_visit_supported: bool,
    pub requires_staff: bool,
    pub daily_quota: u32,
    pub booked_count: u32,
    pub remaining_quota: u32,
    pub slots: Vec<SlotAvailability>,
    pub available_slots: u32,
    pub message: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_blocked: bool,
}

impl AvailabilityResult {
    fn closed(service: &Service, date: NaiveDate, message: &str) -> Self {
        Self {
            date,
            service_id: service.id.clone(),
            service_name: service.name.clone(),
            service_duration: service.duration_minutes,
            is_home_visit_supported: false,
            requires_staff: service.requires_staff_assignment,
            daily_quota: 0,
            booked_count: 0,
            remaining_quota: 0,
            slots: Vec::new(),
            available_slots: 0,
            message: message.to_string(),
            is_blocked: false,
        }
    }
}

/// Per-day summary produced by [`AvailabilityComposer::calendar`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarDay {
    pub date: NaiveDate,
    pub is_blocked: bool,
    pub available_slots: u32,
    pub remaining_quota: u32,
    pub message: String,
}

#[derive(Debug, thiserror::Error)]
pub enum AvailabilityError {
    #[error("service '{0}' not found")]
    ServiceNotFound(ServiceId),
    #[error("date range {from}..={to} must be ordered and span at most 31 days")]
    InvalidRange { from: NaiveDate, to: NaiveDate },
    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

/// Combines quota, blocked dates, slot occupancy, and staff checks into the
/// list of bookable home visit slots for one service and date.
pub struct AvailabilityComposer<G> {
    gateway: Arc<G>,
    quota: SlotQuotaTracker<G>,
    evaluator: StaffAvailabilityEvaluator<G>,
    max_concurrent_checks: usize,
}

impl<G> AvailabilityComposer<G>
where
    G: ConstraintGateway + 'static,
{
    pub fn new(
        gateway: Arc<G>,
        evaluator: StaffAvailabilityEvaluator<G>,
        max_concurrent_checks: usize,
    ) -> Self {
        Self {
            quota: SlotQuotaTracker::new(Arc::clone(&gateway)),
            gateway,
            evaluator,
            max_concurrent_checks: max_concurrent_checks.max(1),
        }
    }

    pub async fn available_slots(
        &self,
        tenant: TenantId,
        service_id: &ServiceId,
        date: NaiveDate,
    ) -> Result<AvailabilityResult, AvailabilityError> {
        let service = self
            .gateway
            .service(tenant, service_id)
            .await?
            .ok_or_else(|| AvailabilityError::ServiceNotFound(service_id.clone()))?;

        if !service.supports_home_visit() {
            debug!(%tenant, service = %service.id, "service is on-premise only");
            return Ok(AvailabilityResult::closed(&service, date, MESSAGE_UNSUPPORTED));
        }

        let settings = self.gateway.home_visit_config(tenant).await?;
        if settings.as_ref().is_some_and(|settings| !settings.enabled) {
            debug!(%tenant, "home visits disabled for tenant");
            return Ok(AvailabilityResult::closed(&service, date, MESSAGE_DISABLED));
        }

        let mut result = AvailabilityResult::closed(&service, date, MESSAGE_BLOCKED);
        result.is_home_visit_supported = true;

        if self.gateway.is_date_blocked(tenant, date).await? {
            debug!(%tenant, %date, "date blocked");
            result.is_blocked = true;
            return Ok(result);
        }

        let quota = self
            .quota
            .compute_with_settings(tenant, date, &service, settings.as_ref())
            .await?;
        result.daily_quota = quota.daily_quota;
        result.booked_count = quota.booked_count;
        result.remaining_quota = quota.remaining_quota;

        let windows: Vec<(SlotTime, SlotWindow)> = quota
            .time_slots
            .iter()
            .map(|slot| {
                let window = SlotWindow {
                    date,
                    start: slot.on(date),
                    duration: service.duration(),
                    travel_buffer: service.travel_buffer(),
                };
                (*slot, window)
            })
            .collect();

        let pool = if service.requires_staff_assignment && has_candidates(&quota) {
            self.qualified_staff(tenant, &service).await
        } else {
            Vec::new()
        };

        let limiter = Semaphore::new(self.max_concurrent_checks);
        let slots = join_all(windows.iter().map(|(slot, window)| {
            self.evaluate_slot(&service, &quota, &pool, *slot, window, &limiter)
        }))
        .await;

        result.available_slots = u32::try_from(slots.iter().filter(|slot| slot.available).count())
            .unwrap_or(u32::MAX);
        result.message = summarize(&quota, &slots, result.available_slots);
        result.slots = slots;

        info!(
            %tenant,
            service = %service.id,
            %date,
            remaining = result.remaining_quota,
            available = result.available_slots,
            "home visit availability computed"
        );
        Ok(result)
    }

    /// Runs [`available_slots`](Self::available_slots) for every date in
    /// `from..=to` and keeps the per-day headline numbers.
    pub async fn calendar(
        &self,
        tenant: TenantId,
        service_id: &ServiceId,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<CalendarDay>, AvailabilityError> {
        let span = (to - from).num_days();
        if span < 0 || span >= MAX_CALENDAR_DAYS {
            return Err(AvailabilityError::InvalidRange { from, to });
        }

        let mut days = Vec::new();
        for date in from.iter_days().take_while(|date| *date <= to) {
            let result = self.available_slots(tenant, service_id, date).await?;
            days.push(CalendarDay {
                date,
                is_blocked: result.is_blocked,
                available_slots: result.available_slots,
                remaining_quota: result.remaining_quota,
                message: result.message,
            });
        }
        Ok(days)
    }

    async fn qualified_staff(&self, tenant: TenantId, service: &Service) -> Vec<QualifiedStaff> {
        match self.gateway.staff_for_service(tenant, &service.id).await {
            Ok(pool) => pool,
            Err(error) => {
                warn!(%tenant, service = %service.id, %error, "qualified staff lookup failed");
                Vec::new()
            }
        }
    }

    async fn evaluate_slot(
        &self,
        service: &Service,
        quota: &QuotaSnapshot,
        pool: &[QualifiedStaff],
        time: SlotTime,
        window: &SlotWindow,
        limiter: &Semaphore,
    ) -> SlotAvailability {
        let is_booked = quota.is_booked(&time);
        let mut slot = SlotAvailability {
            time,
            start: window.start,
            end: window.end(),
            available: !is_booked && !quota.is_exhausted(),
            is_booked,
            staff_available: 0,
            staff_names: Vec::new(),
            staff_unverified: 0,
        };

        if !slot.available || !service.requires_staff_assignment {
            return slot;
        }

        let checks = self.evaluator.evaluate_all(pool, window, limiter).await;
        for (candidate, check) in pool.iter().zip(&checks) {
            if check.is_available() {
                slot.staff_available += 1;
                slot.staff_names.push(candidate.staff.name.clone());
            } else if check.is_degraded() {
                slot.staff_unverified += 1;
            }
        }
        slot.available = slot.staff_available > 0;
        slot
    }
}

fn has_candidates(quota: &QuotaSnapshot) -> bool {
    !quota.is_exhausted() && quota.time_slots.iter().any(|slot| !quota.is_booked(slot))
}

fn summarize(quota: &QuotaSnapshot, slots: &[SlotAvailability], available: u32) -> String {
    match available {
        0 if !has_candidates(quota) => MESSAGE_FULLY_BOOKED.to_string(),
        0 => MESSAGE_NO_STAFF.to_string(),
        1 => "1 slot available".to_string(),
        n if slots.len() == n as usize => format!("All {n} slots available"),
        n => format!("{n} slots available"),
    }
}
