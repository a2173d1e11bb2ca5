use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveDate, NaiveDateTime};
use futures::future::join_all;
use serde::Serialize;
use tokio::sync::Semaphore;
use tracing::{debug, warn};

use super::domain::{BookingStatus, DayOfWeek, QualifiedStaff, Staff, StaffId, WorkingHours};
use super::gateway::{ConstraintGateway, GatewayError};

/// The time a home visit occupies a staff member on one date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotWindow {
    pub date: NaiveDate,
    pub start: NaiveDateTime,
    pub duration: chrono::Duration,
    pub travel_buffer: chrono::Duration,
}

impl SlotWindow {
    /// Nominal end of the visit, excluding travel.
    pub fn end(&self) -> NaiveDateTime {
        self.start + self.duration
    }

    /// End of the visit including the travel buffer that follows it.
    pub fn occupied_until(&self) -> NaiveDateTime {
        self.end() + self.travel_buffer
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnavailableReason {
    OnLeave,
    DayOff,
    OutsideHours,
}

/// Confirmed outcome of a staff availability check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaffEvaluation {
    pub staff_id: StaffId,
    pub is_available: bool,
    /// Confirmed bookings on the date; only used for ranking.
    pub booking_load: u32,
    pub reason: Option<UnavailableReason>,
}

impl StaffEvaluation {
    fn unavailable(staff_id: StaffId, reason: UnavailableReason) -> Self {
        Self {
            staff_id,
            is_available: false,
            booking_load: 0,
            reason: Some(reason),
        }
    }
}

/// A staff check either produced an answer or could not be completed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StaffCheck {
    Evaluated(StaffEvaluation),
    DegradedUnknown { staff_id: StaffId, reason: String },
}

impl StaffCheck {
    /// True only for a confirmed positive answer; degraded checks never count.
    pub fn is_available(&self) -> bool {
        matches!(self, StaffCheck::Evaluated(evaluation) if evaluation.is_available)
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, StaffCheck::DegradedUnknown { .. })
    }

    pub fn booking_load(&self) -> Option<u32> {
        match self {
            StaffCheck::Evaluated(evaluation) if evaluation.is_available => {
                Some(evaluation.booking_load)
            }
            _ => None,
        }
    }
}

/// Decides whether one staff member can take a home visit in a given window.
pub struct StaffAvailabilityEvaluator<G> {
    gateway: Arc<G>,
    timeout: Duration,
}

impl<G> Clone for StaffAvailabilityEvaluator<G> {
    fn clone(&self) -> Self {
        Self {
            gateway: Arc::clone(&self.gateway),
            timeout: self.timeout,
        }
    }
}

impl<G> StaffAvailabilityEvaluator<G>
where
    G: ConstraintGateway + 'static,
{
    pub fn new(gateway: Arc<G>, timeout: Duration) -> Self {
        Self { gateway, timeout }
    }

    /// Runs the check under the configured timeout. Gateway failures and
    /// timeouts come back as [`StaffCheck::DegradedUnknown`].
    pub async fn evaluate(&self, staff: &Staff, window: &SlotWindow) -> StaffCheck {
        match tokio::time::timeout(self.timeout, self.check(staff, window)).await {
            Ok(Ok(evaluation)) => {
                debug!(
                    staff = %staff.id,
                    start = %window.start,
                    available = evaluation.is_available,
                    load = evaluation.booking_load,
                    "staff evaluated"
                );
                StaffCheck::Evaluated(evaluation)
            }
            Ok(Err(error)) => {
                warn!(staff = %staff.id, start = %window.start, %error, "staff check degraded");
                StaffCheck::DegradedUnknown {
                    staff_id: staff.id.clone(),
                    reason: error.to_string(),
                }
            }
            Err(_) => {
                warn!(staff = %staff.id, start = %window.start, "staff check timed out");
                StaffCheck::DegradedUnknown {
                    staff_id: staff.id.clone(),
                    reason: GatewayError::Timeout.to_string(),
                }
            }
        }
    }

    /// Evaluates every staff member in `pool` against one window, at most
    /// `limiter`'s permit count at a time. Output order matches `pool`.
    pub async fn evaluate_all(
        &self,
        pool: &[QualifiedStaff],
        window: &SlotWindow,
        limiter: &Semaphore,
    ) -> Vec<StaffCheck> {
        join_all(pool.iter().map(|candidate| async move {
            match limiter.acquire().await {
                Ok(_permit) => self.evaluate(&candidate.staff, window).await,
                Err(_) => StaffCheck::DegradedUnknown {
                    staff_id: candidate.staff.id.clone(),
                    reason: "check limiter closed".to_string(),
                },
            }
        }))
        .await
    }

    async fn check(
        &self,
        staff: &Staff,
        window: &SlotWindow,
    ) -> Result<StaffEvaluation, GatewayError> {
        let on_leave = self
            .gateway
            .is_staff_on_leave(staff.tenant_id, &staff.id, window.date)
            .await?;
        if on_leave {
            return Ok(StaffEvaluation::unavailable(
                staff.id.clone(),
                UnavailableReason::OnLeave,
            ));
        }

        let hours = self.working_hours(staff, window.date).await?;
        if !hours.is_available {
            return Ok(StaffEvaluation::unavailable(
                staff.id.clone(),
                UnavailableReason::DayOff,
            ));
        }
        if !hours.contains(window.date, window.start, window.occupied_until()) {
            return Ok(StaffEvaluation::unavailable(
                staff.id.clone(),
                UnavailableReason::OutsideHours,
            ));
        }

        let booking_load = self
            .gateway
            .count_staff_bookings(staff.tenant_id, &staff.id, window.date, &BookingStatus::LOAD)
            .await?;

        Ok(StaffEvaluation {
            staff_id: staff.id.clone(),
            is_available: true,
            booking_load,
            reason: None,
        })
    }

    /// Custom schedule, then tenant business hours, then `08:00–17:00`.
    async fn working_hours(
        &self,
        staff: &Staff,
        date: NaiveDate,
    ) -> Result<WorkingHours, GatewayError> {
        let day = DayOfWeek::of(date);
        let fallback = self
            .gateway
            .business_hours(staff.tenant_id, day)
            .await?
            .unwrap_or_else(WorkingHours::standard);
        self.gateway
            .staff_working_hours(staff.tenant_id, &staff.id, day, fallback)
            .await
    }
}
