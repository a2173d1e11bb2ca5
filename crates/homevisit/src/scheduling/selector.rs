use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use tokio::sync::Semaphore;
use tracing::{debug, info};

use super::composer::AvailabilityError;
use super::domain::{Service, ServiceId, SlotTime, Staff, TenantId};
use super::evaluator::{SlotWindow, StaffAvailabilityEvaluator};
use super::gateway::ConstraintGateway;

/// Staff member chosen for a booking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StaffMatch {
    pub staff: Staff,
    pub booking_load: u32,
    pub specialist: bool,
}

/// Picks the least-loaded available staff member at booking time.
pub struct BestStaffSelector<G> {
    gateway: Arc<G>,
    evaluator: StaffAvailabilityEvaluator<G>,
    max_concurrent_checks: usize,
}

impl<G> BestStaffSelector<G>
where
    G: ConstraintGateway + 'static,
{
    pub fn new(
        gateway: Arc<G>,
        evaluator: StaffAvailabilityEvaluator<G>,
        max_concurrent_checks: usize,
    ) -> Self {
        Self {
            gateway,
            evaluator,
            max_concurrent_checks: max_concurrent_checks.max(1),
        }
    }

    /// Returns `None` when nobody qualifies or nobody is free; degraded checks
    /// are never selected. Ties keep the qualified-staff listing order.
    pub async fn select_best(
        &self,
        tenant: TenantId,
        service_id: &ServiceId,
        date: NaiveDate,
        slot_start: NaiveDateTime,
        slot_end: NaiveDateTime,
    ) -> Result<Option<StaffMatch>, AvailabilityError> {
        let service = self
            .gateway
            .service(tenant, service_id)
            .await?
            .ok_or_else(|| AvailabilityError::ServiceNotFound(service_id.clone()))?;

        let window = SlotWindow {
            date,
            start: slot_start,
            duration: slot_end - slot_start,
            travel_buffer: service.travel_buffer(),
        };
        self.select_for(tenant, &service, &window).await
    }

    /// Same as [`select_best`](Self::select_best) with the slot end derived
    /// from the service duration.
    pub async fn select_at(
        &self,
        tenant: TenantId,
        service_id: &ServiceId,
        date: NaiveDate,
        time: SlotTime,
    ) -> Result<Option<StaffMatch>, AvailabilityError> {
        let service = self
            .gateway
            .service(tenant, service_id)
            .await?
            .ok_or_else(|| AvailabilityError::ServiceNotFound(service_id.clone()))?;

        let window = SlotWindow {
            date,
            start: time.on(date),
            duration: service.duration(),
            travel_buffer: service.travel_buffer(),
        };
        self.select_for(tenant, &service, &window).await
    }

    async fn select_for(
        &self,
        tenant: TenantId,
        service: &Service,
        window: &SlotWindow,
    ) -> Result<Option<StaffMatch>, AvailabilityError> {
        let pool = self.gateway.staff_for_service(tenant, &service.id).await?;
        if pool.is_empty() {
            debug!(%tenant, service = %service.id, "no qualified staff");
            return Ok(None);
        }

        let limiter = Semaphore::new(self.max_concurrent_checks);
        let checks = self.evaluator.evaluate_all(&pool, window, &limiter).await;

        let best = pool
            .into_iter()
            .zip(checks)
            .filter_map(|(candidate, check)| check.booking_load().map(|load| (candidate, load)))
            .fold(None, |best: Option<(_, u32)>, (candidate, load)| match best {
                Some((_, best_load)) if best_load <= load => best,
                _ => Some((candidate, load)),
            });

        let selected = best.map(|(candidate, booking_load)| StaffMatch {
            staff: candidate.staff,
            booking_load,
            specialist: candidate.specialist,
        });

        match &selected {
            Some(selected) => info!(
                %tenant,
                service = %service.id,
                staff = %selected.staff.id,
                load = selected.booking_load,
                "staff selected for home visit"
            ),
            None => info!(%tenant, service = %service.id, start = %window.start, "no staff available"),
        }
        Ok(selected)
    }
}
