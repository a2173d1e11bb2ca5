use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::NaiveDate;

use super::domain::{BookingStatus, HomeVisitSettings, Service, SlotTime, TenantId};
use super::gateway::{ConstraintGateway, GatewayError};

pub const DEFAULT_DAILY_QUOTA: u32 = 3;

pub fn default_time_slots() -> Vec<SlotTime> {
    [(9, 0), (13, 0), (16, 0)]
        .into_iter()
        .filter_map(|(hour, minute)| SlotTime::new(hour, minute))
        .collect()
}

/// Home visit capacity for one tenant and date, across all services.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuotaSnapshot {
    pub daily_quota: u32,
    pub booked_count: u32,
    pub remaining_quota: u32,
    pub booked_time_slots: BTreeSet<SlotTime>,
    /// Effective time-of-day slots, sorted and deduplicated.
    pub time_slots: Vec<SlotTime>,
}

impl QuotaSnapshot {
    pub fn is_exhausted(&self) -> bool {
        self.remaining_quota == 0
    }

    pub fn is_booked(&self, slot: &SlotTime) -> bool {
        self.booked_time_slots.contains(slot)
    }
}

/// Effective daily quota: tenant setting, then service fallback, then the default.
pub fn effective_quota(settings: Option<&HomeVisitSettings>, service: &Service) -> u32 {
    settings
        .and_then(|settings| settings.daily_quota)
        .or(service.home_visit_daily_quota)
        .unwrap_or(DEFAULT_DAILY_QUOTA)
}

/// Effective time-of-day slots resolved with the same precedence as the quota.
pub fn effective_time_slots(settings: Option<&HomeVisitSettings>, service: &Service) -> Vec<SlotTime> {
    let configured = settings
        .and_then(|settings| settings.time_slots.clone())
        .filter(|slots| !slots.is_empty())
        .or_else(|| {
            service
                .home_visit_time_slots
                .clone()
                .filter(|slots| !slots.is_empty())
        })
        .unwrap_or_else(default_time_slots);

    configured
        .into_iter()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

pub struct SlotQuotaTracker<G> {
    gateway: Arc<G>,
}

impl<G> Clone for SlotQuotaTracker<G> {
    fn clone(&self) -> Self {
        Self {
            gateway: Arc::clone(&self.gateway),
        }
    }
}

impl<G> SlotQuotaTracker<G>
where
    G: ConstraintGateway + 'static,
{
    pub fn new(gateway: Arc<G>) -> Self {
        Self { gateway }
    }

    pub async fn compute_remaining(
        &self,
        tenant: TenantId,
        date: NaiveDate,
        service: &Service,
    ) -> Result<QuotaSnapshot, GatewayError> {
        let settings = self.gateway.home_visit_config(tenant).await?;
        self.compute_with_settings(tenant, date, service, settings.as_ref())
            .await
    }

    /// Same as [`compute_remaining`](Self::compute_remaining) when the caller
    /// already holds the tenant settings.
    pub async fn compute_with_settings(
        &self,
        tenant: TenantId,
        date: NaiveDate,
        service: &Service,
        settings: Option<&HomeVisitSettings>,
    ) -> Result<QuotaSnapshot, GatewayError> {
        let daily_quota = effective_quota(settings, service);
        let time_slots = effective_time_slots(settings, service);

        let booked_count = self
            .gateway
            .count_home_visit_bookings(tenant, date, &BookingStatus::ACTIVE)
            .await?;
        let booked_time_slots = self
            .gateway
            .home_visit_booking_times(tenant, date, &BookingStatus::ACTIVE)
            .await?;

        Ok(QuotaSnapshot {
            daily_quota,
            booked_count,
            remaining_quota: daily_quota.saturating_sub(booked_count),
            booked_time_slots,
            time_slots,
        })
    }
}
