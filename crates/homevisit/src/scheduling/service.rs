use std::sync::Arc;

use chrono::NaiveDate;

use super::composer::{AvailabilityComposer, AvailabilityError, AvailabilityResult, CalendarDay};
use super::domain::{ServiceId, SlotTime, TenantId};
use super::evaluator::StaffAvailabilityEvaluator;
use super::gateway::{ConstraintGateway, GatewayError, TenantDirectory};
use super::selector::{BestStaffSelector, StaffMatch};
use crate::config::AvailabilityConfig;

/// Facade resolving tenant identifiers before delegating to the composer and selector.
pub struct HomeVisitService<G> {
    directory: Arc<G>,
    composer: AvailabilityComposer<G>,
    selector: BestStaffSelector<G>,
}

impl<G> HomeVisitService<G>
where
    G: ConstraintGateway + TenantDirectory + 'static,
{
    pub fn new(gateway: Arc<G>, config: AvailabilityConfig) -> Self {
        let evaluator = StaffAvailabilityEvaluator::new(Arc::clone(&gateway), config.check_timeout);
        let composer = AvailabilityComposer::new(
            Arc::clone(&gateway),
            evaluator.clone(),
            config.max_concurrent_checks,
        );
        let selector =
            BestStaffSelector::new(Arc::clone(&gateway), evaluator, config.max_concurrent_checks);

        Self {
            directory: gateway,
            composer,
            selector,
        }
    }

    pub async fn resolve_tenant(&self, identifier: &str) -> Result<TenantId, HomeVisitServiceError> {
        self.directory
            .resolve_tenant(identifier)
            .await?
            .ok_or_else(|| HomeVisitServiceError::TenantNotFound(identifier.to_string()))
    }

    pub async fn availability(
        &self,
        tenant_identifier: &str,
        service_id: &ServiceId,
        date: NaiveDate,
    ) -> Result<AvailabilityResult, HomeVisitServiceError> {
        let tenant = self.resolve_tenant(tenant_identifier).await?;
        Ok(self.composer.available_slots(tenant, service_id, date).await?)
    }

    pub async fn calendar(
        &self,
        tenant_identifier: &str,
        service_id: &ServiceId,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<CalendarDay>, HomeVisitServiceError> {
        let tenant = self.resolve_tenant(tenant_identifier).await?;
        Ok(self.composer.calendar(tenant, service_id, from, to).await?)
    }

    /// Staff assignment for a booking about to be committed at `date` + `time`.
    pub async fn match_staff(
        &self,
        tenant_identifier: &str,
        service_id: &ServiceId,
        date: NaiveDate,
        time: SlotTime,
    ) -> Result<Option<StaffMatch>, HomeVisitServiceError> {
        let tenant = self.resolve_tenant(tenant_identifier).await?;
        Ok(self.selector.select_at(tenant, service_id, date, time).await?)
    }

    pub fn composer(&self) -> &AvailabilityComposer<G> {
        &self.composer
    }

    pub fn selector(&self) -> &BestStaffSelector<G> {
        &self.selector
    }
}

/// Error raised by the home visit service.
#[derive(Debug, thiserror::Error)]
pub enum HomeVisitServiceError {
    #[error("tenant '{0}' not found")]
    TenantNotFound(String),
    #[error(transparent)]
    Availability(#[from] AvailabilityError),
    #[error(transparent)]
    Gateway(#[from] GatewayError),
}
