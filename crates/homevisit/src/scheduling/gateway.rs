use std::collections::BTreeSet;

use async_trait::async_trait;
use chrono::NaiveDate;

use super::domain::{
    BookingStatus, DayOfWeek, HomeVisitSettings, QualifiedStaff, Service, ServiceId, SlotTime,
    StaffId, TenantId, WorkingHours,
};

/// Read-only queries over the tenant's constraint data.
///
/// Every call is a point-in-time snapshot; nothing guarantees consistency
/// between two calls made while answering the same request.
#[async_trait]
pub trait ConstraintGateway: Send + Sync {
    async fn service(
        &self,
        tenant: TenantId,
        service_id: &ServiceId,
    ) -> Result<Option<Service>, GatewayError>;

    /// Tenant-level home visit settings, `None` when the tenant never configured them.
    async fn home_visit_config(
        &self,
        tenant: TenantId,
    ) -> Result<Option<HomeVisitSettings>, GatewayError>;

    async fn business_hours(
        &self,
        tenant: TenantId,
        day: DayOfWeek,
    ) -> Result<Option<WorkingHours>, GatewayError>;

    async fn is_date_blocked(&self, tenant: TenantId, date: NaiveDate)
        -> Result<bool, GatewayError>;

    async fn count_home_visit_bookings(
        &self,
        tenant: TenantId,
        date: NaiveDate,
        statuses: &[BookingStatus],
    ) -> Result<u32, GatewayError>;

    async fn home_visit_booking_times(
        &self,
        tenant: TenantId,
        date: NaiveDate,
        statuses: &[BookingStatus],
    ) -> Result<BTreeSet<SlotTime>, GatewayError>;

    /// Active staff able to perform the service, in stable listing order.
    async fn staff_for_service(
        &self,
        tenant: TenantId,
        service_id: &ServiceId,
    ) -> Result<Vec<QualifiedStaff>, GatewayError>;

    async fn is_staff_on_leave(
        &self,
        tenant: TenantId,
        staff_id: &StaffId,
        date: NaiveDate,
    ) -> Result<bool, GatewayError>;

    /// Custom schedule for the day, or `fallback` when the staff member has none.
    async fn staff_working_hours(
        &self,
        tenant: TenantId,
        staff_id: &StaffId,
        day: DayOfWeek,
        fallback: WorkingHours,
    ) -> Result<WorkingHours, GatewayError>;

    async fn count_staff_bookings(
        &self,
        tenant: TenantId,
        staff_id: &StaffId,
        date: NaiveDate,
        statuses: &[BookingStatus],
    ) -> Result<u32, GatewayError>;
}

/// Resolves the identifier a caller supplies (UUID or subdomain slug).
#[async_trait]
pub trait TenantDirectory: Send + Sync {
    async fn resolve_tenant(&self, identifier: &str) -> Result<Option<TenantId>, GatewayError>;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GatewayError {
    #[error("data store unavailable: {0}")]
    Unavailable(String),
    #[error("data store query timed out")]
    Timeout,
}
