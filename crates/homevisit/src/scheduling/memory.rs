use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use super::domain::{
    BlockedDate, Booking, BookingStatus, CapabilityDefault, DayOfWeek, HomeVisitSettings,
    QualifiedStaff, Service, ServiceId, SlotTime, Staff, StaffCapability, StaffId, StaffLeave,
    StaffSchedule, TenantId, TenantProfile, WorkingHours,
};
use super::gateway::{ConstraintGateway, GatewayError, TenantDirectory};

#[derive(Debug, Default)]
struct Tables {
    tenants: Vec<TenantProfile>,
    services: Vec<Service>,
    blocked_dates: Vec<BlockedDate>,
    bookings: Vec<Booking>,
    staff: Vec<Staff>,
    capabilities: Vec<StaffCapability>,
    leaves: Vec<StaffLeave>,
    schedules: Vec<StaffSchedule>,
}

/// Process-local data store used by the HTTP service, the demo, and tests.
#[derive(Debug, Clone, Default)]
pub struct InMemoryGateway {
    tables: Arc<Mutex<Tables>>,
    unmapped_capability: CapabilityDefault,
}

impl InMemoryGateway {
    pub fn new(unmapped_capability: CapabilityDefault) -> Self {
        Self {
            tables: Arc::default(),
            unmapped_capability,
        }
    }

    fn tables(&self) -> Result<MutexGuard<'_, Tables>, GatewayError> {
        self.tables
            .lock()
            .map_err(|_| GatewayError::Unavailable("in-memory store poisoned".to_string()))
    }

    pub fn insert_tenant(&self, tenant: TenantProfile) -> Result<(), GatewayError> {
        let mut tables = self.tables()?;
        tables.tenants.retain(|existing| existing.id != tenant.id);
        tables.tenants.push(tenant);
        Ok(())
    }

    pub fn insert_service(&self, service: Service) -> Result<(), GatewayError> {
        let mut tables = self.tables()?;
        tables
            .services
            .retain(|existing| !(existing.tenant_id == service.tenant_id && existing.id == service.id));
        tables.services.push(service);
        Ok(())
    }

    pub fn insert_blocked_date(&self, blocked: BlockedDate) -> Result<(), GatewayError> {
        self.tables()?.blocked_dates.push(blocked);
        Ok(())
    }

    pub fn insert_booking(&self, booking: Booking) -> Result<(), GatewayError> {
        self.tables()?.bookings.push(booking);
        Ok(())
    }

    pub fn insert_staff(&self, staff: Staff) -> Result<(), GatewayError> {
        let mut tables = self.tables()?;
        tables
            .staff
            .retain(|existing| !(existing.tenant_id == staff.tenant_id && existing.id == staff.id));
        tables.staff.push(staff);
        Ok(())
    }

    pub fn insert_capability(&self, capability: StaffCapability) -> Result<(), GatewayError> {
        let mut tables = self.tables()?;
        tables.capabilities.retain(|existing| {
            !(existing.tenant_id == capability.tenant_id
                && existing.staff_id == capability.staff_id
                && existing.service_id == capability.service_id)
        });
        tables.capabilities.push(capability);
        Ok(())
    }

    pub fn insert_leave(&self, leave: StaffLeave) -> Result<(), GatewayError> {
        self.tables()?.leaves.push(leave);
        Ok(())
    }

    pub fn insert_schedule(&self, schedule: StaffSchedule) -> Result<(), GatewayError> {
        let mut tables = self.tables()?;
        tables.schedules.retain(|existing| {
            !(existing.tenant_id == schedule.tenant_id
                && existing.staff_id == schedule.staff_id
                && existing.day_of_week == schedule.day_of_week)
        });
        tables.schedules.push(schedule);
        Ok(())
    }
}

fn home_visits_on<'a>(
    tables: &'a Tables,
    tenant: TenantId,
    date: NaiveDate,
    statuses: &'a [BookingStatus],
) -> impl Iterator<Item = &'a Booking> + 'a {
    tables.bookings.iter().filter(move |booking| {
        booking.tenant_id == tenant
            && booking.is_home_visit
            && booking.scheduled_at.date() == date
            && statuses.contains(&booking.status)
    })
}

#[async_trait]
impl ConstraintGateway for InMemoryGateway {
    async fn service(
        &self,
        tenant: TenantId,
        service_id: &ServiceId,
    ) -> Result<Option<Service>, GatewayError> {
        Ok(self
            .tables()?
            .services
            .iter()
            .find(|service| service.tenant_id == tenant && &service.id == service_id)
            .cloned())
    }

    async fn home_visit_config(
        &self,
        tenant: TenantId,
    ) -> Result<Option<HomeVisitSettings>, GatewayError> {
        Ok(self
            .tables()?
            .tenants
            .iter()
            .find(|profile| profile.id == tenant)
            .and_then(|profile| profile.home_visit.clone()))
    }

    async fn business_hours(
        &self,
        tenant: TenantId,
        day: DayOfWeek,
    ) -> Result<Option<WorkingHours>, GatewayError> {
        Ok(self
            .tables()?
            .tenants
            .iter()
            .find(|profile| profile.id == tenant)
            .and_then(|profile| profile.business_hours.get(&day).copied()))
    }

    async fn is_date_blocked(
        &self,
        tenant: TenantId,
        date: NaiveDate,
    ) -> Result<bool, GatewayError> {
        Ok(self
            .tables()?
            .blocked_dates
            .iter()
            .any(|blocked| blocked.tenant_id == tenant && blocked.covers(date)))
    }

    async fn count_home_visit_bookings(
        &self,
        tenant: TenantId,
        date: NaiveDate,
        statuses: &[BookingStatus],
    ) -> Result<u32, GatewayError> {
        let tables = self.tables()?;
        let count = home_visits_on(&tables, tenant, date, statuses).count();
        Ok(u32::try_from(count).unwrap_or(u32::MAX))
    }

    async fn home_visit_booking_times(
        &self,
        tenant: TenantId,
        date: NaiveDate,
        statuses: &[BookingStatus],
    ) -> Result<BTreeSet<SlotTime>, GatewayError> {
        let tables = self.tables()?;
        Ok(home_visits_on(&tables, tenant, date, statuses)
            .map(|booking| SlotTime::from_datetime(booking.scheduled_at))
            .collect())
    }

    async fn staff_for_service(
        &self,
        tenant: TenantId,
        service_id: &ServiceId,
    ) -> Result<Vec<QualifiedStaff>, GatewayError> {
        let tables = self.tables()?;
        let qualified = tables
            .staff
            .iter()
            .filter(|staff| staff.tenant_id == tenant && staff.active)
            .filter_map(|staff| {
                let mapping = tables
                    .capabilities
                    .iter()
                    .find(|row| {
                        row.tenant_id == tenant
                            && row.staff_id == staff.id
                            && &row.service_id == service_id
                    });
                self.unmapped_capability
                    .resolve(mapping)
                    .then(|| QualifiedStaff {
                        staff: staff.clone(),
                        specialist: mapping.is_some_and(|row| row.specialist),
                    })
            })
            .collect();
        Ok(qualified)
    }

    async fn is_staff_on_leave(
        &self,
        tenant: TenantId,
        staff_id: &StaffId,
        date: NaiveDate,
    ) -> Result<bool, GatewayError> {
        Ok(self
            .tables()?
            .leaves
            .iter()
            .any(|leave| {
                leave.tenant_id == tenant && &leave.staff_id == staff_id && leave.covers(date)
            }))
    }

    async fn staff_working_hours(
        &self,
        tenant: TenantId,
        staff_id: &StaffId,
        day: DayOfWeek,
        fallback: WorkingHours,
    ) -> Result<WorkingHours, GatewayError> {
        Ok(self
            .tables()?
            .schedules
            .iter()
            .find(|schedule| {
                schedule.tenant_id == tenant
                    && &schedule.staff_id == staff_id
                    && schedule.day_of_week == day
            })
            .map(StaffSchedule::hours)
            .unwrap_or(fallback))
    }

    async fn count_staff_bookings(
        &self,
        tenant: TenantId,
        staff_id: &StaffId,
        date: NaiveDate,
        statuses: &[BookingStatus],
    ) -> Result<u32, GatewayError> {
        let count = self
            .tables()?
            .bookings
            .iter()
            .filter(|booking| {
                booking.tenant_id == tenant
                    && booking.staff_id.as_ref() == Some(staff_id)
                    && booking.scheduled_at.date() == date
                    && statuses.contains(&booking.status)
            })
            .count();
        Ok(u32::try_from(count).unwrap_or(u32::MAX))
    }
}

#[async_trait]
impl TenantDirectory for InMemoryGateway {
    async fn resolve_tenant(&self, identifier: &str) -> Result<Option<TenantId>, GatewayError> {
        let identifier = identifier.trim();
        let tables = self.tables()?;

        if let Ok(uuid) = Uuid::parse_str(identifier) {
            return Ok(tables
                .tenants
                .iter()
                .find(|profile| profile.id.0 == uuid)
                .map(|profile| profile.id));
        }

        Ok(tables
            .tenants
            .iter()
            .find(|profile| profile.slug.eq_ignore_ascii_case(identifier))
            .map(|profile| profile.id))
    }
}
