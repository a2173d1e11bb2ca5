use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::response::Response;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde_json::Value;
use uuid::Uuid;

use crate::config::AvailabilityConfig;
use crate::scheduling::domain::{
    Booking, BookingStatus, CapabilityDefault, DayOfWeek, HomeVisitSettings, QualifiedStaff,
    Service, ServiceId, ServiceType, SlotTime, Staff, StaffId, StaffLeave, TenantId,
    TenantProfile, WorkingHours,
};
use crate::scheduling::evaluator::StaffAvailabilityEvaluator;
use crate::scheduling::gateway::{ConstraintGateway, GatewayError, TenantDirectory};
use crate::scheduling::memory::InMemoryGateway;
use crate::scheduling::{AvailabilityComposer, BestStaffSelector, HomeVisitService};

pub(super) const CLEANING: &str = "svc-cleaning";
pub(super) const MASSAGE: &str = "svc-massage";
pub(super) const SALON: &str = "svc-salon";

pub(super) fn tenant_id() -> TenantId {
    TenantId(Uuid::from_u128(0x5eed_0000_0000_4000_8000_0000_0000_0001))
}

pub(super) fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

pub(super) fn at(date: NaiveDate, hour: u32, minute: u32) -> NaiveDateTime {
    date.and_hms_opt(hour, minute, 0).expect("valid time")
}

pub(super) fn time(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).expect("valid time")
}

pub(super) fn slot(raw: &str) -> SlotTime {
    raw.parse().expect("valid slot time")
}

pub(super) fn slots(raw: &[&str]) -> Vec<SlotTime> {
    raw.iter().map(|value| slot(value)).collect()
}

/// Monday 2024-06-10, the date used throughout the scenarios.
pub(super) fn monday() -> NaiveDate {
    date(2024, 6, 10)
}

pub(super) fn config() -> AvailabilityConfig {
    AvailabilityConfig {
        check_timeout: Duration::from_millis(200),
        max_concurrent_checks: 4,
        unmapped_capability: CapabilityDefault::Allow,
    }
}

pub(super) fn tenant_profile(home_visit: Option<HomeVisitSettings>) -> TenantProfile {
    TenantProfile {
        id: tenant_id(),
        slug: "sparkle".to_string(),
        name: "Sparkle Home Services".to_string(),
        home_visit,
        business_hours: BTreeMap::new(),
    }
}

pub(super) fn quota_settings(quota: u32, times: &[&str]) -> HomeVisitSettings {
    HomeVisitSettings {
        enabled: true,
        daily_quota: Some(quota),
        time_slots: Some(slots(times)),
    }
}

pub(super) fn service(id: &str, service_type: ServiceType, requires_staff: bool) -> Service {
    Service {
        id: ServiceId(id.to_string()),
        tenant_id: tenant_id(),
        name: format!("Service {id}"),
        duration_minutes: 60,
        service_type,
        requires_staff_assignment: requires_staff,
        home_visit_min_buffer_minutes: 30,
        home_visit_daily_quota: None,
        home_visit_time_slots: None,
    }
}

pub(super) fn staff(id: &str, name: &str) -> Staff {
    Staff {
        id: StaffId(id.to_string()),
        tenant_id: tenant_id(),
        name: name.to_string(),
        active: true,
    }
}

pub(super) fn qualified(staff: Staff) -> QualifiedStaff {
    QualifiedStaff {
        staff,
        specialist: false,
    }
}

pub(super) fn home_visit(
    service_id: &str,
    scheduled_at: NaiveDateTime,
    status: BookingStatus,
    staff_id: Option<&str>,
) -> Booking {
    Booking {
        tenant_id: tenant_id(),
        service_id: ServiceId(service_id.to_string()),
        scheduled_at,
        is_home_visit: true,
        status,
        staff_id: staff_id.map(|id| StaffId(id.to_string())),
    }
}

pub(super) fn leave(staff_id: &str, start: NaiveDate, end: NaiveDate) -> StaffLeave {
    StaffLeave {
        tenant_id: tenant_id(),
        staff_id: StaffId(staff_id.to_string()),
        date_start: start,
        date_end: end,
        reason: "Annual leave".to_string(),
        paid: true,
    }
}

/// Gateway seeded with one tenant, three services, and no staff.
pub(super) fn seeded_gateway(settings: Option<HomeVisitSettings>) -> InMemoryGateway {
    seeded_gateway_with(settings, CapabilityDefault::Allow)
}

pub(super) fn seeded_gateway_with(
    settings: Option<HomeVisitSettings>,
    unmapped: CapabilityDefault,
) -> InMemoryGateway {
    let gateway = InMemoryGateway::new(unmapped);
    gateway
        .insert_tenant(tenant_profile(settings))
        .expect("tenant stored");
    gateway
        .insert_service(service(CLEANING, ServiceType::HomeVisit, true))
        .expect("service stored");
    let mut massage = service(MASSAGE, ServiceType::Both, false);
    massage.duration_minutes = 30;
    massage.home_visit_min_buffer_minutes = 0;
    gateway.insert_service(massage).expect("service stored");
    gateway
        .insert_service(service(SALON, ServiceType::OnPremise, false))
        .expect("service stored");
    gateway
}

pub(super) fn rival_tenant_id() -> TenantId {
    TenantId(Uuid::from_u128(0x5eed_0000_0000_4000_8000_0000_0000_0002))
}

/// Registers a second tenant whose service and staff ids overlap the first's.
pub(super) fn add_rival_tenant(gateway: &InMemoryGateway) {
    let mut profile = tenant_profile(Some(quota_settings(3, &["09:00", "13:00", "16:00"])));
    profile.id = rival_tenant_id();
    profile.slug = "rival".to_string();
    profile.name = "Rival Cleaners".to_string();
    gateway.insert_tenant(profile).expect("tenant stored");

    let mut cleaning = service(CLEANING, ServiceType::HomeVisit, true);
    cleaning.tenant_id = rival_tenant_id();
    gateway.insert_service(cleaning).expect("service stored");
}

pub(super) fn rival_home_visit(
    service_id: &str,
    scheduled_at: NaiveDateTime,
    status: BookingStatus,
    staff_id: Option<&str>,
) -> Booking {
    Booking {
        tenant_id: rival_tenant_id(),
        ..home_visit(service_id, scheduled_at, status, staff_id)
    }
}

pub(super) fn composer<G>(gateway: Arc<G>) -> AvailabilityComposer<G>
where
    G: ConstraintGateway + 'static,
{
    let config = config();
    let evaluator = StaffAvailabilityEvaluator::new(Arc::clone(&gateway), config.check_timeout);
    AvailabilityComposer::new(gateway, evaluator, config.max_concurrent_checks)
}

pub(super) fn selector<G>(gateway: Arc<G>) -> BestStaffSelector<G>
where
    G: ConstraintGateway + 'static,
{
    let config = config();
    let evaluator = StaffAvailabilityEvaluator::new(Arc::clone(&gateway), config.check_timeout);
    BestStaffSelector::new(gateway, evaluator, config.max_concurrent_checks)
}

pub(super) fn home_visit_service(gateway: InMemoryGateway) -> Arc<HomeVisitService<InMemoryGateway>> {
    Arc::new(HomeVisitService::new(Arc::new(gateway), config()))
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body readable");
    serde_json::from_slice(&bytes).expect("valid json body")
}

/// Wraps the in-memory gateway to inject failures, latency, and track fan-out.
#[derive(Clone)]
pub(super) struct FlakyGateway {
    inner: InMemoryGateway,
    failing_staff: HashSet<StaffId>,
    slow_staff: HashSet<StaffId>,
    slow_for: Duration,
    fail_quota: bool,
    fail_staff_listing: bool,
    leave_latency: Duration,
    in_flight: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
}

impl FlakyGateway {
    pub(super) fn new(inner: InMemoryGateway) -> Self {
        Self {
            inner,
            failing_staff: HashSet::new(),
            slow_staff: HashSet::new(),
            slow_for: Duration::from_millis(0),
            fail_quota: false,
            fail_staff_listing: false,
            leave_latency: Duration::from_millis(0),
            in_flight: Arc::default(),
            peak: Arc::default(),
        }
    }

    pub(super) fn failing(mut self, staff_id: &str) -> Self {
        self.failing_staff.insert(StaffId(staff_id.to_string()));
        self
    }

    pub(super) fn slow(mut self, staff_id: &str, delay: Duration) -> Self {
        self.slow_staff.insert(StaffId(staff_id.to_string()));
        self.slow_for = delay;
        self
    }

    pub(super) fn failing_quota(mut self) -> Self {
        self.fail_quota = true;
        self
    }

    pub(super) fn failing_staff_listing(mut self) -> Self {
        self.fail_staff_listing = true;
        self
    }

    pub(super) fn with_leave_latency(mut self, latency: Duration) -> Self {
        self.leave_latency = latency;
        self
    }

    pub(super) fn peak_in_flight(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ConstraintGateway for FlakyGateway {
    async fn service(
        &self,
        tenant: TenantId,
        service_id: &ServiceId,
    ) -> Result<Option<Service>, GatewayError> {
        self.inner.service(tenant, service_id).await
    }

    async fn home_visit_config(
        &self,
        tenant: TenantId,
    ) -> Result<Option<HomeVisitSettings>, GatewayError> {
        self.inner.home_visit_config(tenant).await
    }

    async fn business_hours(
        &self,
        tenant: TenantId,
        day: DayOfWeek,
    ) -> Result<Option<WorkingHours>, GatewayError> {
        self.inner.business_hours(tenant, day).await
    }

    async fn is_date_blocked(
        &self,
        tenant: TenantId,
        date: NaiveDate,
    ) -> Result<bool, GatewayError> {
        self.inner.is_date_blocked(tenant, date).await
    }

    async fn count_home_visit_bookings(
        &self,
        tenant: TenantId,
        date: NaiveDate,
        statuses: &[BookingStatus],
    ) -> Result<u32, GatewayError> {
        if self.fail_quota {
            return Err(GatewayError::Unavailable("bookings table offline".to_string()));
        }
        self.inner
            .count_home_visit_bookings(tenant, date, statuses)
            .await
    }

    async fn home_visit_booking_times(
        &self,
        tenant: TenantId,
        date: NaiveDate,
        statuses: &[BookingStatus],
    ) -> Result<BTreeSet<SlotTime>, GatewayError> {
        self.inner
            .home_visit_booking_times(tenant, date, statuses)
            .await
    }

    async fn staff_for_service(
        &self,
        tenant: TenantId,
        service_id: &ServiceId,
    ) -> Result<Vec<QualifiedStaff>, GatewayError> {
        if self.fail_staff_listing {
            return Err(GatewayError::Unavailable("staff table offline".to_string()));
        }
        self.inner.staff_for_service(tenant, service_id).await
    }

    async fn is_staff_on_leave(
        &self,
        tenant: TenantId,
        staff_id: &StaffId,
        date: NaiveDate,
    ) -> Result<bool, GatewayError> {
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(current, Ordering::SeqCst);

        if !self.leave_latency.is_zero() {
            tokio::time::sleep(self.leave_latency).await;
        }
        if self.slow_staff.contains(staff_id) {
            tokio::time::sleep(self.slow_for).await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        if self.failing_staff.contains(staff_id) {
            return Err(GatewayError::Unavailable("leave table offline".to_string()));
        }
        self.inner.is_staff_on_leave(tenant, staff_id, date).await
    }

    async fn staff_working_hours(
        &self,
        tenant: TenantId,
        staff_id: &StaffId,
        day: DayOfWeek,
        fallback: WorkingHours,
    ) -> Result<WorkingHours, GatewayError> {
        self.inner
            .staff_working_hours(tenant, staff_id, day, fallback)
            .await
    }

    async fn count_staff_bookings(
        &self,
        tenant: TenantId,
        staff_id: &StaffId,
        date: NaiveDate,
        statuses: &[BookingStatus],
    ) -> Result<u32, GatewayError> {
        self.inner
            .count_staff_bookings(tenant, staff_id, date, statuses)
            .await
    }
}

#[async_trait]
impl TenantDirectory for FlakyGateway {
    async fn resolve_tenant(&self, identifier: &str) -> Result<Option<TenantId>, GatewayError> {
        self.inner.resolve_tenant(identifier).await
    }
}
