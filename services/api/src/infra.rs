use chrono::{Duration, NaiveDate, NaiveTime};
use homevisit::scheduling::{
    BlockedDate, Booking, BookingStatus, CapabilityDefault, DayOfWeek, GatewayError,
    HomeVisitSettings, InMemoryGateway, Recurrence, Service, ServiceId, ServiceType, SlotTime,
    Staff, StaffCapability, StaffId, StaffLeave, StaffSchedule, TenantId, TenantProfile,
    WorkingHours,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::BTreeMap;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use uuid::Uuid;

pub(crate) const DEMO_TENANT_SLUG: &str = "glow-home";
pub(crate) const DEEP_CLEAN: &str = "deep-clean";
pub(crate) const MASSAGE: &str = "massage";
pub(crate) const HAIRCUT: &str = "haircut";

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

pub(crate) fn demo_tenant_id() -> TenantId {
    TenantId(Uuid::from_u128(0x0de0_0000_0000_4000_8000_0000_0000_0001))
}

pub(crate) fn parse_slot_time(raw: &str) -> Result<SlotTime, String> {
    raw.parse::<SlotTime>().map_err(|err| err.to_string())
}

fn hm(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or(NaiveTime::MIN)
}

fn staff_id(raw: &str) -> StaffId {
    StaffId(raw.to_string())
}

fn service_id(raw: &str) -> ServiceId {
    ServiceId(raw.to_string())
}

/// Builds an in-memory gateway holding the demo tenant, with bookings and
/// leave placed relative to `anchor` so the walkthrough stays meaningful.
pub(crate) fn demo_gateway(
    unmapped: CapabilityDefault,
    anchor: NaiveDate,
) -> Result<InMemoryGateway, GatewayError> {
    let gateway = InMemoryGateway::new(unmapped);
    let tenant = demo_tenant_id();

    let mut business_hours = BTreeMap::new();
    for day in DayOfWeek::ALL {
        let hours = match day {
            DayOfWeek::Sunday => WorkingHours::closed(),
            DayOfWeek::Saturday => WorkingHours::new(hm(9, 0), hm(14, 0)),
            _ => WorkingHours::new(hm(8, 0), hm(18, 0)),
        };
        business_hours.insert(day, hours);
    }

    gateway.insert_tenant(TenantProfile {
        id: tenant,
        slug: DEMO_TENANT_SLUG.to_string(),
        name: "Glow Home Services".to_string(),
        home_visit: Some(HomeVisitSettings {
            enabled: true,
            daily_quota: Some(4),
            time_slots: Some(
                [(9, 0), (11, 0), (14, 0), (16, 0)]
                    .into_iter()
                    .filter_map(|(hour, minute)| SlotTime::new(hour, minute))
                    .collect(),
            ),
        }),
        business_hours,
    })?;

    for (id, name, minutes, service_type, buffer) in [
        (DEEP_CLEAN, "Deep Clean", 120, ServiceType::HomeVisit, 30),
        (MASSAGE, "Relaxing Massage", 60, ServiceType::Both, 15),
        (HAIRCUT, "Haircut", 45, ServiceType::OnPremise, 0),
    ] {
        gateway.insert_service(Service {
            id: service_id(id),
            tenant_id: tenant,
            name: name.to_string(),
            duration_minutes: minutes,
            service_type,
            requires_staff_assignment: service_type != ServiceType::OnPremise,
            home_visit_min_buffer_minutes: buffer,
            home_visit_daily_quota: None,
            home_visit_time_slots: None,
        })?;
    }

    for (id, name) in [("ana", "Ana"), ("budi", "Budi"), ("citra", "Citra")] {
        gateway.insert_staff(Staff {
            id: staff_id(id),
            tenant_id: tenant,
            name: name.to_string(),
            active: true,
        })?;
    }

    gateway.insert_capability(StaffCapability {
        tenant_id: tenant,
        staff_id: staff_id("budi"),
        service_id: service_id(MASSAGE),
        can_perform: false,
        specialist: false,
    })?;
    gateway.insert_capability(StaffCapability {
        tenant_id: tenant,
        staff_id: staff_id("citra"),
        service_id: service_id(MASSAGE),
        can_perform: true,
        specialist: true,
    })?;

    for day in [
        DayOfWeek::Monday,
        DayOfWeek::Tuesday,
        DayOfWeek::Wednesday,
        DayOfWeek::Thursday,
        DayOfWeek::Friday,
    ] {
        gateway.insert_schedule(StaffSchedule {
            tenant_id: tenant,
            staff_id: staff_id("citra"),
            day_of_week: day,
            start_time: hm(12, 0),
            end_time: hm(19, 0),
            is_available: true,
        })?;
    }
    gateway.insert_schedule(StaffSchedule {
        tenant_id: tenant,
        staff_id: staff_id("budi"),
        day_of_week: DayOfWeek::Saturday,
        start_time: hm(9, 0),
        end_time: hm(14, 0),
        is_available: false,
    })?;

    gateway.insert_leave(StaffLeave {
        tenant_id: tenant,
        staff_id: staff_id("ana"),
        date_start: anchor + Duration::days(2),
        date_end: anchor + Duration::days(3),
        reason: "Family event".to_string(),
        paid: true,
    })?;

    if let (Some(start), Some(end)) = (
        NaiveDate::from_ymd_opt(2020, 12, 25),
        NaiveDate::from_ymd_opt(2020, 12, 26),
    ) {
        gateway.insert_blocked_date(BlockedDate {
            tenant_id: tenant,
            date_start: start,
            date_end: end,
            reason: Some("Christmas".to_string()),
            recurrence: Recurrence::Yearly,
        })?;
    }

    for (service, hour, status, assignee) in [
        (DEEP_CLEAN, 9, BookingStatus::Confirmed, Some("ana")),
        (MASSAGE, 14, BookingStatus::Pending, Some("citra")),
        (DEEP_CLEAN, 11, BookingStatus::Cancelled, Some("budi")),
    ] {
        gateway.insert_booking(Booking {
            tenant_id: tenant,
            service_id: service_id(service),
            scheduled_at: anchor.and_time(hm(hour, 0)),
            is_home_visit: true,
            status,
            staff_id: assignee.map(staff_id),
        })?;
    }

    Ok(gateway)
}
