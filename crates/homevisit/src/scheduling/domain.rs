use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

/// Identifier for a tenant (business account).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TenantId(pub Uuid);

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ServiceId(pub String);

impl fmt::Display for ServiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StaffId(pub String);

impl fmt::Display for StaffId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Where a service is delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceType {
    OnPremise,
    HomeVisit,
    Both,
}

/// A bookable offering owned by a tenant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    pub id: ServiceId,
    pub tenant_id: TenantId,
    pub name: String,
    pub duration_minutes: u32,
    pub service_type: ServiceType,
    pub requires_staff_assignment: bool,
    /// Travel buffer reserved after a home visit.
    pub home_visit_min_buffer_minutes: u32,
    pub home_visit_daily_quota: Option<u32>,
    pub home_visit_time_slots: Option<Vec<SlotTime>>,
}

impl Service {
    pub fn supports_home_visit(&self) -> bool {
        self.service_type != ServiceType::OnPremise
    }

    pub fn duration(&self) -> chrono::Duration {
        chrono::Duration::minutes(i64::from(self.duration_minutes))
    }

    pub fn travel_buffer(&self) -> chrono::Duration {
        chrono::Duration::minutes(i64::from(self.home_visit_min_buffer_minutes))
    }
}

/// Tenant-wide home visit settings. Present values override service fallbacks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HomeVisitSettings {
    pub enabled: bool,
    #[serde(default)]
    pub daily_quota: Option<u32>,
    #[serde(default)]
    pub time_slots: Option<Vec<SlotTime>>,
}

impl Default for HomeVisitSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            daily_quota: None,
            time_slots: None,
        }
    }
}

/// A time of day at minute precision, rendered as `HH:MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SlotTime(NaiveTime);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("'{0}' is not a valid HH:MM time")]
pub struct SlotTimeError(pub String);

impl SlotTime {
    pub fn new(hour: u32, minute: u32) -> Option<Self> {
        NaiveTime::from_hms_opt(hour, minute, 0).map(Self)
    }

    /// Truncates a timestamp to its `HH:MM` time of day.
    pub fn from_datetime(value: NaiveDateTime) -> Self {
        Self::truncate(value.time())
    }

    pub fn truncate(time: NaiveTime) -> Self {
        Self(time.with_second(0).and_then(|t| t.with_nanosecond(0)).unwrap_or(time))
    }

    pub fn time(&self) -> NaiveTime {
        self.0
    }

    pub fn on(&self, date: NaiveDate) -> NaiveDateTime {
        date.and_time(self.0)
    }
}

impl FromStr for SlotTime {
    type Err = SlotTimeError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let trimmed = raw.trim();
        NaiveTime::parse_from_str(trimmed, "%H:%M")
            .or_else(|_| NaiveTime::parse_from_str(trimmed, "%H:%M:%S"))
            .map(Self::truncate)
            .map_err(|_| SlotTimeError(raw.to_string()))
    }
}

impl fmt::Display for SlotTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%H:%M"))
    }
}

impl Serialize for SlotTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for SlotTime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Ordinal day of week, Sunday = 0 through Saturday = 6.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DayOfWeek {
    Sunday = 0,
    Monday = 1,
    Tuesday = 2,
    Wednesday = 3,
    Thursday = 4,
    Friday = 5,
    Saturday = 6,
}

impl DayOfWeek {
    pub const ALL: [DayOfWeek; 7] = [
        DayOfWeek::Sunday,
        DayOfWeek::Monday,
        DayOfWeek::Tuesday,
        DayOfWeek::Wednesday,
        DayOfWeek::Thursday,
        DayOfWeek::Friday,
        DayOfWeek::Saturday,
    ];

    pub fn of(date: NaiveDate) -> Self {
        Self::ALL[date.weekday().num_days_from_sunday() as usize]
    }

    pub fn from_ordinal(ordinal: u8) -> Option<Self> {
        Self::ALL.get(usize::from(ordinal)).copied()
    }

    pub fn ordinal(self) -> u8 {
        self as u8
    }
}

/// A working window for one day. `end` is exclusive of any work starting after it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkingHours {
    pub start: NaiveTime,
    pub end: NaiveTime,
    pub is_available: bool,
}

impl WorkingHours {
    pub fn new(start: NaiveTime, end: NaiveTime) -> Self {
        Self {
            start,
            end,
            is_available: true,
        }
    }

    pub fn closed() -> Self {
        Self {
            start: NaiveTime::MIN,
            end: NaiveTime::MIN,
            is_available: false,
        }
    }

    /// The `08:00–17:00` window used when neither staff nor tenant define hours.
    pub fn standard() -> Self {
        Self::new(
            NaiveTime::from_hms_opt(8, 0, 0).unwrap_or(NaiveTime::MIN),
            NaiveTime::from_hms_opt(17, 0, 0).unwrap_or(NaiveTime::MIN),
        )
    }

    /// Whether `[start, end]` on `date` fits entirely inside this window.
    pub fn contains(&self, date: NaiveDate, start: NaiveDateTime, end: NaiveDateTime) -> bool {
        self.is_available && start >= date.and_time(self.start) && end <= date.and_time(self.end)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recurrence {
    #[default]
    Once,
    Yearly,
}

/// Tenant-scoped date range in which no home visits may be booked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockedDate {
    pub tenant_id: TenantId,
    pub date_start: NaiveDate,
    pub date_end: NaiveDate,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub recurrence: Recurrence,
}

impl BlockedDate {
    pub fn covers(&self, date: NaiveDate) -> bool {
        match self.recurrence {
            Recurrence::Once => self.date_start <= date && date <= self.date_end,
            Recurrence::Yearly => {
                if date < self.date_start {
                    return false;
                }
                if (self.date_end - self.date_start).num_days() >= 365 {
                    return true;
                }
                let key = |d: NaiveDate| (d.month(), d.day());
                let (start, end, probe) = (key(self.date_start), key(self.date_end), key(date));
                if start <= end {
                    start <= probe && probe <= end
                } else {
                    probe >= start || probe <= end
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Cancelled,
    Completed,
}

impl BookingStatus {
    /// Statuses that hold quota and occupy a time slot.
    pub const ACTIVE: [BookingStatus; 2] = [BookingStatus::Pending, BookingStatus::Confirmed];
    /// Statuses that count towards a staff member's load ranking.
    pub const LOAD: [BookingStatus; 1] = [BookingStatus::Confirmed];
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub tenant_id: TenantId,
    pub service_id: ServiceId,
    pub scheduled_at: NaiveDateTime,
    pub is_home_visit: bool,
    pub status: BookingStatus,
    #[serde(default)]
    pub staff_id: Option<StaffId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Staff {
    pub id: StaffId,
    pub tenant_id: TenantId,
    pub name: String,
    pub active: bool,
}

/// Mapping row recording whether a staff member may perform a service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StaffCapability {
    pub tenant_id: TenantId,
    pub staff_id: StaffId,
    pub service_id: ServiceId,
    pub can_perform: bool,
    pub specialist: bool,
}

/// Interpretation of a missing staff-service mapping row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapabilityDefault {
    #[default]
    Allow,
    Deny,
}

impl CapabilityDefault {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "allow" => Some(Self::Allow),
            "deny" => Some(Self::Deny),
            _ => None,
        }
    }

    /// Resolves capability from an optional mapping row.
    pub fn resolve(self, mapping: Option<&StaffCapability>) -> bool {
        match mapping {
            Some(row) => row.can_perform,
            None => self == Self::Allow,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StaffLeave {
    pub tenant_id: TenantId,
    pub staff_id: StaffId,
    pub date_start: NaiveDate,
    pub date_end: NaiveDate,
    pub reason: String,
    pub paid: bool,
}

impl StaffLeave {
    pub fn covers(&self, date: NaiveDate) -> bool {
        self.date_start <= date && date <= self.date_end
    }
}

/// Per-staff working hours override for one day of the week.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StaffSchedule {
    pub tenant_id: TenantId,
    pub staff_id: StaffId,
    pub day_of_week: DayOfWeek,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub is_available: bool,
}

impl StaffSchedule {
    pub fn hours(&self) -> WorkingHours {
        WorkingHours {
            start: self.start_time,
            end: self.end_time,
            is_available: self.is_available,
        }
    }
}

/// Tenant record as seen by this engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantProfile {
    pub id: TenantId,
    pub slug: String,
    pub name: String,
    #[serde(default)]
    pub home_visit: Option<HomeVisitSettings>,
    #[serde(default)]
    pub business_hours: BTreeMap<DayOfWeek, WorkingHours>,
}

/// Staff member qualified for a service, in listing order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QualifiedStaff {
    #[serde(flatten)]
    pub staff: Staff,
    pub specialist: bool,
}
