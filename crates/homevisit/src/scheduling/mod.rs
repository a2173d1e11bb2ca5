//! Home visit availability: slot composition, quota tracking, staff evaluation,
//! and best-staff selection over a pluggable constraint gateway.

pub mod composer;
pub mod domain;
pub mod evaluator;
pub mod gateway;
pub mod memory;
pub mod quota;
pub mod router;
pub mod selector;
pub mod service;

#[cfg(test)]
mod tests;

pub use composer::{
    AvailabilityComposer, AvailabilityError, AvailabilityResult, CalendarDay, SlotAvailability,
};
pub use domain::{
    BlockedDate, Booking, BookingStatus, CapabilityDefault, DayOfWeek, HomeVisitSettings,
    QualifiedStaff, Recurrence, Service, ServiceId, ServiceType, SlotTime, Staff,
    StaffCapability, StaffId, StaffLeave, StaffSchedule, TenantId, TenantProfile, WorkingHours,
};
pub use evaluator::{
    SlotWindow, StaffAvailabilityEvaluator, StaffCheck, StaffEvaluation, UnavailableReason,
};
pub use gateway::{ConstraintGateway, GatewayError, TenantDirectory};
pub use memory::InMemoryGateway;
pub use quota::{QuotaSnapshot, SlotQuotaTracker};
pub use router::{home_visit_router, parse_date};
pub use selector::{BestStaffSelector, StaffMatch};
pub use service::{HomeVisitService, HomeVisitServiceError};
