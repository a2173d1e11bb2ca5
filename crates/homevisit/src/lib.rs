//! Home-visit availability and staff-matching engine.
//!
//! The [`scheduling`] module holds the domain model, the constraint gateway
//! contract, and the components that turn tenant configuration into bookable
//! home-visit slots and staff assignments.

pub mod config;
pub mod error;
pub mod scheduling;
pub mod telemetry;
