use crate::infra::{demo_gateway, parse_slot_time, DEEP_CLEAN, DEMO_TENANT_SLUG, HAIRCUT, MASSAGE};
use chrono::{Duration, Local, NaiveDate};
use clap::Args;
use homevisit::config::AppConfig;
use homevisit::error::AppError;
use homevisit::scheduling::{
    parse_date, AvailabilityResult, CalendarDay, HomeVisitService, InMemoryGateway, ServiceId,
    SlotTime, StaffMatch,
};
use std::sync::Arc;

#[derive(Args, Debug)]
pub(crate) struct AvailabilityArgs {
    /// Tenant slug or id
    #[arg(long, default_value = DEMO_TENANT_SLUG)]
    pub(crate) tenant: String,
    /// Service id to check
    #[arg(long, default_value = DEEP_CLEAN)]
    pub(crate) service: String,
    /// Date to check (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_parser = parse_date)]
    pub(crate) date: Option<NaiveDate>,
}

#[derive(Args, Debug)]
pub(crate) struct MatchArgs {
    /// Tenant slug or id
    #[arg(long, default_value = DEMO_TENANT_SLUG)]
    pub(crate) tenant: String,
    /// Service id to staff
    #[arg(long, default_value = DEEP_CLEAN)]
    pub(crate) service: String,
    /// Booking date (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_parser = parse_date)]
    pub(crate) date: Option<NaiveDate>,
    /// Slot start time (HH:MM)
    #[arg(long, value_parser = parse_slot_time)]
    pub(crate) time: SlotTime,
}

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Anchor date for the seeded bookings (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_parser = parse_date)]
    pub(crate) date: Option<NaiveDate>,
}

fn demo_service(anchor: NaiveDate) -> Result<HomeVisitService<InMemoryGateway>, AppError> {
    let config = AppConfig::load()?;
    let gateway = demo_gateway(config.availability.unmapped_capability, anchor)?;
    Ok(HomeVisitService::new(Arc::new(gateway), config.availability))
}

pub(crate) async fn run_availability(args: AvailabilityArgs) -> Result<(), AppError> {
    let date = args.date.unwrap_or_else(|| Local::now().date_naive());
    let service = demo_service(date)?;

    let result = service
        .availability(&args.tenant, &ServiceId(args.service), date)
        .await?;
    render_availability(&result);
    Ok(())
}

pub(crate) async fn run_match(args: MatchArgs) -> Result<(), AppError> {
    let date = args.date.unwrap_or_else(|| Local::now().date_naive());
    let service = demo_service(date)?;

    let selected = service
        .match_staff(&args.tenant, &ServiceId(args.service), date, args.time)
        .await?;
    render_match(date, args.time, selected.as_ref());
    Ok(())
}

pub(crate) async fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let anchor = args.date.unwrap_or_else(|| Local::now().date_naive());
    let service = demo_service(anchor)?;

    println!("Home visit scheduling demo for tenant '{DEMO_TENANT_SLUG}'");

    for service_id in [DEEP_CLEAN, MASSAGE, HAIRCUT] {
        let result = service
            .availability(DEMO_TENANT_SLUG, &ServiceId(service_id.to_string()), anchor)
            .await?;
        println!();
        render_availability(&result);
    }

    let week = service
        .calendar(
            DEMO_TENANT_SLUG,
            &ServiceId(DEEP_CLEAN.to_string()),
            anchor,
            anchor + Duration::days(6),
        )
        .await?;
    println!("\nNext seven days for {DEEP_CLEAN}");
    render_calendar(&week);

    println!("\nStaff matching on {anchor}");
    for (service_id, hour) in [(DEEP_CLEAN, 11), (MASSAGE, 16), (MASSAGE, 9)] {
        let Some(time) = SlotTime::new(hour, 0) else {
            continue;
        };
        let selected = service
            .match_staff(
                DEMO_TENANT_SLUG,
                &ServiceId(service_id.to_string()),
                anchor,
                time,
            )
            .await?;
        print!("  {service_id:<12}");
        render_match(anchor, time, selected.as_ref());
    }

    Ok(())
}

fn render_availability(result: &AvailabilityResult) {
    println!(
        "{} ({}, {} min) on {}",
        result.service_name, result.service_id, result.service_duration, result.date
    );
    println!("  {}", result.message);
    if !result.is_home_visit_supported || result.is_blocked {
        return;
    }
    println!(
        "  Quota: {} booked of {} ({} remaining)",
        result.booked_count, result.daily_quota, result.remaining_quota
    );
    for slot in &result.slots {
        let status = if slot.is_booked {
            "booked"
        } else if slot.available {
            "open"
        } else {
            "closed"
        };
        let mut line = format!("  {} - {} {status:<6}", slot.time, slot.end.format("%H:%M"));
        if result.requires_staff {
            line.push_str(&format!(" staff: {}", slot.staff_names.join(", ")));
            if slot.staff_unverified > 0 {
                line.push_str(&format!(" ({} unverified)", slot.staff_unverified));
            }
        }
        println!("{line}");
    }
}

fn render_calendar(days: &[CalendarDay]) {
    for day in days {
        println!(
            "  {} {} slots, {} quota left - {}",
            day.date.format("%a %Y-%m-%d"),
            day.available_slots,
            day.remaining_quota,
            day.message
        );
    }
}

fn render_match(date: NaiveDate, time: SlotTime, selected: Option<&StaffMatch>) {
    match selected {
        Some(selected) => println!(
            "{date} {time}: {} ({} confirmed bookings{})",
            selected.staff.name,
            selected.booking_load,
            if selected.specialist { ", specialist" } else { "" }
        ),
        None => println!("{date} {time}: no staff available"),
    }
}
