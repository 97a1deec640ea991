mod requests;
mod responses;

use crate::{
    availability::{self, BlockSpec, EngineError},
    database::{assert, get_db_conn},
    models::{
        appointments::AppointmentData,
        blocked_slots::{BlockedSlotData, RecurringPattern},
    },
    protocol::SimpleResponse,
    DbPool,
};
use actix_web::{post, web, HttpResponse, Responder};
use anyhow::{bail, Context};
use chrono::{Datelike, Duration, NaiveDate, Timelike, Utc};
use diesel::prelude::*;

use self::{requests::*, responses::*};

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(search_appoint)
        .service(delete_appoint)
        .service(export_appoint)
        .service(search_block)
        .service(check_block)
        .service(propose_block)
        .service(delete_block)
        .service(timeline)
        .service(calendar)
        .service(stats);
}

crate::post_funcs! {
    (search_appoint, "/search_appoint", SearchAppointRequest, SearchAppointResponse),
    (delete_appoint, "/delete_appoint", DeleteAppointRequest, SimpleResponse),
    (export_appoint, "/export_appoint", ExportAppointRequest, ExportAppointResponse),
    (search_block, "/search_block", SearchBlockRequest, SearchBlockResponse),
    (check_block, "/check_block", CheckBlockRequest, CheckBlockResponse),
    (propose_block, "/propose_block", ProposeBlockRequest, ProposeBlockResponse),
    (delete_block, "/delete_block", DeleteBlockRequest, SimpleResponse),
    (timeline, "/timeline", TimelineRequest, TimelineResponse),
    (calendar, "/calendar", CalendarRequest, CalendarResponse),
    (stats, "/stats", StatsRequest, StatsResponse),
}

fn appoint_item(data: &AppointmentData) -> AppointmentItem {
    AppointmentItem {
        id: data.id,
        first_name: data.first_name.clone(),
        family_name: data.family_name.clone(),
        phone: data.phone.clone(),
        date: crate::utils::format_date_str(&data.date),
        time: crate::utils::format_slot_str(&data.time),
        created_at: crate::utils::format_time_str(&data.created_at),
    }
}

fn block_item(data: &BlockedSlotData) -> BlockedSlotItem {
    BlockedSlotItem {
        id: data.id,
        start_date: crate::utils::format_date_str(&data.start_date),
        end_date: data.end_date.map(|d| crate::utils::format_date_str(&d)),
        start_time: data.start_time.map(|t| crate::utils::format_slot_str(&t)),
        end_time: data.end_time.map(|t| crate::utils::format_slot_str(&t)),
        all_day: data.all_day,
        reason: data.reason.clone(),
        block_type: data.block_type.clone(),
        recurring_pattern: data.recurring_pattern.clone(),
    }
}

async fn search_appoint_impl(
    pool: web::Data<DbPool>,
    info: web::Json<SearchAppointRequest>,
) -> anyhow::Result<SearchAppointResponse> {
    use crate::schema::appointments;

    let info = info.into_inner();
    let (start_date, end_date) = crate::utils::get_date_pair_opt(info.date)?;
    let first_index = info.first_index.unwrap_or(0).max(0);
    let limit = info.limit.unwrap_or(50).max(0);

    let conn = get_db_conn(&pool)?;
    let (appos, total) = web::block(move || -> anyhow::Result<(Vec<AppointmentData>, i64)> {
        let appos = appointments::table
            .filter(appointments::date.between(start_date, end_date))
            .order((appointments::date.desc(), appointments::time.desc()))
            .offset(first_index)
            .limit(limit)
            .get_results::<AppointmentData>(&conn)
            .context("DB error")?;
        let total = appointments::table
            .count()
            .get_result::<i64>(&conn)
            .context("DB error")?;
        Ok((appos, total))
    })
    .await?;

    Ok(SearchAppointResponse {
        success: true,
        err: "".to_string(),
        appointments: appos.iter().map(appoint_item).collect(),
        total,
    })
}

async fn delete_appoint_impl(
    pool: web::Data<DbPool>,
    info: web::Json<DeleteAppointRequest>,
) -> anyhow::Result<SimpleResponse> {
    use crate::schema::appointments;

    let info = info.into_inner();
    assert::assert_appoint(&pool, info.id).await?;

    let conn = get_db_conn(&pool)?;
    let id = info.id;
    web::block(move || {
        diesel::delete(appointments::table.filter(appointments::id.eq(id))).execute(&conn)
    })
    .await
    .context("DB error")?;

    Ok(SimpleResponse::ok())
}

async fn export_appoint_impl(
    pool: web::Data<DbPool>,
    info: web::Json<ExportAppointRequest>,
) -> anyhow::Result<ExportAppointResponse> {
    use crate::schema::appointments;

    let _ = info.into_inner();

    let conn = get_db_conn(&pool)?;
    let appos = web::block(move || {
        appointments::table
            .order((appointments::date.asc(), appointments::time.asc()))
            .get_results::<AppointmentData>(&conn)
    })
    .await
    .context("DB error")?;

    Ok(ExportAppointResponse {
        success: true,
        err: "".to_string(),
        timestamp: crate::utils::format_time_str(&Utc::now().naive_utc()),
        total: appos.len() as i64,
        appointments: appos.iter().map(appoint_item).collect(),
    })
}

async fn search_block_impl(
    pool: web::Data<DbPool>,
    info: web::Json<SearchBlockRequest>,
) -> anyhow::Result<SearchBlockResponse> {
    use crate::schema::blocked_slots;

    let info = info.into_inner();
    let date = crate::utils::parse_date_str_opt(info.date)?;
    let range_start = crate::utils::parse_date_str_opt(info.start_date)?;
    let range_end = crate::utils::parse_date_str_opt(info.end_date)?;
    if let (Some(start), Some(end)) = (range_start, range_end) {
        if end < start {
            bail!("End date must be after start date");
        }
    }

    // Fetch everything starting up to the relevant upper bound; the exact
    // coverage predicate runs on the rows.
    let upper = match (date, range_start, range_end) {
        (Some(date), _, _) => date,
        (None, Some(_), Some(end)) => end,
        _ => NaiveDate::from_ymd(2901, 1, 1),
    };
    let conn = get_db_conn(&pool)?;
    let blocks = web::block(move || {
        blocked_slots::table
            .filter(blocked_slots::start_date.le(upper))
            .order((blocked_slots::start_date.asc(), blocked_slots::start_time.asc()))
            .get_results::<BlockedSlotData>(&conn)
    })
    .await
    .context("DB error")?;

    let blocks: Vec<BlockedSlotData> = match (date, range_start, range_end) {
        (Some(date), _, _) => blocks
            .into_iter()
            .filter(|block| availability::block_covers_date(block, date))
            .collect(),
        (None, Some(start), Some(end)) => blocks
            .into_iter()
            .filter(|block| availability::block_covers_range(block, start, end))
            .collect(),
        _ => blocks,
    };

    Ok(SearchBlockResponse {
        success: true,
        err: "".to_string(),
        blocked_slots: blocks.iter().map(block_item).collect(),
    })
}

async fn check_block_impl(
    pool: web::Data<DbPool>,
    info: web::Json<CheckBlockRequest>,
) -> anyhow::Result<CheckBlockResponse> {
    use crate::schema::blocked_slots;

    let info = info.into_inner();
    let date = crate::utils::parse_date_str(&info.date)?;
    let time = crate::utils::parse_slot_str_opt(info.time)?;

    let conn = get_db_conn(&pool)?;
    let blocks = web::block(move || {
        blocked_slots::table
            .filter(blocked_slots::start_date.le(date))
            .get_results::<BlockedSlotData>(&conn)
    })
    .await
    .context("DB error")?;
    let covering: Vec<&BlockedSlotData> = blocks
        .iter()
        .filter(|block| availability::block_covers_date(block, date))
        .collect();

    // All-day blocks win over time-bounded ones.
    if let Some(block) = covering.iter().find(|block| block.all_day) {
        return Ok(CheckBlockResponse {
            success: true,
            err: "".to_string(),
            is_blocked: true,
            reason: block.reason.clone(),
            block_type: "all_day".to_string(),
        });
    }
    if let Some(time) = time {
        if let Some(block) = covering
            .iter()
            .find(|block| availability::block_covers_slot(block, time))
        {
            return Ok(CheckBlockResponse {
                success: true,
                err: "".to_string(),
                is_blocked: true,
                reason: block.reason.clone(),
                block_type: block.block_type.clone(),
            });
        }
    }

    Ok(CheckBlockResponse {
        success: true,
        err: "".to_string(),
        is_blocked: false,
        ..Default::default()
    })
}

async fn propose_block_impl(
    pool: web::Data<DbPool>,
    info: web::Json<ProposeBlockRequest>,
) -> anyhow::Result<ProposeBlockResponse> {
    use crate::schema::{appointments, blocked_slots};

    let info = info.into_inner();
    let spec = BlockSpec {
        start_date: crate::utils::parse_date_str(&info.start_date)?,
        end_date: crate::utils::parse_date_str_opt(info.end_date)?,
        start_time: crate::utils::parse_slot_str_opt(info.start_time)?,
        end_time: crate::utils::parse_slot_str_opt(info.end_time)?,
        all_day: info.all_day,
        reason: crate::utils::sanitize_input(&info.reason),
        block_type: info.block_type,
        recurring: info.recurring_pattern.map(|pattern| RecurringPattern {
            days: pattern.days,
            weeks: pattern.weeks.unwrap_or(4),
        }),
    };
    let dates = availability::covered_dates(&spec)?;
    let first = dates[0];
    let last = *dates.last().unwrap();
    let block_reason = spec.reason.clone();
    let confirmed = info.confirmed;

    let conn = get_db_conn(&pool)?;
    let (conflicts, created) = web::block(move || {
        conn.transaction(
            || -> anyhow::Result<(Vec<availability::BlockConflict>, Vec<BlockedSlotData>)> {
                let appos = appointments::table
                    .filter(appointments::date.between(first, last))
                    .order((appointments::date.asc(), appointments::time.asc()))
                    .get_results::<AppointmentData>(&conn)
                    .context("DB error")?;

                let conflicts = availability::find_appointment_conflicts(&spec, &appos)?;
                if !conflicts.is_empty() && !confirmed {
                    return Ok((conflicts, Vec::new()));
                }

                // All generated rows commit together or not at all.
                let rows = availability::expand_block_rows(&spec)?;
                let created = diesel::insert_into(blocked_slots::table)
                    .values(&rows)
                    .get_results::<BlockedSlotData>(&conn)
                    .context("DB error")?;
                Ok((conflicts, created))
            },
        )
    })
    .await?;

    if created.is_empty() {
        let conflict_count: usize = conflicts.iter().map(|c| c.appointments.len()).sum();
        let err = EngineError::ConflictRequiresConfirmation(format!(
            "Found {} date(s) with {} existing appointment(s) that would be blocked",
            conflicts.len(),
            conflict_count,
        ));
        return Ok(ProposeBlockResponse {
            success: false,
            err: err.to_string(),
            requires_confirmation: true,
            conflict_count,
            conflicts: conflicts
                .iter()
                .map(|conflict| ConflictItem {
                    date: crate::utils::format_date_str(&conflict.date),
                    reason: block_reason.clone(),
                    appointments: conflict.appointments.iter().map(appoint_item).collect(),
                })
                .collect(),
            ..Default::default()
        });
    }

    Ok(ProposeBlockResponse {
        success: true,
        err: "".to_string(),
        message: format!("Created {} blocked slot(s)", created.len()),
        requires_confirmation: false,
        conflict_count: conflicts.iter().map(|c| c.appointments.len()).sum(),
        conflicts: conflicts
            .iter()
            .map(|conflict| ConflictItem {
                date: crate::utils::format_date_str(&conflict.date),
                reason: block_reason.clone(),
                appointments: conflict.appointments.iter().map(appoint_item).collect(),
            })
            .collect(),
        blocked_slots: created.iter().map(block_item).collect(),
    })
}

async fn delete_block_impl(
    pool: web::Data<DbPool>,
    info: web::Json<DeleteBlockRequest>,
) -> anyhow::Result<SimpleResponse> {
    use crate::schema::blocked_slots;

    let info = info.into_inner();
    assert::assert_block(&pool, info.id).await?;

    let conn = get_db_conn(&pool)?;
    let id = info.id;
    web::block(move || {
        diesel::delete(blocked_slots::table.filter(blocked_slots::id.eq(id))).execute(&conn)
    })
    .await
    .context("DB error")?;

    Ok(SimpleResponse::ok())
}

async fn timeline_impl(
    pool: web::Data<DbPool>,
    info: web::Json<TimelineRequest>,
) -> anyhow::Result<TimelineResponse> {
    use crate::schema::{appointments, blocked_slots};

    let info = info.into_inner();
    let date = crate::utils::parse_date_str(&info.date)?;

    let conn = get_db_conn(&pool)?;
    let (appos, blocks) = web::block(
        move || -> anyhow::Result<(Vec<AppointmentData>, Vec<BlockedSlotData>)> {
            let appos = appointments::table
                .filter(appointments::date.eq(date))
                .order(appointments::time.asc())
                .get_results::<AppointmentData>(&conn)
                .context("DB error")?;
            let blocks = blocked_slots::table
                .filter(blocked_slots::start_date.le(date))
                .order((blocked_slots::start_date.asc(), blocked_slots::start_time.asc()))
                .get_results::<BlockedSlotData>(&conn)
                .context("DB error")?;
            Ok((appos, blocks))
        },
    )
    .await?;

    let catalog = availability::slot_catalog();
    let day = availability::compute_availability(&catalog, date, &appos, &blocks)?;
    let covering: Vec<&BlockedSlotData> = blocks
        .iter()
        .filter(|block| availability::block_covers_date(block, date))
        .collect();

    let timeline = catalog
        .iter()
        .map(|&slot| {
            let appointment = appos
                .iter()
                .find(|appo| appo.time == slot)
                .map(appoint_item);
            let blocked = covering
                .iter()
                .find(|block| availability::block_covers_slot(block, slot))
                .map(|block| TimelineBlockItem {
                    reason: block.reason.clone(),
                    all_day: block.all_day,
                    start_time: block.start_time.map(|t| crate::utils::format_slot_str(&t)),
                    end_time: block.end_time.map(|t| crate::utils::format_slot_str(&t)),
                });
            let is_available = appointment.is_none() && blocked.is_none();
            TimelineSlotItem {
                time: crate::utils::format_slot_str(&slot),
                display: format!("{}:00", slot.hour()),
                appointment,
                blocked,
                is_available,
            }
        })
        .collect();

    Ok(TimelineResponse {
        success: true,
        err: "".to_string(),
        date: crate::utils::format_date_str(&date),
        timeline,
        summary: TimelineSummary {
            total_appointments: appos.len(),
            total_blocked: covering.len(),
            available_slots: day.available.len(),
        },
    })
}

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

async fn calendar_impl(
    pool: web::Data<DbPool>,
    info: web::Json<CalendarRequest>,
) -> anyhow::Result<CalendarResponse> {
    use crate::schema::{appointments, blocked_slots};

    let info = info.into_inner();
    let today = Utc::now().naive_utc().date();
    let year = info.year.unwrap_or_else(|| today.year());
    let month = info.month.unwrap_or_else(|| today.month());

    let start = NaiveDate::from_ymd_opt(year, month, 1).context("Invalid month")?;
    let end = if month == 12 {
        NaiveDate::from_ymd(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd(year, month + 1, 1)
    }
    .pred();

    let conn = get_db_conn(&pool)?;
    let (appos, blocks) = web::block(
        move || -> anyhow::Result<(Vec<AppointmentData>, Vec<BlockedSlotData>)> {
            let appos = appointments::table
                .filter(appointments::date.between(start, end))
                .order((appointments::date.asc(), appointments::time.asc()))
                .get_results::<AppointmentData>(&conn)
                .context("DB error")?;
            let blocks = blocked_slots::table
                .filter(blocked_slots::start_date.le(end))
                .get_results::<BlockedSlotData>(&conn)
                .context("DB error")?;
            Ok((appos, blocks))
        },
    )
    .await?;

    let mut calendar = Vec::new();
    let mut date = start;
    while date <= end {
        let times: Vec<String> = appos
            .iter()
            .filter(|appo| appo.date == date)
            .map(|appo| crate::utils::format_slot_str(&appo.time))
            .collect();
        let blocked_count = blocks
            .iter()
            .filter(|block| availability::block_covers_date(block, date))
            .count();
        let day_of_week = date.weekday().num_days_from_sunday();
        calendar.push(CalendarDayItem {
            date: crate::utils::format_date_str(&date),
            day: date.day(),
            day_of_week,
            is_weekend: day_of_week == 0 || day_of_week == 6,
            appointment_count: times.len(),
            appointment_times: times,
            is_blocked: blocked_count > 0,
            blocked_count,
        });
        date += Duration::days(1);
    }

    Ok(CalendarResponse {
        success: true,
        err: "".to_string(),
        year,
        month,
        month_name: MONTH_NAMES[(month - 1) as usize].to_string(),
        calendar,
    })
}

async fn stats_impl(
    pool: web::Data<DbPool>,
    info: web::Json<StatsRequest>,
) -> anyhow::Result<StatsResponse> {
    use crate::schema::{appointments, blocked_slots};

    let _ = info.into_inner();
    let today = Utc::now().naive_utc().date();

    let conn = get_db_conn(&pool)?;
    let (appointments_today, total_appointments, total_blocked_slots, recent) =
        web::block(move || -> anyhow::Result<(i64, i64, i64, Vec<AppointmentData>)> {
            let appointments_today = appointments::table
                .filter(appointments::date.eq(today))
                .count()
                .get_result::<i64>(&conn)
                .context("DB error")?;
            let total_appointments = appointments::table
                .count()
                .get_result::<i64>(&conn)
                .context("DB error")?;
            let total_blocked_slots = blocked_slots::table
                .count()
                .get_result::<i64>(&conn)
                .context("DB error")?;
            let recent = appointments::table
                .order(appointments::created_at.desc())
                .limit(5)
                .get_results::<AppointmentData>(&conn)
                .context("DB error")?;
            Ok((appointments_today, total_appointments, total_blocked_slots, recent))
        })
        .await?;

    Ok(StatsResponse {
        success: true,
        err: "".to_string(),
        appointments_today,
        total_appointments,
        total_blocked_slots,
        recent_appointments: recent.iter().map(appoint_item).collect(),
    })
}
