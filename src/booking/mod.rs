mod requests;
mod responses;

use crate::{
    availability::{self, EngineError},
    database::{self, get_db_conn},
    models::{
        appointments::{AppointmentData, NewAppointment},
        blocked_slots::BlockedSlotData,
    },
    DbPool,
};
use actix_web::{get, post, web, HttpResponse, Responder};
use anyhow::{bail, Context};
use chrono::Utc;
use diesel::prelude::*;

use self::{requests::*, responses::*};

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(available_slots)
        .service(appoint)
        .service(health);
}

crate::post_funcs! {
    (available_slots, "/available_slots", AvailabilityRequest, AvailabilityResponse),
    (appoint, "/appoint", AppointRequest, AppointResponse),
}

async fn available_slots_impl(
    pool: web::Data<DbPool>,
    info: web::Json<AvailabilityRequest>,
) -> anyhow::Result<AvailabilityResponse> {
    use crate::schema::{appointments, blocked_slots};

    let info = info.into_inner();
    let date = crate::utils::parse_date_str(&info.date)?;
    if date < Utc::now().naive_utc().date() {
        bail!("Please select a valid future date");
    }

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

    Ok(AvailabilityResponse {
        success: true,
        err: "".to_string(),
        date: crate::utils::format_date_str(&date),
        available_slots: day.available.iter().map(crate::utils::format_slot_str).collect(),
        booked_slots: day.booked.iter().map(crate::utils::format_slot_str).collect(),
        all_slots: catalog.iter().map(crate::utils::format_slot_str).collect(),
        blocked_info: day
            .blocked_info
            .into_iter()
            .map(|info| BlockedInfoItem {
                reason: info.reason,
                time: info.time_range,
            })
            .collect(),
    })
}

async fn appoint_impl(
    pool: web::Data<DbPool>,
    info: web::Json<AppointRequest>,
) -> anyhow::Result<AppointResponse> {
    use crate::schema::{appointments, blocked_slots};

    let info = info.into_inner();
    crate::utils::assert_name_str(&info.first_name)?;
    crate::utils::assert_name_str(&info.family_name)?;
    crate::utils::assert_phone_str(&info.phone)?;
    let date = crate::utils::parse_date_str(&info.date)?;
    let time = crate::utils::parse_slot_str(&info.time)?;
    let now = Utc::now().naive_utc();

    let data = NewAppointment {
        first_name: info.first_name.trim().to_string(),
        family_name: info.family_name.trim().to_string(),
        phone: info.phone.trim().to_string(),
        date,
        time,
    };

    let conn = get_db_conn(&pool)?;
    let inserted = web::block(move || {
        conn.transaction(|| {
            let appos = appointments::table
                .filter(appointments::date.eq(date))
                .get_results::<AppointmentData>(&conn)
                .context("DB error")?;
            let blocks = blocked_slots::table
                .filter(blocked_slots::start_date.le(date))
                .get_results::<BlockedSlotData>(&conn)
                .context("DB error")?;

            let catalog = availability::slot_catalog();
            availability::is_bookable(&catalog, date, time, now, &appos, &blocks)?;

            // The advisory check above can race with another booking; the
            // UNIQUE (date, time) constraint decides the winner.
            let inserted = diesel::insert_into(appointments::table)
                .values(&data)
                .get_result::<AppointmentData>(&conn);
            match inserted {
                Err(ref err) if database::is_unique_violation(err) => {
                    Err(EngineError::StorageConflict(
                        "This time slot was just booked by another user. Please choose a different time."
                            .to_string(),
                    )
                    .into())
                }
                other => other.context("DB error"),
            }
        })
    })
    .await?;

    Ok(AppointResponse {
        success: true,
        err: "".to_string(),
        message: "Appointment saved successfully!".to_string(),
        id: inserted.id,
        appointment: AppointmentItem {
            id: inserted.id,
            first_name: inserted.first_name,
            family_name: inserted.family_name,
            phone: inserted.phone,
            date: crate::utils::format_date_str(&inserted.date),
            time: crate::utils::format_slot_str(&inserted.time),
            created_at: crate::utils::format_time_str(&inserted.created_at),
        },
    })
}

#[get("/health")]
async fn health(pool: web::Data<DbPool>) -> impl Responder {
    let response = match health_impl(pool).await {
        Ok(response) => response,
        Err(err) => {
            tracing::warn!("health check failed: {}", err);
            HealthResponse {
                status: "unhealthy".to_string(),
                timestamp: crate::utils::format_time_str(&Utc::now().naive_utc()),
                service: env!("CARGO_PKG_NAME").to_string(),
                database: "disconnected".to_string(),
            }
        }
    };
    HttpResponse::Ok().json(response)
}

async fn health_impl(pool: web::Data<DbPool>) -> anyhow::Result<HealthResponse> {
    let conn = get_db_conn(&pool)?;
    web::block(move || diesel::sql_query("SELECT 1").execute(&conn))
        .await
        .context("DB error")?;

    Ok(HealthResponse {
        status: "healthy".to_string(),
        timestamp: crate::utils::format_time_str(&Utc::now().naive_utc()),
        service: env!("CARGO_PKG_NAME").to_string(),
        database: "connected".to_string(),
    })
}
