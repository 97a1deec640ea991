pub mod assert;

use crate::DbPool;
use actix_web::web;
use anyhow::Context;
use diesel::{r2d2::ConnectionManager, PgConnection};
use r2d2::PooledConnection;

pub fn get_db_conn(
    pool: &web::Data<DbPool>,
) -> anyhow::Result<PooledConnection<ConnectionManager<PgConnection>>> {
    pool.get().context("DB connection")
}

/// Whether a diesel error is the UNIQUE-constraint violation raised when two
/// bookings race for the same (date, time). The constraint, not the advisory
/// pre-check, decides the winner.
pub fn is_unique_violation(err: &diesel::result::Error) -> bool {
    matches!(
        err,
        diesel::result::Error::DatabaseError(
            diesel::result::DatabaseErrorKind::UniqueViolation,
            _,
        )
    )
}
