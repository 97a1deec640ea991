use actix_web::web;
use anyhow::{bail, Context};
use diesel::prelude::*;

use crate::{database::get_db_conn, DbPool};

pub async fn assert_appoint(pool: &web::Data<DbPool>, id: i64) -> anyhow::Result<()> {
    use crate::schema::appointments;

    let conn = get_db_conn(pool)?;
    let res = web::block(move || {
        appointments::table
            .filter(appointments::id.eq(id))
            .count()
            .get_result::<i64>(&conn)
    })
    .await
    .context("DB error")?;

    if res == 0 {
        bail!("No such appointment");
    }

    Ok(())
}

pub async fn assert_block(pool: &web::Data<DbPool>, id: i64) -> anyhow::Result<()> {
    use crate::schema::blocked_slots;

    let conn = get_db_conn(pool)?;
    let res = web::block(move || {
        blocked_slots::table
            .filter(blocked_slots::id.eq(id))
            .count()
            .get_result::<i64>(&conn)
    })
    .await
    .context("DB error")?;

    if res == 0 {
        bail!("No such blocked slot");
    }

    Ok(())
}
