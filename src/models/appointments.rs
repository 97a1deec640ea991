use crate::schema::appointments;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

#[derive(Clone, Queryable)]
pub struct AppointmentData {
    pub id: i64,
    pub first_name: String,
    pub family_name: String,
    pub phone: String,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub created_at: NaiveDateTime,
}

#[derive(Insertable)]
#[table_name = "appointments"]
pub struct NewAppointment {
    pub first_name: String,
    pub family_name: String,
    pub phone: String,
    pub date: NaiveDate,
    pub time: NaiveTime,
}
