use crate::schema::blocked_slots;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

#[derive(Clone, Queryable)]
pub struct BlockedSlotData {
    pub id: i64,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub all_day: bool,
    pub reason: String,
    pub block_type: String,
    pub recurring_pattern: Option<String>,
    pub created_at: NaiveDateTime,
}

#[derive(Clone, Insertable)]
#[table_name = "blocked_slots"]
pub struct NewBlockedSlot {
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub all_day: bool,
    pub reason: String,
    pub block_type: String,
    pub recurring_pattern: Option<String>,
}

pub const BLOCK_TYPE_SINGLE: &str = "single";
pub const BLOCK_TYPE_RANGE: &str = "range";
pub const BLOCK_TYPE_WEEKLY: &str = "weekly";

/// Weekly recurrence rule stored alongside each expanded row.
/// Weekday indices follow the 0 = Sunday .. 6 = Saturday convention.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RecurringPattern {
    pub days: Vec<u32>,
    pub weeks: u32,
}
