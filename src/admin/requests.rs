use serde::Deserialize;

#[derive(Deserialize)]
pub struct SearchAppointRequest {
    pub date: Option<String>,
    pub first_index: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Deserialize)]
pub struct DeleteAppointRequest {
    pub id: i64,
}

#[derive(Deserialize)]
pub struct ExportAppointRequest {}

#[derive(Deserialize)]
pub struct SearchBlockRequest {
    pub date: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

#[derive(Deserialize)]
pub struct CheckBlockRequest {
    pub date: String,
    pub time: Option<String>,
}

#[derive(Deserialize)]
pub struct RecurringPatternRequest {
    pub days: Vec<u32>,
    pub weeks: Option<u32>,
}

#[derive(Deserialize)]
pub struct ProposeBlockRequest {
    pub start_date: String,
    pub end_date: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    #[serde(default)]
    pub all_day: bool,
    #[serde(default)]
    pub reason: String,
    pub block_type: String,
    pub recurring_pattern: Option<RecurringPatternRequest>,
    #[serde(default)]
    pub confirmed: bool,
}

#[derive(Deserialize)]
pub struct DeleteBlockRequest {
    pub id: i64,
}

#[derive(Deserialize)]
pub struct TimelineRequest {
    pub date: String,
}

#[derive(Deserialize)]
pub struct CalendarRequest {
    pub year: Option<i32>,
    pub month: Option<u32>,
}

#[derive(Deserialize)]
pub struct StatsRequest {}
