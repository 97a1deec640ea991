use serde::Serialize;

#[derive(Clone, Default, Serialize)]
pub struct AppointmentItem {
    pub id: i64,
    pub first_name: String,
    pub family_name: String,
    pub phone: String,
    pub date: String,
    pub time: String,
    pub created_at: String,
}

#[derive(Default, Serialize)]
pub struct SearchAppointResponse {
    pub success: bool,
    pub err: String,
    pub appointments: Vec<AppointmentItem>,
    pub total: i64,
}

#[derive(Default, Serialize)]
pub struct ExportAppointResponse {
    pub success: bool,
    pub err: String,
    pub timestamp: String,
    pub total: i64,
    pub appointments: Vec<AppointmentItem>,
}

#[derive(Clone, Default, Serialize)]
pub struct BlockedSlotItem {
    pub id: i64,
    pub start_date: String,
    pub end_date: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub all_day: bool,
    pub reason: String,
    pub block_type: String,
    pub recurring_pattern: Option<String>,
}

#[derive(Default, Serialize)]
pub struct SearchBlockResponse {
    pub success: bool,
    pub err: String,
    pub blocked_slots: Vec<BlockedSlotItem>,
}

#[derive(Default, Serialize)]
pub struct CheckBlockResponse {
    pub success: bool,
    pub err: String,
    pub is_blocked: bool,
    pub reason: String,
    pub block_type: String,
}

#[derive(Default, Serialize)]
pub struct ConflictItem {
    pub date: String,
    pub reason: String,
    pub appointments: Vec<AppointmentItem>,
}

#[derive(Default, Serialize)]
pub struct ProposeBlockResponse {
    pub success: bool,
    pub err: String,
    pub message: String,
    pub requires_confirmation: bool,
    pub conflict_count: usize,
    pub conflicts: Vec<ConflictItem>,
    pub blocked_slots: Vec<BlockedSlotItem>,
}

#[derive(Default, Serialize)]
pub struct TimelineBlockItem {
    pub reason: String,
    pub all_day: bool,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
}

#[derive(Default, Serialize)]
pub struct TimelineSlotItem {
    pub time: String,
    pub display: String,
    pub appointment: Option<AppointmentItem>,
    pub blocked: Option<TimelineBlockItem>,
    pub is_available: bool,
}

#[derive(Default, Serialize)]
pub struct TimelineSummary {
    pub total_appointments: usize,
    pub total_blocked: usize,
    pub available_slots: usize,
}

#[derive(Default, Serialize)]
pub struct TimelineResponse {
    pub success: bool,
    pub err: String,
    pub date: String,
    pub timeline: Vec<TimelineSlotItem>,
    pub summary: TimelineSummary,
}

#[derive(Default, Serialize)]
pub struct CalendarDayItem {
    pub date: String,
    pub day: u32,
    pub day_of_week: u32,
    pub is_weekend: bool,
    pub appointment_count: usize,
    pub appointment_times: Vec<String>,
    pub is_blocked: bool,
    pub blocked_count: usize,
}

#[derive(Default, Serialize)]
pub struct CalendarResponse {
    pub success: bool,
    pub err: String,
    pub year: i32,
    pub month: u32,
    pub month_name: String,
    pub calendar: Vec<CalendarDayItem>,
}

#[derive(Default, Serialize)]
pub struct StatsResponse {
    pub success: bool,
    pub err: String,
    pub appointments_today: i64,
    pub total_appointments: i64,
    pub total_blocked_slots: i64,
    pub recent_appointments: Vec<AppointmentItem>,
}

crate::impl_err_response! {
    SearchAppointResponse,
    ExportAppointResponse,
    SearchBlockResponse,
    CheckBlockResponse,
    ProposeBlockResponse,
    TimelineResponse,
    CalendarResponse,
    StatsResponse,
}
