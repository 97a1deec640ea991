use serde::Serialize;

#[derive(Default, Serialize)]
pub struct BlockedInfoItem {
    pub reason: String,
    pub time: String,
}

#[derive(Default, Serialize)]
pub struct AvailabilityResponse {
    pub success: bool,
    pub err: String,
    pub date: String,
    pub available_slots: Vec<String>,
    pub booked_slots: Vec<String>,
    pub all_slots: Vec<String>,
    pub blocked_info: Vec<BlockedInfoItem>,
}

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
pub struct AppointResponse {
    pub success: bool,
    pub err: String,
    pub message: String,
    pub id: i64,
    pub appointment: AppointmentItem,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
    pub service: String,
    pub database: String,
}

crate::impl_err_response! {
    AvailabilityResponse,
    AppointResponse,
}
