use serde::Deserialize;

#[derive(Deserialize)]
pub struct AvailabilityRequest {
    pub date: String,
}

#[derive(Deserialize)]
pub struct AppointRequest {
    pub first_name: String,
    pub family_name: String,
    pub phone: String,
    pub date: String,
    pub time: String,
}
