pub mod appointments;
pub mod blocked_slots;
