pub mod booking;
pub mod holidays;
pub mod time_slots;
