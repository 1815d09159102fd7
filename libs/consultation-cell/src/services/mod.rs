pub mod consultation;
pub mod schedule;
pub mod types;
