pub mod availability;
pub mod breaks;
pub mod classes;
pub mod core;
pub mod export;
pub mod generate;
pub mod setup;
pub mod teachers;
pub mod timetable;
