pub mod analytics;
pub mod backup_exchange;
pub mod core;
pub mod groups;
pub mod lessons;
pub mod students;
