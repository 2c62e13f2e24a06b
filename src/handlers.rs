pub mod buildings;
pub mod notifications;
pub mod rfid;
pub mod rules;
pub mod scans;
