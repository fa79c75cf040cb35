//! Attendance check-in client: login, photo + location capture, check-in
//! submission and the admin listing/export views of the PediaAttendance API.

pub mod checkin;
pub mod client;
pub mod config;
pub mod device;
pub mod error;
pub mod logging;
pub mod report;
pub mod session;
pub mod shell;

pub use error::{AttendanceError, Result};
