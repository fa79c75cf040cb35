mod control;
mod flow;
mod submitter;

pub use control::{InFlight, SubmitControl};
pub use flow::{CameraAction, CheckinFlow};
pub use submitter::{AttendanceSubmitter, MISSING_LOCATION, MISSING_PHOTO};
