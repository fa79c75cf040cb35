pub mod camera;
pub mod location;

pub use camera::{CameraCapture, CameraDevice, CameraStream, CapturedImage, Facing, FileCamera, NoCamera};
pub use location::{
    FileLocation, FixedLocation, LocationFailure, LocationFix, LocationProvider, LocationSource, NoLocation,
};
