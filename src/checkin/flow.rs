use tracing::{info, warn};

use crate::checkin::{AttendanceSubmitter, SubmitControl};
use crate::client::attendance::models::CheckinReceipt;
use crate::device::location::render_status;
use crate::device::{CameraCapture, CapturedImage, LocationFailure, LocationFix, LocationProvider};
use crate::error::{AttendanceError, Result};
use crate::session::Session;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraAction {
    Started,
    Captured,
}

/// Student check-in state for one activation of the dashboard. Dropping it
/// releases a camera that is still streaming.
pub struct CheckinFlow {
    session: Session,
    camera: CameraCapture,
    location: LocationProvider,
    submitter: AttendanceSubmitter,
    location_result: Option<std::result::Result<LocationFix, LocationFailure>>,
    image: Option<CapturedImage>,
    control: SubmitControl,
}

impl CheckinFlow {
    pub fn new(
        session: Session,
        camera: CameraCapture,
        location: LocationProvider,
        submitter: AttendanceSubmitter,
    ) -> Self {
        Self {
            session,
            camera,
            location,
            submitter,
            location_result: None,
            image: None,
            control: SubmitControl::default(),
        }
    }

    pub fn fix(&self) -> Option<&LocationFix> {
        self.location.last_fix()
    }

    pub fn image(&self) -> Option<&CapturedImage> {
        self.image.as_ref()
    }

    pub fn control(&self) -> &SubmitControl {
        &self.control
    }

    pub fn camera_streaming(&self) -> bool {
        self.camera.is_streaming()
    }

    pub fn location_status(&self) -> String {
        render_status(self.location_result.as_ref())
    }

    /// Runs one location query. A failure keeps any earlier fix untouched.
    pub async fn refresh_location(&mut self) -> std::result::Result<LocationFix, LocationFailure> {
        let result = self.location.request_once().await;
        self.location_result = Some(result.clone());
        result
    }

    /// Location query and camera start run side by side.
    pub async fn prepare(&mut self) -> Result<()> {
        let (location, camera) = futures::join!(self.location.request_once(), self.camera.start());
        self.location_result = Some(location);
        camera
    }

    /// Same behaviour as the capture button: starts the camera when idle,
    /// takes the photo when streaming.
    pub async fn toggle_camera(&mut self) -> Result<CameraAction> {
        if self.camera.is_streaming() {
            self.capture_photo()?;
            Ok(CameraAction::Captured)
        } else {
            self.camera.start().await?;
            Ok(CameraAction::Started)
        }
    }

    pub fn capture_photo(&mut self) -> Result<&CapturedImage> {
        let image = self.camera.freeze()?;
        self.control.arm();
        Ok(self.image.insert(image))
    }

    pub fn cancel_camera(&mut self) {
        self.camera.cancel();
    }

    /// Submits the current fix and photo. The control is busy while the
    /// request is pending and is released on every outcome; the photo is only
    /// cleared on success.
    pub async fn submit(&mut self) -> Result<CheckinReceipt> {
        let result = {
            let Some(_in_flight) = self.control.begin() else {
                return Err(AttendanceError::Validation("Ya hay un registro en curso".to_string()));
            };
            self.submitter
                .submit(self.location.last_fix(), self.image.as_ref(), &self.session)
                .await
        };

        match &result {
            Ok(_) => {
                self.image = None;
                self.control.disarm();
                info!("asistencia registrada, foto descartada");
            }
            Err(e) => warn!(error = %e, "registro de asistencia fallido"),
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::Ordering;
    use std::time::Duration;

    use crate::client::ApiClient;
    use crate::device::camera::tests::FakeCamera;
    use crate::device::{FixedLocation, NoLocation};
    use crate::session::Role;

    fn unreachable_api() -> ApiClient {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);
        ApiClient::new(&format!("http://127.0.0.1:{}", port), Duration::from_secs(2)).unwrap()
    }

    fn flow(camera: FakeCamera, location: LocationProvider) -> CheckinFlow {
        let session = Session {
            token: "abc".to_string(),
            role: Role::Student,
        };
        CheckinFlow::new(
            session,
            CameraCapture::new(Box::new(camera), 80),
            location,
            AttendanceSubmitter::new(unreachable_api(), false),
        )
    }

    fn fixed(lat: f64, lng: f64) -> LocationProvider {
        LocationProvider::new(
            Box::new(FixedLocation {
                latitude: lat,
                longitude: lng,
            }),
            Duration::from_secs(1),
        )
    }

    #[tokio::test]
    async fn toggle_starts_then_captures() {
        let camera = FakeCamera::default();
        let mut flow = flow(camera.clone(), fixed(10.0, 20.0));

        assert_eq!(flow.toggle_camera().await.unwrap(), CameraAction::Started);
        assert!(flow.camera_streaming());
        assert!(!flow.control().is_enabled());

        assert_eq!(flow.toggle_camera().await.unwrap(), CameraAction::Captured);
        assert!(!flow.camera_streaming());
        assert!(flow.image().is_some());
        assert!(flow.control().is_enabled());
        assert_eq!(camera.released.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn prepare_fetches_location_and_opens_camera() {
        let camera = FakeCamera::default();
        let mut flow = flow(camera.clone(), fixed(10.0, 20.0));
        flow.prepare().await.unwrap();

        assert!(flow.camera_streaming());
        assert_eq!(flow.fix().map(|f| (f.latitude, f.longitude)), Some((10.0, 20.0)));
        assert_eq!(flow.location_status(), "✅ Ubicación: 10.000000, 20.000000");
    }

    #[tokio::test]
    async fn denied_location_blocks_submission() {
        let mut flow = flow(
            FakeCamera::default(),
            LocationProvider::new(Box::new(NoLocation), Duration::from_secs(1)),
        );
        assert!(flow.refresh_location().await.is_err());
        assert!(flow.location_status().starts_with("❌"));

        flow.toggle_camera().await.unwrap();
        flow.toggle_camera().await.unwrap();
        let err = flow.submit().await.unwrap_err();
        assert!(matches!(err, AttendanceError::Validation(_)));
        assert!(flow.image().is_some());
        assert!(flow.control().is_enabled());
    }

    #[tokio::test]
    async fn network_failure_keeps_photo_and_reenables_control() {
        let mut flow = flow(FakeCamera::default(), fixed(10.0, 20.0));
        flow.refresh_location().await.unwrap();
        flow.toggle_camera().await.unwrap();
        flow.toggle_camera().await.unwrap();
        let before = flow.image().cloned();

        let err = flow.submit().await.unwrap_err();
        assert!(err.is_connectivity());
        assert_eq!(err.user_message(), "Error de conexión");
        assert_eq!(flow.image().cloned(), before);
        assert!(flow.fix().is_some());
        assert!(!flow.control().is_busy());
        assert!(flow.control().is_enabled());
    }

    #[tokio::test]
    async fn cancel_releases_camera_without_photo() {
        let camera = FakeCamera::default();
        let mut flow = flow(camera.clone(), fixed(0.0, 0.0));
        flow.toggle_camera().await.unwrap();

        flow.cancel_camera();
        assert!(!flow.camera_streaming());
        assert!(flow.image().is_none());
        assert!(!flow.control().is_enabled());
        assert_eq!(camera.released.load(Ordering::SeqCst), 1);

        flow.cancel_camera();
        drop(flow);
        assert_eq!(camera.released.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn dropping_flow_releases_live_camera() {
        let camera = FakeCamera::default();
        let mut flow = flow(camera.clone(), fixed(0.0, 0.0));
        flow.toggle_camera().await.unwrap();
        drop(flow);
        assert_eq!(camera.released.load(Ordering::SeqCst), 1);
    }
}
